use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sizing: SizingConfig,
    pub conflation: ConflationConfig,
    pub logging: LoggingConfig,
}

/// Calibration constants for the in-memory size estimate.
///
/// Defaults are the measured footprints of the reference object layout;
/// re-measure them for a different allocator or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub per_object_overhead: usize,
    pub reference_size: usize,
    pub identity_footprint: usize,
    pub callback_wrapper_footprint: usize,
    pub array_header: usize,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            per_object_overhead: 16,
            reference_size: 4,
            identity_footprint: 56,
            callback_wrapper_footprint: 194,
            array_header: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflationConfig {
    pub enabled: bool,
}

impl Default for ConflationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub format: LogFormat,
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            format: LogFormat::Compact,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfigOverride {
    pub per_object_overhead: Option<usize>,
    pub reference_size: Option<usize>,
    pub identity_footprint: Option<usize>,
    pub callback_wrapper_footprint: Option<usize>,
    pub array_header: Option<usize>,
}

impl SizingConfigOverride {
    pub fn apply_to(&self, target: &mut SizingConfig) {
        if let Some(value) = self.per_object_overhead {
            target.per_object_overhead = value;
        }
        if let Some(value) = self.reference_size {
            target.reference_size = value;
        }
        if let Some(value) = self.identity_footprint {
            target.identity_footprint = value;
        }
        if let Some(value) = self.callback_wrapper_footprint {
            target.callback_wrapper_footprint = value;
        }
        if let Some(value) = self.array_header {
            target.array_header = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflationConfigOverride {
    pub enabled: Option<bool>,
}

impl ConflationConfigOverride {
    pub fn apply_to(&self, target: &mut ConflationConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub format: Option<LogFormat>,
    pub filter: Option<String>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
    }
}

/// One config file's worth of overrides; absent keys leave the base alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub sizing: SizingConfigOverride,
    pub conflation: ConflationConfigOverride,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, base: &mut Config) {
        self.sizing.apply_to(&mut base.sizing);
        self.conflation.apply_to(&mut base.conflation);
        self.logging.apply_to(&mut base.logging);
    }
}

//! Config loading: TOML layers merged in order over the defaults.

mod load;
mod merge;
mod schema;

pub use load::{ConfigError, load, load_layer, load_or_default};
pub use merge::merge_layers;
pub use schema::{
    Config, ConfigLayer, ConflationConfig, ConflationConfigOverride, LogFormat, LoggingConfig,
    LoggingConfigOverride, SizingConfig, SizingConfigOverride,
};

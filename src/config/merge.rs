use super::{Config, ConfigLayer};

/// Layers apply in order; later layers win.
pub fn merge_layers<I>(layers: I) -> Config
where
    I: IntoIterator<Item = ConfigLayer>,
{
    let mut config = Config::default();
    for layer in layers {
        layer.apply_to(&mut config);
    }
    config
}

mod settings;

pub use settings::{ConfigError, RuntimeConfig, TomlConfig, EXAMPLE_CONFIG};

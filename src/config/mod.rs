mod settings;

pub use settings::{save_setting, Config, TomlConfig, EXAMPLE_CONFIG, SETTING_KEYS};

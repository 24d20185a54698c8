// Evsync Config API
// TOML configuration and per-device option resolution

mod options;
pub mod parser;

pub use options::DeviceOptions;
pub use parser::{default_config_content, Config, ConfigToml, DeviceRule};

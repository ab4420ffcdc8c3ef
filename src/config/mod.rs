//! Configuration file and credential resolution.

mod file;

pub use file::{CONFIG_FILE_NAME, Config, ConfigError, MINIMAX_GROUP_ID_ENV, ProviderConfig};

pub mod data;
pub mod defaults;
pub mod io;
pub mod resolve;

pub use data::{ChatConfig, Config, Settings};
pub use io::ConfigError;
pub use resolve::{Overrides, SettingsSource, SystemSource};

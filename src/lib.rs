pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::GooglePlacesClient;
pub use config::AppConfig;
pub use core::DiscoveryWorkflow;
pub use utils::error::{PickerError, Result};

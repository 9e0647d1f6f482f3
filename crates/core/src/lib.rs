//! Climate API Core Library
//!
//! Shared pieces for the climate API service:
//! - Configuration loading (XDG-compliant)
//! - Dataset file checks
//! - Defaults

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{check_dataset, is_file, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "climate-api";

/// Default listen port
pub const DEFAULT_API_PORT: u16 = 5000;

/// Default dataset location
pub const DEFAULT_DATABASE: &str = "./Resources/hawaii.sqlite";

/// Last date present in the bundled dataset snapshot
pub const DEFAULT_ANCHOR_DATE: &str = "2017-08-23";

/// Length of the trailing window ending at the anchor date
pub const DEFAULT_TRAILING_DAYS: u16 = 365;

/// Station with the most observations in the bundled dataset
pub const DEFAULT_MOST_ACTIVE_STATION: &str = "USC00519281";

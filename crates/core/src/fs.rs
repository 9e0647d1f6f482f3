//! Filesystem checks for the dataset file

use std::path::Path;

use log::{info, warn};

/// Check if a path exists
pub fn path_exists(path: &str) -> bool {
    Path::new(path).exists()
}

/// Check if a path points at a regular file
pub fn is_file(path: &str) -> bool {
    Path::new(path).is_file()
}

/// Report whether the dataset file is where the configuration says it is.
///
/// A missing dataset is not fatal at startup: every request that needs it will
/// fail on its own until the file appears.
pub fn check_dataset(path: &str) -> bool {
    if is_file(path) {
        info!("Dataset found at {}", path);
        true
    } else if path_exists(path) {
        warn!("Dataset path {} exists but is not a file", path);
        false
    } else {
        warn!("Dataset not found at {}", path);
        false
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Installed model filename -> absolute, normalized path.
pub type ModelInventory = BTreeMap<String, PathBuf>;

/// Custom node folder name -> absolute, normalized path.
pub type CustomNodeInventory = BTreeMap<String, PathBuf>;

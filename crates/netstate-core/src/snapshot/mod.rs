// # Snapshots
//
// A snapshot is a complete desired (or captured) network state: every
// interface, every assigned address and every route. Applying one through
// `NetStateEngine::apply_snapshot` reconciles the engine against it in a
// single bulk update.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "taken_at": "2025-01-09T12:00:00Z",
//   "interfaces": [{"id": 5, "name": "eth0", "flags": {"up": true, "running": true}}],
//   "addresses": [{"local": "10.0.0.2", "iface_id": 5, "prefix_len": 24}],
//   "routes": [{"dst": "0.0.0.0", "dst_prefix_len": 0, "iface_out": 5}]
// }
// ```
//
// Saving writes a temporary file next to the target and renames it, so a
// crash never leaves a half-written snapshot behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::Error;
use crate::model::{AddressSet, Interface, RouteSet};

/// Snapshot file format version
const SNAPSHOT_FILE_VERSION: &str = "1.0";

/// Complete network state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the state was captured
    #[serde(default = "Utc::now")]
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub addresses: AddressSet,
    #[serde(default)]
    pub routes: RouteSet,
}

/// On-disk wrapper carrying the format version
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: String,
    #[serde(flatten)]
    snapshot: Snapshot,
}

impl Snapshot {
    /// Create an empty snapshot stamped with the current time
    pub fn new() -> Self {
        Self {
            taken_at: Utc::now(),
            interfaces: Vec::new(),
            addresses: AddressSet::new(),
            routes: RouteSet::new(),
        }
    }

    /// Load a snapshot from a JSON file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::snapshot(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let file: SnapshotFile = serde_json::from_str(&content).map_err(|e| {
            Error::snapshot(format!("Invalid snapshot {}: {}", path.display(), e))
        })?;

        if file.version != SNAPSHOT_FILE_VERSION {
            return Err(Error::snapshot(format!(
                "Unsupported snapshot version {} in {}",
                file.version,
                path.display()
            )));
        }

        debug!(
            "Loaded snapshot {} with {} interface(s)",
            path.display(),
            file.snapshot.interfaces.len()
        );
        Ok(file.snapshot)
    }

    /// Atomically write the snapshot as JSON
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let file = SnapshotFile {
            version: SNAPSHOT_FILE_VERSION.to_string(),
            snapshot: self.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = path.with_extension("tmp");
        let mut tmp = fs::File::create(&tmp_path).await?;
        tmp.write_all(json.as_bytes()).await?;
        tmp.sync_all().await?;
        drop(tmp);

        fs::rename(&tmp_path, path).await?;
        debug!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

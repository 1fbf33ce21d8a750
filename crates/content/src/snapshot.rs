use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Serialize, Deserialize, Debug)]
struct SnapshotEnvelope {
    key: String,
    saved_ms: u64,
    content: String,
}

/// A restored snapshot and how long ago it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    /// Zero for timestamps in the future.
    pub age: Duration,
}

/// Best-effort on-disk copies of loaded topics. Every failure is logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn load(&self, key: &str) -> Option<Snapshot> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<SnapshotEnvelope>(&bytes) {
            Ok(envelope) if envelope.key == key && !envelope.content.is_empty() => {
                Some(Snapshot {
                    age: Duration::from_millis(unix_ms_now().saturating_sub(envelope.saved_ms)),
                    content: envelope.content,
                })
            }
            Ok(_) => None,
            Err(err) => {
                log::warn!("Snapshot corrupted {}: {err}", path.display());
                None
            }
        }
    }

    pub async fn save(&self, key: &str, content: &str) {
        if let Err(err) = self.try_save(key, content).await {
            log::debug!("Snapshot for '{key}' not written: {err}");
        }
    }

    async fn try_save(&self, key: &str, content: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let envelope = SnapshotEnvelope {
            key: key.to_string(),
            saved_ms: unix_ms_now(),
            content: content.to_string(),
        };
        let bytes = serde_json::to_vec(&envelope).map_err(std::io::Error::other)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }
        Ok(())
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

use std::{io::ErrorKind, marker::PhantomData, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// A whole-file JSON document. Used for small state that is rewritten as a unit, such as
/// calendar marks or the todo grid.
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned + Default> JsonDocument<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Reads the document. A missing or unreadable document is replaced with the default value.
    pub async fn load(&self) -> T {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Document {:?} is corrupted, using defaults: {e}", self.path);
                    T::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Document {:?} doesn't exist yet", self.path);
                T::default()
            }
            Err(e) => {
                warn!("Failed to read {:?}, using defaults: {e}", self.path);
                T::default()
            }
        }
    }

    /// Replaces the document. Written through a temporary file so a crash never leaves half a
    /// document behind.
    pub async fn save(&self, value: &T) -> Result<()> {
        let content = serde_json::to_vec_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {tmp:?}"))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::JsonDocument;

    #[tokio::test]
    async fn test_document_round_trip_and_fallback() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("doc.json");
        let document = JsonDocument::<BTreeMap<String, u32>>::new(path.clone());

        assert!(document.load().await.is_empty());

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1);
        document.save(&value).await?;
        assert_eq!(document.load().await, value);

        std::fs::write(&path, "{ broken")?;
        assert!(document.load().await.is_empty());
        Ok(())
    }
}

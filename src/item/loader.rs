//! Loading saved item descriptors from metadata files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{ItemDescriptor, Post, Profile, StoryItem};

/// Errors that can occur while loading a saved descriptor.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not a descriptor envelope
    #[error("invalid descriptor in {path}: {source}\n  Suggestion: pass a metadata file written by a previous run")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Compressed descriptors need a loader with decompression support
    #[error("{path}: compressed descriptors (.json.xz) are not supported by this build")]
    UnsupportedCompression { path: PathBuf },
}

/// Resolves a local file into an [`ItemDescriptor`].
pub trait DescriptorLoader: Send + Sync {
    /// Loads the descriptor stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read or decoded.
    fn load(&self, path: &Path) -> Result<ItemDescriptor, LoadError>;
}

/// On-disk envelope: `{"node_type": "...", "node": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDescriptor {
    pub node_type: String,
    pub node: serde_json::Value,
}

impl SavedDescriptor {
    /// Decodes the node according to its declared type.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if the node does not match its type.
    pub fn into_descriptor(self) -> Result<ItemDescriptor, serde_json::Error> {
        let descriptor = match self.node_type.as_str() {
            "Post" => ItemDescriptor::Post(serde_json::from_value::<Post>(self.node)?),
            "StoryItem" => {
                ItemDescriptor::StoryItem(serde_json::from_value::<StoryItem>(self.node)?)
            }
            "Profile" => ItemDescriptor::Profile(serde_json::from_value::<Profile>(self.node)?),
            _ => ItemDescriptor::Other {
                node_type: self.node_type,
            },
        };
        Ok(descriptor)
    }
}

/// Loader for plain JSON descriptor files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDescriptorLoader;

impl DescriptorLoader for JsonDescriptorLoader {
    fn load(&self, path: &Path) -> Result<ItemDescriptor, LoadError> {
        if path.extension().is_some_and(|extension| extension == "xz") {
            return Err(LoadError::UnsupportedCompression {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json_error = |source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        };
        let envelope: SavedDescriptor = serde_json::from_str(&content).map_err(json_error)?;
        let descriptor = envelope.into_descriptor().map_err(json_error)?;
        debug!(path = %path.display(), node_type = descriptor.type_name(), "Loaded descriptor");
        Ok(descriptor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_post_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "post.json",
            r#"{"node_type": "Post", "node": {"shortcode": "CaB1", "owner_username": "alice",
                "date_utc": "2021-07-04T08:00:00", "likes": 12}}"#,
        );

        let descriptor = JsonDescriptorLoader.load(&path).unwrap();
        match descriptor {
            ItemDescriptor::Post(post) => {
                assert_eq!(post.shortcode, "CaB1");
                assert_eq!(post.likes, 12);
            }
            other => panic!("expected a post, got {other:?}"),
        }
    }

    #[test]
    fn test_load_profile_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "alice.json",
            r#"{"node_type": "Profile", "node": {"username": "alice"}}"#,
        );
        assert_eq!(
            JsonDescriptorLoader.load(&path).unwrap(),
            ItemDescriptor::Profile(Profile::new("alice"))
        );
    }

    #[test]
    fn test_unknown_node_type_is_other() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tag.json", r#"{"node_type": "Hashtag", "node": {}}"#);
        assert_eq!(
            JsonDescriptorLoader.load(&path).unwrap().type_name(),
            "Hashtag"
        );
    }

    #[test]
    fn test_compressed_descriptor_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "post.json.xz", "not really xz");
        assert!(matches!(
            JsonDescriptorLoader.load(&path).unwrap_err(),
            LoadError::UnsupportedCompression { .. }
        ));
    }

    #[test]
    fn test_malformed_descriptor_reports_json_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.json", "{");
        assert!(matches!(
            JsonDescriptorLoader.load(&path).unwrap_err(),
            LoadError::Json { .. }
        ));
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonDescriptorLoader
            .load(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

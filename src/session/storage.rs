//! Session file persistence.
//!
//! Session files live at `$XDG_CONFIG_HOME/instaloader/session-<account>`
//! (falling back to `~/.config/instaloader/` and then `%APPDATA%\instaloader\`)
//! unless `--sessionfile` names another path. Files are written owner-only on
//! unix.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::transport::Credential;

const APP_DIR_NAME: &str = "instaloader";
const SESSION_FILE_PREFIX: &str = "session-";

/// Errors for session file operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// On-disk session: `{"username": ..., "credential": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub username: String,
    pub credential: Credential,
}

/// Default session file path for `account`.
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_session_path(account: &str) -> Result<PathBuf, StorageError> {
    Ok(default_config_dir()?.join(format!("{SESSION_FILE_PREFIX}{account}")))
}

/// Reads a session file; `Ok(None)` if it does not exist.
///
/// # Errors
///
/// Returns [`StorageError`] if the file exists but cannot be read or decoded.
pub fn load_session_file(path: &Path) -> Result<Option<StoredSession>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Writes a session file, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`StorageError`] if serialization or any filesystem step fails.
pub fn save_session_file(path: &Path, session: &StoredSession) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let contents = serde_json::to_vec(session)?;
    let mut file = create_owner_only(path)?;
    file.write_all(&contents)?;
    Ok(())
}

fn default_config_dir() -> Result<PathBuf, StorageError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(StorageError::ConfigDirUnavailable)
}

/// Opens `path` for writing, truncated and readable by the owner only.
///
/// New files are created with mode `0600`; an existing file is narrowed to
/// `0600` before anything is written to it.
#[cfg(unix)]
fn create_owner_only(path: &Path) -> Result<File, StorageError> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_owner_only(path: &Path) -> Result<File, StorageError> {
    Ok(File::create(path)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample() -> StoredSession {
        StoredSession {
            username: "alice".to_string(),
            credential: Credential::new("token-1"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("nested").join("session-alice");

        save_session_file(&path, &sample()).unwrap();
        assert_eq!(load_session_file(&path).unwrap(), Some(sample()));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("session-nobody");
        assert!(load_session_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("session-alice");
        fs::write(&path, b"\x00not json").unwrap();
        assert!(matches!(
            load_session_file(&path),
            Err(StorageError::Json(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("session-alice");
        save_session_file(&path, &sample()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_resave_narrows_existing_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("session-alice");
        fs::write(&path, b"stale session contents that are longer").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        save_session_file(&path, &sample()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load_session_file(&path).unwrap(), Some(sample()));
    }

    #[test]
    fn test_resolve_config_dir_prefers_xdg() {
        let dir = resolve_config_dir(
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
            Some(PathBuf::from("C:/AppData")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/xdg/instaloader"));
    }

    #[test]
    fn test_resolve_config_dir_falls_back_to_home_then_appdata() {
        assert_eq!(
            resolve_config_dir(None, Some(PathBuf::from("/home/u")), None).unwrap(),
            PathBuf::from("/home/u/.config/instaloader")
        );
        assert_eq!(
            resolve_config_dir(None, None, Some(PathBuf::from("/appdata"))).unwrap(),
            PathBuf::from("/appdata/instaloader")
        );
        assert!(matches!(
            resolve_config_dir(None, None, None),
            Err(StorageError::ConfigDirUnavailable)
        ));
    }

    #[test]
    fn test_sanitize_env_path_ignores_blank_values() {
        assert!(sanitize_env_path(Some(OsString::from("  "))).is_none());
        assert!(sanitize_env_path(None).is_none());
        assert_eq!(
            sanitize_env_path(Some(OsString::from("/x"))),
            Some(PathBuf::from("/x"))
        );
    }
}

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Sibling temp path used while writing `path`
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes to a file atomically.
///
/// Writes to a temp file in the same directory, syncs it, then renames it over
/// the target. A crash leaves either the old or the new document, never a
/// truncated one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let temp = temp_path(path);
    {
        let mut file = File::create(&temp).map_err(|e| StoreError::io(&temp, e))?;
        file.write_all(bytes).map_err(|e| StoreError::io(&temp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&temp, e))?;
    }

    fs::rename(&temp, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_atomic(&path, b"{\"a\":1}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/var/lib/warden/risk_state.json");
        assert_eq!(
            temp_path(path),
            PathBuf::from("/var/lib/warden/risk_state.json.tmp")
        );
    }
}

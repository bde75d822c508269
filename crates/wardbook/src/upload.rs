//! Photo uploads.
//!
//! Uploaded photos are moved into a single directory under a sanitised,
//! timestamp-prefixed name. Records store the path relative to the web root,
//! `<url_prefix>/<file>`, which is also where the web layer serves them.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("Invalid regex pattern"))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Works per Unicode scalar value, so a multi-byte character becomes a
/// single `_` rather than one per byte.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    unsafe_chars().replace_all(name, "_").into_owned()
}

/// The final path component of a client-supplied file name.
///
/// Browsers on some platforms send the full local path, with either
/// separator.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

/// The on-disk name for an upload received at `timestamp` (Unix seconds).
///
/// Returns `None` when nothing usable remains of the client name.
#[must_use]
pub fn stored_file_name(original: &str, timestamp: i64) -> Option<String> {
    let base = base_name(original);
    if base.is_empty() {
        return None;
    }
    Some(format!("{timestamp}_{}", sanitize_file_name(base)))
}

/// The uploads directory and the URL prefix its files are served under.
#[derive(Debug, Clone)]
pub struct UploadStore {
    directory: PathBuf,
    url_prefix: String,
}

impl UploadStore {
    /// Create a store rooted at `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Create a store from the `[uploads]` configuration section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.uploads_dir(), config.uploads.url_prefix.clone())
    }

    /// The directory photos are stored in.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The prefix of every stored relative path.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Create the uploads directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_directory(&self) -> Result<()> {
        if !self.directory.exists() {
            std::fs::create_dir_all(&self.directory).map_err(|source| {
                Error::DirectoryCreate {
                    path: self.directory.clone(),
                    source,
                }
            })?;
            debug!("Created uploads directory {}", self.directory.display());
        }
        Ok(())
    }

    /// Move a received file into the uploads directory.
    ///
    /// `source` is the temporary file holding the upload, `original_name`
    /// the name the client sent and `size` the number of bytes received.
    /// Returns the relative path to store with the record, or `None` when
    /// no file was actually submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be moved or copied into place.
    pub fn store(
        &self,
        source: &Path,
        original_name: Option<&str>,
        size: usize,
    ) -> Result<Option<String>> {
        if size == 0 {
            return Ok(None);
        }
        let Some(file_name) =
            original_name.and_then(|name| stored_file_name(name, Utc::now().timestamp()))
        else {
            return Ok(None);
        };

        self.ensure_directory()?;
        let destination = self.directory.join(&file_name);

        // Temporary files may live on another filesystem
        if std::fs::rename(source, &destination).is_err() {
            std::fs::copy(source, &destination).map_err(|source| Error::UploadStore {
                path: destination.clone(),
                source,
            })?;
        }

        debug!("Stored upload at {}", destination.display());
        Ok(Some(format!("{}/{}", self.url_prefix, file_name)))
    }

    /// Remove a previously stored upload, given its relative path.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn discard(&self, relative_path: &str) {
        let Some(path) = relative_path
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|name| self.resolve(name))
        else {
            warn!("Not discarding upload outside the store: {}", relative_path);
            return;
        };

        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Discarded upload {}", path.display()),
            Err(e) => warn!("Failed to discard upload {}: {}", path.display(), e),
        }
    }

    /// Map a requested file name to its path in the uploads directory.
    ///
    /// Only names that could have been produced by [`stored_file_name`] are
    /// accepted, so nothing outside the directory is reachable.
    #[must_use]
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.starts_with('.')
            || sanitize_file_name(file_name) != file_name
        {
            return None;
        }
        Some(self.directory.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_upload(dir: &Path, contents: &[u8]) -> PathBuf {
        let path = dir.join("incoming.tmp");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("na\u{ef}ve.png"), "na_ve.png");
        assert_eq!(sanitize_file_name("\u{1f600}.jpg"), "_.jpg");
        assert_eq!(sanitize_file_name("a-b_c.D9"), "a-b_c.D9");
    }

    #[test]
    fn test_stored_file_name_prefixes_timestamp() {
        assert_eq!(
            stored_file_name("passport photo.jpg", 1_700_000_000).as_deref(),
            Some("1700000000_passport_photo.jpg")
        );
    }

    #[test]
    fn test_stored_file_name_takes_basename() {
        assert_eq!(
            stored_file_name("../../etc/passwd", 1).as_deref(),
            Some("1_passwd")
        );
        assert_eq!(
            stored_file_name(r"C:\Users\ada\face.png", 1).as_deref(),
            Some("1_face.png")
        );
    }

    #[test]
    fn test_stored_file_name_empty() {
        assert_eq!(stored_file_name("", 1), None);
        assert_eq!(stored_file_name("dir/", 1), None);
    }

    #[test]
    fn test_store_moves_file() {
        let incoming = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let store = UploadStore::new(uploads.path().join("photos"), "uploads");
        let source = temp_upload(incoming.path(), b"jpeg bytes");

        let relative = store
            .store(&source, Some("face shot.jpg"), 10)
            .unwrap()
            .unwrap();

        assert!(relative.starts_with("uploads/"));
        assert!(relative.ends_with("_face_shot.jpg"));

        let name = relative.strip_prefix("uploads/").unwrap();
        let stored = store.directory().join(name);
        assert_eq!(std::fs::read(stored).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_store_without_file_is_none() {
        let incoming = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let store = UploadStore::new(uploads.path(), "uploads");
        let source = temp_upload(incoming.path(), b"");

        assert_eq!(store.store(&source, Some("empty.jpg"), 0).unwrap(), None);
        assert_eq!(store.store(&source, None, 5).unwrap(), None);
        assert_eq!(store.store(&source, Some(""), 5).unwrap(), None);
    }

    #[test]
    fn test_store_missing_source_errors() {
        let uploads = tempfile::tempdir().unwrap();
        let store = UploadStore::new(uploads.path(), "uploads");

        let err = store
            .store(Path::new("/nonexistent/upload.tmp"), Some("a.jpg"), 3)
            .unwrap_err();
        assert!(matches!(err, Error::UploadStore { .. }));
    }

    #[test]
    fn test_discard_removes_file() {
        let incoming = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let store = UploadStore::new(uploads.path(), "uploads");
        let source = temp_upload(incoming.path(), b"data");

        let relative = store.store(&source, Some("kid.png"), 4).unwrap().unwrap();
        let name = relative.strip_prefix("uploads/").unwrap().to_string();
        assert!(store.directory().join(&name).exists());

        store.discard(&relative);
        assert!(!store.directory().join(&name).exists());
    }

    #[test]
    fn test_discard_ignores_foreign_paths() {
        let uploads = tempfile::tempdir().unwrap();
        let store = UploadStore::new(uploads.path(), "uploads");
        // Must not panic or touch anything
        store.discard("elsewhere/file.png");
        store.discard("uploads/../secret");
    }

    #[test]
    fn test_resolve_rejects_unsanitised_names() {
        let store = UploadStore::new("/srv/uploads", "uploads");
        assert_eq!(
            store.resolve("1700000000_a.jpg"),
            Some(PathBuf::from("/srv/uploads/1700000000_a.jpg"))
        );
        assert_eq!(store.resolve(""), None);
        assert_eq!(store.resolve(".."), None);
        assert_eq!(store.resolve(".hidden"), None);
        assert_eq!(store.resolve("a/b.jpg"), None);
        assert_eq!(store.resolve("a b.jpg"), None);
    }

    #[test]
    fn test_ensure_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path().join("a/b/uploads"), "uploads");
        store.ensure_directory().unwrap();
        assert!(store.directory().is_dir());
        store.ensure_directory().unwrap();
    }
}

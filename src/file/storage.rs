//! Physical file storage for filerelay.
//!
//! Files are addressed by caller-supplied relative names beneath a single
//! storage root:
//! - names are normalized lexically and may not climb above the root
//! - resolved parents are re-checked after symlink resolution
//! - uploads land in a temporary sibling and are renamed into place

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::{RelayError, Result};

const TEMP_SUFFIX: &str = ".part";

/// Streaming file storage rooted at a single directory.
///
/// ```text
/// {base_path}/
/// ├── report.pdf
/// ├── documents/
/// │   └── notes.txt
/// └── documents/.<uuid>.part   (in-flight upload)
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Storage root.
    base_path: PathBuf,
    /// Upload limit in bytes, `None` for unbounded uploads.
    max_upload_size: Option<u64>,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            max_upload_size: None,
        })
    }

    /// Set the maximum number of bytes a single upload may write.
    pub fn with_max_upload_size(mut self, limit: Option<u64>) -> Self {
        self.max_upload_size = limit;
        self
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the configured upload limit in bytes.
    pub fn max_upload_size(&self) -> Option<u64> {
        self.max_upload_size
    }

    /// Resolve a logical filename to its on-disk path under the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        Ok(self.base_path.join(clean_name(name)?))
    }

    /// Stream `reader` into the file called `name`, replacing any previous content.
    ///
    /// Returns the number of bytes written. Readers see either the old file or
    /// the complete new one, never a partial upload.
    pub async fn save<R>(&self, name: &str, reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let target = self.resolve(name)?;
        let parent = match target.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.base_path.clone(),
        };

        fs::create_dir_all(&parent).await?;
        self.ensure_within_root(&parent, name).await?;

        // The temp name is independent of the target name so it never outgrows
        // the filesystem's name length limit.
        let temp_path = parent.join(temp_upload_name(Uuid::new_v4()));

        let written = match self.write_temp(&temp_path, reader).await {
            Ok(written) => written,
            Err(e) => {
                discard_temp(&temp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, &target).await {
            discard_temp(&temp_path).await;
            return Err(e.into());
        }

        Ok(written)
    }

    async fn write_temp<R>(&self, temp_path: &Path, reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut file = File::create(temp_path).await?;

        let written = match self.max_upload_size {
            Some(limit) => {
                // One byte past the limit is enough to detect an oversized body.
                let mut limited = reader.take(limit.saturating_add(1));
                let written = tokio::io::copy(&mut limited, &mut file).await?;
                if written > limit {
                    return Err(RelayError::PayloadTooLarge(limit));
                }
                written
            }
            None => {
                let mut reader = reader;
                tokio::io::copy(&mut reader, &mut file).await?
            }
        };

        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }

    /// Open a stored file for streaming reads.
    ///
    /// The handle is closed when dropped.
    pub async fn load(&self, name: &str) -> Result<File> {
        let path = self.resolve(name)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RelayError::NotFound(format!("File: {name}")));
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(RelayError::NotFound(format!("File: {name}")));
        }

        self.ensure_within_root(&path, name).await?;

        Ok(File::open(&path).await?)
    }

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;

        if let Some(parent) = path.parent() {
            match self.ensure_within_root(parent, name).await {
                Ok(()) => {}
                Err(RelayError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether `name` is a stored regular file.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.file_size(name).await {
            Ok(_) => Ok(true),
            Err(RelayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size in bytes of a stored file.
    pub async fn file_size(&self, name: &str) -> Result<u64> {
        let path = self.resolve(name)?;

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {
                self.ensure_within_root(&path, name).await?;
                Ok(metadata.len())
            }
            Ok(_) => Err(RelayError::NotFound(format!("File: {name}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(RelayError::NotFound(format!("File: {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fail unless `path`, with symlinks resolved, still lies under the root.
    async fn ensure_within_root(&self, path: &Path, name: &str) -> Result<()> {
        let root = fs::canonicalize(&self.base_path).await?;
        let resolved = fs::canonicalize(path).await?;

        if resolved.starts_with(&root) {
            Ok(())
        } else {
            Err(RelayError::Validation(format!(
                "path escapes storage root: {name}"
            )))
        }
    }
}

fn temp_upload_name(id: Uuid) -> String {
    format!(".{}{}", id, TEMP_SUFFIX)
}

/// Whether `name` is an in-flight upload written by [`FileStorage::save`].
pub fn is_temp_upload(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_SUFFIX))
        .is_some_and(|id| Uuid::parse_str(id).is_ok())
}

async fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary upload");
        }
    }
}

/// Normalize a caller-supplied filename into a path relative to the storage root.
///
/// `.` segments are dropped, `..` segments consume their parent, and root or
/// drive prefixes are ignored so `/etc/x` lands at `<root>/etc/x`. A name that
/// climbs above the root or names nothing is rejected.
pub fn clean_name(name: &str) -> Result<PathBuf> {
    let mut parts = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(RelayError::Validation(format!(
                        "path escapes storage root: {name}"
                    )));
                }
            }
            Component::Normal(part) => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(RelayError::Validation(format!(
            "filename does not name a file: {name:?}"
        )));
    }

    Ok(parts.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store")).unwrap();
        (temp_dir, storage)
    }

    async fn read_all(storage: &FileStorage, name: &str) -> Vec<u8> {
        let mut file = storage.load(name).await.unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).await.unwrap();
        content
    }

    fn part_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".part"))
            .collect()
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("nested").join("storage");

        assert!(!storage_path.exists());

        let storage = FileStorage::new(&storage_path).unwrap();

        assert!(storage_path.is_dir());
        assert_eq!(storage.base_path(), storage_path);
        assert_eq!(storage.max_upload_size(), None);
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("a.txt").unwrap(), PathBuf::from("a.txt"));
        assert_eq!(clean_name("./a.txt").unwrap(), PathBuf::from("a.txt"));
        assert_eq!(clean_name("docs/../a.txt").unwrap(), PathBuf::from("a.txt"));
        assert_eq!(
            clean_name("docs//notes/./n.md").unwrap(),
            PathBuf::from("docs/notes/n.md")
        );
        assert_eq!(
            clean_name("/etc/passwd").unwrap(),
            PathBuf::from("etc/passwd")
        );
    }

    #[test]
    fn test_clean_name_rejects_escape() {
        assert!(matches!(
            clean_name("../secret"),
            Err(RelayError::Validation(_))
        ));
        assert!(matches!(
            clean_name("docs/../../secret"),
            Err(RelayError::Validation(_))
        ));
        assert!(matches!(
            clean_name("/../secret"),
            Err(RelayError::Validation(_))
        ));
    }

    #[test]
    fn test_clean_name_rejects_empty() {
        assert!(matches!(clean_name(""), Err(RelayError::Validation(_))));
        assert!(matches!(clean_name("."), Err(RelayError::Validation(_))));
        assert!(matches!(clean_name("a/.."), Err(RelayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp_dir, storage) = setup_storage();
        let content = b"Hello, World!";

        let written = storage.save("hello.txt", &content[..]).await.unwrap();

        assert_eq!(written, content.len() as u64);
        assert_eq!(read_all(&storage, "hello.txt").await, content);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let (_temp_dir, storage) = setup_storage();

        storage
            .save("documents/2024/report.csv", &b"a,b"[..])
            .await
            .unwrap();

        let dir = storage.base_path().join("documents").join("2024");
        assert!(dir.is_dir());
        assert_eq!(read_all(&storage, "documents/2024/report.csv").await, b"a,b");
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("a.txt", &b"first version"[..]).await.unwrap();
        storage.save("a.txt", &b"second"[..]).await.unwrap();

        assert_eq!(read_all(&storage, "a.txt").await, b"second");
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("a.txt", &b"data"[..]).await.unwrap();

        assert!(part_files(storage.base_path()).is_empty());
    }

    #[tokio::test]
    async fn test_save_long_filename() {
        let (_temp_dir, storage) = setup_storage();
        let name = "a".repeat(240);

        let written = storage.save(&name, &b"hi"[..]).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(read_all(&storage, &name).await, b"hi");
        assert!(part_files(storage.base_path()).is_empty());
    }

    #[test]
    fn test_is_temp_upload() {
        assert!(is_temp_upload(&temp_upload_name(Uuid::new_v4())));
        assert!(!is_temp_upload("report.part"));
        assert!(!is_temp_upload(".draft.part"));
        assert!(!is_temp_upload(".bashrc"));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_upload() {
        let (_temp_dir, storage) = setup_storage();
        let storage = storage.with_max_upload_size(Some(8));

        let result = storage.save("big.bin", &[0u8; 9][..]).await;

        assert!(matches!(result, Err(RelayError::PayloadTooLarge(8))));
        assert!(!storage.base_path().join("big.bin").exists());
        assert!(part_files(storage.base_path()).is_empty());
    }

    #[tokio::test]
    async fn test_save_accepts_upload_at_limit() {
        let (_temp_dir, storage) = setup_storage();
        let storage = storage.with_max_upload_size(Some(8));

        let written = storage.save("exact.bin", &[7u8; 8][..]).await.unwrap();

        assert_eq!(written, 8);
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_previous_content() {
        let (_temp_dir, storage) = setup_storage();
        let storage = storage.with_max_upload_size(Some(4));

        storage.save("keep.txt", &b"old"[..]).await.unwrap();
        let result = storage.save("keep.txt", &b"too large"[..]).await;

        assert!(result.is_err());
        assert_eq!(read_all(&storage, "keep.txt").await, b"old");
    }

    #[tokio::test]
    async fn test_save_reader_error_discards_upload() {
        let (_temp_dir, storage) = setup_storage();

        let reader = tokio_test::io::Builder::new()
            .read(b"partial")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "client went away"))
            .build();
        let result = storage.save("broken.bin", reader).await;

        assert!(matches!(result, Err(RelayError::Io(_))));
        assert!(!storage.base_path().join("broken.bin").exists());
        assert!(part_files(storage.base_path()).is_empty());
    }

    #[tokio::test]
    async fn test_save_traversal_rejected() {
        let (temp_dir, storage) = setup_storage();

        let result = storage.save("../escaped.txt", &b"x"[..]).await;

        assert!(matches!(result, Err(RelayError::Validation(_))));
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_through_symlink_rejected() {
        let (temp_dir, storage) = setup_storage();
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, storage.base_path().join("link")).unwrap();

        let result = storage.save("link/evil.txt", &b"x"[..]).await;

        assert!(matches!(result, Err(RelayError::Validation(_))));
        assert!(!outside.join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_load_through_symlink_rejected() {
        let (temp_dir, storage) = setup_storage();
        let secret = temp_dir.path().join("secret.txt");
        std::fs::write(&secret, b"secret").unwrap();
        std::os::unix::fs::symlink(&secret, storage.base_path().join("alias.txt")).unwrap();

        let result = storage.load("alias.txt").await;

        assert!(matches!(result, Err(RelayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.load("nonexistent.txt").await;

        assert!(matches!(result, Err(RelayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_directory_is_not_found() {
        let (_temp_dir, storage) = setup_storage();
        std::fs::create_dir_all(storage.base_path().join("folder")).unwrap();

        let result = storage.load("folder").await;

        assert!(matches!(result, Err(RelayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("delete.txt", &b"to delete"[..]).await.unwrap();

        assert!(storage.delete("delete.txt").await.unwrap());
        assert!(matches!(
            storage.load("delete.txt").await,
            Err(RelayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_temp_dir, storage) = setup_storage();

        assert!(!storage.delete("nonexistent.txt").await.unwrap());
        assert!(!storage.delete("missing_dir/nonexistent.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_and_file_size() {
        let (_temp_dir, storage) = setup_storage();
        storage.save("docs/a.txt", &b"12345"[..]).await.unwrap();

        assert!(storage.exists("docs/a.txt").await.unwrap());
        assert_eq!(storage.file_size("docs/a.txt").await.unwrap(), 5);

        assert!(!storage.exists("missing.txt").await.unwrap());
        assert!(!storage.exists("docs").await.unwrap());
        assert!(matches!(
            storage.file_size("missing.txt").await,
            Err(RelayError::NotFound(_))
        ));
        assert!(matches!(
            storage.exists("../a.txt").await,
            Err(RelayError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_binary_content() {
        let (_temp_dir, storage) = setup_storage();
        let content: Vec<u8> = (0..=255).collect();

        storage.save("binary.bin", &content[..]).await.unwrap();

        assert_eq!(read_all(&storage, "binary.bin").await, content);
    }

    #[tokio::test]
    async fn test_large_file() {
        let (_temp_dir, storage) = setup_storage();
        let content: Vec<u8> = vec![0xAB; 4 * 1024 * 1024];

        let written = storage.save("large.bin", &content[..]).await.unwrap();

        assert_eq!(written, content.len() as u64);
        assert_eq!(read_all(&storage, "large.bin").await, content);
    }
}

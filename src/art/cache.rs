//! On-disk album-art cache keyed by a hash of the source path.
//!
//! Layout: `<root>/art_cache/<hash8>[.<w>x<h>]<postfix>`. The hash is a
//! 32-bit DJB string hash, so two source paths can collide and share a
//! cache file; nothing here tries to detect that.

use parking_lot::Mutex;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::art::size::ImageSize;
use crate::db::Database;

pub const CACHE_DIR: &str = "art_cache";

/// Postfix of every full-size and resized art entry.
pub const JPEG_POSTFIX: &str = ".jpg";

/// Order-sensitive DJB hash truncated to 32 bits.
pub fn djb_hash(data: &[u8]) -> u32 {
    data.iter().fold(5381u32, |hash, &b| {
        (hash << 5).wrapping_add(hash).wrapping_add(b as u32)
    })
}

pub(crate) fn path_str(path: &Path) -> Cow<'_, str> {
    path.to_string_lossy()
}

#[derive(Debug)]
pub struct ArtCache {
    root: PathBuf,
    // held for the whole of a subtree rename
    rename_lock: Mutex<()>,
}

/// Where a subtree rename came from and went to.
struct RenameWalk<'a> {
    old_root: &'a Path,
    new_root: &'a Path,
}

impl RenameWalk<'_> {
    /// Name the entry had before the rename. A renamed file is the root
    /// itself; inside a renamed directory only the prefix changes.
    fn old_path_of(&self, new_path: &Path, depth: usize) -> PathBuf {
        if depth == 0 {
            return self.old_root.to_path_buf();
        }
        match new_path.strip_prefix(self.new_root) {
            Ok(rel) => self.old_root.join(rel),
            Err(_) => self.old_root.join(new_path.file_name().unwrap_or_default()),
        }
    }
}

impl ArtCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rename_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    /// Pure function of its inputs.
    pub fn cache_path(&self, size: Option<ImageSize>, postfix: &str, source: &Path) -> PathBuf {
        let hash = djb_hash(source.as_os_str().as_encoded_bytes());
        let name = match size {
            Some(size) => {
                let spec = size.spec();
                format!("{hash:08x}.{}x{}{postfix}", spec.width, spec.height)
            }
            None => format!("{hash:08x}{postfix}"),
        };
        self.dir().join(name)
    }

    pub fn cache_exists(
        &self,
        size: Option<ImageSize>,
        postfix: &str,
        source: &Path,
    ) -> Option<PathBuf> {
        let path = self.cache_path(size, postfix, source);
        path.exists().then_some(path)
    }

    /// Removes every cached variant of `source` and the matching
    /// `ALBUM_ART` rows. Failures are logged and skipped.
    pub fn cleanup(&self, source: &Path, db: &Database) {
        let sizes = std::iter::once(None).chain(ImageSize::ALL.into_iter().map(Some));

        for size in sizes {
            let Some(cache_file) = self.cache_exists(size, JPEG_POSTFIX, source) else {
                continue;
            };

            if let Err(e) = db.exec(
                "DELETE FROM ALBUM_ART WHERE PATH = ?1",
                &[&path_str(&cache_file)],
            ) {
                tracing::warn!(path = %cache_file.display(), error = %e, "Failed to drop album art row");
            }

            match std::fs::remove_file(&cache_file) {
                Ok(()) => tracing::debug!(path = %cache_file.display(), "Removed cached art"),
                Err(e) => {
                    tracing::warn!(path = %cache_file.display(), error = %e, "Failed to remove cached art")
                }
            }
        }
    }

    /// Follows a file or directory rename from `old_path` to `new_path`.
    ///
    /// Walks the new location depth-first; for every file, moves its
    /// full-size cache entry to the name derived from the new path and
    /// rewrites the `ALBUM_ART` and `DETAILS` paths. Only one rename runs
    /// at a time. Returns the number of cache files moved.
    pub fn rename(&self, old_path: &Path, new_path: &Path, db: &Database) -> usize {
        let _guard = self.rename_lock.lock();
        let walk = RenameWalk {
            old_root: old_path,
            new_root: new_path,
        };

        let mut moved = 0;
        for entry in WalkDir::new(new_path).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %new_path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let old_file = walk.old_path_of(entry.path(), entry.depth());
            if self.rename_entry(&old_file, entry.path(), db) {
                moved += 1;
            }
        }
        moved
    }

    fn rename_entry(&self, old_file: &Path, new_file: &Path, db: &Database) -> bool {
        let old_cache = self.cache_path(None, JPEG_POSTFIX, old_file);
        let new_cache = self.cache_path(None, JPEG_POSTFIX, new_file);

        tracing::debug!(
            old = %old_file.display(),
            old_cache = %old_cache.display(),
            new = %new_file.display(),
            new_cache = %new_cache.display(),
            "Renaming cached art"
        );

        let moved = match std::fs::rename(&old_cache, &new_cache) {
            Ok(()) => {
                if let Err(e) = db.exec(
                    "UPDATE ALBUM_ART SET PATH = ?1 WHERE PATH = ?2",
                    &[&path_str(&new_cache), &path_str(&old_cache)],
                ) {
                    tracing::warn!(path = %old_cache.display(), error = %e, "Error renaming ALBUM_ART entry");
                }
                true
            }
            Err(e) => {
                tracing::debug!(path = %old_cache.display(), error = %e, "Cache rename failed");
                false
            }
        };

        if let Err(e) = db.exec(
            "UPDATE DETAILS SET PATH = ?1 WHERE PATH = ?2",
            &[&path_str(new_file), &path_str(old_file)],
        ) {
            tracing::warn!(path = %old_file.display(), error = %e, "Error renaming DETAILS entry");
        }

        moved
    }
}

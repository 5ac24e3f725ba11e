//! Finds the album art for a media file and records it in `ALBUM_ART`.
//!
//! Sources are tried in order, first hit wins:
//!
//! 1. an image embedded in the file's tags
//! 2. a cover file next to it (`song.mp3.cover.jpg`, `song.jpg`,
//!    `.song.jpg`, then the generic names such as `folder.jpg`)
//! 3. a frame grabbed from the video, when enabled

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::art::cache::{ArtCache, JPEG_POSTFIX, djb_hash, path_str};
use crate::art::memo::EmbeddedArtMemo;
use crate::art::resize::{save_resized_to, save_resized_to_cache};
use crate::art::size::ImageSize;
use crate::config::Config;
use crate::db::Database;
use crate::imaging::Picture;
use crate::media::{is_audio, is_video};
use crate::video::{CommandThumbnailer, VideoThumbnailer};

/// Where in the video the thumbnail frame is taken.
pub const VIDEO_SEEK_SECS: u32 = 20;

const COVER_SUFFIX: &str = ".cover.jpg";

pub struct AlbumArtResolver {
    cache: Arc<ArtCache>,
    db: Arc<Database>,
    names: Vec<String>,
    memo: Mutex<EmbeddedArtMemo>,
    thumbnailer: Option<Arc<dyn VideoThumbnailer>>,
    thumb_width: u32,
}

impl AlbumArtResolver {
    pub fn new(cache: Arc<ArtCache>, db: Arc<Database>, names: Vec<String>) -> Self {
        Self {
            cache,
            db,
            names,
            memo: Mutex::new(EmbeddedArtMemo::new(1)),
            thumbnailer: None,
            thumb_width: 160,
        }
    }

    /// `thumbnailer` overrides the configured frame-extractor program.
    pub fn from_config(
        cfg: &Config,
        cache: Arc<ArtCache>,
        db: Arc<Database>,
        thumbnailer: Option<Arc<dyn VideoThumbnailer>>,
    ) -> Self {
        let mut resolver = Self::new(cache, db, cfg.album_art_names.clone())
            .with_memo_capacity(cfg.embedded_art_memo);
        if cfg.video_thumbnails {
            let thumbnailer: Arc<dyn VideoThumbnailer> = match thumbnailer {
                Some(thumbnailer) => thumbnailer,
                None => Arc::new(CommandThumbnailer::new(cfg.thumbnailer.clone())),
            };
            resolver = resolver.with_video_thumbnails(thumbnailer, cfg.thumbnail_width);
        }
        resolver
    }

    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo = Mutex::new(EmbeddedArtMemo::new(capacity));
        self
    }

    pub fn with_video_thumbnails(mut self, thumbnailer: Arc<dyn VideoThumbnailer>, width: u32) -> Self {
        self.thumbnailer = Some(thumbnailer);
        self.thumb_width = width;
        self
    }

    pub fn cache(&self) -> &ArtCache {
        &self.cache
    }

    /// Returns the `ALBUM_ART` id for `media`, or 0 when it has no art.
    pub fn find_album_art(&self, media: &Path, embedded: Option<&[u8]>) -> i64 {
        let art = self
            .check_embedded_art(media, embedded)
            .or_else(|| self.check_for_album_file(media))
            .or_else(|| self.generate_thumbnail(media));

        match art {
            Some(art) => self.art_id(&art, media),
            None => 0,
        }
    }

    fn art_id(&self, art: &Path, media: &Path) -> i64 {
        let art_str = path_str(art);
        match self
            .db
            .query_int64("SELECT ID FROM ALBUM_ART WHERE PATH = ?1", &[&art_str])
        {
            Ok(id) if id > 0 => return id,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(art = %art.display(), error = %e, "Album art lookup failed");
                return 0;
            }
        }

        match self
            .db
            .insert("INSERT INTO ALBUM_ART (PATH) VALUES (?1)", &[&art_str])
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    art = %art.display(),
                    media = %media.display(),
                    error = %e,
                    "Error setting cover art"
                );
                0
            }
        }
    }

    /// Caches an image found in the file's tags.
    ///
    /// If the bytes hash like a recently cached image the earlier cache file
    /// is hard-linked instead of encoding the picture again.
    pub fn check_embedded_art(&self, media: &Path, embedded: Option<&[u8]>) -> Option<PathBuf> {
        let data = embedded.filter(|d| !d.is_empty())?;

        let picture = match Picture::from_bytes(data) {
            Ok(picture) => picture,
            Err(e) => {
                tracing::debug!(media = %media.display(), error = %e, "Undecodable embedded art");
                return None;
            }
        };

        let hash = djb_hash(data);
        let target = self.cache.cache_path(None, JPEG_POSTFIX, media);
        let previous = self.memo.lock().lookup(hash).map(Path::to_path_buf);

        let mut art_path = previous.and_then(|prev| self.link_previous(&prev, &target));

        if art_path.is_none() {
            match picture.save_jpeg(&target) {
                Ok(()) => art_path = Some(target.clone()),
                Err(e) => {
                    tracing::warn!(media = %media.display(), error = %e, "Invalid embedded album art");
                }
            }
        }

        // Best effort, tried even when the full-size copy failed. A small
        // picture is linked from the cached JPEG, never from the media file;
        // when that link fails it is encoded from the decoded picture.
        let thumb = self.cache.cache_path(Some(ImageSize::Thumbnail), JPEG_POSTFIX, media);
        let link_src = art_path.as_deref().unwrap_or(target.as_path());
        let _ = save_resized_to(&picture, link_src, &thumb, ImageSize::Thumbnail);

        let mut memo = self.memo.lock();
        match art_path {
            Some(path) => {
                tracing::debug!(media = %media.display(), "Found new embedded album art");
                memo.remember(hash, path.clone());
                Some(path)
            }
            None => {
                memo.forget(hash);
                None
            }
        }
    }

    fn link_previous(&self, previous: &Path, target: &Path) -> Option<PathBuf> {
        if previous == target {
            return target.exists().then(|| target.to_path_buf());
        }
        let _ = fs::remove_file(target);
        match fs::hard_link(previous, target) {
            Ok(()) => Some(target.to_path_buf()),
            Err(e) => {
                tracing::debug!(
                    src = %previous.display(),
                    dst = %target.display(),
                    error = %e,
                    "Could not link shared embedded art"
                );
                None
            }
        }
    }

    /// Looks for a cover image next to `media` (or inside it, for a directory).
    pub fn check_for_album_file(&self, media: &Path) -> Option<PathBuf> {
        let meta = fs::metadata(media).ok()?;

        let (dir, specific) = if meta.is_dir() {
            (media, None)
        } else {
            (media.parent()?, file_specific_cover(media))
        };

        let found = specific.or_else(|| {
            self.names
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| is_readable(candidate))
        })?;

        tracing::debug!(file = %found.display(), "Found album art");
        self.cache_cover_file(&found)
    }

    fn cache_cover_file(&self, cover: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.cache.cache_exists(None, JPEG_POSTFIX, cover) {
            return Some(cached);
        }

        let cache_file = self.cache.cache_path(None, JPEG_POSTFIX, cover);
        if let Some(parent) = cache_file.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::copy(cover, &cache_file) {
            tracing::warn!(
                src = %cover.display(),
                dst = %cache_file.display(),
                error = %e,
                "Failed to copy album art into cache"
            );
            return None;
        }

        match Picture::open(cover) {
            Ok(picture) => {
                let _ = save_resized_to_cache(&self.cache, &picture, cover, ImageSize::Thumbnail);
            }
            Err(e) => tracing::debug!(file = %cover.display(), error = %e, "Cover not decodable"),
        }

        Some(cache_file)
    }

    /// Grabs a video frame into the cache when video thumbnails are on.
    pub fn generate_thumbnail(&self, media: &Path) -> Option<PathBuf> {
        let thumbnailer = self.thumbnailer.as_ref()?;
        if !is_video(media) {
            return None;
        }
        if let Some(cached) = self.cache.cache_exists(None, JPEG_POSTFIX, media) {
            return Some(cached);
        }

        let thumb = self.cache.cache_path(None, JPEG_POSTFIX, media);
        if let Some(parent) = thumb.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(dir = %parent.display(), error = %e, "Cannot create art cache");
                return None;
            }
        }

        match thumbnailer.extract_frame(media, &thumb, VIDEO_SEEK_SECS, self.thumb_width) {
            Ok(()) => Some(thumb),
            Err(e) => {
                tracing::warn!(media = %media.display(), error = %e, "Video thumbnail failed");
                None
            }
        }
    }

    pub fn is_album_art_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Re-resolves art for audio/video files that `new_file` may be the
    /// cover of: every media file when it is a generic cover name, otherwise
    /// the ones sharing its name up to the extension (or `.cover.jpg`).
    ///
    /// Returns how many `DETAILS` rows were updated.
    pub fn update_if_album_art(&self, new_file: &Path) -> usize {
        let Some(name) = new_file.file_name().and_then(|n| n.to_str()) else {
            return 0;
        };
        let stem_len = match name.strip_suffix(COVER_SUFFIX) {
            Some(stem) => stem.len(),
            None => name.rfind('.').unwrap_or(name.len()),
        };
        let stem = &name[..stem_len];
        let generic = self.is_album_art_name(name);

        let Some(dir) = new_file.parent() else {
            return 0;
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Cannot scan for cover art targets");
                return 0;
            }
        };

        let mut updated = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') || !(is_video(&path) || is_audio(&path)) {
                continue;
            }
            if !(generic || file_name.starts_with(stem)) {
                continue;
            }
            if !fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
                continue;
            }

            tracing::debug!(cover = %new_file.display(), target = %file_name, "New file looks like cover art");
            let art_id = self.find_album_art(&path, None);
            match self.db.exec(
                "UPDATE DETAILS SET ALBUM_ART = ?1 WHERE PATH = ?2",
                &[&art_id, &path_str(&path)],
            ) {
                Ok(n) => updated += n,
                Err(e) => {
                    tracing::warn!(cover = %name, target = %file_name, error = %e, "Error setting cover art")
                }
            }
        }
        updated
    }
}

/// `<file>.cover.jpg`, then `<stem>.jpg`, then `.<stem>.jpg`.
fn file_specific_cover(media: &Path) -> Option<PathBuf> {
    let mut cover = media.as_os_str().to_owned();
    cover.push(COVER_SUFFIX);
    let mut candidates = vec![PathBuf::from(cover)];

    if media.extension().is_some() {
        let same_stem = media.with_extension("jpg");
        if let (Some(parent), Some(file)) = (same_stem.parent(), same_stem.file_name()) {
            let mut hidden = std::ffi::OsString::from(".");
            hidden.push(file);
            let hidden = parent.join(hidden);
            candidates.push(same_stem);
            candidates.push(hidden);
        }
    }

    candidates.into_iter().find(|c| is_readable(c))
}

fn is_readable(path: &Path) -> bool {
    fs::File::open(path)
        .and_then(|f| f.metadata())
        .map(|m| m.is_file())
        .unwrap_or(false)
}

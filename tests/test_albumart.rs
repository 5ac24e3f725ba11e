use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use mediaserve::art::{AlbumArtResolver, ArtCache, ImageSize, JPEG_POSTFIX};
use mediaserve::config::Config;
use mediaserve::db::Database;
use mediaserve::imaging::Picture;
use mediaserve::video::VideoThumbnailer;
use tempfile::TempDir;

struct Library {
    music: TempDir,
    _root: TempDir,
    cache: Arc<ArtCache>,
    db: Arc<Database>,
}

impl Library {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
        Self {
            music: tempfile::tempdir().unwrap(),
            cache: Arc::new(ArtCache::new(root.path())),
            _root: root,
            db: Arc::new(db),
        }
    }

    fn resolver(&self) -> AlbumArtResolver {
        AlbumArtResolver::from_config(&Config::default(), self.cache.clone(), self.db.clone(), None)
    }

    fn file(&self, name: &str) -> PathBuf {
        let path = self.music.path().join(name);
        std::fs::write(&path, b"not really media").unwrap();
        path
    }

    fn cover(&self, name: &str) -> PathBuf {
        let path = self.music.path().join(name);
        Picture::from_rgb(RgbImage::from_pixel(200, 200, Rgb([10, 200, 10])))
            .save_jpeg(&path)
            .unwrap();
        path
    }

    fn art_path(&self, id: i64) -> Option<PathBuf> {
        self.db
            .query_text("SELECT PATH FROM ALBUM_ART WHERE ID = ?1", &[&id])
            .unwrap()
            .map(PathBuf::from)
    }

    fn full_slot(&self, source: &Path) -> PathBuf {
        self.cache.cache_path(None, JPEG_POSTFIX, source)
    }
}

fn embedded_jpeg(shade: u8) -> Vec<u8> {
    Picture::from_rgb(RgbImage::from_pixel(300, 300, Rgb([shade, 0, 0])))
        .to_jpeg()
        .unwrap()
}

#[test]
fn test_embedded_art_wins() {
    let lib = Library::new();
    let song = lib.file("song.mp3");
    lib.cover("song.jpg");
    lib.cover("folder.jpg");

    let id = lib.resolver().find_album_art(&song, Some(&embedded_jpeg(200)));

    assert!(id > 0);
    assert_eq!(lib.art_path(id), Some(lib.full_slot(&song)));
    let thumb = lib
        .cache
        .cache_exists(Some(ImageSize::Thumbnail), JPEG_POSTFIX, &song)
        .unwrap();
    let thumb = Picture::open(&thumb).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (160, 160));
}

#[test]
fn test_embedded_thumbnail_survives_full_size_failure() {
    let lib = Library::new();
    let song = lib.file("song.mp3");
    // a directory squatting on the full-size slot makes that write fail
    std::fs::create_dir_all(lib.full_slot(&song)).unwrap();
    let small = Picture::from_rgb(RgbImage::from_pixel(64, 64, Rgb([0, 0, 200])))
        .to_jpeg()
        .unwrap();

    assert_eq!(lib.resolver().check_embedded_art(&song, Some(&small)), None);

    let thumb = lib
        .cache
        .cache_exists(Some(ImageSize::Thumbnail), JPEG_POSTFIX, &song)
        .unwrap();
    let thumb = Picture::open(&thumb).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (64, 64));
}

#[test]
fn test_undecodable_embedded_art_falls_through() {
    let lib = Library::new();
    let song = lib.file("song.mp3");
    let folder = lib.cover("folder.jpg");

    let id = lib.resolver().find_album_art(&song, Some(b"garbage"));

    assert_eq!(lib.art_path(id), Some(lib.full_slot(&folder)));
}

#[test]
fn test_file_specific_cover_order() {
    let lib = Library::new();
    let song = lib.file("song.mp3");
    let specific = lib.cover("song.mp3.cover.jpg");
    lib.cover("song.jpg");
    lib.cover("folder.jpg");
    let resolver = lib.resolver();

    let id = resolver.find_album_art(&song, None);
    assert_eq!(lib.art_path(id), Some(lib.full_slot(&specific)));

    std::fs::remove_file(&specific).unwrap();
    let same_stem = lib.music.path().join("song.jpg");
    assert_eq!(resolver.check_for_album_file(&song), Some(lib.full_slot(&same_stem)));
}

#[test]
fn test_hidden_stem_cover() {
    let lib = Library::new();
    let song = lib.file("track.flac");
    let hidden = lib.cover(".track.jpg");

    assert_eq!(lib.resolver().check_for_album_file(&song), Some(lib.full_slot(&hidden)));
}

#[test]
fn test_generic_cover_shared_by_album() {
    let lib = Library::new();
    let first = lib.file("01.mp3");
    let second = lib.file("02.mp3");
    let folder = lib.cover("Folder.jpg");
    let resolver = lib.resolver();

    let a = resolver.find_album_art(&first, None);
    let b = resolver.find_album_art(&second, None);

    assert!(a > 0);
    assert_eq!(a, b);
    assert_eq!(lib.art_path(a), Some(lib.full_slot(&folder)));
    assert_eq!(
        lib.db.query_int("SELECT COUNT(*) FROM ALBUM_ART", &[]).unwrap(),
        1
    );
}

#[test]
fn test_directory_looks_inside() {
    let lib = Library::new();
    let folder = lib.cover("cover.jpg");

    assert_eq!(
        lib.resolver().check_for_album_file(lib.music.path()),
        Some(lib.full_slot(&folder))
    );
}

#[test]
fn test_no_art_is_zero() {
    let lib = Library::new();
    let song = lib.file("lonely.mp3");

    assert_eq!(lib.resolver().find_album_art(&song, None), 0);
    assert_eq!(lib.db.query_int("SELECT COUNT(*) FROM ALBUM_ART", &[]).unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn test_repeated_embedded_art_is_linked() {
    use std::os::unix::fs::MetadataExt;

    let lib = Library::new();
    let first = lib.file("01.mp3");
    let second = lib.file("02.mp3");
    let resolver = lib.resolver();
    let art = embedded_jpeg(90);

    let a = resolver.find_album_art(&first, Some(&art));
    let b = resolver.find_album_art(&second, Some(&art));

    assert_ne!(a, b);
    let (a, b) = (lib.art_path(a).unwrap(), lib.art_path(b).unwrap());
    assert_eq!(std::fs::metadata(&a).unwrap().ino(), std::fs::metadata(&b).unwrap().ino());
}

#[derive(Default)]
struct FakeThumbnailer {
    calls: Mutex<Vec<(PathBuf, u32, u32)>>,
}

impl VideoThumbnailer for FakeThumbnailer {
    fn extract_frame(&self, video: &Path, dest: &Path, seek_secs: u32, width: u32) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((video.to_path_buf(), seek_secs, width));
        Picture::from_rgb(RgbImage::new(width, width * 9 / 16)).save_jpeg(dest)?;
        Ok(())
    }
}

#[test]
fn test_video_frame_is_last_resort() {
    let lib = Library::new();
    let clip = lib.file("clip.mkv");
    let song = lib.file("song.mp3");
    let thumbs = Arc::new(FakeThumbnailer::default());
    let resolver = AlbumArtResolver::new(lib.cache.clone(), lib.db.clone(), vec![])
        .with_video_thumbnails(thumbs.clone(), 320);

    let id = resolver.find_album_art(&clip, None);
    assert_eq!(lib.art_path(id), Some(lib.full_slot(&clip)));
    assert_eq!(*thumbs.calls.lock().unwrap(), vec![(clip.clone(), 20, 320)]);

    // cached frame is reused, audio never asks for one
    resolver.find_album_art(&clip, None);
    assert_eq!(resolver.find_album_art(&song, None), 0);
    assert_eq!(thumbs.calls.lock().unwrap().len(), 1);
}

#[test]
fn test_video_thumbnails_follow_config() {
    let lib = Library::new();
    let clip = lib.file("clip.mp4");
    let thumbs: Arc<dyn VideoThumbnailer> = Arc::new(FakeThumbnailer::default());

    let off = AlbumArtResolver::from_config(&Config::default(), lib.cache.clone(), lib.db.clone(), Some(thumbs.clone()));
    assert_eq!(off.find_album_art(&clip, None), 0);

    let cfg = Config {
        video_thumbnails: true,
        ..Config::default()
    };
    let on = AlbumArtResolver::from_config(&cfg, lib.cache.clone(), lib.db.clone(), Some(thumbs));
    assert!(on.find_album_art(&clip, None) > 0);
}

#[test]
fn test_update_if_album_art() {
    let lib = Library::new();
    let resolver = lib.resolver();
    let tracks = ["a.mp3", "b.mp3", "other.flac"];
    for track in tracks {
        let path = lib.file(track);
        lib.db
            .insert(
                "INSERT INTO DETAILS (PATH, MIME) VALUES (?1, 'audio/mpeg')",
                &[&path.to_string_lossy().into_owned()],
            )
            .unwrap();
    }
    let art_of = |track: &str| -> i64 {
        let path = lib.music.path().join(track).to_string_lossy().into_owned();
        lib.db
            .query_int64("SELECT ALBUM_ART FROM DETAILS WHERE PATH = ?1", &[&path])
            .unwrap()
    };

    let a_cover = lib.cover("a.jpg");
    assert_eq!(resolver.update_if_album_art(&a_cover), 1);
    assert_eq!(lib.art_path(art_of("a.mp3")), Some(lib.full_slot(&a_cover)));
    assert_eq!(art_of("b.mp3"), 0);

    let folder = lib.cover("folder.jpg");
    assert_eq!(resolver.update_if_album_art(&folder), 3);
    assert_eq!(lib.art_path(art_of("a.mp3")), Some(lib.full_slot(&a_cover)));
    assert_eq!(lib.art_path(art_of("b.mp3")), Some(lib.full_slot(&folder)));
    assert_eq!(art_of("b.mp3"), art_of("other.flac"));
}

#[test]
fn test_cover_suffix_targets_its_file() {
    let lib = Library::new();
    let resolver = lib.resolver();
    for track in ["song.mp3", "song two.mp3"] {
        let path = lib.file(track);
        lib.db
            .insert("INSERT INTO DETAILS (PATH) VALUES (?1)", &[&path.to_string_lossy().into_owned()])
            .unwrap();
    }

    let cover = lib.cover("song.mp3.cover.jpg");

    assert!(resolver.is_album_art_name("folder.jpg"));
    assert!(!resolver.is_album_art_name("song.mp3.cover.jpg"));
    assert_eq!(resolver.update_if_album_art(&cover), 1);
}

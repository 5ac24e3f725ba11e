use mediaserve::config::{CONFIG_ENV, Config, LISTEN_ENV};
use std::path::PathBuf;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.listen_addr, "127.0.0.1:8200");
    assert_eq!(cfg.thumbnail_width, 160);
    assert_eq!(cfg.embedded_art_memo, 1);
    assert!(!cfg.video_thumbnails);
    assert_eq!(cfg.album_art_names.first().map(String::as_str), Some("Cover.jpg"));
    assert!(cfg.db_file().ends_with("files.db"));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("listen_addr: 0.0.0.0:9000\nvideo_thumbnails: true\n").unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
    assert!(cfg.video_thumbnails);
    assert_eq!(cfg.thumbnailer, "ffmpeg");
    assert_eq!(cfg.album_art_names.len(), 12);
}

#[test]
fn test_config_yaml_paths_and_names() {
    let yaml = "db_dir: /var/cache/mediaserve\nalbum_art_names: [front.jpg]\ndescriptions_dir: /etc/mediaserve\n";
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.db_file(), PathBuf::from("/var/cache/mediaserve/files.db"));
    assert_eq!(cfg.album_art_names, vec!["front.jpg".to_string()]);
    assert_eq!(cfg.descriptions_dir, Some(PathBuf::from("/etc/mediaserve")));
}

#[test]
fn test_config_rejects_bad_yaml() {
    assert!(Config::from_yaml("thumbnail_width: wide").is_err());
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mediaserve.yaml");
    std::fs::write(&path, "thumbnail_width: 240\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.thumbnail_width, 240);

    assert!(Config::from_file(&dir.path().join("missing.yaml")).is_err());
}

// Environment is process-wide, so every env case lives in this one test.
#[test]
fn test_config_load_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mediaserve.yaml");
    std::fs::write(&path, "listen_addr: 10.0.0.1:8200\n").unwrap();

    unsafe {
        std::env::remove_var(LISTEN_ENV);
        std::env::set_var(CONFIG_ENV, &path);
    }
    assert_eq!(Config::load().listen_addr, "10.0.0.1:8200");

    unsafe {
        std::env::set_var(LISTEN_ENV, "0.0.0.0:3000");
    }
    assert_eq!(Config::load().listen_addr, "0.0.0.0:3000");

    unsafe {
        std::env::set_var(CONFIG_ENV, dir.path().join("missing.yaml"));
        std::env::remove_var(LISTEN_ENV);
    }
    assert_eq!(Config::load().listen_addr, "127.0.0.1:8200");

    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
}

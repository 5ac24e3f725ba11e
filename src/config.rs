use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_ENV: &str = "MEDIASERVE_CONFIG";

/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "LISTEN";

const DEFAULT_LISTEN: &str = "127.0.0.1:8200";

const DEFAULT_ALBUM_ART_NAMES: &[&str] = &[
    "Cover.jpg",
    "cover.jpg",
    "AlbumArtSmall.jpg",
    "albumartsmall.jpg",
    "AlbumArt.jpg",
    "albumart.jpg",
    "Album.jpg",
    "album.jpg",
    "Folder.jpg",
    "folder.jpg",
    "Thumb.jpg",
    "thumb.jpg",
];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,

    /// Root for the database file and the `art_cache` directory.
    pub db_dir: PathBuf,

    /// Generic cover file names, tried in order.
    pub album_art_names: Vec<String>,

    pub video_thumbnails: bool,

    pub thumbnail_width: u32,

    /// Program used to pull a frame out of a video.
    pub thumbnailer: String,

    pub descriptions_dir: Option<PathBuf>,

    /// How many recent embedded images are remembered for deduplication.
    pub embedded_art_memo: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN.to_string(),
            db_dir: std::env::temp_dir().join("mediaserve"),
            album_art_names: DEFAULT_ALBUM_ART_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            video_thumbnails: false,
            thumbnail_width: 160,
            thumbnailer: "ffmpeg".to_string(),
            descriptions_dir: None,
            embedded_art_memo: 1,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// Falls back to defaults when `MEDIASERVE_CONFIG` is unset or the file
    /// cannot be read; `LISTEN` always wins for the listen address.
    pub fn load() -> Self {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => match Self::from_file(Path::new(&path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Ignoring unreadable config file");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            cfg.listen_addr = listen;
        }

        cfg
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("parsing configuration")
    }

    pub fn db_file(&self) -> PathBuf {
        self.db_dir.join("files.db")
    }
}

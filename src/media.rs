//! File classification by extension.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Unknown,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" | "flac" | "fla" | "flc" | "wma" | "m4a" | "aac" | "m4p" | "wav" | "ogg"
            | "oga" | "opus" | "pcm" | "aif" | "aiff" | "dsf" | "dff" => MediaKind::Audio,

            // mp4, 3gp and asf may carry either; is_audio accepts them as well
            "mpg" | "mpeg" | "avi" | "divx" | "asf" | "wmv" | "mp4" | "m4v" | "mts"
            | "m2ts" | "m2t" | "mkv" | "vob" | "ts" | "flv" | "xvid" | "mov" | "3gp"
            | "rm" | "rmvb" | "webm" => MediaKind::Video,

            "jpg" | "jpeg" | "png" => MediaKind::Image,

            _ => MediaKind::Unknown,
        }
    }

    pub fn of(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaKind::Unknown)
    }
}

pub fn is_video(path: &Path) -> bool {
    MediaKind::of(path) == MediaKind::Video
}

pub fn is_audio(path: &Path) -> bool {
    match MediaKind::of(path) {
        MediaKind::Audio => true,
        MediaKind::Video => matches!(
            path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()),
            Some(ref e) if e == "mp4" || e == "3gp" || e == "asf"
        ),
        _ => false,
    }
}

/// Drops everything from the last `.` of the final path segment onwards.
///
/// `"12.mp3"` becomes `"12"`, `"a.b/c"` is left alone.
pub fn strip_ext(name: &str) -> &str {
    let start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[start..].rfind('.') {
        Some(dot) => &name[..start + dot],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ext_only_touches_last_segment() {
        assert_eq!(strip_ext("12.mp3"), "12");
        assert_eq!(strip_ext("12"), "12");
        assert_eq!(strip_ext("a.b/c"), "a.b/c");
        assert_eq!(strip_ext("64$1.jpg"), "64$1");
    }

    #[test]
    fn classifies_common_extensions() {
        assert!(is_video(Path::new("/m/movie.MKV")));
        assert!(is_audio(Path::new("/m/song.flac")));
        assert!(is_audio(Path::new("/m/clip.mp4")));
        assert!(!is_audio(Path::new("/m/cover.jpg")));
        assert_eq!(MediaKind::of(Path::new("/m/cover.jpg")), MediaKind::Image);
    }
}

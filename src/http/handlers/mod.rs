//! GET/HEAD endpoints and the GENA subscription pair.

pub mod art;
pub mod events;
pub mod icons;
pub mod media;
pub mod resized;

use crate::http::request::TransferMode;
use crate::media::strip_ext;

/// DLNA profile announced for every album-art and thumbnail image.
pub const JPEG_TN_FEATURES: &str = "DLNA.ORG_PN=JPEG_TN";

/// `12.mp3?x=1` → 12.
pub fn object_id(object: &str) -> Option<i64> {
    let object = object
        .split_once('?')
        .map(|(id, _)| id)
        .unwrap_or(object);
    strip_ext(object).parse().ok()
}

/// Transfer mode echoed for cover art and thumbnails.
pub fn image_transfer_mode(requested: TransferMode) -> TransferMode {
    match requested {
        TransferMode::Background => TransferMode::Background,
        _ => TransferMode::Interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids() {
        assert_eq!(object_id("12.mp3"), Some(12));
        assert_eq!(object_id("12"), Some(12));
        assert_eq!(object_id("7.jpg?width=160"), Some(7));
        assert_eq!(object_id("abc.jpg"), None);
    }
}

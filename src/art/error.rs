use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArtError {
    #[error("invalid image size class")]
    InvalidSize,

    #[error("cannot decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, ArtError>;

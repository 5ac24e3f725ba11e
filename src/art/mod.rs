//! Album-art cache: naming, resizing and resolution of cover images.

pub mod cache;
pub mod error;
pub mod memo;
pub mod resize;
pub mod resolve;
pub mod size;

pub use cache::{ArtCache, JPEG_POSTFIX, djb_hash};
pub use error::{ArtError, Result};
pub use resize::{save_resized_file, save_resized_to, save_resized_to_cache};
pub use resolve::AlbumArtResolver;
pub use size::{ImageSize, SizeSpec, image_size_type};

//! Fixed set of album-art size classes.

/// Named bounding box used to pick resize targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub kind: ImageSize,
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageSize {
    Thumbnail = 0,
    Small = 1,
    Medium = 2,
    Large = 3,
    Invalid = 4,
}

const SIZE_SPECS: [SizeSpec; 5] = [
    SizeSpec { kind: ImageSize::Thumbnail, name: "jpeg_tn", width: 160, height: 160 },
    SizeSpec { kind: ImageSize::Small, name: "jpeg_sm", width: 640, height: 480 },
    SizeSpec { kind: ImageSize::Medium, name: "jpeg_med", width: 1024, height: 768 },
    SizeSpec { kind: ImageSize::Large, name: "jpeg_lrg", width: 4096, height: 4096 },
    SizeSpec { kind: ImageSize::Invalid, name: "", width: 0, height: 0 },
];

impl ImageSize {
    /// Every valid class, smallest first.
    pub const ALL: [ImageSize; 4] = [
        ImageSize::Thumbnail,
        ImageSize::Small,
        ImageSize::Medium,
        ImageSize::Large,
    ];

    pub fn spec(self) -> &'static SizeSpec {
        &SIZE_SPECS[self as usize]
    }

    pub fn is_valid(self) -> bool {
        self != ImageSize::Invalid
    }
}

/// Looks up a size class by its numeric value; anything out of range maps
/// to the `Invalid` descriptor.
pub fn image_size_type(index: i64) -> &'static SizeSpec {
    match index {
        0..=3 => &SIZE_SPECS[index as usize],
        _ => ImageSize::Invalid.spec(),
    }
}

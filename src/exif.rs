//! Pulls the thumbnail JPEG stored inside a file's EXIF (APP1) segment.

use std::io::Read;
use std::path::Path;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Metadata segments sit in front of the scan data, so this is plenty.
const MAX_HEADER_BYTES: u64 = 512 * 1024;

pub fn thumbnail_from_file(path: &Path) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let mut data = Vec::new();
    file.take(MAX_HEADER_BYTES).read_to_end(&mut data).ok()?;
    thumbnail_from_bytes(&data)
}

/// Walks JPEG segments until start-of-scan looking for an EXIF payload whose
/// IFD1 points at a thumbnail JPEG.
pub fn thumbnail_from_bytes(data: &[u8]) -> Option<Vec<u8>> {
    if !data.starts_with(&SOI) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == SOS {
            return None;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 {
            return None;
        }
        let payload = data.get(pos + 4..pos + 2 + len)?;

        if marker == APP1 && payload.starts_with(EXIF_HEADER) {
            if let Some(thumb) = embedded_jpeg(&payload[EXIF_HEADER.len()..]) {
                return Some(thumb.to_vec());
            }
        }
        pos += 2 + len;
    }
    None
}

/// IFD1 tags locating the thumbnail inside the TIFF block.
const TAG_JPEG_OFFSET: u16 = 0x0201;
const TAG_JPEG_LENGTH: u16 = 0x0202;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

/// TIFF block of an EXIF payload, read in its declared byte order.
struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> Tiff<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(..2)? {
            b"II" => false,
            b"MM" => true,
            _ => return None,
        };
        let tiff = Self { data, big_endian };
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    fn u16_at(&self, pos: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(pos..pos.checked_add(2)?)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    fn u32_at(&self, pos: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(pos..pos.checked_add(4)?)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    /// Offset of the IFD chained after the one at `ifd`, 0 at the end.
    fn next_ifd(&self, ifd: usize) -> Option<usize> {
        let count = self.u16_at(ifd)? as usize;
        self.u32_at(ifd + 2 + 12 * count).map(|off| off as usize)
    }

    /// Value of a SHORT or LONG tag in the IFD at `ifd`.
    fn tag_value(&self, ifd: usize, tag: u16) -> Option<usize> {
        let count = self.u16_at(ifd)? as usize;
        (0..count).map(|i| ifd + 2 + 12 * i).find_map(|entry| {
            if self.u16_at(entry)? != tag {
                return None;
            }
            match self.u16_at(entry + 2)? {
                TYPE_SHORT => self.u16_at(entry + 8).map(usize::from),
                TYPE_LONG => self.u32_at(entry + 8).map(|v| v as usize),
                _ => None,
            }
        })
    }
}

/// The thumbnail lives in IFD1, the directory chained after IFD0, at the
/// offset and length its JPEGInterchangeFormat tags give.
fn embedded_jpeg(tiff: &[u8]) -> Option<&[u8]> {
    let reader = Tiff::new(tiff)?;
    let ifd0 = reader.u32_at(4)? as usize;
    let ifd1 = reader.next_ifd(ifd0)?;
    if ifd1 == 0 {
        return None;
    }

    let offset = reader.tag_value(ifd1, TAG_JPEG_OFFSET)?;
    let length = reader.tag_value(ifd1, TAG_JPEG_LENGTH)?;
    let thumb = tiff.get(offset..offset.checked_add(length)?)?;
    thumb.starts_with(&SOI).then_some(thumb)
}

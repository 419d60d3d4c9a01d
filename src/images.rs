//! Image normalization for embedding.
//!
//! Every cover and intro image is re-encoded as a baseline JPEG so readers that
//! only handle the core media types can display it. Transparency is flattened
//! onto white first, since JPEG has no alpha channel.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Smallest byte count accepted as a real image, before and after re-encoding.
pub const MIN_IMAGE_BYTES: usize = 100;

/// JPEG quality used for re-encoding.
pub const JPEG_QUALITY: u8 = 90;

/// An image ready to be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
}

/// Fetch `url` and normalize it with [`normalize_image`].
///
/// Every failure is an `Err`; callers log it and leave the image out.
pub fn resolve_image(fetcher: &dyn Fetch, url: &str) -> Result<ResolvedImage> {
    let bytes = fetcher.fetch(url)?;
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(Error::EmptyBody {
            url: url.to_string(),
            len: bytes.len(),
        });
    }
    let image = normalize_image(&bytes)?;
    debug!(url, fetched = bytes.len(), encoded = image.bytes.len(), "resolved image");
    Ok(image)
}

/// Decode any supported raster format and re-encode it as RGB JPEG.
pub fn normalize_image(bytes: &[u8]) -> Result<ResolvedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = flatten_onto_white(decoded);

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
    if out.len() < MIN_IMAGE_BYTES {
        return Err(Error::ImageTooSmall { len: out.len() });
    }

    Ok(ResolvedImage {
        bytes: out,
        media_type: "image/jpeg",
        extension: "jpg",
    })
}

/// Convert to 8-bit RGB, compositing any alpha over a white background.
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

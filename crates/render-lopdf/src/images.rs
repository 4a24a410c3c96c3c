use lopdf::{Stream, dictionary};
use std::collections::HashMap;
use std::path::Path;

/// An image that has been written to the output as an XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Decoded RGB pixels ready to embed.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Decodes a PNG or JPEG from disk into packed 8-bit RGB.
pub fn decode_file(path: &Path) -> Result<DecodedImage, image::ImageError> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(DecodedImage { width, height, rgb: rgb.into_raw() })
}

pub fn xobject(image: DecodedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width,
            "Height" => image.height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.rgb,
    )
}

/// Images already embedded in the document, keyed by source path so that a
/// repeated `<img>` reuses one XObject.
#[derive(Default)]
pub struct ImageCache {
    by_source: HashMap<String, PlacedImage>,
    resources: Vec<(String, lopdf::ObjectId)>,
}

impl ImageCache {
    pub fn get(&self, src: &str) -> Option<&PlacedImage> {
        self.by_source.get(src)
    }

    pub fn next_name(&self) -> String {
        format!("Im{}", self.resources.len() + 1)
    }

    pub fn insert(&mut self, src: &str, placed: PlacedImage, id: lopdf::ObjectId) {
        self.resources.push((placed.name.clone(), id));
        self.by_source.insert(src.to_string(), placed);
    }

    /// `(resource name, object id)` pairs for the `/XObject` resource dictionary.
    pub fn resources(&self) -> &[(String, lopdf::ObjectId)] {
        &self.resources
    }
}

/// Display size in points. Pixels map to points one-to-one unless the
/// template gives a size; a single given dimension keeps the aspect ratio.
/// The result is scaled down to fit inside `max_width` x `max_height`.
pub fn display_size(
    pixels: (u32, u32),
    requested: (Option<f32>, Option<f32>),
    max_width: f32,
    max_height: f32,
) -> (f32, f32) {
    let (pw, ph) = (pixels.0.max(1) as f32, pixels.1.max(1) as f32);
    let (mut w, mut h) = match requested {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * ph / pw),
        (None, Some(h)) => (h * pw / ph, h),
        (None, None) => (pw, ph),
    };
    if w > max_width {
        h *= max_width / w;
        w = max_width;
    }
    if h > max_height {
        w *= max_height / h;
        h = max_height;
    }
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_scale_down_preserving_aspect() {
        assert_eq!(display_size((100, 50), (None, None), 500.0, 700.0), (100.0, 50.0));
        assert_eq!(display_size((1000, 500), (None, None), 500.0, 700.0), (500.0, 250.0));
        assert_eq!(display_size((100, 50), (Some(200.0), None), 500.0, 700.0), (200.0, 100.0));
        assert_eq!(display_size((100, 100), (None, None), 500.0, 50.0), (50.0, 50.0));
    }

    #[test]
    fn decodes_png_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0])).save(&path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.rgb.len(), 18);
        assert_eq!(&decoded.rgb[..3], &[255, 0, 0]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(decode_file(Path::new("/nonexistent/textpdf.png")).is_err());
    }
}

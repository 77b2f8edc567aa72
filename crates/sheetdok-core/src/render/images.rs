//! Embedded image encoding

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sheetdok_model::{EmbeddedImage, Shape};

/// `data:` URI carrying the image bytes
pub fn data_uri(image: &EmbeddedImage) -> String {
    format!("data:{};base64,{}", image.content_type, STANDARD.encode(&image.bytes))
}

/// Shapes of a sheet that carry image bytes, in drawing order
pub fn pictures(shapes: &[Shape]) -> impl Iterator<Item = (&Shape, &EmbeddedImage)> {
    shapes
        .iter()
        .filter_map(|shape| shape.image.as_ref().map(|image| (shape, image)))
}

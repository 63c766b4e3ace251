//! Pixel filters applied to tile bytes before the response is assembled.

use tracing::warn;

/// Inverts the colors of an image tile, re-encoding as PNG.
///
/// Tiles that fail to decode pass through unchanged; a filter is a
/// transformation of a valid tile, not a gate.
pub fn invert(bytes: &[u8]) -> Vec<u8> {
    let mut img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "Filter could not decode tile, passing through");
            return bytes.to_vec();
        }
    };
    img.invert();

    let mut encoded = std::io::Cursor::new(Vec::new());
    match img.write_to(&mut encoded, image::ImageFormat::Png) {
        Ok(()) => encoded.into_inner(),
        Err(e) => {
            warn!(error = %e, "Filter could not re-encode tile, passing through");
            bytes.to_vec()
        }
    }
}

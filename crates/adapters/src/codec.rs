use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use photo_grid_application::ApplicationError;
use photo_grid_domain::{DataUri, DecodedImage};

/// Reads a file into a data URI. The file must be a recognizable image;
/// the bytes are carried unchanged.
pub fn encode_image_file(path: &Path) -> Result<DataUri, ApplicationError> {
    let bytes = fs::read(path).map_err(|error| {
        ApplicationError::Io(format!("failed to read {}: {error}", path.display()))
    })?;
    encode_image_bytes(&bytes)
}

pub fn encode_image_bytes(bytes: &[u8]) -> Result<DataUri, ApplicationError> {
    let format = image::guess_format(bytes)
        .map_err(|error| ApplicationError::Decode(format!("not an image: {error}")))?;
    let payload = STANDARD.encode(bytes);
    Ok(DataUri::from_parts(format.to_mime_type(), &payload)?)
}

pub fn decode_data_uri(uri: &DataUri) -> Result<DecodedImage, ApplicationError> {
    let bytes = STANDARD
        .decode(uri.payload())
        .map_err(|error| ApplicationError::Decode(format!("invalid base64 payload: {error}")))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|error| ApplicationError::Decode(error.to_string()))?;
    let rgba = image.to_rgba8();

    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        mime_type: uri.mime_type().to_string(),
        rgba: rgba.into_raw(),
    })
}

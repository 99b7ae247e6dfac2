//! File drop / upload import.

use std::path::Path;

use composer_core::{EditorSession, ImageAsset, LayerId};

use crate::error::{RenderError, RenderResult};
use crate::image::{data_uri_bytes, decode_image, to_data_uri, ImageFormat};

/// Decode one raster into an asset carrying a data URL source.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
pub fn asset_from_bytes(bytes: &[u8]) -> RenderResult<ImageAsset> {
    let decoded = decode_image(bytes)?;
    let format = match decoded.format {
        ImageFormat::Unknown => ImageFormat::Png,
        other => other,
    };
    Ok(ImageAsset::new(to_data_uri(bytes, format), decoded.width, decoded.height))
}

/// Describe a data URL image (e.g. a generation result) without re-encoding it.
///
/// # Errors
///
/// Returns an error if the URL is malformed or not a supported image.
pub fn asset_from_data_url(url: &str) -> RenderResult<ImageAsset> {
    let decoded = decode_image(&data_uri_bytes(url)?)?;
    Ok(ImageAsset::new(url, decoded.width, decoded.height))
}

/// Decode every file, then add them as image layers in one history entry.
///
/// Nothing is added if any file fails to load. The first image on a
/// pristine canvas sets the canvas size.
///
/// # Errors
///
/// Returns the first read or decode error.
pub fn import_files<P: AsRef<Path>>(session: &mut EditorSession, paths: &[P]) -> RenderResult<Vec<LayerId>> {
    let assets = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            std::fs::read(path)
                .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))
                .and_then(|bytes| asset_from_bytes(&bytes))
        })
        .collect::<RenderResult<Vec<_>>>()?;

    let ids = session.add_image_layers(assets);
    tracing::info!("Imported {} image layers", ids.len());
    Ok(ids)
}

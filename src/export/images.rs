use std::future::Future;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{ExportError, short_uri};

/// Resolves an image shape's URI to encoded image bytes.
///
/// Export awaits one fetch at a time, in shape order.
pub trait ImageSource {
    fn fetch(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, ExportError>>;
}

/// `data:` URIs (base64 or percent-free plain payloads) and local file paths,
/// with or without a `file://` prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultImageSource;

impl ImageSource for DefaultImageSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, ExportError> {
        if let Some(rest) = uri.strip_prefix("data:") {
            return decode_data_uri(uri, rest);
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        std::fs::read(Path::new(path)).map_err(|err| ExportError::ImageFetch {
            uri: short_uri(uri),
            reason: err.to_string(),
        })
    }
}

fn decode_data_uri(uri: &str, rest: &str) -> Result<Vec<u8>, ExportError> {
    let fail = |reason: &str| ExportError::ImageFetch {
        uri: short_uri(uri),
        reason: reason.to_string(),
    };
    let (meta, payload) = rest.split_once(',').ok_or_else(|| fail("missing payload"))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|err| fail(&err.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Encodes image bytes as a base64 `data:` URI, the form image shapes are
/// stored in.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn png_data_uri(bytes: &[u8]) -> String {
    data_uri("image/png", bytes)
}

/// Decodes PNG or JPEG bytes into a premultiplied pixmap.
pub fn decode_pixmap(bytes: &[u8], uri: &str) -> Result<tiny_skia::Pixmap, ExportError> {
    let decode_err = || ExportError::ImageDecode {
        uri: short_uri(uri),
    };
    let rgba = image::load_from_memory(bytes)
        .map_err(|_| decode_err())?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    let size = tiny_skia::IntSize::from_wh(w, h).ok_or_else(decode_err)?;
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    tiny_skia::Pixmap::from_vec(data, size).ok_or_else(decode_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn red_png() -> Vec<u8> {
        let mut pixmap = tiny_skia::Pixmap::new(2, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        pixmap.encode_png().unwrap()
    }

    #[test]
    fn data_uri_round_trip() {
        let png = red_png();
        let uri = png_data_uri(&png);
        let fetched = block_on(DefaultImageSource.fetch(&uri)).unwrap();
        assert_eq!(fetched, png);
        let pixmap = decode_pixmap(&fetched, &uri).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (2, 2));
        assert_eq!(pixmap.pixel(0, 0).unwrap().red(), 255);
    }

    #[test]
    fn files_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        std::fs::write(&path, red_png()).unwrap();
        let uri = format!("file://{}", path.display());
        assert!(block_on(DefaultImageSource.fetch(&uri)).is_ok());
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            block_on(DefaultImageSource.fetch(&missing.display().to_string())),
            Err(ExportError::ImageFetch { .. })
        ));
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(
            decode_pixmap(b"not an image", "x"),
            Err(ExportError::ImageDecode { .. })
        ));
        assert!(block_on(DefaultImageSource.fetch("data:image/png;base64,@@@")).is_err());
    }
}

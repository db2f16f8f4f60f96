use thiserror::Error;

/// Rejections from the document mutation functions.
///
/// Only connection creation can fail; every other operation on a missing id
/// is a silent no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("shape `{0}` does not exist")]
    MissingShape(String),
    #[error("cannot connect shape `{0}` to itself")]
    SelfConnection(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("diagram data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("diagram data is malformed: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("failed to build the PDF page")]
    PdfPage,
    #[error("failed to convert the page to PDF")]
    PdfConvert,
    #[error("failed to serialize the diagram: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not load image {uri}: {reason}")]
    ImageFetch { uri: String, reason: String },
    #[error("could not decode image {uri}")]
    ImageDecode { uri: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::ser::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("cannot {0} while a drag, resize or pan is in progress")]
    GestureActive(&'static str),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Image URIs are frequently multi-kilobyte `data:` strings; keep messages readable.
pub(crate) fn short_uri(uri: &str) -> String {
    const LIMIT: usize = 48;
    if uri.chars().count() <= LIMIT {
        return uri.to_string();
    }
    let head: String = uri.chars().take(LIMIT).collect();
    format!("{head}…")
}

//! Offscreen export of a [`Document`] to PNG, PDF or JSON.
//!
//! Rasterization is deterministic: connections are drawn first, then shapes
//! in document order. Image shapes are fetched through an [`ImageSource`] and
//! awaited one at a time so the draw order never depends on which fetch
//! finishes first. A shape whose image cannot be loaded is left blank.

pub mod images;
pub mod pdf;
pub mod raster;
pub mod text;

use tiny_skia::{Color, Pixmap, Transform};

use crate::error::ExportError;
use crate::model::{Document, Point, RectF, Shape, ShapeKind, Size};
use crate::router;
use crate::settings::Settings;

pub use images::{DefaultImageSource, ImageSource};
pub use pdf::Orientation;

/// Margin added around the shapes' bounding box.
pub const EXPORT_PADDING: f32 = 50.0;
/// Page used for a document without shapes.
pub const DEFAULT_EXPORT_SIZE: Size = Size::new(800.0, 600.0);
const DEFAULT_SCALE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Pdf,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Json => "application/json",
        }
    }
}

/// Ready-to-save export output. The pipeline never writes files itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Document-space region covered by PNG and PDF output.
    pub bounds: Option<RectF>,
    pub orientation: Option<Orientation>,
}

/// Tight bounds of all shapes plus [`EXPORT_PADDING`], or the default page at
/// the origin when there are no shapes.
pub fn export_bounds(doc: &Document) -> RectF {
    match doc.bounds() {
        Some(bounds) => bounds.expand(EXPORT_PADDING),
        None => RectF::from_min_size(Point::ZERO, DEFAULT_EXPORT_SIZE),
    }
}

/// A finished raster and the document region it covers.
pub struct Raster {
    pub pixmap: Pixmap,
    pub bounds: RectF,
    pub scale: f32,
}

pub struct Exporter {
    scale: f32,
    background: Color,
    file_stem: String,
    svg_options: usvg::Options<'static>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Exporter {
    pub fn new(settings: &Settings) -> Self {
        let scale = if settings.export_scale.is_finite() && settings.export_scale > 0.0 {
            settings.export_scale
        } else {
            tracing::warn!(scale = settings.export_scale, "invalid export scale, using default");
            DEFAULT_SCALE
        };
        let background = raster::parse_color(&settings.background).unwrap_or_else(|| {
            tracing::warn!(
                background = %settings.background,
                "invalid export background, using white"
            );
            Color::WHITE
        });

        let mut svg_options = usvg::Options::default();
        svg_options.fontdb_mut().load_system_fonts();
        svg_options.font_family = "Arial".to_string();

        Self {
            scale,
            background,
            file_stem: settings.export_file_stem.clone(),
            svg_options,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Exports `doc` in `format`. `doc` is only read, so a caller that loses
    /// interest can drop the future without side effects.
    pub async fn export(
        &self,
        doc: &Document,
        format: ExportFormat,
        source: &impl ImageSource,
    ) -> Result<ExportPayload, ExportError> {
        tracing::info!(?format, shapes = doc.shapes.len(), "export started");
        let (bytes, bounds) = match format {
            ExportFormat::Json => (doc.to_json_pretty()?.into_bytes(), None),
            ExportFormat::Png => {
                let raster = self.render(doc, source).await?;
                let png = raster
                    .pixmap
                    .encode_png()
                    .map_err(|_| ExportError::PngEncode)?;
                (png, Some(raster.bounds))
            }
            ExportFormat::Pdf => {
                let raster = self.render(doc, source).await?;
                let png = raster
                    .pixmap
                    .encode_png()
                    .map_err(|_| ExportError::PngEncode)?;
                (pdf::png_to_pdf(&png, raster.bounds)?, Some(raster.bounds))
            }
        };
        tracing::info!(?format, bytes = bytes.len(), "export finished");
        Ok(ExportPayload {
            format,
            file_name: format!("{}.{}", self.file_stem, format.extension()),
            bytes,
            bounds,
            orientation: bounds
                .filter(|_| format == ExportFormat::Pdf)
                .map(Orientation::of),
        })
    }

    /// Rasterizes `doc` over [`export_bounds`] at the configured scale.
    pub async fn render(
        &self,
        doc: &Document,
        source: &impl ImageSource,
    ) -> Result<Raster, ExportError> {
        let bounds = export_bounds(doc);
        let width = (bounds.width() * self.scale).ceil().max(1.0) as u32;
        let height = (bounds.height() * self.scale).ceil().max(1.0) as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc { width, height })?;
        pixmap.fill(self.background);

        let s = self.scale;
        let transform = Transform::from_row(s, 0.0, 0.0, s, -bounds.min.x * s, -bounds.min.y * s);

        for connection in &doc.connections {
            if let Some(path) = router::route_connection(doc, connection) {
                raster::draw_connection(&mut pixmap, &path, transform);
            }
        }

        for shape in &doc.shapes {
            match shape.kind {
                ShapeKind::Image => {
                    self.draw_image_shape(&mut pixmap, shape, transform, source)
                        .await
                }
                _ => raster::draw_shape_body(&mut pixmap, shape, transform),
            }
            if let Some(layout) = text::layout_label(shape) {
                text::draw_label(&mut pixmap, &layout, bounds, s, &self.svg_options);
            }
        }

        Ok(Raster {
            pixmap,
            bounds,
            scale: s,
        })
    }

    async fn draw_image_shape(
        &self,
        pixmap: &mut Pixmap,
        shape: &Shape,
        transform: Transform,
        source: &impl ImageSource,
    ) {
        let Some(uri) = shape.image_uri.as_deref() else {
            tracing::warn!(shape = %shape.id, "image shape without a source");
            return;
        };
        let decoded = match source.fetch(uri).await {
            Ok(bytes) => images::decode_pixmap(&bytes, uri),
            Err(err) => Err(err),
        };
        match decoded {
            Ok(image) => raster::draw_image(pixmap, shape, &image, transform),
            Err(err) => tracing::warn!(shape = %shape.id, %err, "skipping image"),
        }
    }
}

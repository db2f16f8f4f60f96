//! Single-page PDF wrapping a rendered PNG.

use crate::error::ExportError;
use crate::export::images::png_data_uri;
use crate::model::RectF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape only when strictly wider than tall.
    pub fn of(bounds: RectF) -> Self {
        if bounds.width() > bounds.height() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// One `<image>` filling a page of `page.width() × page.height()` units.
pub fn page_svg(png: &[u8], page: RectF) -> String {
    let (w, h) = (page.width(), page.height());
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w:.3}" height="{h:.3}" viewBox="0 0 {w:.3} {h:.3}"><image x="0" y="0" width="{w:.3}" height="{h:.3}" preserveAspectRatio="none" xlink:href="{}"/></svg>"#,
        png_data_uri(png)
    )
}

pub fn png_to_pdf(png: &[u8], page: RectF) -> Result<Vec<u8>, ExportError> {
    let svg = page_svg(png, page);
    let opt = svg2pdf::usvg::Options::default();
    let tree =
        svg2pdf::usvg::Tree::from_str(&svg, &opt).map_err(|_| ExportError::PdfPage)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| ExportError::PdfConvert)
}

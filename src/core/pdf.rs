use crate::core::layout::{
    layout_document, DrawOp, FontStyle, LaidOutPage, Rgb8, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::domain::model::ReportDocument;
use crate::domain::ports::DocumentRenderer;
use crate::utils::error::{ReportError, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};

/// Renders report documents to PDF with the built-in Helvetica family.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font).map_err(|e| ReportError::RenderError {
                message: format!("Failed to load built-in font: {:?}", e),
            })
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            italic: add(BuiltinFont::HelveticaOblique)?,
            bold_italic: add(BuiltinFont::HelveticaBoldOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let pages = layout_document(document);
        tracing::debug!("Laid out {} page(s) for '{}'", pages.len(), document.title);

        let (doc, first_page, first_layer) = PdfDocument::new(
            document.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Content",
        );
        let fonts = Fonts::load(&doc)?;

        for (index, page) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Content");
                doc.get_page(page_index).get_layer(layer_index)
            };
            draw_page(&layer, page, &fonts);
        }

        let bytes = doc.save_to_bytes().map_err(|e| ReportError::RenderError {
            message: format!("Failed to serialize PDF: {:?}", e),
        })?;
        tracing::info!("📄 PDF rendered: {} page(s), {} bytes", pages.len(), bytes.len());
        Ok(bytes)
    }
}

fn color(rgb: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(rgb.0) / 255.0,
        f32::from(rgb.1) / 255.0,
        f32::from(rgb.2) / 255.0,
        None,
    ))
}

/// 版面座標以左上為原點，PDF 以左下為原點
fn point(x: f32, y_from_top: f32) -> Point {
    Point::new(Mm(x), Mm(PAGE_HEIGHT_MM - y_from_top))
}

fn draw_page(layer: &PdfLayerReference, page: &LaidOutPage, fonts: &Fonts) {
    layer.set_outline_color(color(Rgb8(0, 0, 0)));
    layer.set_outline_thickness(0.5);

    for op in &page.ops {
        match op {
            DrawOp::FillRect { x, y, w, h, color: fill } => {
                layer.set_fill_color(color(*fill));
                layer.add_rect(Rect::new(
                    Mm(*x),
                    Mm(PAGE_HEIGHT_MM - (y + h)),
                    Mm(x + w),
                    Mm(PAGE_HEIGHT_MM - y),
                ));
            }
            DrawOp::Line { x1, y1, x2, y2 } => {
                layer.add_line(Line {
                    points: vec![(point(*x1, *y1), false), (point(*x2, *y2), false)],
                    is_closed: false,
                });
            }
            DrawOp::Text(run) => {
                layer.set_fill_color(color(run.color));
                layer.use_text(
                    run.text.as_str(),
                    run.size_pt,
                    Mm(run.x),
                    Mm(PAGE_HEIGHT_MM - run.baseline),
                    fonts.get(run.style),
                );
            }
        }
    }
}

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use quote_core::export::{DocumentRenderer, ExportError, QuoteDocument};
use tracing::debug;

use crate::layout::{truncate, wrap};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const LAYER: &str = "Layer 1";

const BODY_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 4.6;
const BODY_WRAP: usize = 100;

// Item table columns, in mm from the left edge.
const COL_DESC: f32 = MARGIN;
const COL_QTY: f32 = 130.0;
const COL_RATE: f32 = 150.0;
const COL_TOTAL: f32 = 174.0;
const DESC_WIDTH: usize = 62;

fn render_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render(e.to_string())
}

/// Renders estimates as A4 portrait PDFs using the built-in Helvetica fonts.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    heading: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new("ESTIMATE")
    }
}

impl PdfRenderer {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }
}

/// Top-down writer that starts a new page when it runs out of room.
struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl Cursor {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_room(
        &mut self,
        height: f32,
    ) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    fn text_at(
        &self,
        text: &str,
        size: f32,
        x: f32,
        bold: bool,
    ) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(
        &mut self,
        text: &str,
        size: f32,
        bold: bool,
    ) {
        let height = size * 0.5;
        self.ensure_room(height);
        self.text_at(text, size, MARGIN, bold);
        self.y -= height;
    }

    fn label_value(
        &mut self,
        label: &str,
        value: &str,
    ) {
        self.ensure_room(LINE_HEIGHT);
        self.text_at(label, BODY_SIZE, MARGIN, true);
        self.text_at(value, BODY_SIZE, MARGIN + 32.0, false);
        self.y -= LINE_HEIGHT;
    }

    fn paragraph(
        &mut self,
        text: &str,
    ) {
        for line in wrap(text, BODY_WRAP) {
            self.line(&line, BODY_SIZE, false);
        }
    }

    fn rule(&mut self) {
        self.ensure_room(3.0);
        let y = self.y + 1.5;
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
            ],
            is_closed: false,
        });
        self.y -= 3.0;
    }

    fn gap(
        &mut self,
        height: f32,
    ) {
        self.y -= height;
    }

    fn row(
        &mut self,
        cells: [&str; 4],
        bold: bool,
    ) {
        self.ensure_room(LINE_HEIGHT);
        self.text_at(&truncate(cells[0], DESC_WIDTH), BODY_SIZE, COL_DESC, bold);
        self.text_at(cells[1], BODY_SIZE, COL_QTY, bold);
        self.text_at(cells[2], BODY_SIZE, COL_RATE, bold);
        self.text_at(cells[3], BODY_SIZE, COL_TOTAL, bold);
        self.y -= LINE_HEIGHT;
    }

    fn finish(self) -> Result<(Vec<u8>, usize), ExportError> {
        let pages = self.pages;
        let bytes = self.doc.save_to_bytes().map_err(render_error)?;
        Ok((bytes, pages))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(
        &self,
        document: &QuoteDocument,
    ) -> Result<Vec<u8>, ExportError> {
        let mut cursor = Cursor::new(&format!("Estimate {}", document.reference))?;

        cursor.line(&self.heading, 18.0, true);
        cursor.gap(2.0);
        cursor.label_value("Reference", &document.reference);
        cursor.label_value("Date", &document.date);
        cursor.label_value("Valid until", &document.valid_until);
        cursor.rule();

        cursor.label_value("Client", &document.client);
        cursor.label_value("Project", &document.project);
        cursor.label_value("Site", &document.site);
        cursor.gap(2.0);

        cursor.line("Scope of works", 11.0, true);
        cursor.paragraph(&document.scope);
        cursor.gap(2.0);

        if !document.rows.is_empty() {
            cursor.row(["Description", "Qty", "Rate", "Total"], true);
            cursor.rule();
            for row in &document.rows {
                let cells = [
                    row.description.as_str(),
                    row.qty.as_str(),
                    row.rate.as_str(),
                    row.total.as_str(),
                ];
                cursor.row(cells, false);
            }
            cursor.gap(2.0);
        }

        cursor.label_value("Total hours", &document.total_hours);
        cursor.label_value("Labour days", &document.labour_days);
        cursor.rule();
        cursor.line(&format!("Total (ex. VAT): {}", document.total), 12.0, true);
        cursor.gap(2.0);
        if !document.issued_by.is_empty() {
            cursor.label_value("Issued by", &document.issued_by);
        }
        cursor.gap(4.0);

        cursor.line("Terms and conditions", 11.0, true);
        cursor.paragraph(&document.terms);

        let (bytes, pages) = cursor.finish()?;
        debug!(reference = %document.reference, pages, size = bytes.len(), "rendered estimate");
        Ok(bytes)
    }
}

//! A4 rendering of [`QuoteDocument`](quote_core::export::QuoteDocument)
//! with `printpdf`.

mod layout;
mod renderer;

pub use renderer::PdfRenderer;

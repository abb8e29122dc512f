//! Thin wrapper over `pdf-extract` so the content-analysis stage never has
//! to see a parser exception directly (spec.md §4.4: "on parser exception: pass").

use crate::content::{self, ContentAnalysis};

#[must_use]
pub fn analyze_pdf_bytes(pdf_bytes: &[u8]) -> ContentAnalysis {
    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => content::analyze(&text, pdf_bytes.len(), None),
        Err(err) => content::analyze_unparseable(pdf_bytes.len(), &err.to_string()),
    }
}

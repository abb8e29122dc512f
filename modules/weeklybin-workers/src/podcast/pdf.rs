//! Podcast transcript PDF synthesis (spec.md §4.10 step 5).
//!
//! No crate in the wider corpus does PDF generation from scratch, so this
//! leans on `printpdf` for layout/text/link-annotation rendering the way
//! `weeklybin-store::pdf_meta` already leans on `lopdf` for Info-dict
//! metadata patching after the fact.

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};
use printpdf::{BuiltinFont, Line, LinkAnnotation, Mm, PdfDocument, PdfLayerReference, Point, Pt, Rect};
use weeklybin_model::PodcastMetadata;

use super::sanitize::sanitize_with_ellipsis;

const PAGE_WIDTH_MM: f64 = 215.9; // US Letter
const PAGE_HEIGHT_MM: f64 = 279.4;
const MARGIN_PT: f64 = 50.0;
const BODY_SIZE: f64 = 11.0;
const BODY_LINE_HEIGHT: f64 = 16.0;
const HEADER_TITLE_SIZE: f64 = 18.0;
const EPISODE_TITLE_SIZE: f64 = 14.0;
const META_SIZE: f64 = 10.0;
const META_LINE_HEIGHT: f64 = 14.0;

fn pt_to_mm(pt: f64) -> f64 {
    pt * 25.4 / 72.0
}

/// Rough average glyph width for Helvetica at a given point size, used to
/// estimate how many characters fit on a line since printpdf doesn't expose
/// per-glyph metrics for the built-in fonts.
fn chars_per_line(size: f64) -> usize {
    let usable_width_pt = (PAGE_WIDTH_MM * 72.0 / 25.4) - 2.0 * MARGIN_PT;
    ((usable_width_pt / (size * 0.5)).floor() as usize).max(10)
}

fn wrap_text(text: &str, size: f64) -> Vec<String> {
    let max_chars = chars_per_line(size);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate_len = if current.is_empty() {
                word.len()
            } else {
                current.len() + 1 + word.len()
            };
            if candidate_len > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

struct Builder {
    doc: PdfDocument,
    layer: PdfLayerReference,
    font_regular: printpdf::IndirectFontRef,
    font_bold: printpdf::IndirectFontRef,
    y_pt: f64,
}

impl Builder {
    fn new(doc: PdfDocument, layer: PdfLayerReference, font_regular: printpdf::IndirectFontRef, font_bold: printpdf::IndirectFontRef) -> Self {
        let top_y = PAGE_HEIGHT_MM * 72.0 / 25.4 - MARGIN_PT;
        Self { doc, layer, font_regular, font_bold, y_pt: top_y }
    }

    fn bottom_margin_pt(&self) -> f64 {
        MARGIN_PT
    }

    fn ensure_room(&mut self, line_height: f64) {
        if self.y_pt - line_height < self.bottom_margin_pt() {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "body");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y_pt = PAGE_HEIGHT_MM * 72.0 / 25.4 - MARGIN_PT;
        }
    }

    fn text_line(&mut self, text: &str, bold: bool, size: f64, line_height: f64) {
        self.ensure_room(line_height);
        let font = if bold { &self.font_bold } else { &self.font_regular };
        self.layer.use_text(text, size, Mm(pt_to_mm(MARGIN_PT)), Mm(pt_to_mm(self.y_pt)), font);
        self.y_pt -= line_height;
    }

    fn wrapped_block(&mut self, text: &str, bold: bool, size: f64, line_height: f64) {
        for line in wrap_text(text, size) {
            self.text_line(&line, bold, size, line_height);
        }
    }

    fn horizontal_rule(&mut self) {
        self.ensure_room(META_LINE_HEIGHT);
        let right_x_pt = PAGE_WIDTH_MM * 72.0 / 25.4 - MARGIN_PT;
        let y = self.y_pt;
        let line = Line {
            points: vec![
                (Point::new(Mm(pt_to_mm(MARGIN_PT)), Mm(pt_to_mm(y))), false),
                (Point::new(Mm(pt_to_mm(right_x_pt)), Mm(pt_to_mm(y))), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
        self.y_pt -= META_LINE_HEIGHT;
    }

    /// A bullet line whose full width is a clickable link to `url`.
    fn bulleted_link(&mut self, text: &str, url: &str) {
        self.ensure_room(META_LINE_HEIGHT);
        let label = format!("- {text}");
        let y = self.y_pt;
        self.layer.use_text(&label, META_SIZE, Mm(pt_to_mm(MARGIN_PT)), Mm(pt_to_mm(y)), &self.font_regular);

        let right_x_pt = PAGE_WIDTH_MM * 72.0 / 25.4 - MARGIN_PT;
        self.layer.add_link_annotation(LinkAnnotation::new(
            Rect::new(
                Mm(pt_to_mm(MARGIN_PT)),
                Mm(pt_to_mm(y)),
                Mm(pt_to_mm(right_x_pt)),
                Mm(pt_to_mm(y + META_LINE_HEIGHT)),
            ),
            None,
            None,
            printpdf::Actions::uri(url.to_string()),
            None,
        ));
        self.y_pt -= META_LINE_HEIGHT;
    }
}

pub struct TranscriptPdfInput<'a> {
    pub metadata: &'a PodcastMetadata,
    pub source_url: &'a str,
    pub formatted_transcript: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// Builds the full transcript PDF described in spec.md §4.10 step 5 and
/// patches its Info dictionary afterward via `lopdf`.
#[must_use]
pub fn build_transcript_pdf(input: &TranscriptPdfInput<'_>) -> Vec<u8> {
    let metadata = input.metadata;
    let (doc, page, layer) = PdfDocument::new(&metadata.episode_title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "body");
    let font_regular = doc.add_builtin_font(BuiltinFont::Helvetica).expect("base-14 font");
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).expect("base-14 font");
    let layer_ref = doc.get_page(page).get_layer(layer);

    let mut builder = Builder::new(doc, layer_ref, font_regular, font_bold);

    builder.text_line(&sanitize_with_ellipsis(&metadata.podcast_name), true, HEADER_TITLE_SIZE, HEADER_TITLE_SIZE + 6.0);
    builder.text_line(&sanitize_with_ellipsis(&metadata.episode_title), true, EPISODE_TITLE_SIZE, EPISODE_TITLE_SIZE + 6.0);

    if let Some(host) = &metadata.host {
        builder.text_line(&format!("Host: {}", sanitize_with_ellipsis(host)), false, META_SIZE, META_LINE_HEIGHT);
    }
    if let Some(genre) = &metadata.genre {
        builder.text_line(&format!("Genre: {}", sanitize_with_ellipsis(genre)), false, META_SIZE, META_LINE_HEIGHT);
    }
    if let Some(duration_ms) = metadata.duration_ms {
        let minutes = duration_ms / 60_000;
        let seconds = (duration_ms % 60_000) / 1000;
        builder.text_line(&format!("Duration: {minutes}m {seconds}s"), false, META_SIZE, META_LINE_HEIGHT);
    }
    if let Some(release_date) = metadata.release_date {
        builder.text_line(&format!("Date: {}", release_date.format("%Y-%m-%d")), false, META_SIZE, META_LINE_HEIGHT);
    }
    builder.text_line(&format!("Source: {}", input.source_url), false, META_SIZE, META_LINE_HEIGHT);

    if !metadata.show_notes.summary.is_empty() || !metadata.show_notes.links.is_empty() {
        builder.y_pt -= META_LINE_HEIGHT / 2.0;
        builder.text_line("Show Notes", true, META_SIZE + 1.0, META_LINE_HEIGHT);
        if !metadata.show_notes.summary.is_empty() {
            builder.wrapped_block(&sanitize_with_ellipsis(&metadata.show_notes.summary), false, META_SIZE, META_LINE_HEIGHT);
        }
        for link in &metadata.show_notes.links {
            builder.bulleted_link(&sanitize_with_ellipsis(&link.text), &link.url);
        }
    }

    builder.y_pt -= META_LINE_HEIGHT / 2.0;
    builder.horizontal_rule();
    builder.y_pt -= BODY_LINE_HEIGHT / 2.0;

    let sanitized_transcript = sanitize_with_ellipsis(input.formatted_transcript);
    builder.wrapped_block(&sanitized_transcript, false, BODY_SIZE, BODY_LINE_HEIGHT);

    let bytes = builder.doc.save_to_bytes().expect("pdf serialization");
    patch_info_dict(&bytes, metadata, input)
}

fn patch_info_dict(pdf_bytes: &[u8], metadata: &PodcastMetadata, input: &TranscriptPdfInput<'_>) -> Vec<u8> {
    let Ok(mut doc) = Document::load_mem(pdf_bytes) else {
        return pdf_bytes.to_vec();
    };

    let info_id = match doc.trailer.get(b"Info").ok().and_then(|o| o.as_reference().ok()) {
        Some(id) => id,
        None => {
            let id = doc.new_object_id();
            doc.objects.insert(id, Object::Dictionary(Dictionary::new()));
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    if let Some(Object::Dictionary(dict)) = doc.objects.get_mut(&info_id) {
        let string = |s: &str| Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
        dict.set("Title", string(&metadata.episode_title));
        dict.set("Author", string(metadata.host.as_deref().unwrap_or(&metadata.podcast_name)));
        dict.set("Subject", string(input.source_url));
        dict.set("Producer", string(&format!("weeklybin/{}", input.generated_at.to_rfc3339())));
        dict.set("Creator", string("weeklybin"));
    }

    let mut buffer = Vec::new();
    if doc.save_to(&mut buffer).is_ok() {
        buffer
    } else {
        pdf_bytes.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_respects_character_budget() {
        let text = "word ".repeat(200);
        let lines = wrap_text(&text, BODY_SIZE);
        let budget = chars_per_line(BODY_SIZE);
        assert!(lines.iter().all(|l| l.len() <= budget + 1));
    }

    #[test]
    fn wrap_text_preserves_blank_lines() {
        let text = "first\n\nsecond";
        let lines = wrap_text(text, BODY_SIZE);
        assert!(lines.iter().any(|l| l.is_empty()));
    }

    #[test]
    fn chars_per_line_grows_as_size_shrinks() {
        assert!(chars_per_line(10.0) > chars_per_line(18.0));
    }
}

//! PDF `Subject`/`Producer` metadata embed + extract (spec.md §4.5 step 1,
//! §8 "PDF subject round-trip" invariant).

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::{Result, StoreError};

fn info_dict_id(doc: &mut Document) -> ObjectId {
    let existing = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|o| o.as_reference().ok());

    if let Some(id) = existing {
        return id;
    }

    let id = doc.new_object_id();
    doc.objects.insert(id, Object::Dictionary(Dictionary::new()));
    doc.trailer.set("Info", Object::Reference(id));
    id
}

/// Sets `Subject = original_url` (recovers the source URL even after queue
/// retention expires) and `Producer` to a short capture marker.
pub fn embed_metadata(pdf_bytes: &[u8], original_url: &str, producer: &str) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(pdf_bytes).map_err(StoreError::Pdf)?;
    let id = info_dict_id(&mut doc);

    if let Some(Object::Dictionary(dict)) = doc.objects.get_mut(&id) {
        dict.set(
            "Subject",
            Object::String(original_url.as_bytes().to_vec(), StringFormat::Literal),
        );
        dict.set(
            "Producer",
            Object::String(producer.as_bytes().to_vec(), StringFormat::Literal),
        );
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(StoreError::PdfIo)?;
    Ok(buffer)
}

#[must_use]
pub fn extract_subject(pdf_bytes: &[u8]) -> Option<String> {
    let doc = Document::load_mem(pdf_bytes).ok()?;
    let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let dict = doc.get_object(info_id).ok()?.as_dict().ok()?;
    let subject = dict.get(b"Subject").ok()?.as_str().ok()?;
    Some(subject.to_string())
}

/// A short capture marker embedded as `Producer`, e.g. `weeklybin/2026-07-28T00:00:00Z`.
#[must_use]
pub fn producer_marker(captured_at: chrono::DateTime<chrono::Utc>) -> String {
    format!("weeklybin/{}", captured_at.to_rfc3339())
}

//! C5 weekly bin store: ISO-week bin paths, PDF metadata embed/extract,
//! filename derivation, and the `oldFilePath` deletion protocol.

mod error;
mod filename;
mod pdf_meta;
mod store;
mod week;

pub use error::{Result, StoreError};
pub use filename::{build_base_name, finalize_filename, finalize_pdf_filename, slugify};
pub use pdf_meta::{embed_metadata, extract_subject, producer_marker};
pub use store::{delete_if_different, SaveOptions, WeeklyBinStore};
pub use week::{bin_path, week_of, IsoWeek};

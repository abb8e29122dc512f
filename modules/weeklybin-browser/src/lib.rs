//! Headless capture: process-wide browser pool, per-job URL rewrite chain,
//! cookie injection, privacy-filter CSS, and the navigate/screenshot/PDF
//! protocol itself (spec.md §4.3).

mod capture;
mod cookies;
mod error;
mod pool;
mod privacy_filter;
mod rewrite;

pub use capture::{capture, CaptureOptions, CaptureOutcome};
pub use cookies::{CookieStore, NetscapeCookie};
pub use error::{BrowserError, Result};
pub use pool::{BrowserPool, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
pub use rewrite::{apply_rewrites, is_unsupported_article_stub, RewriteResult};

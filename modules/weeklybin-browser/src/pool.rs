//! Process-wide singleton browser: `init → running → closed` (spec.md §4.3).
//!
//! `init()` launches Chromium once and spawns the task that drives its CDP
//! event loop (chromiumoxide's `Handler` needs a dedicated driver task —
//! mirrors `launch_browser`'s handler-spawn pattern in the citescrape
//! orchestrator). `get()` fails fast instead of lazily launching, so a
//! misconfigured startup surfaces immediately rather than on first capture.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{BrowserError, Result};

struct Inner {
    browser: Browser,
    handler_task: JoinHandle<()>,
    closed: AtomicBool,
}

/// Desktop viewport + user agent applied to every capture context
/// (spec.md §4.3: "viewport 1280×800, a configured desktop user agent").
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub struct BrowserPool {
    inner: OnceCell<Inner>,
}

impl BrowserPool {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::const_new(),
        }
    }

    /// Idempotent: a second call while already initialized is a no-op.
    pub async fn init(&self) -> Result<()> {
        if self.inner.initialized() {
            return Ok(());
        }
        self.inner
            .get_or_try_init(|| async {
                let config = BrowserConfig::builder()
                    .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
                    .build()
                    .map_err(BrowserError::Config)?;
                let (browser, mut handler) = Browser::launch(config).await?;
                let handler_task = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if let Err(err) = event {
                            error!(error = %err, "browser handler event error");
                        }
                    }
                });
                info!("browser pool initialized");
                Ok::<_, BrowserError>(Inner {
                    browser,
                    handler_task,
                    closed: AtomicBool::new(false),
                })
            })
            .await?;
        Ok(())
    }

    /// Fails fast with `NotInitialized` rather than lazily launching.
    pub fn get(&self) -> Result<&Browser> {
        let inner = self.inner.get().ok_or(BrowserError::NotInitialized)?;
        if inner.closed.load(Ordering::Acquire) {
            return Err(BrowserError::NotInitialized);
        }
        Ok(&inner.browser)
    }

    /// Idempotent: closing an uninitialized or already-closed pool is a
    /// no-op, never an error.
    pub async fn close(&self) {
        let Some(inner) = self.inner.get() else {
            return;
        };
        if inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        inner.handler_task.abort();
        info!("browser pool closed");
    }
}

impl Default for BrowserPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_before_init_fails_fast() {
        let pool = BrowserPool::new();
        assert!(matches!(pool.get(), Err(BrowserError::NotInitialized)));
    }

    #[tokio::test]
    async fn close_before_init_is_a_noop() {
        let pool = BrowserPool::new();
        pool.close().await; // must not panic
    }
}

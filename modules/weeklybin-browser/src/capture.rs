//! Per-job capture protocol: URL in, PDF bytes + screenshot bytes + title
//! out (spec.md §4.3 steps 1-9).

use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, PrintToPdfParams,
};
use chromiumoxide::page::Page;
use chromiumoxide::Browser;
use tracing::warn;
use weeklybin_model::{FailureClassification, FailureKind};

use crate::cookies::NetscapeCookie;
use crate::pool::DEFAULT_USER_AGENT;
use crate::privacy_filter;
use crate::rewrite::{apply_rewrites, is_unsupported_article_stub};

const NAV_TIMEOUT: Duration = Duration::from_secs(60);
const SCROLL_STEP_PX: i64 = 1000;
const SCROLL_MAX_STEPS: u32 = 50;
const SCROLL_STEP_DELAY: Duration = Duration::from_millis(50);
const SCROLL_WALL_CAP: Duration = Duration::from_secs(10);
const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(15);

const KNOWN_TITLE_SUFFIXES: &[&str] = &[
    " - The Atlantic",
    " | The New York Times",
    " - Bloomberg",
    " | Reuters",
];

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub pdf_bytes: Vec<u8>,
    pub screenshot_bytes: Vec<u8>,
    pub title: Option<String>,
    pub rewritten: bool,
    pub direct_article_fallback: bool,
}

pub struct CaptureOptions<'a> {
    pub cookies: &'a [NetscapeCookie],
    pub social_mirror_host: Option<&'a str>,
    pub privacy_filter_terms: &'a [String],
}

/// Run the full capture protocol against a fresh isolated context, which is
/// always closed before returning — on every exit path, success or error.
pub async fn capture(
    browser: &Browser,
    input_url: &str,
    options: CaptureOptions<'_>,
) -> Result<CaptureOutcome, FailureClassification> {
    let context = browser
        .create_browser_context(Default::default())
        .await
        .map_err(|e| FailureClassification::new(FailureKind::NavigationError, e.to_string()))?;

    let result = run_in_context(&context, input_url, &options).await;

    if let Err(err) = browser.dispose_browser_context(context.id().clone()).await {
        warn!(error = %err, "failed to dispose browser context");
    }

    result
}

async fn run_in_context(
    context: &chromiumoxide::BrowserContext,
    input_url: &str,
    options: &CaptureOptions<'_>,
) -> Result<CaptureOutcome, FailureClassification> {
    let rewrite = apply_rewrites(input_url, options.social_mirror_host);

    let page = context
        .new_page("about:blank")
        .await
        .map_err(|e| FailureClassification::new(FailureKind::NavigationError, e.to_string()))?;

    page.set_user_agent(DEFAULT_USER_AGENT)
        .await
        .map_err(|e| FailureClassification::new(FailureKind::NavigationError, e.to_string()))?;

    if !options.cookies.is_empty() {
        let params: Vec<_> = options.cookies.iter().map(NetscapeCookie::to_cdp_param).collect();
        if let Err(err) = page.set_cookies(params).await {
            warn!(error = %err, "failed to inject cookies, continuing without them");
        }
    }

    navigate_with_retry(&page, &rewrite.url).await?;

    post_navigation_settle(&page).await;

    let direct_article_fallback = if rewrite.is_social {
        let body = page_body_text(&page).await;
        if is_unsupported_article_stub(&body) {
            navigate_with_retry(&page, input_url).await?;
            post_navigation_settle(&page).await;
            true
        } else {
            false
        }
    } else {
        false
    };

    let screenshot_bytes = capture_screenshot(&page).await;

    apply_privacy_filter(&page, options.privacy_filter_terms).await;

    let title = extract_title(&page).await;

    let pdf_bytes = page
        .pdf(
            PrintToPdfParams::builder()
                .print_background(true)
                .scale(0.7)
                .margin_top(0.08)
                .margin_bottom(0.08)
                .margin_left(0.08)
                .margin_right(0.08)
                .paper_width(8.27)
                .paper_height(11.69)
                .build(),
        )
        .await
        .map_err(|e| FailureClassification::new(FailureKind::Unknown, e.to_string()))?;

    Ok(CaptureOutcome {
        pdf_bytes,
        screenshot_bytes,
        title,
        rewritten: rewrite.rewritten,
        direct_article_fallback,
    })
}

/// First attempt waits for the page to go fully idle (network idle
/// equivalent: `goto` then `wait_for_navigation`). On timeout, the retry
/// uses a cheaper wait condition — just `goto`, which resolves once the
/// navigation commits rather than waiting for the frame to settle
/// (DOM-content-loaded equivalent) — so a page that never reaches network
/// idle still gets a real second chance instead of hanging the same way
/// twice (spec.md §4.3).
async fn navigate_with_retry(page: &Page, url: &str) -> Result<(), FailureClassification> {
    let first = tokio::time::timeout(NAV_TIMEOUT, async {
        let page = page.goto(url).await?;
        page.wait_for_navigation().await
    })
    .await;
    match first {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(classify_navigation_error(&err.to_string())),
        Err(_timeout) => {
            let retry = tokio::time::timeout(NAV_TIMEOUT, page.goto(url)).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            match retry {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(err)) => Err(classify_navigation_error(&err.to_string())),
                Err(_) => Err(FailureClassification::new(
                    FailureKind::Timeout,
                    format!("navigation deadline ({NAV_TIMEOUT:?}) exceeded twice for {url}"),
                )),
            }
        }
    }
}

fn classify_navigation_error(message: &str) -> FailureClassification {
    if message.contains("net::ERR_BLOCKED") || message.contains("403") {
        FailureClassification::new(FailureKind::BotDetected, message.to_string())
    } else {
        FailureClassification::new(FailureKind::NavigationError, message.to_string())
    }
}

async fn post_navigation_settle(page: &Page) {
    tokio::time::sleep(Duration::from_secs(1)).await;

    let _ = tokio::time::timeout(Duration::from_secs(5), page.find_element("body")).await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    bounded_scroll(page).await;

    let _ = page
        .evaluate("window.scrollTo(0, 0)")
        .await;
    tokio::time::sleep(Duration::from_millis(500)).await;
}

async fn bounded_scroll(page: &Page) {
    let started = Instant::now();
    for _ in 0..SCROLL_MAX_STEPS {
        if started.elapsed() >= SCROLL_WALL_CAP {
            break;
        }
        if page
            .evaluate(format!("window.scrollBy(0, {SCROLL_STEP_PX})"))
            .await
            .is_err()
        {
            break;
        }
        tokio::time::sleep(SCROLL_STEP_DELAY).await;
    }
}

async fn page_body_text(page: &Page) -> String {
    page.evaluate("document.body ? document.body.innerText : ''")
        .await
        .ok()
        .and_then(|v| v.into_value::<String>().ok())
        .unwrap_or_default()
}

async fn capture_screenshot(page: &Page) -> Vec<u8> {
    let params = CaptureScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .build();
    match tokio::time::timeout(SCREENSHOT_TIMEOUT, page.screenshot(params)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => {
            warn!(error = %err, "screenshot capture failed");
            Vec::new()
        }
        Err(_) => {
            warn!("screenshot capture timed out");
            Vec::new()
        }
    }
}

async fn apply_privacy_filter(page: &Page, extra_terms: &[String]) {
    let css = privacy_filter::build_css(extra_terms);
    let style_script = format!(
        "(function() {{ const s = document.createElement('style'); s.textContent = {css_json}; document.head.appendChild(s); }})()",
        css_json = serde_json::to_string(&css).unwrap_or_default(),
    );
    if let Err(err) = page.evaluate(style_script).await {
        warn!(error = %err, "privacy filter CSS injection failed, continuing");
    }

    // The CSS rules above only match operator terms that show up in class
    // names; a term that only appears in rendered text needs a text-node
    // walk to find.
    let text_scan_script = privacy_filter::build_text_scan_js(extra_terms);
    if !text_scan_script.is_empty() {
        if let Err(err) = page.evaluate(text_scan_script).await {
            warn!(error = %err, "privacy filter text scan failed, continuing");
        }
    }
}

async fn extract_title(page: &Page) -> Option<String> {
    let raw: String = page
        .evaluate("document.title")
        .await
        .ok()?
        .into_value()
        .ok()?;
    let mut title = raw.trim().to_string();
    for suffix in KNOWN_TITLE_SUFFIXES {
        if let Some(trimmed) = title.strip_suffix(suffix) {
            title = trimmed.trim().to_string();
            break;
        }
    }
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_blocked_as_bot_detected() {
        let c = classify_navigation_error("net::ERR_BLOCKED_BY_CLIENT");
        assert_eq!(c.kind, FailureKind::BotDetected);
    }

    #[test]
    fn classifies_403_as_bot_detected() {
        let c = classify_navigation_error("server responded 403");
        assert_eq!(c.kind, FailureKind::BotDetected);
    }

    #[test]
    fn classifies_other_errors_as_navigation_error() {
        let c = classify_navigation_error("net::ERR_CONNECTION_RESET");
        assert_eq!(c.kind, FailureKind::NavigationError);
    }
}

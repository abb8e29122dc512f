//! C8 conversion worker: URL in, rendered-and-verified PDF out (spec.md
//! §4.8). Concurrency 1 — the browser and vision model are both
//! resource-intensive, so the worker harness is configured with a
//! single-slot queue for this handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use weeklybin_browser::{capture, BrowserPool, CaptureOptions, CaptureOutcome, CookieStore};
use weeklybin_events::{ConversionEvent, EventBus};
use weeklybin_llm::ChatClient;
use weeklybin_model::{Config, ConversionJob, FailureKind, MediaType};
use weeklybin_quality::{CompositionInput, QualityOutcome};
use weeklybin_queue::{JobHandler, JobRecord, ProgressReporter};
use weeklybin_store::{SaveOptions, WeeklyBinStore};

use crate::error::{classified, from_classification};

const DIRECT_PDF_HOST_PATH_PATTERNS: &[(&str, &str)] = &[
    ("arxiv.org", "/pdf/"),
    ("export.arxiv.org", "/pdf/"),
    ("www.biorxiv.org", "/content/"),
];

const DIRECT_PDF_FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const DIRECT_PDF_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static CONTENT_DISPOSITION_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename\*?=["']?([^"';]+)"#).expect("valid regex"));
static SOCIAL_STATUS_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(www\.)?(x|twitter)\.com$").expect("valid regex"));

/// `true` if the last path segment ends `.pdf` or the URL matches one of a
/// small set of known direct-PDF host-path patterns (spec.md §4.8 step 1 —
/// left abstract in the spec; this is one concrete, defensible reading of
/// "a small set of known direct-PDF host-path patterns").
#[must_use]
fn is_direct_pdf_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return url.ends_with(".pdf");
    };
    if parsed.path().ends_with(".pdf") {
        return true;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    DIRECT_PDF_HOST_PATH_PATTERNS
        .iter()
        .any(|(pattern_host, path_prefix)| host == *pattern_host && parsed.path().starts_with(path_prefix))
}

fn is_social_status_url(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .is_some_and(|host| SOCIAL_STATUS_HOST.is_match(&host))
}

struct Saved {
    path: std::path::PathBuf,
    size: u64,
    quality_score: Option<i32>,
    quality_reasoning: Option<String>,
}

pub struct ConversionHandler {
    browser_pool: Arc<BrowserPool>,
    cookie_store: Arc<CookieStore>,
    fetch_client: reqwest::Client,
    vision_client: ChatClient,
    store: Arc<WeeklyBinStore>,
    events: EventBus,
    config: Arc<Config>,
}

impl ConversionHandler {
    pub fn new(
        browser_pool: Arc<BrowserPool>,
        cookie_store: Arc<CookieStore>,
        vision_client: ChatClient,
        store: Arc<WeeklyBinStore>,
        events: EventBus,
        config: Arc<Config>,
    ) -> anyhow::Result<Self> {
        let fetch_client = reqwest::Client::builder()
            .timeout(DIRECT_PDF_FETCH_TIMEOUT)
            .user_agent(DIRECT_PDF_USER_AGENT)
            .build()?;
        Ok(Self {
            browser_pool,
            cookie_store,
            fetch_client,
            vision_client,
            store,
            events,
            config,
        })
    }

    async fn convert_direct_pdf(&self, job: &ConversionJob) -> anyhow::Result<Saved> {
        let response = self
            .fetch_client
            .get(&job.url)
            .send()
            .await
            .map_err(|e| classified(FailureKind::DownloadFailed, e.to_string()))?;

        if !response.status().is_success() {
            return Err(classified(
                FailureKind::DownloadFailed,
                format!("direct pdf fetch returned {}", response.status()),
            ));
        }

        let is_pdf_content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/pdf"));
        let disposition_filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| CONTENT_DISPOSITION_FILENAME.captures(v))
            .map(|c| c[1].trim_matches('"').to_string());

        if !is_pdf_content_type && !job.url.ends_with(".pdf") {
            return Err(classified(FailureKind::NotPdf, "response content-type is not application/pdf"));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classified(FailureKind::DownloadFailed, e.to_string()))?;

        let title = job.title.clone().or(disposition_filename);
        let path = self
            .store
            .save_pdf(
                &bytes,
                &job.original_url,
                SaveOptions {
                    bookmarked_at: job.bookmarked_at,
                    title: title.as_deref(),
                    media_type: MediaType::Pdf,
                    is_social_status: false,
                    direct_article: false,
                },
            )
            .map_err(|e| classified(FailureKind::Unknown, e.to_string()))?;

        if let Some(old) = &job.old_file_path {
            weeklybin_store::delete_if_different(std::path::Path::new(old), &path);
        }

        Ok(Saved {
            size: bytes.len() as u64,
            path,
            quality_score: None,
            quality_reasoning: None,
        })
    }

    async fn convert_via_capture(
        &self,
        job_id: &str,
        job: &ConversionJob,
        progress: &ProgressReporter,
    ) -> anyhow::Result<Saved> {
        let browser = self
            .browser_pool
            .get()
            .map_err(|e| classified(FailureKind::Unknown, e.to_string()))?;

        let outcome: CaptureOutcome = capture(
            browser,
            &job.url,
            CaptureOptions {
                cookies: &self.cookie_store.cookies(),
                social_mirror_host: self.config.social_mirror_host.as_deref(),
                privacy_filter_terms: &self.config.privacy_filter_terms,
            },
        )
        .await
        .map_err(from_classification)?;

        progress.report(50).await;

        let quality = weeklybin_quality::run(
            &self.vision_client,
            CompositionInput {
                screenshot_bytes: &outcome.screenshot_bytes,
                pdf_bytes: &outcome.pdf_bytes,
                vision_model: &self.config.vision_model_name,
                quality_threshold: self.config.quality_threshold,
            },
        )
        .await;

        progress.report(90).await;

        let (quality_score, quality_reasoning) = match quality {
            QualityOutcome::Passed { visual, .. } => {
                let score = visual.as_ref().map(|v| v.score);
                let reasoning = visual.as_ref().map(|v| v.reasoning.clone());
                (score, reasoning)
            }
            QualityOutcome::Failed(classification) => {
                self.save_debug_pdf(job_id, &outcome.pdf_bytes);
                return Err(from_classification(classification));
            }
        };

        let title = outcome.title.or_else(|| job.title.clone());
        let path = self
            .store
            .save_pdf(
                &outcome.pdf_bytes,
                &job.original_url,
                SaveOptions {
                    bookmarked_at: job.bookmarked_at,
                    title: title.as_deref(),
                    media_type: MediaType::Pdf,
                    is_social_status: is_social_status_url(&job.original_url),
                    direct_article: outcome.direct_article_fallback,
                },
            )
            .map_err(|e| classified(FailureKind::Unknown, e.to_string()))?;

        if let Some(old) = &job.old_file_path {
            weeklybin_store::delete_if_different(std::path::Path::new(old), &path);
        }

        Ok(Saved {
            size: outcome.pdf_bytes.len() as u64,
            path,
            quality_score,
            quality_reasoning,
        })
    }

    fn save_debug_pdf(&self, job_id: &str, pdf_bytes: &[u8]) {
        let dir = std::path::Path::new(&self.config.data_dir).join("debug");
        if let Err(err) = std::fs::create_dir_all(&dir) {
            warn!(job_id, error = %err, "failed to create debug dir");
            return;
        }
        let path = dir.join(format!("{job_id}.pdf"));
        if let Err(err) = std::fs::write(&path, pdf_bytes) {
            warn!(job_id, error = %err, "failed to write debug pdf");
        }
    }
}

#[async_trait]
impl JobHandler for ConversionHandler {
    async fn handle(&self, job: &JobRecord, progress: &ProgressReporter) -> anyhow::Result<()> {
        let started = Instant::now();
        let conversion_job: ConversionJob = serde_json::from_value(job.data.clone())?;

        self.events.publish(ConversionEvent::Started {
            job_id: job.id.clone(),
            url: conversion_job.url.clone(),
        });
        progress.report(10).await;

        let result = if is_direct_pdf_url(&conversion_job.url) {
            self.convert_direct_pdf(&conversion_job).await
        } else {
            self.convert_via_capture(&job.id, &conversion_job, progress).await
        };

        match result {
            Ok(saved) => {
                progress.report(100).await;
                self.events.publish(ConversionEvent::Completed {
                    job_id: job.id.clone(),
                    url: conversion_job.url.clone(),
                    pdf_path: saved.path.display().to_string(),
                    pdf_size: saved.size,
                    quality_score: saved.quality_score.map(f64::from).unwrap_or(-1.0),
                    quality_reasoning: saved.quality_reasoning.unwrap_or_default(),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                Ok(())
            }
            Err(err) => {
                let attempts_made = job.attempts_made + 1;
                if attempts_made >= job.options.attempts {
                    self.events.publish(ConversionEvent::Failed {
                        job_id: job.id.clone(),
                        url: conversion_job.url.clone(),
                        failure_reason: err.to_string(),
                        attempts_made,
                        max_attempts: job.options.attempts,
                    });
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_pdf_extension() {
        assert!(is_direct_pdf_url("https://example.com/file.pdf"));
        assert!(!is_direct_pdf_url("https://example.com/file.html"));
    }

    #[test]
    fn recognizes_arxiv_pdf_path_pattern() {
        assert!(is_direct_pdf_url("https://arxiv.org/pdf/2301.00001"));
        assert!(!is_direct_pdf_url("https://arxiv.org/abs/2301.00001"));
    }

    #[test]
    fn social_status_host_detection() {
        assert!(is_social_status_url("https://x.com/someone/status/123"));
        assert!(is_social_status_url("https://twitter.com/someone/status/123"));
        assert!(!is_social_status_url("https://example.com/someone/status/123"));
    }

    #[test]
    fn content_disposition_filename_is_extracted() {
        let caps = CONTENT_DISPOSITION_FILENAME
            .captures(r#"attachment; filename="report.pdf""#)
            .unwrap();
        assert_eq!(&caps[1], "report.pdf\"");
    }
}

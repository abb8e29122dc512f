//! The collaborator-facing surface spec.md §6 calls "Exposed": everything
//! outside the core talks to the system through these methods, never
//! through the queue store or filesystem directly. There is no HTTP server
//! here (spec.md §1 Non-goals) — this is a plain Rust API a host process
//! (CLI, embedder, test harness) calls in-process.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weeklybin_model::{ConversionJob, FailureClassification, JobState, MediaType};
use weeklybin_queue::{JobOptions, JobRecord, Queue};
use weeklybin_store::WeeklyBinStore;

use crate::error::{ApiError, Result};

pub struct WeeklyBinApi {
    conversion_queue: Queue,
    media_queue: Queue,
    podcast_queue: Queue,
    store: std::sync::Arc<WeeklyBinStore>,
    cookies_file: PathBuf,
}

impl WeeklyBinApi {
    #[must_use]
    pub fn new(
        conversion_queue: Queue,
        media_queue: Queue,
        podcast_queue: Queue,
        store: std::sync::Arc<WeeklyBinStore>,
        cookies_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            conversion_queue,
            media_queue,
            podcast_queue,
            store,
            cookies_file: cookies_file.into(),
        }
    }

    fn route_for(&self, url: &str) -> &Queue {
        if weeklybin_enrich::is_podcast_url(url) {
            &self.podcast_queue
        } else {
            &self.conversion_queue
        }
    }

    /// spec.md §6: rejects video-only hosts with a typed error; routes
    /// podcast URLs to the podcast queue, everything else to conversion.
    pub async fn submit_conversion(&self, req: SubmitConversionRequest) -> Result<String> {
        if weeklybin_enrich::is_video_only_url(&req.url) {
            return Err(ApiError::VideoOnlyUrl { url: req.url });
        }

        let job = ConversionJob {
            url: req.url.clone(),
            original_url: req.original_url.unwrap_or_else(|| req.url.clone()),
            title: req.title,
            bookmarked_at: req.bookmarked_at,
            old_file_path: req.old_file_path,
        };

        let mut options = JobOptions::retryable();
        if let Some(priority) = req.priority {
            options.priority = priority;
        }

        let id = self.route_for(&req.url).add(None, &job, options).await?;
        Ok(id)
    }

    /// Looks the job up across every queue a `submitConversion`/rerun call
    /// could have landed it in — the id alone doesn't say which.
    pub async fn get_status(&self, job_id: &str) -> Result<JobStatus> {
        for queue in [&self.conversion_queue, &self.media_queue, &self.podcast_queue] {
            if let Some(record) = queue.get_job(job_id).await? {
                return Ok(JobStatus::from_record(&record));
            }
        }
        Err(ApiError::JobNotFound(job_id.to_string()))
    }

    #[must_use]
    pub fn list_weeks(&self) -> Vec<WeekSummary> {
        let media_dir = self.store.data_dir().join("media");
        let Ok(entries) = std::fs::read_dir(&media_dir) else {
            return Vec::new();
        };

        let mut weeks: Vec<WeekSummary> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let week_id = WeekId::parse(&name)?;
                let file_count = count_files(&entry.path());
                Some(WeekSummary {
                    year: week_id.year,
                    week: week_id.week,
                    path: entry.path().display().to_string(),
                    file_count,
                })
            })
            .collect();

        weeks.sort_by(|a, b| (b.year, b.week).cmp(&(a.year, a.week)));
        weeks
    }

    pub fn list_files(&self, week_id: WeekId) -> Result<Vec<FileEntry>> {
        let week_dir = self.store.data_dir().join("media").join(week_id.dirname());
        let mut files = Vec::new();

        for media_type in [MediaType::Video, MediaType::Transcript, MediaType::Podcast, MediaType::Pdf] {
            let dir = week_dir.join(media_type.plural());
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.filter_map(std::result::Result::ok) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let metadata = entry.metadata()?;
                let source_url = if media_type == MediaType::Pdf || media_type == MediaType::Podcast {
                    std::fs::read(&path).ok().and_then(|bytes| weeklybin_store::extract_subject(&bytes))
                } else {
                    None
                };
                files.push(FileEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: path.display().to_string(),
                    size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    media_type,
                    source_url,
                    related_files: related_files(&path, &dir),
                });
            }
        }

        Ok(files)
    }

    /// Terminal failures whose underlying job `bookmarkedAt` (falling back
    /// to `finishedAt`) lands in `week_id`.
    pub async fn list_failures(&self, week_id: WeekId) -> Result<Vec<FailureEntry>> {
        let mut out = Vec::new();
        for queue in [&self.conversion_queue, &self.media_queue, &self.podcast_queue] {
            for record in queue.get_failed().await? {
                if failure_week(&record) != Some(week_id) {
                    continue;
                }
                out.push(FailureEntry::from_record(&record));
            }
        }
        Ok(out)
    }

    /// Reruns every PDF in the week's `pdfs` bin, recovering the source URL
    /// from the embedded `Subject` and passing the existing path through as
    /// `oldFilePath` (spec.md §6).
    pub async fn rerun_week(&self, week_id: WeekId) -> Result<RerunOutcome> {
        let files = self
            .list_files(week_id)?
            .into_iter()
            .filter(|f| f.media_type == MediaType::Pdf)
            .filter_map(|f| Some((f.source_url?, f.path)))
            .collect::<Vec<_>>();

        let mut jobs = Vec::new();
        for (url, old_path) in files {
            let id = self
                .submit_conversion(SubmitConversionRequest {
                    url: url.clone(),
                    original_url: Some(url),
                    user_id: None,
                    priority: None,
                    title: None,
                    bookmarked_at: None,
                    old_file_path: Some(old_path),
                })
                .await?;
            jobs.push(id);
        }

        Ok(RerunOutcome {
            submitted: jobs.len(),
            jobs,
        })
    }

    /// `files`: existing relative paths under `DATA_DIR`, rerun via their
    /// embedded `Subject`. `urls`: fresh URLs, resubmitted with no
    /// `oldFilePath`. Either or both may be supplied.
    pub async fn rerun_selected(&self, req: RerunSelectedRequest) -> Result<RerunOutcome> {
        let mut jobs = Vec::new();

        for rel_path in req.files.unwrap_or_default() {
            let resolved = self.resolve_within_data_dir(&rel_path)?;
            let Some(url) = std::fs::read(&resolved).ok().and_then(|b| weeklybin_store::extract_subject(&b)) else {
                continue;
            };
            let id = self
                .submit_conversion(SubmitConversionRequest {
                    url: url.clone(),
                    original_url: Some(url),
                    user_id: None,
                    priority: None,
                    title: None,
                    bookmarked_at: None,
                    old_file_path: Some(resolved.display().to_string()),
                })
                .await?;
            jobs.push(id);
        }

        for url in req.urls.unwrap_or_default() {
            let id = self
                .submit_conversion(SubmitConversionRequest {
                    url: url.clone(),
                    original_url: Some(url),
                    user_id: None,
                    priority: None,
                    title: None,
                    bookmarked_at: None,
                    old_file_path: None,
                })
                .await?;
            jobs.push(id);
        }

        Ok(RerunOutcome {
            submitted: jobs.len(),
            jobs,
        })
    }

    /// spec.md §7: "path-traversal is fatal at the API boundary" — a
    /// rejected path never touches disk, so the traversal check happens
    /// before the removal, not as cleanup after.
    pub fn delete_files(&self, rel_paths: Vec<String>) -> Result<()> {
        for rel_path in rel_paths {
            let resolved = self.resolve_within_data_dir(&rel_path)?;
            std::fs::remove_file(&resolved)?;
        }
        Ok(())
    }

    pub async fn delete_failures(&self, job_ids: Vec<String>) -> Result<()> {
        for job_id in job_ids {
            for queue in [&self.conversion_queue, &self.media_queue, &self.podcast_queue] {
                queue.remove(&job_id).await?;
            }
        }
        Ok(())
    }

    /// spec.md §6: "validates ≥1 non-comment line with ≥7 tab-separated fields."
    pub fn upload_cookies(&self, content: &str) -> Result<()> {
        let has_valid_line = content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .any(|line| line.split('\t').count() >= 7);

        if !has_valid_line {
            return Err(ApiError::InvalidCookies(
                "no non-comment line with at least 7 tab-separated fields".to_string(),
            ));
        }

        if let Some(parent) = self.cookies_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.cookies_file, content)?;
        Ok(())
    }

    fn resolve_within_data_dir(&self, rel_path: &str) -> Result<PathBuf> {
        let data_dir = self.store.data_dir();
        let candidate = data_dir.join(rel_path);
        let canonical_data_dir = data_dir.canonicalize()?;
        let canonical_candidate = candidate.canonicalize().map_err(|_| ApiError::PathTraversal)?;
        if !canonical_candidate.starts_with(&canonical_data_dir) {
            return Err(ApiError::PathTraversal);
        }
        Ok(canonical_candidate)
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(std::result::Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Podcast audio and its transcript PDF share a base filename; surfacing
/// the pairing saves `listFiles` callers a second lookup.
fn related_files(path: &Path, dir: &Path) -> Vec<String> {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p != path)
        .filter(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem))
        .map(|p| p.display().to_string())
        .collect()
}

/// `ConversionJob`/podcast jobs carry `bookmarked_at` at the top level;
/// `MediaItem` jobs nest it under `bookmark` (see
/// `weeklybin_enrich::pipeline::process`, which is what actually enqueues
/// both shapes).
fn job_bookmarked_at(data: &serde_json::Value) -> Option<DateTime<Utc>> {
    data.get("bookmarked_at")
        .or_else(|| data.get("bookmark").and_then(|b| b.get("bookmarked_at")))
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn job_url(data: &serde_json::Value) -> Option<String> {
    data.get("url")
        .or_else(|| data.get("enclosure").and_then(|e| e.get("url")))
        .or_else(|| data.get("bookmark").and_then(|b| b.get("canonical_url")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn job_original_url(data: &serde_json::Value) -> Option<String> {
    data.get("original_url")
        .or_else(|| data.get("bookmark").and_then(|b| b.get("original_url")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn failure_week(record: &JobRecord) -> Option<WeekId> {
    let bookmarked_at = job_bookmarked_at(&record.data).or(record.finished_at);
    bookmarked_at.map(|at| {
        let iso = weeklybin_store::week_of(at);
        WeekId {
            year: iso.year,
            week: iso.week,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekId {
    pub year: i32,
    pub week: u32,
}

impl WeekId {
    #[must_use]
    pub fn parse(dirname: &str) -> Option<Self> {
        let (year_str, week_str) = dirname.split_once("-W")?;
        Some(Self {
            year: year_str.parse().ok()?,
            week: week_str.parse().ok()?,
        })
    }

    #[must_use]
    pub fn dirname(&self) -> String {
        format!("{}-W{:02}", self.year, self.week)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitConversionRequest {
    pub url: String,
    pub original_url: Option<String>,
    pub user_id: Option<String>,
    pub priority: Option<i64>,
    pub title: Option<String>,
    pub bookmarked_at: Option<DateTime<Utc>>,
    pub old_file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    pub progress: u8,
    pub error: Option<String>,
    pub attempts_made: u32,
    pub max_attempts: u32,
}

impl JobStatus {
    fn from_record(record: &JobRecord) -> Self {
        Self {
            state: record.state,
            progress: record.progress,
            error: record.failed_reason.as_ref().map(|r| FailureClassification::parse(r).format()),
            attempts_made: record.attempts_made,
            max_attempts: record.options.attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub year: i32,
    pub week: u32,
    pub path: String,
    pub file_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub media_type: MediaType,
    pub source_url: Option<String>,
    pub related_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub url: String,
    pub original_url: Option<String>,
    pub failure_reason: String,
    pub failed_at: Option<DateTime<Utc>>,
    pub is_bot_detected: bool,
    pub job_id: String,
}

impl FailureEntry {
    fn from_record(record: &JobRecord) -> Self {
        let url = job_url(&record.data).unwrap_or_default();
        let original_url = job_original_url(&record.data);
        let reason = record.failed_reason.clone().unwrap_or_default();
        let classification = FailureClassification::parse(&reason);
        Self {
            url,
            original_url,
            failure_reason: classification.format(),
            failed_at: record.finished_at,
            is_bot_detected: classification.is_bot_detected(),
            job_id: record.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RerunSelectedRequest {
    pub files: Option<Vec<String>>,
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RerunOutcome {
    pub submitted: usize,
    pub jobs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_id_round_trips_through_dirname() {
        let id = WeekId { year: 2026, week: 5 };
        assert_eq!(WeekId::parse(&id.dirname()), Some(id));
    }

    #[test]
    fn week_id_parse_rejects_malformed_input() {
        assert_eq!(WeekId::parse("not-a-week"), None);
        assert_eq!(WeekId::parse("2026"), None);
    }
}

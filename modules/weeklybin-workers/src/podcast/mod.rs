//! C10 podcast worker: iTunes lookup, audio download + ASR, LLM reformat,
//! PDF synthesis, archive (spec.md §4.10). Concurrency 1 — the ASR and LLM
//! calls are both expensive enough that one in-flight episode at a time is
//! the right default.

mod audio;
mod itunes;
mod pdf;
mod reformat;
mod sanitize;
mod show_notes;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use weeklybin_events::{EventBus, PodcastEvent};
use weeklybin_llm::{AsrClient, ChatClient};
use weeklybin_model::{Config, ConversionJob, FailureKind};
use weeklybin_queue::{JobHandler, JobRecord, ProgressReporter};
use weeklybin_store::{bin_path, finalize_filename, slugify};

use crate::error::classified;
use itunes::{lookup, parse_apple_podcast_url};
use pdf::{build_transcript_pdf, TranscriptPdfInput};
use show_notes::fetch_show_notes;

pub struct PodcastHandler {
    fetch_client: reqwest::Client,
    asr_client: AsrClient,
    text_client: ChatClient,
    config: Arc<Config>,
    events: EventBus,
}

impl PodcastHandler {
    pub fn new(asr_client: AsrClient, text_client: ChatClient, config: Arc<Config>, events: EventBus) -> anyhow::Result<Self> {
        let fetch_client = reqwest::Client::builder().build()?;
        Ok(Self {
            fetch_client,
            asr_client,
            text_client,
            config,
            events,
        })
    }

    async fn run(&self, job_id: &str, job: &ConversionJob, progress: &ProgressReporter) -> anyhow::Result<std::path::PathBuf> {
        let parts = parse_apple_podcast_url(&job.url)?;
        progress.report(10).await;

        let (mut metadata, feed_url) = lookup(&self.fetch_client, &parts).await?;
        if let Some(feed_url) = feed_url {
            metadata.show_notes = fetch_show_notes(&self.fetch_client, &feed_url, &metadata.episode_title, None).await;
        }
        progress.report(20).await;

        let tmp_dir = std::path::Path::new(&self.config.data_dir).join("tmp");
        let (audio_tmp_path, audio_extension) = audio::download_to_temp(&self.fetch_client, &metadata.audio_url, &tmp_dir).await?;

        let asr_result = self.asr_client.transcribe(&audio_tmp_path).await;
        let raw_text = match asr_result {
            Ok(text) => text,
            Err(e) => {
                let _ = tokio::fs::remove_file(&audio_tmp_path).await;
                return Err(classified(FailureKind::Unknown, format!("asr transcription failed: {e}")));
            }
        };

        let cleaned_text = if weeklybin_llm::looks_like_srt(&raw_text) {
            weeklybin_llm::clean_srt(&raw_text)
        } else {
            raw_text
        };
        progress.report(60).await;

        self.events.publish(PodcastEvent::TranscriptReady {
            job_id: job_id.to_string(),
            url: job.url.clone(),
            segment_count: cleaned_text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
        });

        let formatted = reformat::reformat(&self.text_client, &self.config.text_model_name, &metadata, &cleaned_text).await;
        progress.report(85).await;

        let pdf_bytes = build_transcript_pdf(&TranscriptPdfInput {
            metadata: &metadata,
            source_url: &job.url,
            formatted_transcript: &formatted,
            generated_at: chrono::Utc::now(),
        });
        progress.report(90).await;

        let bookmarked_at = job.bookmarked_at.unwrap_or_else(chrono::Utc::now);
        let dir = bin_path(std::path::Path::new(&self.config.data_dir), bookmarked_at, weeklybin_model::MediaType::Podcast);
        std::fs::create_dir_all(&dir)?;

        let podcast_slug = slugify(&metadata.podcast_name);
        let episode_slug = slugify(&metadata.episode_title);
        let base_name = format!("{podcast_slug}-{episode_slug}");

        let pdf_filename = finalize_filename(&base_name, "pdf");
        let audio_filename = finalize_filename(&base_name, &audio_extension);

        let pdf_path = dir.join(pdf_filename);
        let audio_path = dir.join(audio_filename);

        std::fs::write(&pdf_path, pdf_bytes)?;
        tokio::fs::rename(&audio_tmp_path, &audio_path)
            .await
            .or_else(|_| std::fs::copy(&audio_tmp_path, &audio_path).map(|_| ()))?;
        let _ = tokio::fs::remove_file(&audio_tmp_path).await;

        Ok(pdf_path)
    }
}

#[async_trait]
impl JobHandler for PodcastHandler {
    async fn handle(&self, job: &JobRecord, progress: &ProgressReporter) -> anyhow::Result<()> {
        let started = Instant::now();
        let conversion_job: ConversionJob = serde_json::from_value(job.data.clone())?;

        self.events.publish(PodcastEvent::Started {
            job_id: job.id.clone(),
            url: conversion_job.url.clone(),
        });

        match self.run(&job.id, &conversion_job, progress).await {
            Ok(pdf_path) => {
                progress.report(100).await;
                self.events.publish(PodcastEvent::Completed {
                    job_id: job.id.clone(),
                    url: conversion_job.url.clone(),
                    pdf_path: pdf_path.display().to_string(),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                Ok(())
            }
            Err(err) => {
                let attempts_made = job.attempts_made + 1;
                if attempts_made >= job.options.attempts {
                    self.events.publish(PodcastEvent::Failed {
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
    fn basename_combines_podcast_and_episode_slugs() {
        let podcast_slug = slugify("The Best Show!");
        let episode_slug = slugify("Episode 12: Wrap Up");
        assert_eq!(format!("{podcast_slug}-{episode_slug}"), "the-best-show-episode-12-wrap-up");
    }
}

//! Audio download to a temp path (spec.md §4.10 step 3, first half).

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use weeklybin_model::FailureKind;

use crate::error::classified;

/// Downloads `audio_url` into a fresh temp file under `tmp_dir` and returns
/// its path plus the extension inferred from the URL (falls back to
/// `mp3`, the overwhelmingly common podcast enclosure format).
pub async fn download_to_temp(
    client: &reqwest::Client,
    audio_url: &str,
    tmp_dir: &Path,
) -> anyhow::Result<(PathBuf, String)> {
    tokio::fs::create_dir_all(tmp_dir).await?;

    let extension = Path::new(audio_url)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 5)
        .unwrap_or("mp3")
        .to_string();

    let response = client
        .get(audio_url)
        .send()
        .await
        .map_err(|e| classified(FailureKind::DownloadFailed, format!("audio download failed: {e}")))?;

    if !response.status().is_success() {
        return Err(classified(
            FailureKind::DownloadFailed,
            format!("audio download returned {}", response.status()),
        ));
    }

    let tmp_path = tmp_dir.join(format!("{}.{extension}", uuid::Uuid::new_v4()));
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classified(FailureKind::DownloadFailed, e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok((tmp_path, extension))
}

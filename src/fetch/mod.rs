use anyhow::{Context, Result};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const FALLBACK_FILENAME: &str = "download";

/// Makes a suggested `{title}.{format}` name safe to create inside one directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Streams `url` into `dir/filename`. The file only appears once the whole
/// body has been written.
pub async fn save_download(
    client: &Client,
    url: &str,
    filename: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let target = dir.join(sanitize_filename(filename));
    info!("Saving {} to {}", url, target.display());

    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}", response.status());
    }

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Download interrupted")?
    {
        file.write_all(&chunk).context("Failed to write download")?;
        written += chunk.len() as u64;
    }
    file.flush()?;

    debug!("Received {} bytes for {}", written, target.display());

    file.persist(&target)
        .with_context(|| format!("Failed to save {}", target.display()))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::serve_once;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Clip.mp4"), "My Clip.mp4");
        assert_eq!(sanitize_filename("AC/DC: Live?.mp3"), "AC_DC_ Live_.mp3");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("line\nbreak.webm"), "line_break.webm");
        assert_eq!(sanitize_filename("   "), "download");
    }

    #[tokio::test]
    async fn test_save_download_writes_file() {
        let (base_url, _server) = serve_once("200 OK", "media-bytes").await;
        let dir = tempfile::tempdir().unwrap();

        let path = save_download(
            &Client::new(),
            &format!("{base_url}file"),
            "Sample/Clip.mp4",
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("Sample_Clip.mp4"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "media-bytes");
    }

    #[tokio::test]
    async fn test_save_download_rejects_error_status() {
        let (base_url, _server) = serve_once("404 Not Found", "{}").await;
        let dir = tempfile::tempdir().unwrap();

        let result = save_download(&Client::new(), &base_url, "x.mp4", dir.path()).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

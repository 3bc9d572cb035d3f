//! Release downloads.

use crate::constants::DOWNLOAD_TIMEOUT;
use crate::core::ModpmError;
use crate::registry::Release;
use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Fetches release archives into the mods directory.
pub trait Downloader: Send + Sync {
    /// Download `release` into `dest_dir` and return the written archive path.
    fn download(
        &self,
        release: &Release,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Downloads archives from the registry over HTTP.
///
/// The registry requires an account for downloads; `username` and `token`
/// are sent as query parameters when both are configured.
pub struct HttpDownloader {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HttpDownloader {
    /// Create a downloader for the registry rooted at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        username: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("modpm/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: username.zip(token),
        })
    }

    /// Absolute download URL of `release`, without credentials.
    #[must_use]
    pub fn download_url(&self, release: &Release) -> String {
        if release.download_url.starts_with("http://") || release.download_url.starts_with("https://")
        {
            release.download_url.clone()
        } else {
            format!("{}{}", self.base_url, release.download_url)
        }
    }
}

impl Downloader for HttpDownloader {
    async fn download(&self, release: &Release, dest_dir: &Path) -> Result<PathBuf> {
        let url = self.download_url(release);
        debug!("Downloading {url}");

        let mut request = self.client.get(&url);
        if let Some((username, token)) = &self.credentials {
            request = request.query(&[("username", username), ("token", token)]);
        }

        let bytes = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to download {url}"))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read download body from {url}"))?;

        verify_checksum(release, &bytes)?;
        let target = dest_dir.join(&release.file_name);
        write_atomically(dest_dir, &target, &bytes)?;
        debug!("Wrote {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }
}

/// Check `content` against the release's published sha1, when there is one.
pub(crate) fn verify_checksum(release: &Release, content: &[u8]) -> Result<()> {
    let Some(expected) = &release.sha1 else {
        return Ok(());
    };

    let actual = hex::encode(Sha1::digest(content));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ModpmError::ChecksumMismatch {
            file: release.file_name.clone(),
            expected: expected.clone(),
            actual,
        }
        .into());
    }
    Ok(())
}

/// Write `content` to a temporary file in `dir` and rename it onto `target`.
pub(crate) fn write_atomically(dir: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write temporary file for {}", target.display()))?;
    file.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move download into place: {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ReleaseInfo;
    use chrono::Utc;
    use tempfile::TempDir;

    fn release(download_url: &str) -> Release {
        Release {
            version: "1.0.0".parse().unwrap(),
            file_name: "m_1.0.0.zip".to_string(),
            download_url: download_url.to_string(),
            released_at: Utc::now(),
            sha1: None,
            info_json: ReleaseInfo::default(),
        }
    }

    #[test]
    fn test_download_url_joins_registry_root() {
        let downloader = HttpDownloader::new("https://mods.example.com/", None, None).unwrap();
        assert_eq!(
            downloader.download_url(&release("/download/m/abc")),
            "https://mods.example.com/download/m/abc"
        );
        assert_eq!(
            downloader.download_url(&release("https://cdn.example.com/m.zip")),
            "https://cdn.example.com/m.zip"
        );
    }

    #[test]
    fn test_verify_checksum() {
        let mut release = release("/download/m/abc");
        verify_checksum(&release, b"anything").unwrap();

        // sha1("abc")
        release.sha1 = Some("A9993E364706816ABA3E25717850C26C9CD0D89D".to_string());
        verify_checksum(&release, b"abc").unwrap();

        let err = verify_checksum(&release, b"abd").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::ChecksumMismatch { file, .. }) if file == "m_1.0.0.zip"
        ));
    }

    #[test]
    fn test_write_atomically_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("m_1.0.0.zip");
        std::fs::write(&target, b"old").unwrap();

        write_atomically(dir.path(), &target, b"new").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

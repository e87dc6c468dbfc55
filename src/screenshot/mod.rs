//! Screenshot capture
//!
//! Rendering itself is done by a caller supplied [`Renderer`] (typically a
//! headless browser). This module decides which pages are captured, names
//! and writes the image files, and reports failures without failing the
//! crawl.

use crate::config::{CaptureFormat, ScreenshotConfig, ScreenshotParams, ScreenshotScope};
use crate::RenderError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Directory screenshots are written to when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "./storage";

/// Renders a page to image bytes
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, params: &ScreenshotParams) -> Result<Vec<u8>, RenderError>;
}

/// Result of one capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedScreenshot {
    /// Image bytes, when the configuration asks for them
    pub bytes: Option<Vec<u8>>,
    /// File the image was written to, when the configuration asks to save
    pub path: Option<PathBuf>,
}

/// Applies screenshot settings around a [`Renderer`]
#[derive(Clone)]
pub struct ScreenshotCapturer {
    config: ScreenshotConfig,
    renderer: Arc<dyn Renderer>,
}

impl ScreenshotCapturer {
    pub fn new(config: ScreenshotConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    /// Returns true if the page should be captured under the configured scope
    pub fn should_capture(&self, is_seed: bool) -> bool {
        match self.config.scope {
            ScreenshotScope::AllPages => true,
            ScreenshotScope::SeedOnly => is_seed,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.config
            .output_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR))
    }

    /// Captures `url` if it is in scope
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The page is out of scope
    /// * `Ok(Some(CapturedScreenshot))` - The capture, with bytes and/or path as configured
    /// * `Err(RenderError)` - Rendering or writing failed
    pub async fn capture(
        &self,
        url: &Url,
        is_seed: bool,
    ) -> Result<Option<CapturedScreenshot>, RenderError> {
        if !self.should_capture(is_seed) {
            return Ok(None);
        }

        let bytes = self.renderer.render(url, &self.config.params).await?;
        let mut captured = CapturedScreenshot::default();

        if self.config.save {
            let format = self.config.params.cdp_params.format.unwrap_or_default();
            let path = self.output_dir().join(screenshot_file_name(url, format));
            write_screenshot(&path, &bytes).await?;
            tracing::debug!("Saved screenshot of {} to {}", url, path.display());
            captured.path = Some(path);
        }

        if self.config.bytes {
            captured.bytes = Some(bytes);
        }

        Ok(Some(captured))
    }
}

/// File name for a screenshot: the SHA-256 of the URL plus the format extension
pub fn screenshot_file_name(url: &Url, format: CaptureFormat) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    format!("{}.{}", hex::encode(digest), format.extension())
}

async fn write_screenshot(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let io_error = |e: std::io::Error| RenderError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubRenderer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubRenderer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(
            &self,
            url: &Url,
            _params: &ScreenshotParams,
        ) -> Result<Vec<u8>, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RenderError::Backend {
                    url: url.to_string(),
                    message: "browser unavailable".to_string(),
                });
            }
            Ok(b"\x89PNG".to_vec())
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_file_name() {
        let name = screenshot_file_name(&url("https://example.com/"), CaptureFormat::Png);
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + 4);

        let jpeg = screenshot_file_name(&url("https://example.com/"), CaptureFormat::Jpeg);
        assert_eq!(name[..64], jpeg[..64]);
        assert!(jpeg.ends_with(".jpg"));

        let other = screenshot_file_name(&url("https://example.com/other"), CaptureFormat::Png);
        assert_ne!(name, other);
    }

    #[tokio::test]
    async fn test_capture_bytes_only() {
        let renderer = StubRenderer::new(false);
        let config = ScreenshotConfig {
            bytes: true,
            ..Default::default()
        };
        let capturer = ScreenshotCapturer::new(config, renderer.clone());

        let captured = capturer
            .capture(&url("https://example.com/"), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(captured.bytes, Some(b"\x89PNG".to_vec()));
        assert!(captured.path.is_none());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_capture_saves_file() {
        let dir = TempDir::new().unwrap();
        let config = ScreenshotConfig {
            save: true,
            output_dir: Some(dir.path().join("shots")),
            ..Default::default()
        };
        let capturer = ScreenshotCapturer::new(config, StubRenderer::new(false));
        let page = url("https://example.com/page");

        let captured = capturer.capture(&page, true).await.unwrap().unwrap();
        let path = captured.path.unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("shots")
                .join(screenshot_file_name(&page, CaptureFormat::Png))
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
        assert!(captured.bytes.is_none());
    }

    #[tokio::test]
    async fn test_seed_only_scope() {
        let renderer = StubRenderer::new(false);
        let config = ScreenshotConfig {
            bytes: true,
            scope: ScreenshotScope::SeedOnly,
            ..Default::default()
        };
        let capturer = ScreenshotCapturer::new(config, renderer.clone());

        assert!(capturer
            .capture(&url("https://example.com/b"), false)
            .await
            .unwrap()
            .is_none());
        assert!(capturer
            .capture(&url("https://example.com/"), true)
            .await
            .unwrap()
            .is_some());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_renderer_failure() {
        let config = ScreenshotConfig {
            bytes: true,
            ..Default::default()
        };
        let capturer = ScreenshotCapturer::new(config, StubRenderer::new(true));

        let err = capturer
            .capture(&url("https://example.com/"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Backend { .. }));
    }

    #[test]
    fn test_default_output_dir() {
        let capturer =
            ScreenshotCapturer::new(ScreenshotConfig::default(), StubRenderer::new(false));
        assert_eq!(capturer.output_dir(), Path::new("./storage"));
    }
}

//! Configuration for photo ingestion and report generation.
//!
//! All behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across the session and the report pipeline,
//! and to diff two runs to understand why their outputs differ.
//!
//! Page geometry is deliberately not configurable: the report format is
//! fixed A4 with 12 mm margins (see [`crate::pipeline::layout`]), and the
//! history archive must keep rendering identically across sessions.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::BarcheckError;
use crate::progress::ReportProgressCallback;

/// Where the report's embedded TTF comes from.
///
/// The font is loaded at generation time; a missing or unparseable font is
/// fatal to the report (non-Latin item titles would render as tofu with
/// any builtin fallback, so there is none).
#[derive(Debug, Clone)]
pub enum FontSource {
    /// Read the TTF from a filesystem path at generation time.
    Path(PathBuf),
    /// Use TTF bytes the caller already holds (e.g. its own embedded asset).
    Bytes(Vec<u8>),
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Path(PathBuf::from("assets/fonts/Roboto-Regular.ttf"))
    }
}

impl FontSource {
    /// Materialise the font bytes.
    ///
    /// # Errors
    /// [`BarcheckError::FontLoadFailed`] when the path cannot be read.
    pub fn load(&self) -> Result<Vec<u8>, BarcheckError> {
        match self {
            FontSource::Path(path) => {
                std::fs::read(path).map_err(|e| BarcheckError::FontLoadFailed {
                    path: path.clone(),
                    detail: e.to_string(),
                })
            }
            FontSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Configuration for ingestion and report generation.
///
/// Built via [`ReportConfig::builder()`] or [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use barcheck::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .max_side(1024)
///     .jpeg_quality(80)
///     .report_title("Evening close-down report")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// Longest-edge bound for ingested photos, in pixels. Default: 1280.
    ///
    /// Photos are stored inline in the persisted checklist document, so
    /// this bound is what keeps the local store small: a 12 MP capture
    /// shrinks to roughly 200–400 KB of JPEG. Images already within the
    /// bound are stored at their natural size.
    pub max_side: u32,

    /// JPEG re-encode quality, 1–100. Default: 85.
    ///
    /// 85 is visually lossless for evidence photos while compressing about
    /// 3× better than 95. Going below ~60 shows blocking on bar-counter
    /// detail shots.
    pub jpeg_quality: u8,

    /// Title line printed at the top of the report. Default: the Russian
    /// bar-opening report title the checklist ships with.
    pub report_title: String,

    /// Where the embedded report font comes from. Default:
    /// `assets/fonts/Roboto-Regular.ttf` next to the binary's working
    /// directory.
    pub font: FontSource,

    /// Optional per-item progress events during generation.
    pub progress_callback: Option<Arc<dyn ReportProgressCallback>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_side: 1280,
            jpeg_quality: 85,
            report_title: "Отчёт — Чек-лист открытия бара".to_string(),
            font: FontSource::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("max_side", &self.max_side)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("report_title", &self.report_title)
            .field("font", &self.font_debug())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReportProgressCallback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    fn font_debug(&self) -> String {
        match &self.font {
            FontSource::Path(p) => format!("Path({})", p.display()),
            FontSource::Bytes(b) => format!("Bytes({} bytes)", b.len()),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn max_side(mut self, px: u32) -> Self {
        self.config.max_side = px.max(16);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.config.report_title = title.into();
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font = FontSource::Path(path.into());
        self
    }

    pub fn font_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.config.font = FontSource::Bytes(bytes);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ReportProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, BarcheckError> {
        let c = &self.config;
        if c.report_title.trim().is_empty() {
            return Err(BarcheckError::InvalidConfig(
                "report title must not be blank".into(),
            ));
        }
        if let FontSource::Bytes(bytes) = &c.font {
            if bytes.is_empty() {
                return Err(BarcheckError::InvalidConfig(
                    "font byte buffer is empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ingestion_contract() {
        let c = ReportConfig::default();
        assert_eq!(c.max_side, 1280);
        assert_eq!(c.jpeg_quality, 85);
        assert!(matches!(c.font, FontSource::Path(_)));
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = ReportConfig::builder()
            .max_side(1)
            .jpeg_quality(0)
            .build()
            .unwrap();
        assert_eq!(c.max_side, 16);
        assert_eq!(c.jpeg_quality, 1);

        let c = ReportConfig::builder().jpeg_quality(250).build().unwrap();
        assert_eq!(c.jpeg_quality, 100);
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = ReportConfig::builder().report_title("   ").build();
        assert!(matches!(err, Err(BarcheckError::InvalidConfig(_))));
    }

    #[test]
    fn empty_font_bytes_are_rejected() {
        let err = ReportConfig::builder().font_bytes(Vec::new()).build();
        assert!(matches!(err, Err(BarcheckError::InvalidConfig(_))));
    }

    #[test]
    fn missing_font_path_fails_to_load() {
        let src = FontSource::Path(PathBuf::from("/definitely/not/here.ttf"));
        assert!(matches!(
            src.load(),
            Err(BarcheckError::FontLoadFailed { .. })
        ));
    }
}

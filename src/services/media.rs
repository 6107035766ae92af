use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::AppConfig;

/// Tolerance for matching a ratio against the 16:9 / 9:16 targets
const ASPECT_EPSILON: f64 = 0.05;

/// Aspect classification of a video, used as the storage directory prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    pub fn as_dir(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_dir())
    }
}

/// Geometry of the probed video, always carrying the ratio that produced the class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
    pub ratio: f64,
    pub class: AspectClass,
}

impl VideoGeometry {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let ratio = width as f64 / height as f64;
        Self {
            width,
            height,
            ratio,
            class: classify_ratio(ratio),
        }
    }
}

fn classify_ratio(ratio: f64) -> AspectClass {
    if (ratio - 16.0 / 9.0).abs() < ASPECT_EPSILON {
        AspectClass::Landscape
    } else if (ratio - 9.0 / 16.0).abs() < ASPECT_EPSILON {
        AspectClass::Portrait
    } else {
        AspectClass::Other
    }
}

#[derive(Debug, Error)]
pub enum MediaToolError {
    #[error("failed to invoke {tool}: {source}")]
    Invocation {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not parse ffprobe output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("ffprobe reported no streams")]
    NoStreams,

    #[error("first stream descriptor has no width/height")]
    MissingGeometry,
}

/// Capability interface over the external media tooling, so the pipeline can be
/// exercised against an in-process fake in tests.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Probe a local file and classify its aspect ratio.
    async fn analyze(&self, path: &Path) -> Result<VideoGeometry, MediaToolError>;

    /// Rewrite the container for fast-start streaming without re-encoding.
    /// Returns the path of the newly written file; the input is left unmodified.
    async fn remux(&self, path: &Path) -> Result<PathBuf, MediaToolError>;
}

/// ffprobe/ffmpeg backed implementation
pub struct FfmpegProcessor {
    ffprobe_path: String,
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegProcessor {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ffprobe_path: config.ffprobe_path.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }

    async fn run(
        &self,
        tool: &'static str,
        mut cmd: Command,
    ) -> Result<std::process::Output, MediaToolError> {
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaToolError::Invocation { tool, source })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaToolError::Timeout {
                tool,
                timeout: self.timeout,
            })?
            .map_err(|source| MediaToolError::Invocation { tool, source })?;

        if !output.status.success() {
            return Err(MediaToolError::Failed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse ffprobe's JSON stream listing and classify from the first descriptor
fn parse_geometry(stdout: &[u8]) -> Result<VideoGeometry, MediaToolError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;

    let first = probe.streams.first().ok_or(MediaToolError::NoStreams)?;

    match (first.width, first.height) {
        (Some(width), Some(height)) => Ok(VideoGeometry::from_dimensions(width, height)),
        _ => Err(MediaToolError::MissingGeometry),
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn analyze(&self, path: &Path) -> Result<VideoGeometry, MediaToolError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(path);

        let output = self.run("ffprobe", cmd).await?;
        let geometry = parse_geometry(&output.stdout)?;

        debug!(
            width = geometry.width,
            height = geometry.height,
            class = %geometry.class,
            "probed video geometry"
        );

        Ok(geometry)
    }

    async fn remux(&self, path: &Path) -> Result<PathBuf, MediaToolError> {
        let mut output_path = path.as_os_str().to_owned();
        output_path.push(".processing");
        let output_path = PathBuf::from(output_path);

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-i")
            .arg(path)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(&output_path);

        self.run("ffmpeg", cmd).await?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_landscape() {
        let geometry = VideoGeometry::from_dimensions(1920, 1080);
        assert_eq!(geometry.class, AspectClass::Landscape);
    }

    #[test]
    fn test_classify_portrait() {
        let geometry = VideoGeometry::from_dimensions(1080, 1920);
        assert_eq!(geometry.class, AspectClass::Portrait);
    }

    #[test]
    fn test_classify_square_as_other() {
        let geometry = VideoGeometry::from_dimensions(1000, 1000);
        assert_eq!(geometry.class, AspectClass::Other);
    }

    #[test]
    fn test_classify_is_symmetric_around_targets() {
        // Slightly wider and slightly narrower than 16:9 both still match
        assert_eq!(classify_ratio(16.0 / 9.0 + 0.04), AspectClass::Landscape);
        assert_eq!(classify_ratio(16.0 / 9.0 - 0.04), AspectClass::Landscape);
        assert_eq!(classify_ratio(9.0 / 16.0 + 0.04), AspectClass::Portrait);
        assert_eq!(classify_ratio(9.0 / 16.0 - 0.04), AspectClass::Portrait);
    }

    #[test]
    fn test_classify_epsilon_boundary() {
        assert_eq!(classify_ratio(16.0 / 9.0 + 0.05), AspectClass::Other);
        assert_eq!(classify_ratio(9.0 / 16.0 - 0.05), AspectClass::Other);
    }

    #[test]
    fn test_common_resolutions() {
        // 4K and 720p are still 16:9
        assert_eq!(
            VideoGeometry::from_dimensions(3840, 2160).class,
            AspectClass::Landscape
        );
        assert_eq!(
            VideoGeometry::from_dimensions(1280, 720).class,
            AspectClass::Landscape
        );
        // 4:3 is neither
        assert_eq!(
            VideoGeometry::from_dimensions(640, 480).class,
            AspectClass::Other
        );
    }

    #[test]
    fn test_parse_geometry_valid() {
        let json = br#"{"streams": [{"width": 1920, "height": 1080, "codec_type": "video"}]}"#;
        let geometry = parse_geometry(json).unwrap();
        assert_eq!(geometry.width, 1920);
        assert_eq!(geometry.height, 1080);
        assert_eq!(geometry.class, AspectClass::Landscape);
    }

    #[test]
    fn test_parse_geometry_empty_streams() {
        let err = parse_geometry(br#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, MediaToolError::NoStreams));
    }

    #[test]
    fn test_parse_geometry_missing_streams_key() {
        let err = parse_geometry(br#"{"format": {}}"#).unwrap_err();
        assert!(matches!(err, MediaToolError::NoStreams));
    }

    #[test]
    fn test_parse_geometry_missing_dimensions() {
        // e.g. an audio stream listed first
        let json = br#"{"streams": [{"codec_type": "audio"}]}"#;
        let err = parse_geometry(json).unwrap_err();
        assert!(matches!(err, MediaToolError::MissingGeometry));
    }

    #[test]
    fn test_parse_geometry_junk_output() {
        let err = parse_geometry(b"not json at all").unwrap_err();
        assert!(matches!(err, MediaToolError::MalformedOutput(_)));
    }

    #[test]
    fn test_aspect_class_directories() {
        assert_eq!(AspectClass::Landscape.as_dir(), "landscape");
        assert_eq!(AspectClass::Portrait.as_dir(), "portrait");
        assert_eq!(AspectClass::Other.as_dir(), "other");
    }
}

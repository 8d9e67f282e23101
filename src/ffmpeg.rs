use crate::error::CompositionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error};

const MUSIC_VOLUME: &str = "0.2";

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub background: PathBuf,
    pub narration: PathBuf,
    pub music: PathBuf,
    pub output: PathBuf,
    pub duration_secs: u32,
}

/// AV-processing capability, implemented by supervised child processes.
#[async_trait]
pub trait AvProcessor: Send + Sync {
    async fn probe_duration(&self, audio: &Path) -> Result<f64, CompositionError>;
    async fn render(&self, job: &RenderJob) -> Result<(), CompositionError>;
}

pub struct FfmpegProcessor;

fn filter_graph(duration_secs: u32) -> String {
    format!(
        "[0:v]trim=duration={d},setpts=PTS-STARTPTS[vid];\
         [2:a]atrim=duration={d},asetpts=PTS-STARTPTS,volume={v}[bgm];\
         [1:a][bgm]amix=inputs=2:duration=longest:dropout_transition=2[mix]",
        d = duration_secs,
        v = MUSIC_VOLUME,
    )
}

/// Argument contract: loop the background indefinitely, trim video and music
/// to the target duration, mix narration over attenuated music, re-encode.
fn render_args(job: &RenderJob) -> Vec<String> {
    vec![
        "-y".into(),
        "-stream_loop".into(),
        "-1".into(),
        "-i".into(),
        job.background.display().to_string(),
        "-i".into(),
        job.narration.display().to_string(),
        "-i".into(),
        job.music.display().to_string(),
        "-filter_complex".into(),
        filter_graph(job.duration_secs),
        "-map".into(),
        "[vid]".into(),
        "-map".into(),
        "[mix]".into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-b:v".into(),
        "2000k".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        "30".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        "-ar".into(),
        "44100".into(),
        "-shortest".into(),
        job.output.display().to_string(),
    ]
}

fn parse_probe_output(raw: &str) -> Result<f64, CompositionError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CompositionError::BadProbeOutput {
            output: raw.trim().to_string(),
        })
}

#[async_trait]
impl AvProcessor for FfmpegProcessor {
    async fn probe_duration(&self, audio: &Path) -> Result<f64, CompositionError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(audio)
            .output()
            .await
            .map_err(|source| CompositionError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(CompositionError::Process {
                tool: "ffprobe",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn render(&self, job: &RenderJob) -> Result<(), CompositionError> {
        let args = render_args(job);
        debug!("running ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .output()
            .await
            .map_err(|source| CompositionError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        if !output.status.success() {
            error!("ffmpeg failed while composing {}", job.output.display());
            return Err(CompositionError::Process {
                tool: "ffmpeg",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

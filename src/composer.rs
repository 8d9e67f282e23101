use crate::error::CompositionError;
use crate::ffmpeg::{AvProcessor, RenderJob};
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const DEFAULT_BACKGROUND: &str = "default.mp4";
const TRAILING_BUFFER_SECS: u32 = 2;
// Lets the external process release its file handles before cleanup.
const CLEANUP_GRACE: Duration = Duration::from_millis(250);

/// Turns narration audio into a publishable video: random background video,
/// attenuated background music, narration on top.
pub struct MediaComposer {
    av: Arc<dyn AvProcessor>,
    scratch_dir: PathBuf,
    backgrounds_dir: PathBuf,
    music_path: PathBuf,
}

impl MediaComposer {
    pub fn new(
        av: Arc<dyn AvProcessor>,
        scratch_dir: impl Into<PathBuf>,
        backgrounds_dir: impl Into<PathBuf>,
        music_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            av,
            scratch_dir: scratch_dir.into(),
            backgrounds_dir: backgrounds_dir.into(),
            music_path: music_path.into(),
        }
    }

    pub async fn compose(&self, audio: &[u8]) -> Result<Vec<u8>, CompositionError> {
        fs::create_dir_all(&self.scratch_dir).await?;

        let background = self.pick_background().await;
        if !background.exists() {
            return Err(CompositionError::MissingAsset(background));
        }
        if !self.music_path.exists() {
            return Err(CompositionError::MissingAsset(self.music_path.clone()));
        }

        let stamp = Utc::now().timestamp_millis();
        let narration_path = self.scratch_dir.join(format!("narration_{stamp}.mp3"));
        let output_path = self.scratch_dir.join(format!("composed_{stamp}.mp4"));

        let result = self
            .compose_inner(audio, &background, &narration_path, &output_path)
            .await;

        sleep(CLEANUP_GRACE).await;
        for path in [&narration_path, &output_path] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to remove scratch file {}: {}", path.display(), e);
                }
            }
        }

        result
    }

    async fn compose_inner(
        &self,
        audio: &[u8],
        background: &Path,
        narration_path: &Path,
        output_path: &Path,
    ) -> Result<Vec<u8>, CompositionError> {
        fs::write(narration_path, audio).await?;
        let written = fs::metadata(narration_path).await?.len();
        if written == 0 {
            return Err(CompositionError::EmptyAudio);
        }
        debug!(
            "narration audio written to {} ({} bytes)",
            narration_path.display(),
            written
        );

        let narration_secs = self.av.probe_duration(narration_path).await?;
        // Trailing buffer keeps the mux's shortest-stream policy from
        // clipping the end of the narration.
        let duration_secs = narration_secs.ceil() as u32 + TRAILING_BUFFER_SECS;
        info!(
            "composing {}s video over {}",
            duration_secs,
            background.display()
        );

        let job = RenderJob {
            background: background.to_path_buf(),
            narration: narration_path.to_path_buf(),
            music: self.music_path.clone(),
            output: output_path.to_path_buf(),
            duration_secs,
        };
        self.av.render(&job).await?;

        let video = fs::read(output_path).await?;
        info!("composed video ready ({} bytes)", video.len());
        Ok(video)
    }

    /// Uniform-random pick among the candidate backgrounds; an empty or
    /// unreadable directory falls back to the fixed default path.
    async fn pick_background(&self) -> PathBuf {
        let mut candidates = Vec::new();
        match fs::read_dir(&self.backgrounds_dir).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    let is_mp4 = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
                        .unwrap_or(false);
                    if is_mp4 {
                        candidates.push(path);
                    }
                }
            }
            Err(e) => warn!(
                "cannot read backgrounds directory {}: {}",
                self.backgrounds_dir.display(),
                e
            ),
        }

        if candidates.is_empty() {
            let fallback = self.backgrounds_dir.join(DEFAULT_BACKGROUND);
            warn!(
                "no background candidates available, falling back to {}",
                fallback.display()
            );
            return fallback;
        }
        let index = rand::thread_rng().gen_range(0..candidates.len());
        candidates.swap_remove(index)
    }
}

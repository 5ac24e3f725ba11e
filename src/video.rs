//! Frame extraction for video thumbnails.

use anyhow::{Context, bail};
use std::path::Path;
use std::process::{Command, Stdio};

/// Grabs one frame of a video and writes it as a JPEG.
pub trait VideoThumbnailer: Send + Sync {
    fn extract_frame(
        &self,
        video: &Path,
        dest: &Path,
        seek_secs: u32,
        width: u32,
    ) -> anyhow::Result<()>;
}

/// Runs an ffmpeg-compatible program.
#[derive(Debug, Clone)]
pub struct CommandThumbnailer {
    program: String,
}

impl CommandThumbnailer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl VideoThumbnailer for CommandThumbnailer {
    fn extract_frame(
        &self,
        video: &Path,
        dest: &Path,
        seek_secs: u32,
        width: u32,
    ) -> anyhow::Result<()> {
        let status = Command::new(&self.program)
            .arg("-nostdin")
            .args(["-loglevel", "error"])
            .args(["-ss", &seek_secs.to_string()])
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1"])
            .args(["-vf", &format!("scale={width}:-2")])
            .arg("-y")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .with_context(|| format!("running {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {status} for {}", self.program, video.display());
        }
        Ok(())
    }
}

//! Conversion of the downloaded audio stream into an MP3 file.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::youtube::AudioStream;

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Consumes `input` and writes an MP3 file at `destination`.
    async fn transcode(&self, input: Box<dyn AudioStream>, destination: &Path) -> Result<()>;
}

/// Pipes the stream into an `ffmpeg` child process through stdin.
#[derive(Debug, Clone, PartialEq)]
pub struct Ffmpeg {
    /// The path to the ffmpeg executable.
    pub executable_path: PathBuf,
}

impl Ffmpeg {
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
        }
    }

    fn args(destination: &Path) -> Vec<String> {
        [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-i",
            "pipe:0",
            "-vn",
            "-codec:a",
            "libmp3lame",
            "-q:a",
            "0",
            "-f",
            "mp3",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .chain(std::iter::once(destination.display().to_string()))
        .collect()
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn transcode(&self, mut input: Box<dyn AudioStream>, destination: &Path) -> Result<()> {
        let transcode_error = |reason: String| Error::Transcode {
            path: destination.display().to_string(),
            reason,
        };

        let args = Self::args(destination);
        debug!("Executing {:?} {:?}", self.executable_path, args);

        let mut child = Command::new(&self.executable_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| transcode_error(e.to_string()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| transcode_error("Failed to capture stdin".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| transcode_error("Failed to capture stderr".to_string()))?;

        // Drain stderr so a chatty ffmpeg cannot block on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            tokio::io::BufReader::new(stderr_handle)
                .read_to_string(&mut buffer)
                .await?;
            Ok::<String, std::io::Error>(buffer)
        });

        while let Some(chunk) = input.next_chunk().await? {
            if let Err(e) = stdin.write_all(&chunk).await {
                // ffmpeg exited early; its exit status says why.
                debug!("ffmpeg stopped reading input: {e}");
                break;
            }
        }
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| transcode_error(e.to_string()))?;
        let stderr = match stderr_task.await {
            Ok(Ok(stderr)) => stderr,
            Ok(Err(e)) => return Err(transcode_error(e.to_string())),
            Err(e) => return Err(transcode_error(e.to_string())),
        };

        if status.success() {
            return Ok(());
        }

        Err(transcode_error(format!(
            "ffmpeg failed with code {}: {}",
            status.code().unwrap_or(-1),
            stderr.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunks(Vec<Vec<u8>>);

    #[async_trait]
    impl AudioStream for Chunks {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            })
        }
    }

    #[test]
    fn reads_stdin_and_writes_mp3_to_destination() {
        let args = Ffmpeg::args(Path::new("out/Song A.mp3"));
        assert_eq!(&args[4..6], ["-i", "pipe:0"]);
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));
        assert_eq!(args.last().map(String::as_str), Some("out/Song A.mp3"));
    }

    #[tokio::test]
    async fn missing_executable_is_a_transcode_error() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg-binary");
        let err = ffmpeg
            .transcode(Box::new(Chunks(vec![vec![1, 2, 3]])), Path::new("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transcode { .. }));
    }
}

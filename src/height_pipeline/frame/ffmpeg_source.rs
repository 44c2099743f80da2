//! Video frame source that streams decoded frames out of an `ffmpeg` child process.
//!
//! The video is converted to `rawvideo` with the `rgba` pixel format, so every
//! frame arrives as `width * height * 4` bytes on the child's stdout. The frame
//! size is probed up front with `ffprobe`.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::rgba_decoder::RgbaFrameDecoder;
use crate::height_pipeline::frame::source::FrameSource;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<usize>,
    height: Option<usize>,
}

pub struct FfmpegFrameSource {
    child: Child,
    stream: FrameStream<ChildStdout>,
    decoder: RgbaFrameDecoder,
}

/// Splits a byte stream into fixed-size frames.
struct FrameStream<R> {
    reader: R,
    frame_len: usize,
    finished: bool,
}

impl<R: Read> FrameStream<R> {
    fn new(reader: R, frame_len: usize) -> Self {
        Self {
            reader,
            frame_len,
            finished: false,
        }
    }

    /// `None` once the stream has ended. A truncated trailing frame is dropped.
    fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }

        let mut frame = vec![0u8; self.frame_len];
        let filled = read_frame(&mut self.reader, &mut frame)?;
        if filled < self.frame_len {
            if filled > 0 {
                warn!(
                    "Dropping truncated trailing frame ({} of {} bytes)",
                    filled, self.frame_len
                );
            }
            self.finished = true;
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

impl FfmpegFrameSource {
    pub fn open<P: AsRef<Path>>(video: P) -> Result<Self> {
        let video = video.as_ref();
        let ffmpeg = find_binary("ffmpeg")?;
        let ffprobe = find_binary("ffprobe")?;

        let (width, height) = probe_dimensions(&ffprobe, video)?;
        debug!(
            "Opening {} ({}x{}) with {}",
            video.display(),
            width,
            height,
            ffmpeg.display()
        );

        let mut child = Command::new(&ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(video)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessorError::SourceError(format!("failed to spawn ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessorError::SourceError("ffmpeg stdout not captured".to_string()))?;

        let decoder = RgbaFrameDecoder::new(width, height);
        Ok(Self {
            child,
            stream: FrameStream::new(stdout, decoder.frame_len()),
            decoder,
        })
    }

    /// Decoder matching the frames this source yields.
    pub fn decoder(&self) -> RgbaFrameDecoder {
        self.decoder
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.stream.finished {
            return Ok(None);
        }

        match self.stream.next_frame()? {
            Some(frame) => Ok(Some(frame)),
            None => {
                let status = self.child.wait()?;
                check_exit(status)?;
                Ok(None)
            }
        }
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if !self.stream.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn check_exit(status: ExitStatus) -> Result<()> {
    if !status.success() {
        return Err(ProcessorError::SourceError(format!(
            "ffmpeg exited with {}",
            status
        )));
    }
    Ok(())
}

/// Fills `frame` from `reader` and returns how many bytes were read. Fewer
/// than `frame.len()` bytes means the stream ended.
fn read_frame(reader: &mut impl Read, frame: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < frame.len() {
        match reader.read(&mut frame[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn find_binary(name: &str) -> Result<PathBuf> {
    which::which(name)
        .map_err(|_| ProcessorError::SourceError(format!("{} not found in PATH", name)))
}

fn probe_dimensions(ffprobe: &Path, video: &Path) -> Result<(usize, usize)> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "json",
        ])
        .arg(video)
        .output()
        .map_err(|e| ProcessorError::SourceError(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(ProcessorError::SourceError(format!(
            "ffprobe failed for {}: {}",
            video.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(json: &[u8]) -> Result<(usize, usize)> {
    let probe: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| ProcessorError::SourceError(format!("unreadable ffprobe output: {}", e)))?;

    match probe.streams.first() {
        Some(ProbeStream {
            width: Some(w),
            height: Some(h),
        }) if *w > 0 && *h > 0 => Ok((*w, *h)),
        _ => Err(ProcessorError::SourceError(
            "no video stream with known dimensions".to_string(),
        )),
    }
}

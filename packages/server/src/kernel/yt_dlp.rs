//! `yt-dlp` subprocess driver.
//!
//! Runs the `yt-dlp` binary (which in turn drives `ffmpeg`) for one job:
//! - selects the best audio stream and converts it to the requested codec
//! - writes into the scratch directory as `<title>.<ext>`
//! - prints machine-readable progress lines on stderr, one per update
//! - prints a JSON summary of the produced file on stdout once
//!   post-processing is done
//!
//! Progress lines are parsed best-effort; anything unparseable is logged and
//! skipped so it can never fail the job.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::Command;
use tracing::{debug, warn};

use super::error::{ExtractionError, ProgressParseError};
use super::traits::{BaseMediaExtractor, EngineProgress, ExtractedMedia, ExtractionRequest};

/// Best audio-only stream, or the best muxed stream if none exists
const FORMAT_SELECTOR: &str = "bestaudio/best";

/// Output filename template, relative to the scratch directory
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

const PROGRESS_MARKER: &str = "[fetch-progress]";
const RESULT_MARKER: &str = "[fetch-result]";

/// Keep this many trailing stderr lines for error reporting
const STDERR_TAIL: usize = 20;

pub struct YtDlpExtractor {
    program: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for one extraction.
    pub fn build_args(request: &ExtractionRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            FORMAT_SELECTOR.into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            request.format.codec().into(),
            "--audio-quality".into(),
            request.quality.clone().into(),
            "-o".into(),
            request.work_dir.join(OUTPUT_TEMPLATE).into_os_string(),
            "--socket-timeout".into(),
            request.socket_timeout.as_secs().max(1).to_string().into(),
            "--user-agent".into(),
            request.user_agent.clone().into(),
        ];

        if let Some(referer) = &request.referer {
            args.push("--add-header".into());
            args.push(format!("Referer:{}", referer).into());
        }

        args.extend(
            [
                "--no-playlist",
                "--newline",
                "--no-colors",
                "--progress",
                "--progress-template",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(
            format!(
                "download:{}%(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s",
                PROGRESS_MARKER
            )
            .into(),
        );
        args.push("--print".into());
        args.push(format!("after_move:{}%(.{{title,duration,filepath}})j", RESULT_MARKER).into());

        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }
}

#[async_trait]
impl BaseMediaExtractor for YtDlpExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<ExtractedMedia, ExtractionError> {
        let args = Self::build_args(request);
        debug!(program = %self.program.display(), url = %request.url, "spawning yt-dlp");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractionError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // `--print` switches yt-dlp to quiet mode: the result line stays on
        // stdout, progress and diagnostics move to stderr.
        let mut stdout = child.stdout.take().map(|out| BufReader::new(out).lines());
        let mut stderr = child.stderr.take().map(|err| BufReader::new(err).lines());
        let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL);
        let mut media = None;

        while stdout.is_some() || stderr.is_some() {
            let (line, from_stderr) = tokio::select! {
                line = next_line(&mut stdout), if stdout.is_some() => match line? {
                    Some(line) => (line, false),
                    None => {
                        stdout = None;
                        continue;
                    }
                },
                line = next_line(&mut stderr), if stderr.is_some() => match line? {
                    Some(line) => (line, true),
                    None => {
                        stderr = None;
                        continue;
                    }
                },
            };

            if let Some(progress) = parse_progress_line(&line) {
                match progress {
                    Ok(progress) => on_progress(progress),
                    Err(e) => debug!(error = %e, "ignoring progress line"),
                }
            } else if let Some(result) = parse_result_line(&line) {
                media = Some(result?);
            } else if from_stderr {
                if stderr_tail.len() == STDERR_TAIL {
                    stderr_tail.pop_front();
                }
                stderr_tail.push_back(line);
            }
        }

        let status = child.wait().await?;

        if !status.success() {
            let message = engine_error_message(stderr_tail.make_contiguous())
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            warn!(url = %request.url, error = %message, "yt-dlp failed");
            return Err(ExtractionError::EngineFailed(message));
        }

        media.ok_or(ExtractionError::MissingMetadata)
    }
}

/// Next line from an output stream; `None` once it is closed or absent.
async fn next_line<R>(lines: &mut Option<Lines<R>>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await,
        None => Ok(None),
    }
}

/// The most useful line of yt-dlp's stderr: the last `ERROR:` line, else the
/// last non-empty one.
fn engine_error_message(stderr_tail: &[String]) -> Option<String> {
    stderr_tail
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr_tail.iter().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
}

/// Parse a progress line. `None` if the line is not a progress line at all.
pub fn parse_progress_line(line: &str) -> Option<Result<EngineProgress, ProgressParseError>> {
    let payload = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let invalid = || ProgressParseError {
        line: line.to_string(),
    };

    let mut fields = payload.split('|').map(str::trim);
    let parsed = match fields.next() {
        Some("downloading") => match (fields.next(), fields.next(), fields.next()) {
            (Some(percent), Some(speed), Some(eta)) if !percent.is_empty() => {
                Ok(EngineProgress::Downloading {
                    percent: percent.to_string(),
                    speed: speed.to_string(),
                    eta: eta.to_string(),
                })
            }
            _ => Err(invalid()),
        },
        Some("finished") => Ok(EngineProgress::Finished),
        _ => Err(invalid()),
    };
    Some(parsed)
}

#[derive(Deserialize)]
struct PrintedMedia {
    title: Option<String>,
    duration: Option<f64>,
    filepath: Option<PathBuf>,
}

/// Parse the post-processing summary line. `None` if the line is not one.
pub fn parse_result_line(line: &str) -> Option<Result<ExtractedMedia, ExtractionError>> {
    let payload = line.trim().strip_prefix(RESULT_MARKER)?;
    let parsed = serde_json::from_str::<PrintedMedia>(payload)
        .map_err(ExtractionError::from)
        .and_then(|printed| {
            let media_path = printed.filepath.ok_or(ExtractionError::MissingMetadata)?;
            Ok(ExtractedMedia {
                title: printed.title,
                duration: printed.duration,
                media_path,
            })
        });
    Some(parsed)
}

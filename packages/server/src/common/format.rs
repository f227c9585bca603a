//! Output audio formats and quality presets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bitrate used when the client does not pick one.
pub const DEFAULT_QUALITY: &str = "192";

/// Bitrates advertised to clients. Quality itself is free-form and passed
/// through to the engine unchanged.
pub const QUALITY_PRESETS: &[&str] = &["128", "192", "256", "320"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    M4a,
    Flac,
    Opus,
    Vorbis,
}

#[derive(Debug, Error)]
#[error("Invalid format. Supported formats: {}", AudioFormat::supported_list())]
pub struct InvalidFormat(pub String);

impl AudioFormat {
    pub fn all() -> &'static [AudioFormat] {
        &[
            AudioFormat::Mp3,
            AudioFormat::Wav,
            AudioFormat::M4a,
            AudioFormat::Flac,
            AudioFormat::Opus,
            AudioFormat::Vorbis,
        ]
    }

    /// Codec name understood by the engine's audio extraction step.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
            AudioFormat::Vorbis => "vorbis",
        }
    }

    /// File extension the engine writes for this codec.
    ///
    /// Vorbis audio lands in an Ogg container.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Vorbis => "ogg",
            other => other.codec(),
        }
    }

    fn supported_list() -> String {
        Self::all()
            .iter()
            .map(|f| f.codec())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codec())
    }
}

impl FromStr for AudioFormat {
    type Err = InvalidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|f| f.codec() == lowered)
            .ok_or_else(|| InvalidFormat(s.to_string()))
    }
}

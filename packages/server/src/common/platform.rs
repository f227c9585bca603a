//! Source platform detection.
//!
//! A URL is classified by case-insensitive substring matching against a
//! static, ordered table. The first platform with a matching substring wins;
//! URLs that match nothing are `generic`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Vimeo,
    Dailymotion,
    Twitter,
    Tiktok,
    Instagram,
    Facebook,
    Reddit,
    Twitch,
    Soundcloud,
    Spotify,
    Generic,
}

/// Ordered detection table.
///
/// `reddit.com` contains `t.co`, so reddit must be checked before twitter.
const PLATFORM_TABLE: &[(Platform, &[&str])] = &[
    (Platform::Youtube, &["youtube.com", "youtu.be", "yt.be"]),
    (Platform::Vimeo, &["vimeo.com"]),
    (Platform::Dailymotion, &["dailymotion.com", "dai.ly"]),
    (Platform::Reddit, &["reddit.com"]),
    (Platform::Twitter, &["twitter.com", "x.com", "t.co"]),
    (Platform::Tiktok, &["tiktok.com", "vm.tiktok.com"]),
    (Platform::Instagram, &["instagram.com", "instagr.am"]),
    (Platform::Facebook, &["facebook.com", "fb.watch"]),
    (Platform::Twitch, &["twitch.tv"]),
    (Platform::Soundcloud, &["soundcloud.com"]),
    (Platform::Spotify, &["spotify.com"]),
];

impl Platform {
    /// Every label the service knows about, in display order, ending with `generic`.
    pub fn all() -> &'static [Platform] {
        &[
            Platform::Youtube,
            Platform::Vimeo,
            Platform::Dailymotion,
            Platform::Twitter,
            Platform::Tiktok,
            Platform::Instagram,
            Platform::Facebook,
            Platform::Reddit,
            Platform::Twitch,
            Platform::Soundcloud,
            Platform::Spotify,
            Platform::Generic,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Vimeo => "vimeo",
            Platform::Dailymotion => "dailymotion",
            Platform::Twitter => "twitter",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Reddit => "reddit",
            Platform::Twitch => "twitch",
            Platform::Soundcloud => "soundcloud",
            Platform::Spotify => "spotify",
            Platform::Generic => "generic",
        }
    }

    /// Human-facing name used in job messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Vimeo => "Vimeo",
            Platform::Dailymotion => "Dailymotion",
            Platform::Twitter => "Twitter",
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Reddit => "Reddit",
            Platform::Twitch => "Twitch",
            Platform::Soundcloud => "SoundCloud",
            Platform::Spotify => "Spotify",
            Platform::Generic => "Generic",
        }
    }

    /// Platforms whose media cannot be fetched without user credentials.
    /// Jobs for these fail immediately without contacting the engine.
    pub fn requires_authentication(&self) -> bool {
        matches!(self, Platform::Spotify)
    }

    /// Platforms that reject requests lacking a `Referer` header.
    pub fn needs_referer(&self) -> bool {
        matches!(self, Platform::Instagram | Platform::Tiktok)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a URL into a platform label. Total and pure.
pub fn classify(url: &str) -> Platform {
    let url = url.to_lowercase();
    PLATFORM_TABLE
        .iter()
        .find(|(_, domains)| domains.iter().any(|domain| url.contains(domain)))
        .map(|(platform, _)| *platform)
        .unwrap_or(Platform::Generic)
}

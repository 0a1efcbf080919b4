use std::fmt;
use std::path::PathBuf;

use crate::shared::constants::{REMOTE_SCHEMES, YOUTUBE_HOSTS};

/// What the user asked to play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceReference {
    File(PathBuf),
    /// A URL ffmpeg can open directly.
    Remote(String),
    /// A YouTube page URL that must be resolved to a media URL first.
    YouTube(String),
}

impl SourceReference {
    /// Classifies a raw reference string. Anything without a known URL
    /// scheme is treated as a local path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Self::File(PathBuf::from(trimmed));
        };
        let scheme = scheme.to_ascii_lowercase();
        if !REMOTE_SCHEMES.contains(&scheme.as_str()) {
            return Self::File(PathBuf::from(trimmed));
        }
        if (scheme == "http" || scheme == "https") && is_youtube_host(&host_of(rest)) {
            return Self::YouTube(trimmed.to_string());
        }
        Self::Remote(trimmed.to_string())
    }

    pub fn needs_resolution(&self) -> bool {
        matches!(self, Self::YouTube(_))
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) | Self::YouTube(url) => f.write_str(url),
        }
    }
}

/// Host part of `rest` (the text after `scheme://`), lowercased, without
/// credentials or port.
fn host_of(rest: &str) -> String {
    let authority = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    host_port
        .split(':')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn is_youtube_host(host: &str) -> bool {
    YOUTUBE_HOSTS.contains(&host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::watch("https://www.youtube.com/watch?v=wU7hEYvGZdU")]
    #[case::short_link("https://youtu.be/wU7hEYvGZdU")]
    #[case::mobile("http://m.youtube.com/watch?v=wU7hEYvGZdU")]
    #[case::upper_case_host("https://WWW.YOUTUBE.COM/watch?v=abc")]
    #[case::with_port("https://youtube.com:443/watch?v=abc")]
    fn test_youtube_urls_need_resolution(#[case] raw: &str) {
        let r = SourceReference::parse(raw);
        assert!(matches!(r, SourceReference::YouTube(_)), "{raw} -> {r:?}");
        assert!(r.needs_resolution());
        assert!(r.is_remote());
    }

    #[rstest]
    #[case::http("http://example.com/video.mp4")]
    #[case::rtsp("rtsp://camera.local:554/stream")]
    #[case::lookalike("https://notyoutube.com/watch?v=abc")]
    #[case::youtube_in_path("https://cdn.example.com/youtube.com/v.mp4")]
    fn test_direct_remote_urls(#[case] raw: &str) {
        let r = SourceReference::parse(raw);
        assert_eq!(r, SourceReference::Remote(raw.to_string()));
        assert!(!r.needs_resolution());
    }

    #[rstest]
    #[case::relative("face.mp4")]
    #[case::absolute("/videos/clip.mov")]
    #[case::unknown_scheme("foo://bar")]
    fn test_paths_are_files(#[case] raw: &str) {
        let r = SourceReference::parse(raw);
        assert_eq!(r, SourceReference::File(PathBuf::from(raw)));
        assert!(!r.is_remote());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            SourceReference::parse("  face.mp4 \n"),
            SourceReference::File(PathBuf::from("face.mp4"))
        );
    }

    #[test]
    fn test_display_shows_original_text() {
        let url = "https://youtu.be/abc";
        assert_eq!(SourceReference::parse(url).to_string(), url);
        assert_eq!(SourceReference::parse("face.mp4").to_string(), "face.mp4");
    }

    #[test]
    fn test_credentials_are_not_part_of_host() {
        assert_eq!(host_of("user:pw@youtube.com/watch"), "youtube.com");
    }
}

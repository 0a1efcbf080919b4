use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("yt-dlp not found in PATH")]
    ToolNotFound,
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not resolve {url}: {message}")]
    Failed { url: String, message: String },
    #[error("no playable stream URL returned for {url}")]
    NoStream { url: String },
}

/// Turns a user-facing page URL into a direct, time-limited media URL.
///
/// Resolved URLs expire, so callers resolve again for every open.
pub trait UrlResolver {
    fn resolve(&self, page_url: &str) -> Result<String, ResolutionError>;
}

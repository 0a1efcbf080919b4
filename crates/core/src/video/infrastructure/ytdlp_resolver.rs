use std::process::Command;

use crate::shared::constants::YOUTUBE_FORMAT;
use crate::video::domain::url_resolver::{ResolutionError, UrlResolver};

/// Resolves YouTube page URLs by shelling out to `yt-dlp --get-url`.
pub struct YtDlpResolver {
    program: String,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }

    /// Uses a different executable name or path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args<'a>(&'a self, page_url: &'a str) -> [&'a str; 7] {
        [
            "--get-url",
            "--format",
            YOUTUBE_FORMAT,
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            page_url,
        ]
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlResolver for YtDlpResolver {
    fn resolve(&self, page_url: &str) -> Result<String, ResolutionError> {
        let program = which::which(&self.program).map_err(|_| ResolutionError::ToolNotFound)?;

        log::info!("Resolving {page_url} with yt-dlp...");
        let output = Command::new(&program)
            .args(self.args(page_url))
            .output()
            .map_err(|source| ResolutionError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .last()
                .map(str::to_string)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(ResolutionError::Failed {
                url: page_url.to_string(),
                message,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        first_stream_url(&stdout).ok_or_else(|| ResolutionError::NoStream {
            url: page_url.to_string(),
        })
    }
}

/// yt-dlp prints one URL per selected stream; a progressive format
/// yields exactly one.
fn first_stream_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

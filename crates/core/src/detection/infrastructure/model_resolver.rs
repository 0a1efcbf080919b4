use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model {name} not found in {searched:?}; pass --model-dir or --model-base-url")]
    NotFound { name: String, searched: Vec<PathBuf> },
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name.
///
/// Resolution order:
/// 1. Explicit model directory
/// 2. User cache directory (platform-specific)
/// 3. Download from `{base_url}/{name}` into the cache, if a base URL is set
pub fn resolve(
    name: &str,
    model_dir: Option<&Path>,
    base_url: Option<&str>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    resolve_in(name, model_dir, &cache_dir, base_url, progress)
}

fn resolve_in(
    name: &str,
    model_dir: Option<&Path>,
    cache_dir: &Path,
    base_url: Option<&str>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let mut searched = Vec::new();

    if let Some(dir) = model_dir {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
        searched.push(dir.to_path_buf());
    }

    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }
    searched.push(cache_dir.to_path_buf());

    let Some(base_url) = base_url else {
        return Err(ModelResolveError::NotFound {
            name: name.to_string(),
            searched,
        });
    };

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    let url = model_url(base_url, name);
    log::info!("Downloading {name} from {url}");
    download(&url, &cached_path, progress)?;
    Ok(cached_path)
}

fn model_url(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/LandmarkPlayer/models/`
/// - Linux: `$XDG_CACHE_HOME/LandmarkPlayer/models/` or `~/.cache/LandmarkPlayer/models/`
/// - Windows: `%LOCALAPPDATA%/LandmarkPlayer/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("LandmarkPlayer").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("LandmarkPlayer").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = fs::File::create(temp_path).map_err(write_error(temp_path))?;

    // Stream in chunks; models can be large.
    let mut reader = response;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(write_error(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_error(temp_path))?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_error(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_error(dest))?;

    Ok(())
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ModelResolveError {
    let path = path.to_path_buf();
    move |source| ModelResolveError::Write { path, source }
}

//! Local cache of the airport dataset.
//!
//! The dataset is downloaded once and written verbatim to a cache path. What
//! happens on later runs is decided by an explicit `CachePolicy`.

use std::path::Path;
use std::time::Duration;

use crate::config::MAX_AIRPORTS_DOWNLOAD_SIZE;
use crate::error_handling::AtlasError;

/// When a cached dataset file is reused instead of downloaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Any existing file is used, whatever its age. The file has to be
    /// deleted by hand to force a refresh.
    #[default]
    Forever,
    /// The file is reused while its modification time is younger than the
    /// given age, and downloaded again otherwise.
    MaxAge(Duration),
}

/// Reads the cached dataset if the policy allows reusing it.
///
/// Returns `Ok(None)` when there is no usable cache file.
pub(crate) async fn load_cached(
    cache_path: &Path,
    policy: CachePolicy,
) -> Result<Option<Vec<u8>>, AtlasError> {
    let metadata = match tokio::fs::metadata(cache_path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AtlasError::directory(cache_path.display().to_string(), e)),
    };

    if let CachePolicy::MaxAge(max_age) = policy {
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok());
        match age {
            Some(age) if age <= max_age => {}
            _ => {
                log::info!(
                    "Cached airport data at {} is older than {:?}, downloading again",
                    cache_path.display(),
                    max_age
                );
                return Ok(None);
            }
        }
    }

    let bytes = tokio::fs::read(cache_path)
        .await
        .map_err(|e| AtlasError::directory(cache_path.display().to_string(), e))?;
    log::debug!("Loaded airport data from cache: {}", cache_path.display());
    Ok(Some(bytes))
}

/// Downloads the dataset and writes it verbatim to `cache_path`.
pub(crate) async fn download_and_cache(
    client: &reqwest::Client,
    source_url: &str,
    cache_path: &Path,
) -> Result<Vec<u8>, AtlasError> {
    log::info!("Downloading airport data from: {}", source_url);
    let bytes = download_with_size_limit(client, source_url).await?;

    if let Some(parent) = cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AtlasError::directory(parent.display().to_string(), e))?;
        }
    }
    tokio::fs::write(cache_path, &bytes)
        .await
        .map_err(|e| AtlasError::directory(cache_path.display().to_string(), e))?;

    Ok(bytes)
}

async fn download_with_size_limit(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, AtlasError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AtlasError::directory(url, e))?;

    if !response.status().is_success() {
        return Err(AtlasError::directory(
            url,
            format!("server returned {}", response.status()),
        ));
    }

    if let Some(content_length) = response.content_length() {
        if content_length > MAX_AIRPORTS_DOWNLOAD_SIZE as u64 {
            return Err(AtlasError::directory(
                url,
                format!(
                    "airport data too large: {} bytes (max: {} bytes)",
                    content_length, MAX_AIRPORTS_DOWNLOAD_SIZE
                ),
            ));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AtlasError::directory(url, e))?
        .to_vec();

    // content-length may be missing or wrong
    if bytes.len() > MAX_AIRPORTS_DOWNLOAD_SIZE {
        return Err(AtlasError::directory(
            url,
            format!(
                "airport data too large: {} bytes (max: {} bytes)",
                bytes.len(),
                MAX_AIRPORTS_DOWNLOAD_SIZE
            ),
        ));
    }

    Ok(bytes)
}

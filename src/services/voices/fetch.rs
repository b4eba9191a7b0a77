use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::USER_AGENT;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{CoreError, Result};

const TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize, Clone)]
pub struct CachedAsset {
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
    pub downloaded: bool,
}

pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()
        .map_err(|e| CoreError::Network(format!("HTTP client build failed: {e}")))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn digest_matches(expected: Option<&str>, actual: &str) -> bool {
    expected.map_or(true, |e| e.trim().eq_ignore_ascii_case(actual))
}

/// Returns the cached asset, downloading it first when the cache is empty
/// or doesn't match `expected_sha256`. A failed download is not retried.
pub fn ensure_cached(
    client: &Client,
    url: &str,
    cache: &Path,
    expected_sha256: Option<&str>,
) -> Result<CachedAsset> {
    if cache.exists() {
        let digest = sha256_file(cache)?;
        if digest_matches(expected_sha256, &digest) {
            info!("using cached voice asset {}", cache.display());
            return Ok(CachedAsset {
                path: cache.to_path_buf(),
                bytes: fs::metadata(cache)?.len(),
                sha256: digest,
                downloaded: false,
            });
        }
        warn!(
            "cached voice asset {} has sha256 {digest}, expected {}; downloading again",
            cache.display(),
            expected_sha256.unwrap_or_default()
        );
    }

    let bytes = download_to_file(client, url, cache)?;
    let digest = sha256_file(cache)?;

    if !digest_matches(expected_sha256, &digest) {
        return Err(CoreError::Asset(format!(
            "downloaded {url} has sha256 {digest}, expected {}",
            expected_sha256.unwrap_or_default()
        )));
    }

    Ok(CachedAsset {
        path: cache.to_path_buf(),
        sha256: digest,
        bytes,
        downloaded: true,
    })
}

/// Streams `url` into `path` through a `.part` file renamed on completion.
pub fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<u64> {
    info!("downloading {url}");

    let mut resp = client
        .get(url)
        .header(USER_AGENT, concat!("lessico-core/", env!("CARGO_PKG_VERSION")))
        .send()
        .map_err(|e| CoreError::Network(format!("GET {url} failed: {e}")))?;

    ensure_success(&resp)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let part = path.with_extension("part");
    let file = File::create(&part).map_err(|e| CoreError::WriteFailure {
        path: part.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let copied = resp
        .copy_to(&mut writer)
        .map_err(|e| CoreError::Network(format!("reading body of {url} failed: {e}")))
        .and_then(|n| {
            writer.flush()?;
            Ok(n)
        });

    let n = match copied {
        Ok(0) => {
            fs::remove_file(&part).ok();
            return Err(CoreError::Network(format!("{url} returned an empty body")));
        }
        Ok(n) => n,
        Err(e) => {
            fs::remove_file(&part).ok();
            return Err(e);
        }
    };

    drop(writer);
    fs::rename(&part, path).map_err(|e| CoreError::WriteFailure {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("downloaded {} bytes to {}", n, path.display());
    Ok(n)
}

fn ensure_success(resp: &Response) -> Result<()> {
    if !resp.status().is_success() {
        return Err(CoreError::Network(format!(
            "HTTP error {} from {}",
            resp.status(),
            resp.url()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset.bin");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_pin_is_case_insensitive_and_optional() {
        assert!(digest_matches(None, "abcd"));
        assert!(digest_matches(Some("ABCD"), "abcd"));
        assert!(!digest_matches(Some("abce"), "abcd"));
    }

    #[test]
    fn cached_asset_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voices-v1.0.bin");
        fs::write(&path, b"abc").unwrap();

        let client = http_client().unwrap();
        let asset = ensure_cached(
            &client,
            "http://127.0.0.1:9/unreachable",
            &path,
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
        )
        .unwrap();

        assert!(!asset.downloaded);
        assert_eq!(asset.bytes, 3);
    }
}

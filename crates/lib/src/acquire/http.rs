//! HTTP download and gzip/tar extraction.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};

use super::{AcquireError, Acquirer};

/// Downloads with `reqwest` and unpacks with `flate2` + `tar`.
#[derive(Debug, Clone, Default)]
pub struct HttpAcquirer {
  client: reqwest::Client,
}

impl HttpAcquirer {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Acquirer for HttpAcquirer {
  async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AcquireError> {
    info!(url = %url, "fetching URL");

    let fetch_err = |message: String| AcquireError::Fetch {
      url: url.to_string(),
      message,
    };

    let response = self.client.get(url).send().await.map_err(|e| fetch_err(e.to_string()))?;

    if !response.status().is_success() {
      return Err(fetch_err(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    tokio::fs::write(dest, &bytes).await?;

    debug!(path = %dest.display(), size = bytes.len(), "download complete");
    Ok(())
  }

  async fn unpack_archive(&self, archive: &Path, dest: &Path) -> Result<(), AcquireError> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    let path = archive.clone();

    blocking(move || unpack_tar_gz(&archive, &dest))
      .await
      .map_err(|source| AcquireError::Unpack { path, source })
  }

  async fn decompress(&self, file: &Path, dest: &Path) -> Result<(), AcquireError> {
    let file = file.to_path_buf();
    let dest = dest.to_path_buf();
    let path = file.clone();

    blocking(move || gunzip(&file, &dest))
      .await
      .map_err(|source| AcquireError::Decompress { path, source })
  }
}

async fn blocking<F>(f: F) -> io::Result<()>
where
  F: FnOnce() -> io::Result<()> + Send + 'static,
{
  tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}

fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> io::Result<()> {
  let file = File::open(archive_path)?;
  let decoder = GzDecoder::new(BufReader::new(file));
  fs::create_dir_all(dest)?;
  Archive::new(decoder).unpack(dest)?;

  debug!(archive = %archive_path.display(), dest = %dest.display(), "unpacked archive");
  Ok(())
}

fn gunzip(file_path: &Path, dest: &Path) -> io::Result<()> {
  let mut decoder = GzDecoder::new(BufReader::new(File::open(file_path)?));
  let mut out = File::create(dest)?;
  io::copy(&mut decoder, &mut out)?;

  // Helper executables are run on Windows but should look runnable here too.
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dest, fs::Permissions::from_mode(0o755))?;
  }

  debug!(path = %dest.display(), "decompressed");
  Ok(())
}

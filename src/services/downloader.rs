use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;

use crate::domain::document_link::{archive_file_name, DocumentLink};

/// Creates the dated destination folder for this run. A leftover folder
/// from an earlier run on the same day is reported rather than reused, so
/// one folder never holds two runs' downloads.
pub fn prepare_destination(output_root: &Path) -> Result<PathBuf> {
    let day = Local::now().format("%b-%d-%Y");
    let destination = output_root.join(format!("Downloads_{}", day));

    if destination.exists() {
        bail!(
            "Destination folder {} already exists; move it aside before re-running",
            destination.display()
        );
    }

    std::fs::create_dir_all(&destination).with_context(|| {
        format!(
            "Failed to create destination folder {}",
            destination.display()
        )
    })?;

    Ok(destination)
}

/// Fetches every collected link into the destination folder, one at a time
/// in collection order, as `<index>_<title>`. Any failed request ends the
/// run; there is no retry and no partial-result salvage.
pub async fn download_documents(
    links: &[DocumentLink],
    destination: &Path,
    request_timeout: Duration,
) -> Result<Vec<PathBuf>> {
    let client = reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .context("Failed to build the download client")?;

    let mut archives = vec![];

    for (index, link) in links.iter().enumerate() {
        let path = destination.join(archive_file_name(index, &link.title));
        log::info!("Downloading {} -> {}", link.url, path.display());

        let response = client
            .get(link.url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Download failed for {}", link.url))?;

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Download was interrupted for {}", link.url))?;

        std::fs::write(&path, &body)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        archives.push(path);
    }

    Ok(archives)
}

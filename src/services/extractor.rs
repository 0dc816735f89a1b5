use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zip::ZipArchive;

pub const UNZIPPED_DIR: &str = "Unzipped_Files";

/// Unpacks every `*.zip` in the destination folder into a shared
/// `Unzipped_Files` subfolder. Entry names are prefixed with the archive's
/// sequence index, so same-named entries from different archives land side
/// by side instead of overwriting each other. Archives are taken in sorted
/// name order to keep the numbering reproducible.
pub fn extract_archives(destination: &Path) -> Result<usize> {
    let unzip_dir = destination.join(UNZIPPED_DIR);
    fs::create_dir_all(&unzip_dir)
        .with_context(|| format!("Failed to create {}", unzip_dir.display()))?;

    let mut archives: Vec<PathBuf> = fs::read_dir(destination)
        .with_context(|| format!("Failed to list {}", destination.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .map(|extension| extension.eq_ignore_ascii_case("zip"))
                .unwrap_or(false)
        })
        .collect();
    archives.sort();

    let mut extracted = 0;

    for (archive_index, archive_path) in archives.iter().enumerate() {
        extracted += extract_one(archive_index, archive_path, &unzip_dir)?;
    }

    Ok(extracted)
}

fn extract_one(archive_index: usize, archive_path: &Path, unzip_dir: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not a readable zip archive", archive_path.display()))?;

    let mut extracted = 0;

    for entry_index in 0..archive.len() {
        let mut entry = archive.by_index(entry_index).with_context(|| {
            format!(
                "Failed to read entry {} of {}",
                entry_index,
                archive_path.display()
            )
        })?;

        if entry.enclosed_name().is_none() {
            bail!(
                "Entry {:?} in {} would extract outside the output folder",
                entry.name(),
                archive_path.display()
            );
        }

        let renamed = format!("{}_{}", archive_index, entry.name());
        let target = unzip_dir.join(&renamed);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut output = File::create(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            io::copy(&mut entry, &mut output)
                .with_context(|| format!("Failed to extract {}", target.display()))?;
        }

        extracted += 1;
    }

    log::info!(
        "Extracted {} entries from {}",
        extracted,
        archive_path.display()
    );

    Ok(extracted)
}

//! Zip extraction and packing
//!
//! Android archives (`.aar`, `.jar`) are plain zip files.

use crate::error::{AarsyncError, AarsyncResult};
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn open(archive: &Path) -> AarsyncResult<ZipArchive<File>> {
    let file = File::open(archive)
        .map_err(|e| AarsyncError::io(format!("opening {}", archive.display()), e))?;
    Ok(ZipArchive::new(file)?)
}

/// Names of every entry in `archive`
pub fn entry_names(archive: &Path) -> AarsyncResult<Vec<String>> {
    let zip = open(archive)?;
    Ok(zip.file_names().map(str::to_string).collect())
}

/// Extract every entry of `archive` into `dest`.
pub fn extract_all(archive: &Path, dest: &Path) -> AarsyncResult<()> {
    extract_matching(archive, dest, |_| true).map(|_| ())
}

/// Extract entries whose name satisfies `select`. Returns the extracted
/// entry names. Entries escaping `dest` are skipped.
pub fn extract_matching<F>(archive: &Path, dest: &Path, select: F) -> AarsyncResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let mut zip = open(archive)?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if !select(&name) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| AarsyncError::io(format!("creating {}", target.display()), e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| AarsyncError::io(format!("creating {}", parent.display()), e))?;
            }
            let mut out = File::create(&target)
                .map_err(|e| AarsyncError::io(format!("creating {}", target.display()), e))?;
            io::copy(&mut entry, &mut out)
                .map_err(|e| AarsyncError::io(format!("extracting {}", name), e))?;
        }
        extracted.push(name);
    }

    Ok(extracted)
}

/// Pack the contents of `source_dir` into `writer`, returning the writer.
///
/// Entries are written in sorted order with `/` separators.
pub fn pack_dir_into<W: Write + Seek>(source_dir: &Path, writer: W) -> AarsyncResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    for entry in WalkDir::new(source_dir).sort_by_file_name().min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| AarsyncError::Internal(e.to_string()))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path())
                .map_err(|e| AarsyncError::io(format!("reading {}", entry.path().display()), e))?;
            io::copy(&mut input, &mut zip)
                .map_err(|e| AarsyncError::io(format!("packing {}", entry.path().display()), e))?;
        }
    }

    Ok(zip.finish()?)
}

/// Write an archive containing only a manifest, used as a stand-in for a
/// missing class archive.
pub fn write_empty_jar(path: &Path) -> AarsyncResult<()> {
    let file = File::create(path)
        .map_err(|e| AarsyncError::io(format!("creating {}", path.display()), e))?;
    let mut zip = ZipWriter::new(file);
    zip.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())?;
    zip.write_all(b"Manifest-Version: 1.0\r\n\r\n")
        .map_err(|e| AarsyncError::io(format!("writing {}", path.display()), e))?;
    zip.finish()?;
    Ok(())
}

/// Move a directory, falling back to copy + delete across filesystems.
pub fn move_dir(from: &Path, to: &Path) -> AarsyncResult<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| AarsyncError::Internal(e.to_string()))?;
        let target: PathBuf = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| AarsyncError::io(format!("creating {}", target.display()), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| AarsyncError::io(format!("copying to {}", target.display()), e))?;
        }
    }
    fs::remove_dir_all(from)
        .map_err(|e| AarsyncError::io(format!("removing {}", from.display()), e))
}

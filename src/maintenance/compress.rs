//! Gzip an archive in place: `<archive>` becomes `<archive>.gz`

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, warn};

use super::error::{MaintenanceError, Result};
use crate::archive::compressed_path;

/// Compress `archive` and remove the original.
///
/// The original is only removed after the gzip stream has been finished
/// and synced to disk. On failure the partial `.gz` is deleted and the
/// original is left untouched. Returns `None` when the archive is already
/// gone, which happens when retention pruned it while it sat in the queue.
pub fn compress_archive(archive: &Path) -> Result<Option<PathBuf>> {
    let compress_err = |source| MaintenanceError::Compress {
        path: archive.to_path_buf(),
        source,
    };

    let input = match File::open(archive) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %archive.display(), "Archive already pruned, nothing to compress");
            return Ok(None);
        }
        Err(source) => return Err(compress_err(source)),
    };

    let target = compressed_path(archive);
    if let Err(source) = write_gzip(input, &target) {
        if let Err(e) = fs::remove_file(&target) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %target.display(), error = %e, "Cannot remove partial gzip file");
            }
        }
        return Err(compress_err(source));
    }

    fs::remove_file(archive).map_err(|source| MaintenanceError::Remove {
        path: archive.to_path_buf(),
        source,
    })?;

    debug!(path = %target.display(), "Archive compressed");
    Ok(Some(target))
}

fn write_gzip(input: File, target: &Path) -> io::Result<()> {
    let mut input = BufReader::new(input);
    let output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(target)?;

    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut input, &mut encoder)?;

    let mut writer = encoder.finish()?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

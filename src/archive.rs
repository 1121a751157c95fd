//! Archive naming
//!
//! A rotated file is renamed to `<active file name>_<timestamp>` in the
//! active file's directory, and gains [`COMPRESSED_SUFFIX`] once gzipped.
//! The timestamp is fixed width and UTC, so byte order of names is
//! creation order and retention can sort names instead of reading metadata.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// Suffix appended to an archive once it has been gzipped
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// `2024-03-09T17.04.55.012345678+0000`
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour].[minute].[second].[subsecond digits:9][offset_hour sign:mandatory][offset_minute]"
);

/// A rotated-out file as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub created_at: OffsetDateTime,
    pub compressed: bool,
}

impl ArchiveFile {
    /// Recognize `file_name` as an archive of the active file named `base_name`.
    ///
    /// Names are compared as raw bytes, so an active file whose name is not
    /// UTF-8 still finds its archives. The live active file, unrelated files
    /// sharing the prefix, and names whose timestamp does not parse are all
    /// rejected.
    pub fn parse(
        dir: &Path,
        base_name: impl AsRef<OsStr>,
        file_name: impl AsRef<OsStr>,
    ) -> Option<Self> {
        let file_name = file_name.as_ref();
        let rest = file_name
            .as_encoded_bytes()
            .strip_prefix(base_name.as_ref().as_encoded_bytes())?
            .strip_prefix(b"_")?;
        // The suffix we generate is plain ASCII
        let rest = std::str::from_utf8(rest).ok()?;
        let (stamp, compressed) = match rest.strip_suffix(COMPRESSED_SUFFIX) {
            Some(stamp) => (stamp, true),
            None => (rest, false),
        };
        let created_at = OffsetDateTime::parse(stamp, TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            path: dir.join(file_name),
            created_at,
            compressed,
        })
    }

    /// Name of the file this archive is sorted by
    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }
}

/// Directory holding the active file and its archives
pub fn archive_dir(active_path: &Path) -> PathBuf {
    match active_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Path of the gzipped form of `archive`
pub fn compressed_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Hands out archive paths for one active file.
///
/// Successive names are strictly increasing even when the clock reports the
/// same instant twice or steps backwards, so a rename never lands on an
/// existing archive.
#[derive(Debug)]
pub struct ArchiveNamer {
    active_path: PathBuf,
    last: Option<OffsetDateTime>,
}

impl ArchiveNamer {
    pub fn new(active_path: impl Into<PathBuf>) -> Self {
        Self {
            active_path: active_path.into(),
            last: None,
        }
    }

    /// Continue after the archives already on disk, so that a clock which
    /// went backwards across a restart cannot name new archives older than
    /// existing ones
    pub fn resume(active_path: impl Into<PathBuf>, existing: &[ArchiveFile]) -> Self {
        Self {
            active_path: active_path.into(),
            last: existing.iter().map(|archive| archive.created_at).max(),
        }
    }

    /// Archive path for a rotation happening at `now`
    pub fn next_path(&mut self, now: OffsetDateTime) -> Result<PathBuf, time::error::Format> {
        let mut stamp = now.to_offset(time::UtcOffset::UTC);
        if let Some(last) = self.last {
            if stamp <= last {
                stamp = last + Duration::nanoseconds(1);
            }
        }
        self.last = Some(stamp);

        let mut name = self.active_path.as_os_str().to_owned();
        name.push("_");
        name.push(stamp.format(TIMESTAMP_FORMAT)?);
        Ok(PathBuf::from(name))
    }
}

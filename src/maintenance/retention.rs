//! Retention: keep only the newest `max_files` archives of an active file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::{MaintenanceError, Result};
use crate::archive::{ArchiveFile, archive_dir};

/// Archives of `active_path` currently on disk, oldest first
pub fn list_archives(active_path: &Path) -> Result<Vec<ArchiveFile>> {
    let dir = archive_dir(active_path);
    let Some(base_name) = active_path.file_name() else {
        return Ok(Vec::new());
    };

    let list_err = |source| MaintenanceError::ListDir {
        dir: dir.clone(),
        source,
    };

    let mut archives = Vec::new();
    for entry in fs::read_dir(&dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if let Some(archive) = ArchiveFile::parse(&dir, base_name, entry.file_name()) {
            archives.push(archive);
        }
    }

    archives.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    Ok(archives)
}

/// Delete all but the `max_files` newest archives, returning what was removed
pub fn enforce(active_path: &Path, max_files: usize) -> Result<Vec<PathBuf>> {
    let archives = list_archives(active_path)?;
    let excess = archives.len().saturating_sub(max_files);
    if excess == 0 {
        return Ok(Vec::new());
    }

    let mut removed = Vec::with_capacity(excess);
    for archive in archives.into_iter().take(excess) {
        match fs::remove_file(&archive.path) {
            Ok(()) => debug!(path = %archive.path.display(), "Removed old archive"),
            // Someone else got there first; the goal is met either way
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %archive.path.display(), "Old archive already gone");
            }
            Err(source) => {
                return Err(MaintenanceError::Remove {
                    path: archive.path,
                    source,
                });
            }
        }
        removed.push(archive.path);
    }

    info!(removed = removed.len(), kept = max_files, "Retention enforced");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STAMPS: [&str; 4] = [
        "2024-03-09T17.04.55.000000001+0000",
        "2024-03-09T17.04.55.000000002+0000",
        "2024-03-09T17.04.56.000000000+0000",
        "2024-03-10T00.00.00.000000000+0000",
    ];

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    fn names(archives: &[ArchiveFile]) -> Vec<String> {
        archives
            .iter()
            .map(|a| a.file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_list_archives_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let active = dir.join("out.log");

        touch(dir, "out.log");
        touch(dir, "out.log_notes.txt");
        touch(dir, "other.log_2024-03-09T17.04.55.000000001+0000");
        touch(dir, &format!("out.log_{}.gz", STAMPS[2]));
        touch(dir, &format!("out.log_{}", STAMPS[0]));
        touch(dir, &format!("out.log_{}.gz", STAMPS[1]));

        let archives = list_archives(&active).unwrap();
        assert_eq!(
            names(&archives),
            vec![
                format!("out.log_{}", STAMPS[0]),
                format!("out.log_{}.gz", STAMPS[1]),
                format!("out.log_{}.gz", STAMPS[2]),
            ]
        );
    }

    #[test]
    fn test_enforce_removes_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let active = dir.join("out.log");

        touch(dir, "out.log");
        for stamp in STAMPS.iter().rev() {
            touch(dir, &format!("out.log_{stamp}.gz"));
        }

        let removed = enforce(&active, 2).unwrap();
        assert_eq!(
            removed,
            vec![
                dir.join(format!("out.log_{}.gz", STAMPS[0])),
                dir.join(format!("out.log_{}.gz", STAMPS[1])),
            ]
        );

        let remaining = list_archives(&active).unwrap();
        assert_eq!(
            names(&remaining),
            vec![
                format!("out.log_{}.gz", STAMPS[2]),
                format!("out.log_{}.gz", STAMPS[3]),
            ]
        );
        assert!(active.exists());
    }

    #[test]
    fn test_enforce_under_limit_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, &format!("out.log_{}", STAMPS[0]));

        assert!(enforce(&dir.join("out.log"), 5).unwrap().is_empty());
        assert_eq!(list_archives(&dir.join("out.log")).unwrap().len(), 1);
    }

    #[test]
    fn test_enforce_zero_keeps_nothing_but_active() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let active = dir.join("out.log");
        touch(dir, "out.log");
        touch(dir, &format!("out.log_{}", STAMPS[0]));
        touch(dir, &format!("out.log_{}.gz", STAMPS[1]));

        assert_eq!(enforce(&active, 0).unwrap().len(), 2);
        assert!(list_archives(&active).unwrap().is_empty());
        assert!(active.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_active_name_is_pruned() {
        use crate::archive::ArchiveNamer;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use time::macros::datetime;

        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join(OsStr::from_bytes(b"out\xff.log"));
        fs::write(&active, b"live").unwrap();

        let mut namer = ArchiveNamer::new(&active);
        let mut created = Vec::new();
        for _ in 0..5 {
            let archive = namer.next_path(datetime!(2024-03-09 17:04:55 UTC)).unwrap();
            fs::write(&archive, b"x").unwrap();
            created.push(archive);
        }

        assert_eq!(list_archives(&active).unwrap().len(), 5);
        let removed = enforce(&active, 2).unwrap();

        assert_eq!(removed, created[..3].to_vec());
        let left: Vec<_> = list_archives(&active)
            .unwrap()
            .into_iter()
            .map(|a| a.path)
            .collect();
        assert_eq!(left, created[3..].to_vec());
        assert!(active.exists());
    }

    #[test]
    fn test_undeletable_archive_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let active = dir.join("out.log");

        // A directory under an archive name cannot be removed as a file
        let blocked = dir.join(format!("out.log_{}", STAMPS[0]));
        fs::create_dir(&blocked).unwrap();
        touch(dir, &format!("out.log_{}", STAMPS[1]));

        let err = enforce(&active, 1).unwrap_err();

        assert!(matches!(err, MaintenanceError::Remove { ref path, .. } if *path == blocked));
        assert!(blocked.exists());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("gone").join("out.log");

        assert!(matches!(
            enforce(&active, 1),
            Err(MaintenanceError::ListDir { .. })
        ));
    }
}

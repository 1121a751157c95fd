use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::oneshot;

use stdin_rotate::appender::AppendError;
use stdin_rotate::config::{ByteSize, Config, OutputConfig};
use stdin_rotate::{Error, run};

fn output_config(dir: &Path, max_size: u64, max_files: usize, compress: bool) -> Config {
    Config {
        output: OutputConfig {
            path: dir.join("out.log"),
            max_size: ByteSize(max_size),
            max_files,
            compress,
            queue_capacity: 8,
        },
        ..Config::default()
    }
}

/// Archives of `out.log`, oldest first
fn archives(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("out.log_"))
        })
        .collect();
    paths.sort();
    paths
}

fn read_archive(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
    } else {
        File::open(path).unwrap().read_to_end(&mut out).unwrap();
    }
    out
}

fn never() -> std::future::Pending<io::Result<&'static str>> {
    std::future::pending()
}

#[tokio::test]
async fn test_four_line_rotation_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let config = output_config(temp_dir.path(), 10, 2, false);

    let input: &[u8] = b"aaaaa\nbbbbb\nccccc\nddddd\n";
    let snapshot = run(config, input, never()).await.unwrap();

    let archives = archives(temp_dir.path());
    assert_eq!(archives.len(), 1);
    assert_eq!(read_archive(&archives[0]), b"aaaaa\nbbbbb\n");
    assert_eq!(
        fs::read(temp_dir.path().join("out.log")).unwrap(),
        b"ccccc\nddddd\n"
    );

    assert_eq!(snapshot.lines_written, 4);
    assert_eq!(snapshot.bytes_written, 24);
    assert_eq!(snapshot.rotations, 1);
    assert_eq!(snapshot.archives_compressed, 0);
}

#[tokio::test]
async fn test_config_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config: Config = toml::from_str(&format!(
        r#"
[output]
path = "{}"
max_size = "1K"
max_files = 3
"#,
        temp_dir.path().join("out.log").display()
    ))
    .expect("Failed to parse test config");

    assert!(config.output.compress);
    assert_eq!(config.output.max_size, ByteSize(1024));

    let input = "x".repeat(300) + "\n";
    let input = input.repeat(10);
    let snapshot = run(config, input.as_bytes(), never()).await.unwrap();

    // 301 bytes per line: rotation before lines 5 and 9
    assert_eq!(snapshot.rotations, 2);
    assert_eq!(snapshot.archives_compressed, 2);
    assert!(archives(temp_dir.path()).iter().all(|p| p.extension().unwrap() == "gz"));
}

#[tokio::test]
async fn test_every_line_survives_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let config = output_config(temp_dir.path(), 64, 10_000, true);

    let lines: Vec<String> = (0..500)
        .map(|i| format!("line {i} {}", "#".repeat(i % 37)))
        .collect();
    let input = lines.join("\n") + "\n";

    let snapshot = run(config, input.as_bytes(), never()).await.unwrap();
    assert!(snapshot.rotations > 10);

    let mut stored = Vec::new();
    for archive in archives(temp_dir.path()) {
        assert!(archive.extension().is_some_and(|ext| ext == "gz"));
        stored.extend(read_archive(&archive));
    }
    stored.extend(fs::read(temp_dir.path().join("out.log")).unwrap());

    assert_eq!(stored, input.as_bytes());
}

#[tokio::test]
async fn test_retention_keeps_most_recent_archives() {
    let temp_dir = TempDir::new().unwrap();
    let config = output_config(temp_dir.path(), 1, 3, false);

    let input: String = (0..20).map(|i| format!("{i}\n")).collect();
    let snapshot = run(config, input.as_bytes(), never()).await.unwrap();

    assert_eq!(snapshot.rotations, 19);
    assert_eq!(snapshot.archives_pruned, 16);

    let survivors: Vec<Vec<u8>> = archives(temp_dir.path())
        .iter()
        .map(|p| read_archive(p))
        .collect();
    assert_eq!(
        survivors,
        vec![b"16\n".to_vec(), b"17\n".to_vec(), b"18\n".to_vec()]
    );
    assert_eq!(fs::read(temp_dir.path().join("out.log")).unwrap(), b"19\n");
}

#[tokio::test]
async fn test_crlf_and_unterminated_last_line() {
    let temp_dir = TempDir::new().unwrap();
    let config = output_config(temp_dir.path(), 1024, 2, false);

    let input: &[u8] = b"first\r\nsecond\nthird";
    run(config, input, never()).await.unwrap();

    assert_eq!(
        fs::read(temp_dir.path().join("out.log")).unwrap(),
        b"first\nsecond\nthird\n"
    );
}

#[tokio::test]
async fn test_restart_appends_to_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("out.log"), b"0123456789").unwrap();
    let config = output_config(temp_dir.path(), 10, 2, false);

    let input: &[u8] = b"next\n";
    let snapshot = run(config, input, never()).await.unwrap();

    // The existing 10 bytes already meet the threshold
    assert_eq!(snapshot.rotations, 1);
    let archives = archives(temp_dir.path());
    assert_eq!(read_archive(&archives[0]), b"0123456789");
    assert_eq!(fs::read(temp_dir.path().join("out.log")).unwrap(), b"next\n");
}

#[tokio::test]
async fn test_signal_drains_before_returning() {
    let temp_dir = TempDir::new().unwrap();
    let active = temp_dir.path().join("out.log");
    let config = output_config(temp_dir.path(), 1, 3, true);

    let (mut writer, reader) = tokio::io::duplex(1024);
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = signal_rx.await;
        Ok::<_, io::Error>("SIGTERM")
    };
    let service = tokio::spawn(run(config, BufReader::new(reader), shutdown));

    for i in 0..10 {
        writer.write_all(format!("{i}\n").as_bytes()).await.unwrap();
    }

    // Input stays open; wait until the last line has landed on disk
    tokio::time::timeout(Duration::from_secs(5), async {
        while fs::read(&active).unwrap_or_default() != b"9\n" {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("lines were not ingested");

    signal_tx.send(()).unwrap();
    let snapshot = service.await.unwrap().unwrap();

    assert_eq!(snapshot.lines_written, 10);
    assert_eq!(snapshot.rotations, 9);
    assert_eq!(snapshot.archives_pruned, 6);
    // Archives pruned while still queued are never compressed
    assert!((3..=9).contains(&snapshot.archives_compressed));

    let archives = archives(temp_dir.path());
    assert_eq!(archives.len(), 3);
    assert!(archives.iter().all(|p| p.extension().unwrap() == "gz"));
    assert_eq!(
        archives.iter().map(|p| read_archive(p)).collect::<Vec<_>>(),
        vec![b"6\n".to_vec(), b"7\n".to_vec(), b"8\n".to_vec()]
    );

    drop(writer);
}

#[tokio::test]
async fn test_unopenable_output_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = output_config(temp_dir.path(), 10, 2, false);
    config.output.path = temp_dir.path().join("missing").join("out.log");

    let input: &[u8] = b"line\n";
    let err = run(config, input, never()).await.unwrap_err();

    assert!(matches!(err, Error::Append(AppendError::Open { .. })));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = output_config(temp_dir.path(), 0, 2, false);

    let input: &[u8] = b"line\n";
    let err = run(config, input, never()).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(!temp_dir.path().join("out.log").exists());
}

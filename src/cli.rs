use clap::Parser;
use std::path::PathBuf;
use stdin_rotate::config::Overrides;
use stdin_rotate::humanize::ByteSize;

#[derive(Parser, Debug)]
#[command(name = "stdin-rotate", version)]
#[command(
    about = "Read lines from stdin and write them into size-rotated, optionally gzipped files",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Active output file; archives are created next to it
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Rotate once the active file reaches this size (e.g. 10MB, 512K)
    #[arg(long, value_name = "SIZE")]
    pub max_size: Option<ByteSize>,

    /// Number of archives to keep
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Gzip rotated archives
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub gzip: Option<bool>,

    /// Forward lines to this syslog collector (host:port, UDP)
    #[arg(long, value_name = "HOST:PORT")]
    pub syslog_target: Option<String>,

    /// Only forward lines matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub syslog_regexp: Option<String>,

    /// Syslog priority (facility * 8 + severity)
    #[arg(long, value_name = "PRI")]
    pub syslog_priority: Option<u8>,

    /// Syslog tag
    #[arg(long, value_name = "TAG")]
    pub syslog_tag: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            output_path: self.output.clone(),
            max_size: self.max_size,
            max_files: self.max_files,
            compress: self.gzip,
            forward_target: self.syslog_target.clone(),
            forward_pattern: self.syslog_regexp.clone(),
            forward_priority: self.syslog_priority,
            forward_tag: self.syslog_tag.clone(),
        }
    }
}

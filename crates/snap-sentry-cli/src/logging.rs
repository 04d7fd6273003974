use snap_sentry_core::AppConfig;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Stderr logging, plus a size-rotated log file when `config` names one.
/// Keep the returned guard alive until exit so buffered lines reach disk.
pub fn init_logger(config: Option<&AppConfig>) -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file = config.and_then(|config| {
        let path = config.log_file.as_deref().filter(|p| !p.is_empty())?;
        Some((
            path,
            RotatingFile::open(
                Path::new(path),
                config.log_max_size_kb.saturating_mul(1024),
                config.log_backups,
            ),
        ))
    });

    let (file_layer, guard, file_error) = match log_file {
        Some((_, Ok(writer))) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Some((path, Err(err))) => (None, None, Some(format!("{}: {}", path, err))),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    match file_error {
        Some(err) => warn!("File logging disabled, cannot open {}", err),
        None if guard.is_some() => info!("Tracing is configured for stderr and file logging."),
        None => info!("Tracing is configured for stderr logging."),
    }

    guard
}

/// Append-only log file that rolls over to `<path>.1` … `<path>.<backups>`
/// once it would grow past `max_bytes`. `max_bytes == 0` or `backups == 0`
/// never rolls.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for index in (1..self.backups).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                fs::rename(&src, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.backups > 0
            && self.written > 0
            && self.written + incoming as u64 > self.max_bytes
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

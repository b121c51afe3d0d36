#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use netdeploy_platform::AppPaths;

/// Append-only log file that reopens itself if the file is removed while
/// the probe runs.
struct ReopeningLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ReopeningLogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn with_file<R>(&self, write: impl FnOnce(&mut File) -> io::Result<R>) -> io::Result<R> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() || !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            *guard = Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?,
            );
        }
        match guard.as_mut() {
            Some(file) => write(file),
            None => Err(io::Error::other("log file not available")),
        }
    }
}

impl Write for ReopeningLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(Write::flush)
    }
}

/// Drops the older half of the log, cut at a line boundary.
fn trim_oversized_log(log_path: &Path, max_log_size: u64) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() <= max_log_size {
        return;
    }
    let Ok(contents) = std::fs::read(log_path) else {
        return;
    };
    let half = contents.len() / 2;
    let keep_from = contents[half..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(half, |pos| half + pos + 1);
    if let Err(error) = std::fs::write(log_path, &contents[keep_from..]) {
        eprintln!("Could not trim {}: {error}", log_path.display());
    }
}

pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("Could not create application directories: {error}");
    }
    let log_path = paths.log_file();
    trim_oversized_log(&log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("netdeploy")
        .build();

    let file_logger = ReopeningLogFile::open(log_path.clone())
        .ok()
        .map(|writer| WriteLogger::new(LevelFilter::Debug, config.clone(), writer));

    #[cfg(debug_assertions)]
    let loggers: Vec<Box<dyn simplelog::SharedLogger>> = {
        let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = Vec::new();
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
        if let Some(file_logger) = file_logger {
            loggers.push(file_logger);
        }
        loggers
    };

    #[cfg(not(debug_assertions))]
    let loggers: Vec<Box<dyn simplelog::SharedLogger>> = {
        drop(config);
        file_logger
            .map(|logger| logger as Box<dyn simplelog::SharedLogger>)
            .into_iter()
            .collect()
    };

    if !loggers.is_empty() && CombinedLogger::init(loggers).is_err() {
        eprintln!("Logger was already initialized");
    }

    set_logging_enabled(debug_enabled);
    log::debug!("Logging to {}", log_path.display());
}

pub fn set_logging_enabled(enabled: bool) {
    if enabled {
        log::set_max_level(LevelFilter::Debug);
    } else {
        log::set_max_level(LevelFilter::Warn);
    }
}

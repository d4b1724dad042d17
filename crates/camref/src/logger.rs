//! Logging to stderr, and in full to a file that is pointed out if the program fails.
use std::{env, fs::File, path::PathBuf};

use log::{info, LevelFilter, Log, Metadata, Record};

const LOG_FILE_NAME: &str = "camref.log";

struct Tee {
    loggers: Vec<env_logger::Logger>,
}

impl Log for Tee {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.loggers.iter().any(|logger| logger.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for logger in self.loggers.iter().filter(|l| l.enabled(record.metadata())) {
            logger.log(record);
        }
    }

    fn flush(&self) {
        self.loggers.iter().for_each(|l| l.flush());
    }
}

/// Prints where the full log is when dropped, unless disarmed.
pub struct Guard {
    file: Option<PathBuf>,
}

impl Guard {
    pub fn disarm(&mut self) {
        if let Some(file) = self.file.take() {
            info!("Full log stored in {file:?}");
        }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_ref() {
            eprintln!("Full log stored in {file:?}");
        }
    }
}

fn file_logger() -> Option<(env_logger::Logger, PathBuf)> {
    let path = env::temp_dir().join(LOG_FILE_NAME);
    let file = File::create(&path).ok()?;
    let logger = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .build();
    Some((logger, path))
}

/// Install the logger.
///
/// Stderr shows warnings and errors unless `RUST_LOG` says otherwise. The file log is skipped if
/// the file cannot be created.
pub fn init() -> Guard {
    let stderr_logger = env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .build();
    let mut max_level = stderr_logger.filter();
    let mut loggers = vec![stderr_logger];
    let mut file = None;
    if let Some((file_logger, path)) = file_logger() {
        max_level = max_level.max(file_logger.filter());
        loggers.push(file_logger);
        file = Some(path);
    }

    if log::set_boxed_logger(Box::new(Tee { loggers })).is_ok() {
        log::set_max_level(max_level);
    }
    Guard { file }
}

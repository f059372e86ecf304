use std::path::{Path, PathBuf};
use fern::colors::{Color, ColoredLevelConfig};

macro_rules! error_pre_log {
    ($lgr:expr,$($arg:tt)*) => (eprintln!("{}{}{}",
                                          $lgr.console_prefix(log::Level::Error),
                                          format_args!($($arg)*),
                                          $lgr.console_suffix()));
}

/// A builder of the global logger: colored console output and an
/// optional log file.
///
/// Graph construction logs a `debug!` line per level and a `trace!`
/// line per mutex decision, so file logging at `Trace` level is the
/// way to inspect how a graph was built.
#[derive(Default)]
pub struct Logger {
    app_name:   String,
    dispatcher: Option<fern::Dispatch>,
    colors:     ColoredLevelConfig,
    directory:  Option<PathBuf>,
}

impl Logger {
    pub fn new<S: AsRef<str>>(app_name: S) -> Self {
        let app_name = app_name.as_ref().to_owned();
        let dispatcher = Some(fern::Dispatch::new());
        let colors = ColoredLevelConfig::new()
            .trace(Color::Blue)
            .debug(Color::Yellow)
            .info(Color::Green)
            .warn(Color::Magenta)
            .error(Color::Red);

        Self { app_name, dispatcher, colors, directory: None }
    }

    pub fn with_console(mut self, level: log::LevelFilter) -> Self {
        let colors = self.colors;

        if let Some(dispatcher) = self.dispatcher.take() {
            self.dispatcher = Some(
                dispatcher.chain(
                    fern::Dispatch::new()
                        .format(move |out, message, record| match record.level() {
                            log::Level::Info => out.finish(format_args!("{}.", message)),
                            log::Level::Warn | log::Level::Debug => out.finish(format_args!(
                                "[{}]\t{}.",
                                colors.color(record.level()),
                                message
                            )),
                            _ => out.finish(format_args!(
                                "[{}]\t\x1B[{}m{}.\x1B[0m",
                                colors.color(record.level()),
                                colors.get_color(&record.level()).to_fg_str(),
                                message
                            )),
                        })
                        .level(level)
                        .chain(std::io::stdout()),
                ),
            );
        }

        self
    }

    /// Sets the directory of log files, creating it if necessary.
    pub fn with_explicit_directory<P: AsRef<Path>>(mut self, dirname: P) -> Self {
        let path = dirname.as_ref().to_path_buf();

        if path.is_dir() {
            self.directory = Some(path);
        } else if path.exists() {
            error_pre_log!(
                self,
                "Can't use \"{}\" as a logging directory, because it exists and isn't a directory.",
                path.display(),
            );
            self.directory = None;
        } else if let Err(err) = std::fs::create_dir(&path) {
            error_pre_log!(self, "Can't create \"{}\" directory: {}.", path.display(), err);
            self.directory = None;
        } else {
            self.directory = Some(path);
        }

        self
    }

    /// Adds a log file in the logging directory, which defaults to
    /// `log` (if it exists).
    pub fn with_file<S: AsRef<str>>(mut self, filename: S, level: log::LevelFilter) -> Self {
        if self.directory.is_none() {
            let path = PathBuf::from("log");

            if path.is_dir() {
                self.directory = Some(path);
            } else {
                error_pre_log!(
                    self,
                    "Logging to file is disabled, because directory \"log\" doesn't \
                     exist...\n\tCreate this directory or run '{} --log-dir <LOG_DIR> ...'.",
                    self.app_name
                );
            }
        }

        if let Some(ref dir) = self.directory {
            let path = dir.join(filename.as_ref());

            match std::fs::OpenOptions::new().write(true).create(true).truncate(true).open(&path) {
                Ok(log_file) => {
                    if let Some(dispatcher) = self.dispatcher.take() {
                        self.dispatcher = Some(
                            dispatcher.chain(
                                fern::Dispatch::new()
                                    .format(move |out, message, record| {
                                        out.finish(format_args!(
                                            "[{}][{}] {}.",
                                            record.target(),
                                            record.level(),
                                            message,
                                        ))
                                    })
                                    .level(level)
                                    .chain(log_file),
                            ),
                        );
                    }
                }
                Err(err) => {
                    error_pre_log!(self, "Can't open \"{}\": {}.", path.display(), err);
                }
            }
        }

        self
    }

    pub fn get_directory(&self) -> Option<&PathBuf> {
        self.directory.as_ref()
    }

    pub fn apply(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.apply().unwrap_or_else(|err| error_pre_log!(self, "{}.", err));
        } else {
            error_pre_log!(self, "Logger can't be applied (probably it has already been applied).");
        }
    }

    fn console_prefix(&self, level: log::Level) -> String {
        format!("[{}]\t\x1B[{}m", self.colors.color(level), self.colors.get_color(&level).to_fg_str())
    }

    fn console_suffix(&self) -> &str {
        "\x1B[0m"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory() {
        let dir = std::env::temp_dir().join(format!("plangraph-log-{}", std::process::id()));
        let logger = Logger::new("test").with_explicit_directory(&dir);
        assert_eq!(logger.get_directory(), Some(&dir));
        assert!(dir.is_dir());

        let logger = logger.with_file("test.log", log::LevelFilter::Debug);
        assert!(dir.join("test.log").is_file());
        drop(logger);

        let file = dir.join("test.log");
        let logger = Logger::new("test").with_explicit_directory(&file);
        assert_eq!(logger.get_directory(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Process-wide tracing setup.
//!
//! Events go to stdout through a local-time formatter and, once
//! [`enable_file_logging`] has been called, to a log file as well. The level
//! filter can be swapped at runtime with [`set_log_level`].

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

struct LocalTimeFormat;

impl<S, N> FormatEvent<S, N> for LocalTimeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if ansi {
            let colour = match *meta.level() {
                Level::ERROR => "1;31",
                Level::WARN => "1;33",
                Level::INFO => "1;32",
                Level::DEBUG => "1;34",
                Level::TRACE => "1;35",
            };
            write!(writer, "\x1b[2m{timestamp}\x1b[0m \x1b[{colour}m{:>5}\x1b[0m ", meta.level())?;
        } else {
            write!(writer, "{timestamp} {:>5} ", meta.level())?;
        }

        write!(writer, "{}: ", meta.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

type SharedFile = Arc<Mutex<Option<File>>>;

fn lock(file: &SharedFile) -> MutexGuard<'_, Option<File>> {
    file.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer that discards output until a file is attached.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(lock(&self.0))
    }
}

type ReloadLevel = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

static RELOAD_LEVEL: OnceLock<ReloadLevel> = OnceLock::new();
static LOG_FILE: OnceLock<SharedFile> = OnceLock::new();

/// `RUST_LOG` wins over `default_level`; an unparsable level falls back to
/// `info`.
fn initial_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(default_level: &str) {
    let file: SharedFile = Arc::new(Mutex::new(None));
    let (filter, handle) = reload::Layer::new(initial_filter(default_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalTimeFormat)
        .with_ansi(io::stdout().is_terminal());

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalTimeFormat)
        .with_ansi(false)
        .with_writer(LogFile(file.clone()));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        let _ = LOG_FILE.set(file);
        let _ = RELOAD_LEVEL.set(Box::new(move |level: &str| {
            let filter = EnvFilter::try_new(level)
                .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;
            handle
                .reload(filter)
                .map_err(|e| anyhow!("filter reload failed: {e}"))
        }));
    }
}

/// Replaces the active filter. Accepts a bare level or any `EnvFilter`
/// directive.
pub fn set_log_level(level: &str) -> Result<()> {
    match RELOAD_LEVEL.get() {
        Some(reload) => reload(level),
        None => bail!("logging not yet initialized"),
    }
}

/// Appends log output to `path`, replacing any previous log file. The
/// directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let opened = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    match LOG_FILE.get() {
        Some(file) => {
            *lock(file) = Some(opened);
            Ok(())
        }
        None => bail!("logging not yet initialized"),
    }
}

pub fn disable_file_logging() {
    if let Some(file) = LOG_FILE.get() {
        *lock(file) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_default_level_falls_back_without_panicking() {
        let _ = initial_filter("definitely=not=a=level");
    }

    #[test]
    fn file_writer_discards_until_attached() {
        let file: SharedFile = Arc::new(Mutex::new(None));
        let slot = LogFile(file);

        let mut writer = slot.make_writer();

        assert_eq!(writer.write(b"dropped").unwrap(), 7);
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn logging_round_trip() {
        init_logging("info");

        // Skipped when something else already installed a global subscriber.
        if RELOAD_LEVEL.get().is_some() {
            assert!(set_log_level("debug").is_ok());

            let path = std::env::temp_dir().join(format!("rent-app-log-{}.log", std::process::id()));
            enable_file_logging(&path).unwrap();
            tracing::info!("written to file");
            disable_file_logging();

            let contents = std::fs::read_to_string(&path).unwrap();
            assert!(contents.contains("written to file"));
            let _ = std::fs::remove_file(&path);
        }
    }
}

//! Tracing subscriber: gulp-style console output plus a plain log file.
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};

use super::types::{DRY_RUN_TARGET, STAGE_TARGET};
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Collects an event's `message` field.
#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.clear();
            let _ = write!(self.0, "{value:?}");
        }
    }
}

impl Message {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut message = Self::default();
        event.record(&mut message);
        message
    }
}

/// Appends every event, without colors, to a per-command log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Layer writing to the default log file for `command`.
    pub(super) fn new(command: &str) -> Option<Self> {
        Self::at(&log_file_path(command)?)
    }

    /// Start `path` afresh with a header naming the gsdl version.
    pub(super) fn at(path: &Path) -> Option<Self> {
        let version = option_env!("GSDL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        fs::write(
            path,
            format!("# gsdl {version}, started {} UTC\n", format_utc_datetime()),
        )
        .ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

fn file_line(level: Level, target: &str, msg: &str) -> String {
    let tag = match (level, target) {
        (Level::INFO, STAGE_TARGET) => return format!("==> {msg}"),
        (Level::INFO, DRY_RUN_TARGET) => "[dry run] ",
        (Level::ERROR, _) => "[error] ",
        (Level::WARN, _) => "[warn] ",
        (Level::DEBUG | Level::TRACE, _) => "[debug] ",
        _ => "",
    };
    format!("    {tag}{msg}")
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        let msg = strip_ansi(&Message::of(event).0);
        let line = file_line(*meta.level(), meta.target(), &msg);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "[{}] {line}", format_utc_time());
        }
    }
}

/// Console lines in the gulp manner: a dimmed `[HH:MM:SS]` prefix, task
/// headers in cyan, warnings and errors colored.
struct GulpFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for GulpFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let msg = Message::of(event).0;
        write!(writer, "[\x1b[90m{}\x1b[0m] ", format_utc_time())?;
        match (*meta.level(), meta.target()) {
            (Level::ERROR, _) => writeln!(writer, "\x1b[31m{msg}\x1b[0m"),
            (Level::WARN, _) => writeln!(writer, "\x1b[33m{msg}\x1b[0m"),
            (Level::INFO, STAGE_TARGET) => writeln!(writer, "\x1b[36m{msg}\x1b[0m"),
            (Level::INFO, DRY_RUN_TARGET) => writeln!(writer, "\x1b[35m[dry run]\x1b[0m {msg}"),
            (Level::INFO, _) => writeln!(writer, "{msg}"),
            _ => writeln!(writer, "\x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber. Call once, before any logging.
///
/// The console shows `info` and up (`debug` with `verbose`), warnings and
/// errors on stderr. The log file for `command` gets everything from
/// `debug` up.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(GulpFormat)
                .with_writer(writer)
                .with_filter(console_level),
        )
        .with(FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG)))
        .init();
}

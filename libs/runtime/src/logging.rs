//! Tracing setup: a human-readable console sink plus optional rotating JSON files.
//!
//! Every key in [`LoggingConfig`] other than `default` names a target prefix
//! (`students`, `api_ingress`, `sea_orm::driver`); the longest matching prefix
//! decides the level and file for a record.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::FilterFn, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::config::{LoggingConfig, Section};

const FALLBACK_SIZE_MB: u64 = 100;
const FALLBACK_RETENTION_DAYS: u32 = 7;

/// Unknown names log at info; `off`/`none` silence the sink.
fn level_of(name: &str) -> Option<Level> {
    Some(match name.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => return None,
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    })
}

/// `students` covers `students` and `students::*`, but not `students_extra`.
fn covers(prefix: &str, target: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Ordered `(prefix, value)` pairs with a catch-all.
#[derive(Clone, Debug)]
struct Routes<T> {
    fallback: T,
    prefixed: Vec<(String, T)>,
}

impl<T: Clone> Routes<T> {
    fn pick(&self, target: &str) -> &T {
        self.prefixed
            .iter()
            .filter(|(prefix, _)| covers(prefix, target))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(&self.fallback, |(_, v)| v)
    }
}

impl Routes<Option<Level>> {
    fn allows(&self, meta: &Metadata<'_>) -> bool {
        matches!(self.pick(meta.target()), Some(max) if meta.level() <= max)
    }
}

#[derive(Clone)]
struct SharedFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl SharedFile {
    fn with<R>(
        &self,
        f: impl FnOnce(&mut FileRotate<AppendTimestamp>) -> io::Result<R>,
    ) -> io::Result<R> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        f(&mut guard)
    }
}

/// Writer handed to the fmt layer; `None` discards output.
struct FileSlot(Option<SharedFile>);

impl Write for FileSlot {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.0 {
            Some(file) => file.with(|f| f.write(buf)),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.0 {
            Some(file) => file.with(|f| f.flush()),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for Routes<Option<SharedFile>> {
    type Writer = FileSlot;

    fn make_writer(&'a self) -> FileSlot {
        FileSlot(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> FileSlot {
        FileSlot(self.pick(meta.target()).clone())
    }
}

fn log_path(file: &str, home: &Path) -> PathBuf {
    crate::paths::absolutize(Path::new(file), home)
}

/// `max_backups` wins; otherwise rotated files expire after `max_age_days`.
fn retention(section: &Section) -> FileLimit {
    if let Some(count) = section.max_backups {
        return FileLimit::MaxFiles(count.max(1));
    }
    let days = section.max_age_days.unwrap_or(FALLBACK_RETENTION_DAYS);
    FileLimit::Age(chrono::Duration::days(days.into()))
}

fn open_rotating(path: &Path, max_bytes: usize, limit: FileLimit) -> io::Result<SharedFile> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = FileRotate::new(
        path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(SharedFile(Arc::new(Mutex::new(file))))
}

fn open_section_file(name: &str, section: &Section, home: &Path) -> Option<SharedFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = log_path(&section.file, home);
    let max_bytes = section.max_size_mb.unwrap_or(FALLBACK_SIZE_MB) * 1024 * 1024;
    open_rotating(&path, max_bytes as usize, retention(section))
        .map_err(|e| {
            // No subscriber yet.
            eprintln!("logging: cannot open {} for '{name}': {e}", path.display());
        })
        .ok()
}

struct Sinks {
    console: Routes<Option<Level>>,
    file_levels: Routes<Option<Level>>,
    files: Routes<Option<SharedFile>>,
}

impl Sinks {
    fn has_files(&self) -> bool {
        self.files.fallback.is_some() || !self.files.prefixed.is_empty()
    }
}

fn plan(cfg: &LoggingConfig, home: &Path) -> Sinks {
    let base = cfg.get("default");
    let mut named: Vec<_> = cfg.iter().filter(|(k, _)| *k != "default").collect();
    named.sort_by(|a, b| a.0.cmp(b.0));

    let default_file = base.and_then(|s| open_section_file("default", s, home));
    let mut console = Routes {
        fallback: base.and_then(|s| level_of(&s.console_level)),
        prefixed: Vec::new(),
    };
    let mut file_levels = Routes {
        fallback: base
            .filter(|_| default_file.is_some())
            .and_then(|s| level_of(&s.file_level)),
        prefixed: Vec::new(),
    };
    let mut files = Routes {
        fallback: default_file,
        prefixed: Vec::new(),
    };

    for (name, section) in named {
        console
            .prefixed
            .push((name.clone(), level_of(&section.console_level)));
        // A subsystem without its own file is kept out of the default file too.
        let own = open_section_file(name, section, home);
        let level = own.as_ref().and_then(|_| level_of(&section.file_level));
        file_levels.prefixed.push((name.clone(), level));
        if own.is_some() {
            files.prefixed.push((name.clone(), own));
        }
    }

    Sinks {
        console,
        file_levels,
        files,
    }
}

fn level_filter(routes: Routes<Option<Level>>) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &Metadata<'_>| routes.allows(meta))
}

/// Install the global subscriber; relative file paths resolve against `base_dir`.
///
/// Safe to call more than once, later calls are ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // `log` records from sqlx and friends go through tracing.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let sinks = plan(cfg, base_dir);
    let has_files = sinks.has_files();
    let console = fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(level_filter(sinks.console));

    let json = has_files.then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(sinks.files)
            .with_filter(level_filter(sinks.file_levels))
    });

    let _ = Registry::default().with(console).with(json).try_init();
}

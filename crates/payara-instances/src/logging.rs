//! Tracing setup for the host binary.

use std::path::{Path, PathBuf};

use env_flags::env_flags;
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingCfg, expand_home};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Json,
    Compact,
    Pretty,
    Full,
}

impl Style {
    /// JSON wins over compact, compact over pretty.
    pub fn select(json: bool, compact: bool, pretty: bool) -> Self {
        if json {
            Style::Json
        } else if compact {
            Style::Compact
        } else if pretty {
            Style::Pretty
        } else {
            Style::Full
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub filter: String,
    pub style: Style,
    pub to_file: Option<PathBuf>,
}

impl LogSettings {
    /// Environment flags win; the `[logging]` section fills in what the
    /// environment leaves unset.
    pub fn resolve(home: &Path, cfg: Option<&LoggingCfg>) -> Self {
        env_flags! {
            /// Tracing filter, e.g. "info", "debug", or targets format.
            RUST_LOG: &str = "info";
            /// JSON formatting for logs
            TRACING_JSON: bool = false;
            /// Compact single-line formatting (ignored if TRACING_JSON=true)
            TRACING_COMPACT: bool = true;
            /// Pretty formatting (ignored if JSON or compact)
            TRACING_PRETTY: bool = false;
            /// Also log to a daily file under LOG_DIR or <PAYARA_HOME>/logs
            LOG_TO_FILE: bool = false;
            /// Explicit log directory
            LOG_DIR: &str = "";
        }

        let env_set = |k: &str| std::env::var_os(k).is_some();
        let pick = |key: &str, env: bool, file: Option<bool>| match file {
            Some(v) if !env_set(key) => v,
            _ => env,
        };

        let filter = match cfg.and_then(|c| c.level.clone()) {
            Some(level) if !env_set("RUST_LOG") => level,
            _ => (*RUST_LOG).to_string(),
        };
        let style = Style::select(
            pick("TRACING_JSON", *TRACING_JSON, cfg.and_then(|c| c.json)),
            pick("TRACING_COMPACT", *TRACING_COMPACT, cfg.and_then(|c| c.compact)),
            pick("TRACING_PRETTY", *TRACING_PRETTY, cfg.and_then(|c| c.pretty)),
        );
        let to_file = pick("LOG_TO_FILE", *LOG_TO_FILE, cfg.and_then(|c| c.to_file));
        let dir = if !(*LOG_DIR).is_empty() {
            PathBuf::from((*LOG_DIR).to_string())
        } else if let Some(d) = cfg.and_then(|c| c.dir.as_deref()) {
            expand_home(d)
        } else {
            home.join("logs")
        };

        LogSettings {
            filter,
            style,
            to_file: to_file.then_some(dir),
        }
    }
}

fn fmt_layer<S, W>(style: Style, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        Style::Json => base.json().boxed(),
        Style::Compact => base.compact().boxed(),
        Style::Pretty => base.pretty().boxed(),
        Style::Full => base.boxed(),
    }
}

/// Install the global subscriber. Logs always go to stderr so stdout stays
/// clean for command output.
pub fn init_tracing(settings: &LogSettings) {
    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt_layer(settings.style, std::io::stderr, true);

    let mut dir_error = None;
    let file_layer = match settings.to_file.as_ref() {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "payara-instances.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                Some(fmt_layer(settings.style, nb, false))
            }
            Err(e) => {
                dir_error = Some((dir.clone(), e));
                None
            }
        },
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);
    if let Err(e) = subscriber.try_init() {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

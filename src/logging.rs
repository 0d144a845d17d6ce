// Verbosity levels mapped onto tracing filters
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// 0 = warnings only, 1 = info, 2 = debug, 3+ = trace.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` wins when set; otherwise the verbosity level applies to this
/// crate and dependencies stay at `warn`.
pub fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,spacetraders_sync={}", level_for(verbosity)))
    })
}

/// Handle on the installed filter, so the config file can raise the level
/// after logging is already running.
pub struct LogHandle {
    filter: Option<reload::Handle<EnvFilter, Registry>>,
    verbosity: u8,
}

impl LogHandle {
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Raises the level to `verbosity`; a lower value leaves it alone.
    pub fn widen(&mut self, verbosity: u8) {
        if verbosity <= self.verbosity {
            return;
        }
        self.verbosity = verbosity;
        if let Some(filter) = &self.filter {
            if let Err(e) = filter.reload(filter_for(verbosity)) {
                warn!(error = %e, "could not widen log filter");
            }
        }
    }
}

/// Installs the global subscriber. When one is already installed the
/// returned handle only tracks the level.
pub fn init(verbosity: u8) -> LogHandle {
    let (filter, handle) = reload::Layer::new(filter_for(verbosity));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok();

    LogHandle {
        filter: installed.then_some(handle),
        verbosity,
    }
}

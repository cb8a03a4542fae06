//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem before configuration is read
//! - Apply the configured log level once configuration is known
//! - `RUST_LOG`, when set, wins over the configured level
//!
//! # Design Decisions
//! - The filter sits behind a reload layer so startup diagnostics are never
//!   dropped while the configured level is still unknown

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::ObservabilityConfig;

/// Level used until configuration has been loaded.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("prefix_router={level},tower_http={level}")
}

/// Handle to the installed subscriber's filter.
pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl Logging {
    /// Switch to the configured log level. No-op when `RUST_LOG` chose the filter.
    pub fn apply(&self, config: &ObservabilityConfig) -> Result<(), reload::Error> {
        if self.from_env {
            return Ok(());
        }
        self.filter.reload(EnvFilter::new(default_filter(&config.log_level)))
    }
}

fn subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, reload::Handle<EnvFilter, Registry>)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));
    (subscriber, handle)
}

/// Install the global tracing subscriber.
///
/// Call before loading configuration, then [`Logging::apply`] the loaded settings.
pub fn init_logging() -> Logging {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_filter(DEFAULT_LOG_LEVEL)), false),
    };
    let (subscriber, handle) = subscriber(filter, std::io::stdout);
    subscriber.init();
    Logging {
        filter: handle,
        from_env,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config_with_overrides;
    use crate::config::MappingTable;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn filter_uses_configured_level() {
        assert_eq!(default_filter("debug"), "prefix_router=debug,tower_http=debug");
    }

    #[test]
    fn bad_mapping_table_is_logged_during_startup() {
        let captured = Captured::default();
        let (subscriber, handle) =
            subscriber(EnvFilter::new(default_filter(DEFAULT_LOG_LEVEL)), captured.clone());
        let logging = Logging {
            filter: handle,
            from_env: false,
        };

        tracing::subscriber::with_default(subscriber, || {
            let config = load_config_with_overrides(None, Some("{not json")).unwrap();
            assert_eq!(config.mappings, MappingTable::builtin());

            let quiet = ObservabilityConfig {
                log_level: "error".into(),
                ..ObservabilityConfig::default()
            };
            logging.apply(&quiet).unwrap();
            tracing::warn!("below configured level");
        });

        let output = captured.contents();
        assert!(output.contains("Invalid MAPPING_TABLE, using built-in mapping table"), "{output}");
        assert!(!output.contains("below configured level"), "{output}");
    }

    #[test]
    fn rust_log_filter_is_not_replaced() {
        let (_subscriber, handle) = subscriber(EnvFilter::new("warn"), Captured::default());
        let logging = Logging {
            filter: handle,
            from_env: true,
        };
        logging.apply(&ObservabilityConfig::default()).unwrap();

        let current = logging.filter.with_current(|f| f.to_string()).unwrap();
        assert_eq!(current, "warn");
    }
}

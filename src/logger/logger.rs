use crate::settings;
use anyhow::{Result, anyhow};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const BOOTSTRAP_FILTER: &str = "info";

pub struct Logger {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl Logger {
    /// Installs the global subscriber. `RUST_LOG` wins over the bootstrap
    /// filter until settings are loaded.
    pub fn new_bootstrap() -> Self {
        let initial = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_FILTER));
        let (layer, filter) = reload::Layer::new(initial);

        tracing_subscriber::registry()
            .with(layer)
            .with(fmt::layer().with_target(false))
            .init();

        Self { filter }
    }

    /// Swaps in `log.filter`; an unparsable directive leaves the old filter active.
    pub fn apply(&self, log: &settings::Log) -> Result<()> {
        let directives = EnvFilter::try_new(&log.filter)
            .map_err(|e| anyhow!("log.filter {:?}: {}", log.filter, e))?;
        self.filter.reload(directives).map_err(|e| anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_refused() {
        let logger = Logger::new_bootstrap();

        let good = settings::Log {
            filter: "rotator=debug,warp=info".to_string(),
        };
        assert!(logger.apply(&good).is_ok());

        let bad = settings::Log {
            filter: "rotator=loud".to_string(),
        };
        let err = logger.apply(&bad).unwrap_err();
        assert!(err.to_string().contains("rotator=loud"));
    }
}

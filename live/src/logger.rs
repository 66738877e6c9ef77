use env_logger::{Builder, Env};

/// Logs to stderr, filtered by `RUST_LOG` (like `model=debug,info`). The default is `info`.
pub fn setup() {
    builder(Env::default().default_filter_or("info")).init();
}

fn builder(env: Env) -> Builder {
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();
    builder
}

#[cfg(test)]
mod tests {
    use log::{Level, Log, Metadata};

    use super::*;

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn per_crate_filters() {
        let logger = builder(Env::new().filter("LIVE_TEST_UNSET_VAR"))
            .parse_filters("model=debug,info")
            .build();
        assert!(enabled(&logger, "model::ingest", Level::Debug));
        assert!(!enabled(&logger, "gtfs_rt", Level::Debug));
        assert!(enabled(&logger, "gtfs_rt", Level::Info));
        assert!(!enabled(&logger, "model", Level::Trace));
    }
}

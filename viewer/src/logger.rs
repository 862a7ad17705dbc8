use log::LevelFilter;

fn level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Installs the stderr logger. `RUST_LOG` overrides the level picked by the flags.
pub fn init(verbose: u8, quiet: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(level(verbose, quiet))
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pick_the_level() {
        assert_eq!(level(0, false), LevelFilter::Warn);
        assert_eq!(level(2, false), LevelFilter::Debug);
        assert_eq!(level(9, false), LevelFilter::Trace);
        assert_eq!(level(3, true), LevelFilter::Error);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(0, true);
        init(2, false);
        log::error!("still logging");
    }
}

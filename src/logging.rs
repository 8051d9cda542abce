use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "school_disruption=info";

/// Install the stderr subscriber. `RUST_LOG` overrides the default filter.
///
/// Stdout stays reserved for report output.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "school_disruption=debug"
        } else {
            DEFAULT_DIRECTIVE
        })
    });

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Module targets raised to `debug` by `--debug`.
const OWN_TARGETS: &[&str] = &[
    "payouts",
    "payouts_core",
    "payouts_chain",
    "payouts_reports",
];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies. Logs go to stderr so
/// stdout carries only command output.
pub fn init(level: &str, debug: bool) -> anyhow::Result<()> {
    let filter = build_filter(level, debug)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn build_filter(level: &str, debug: bool) -> anyhow::Result<EnvFilter> {
    let mut filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };
    if debug {
        for target in OWN_TARGETS {
            filter = filter.add_directive(format!("{target}=debug").parse()?);
        }
    }
    Ok(filter)
}

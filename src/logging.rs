use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Diagnostics go to stderr and only with `--verbose`; stdout carries the
/// run report.
pub fn init(verbose: bool) -> Result<()> {
    if !verbose {
        return Ok(());
    }
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .with_level(true)
        .try_init();
    Ok(())
}

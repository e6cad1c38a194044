use crate::client::MemcachedStats;
use crate::config::Config;
use crate::error::Result;
use crate::filter::collect_sizes;
use crate::report::Report;

/// Connect, dump every key and build the size report for the keys that match.
///
/// Every failure aborts the run; there is no partial report.
pub async fn run(config: &Config) -> Result<Report> {
    tracing::info!(patterns = ?config.patterns.as_strs(), "Loaded patterns");
    tracing::info!(host = %config.host, port = config.port, "Connecting");
    let mut stats =
        MemcachedStats::connect(&config.host, config.port, config.connect_timeout).await?;

    let slabs = stats.slab_ids().await?.len();

    // `stats cachedump` limits per slab, so fetch everything and apply
    // `config.limit` to the matches instead.
    tracing::info!(addr = stats.addr(), "Collecting data for ALL keys");
    let details = stats.key_details(0).await?;

    if config.limit == 0 {
        tracing::info!(keys = details.len(), "Looking for ALL keys matching the supplied patterns");
    } else {
        tracing::info!(
            keys = details.len(),
            limit = config.limit,
            "Looking for a limited number of keys matching the supplied patterns"
        );
    }
    let sizes = collect_sizes(&details, &config.patterns, config.limit, config.verbose)?;

    Report::new(slabs, sizes)
}

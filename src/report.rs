use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::percentile::percentile_of_sorted;

/// Size distribution of the matched objects, in bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeStats {
    pub smallest: u64,
    pub largest: u64,
    /// Arithmetic mean.
    pub average: f64,
    /// 50th percentile. Older versions of this tool labelled it "Mean".
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub slabs: usize,
    pub matched: usize,
    pub total_bytes: u64,
    /// Absent when nothing matched.
    pub stats: Option<SizeStats>,
}

impl Report {
    /// Build the report from the sizes collected by the key filter.
    ///
    /// `sizes` is consumed and sorted once; every statistic is computed from
    /// the same values.
    pub fn new(slabs: usize, mut sizes: Vec<u64>) -> Result<Self> {
        let matched = sizes.len();
        let total_bytes: u64 = sizes.iter().sum();

        let stats = if sizes.is_empty() {
            None
        } else {
            sizes.sort_unstable();
            Some(SizeStats {
                smallest: sizes[0],
                largest: sizes[matched - 1],
                average: total_bytes as f64 / matched as f64,
                p50: percentile_of_sorted(&sizes, 50.0)?,
                p90: percentile_of_sorted(&sizes, 90.0)?,
                p95: percentile_of_sorted(&sizes, 95.0)?,
                p99: percentile_of_sorted(&sizes, 99.0)?,
            })
        };

        Ok(Self {
            slabs,
            matched,
            total_bytes,
            stats,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of slabs: {}", self.slabs)?;
        writeln!(
            f,
            "Total number of matched objects in the cache: {}",
            self.matched
        )?;
        writeln!(
            f,
            "Total size of all matched objects in the cache (in bytes): {}",
            self.total_bytes
        )?;

        if let Some(stats) = &self.stats {
            writeln!(f, "Size statistics for the matched results (in bytes):")?;
            writeln!(f, "  Smallest:\t\t{}", stats.smallest)?;
            writeln!(f, "  Largest:\t\t{}", stats.largest)?;
            writeln!(f, "  Average:\t\t{:.2}", stats.average)?;
            writeln!(f, "  50th percentile:\t{:.2}", stats.p50)?;
            writeln!(f, "  90th percentile:\t{:.2}", stats.p90)?;
            writeln!(f, "  95th percentile:\t{:.2}", stats.p95)?;
            writeln!(f, "  99th percentile:\t{:.2}", stats.p99)?;
        }
        Ok(())
    }
}

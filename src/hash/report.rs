// Report aggregation module
// Sorts checksum results by path and derives the hash of hashes

use super::hash::HashComputer;
use super::pipeline::ChecksumResult;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Separator between the two columns of a report line
pub const COLUMN_SEPARATOR: &str = "   ";

/// Label printed after the aggregate digest
pub const SUMMARY_LABEL: &str = "[hash of hashes; checksum of above]";

/// Which column comes first on each line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrder {
    #[default]
    DigestFirst,
    PathFirst,
}

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// Paths handed to the pipeline
    pub files_total: usize,
    pub files_hashed: usize,
    pub files_failed: usize,
    pub bytes_hashed: u64,
    pub duration: Duration,
}

impl ScanStats {
    /// Throughput in MiB per second, zero for an instant run
    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.bytes_hashed as f64 / 1_048_576.0) / secs
        } else {
            0.0
        }
    }
}

/// Sorted results plus the optional aggregate digest
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub results: Vec<ChecksumResult>,
    /// Present only when more than one file was summed
    pub aggregate: Option<String>,
    pub stats: ScanStats,
}

impl Report {
    /// Sort results by path and compute the hash of hashes
    ///
    /// Paths compare as plain byte strings, so the order does not depend on the
    /// order in which workers finished.
    pub fn from_results(mut results: Vec<ChecksumResult>, computer: &HashComputer) -> Self {
        results.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        let aggregate = hash_of_hashes(&results, computer);
        Self {
            results,
            aggregate,
            stats: ScanStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: ScanStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Digest recorded for `path`, if it is in the report
    pub fn digest_of(&self, path: &Path) -> Option<&str> {
        self.results
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.digest.as_str())
    }

    /// Render the report as lines of text
    pub fn lines(&self, order: ColumnOrder) -> Vec<String> {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .map(|r| format_line(&r.path, &r.digest, order))
            .collect();
        if let Some(aggregate) = &self.aggregate {
            lines.push(format!("{}{}{}", aggregate, COLUMN_SEPARATOR, SUMMARY_LABEL));
        }
        lines
    }

    /// Write one line per file, then the summary line when there is one
    pub fn write_to<W: Write>(&self, writer: &mut W, order: ColumnOrder) -> io::Result<()> {
        for line in self.lines(order) {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }
}

/// Format a single report line
pub fn format_line(path: &Path, digest: &str, order: ColumnOrder) -> String {
    match order {
        ColumnOrder::DigestFirst => format!("{}{}{}", digest, COLUMN_SEPARATOR, path.display()),
        ColumnOrder::PathFirst => format!("{}{}{}", path.display(), COLUMN_SEPARATOR, digest),
    }
}

/// Digest over every result's display string, in the order given
///
/// Returns `None` for zero or one result: an aggregate of a single digest says
/// nothing the digest does not.
pub fn hash_of_hashes(sorted: &[ChecksumResult], computer: &HashComputer) -> Option<String> {
    if sorted.len() < 2 {
        return None;
    }
    let mut hasher = computer.new_hasher();
    for result in sorted {
        hasher.update(result.digest.as_bytes());
    }
    Some(computer.encode(&hasher.finalize()))
}

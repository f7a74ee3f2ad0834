//! All stat collecting functionality: the [StatType] messages sent to the [Controller](crate::controller::Controller), the [StatsCollector](stats_collector::StatsCollector) that aggregates them, and the final report.

pub mod err_printer;
pub(crate) mod stat_format_utils;
pub mod stats_collector;
pub mod stats_report;

use crate::util::*;

#[derive(Debug, Clone, PartialEq)]
/// Possible stats that can be sent to the Controller.
pub enum StatType {
    /// Fatal error, stop processing.
    Fatal(Box<str>),
    /// Non-fatal error, reported but processing continues.
    Error(Box<str>),
    /// Record the capture format version detected.
    FormatVersion(u8),
    /// A cycle was processed, with the tally of its frames.
    CycleSeen(CycleStats),
    /// Verdict of a counter consensus for one cycle.
    Consensus(CounterKind, Verdict),
    /// Run totals per readout position, sent once at the end of the analysis.
    PositionSummary(PositionSummary),
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Fatal(e) => write!(f, "Fatal error: {e}"),
            StatType::Error(e) => write!(f, "Error: {e}"),
            StatType::FormatVersion(v) => write!(f, "Capture format version: {v}"),
            StatType::CycleSeen(cycle) => write!(
                f,
                "Cycle seen with {frames} frames, {valid} valid",
                frames = cycle.frames,
                valid = cycle.valid
            ),
            StatType::Consensus(kind, verdict) => write!(f, "{kind} consensus: {verdict:?}"),
            StatType::PositionSummary(summary) => write!(
                f,
                "{seen} positions seen, {errors} with errors",
                seen = summary.positions_seen,
                errors = summary.positions_with_errors
            ),
        }
    }
}

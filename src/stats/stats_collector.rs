//! Contains the [StatsCollector] that collects stats from analysis.
pub mod error_stats;
pub mod frame_stats;

use crate::util::*;
use error_stats::ErrorStats;
use frame_stats::{ConsensusStats, FrameStats};

/// Collects stats from analysis.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCollector {
    is_finalized: bool,
    format_version: Option<u8>,
    frame_stats: FrameStats,
    ec_consensus: ConsensusStats,
    bc_consensus: ConsensusStats,
    positions: Option<PositionSummary>,
    error_stats: ErrorStats,
}

impl StatsCollector {
    /// Record a stat.
    pub fn collect(&mut self, stat: StatType) {
        match stat {
            StatType::Fatal(m) => self.error_stats.add_fatal_err(m),
            StatType::Error(m) => self.error_stats.add_err(m),
            StatType::FormatVersion(v) => self.format_version = Some(v),
            StatType::CycleSeen(cycle) => self.frame_stats.record_cycle(&cycle),
            StatType::Consensus(CounterKind::Ec, verdict) => self.ec_consensus.record(&verdict),
            StatType::Consensus(CounterKind::Bc, verdict) => self.bc_consensus.record(&verdict),
            StatType::PositionSummary(summary) => self.positions = Some(summary),
        }
    }

    /// Finalize stats collection. Meaning no more stats can be collected.
    ///
    /// Does post-processing on the stats collected which assumes that no more stats are collected.
    /// Does nothing if already finalized.
    pub fn finalize(&mut self, mute_errors: bool) {
        if self.is_finalized {
            return;
        }
        self.error_stats.finalize_stats(mute_errors);
        self.is_finalized = true;
    }

    /// Returns the capture format version if the header was read.
    pub fn format_version(&self) -> Option<u8> {
        self.format_version
    }

    /// Returns a reference to the [FrameStats].
    pub fn frame_stats(&self) -> &FrameStats {
        &self.frame_stats
    }

    /// Returns the number of cycles seen.
    pub fn cycles_seen(&self) -> u64 {
        self.frame_stats.cycles_seen()
    }

    /// Returns the verdict tally of a counter kind.
    pub fn consensus_stats(&self, kind: CounterKind) -> &ConsensusStats {
        match kind {
            CounterKind::Ec => &self.ec_consensus,
            CounterKind::Bc => &self.bc_consensus,
        }
    }

    /// Returns the position summary, if the analysis sent one.
    pub fn position_summary(&self) -> Option<&PositionSummary> {
        self.positions.as_ref()
    }

    /// Returns a reference to the [ErrorStats].
    pub fn error_stats(&self) -> &ErrorStats {
        &self.error_stats
    }

    /// Returns the number of errors reported.
    pub fn err_count(&self) -> u64 {
        self.error_stats.err_count()
    }

    /// Return if any errors were reported.
    pub fn any_errors(&self) -> bool {
        self.error_stats.err_count() > 0
    }

    /// Returns if any fatal errors were reported.
    pub fn any_fatal_err(&self) -> bool {
        self.error_stats.any_fatal_err()
    }

    /// Takes the reported fatal error.
    pub fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.error_stats.take_fatal_err()
    }

    /// Returns a slice of the unique error codes of reported errors.
    pub fn unique_error_codes_as_slice(&self) -> &[String] {
        self.error_stats.unique_error_codes_as_slice()
    }

    /// Returns a slice of the positions named in reported errors.
    pub fn positions_with_errors_as_slice(&self) -> &[FramePosition] {
        self.error_stats.positions_with_errors_as_slice()
    }

    pub(crate) fn write_stats(&self, mode: &DataOutputMode, format: DataOutputFormat) {
        let stats_str = match format {
            DataOutputFormat::JSON => serde_json::to_string_pretty(&self).map_err(|e| e.to_string()),
            DataOutputFormat::TOML => toml::to_string_pretty(&self).map_err(|e| e.to_string()),
        };
        match stats_str {
            Ok(stats_str) => write_stats_str(mode, &stats_str),
            Err(e) => log::error!("Failed to serialize stats to {format:?}: {e}"),
        }
    }
}

fn write_stats_str(mode: &DataOutputMode, stats_str: &str) {
    match mode {
        DataOutputMode::File(path) => {
            if let Err(e) = fs::write(path, stats_str) {
                log::error!("Failed writing stats output file {}: {e}", path.display());
            }
        }
        DataOutputMode::Stdout => println!("{stats_str}"),
        DataOutputMode::None => (),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn collector_with_all_stats() -> StatsCollector {
        let mut stats_collector = StatsCollector::default();
        stats_collector.collect(StatType::Fatal("fatal error".into()));
        stats_collector.collect(StatType::Error("0x10: [E11] Frame at 1:2:0:0:1: error".into()));
        stats_collector.collect(StatType::FormatVersion(1));
        stats_collector.collect(StatType::CycleSeen(CycleStats {
            frames: 3,
            valid: 2,
            unknown_positions: 0,
            duplicates: 1,
            status: StatusCounts {
                crc: 1,
                ..Default::default()
            },
        }));
        stats_collector.collect(StatType::Consensus(
            CounterKind::Ec,
            Verdict::Consensus {
                value: 7,
                size: 2,
                mismatches: 0,
            },
        ));
        stats_collector.collect(StatType::Consensus(
            CounterKind::Bc,
            Verdict::InsufficientSamples { samples: 2 },
        ));
        stats_collector.collect(StatType::PositionSummary(PositionSummary {
            positions_seen: 2,
            positions_with_errors: 1,
            status_counts: StatusCounts {
                crc: 1,
                ..Default::default()
            },
            channel_hits: 12,
        }));
        stats_collector.finalize(false);
        stats_collector
    }

    #[test]
    fn test_serde() {
        let stats_collector = collector_with_all_stats();

        let json = serde_json::to_string(&stats_collector).unwrap();
        let from_json = serde_json::from_str::<StatsCollector>(&json).unwrap();
        assert_eq!(stats_collector, from_json);

        let toml = toml::to_string(&stats_collector).unwrap();
        let from_toml = toml::from_str::<StatsCollector>(&toml).unwrap();
        assert_eq!(stats_collector, from_toml);
    }

    #[test]
    fn collect_routes_stats() {
        let mut stats_collector = collector_with_all_stats();
        assert_eq!(stats_collector.format_version(), Some(1));
        assert_eq!(stats_collector.cycles_seen(), 1);
        assert_eq!(stats_collector.frame_stats().frames_seen(), 3);
        assert_eq!(stats_collector.consensus_stats(CounterKind::Ec).consensus(), 1);
        assert_eq!(stats_collector.consensus_stats(CounterKind::Bc).insufficient(), 1);
        assert_eq!(stats_collector.position_summary().unwrap().channel_hits, 12);
        assert_eq!(stats_collector.err_count(), 1);
        assert_eq!(stats_collector.unique_error_codes_as_slice(), ["11"]);
        assert!(stats_collector.any_fatal_err());
        assert_eq!(stats_collector.take_fatal_err().as_deref(), Some("fatal error"));
    }

    #[test]
    fn write_stats_to_file() {
        let tmp_d = TempDir::new().unwrap();
        let stats_path = tmp_d.child("stats.json");
        let stats_collector = collector_with_all_stats();

        stats_collector.write_stats(
            &DataOutputMode::File(stats_path.clone().into_boxed_path()),
            DataOutputFormat::JSON,
        );

        let written = fs::read_to_string(&stats_path).unwrap();
        let from_file: StatsCollector = serde_json::from_str(&written).unwrap();
        assert_eq!(from_file, stats_collector);
    }
}

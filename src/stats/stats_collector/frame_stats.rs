//! Frame, cycle and consensus tallies kept by the [StatsCollector](super::StatsCollector)
use crate::util::*;

/// Number of times each [VfatStatus] flag was set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[allow(missing_docs)]
    pub missing: u64,
    #[allow(missing_docs)]
    pub id_mismatch: u64,
    #[allow(missing_docs)]
    pub footprint: u64,
    #[allow(missing_docs)]
    pub crc: u64,
    #[allow(missing_docs)]
    pub ec_progress: u64,
    #[allow(missing_docs)]
    pub bc_progress: u64,
}

impl StatusCounts {
    /// Count every flag set in `status`.
    pub fn record(&mut self, status: &VfatStatus) {
        self.missing += u64::from(status.is_missing());
        self.id_mismatch += u64::from(status.is_id_mismatch());
        self.footprint += u64::from(status.is_footprint_error());
        self.crc += u64::from(status.is_crc_error());
        self.ec_progress += u64::from(status.is_ec_progress_error());
        self.bc_progress += u64::from(status.is_bc_progress_error());
    }

    #[allow(missing_docs)]
    pub fn add(&mut self, other: &Self) {
        self.missing += other.missing;
        self.id_mismatch += other.id_mismatch;
        self.footprint += other.footprint;
        self.crc += other.crc;
        self.ec_progress += other.ec_progress;
        self.bc_progress += other.bc_progress;
    }

    /// Sum of all flag counts.
    pub fn total(&self) -> u64 {
        self.missing
            + self.id_mismatch
            + self.footprint
            + self.crc
            + self.ec_progress
            + self.bc_progress
    }
}

/// Tally of one cycle, sent by the analysis after the cycle is checked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Frame records in the cycle
    pub frames: u64,
    /// Frames that passed every enabled check
    pub valid: u64,
    /// Frames at positions absent from the readout mapping
    pub unknown_positions: u64,
    /// Frames rejected because their position was already seen in the cycle
    pub duplicates: u64,
    /// Status flags set in the cycle
    pub status: StatusCounts,
}

impl CycleStats {
    /// Stats of a cycle that was only scanned, not checked.
    pub fn scanned(frames: usize) -> Self {
        Self {
            frames: frames as u64,
            ..Default::default()
        }
    }
}

/// Run totals over all cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    cycles_seen: u64,
    frames_seen: u64,
    valid_frames: u64,
    unknown_positions: u64,
    duplicates: u64,
    status: StatusCounts,
}

impl FrameStats {
    pub(super) fn record_cycle(&mut self, cycle: &CycleStats) {
        self.cycles_seen += 1;
        self.frames_seen += cycle.frames;
        self.valid_frames += cycle.valid;
        self.unknown_positions += cycle.unknown_positions;
        self.duplicates += cycle.duplicates;
        self.status.add(&cycle.status);
    }

    #[allow(missing_docs)]
    pub fn cycles_seen(&self) -> u64 {
        self.cycles_seen
    }
    #[allow(missing_docs)]
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
    #[allow(missing_docs)]
    pub fn valid_frames(&self) -> u64 {
        self.valid_frames
    }
    #[allow(missing_docs)]
    pub fn unknown_positions(&self) -> u64 {
        self.unknown_positions
    }
    #[allow(missing_docs)]
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
    #[allow(missing_docs)]
    pub fn status(&self) -> &StatusCounts {
        &self.status
    }
}

/// Verdict tally of one counter kind over all cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStats {
    consensus: u64,
    weak_majority: u64,
    insufficient: u64,
    mismatches: u64,
}

impl ConsensusStats {
    pub(super) fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Consensus { mismatches, .. } => {
                self.consensus += 1;
                self.mismatches += *mismatches as u64;
            }
            Verdict::WeakMajority { .. } => self.weak_majority += 1,
            Verdict::InsufficientSamples { .. } => self.insufficient += 1,
        }
    }

    /// Cycles where a majority value was accepted
    pub fn consensus(&self) -> u64 {
        self.consensus
    }
    /// Cycles where the majority was too weak
    pub fn weak_majority(&self) -> u64 {
        self.weak_majority
    }
    /// Cycles with too few samples
    pub fn insufficient(&self) -> u64 {
        self.insufficient
    }
    /// Frames that disagreed with an accepted majority
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }
    /// Total verdicts recorded
    pub fn verdicts(&self) -> u64 {
        self.consensus + self.weak_majority + self.insufficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_counts_record() {
        let mut status = VfatStatus::default();
        status.set_crc_error();
        status.set_counter_error(CounterKind::Bc);
        let mut counts = StatusCounts::default();
        counts.record(&status);
        counts.record(&VfatStatus::default());

        assert_eq!(counts.crc, 1);
        assert_eq!(counts.bc_progress, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn frame_stats_sum_cycles() {
        let mut stats = FrameStats::default();
        stats.record_cycle(&CycleStats {
            frames: 4,
            valid: 3,
            unknown_positions: 1,
            duplicates: 0,
            status: StatusCounts {
                crc: 1,
                ..Default::default()
            },
        });
        stats.record_cycle(&CycleStats::scanned(2));

        assert_eq!(stats.cycles_seen(), 2);
        assert_eq!(stats.frames_seen(), 6);
        assert_eq!(stats.valid_frames(), 3);
        assert_eq!(stats.unknown_positions(), 1);
        assert_eq!(stats.status().crc, 1);
    }

    #[test]
    fn consensus_stats_record_verdicts() {
        let mut stats = ConsensusStats::default();
        stats.record(&Verdict::Consensus {
            value: 3,
            size: 9,
            mismatches: 2,
        });
        stats.record(&Verdict::InsufficientSamples { samples: 1 });
        stats.record(&Verdict::WeakMajority {
            value: 1,
            size: 2,
            total: 5,
        });

        assert_eq!(stats.consensus(), 1);
        assert_eq!(stats.mismatches(), 2);
        assert_eq!(stats.insufficient(), 1);
        assert_eq!(stats.weak_majority(), 1);
        assert_eq!(stats.verdicts(), 3);
    }
}

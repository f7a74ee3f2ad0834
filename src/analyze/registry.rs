//! Contains the [PositionRegistry] that accumulates per readout position results over a whole run.
use crate::util::*;
use crate::words::vfat_frame::CHANNEL_COUNT;

/// Accumulated results for one readout position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    frames: u64,
    status_counts: StatusCounts,
    channel_hits: Vec<u64>,
}

impl Default for PositionRecord {
    fn default() -> Self {
        Self {
            frames: 0,
            status_counts: StatusCounts::default(),
            channel_hits: vec![0; CHANNEL_COUNT],
        }
    }
}

impl PositionRecord {
    /// Frames received at this position.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of times each status flag was set.
    pub fn status_counts(&self) -> &StatusCounts {
        &self.status_counts
    }

    /// Hits per channel, indexed by channel number.
    pub fn channel_hits(&self) -> &[u64] {
        &self.channel_hits
    }

    /// True if any status flag was ever set.
    pub fn any_errors(&self) -> bool {
        self.status_counts.total() > 0
    }
}

/// Results per readout position, created once per run and updated after every cycle.
#[derive(Debug, Default)]
pub struct PositionRegistry {
    records: BTreeMap<FramePosition, PositionRecord>,
}

impl PositionRegistry {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the final status of a position in a cycle, and the channels that fired if a frame was received.
    pub fn record(&mut self, position: FramePosition, status: &VfatStatus, active_channels: &[u8]) {
        let record = self.records.entry(position).or_default();
        if !status.is_missing() {
            record.frames += 1;
        }
        record.status_counts.record(status);
        for &ch in active_channels {
            record.channel_hits[usize::from(ch)] += 1;
        }
    }

    /// The record of a position, if it was ever seen or expected.
    pub fn get(&self, position: FramePosition) -> Option<&PositionRecord> {
        self.records.get(&position)
    }

    /// Number of positions recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&FramePosition, &PositionRecord)> {
        self.records.iter()
    }

    /// Condense the registry into a [PositionSummary].
    pub fn summary(&self) -> PositionSummary {
        let mut summary = PositionSummary {
            positions_seen: self.records.values().filter(|r| r.frames > 0).count() as u64,
            ..Default::default()
        };
        for record in self.records.values() {
            if record.any_errors() {
                summary.positions_with_errors += 1;
            }
            summary.status_counts.add(&record.status_counts);
            summary.channel_hits += record.channel_hits.iter().sum::<u64>();
        }
        summary
    }
}

/// Run totals derived from the [PositionRegistry], sent to the stats controller at the end of the analysis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSummary {
    /// Positions that delivered at least one frame
    pub positions_seen: u64,
    /// Positions where any status flag was set at least once
    pub positions_with_errors: u64,
    /// Status flags set, summed over all positions
    pub status_counts: StatusCounts,
    /// Channel hits after masking, summed over all positions
    pub channel_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::validators::counter_consensus::CounterKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_counts_frames_and_channels() {
        let pos = FramePosition::new(1, 10, 0, 2, 3);
        let mut registry = PositionRegistry::new();
        registry.record(pos, &VfatStatus::default(), &[0, 127]);
        registry.record(pos, &VfatStatus::default(), &[0]);

        let record = registry.get(pos).unwrap();
        assert_eq!(record.frames(), 2);
        assert_eq!(record.channel_hits()[0], 2);
        assert_eq!(record.channel_hits()[127], 1);
        assert!(!record.any_errors());
    }

    #[test]
    fn missing_frame_is_not_counted_as_received() {
        let pos = FramePosition::new(1, 10, 0, 2, 3);
        let mut missing = VfatStatus::default();
        missing.set_missing();
        let mut registry = PositionRegistry::new();
        registry.record(pos, &missing, &[]);

        let record = registry.get(pos).unwrap();
        assert_eq!(record.frames(), 0);
        assert_eq!(record.status_counts().missing, 1);

        let summary = registry.summary();
        assert_eq!(summary.positions_seen, 0);
        assert_eq!(summary.positions_with_errors, 1);
    }

    #[test]
    fn summary_over_positions() {
        let pos_a = FramePosition::new(1, 10, 0, 2, 3);
        let pos_b = FramePosition::new(1, 10, 0, 2, 4);
        let mut ec_error = VfatStatus::default();
        ec_error.set_counter_error(CounterKind::Ec);

        let mut registry = PositionRegistry::new();
        registry.record(pos_a, &VfatStatus::default(), &[1, 2, 3]);
        registry.record(pos_b, &ec_error, &[4]);
        registry.record(pos_b, &VfatStatus::default(), &[]);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.summary(),
            PositionSummary {
                positions_seen: 2,
                positions_with_errors: 1,
                status_counts: StatusCounts {
                    ec_progress: 1,
                    ..Default::default()
                },
                channel_hits: 4,
            }
        );
    }
}

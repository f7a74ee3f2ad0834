//! Contains the [CycleAnalyzer] that checks every frame of an acquisition cycle, runs the counter consensus,
//! and accumulates the outcome in a [PositionRegistry].
//!
//! The per frame checks have no shared state and run on scoped worker threads.
//! Everything that depends on other frames of the cycle (duplicates, missing positions, consensus) runs afterwards on the calling thread.
use crate::config::readout_checks::VfatMapping;
use crate::util::*;

/// Below this many frames per worker, the overhead of spawning threads dominates.
const MIN_FRAMES_PER_WORKER: usize = 64;

const ERR_FOOTPRINT: u8 = 10;
const ERR_CRC: u8 = 11;
const ERR_CHIP_ID: u8 = 12;
const ERR_MISSING: u8 = 13;
const ERR_DUPLICATE: u8 = 14;
const ERR_EC_MISMATCH: u8 = 20;
const ERR_BC_MISMATCH: u8 = 21;

static DEFAULT_READOUT_CHECKS: OnceLock<ReadoutChecks> = OnceLock::new();

/// Outcome of the independent checks of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameInspection {
    validity: FrameValidity,
    validity_msg: Option<String>,
    id_mismatch_msg: Option<String>,
    active_channels: Vec<u8>,
}

fn inspect(
    record: &FrameRecord,
    checks: &ReadoutChecks,
    mappings: &BTreeMap<FramePosition, &VfatMapping>,
) -> FrameInspection {
    let (validity, validity_msg) = match FRAME_VALIDATOR.validate(&record.frame) {
        FrameValidity::Valid => (FrameValidity::Valid, None),
        // With the footprint test off the checksum still has to be judged
        FrameValidity::FootprintInvalid if !checks.test_footprint.enabled() => {
            match FRAME_VALIDATOR.crc_check(&record.frame) {
                Ok(()) => (FrameValidity::Valid, None),
                Err(msg) => (FrameValidity::CrcInvalid, Some(msg)),
            }
        }
        validity => (validity, FRAME_VALIDATOR.sanity_check(&record.frame).err()),
    };
    let mapping = mappings.get(&record.position);
    let id_mismatch_msg = mapping
        .and_then(|m| m.hw_id)
        .filter(|_| checks.test_id.enabled())
        .and_then(|hw_id| FRAME_VALIDATOR.check_chip_id(&record.frame, hw_id).err());
    let active_channels = match mapping {
        Some(m) => m.mask.apply(record.frame.active_channels()),
        None => record.frame.active_channels(),
    };
    FrameInspection {
        validity,
        validity_msg,
        id_mismatch_msg,
        active_channels,
    }
}

/// Analyzes cycles one at a time and keeps the run totals per readout position.
pub struct CycleAnalyzer<C: Config + 'static> {
    config: &'static C,
    stats_send: flume::Sender<StatType>,
    checks: &'static ReadoutChecks,
    mappings: BTreeMap<FramePosition, &'static VfatMapping>,
    registry: PositionRegistry,
    workers: usize,
}

impl<C: Config + 'static> CycleAnalyzer<C> {
    /// Create an analyzer, the readout checks of the config are used if present, otherwise all checks run in error mode without a mapping.
    pub fn new(config: &'static C, stats_send: flume::Sender<StatType>) -> Self {
        let checks = config
            .readout_checks()
            .unwrap_or_else(|| DEFAULT_READOUT_CHECKS.get_or_init(ReadoutChecks::default));
        let mappings = checks.vfat.iter().map(|m| (m.position, m)).collect();
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        log::debug!("Cycle analysis with up to {workers} workers");
        Self {
            config,
            stats_send,
            checks,
            mappings,
            registry: PositionRegistry::new(),
            workers,
        }
    }

    /// Results accumulated so far.
    pub fn registry(&self) -> &PositionRegistry {
        &self.registry
    }

    /// Analyze one cycle and report the outcome to the stats controller.
    pub fn analyze_cycle(&mut self, cycle: &Cycle) {
        let inspections = self.inspect_frames(&cycle.frames);

        let mut cycle_stats = CycleStats {
            frames: cycle.frames.len() as u64,
            ..Default::default()
        };
        let mut statuses: BTreeMap<FramePosition, VfatStatus> = BTreeMap::new();
        let mut accepted: BTreeMap<FramePosition, (&FrameRecord, Vec<u8>)> = BTreeMap::new();
        let mut ec_consensus = self.new_consensus(CounterKind::Ec);
        let mut bc_consensus = self.new_consensus(CounterKind::Bc);

        for (record, inspection) in cycle.frames.iter().zip(inspections) {
            if !self.mappings.is_empty() && !self.mappings.contains_key(&record.position) {
                log::debug!(
                    "Cycle {id}: frame at {pos} is not in the VFAT mapping",
                    id = cycle.id,
                    pos = record.position
                );
                cycle_stats.unknown_positions += 1;
                continue;
            }
            if statuses.contains_key(&record.position) {
                cycle_stats.duplicates += 1;
                self.report(
                    TestMode::Err,
                    record.mem_pos,
                    ERR_DUPLICATE,
                    record.position,
                    &format!("Duplicate frame in cycle {id}, ignored", id = cycle.id),
                );
                continue;
            }

            let mut status = VfatStatus::default();
            if let Some((mode, code)) = self.validity_check(inspection.validity) {
                status = VfatStatus::from_validity(inspection.validity);
                self.report(
                    mode,
                    record.mem_pos,
                    code,
                    record.position,
                    inspection.validity_msg.as_deref().unwrap_or_default(),
                );
            }
            if let Some(msg) = &inspection.id_mismatch_msg {
                status.set_id_mismatch();
                self.report(self.checks.test_id, record.mem_pos, ERR_CHIP_ID, record.position, msg);
            }

            if !status.is_corrupted() {
                if let Some(consensus) = ec_consensus.as_mut().filter(|_| record.frame.is_ec_present()) {
                    if let Err(e) = consensus.ingest(record.frame.ec(), record.position) {
                        log::warn!("Cycle {id}: {e}", id = cycle.id);
                    }
                }
                if let Some(consensus) = bc_consensus.as_mut().filter(|_| record.frame.is_bc_present()) {
                    if let Err(e) = consensus.ingest(record.frame.bc(), record.position) {
                        log::warn!("Cycle {id}: {e}", id = cycle.id);
                    }
                }
            }

            let _ = statuses.insert(record.position, status);
            let _ = accepted.insert(record.position, (record, inspection.active_channels));
        }

        for position in self.mappings.keys() {
            if statuses.contains_key(position) {
                continue;
            }
            let mut status = VfatStatus::default();
            status.set_missing();
            let _ = statuses.insert(*position, status);
            self.report(
                TestMode::Err,
                cycle.mem_pos,
                ERR_MISSING,
                *position,
                &format!("Missing in cycle {id}", id = cycle.id),
            );
        }

        for consensus in [ec_consensus, bc_consensus].into_iter().flatten() {
            self.finalize_consensus(cycle.id, consensus, &mut statuses, &accepted);
        }

        for (position, status) in &statuses {
            cycle_stats.status.record(status);
            if status.is_ok() {
                cycle_stats.valid += 1;
            }
            let channels: &[u8] = match accepted.get(position) {
                Some((_, channels)) if !status.is_corrupted() => channels,
                _ => &[],
            };
            self.registry.record(*position, status, channels);
        }

        self.stats_send
            .send(StatType::CycleSeen(cycle_stats))
            .expect("Couldn't send to Controller");
    }

    /// Send the run totals to the stats controller and return the registry.
    pub fn finish(self) -> PositionRegistry {
        self.stats_send
            .send(StatType::PositionSummary(self.registry.summary()))
            .expect("Couldn't send to Controller");
        self.registry
    }

    // Runs the independent checks, in parallel if the cycle is large enough
    fn inspect_frames(&self, frames: &[FrameRecord]) -> Vec<FrameInspection> {
        let checks = self.checks;
        let mappings = &self.mappings;
        let chunk_size = frames
            .len()
            .div_ceil(self.workers)
            .max(MIN_FRAMES_PER_WORKER);
        if frames.len() <= chunk_size {
            return frames
                .iter()
                .map(|record| inspect(record, checks, mappings))
                .collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = frames
                .chunks(chunk_size)
                .enumerate()
                .map(|(idx, chunk)| {
                    Builder::new()
                        .name(format!("Inspector {idx}"))
                        .spawn_scoped(scope, move || {
                            chunk
                                .iter()
                                .map(|record| inspect(record, checks, mappings))
                                .collect::<Vec<_>>()
                        })
                        .expect("Failed to spawn inspector thread")
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().expect("Inspector thread panicked"))
                .collect()
        })
    }

    fn validity_check(&self, validity: FrameValidity) -> Option<(TestMode, u8)> {
        let (mode, code) = match validity {
            FrameValidity::Valid => return None,
            FrameValidity::FootprintInvalid => (self.checks.test_footprint, ERR_FOOTPRINT),
            FrameValidity::CrcInvalid => (self.checks.test_crc, ERR_CRC),
        };
        mode.enabled().then_some((mode, code))
    }

    fn new_consensus(&self, kind: CounterKind) -> Option<CounterConsensus<FramePosition>> {
        let check = self.checks.consensus_check(kind);
        if !self.config.counter_checks_enabled() || !check.test.enabled() {
            return None;
        }
        Some(CounterConsensus::new(
            kind,
            kind.to_string(),
            check.min_samples,
            check.min_fraction,
            self.config.verbosity(),
        ))
    }

    fn finalize_consensus(
        &self,
        cycle_id: u32,
        consensus: CounterConsensus<FramePosition>,
        statuses: &mut BTreeMap<FramePosition, VfatStatus>,
        accepted: &BTreeMap<FramePosition, (&FrameRecord, Vec<u8>)>,
    ) {
        let kind = consensus.kind();
        let mode = self.checks.consensus_check(kind).test;
        let total = consensus.sample_count();

        let verdict = if mode == TestMode::Warn {
            let mut warnings = String::new();
            let verdict = consensus.finalize(total, statuses, Some(&mut warnings));
            warnings
                .lines()
                .for_each(|warning| log::warn!("Cycle {cycle_id}: {warning}"));
            verdict
        } else {
            consensus.finalize(total, statuses, None)
        };

        if mode == TestMode::Err {
            if let Some(majority) = verdict.accepted_value() {
                let code = match kind {
                    CounterKind::Ec => ERR_EC_MISMATCH,
                    CounterKind::Bc => ERR_BC_MISMATCH,
                };
                statuses
                    .iter()
                    .filter(|(_, status)| status.is_counter_error(kind))
                    .filter_map(|(position, _)| accepted.get(position))
                    .for_each(|(record, _)| {
                        let reported = match kind {
                            CounterKind::Ec => record.frame.ec(),
                            CounterKind::Bc => record.frame.bc(),
                        };
                        self.report(
                            mode,
                            record.mem_pos,
                            code,
                            record.position,
                            &format!("{kind} {reported} differs from the cycle majority {majority}"),
                        );
                    });
            }
        }

        log::trace!("Cycle {cycle_id}: {kind} verdict {verdict:?}");
        self.stats_send
            .send(StatType::Consensus(kind, verdict))
            .expect("Couldn't send to Controller");
    }

    fn report(&self, mode: TestMode, mem_pos: u64, code: u8, position: FramePosition, msg: &str) {
        let err_msg = format!("0x{mem_pos:X}: [E{code}] Frame at {position}: {msg}");
        match mode {
            TestMode::Err => self
                .stats_send
                .send(StatType::Error(err_msg.into()))
                .expect("Couldn't send to Controller"),
            TestMode::Warn => log::warn!("{err_msg}"),
            TestMode::Off => (),
        }
    }
}

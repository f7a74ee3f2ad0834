//! Contains the [CounterConsensus] that finds the most frequent value of a counter (EC or BC) among the frames of one cycle,
//! and flags the frames that disagree with it.
//!
//! One instance is made per counter kind per cycle, values are ingested single threaded after decoding,
//! and the instance is consumed by [CounterConsensus::finalize].
//!
//! Groups of equal size are resolved in favour of the lowest counter value.
//! The groups are kept in a value ordered map, so the outcome does not depend on the ingest order.
use crate::util::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// From this verbosity, the ruling on every identity is logged.
pub const RULING_LOG_VERBOSITY: u8 = 3;

/// The hardware counter a [CounterConsensus] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterKind {
    /// Event counter
    Ec,
    /// Bunch crossing counter
    Bc,
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKind::Ec => write!(f, "EC"),
            CounterKind::Bc => write!(f, "BC"),
        }
    }
}

/// Outcome of [CounterConsensus::finalize].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Fewer distinct identities than the minimum sample size, nobody is flagged.
    InsufficientSamples {
        /// Distinct identities ingested
        samples: usize,
    },
    /// The largest group does not reach the minimum fraction of the total, nobody is flagged.
    WeakMajority {
        /// Most frequent value
        value: u16,
        /// Identities reporting it
        size: usize,
        /// Total used for the fraction
        total: usize,
    },
    /// A majority value was accepted, and `mismatches` identities were flagged.
    Consensus {
        /// Accepted value
        value: u16,
        /// Identities reporting it
        size: usize,
        /// Identities flagged
        mismatches: usize,
    },
}

impl Verdict {
    /// The accepted majority value, if any.
    pub fn accepted_value(&self) -> Option<u16> {
        match self {
            Verdict::Consensus { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Rejected call to [CounterConsensus::ingest].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError<I> {
    /// An identity was ingested twice in the same cycle. The first value is kept.
    DuplicateIdentity {
        /// The repeated identity
        identity: I,
        /// Value from the first ingest
        recorded: u16,
        /// Value of the rejected ingest
        rejected: u16,
    },
}

impl<I: fmt::Display> fmt::Display for IngestError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::DuplicateIdentity {
                identity,
                recorded,
                rejected,
            } => write!(
                f,
                "{identity} already reported {recorded} in this cycle, rejected second value {rejected}"
            ),
        }
    }
}

impl<I: fmt::Debug + fmt::Display> error::Error for IngestError<I> {}

/// Accumulates counter values of one kind for one cycle, keyed by frame identity.
#[derive(Debug, Clone)]
pub struct CounterConsensus<I: Ord + Clone + fmt::Display> {
    kind: CounterKind,
    name: String,
    min_samples: usize,
    min_fraction: f64,
    verbosity: u8,
    groups: BTreeMap<u16, BTreeSet<I>>,
    samples: BTreeMap<I, u16>,
}

impl<I: Ord + Clone + fmt::Display> CounterConsensus<I> {
    /// Create an empty accumulator.
    ///
    /// `name` is used in diagnostics, `min_samples` is the number of distinct identities needed to attempt a consensus,
    /// and `min_fraction` is the share of the total the majority group has to reach.
    pub fn new(
        kind: CounterKind,
        name: impl Into<String>,
        min_samples: usize,
        min_fraction: f64,
        verbosity: u8,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            min_samples,
            min_fraction,
            verbosity,
            groups: BTreeMap::new(),
            samples: BTreeMap::new(),
        }
    }

    /// The counter kind checked.
    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of distinct identities ingested.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Record that `identity` reported `value`.
    ///
    /// Each identity can report once per cycle, a repeated ingest is rejected and the first value kept.
    pub fn ingest(&mut self, value: u16, identity: I) -> Result<(), IngestError<I>> {
        if let Some(&recorded) = self.samples.get(&identity) {
            return Err(IngestError::DuplicateIdentity {
                identity,
                recorded,
                rejected: value,
            });
        }
        let _ = self.groups.entry(value).or_default().insert(identity.clone());
        let _ = self.samples.insert(identity, value);
        Ok(())
    }

    /// The most frequent value and the size of its group. The lowest value wins a tie.
    pub fn majority(&self) -> Option<(u16, usize)> {
        let mut majority: Option<(u16, usize)> = None;
        for (&value, identities) in &self.groups {
            if majority.map_or(true, |(_, size)| identities.len() > size) {
                majority = Some((value, identities.len()));
            }
        }
        majority
    }

    /// Determine the majority value and flag every identity that disagrees with it in `status`.
    ///
    /// `total_samples` is the denominator of the majority fraction.
    /// If `errors` is supplied, one line is written to it per flagged identity.
    /// Too few samples or a too weak majority flags nobody.
    pub fn finalize(
        self,
        total_samples: usize,
        status: &mut BTreeMap<I, VfatStatus>,
        errors: Option<&mut dyn fmt::Write>,
    ) -> Verdict {
        let samples = self.samples.len();
        if samples < self.min_samples || samples == 0 {
            if self.verbosity > 0 {
                log::debug!(
                    "Too few frames ({samples}) to determine the most frequent {name} value",
                    name = self.name
                );
            }
            return Verdict::InsufficientSamples { samples };
        }

        let Some((value, size)) = self.majority() else {
            return Verdict::InsufficientSamples { samples };
        };

        if total_samples == 0 || (size as f64 / total_samples as f64) < self.min_fraction {
            if self.verbosity > 0 {
                log::debug!(
                    "The most frequent {name} value {value} is doubtful, reported by {size} of {total_samples} frames",
                    name = self.name
                );
            }
            return Verdict::WeakMajority {
                value,
                size,
                total: total_samples,
            };
        }

        let mut errors = errors;
        let mut mismatches = 0;
        for (&reported, identities) in &self.groups {
            for identity in identities {
                if reported == value {
                    if self.verbosity >= RULING_LOG_VERBOSITY {
                        log::debug!("{name}: {identity} reports {reported}, agrees", name = self.name);
                    }
                    continue;
                }
                mismatches += 1;
                status
                    .entry(identity.clone())
                    .or_default()
                    .set_counter_error(self.kind);
                if self.verbosity >= RULING_LOG_VERBOSITY {
                    log::debug!(
                        "{name}: {identity} reports {reported}, majority is {value}",
                        name = self.name
                    );
                }
                if let Some(err_writer) = errors.as_deref_mut() {
                    if let Err(e) = writeln!(
                        err_writer,
                        "{name} check: frame at {identity} reports {reported}, different from the most frequent value {value}",
                        name = self.name
                    ) {
                        log::warn!(
                            "{name}: failed writing diagnostic for {identity}: {e}",
                            name = self.name
                        );
                    }
                }
            }
        }
        Verdict::Consensus {
            value,
            size,
            mismatches,
        }
    }
}

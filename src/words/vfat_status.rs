//! Contains the [VfatStatus] quality record attached to every readout position of a cycle.
use crate::analyze::validators::counter_consensus::CounterKind;
use crate::analyze::validators::vfat_frame::FrameValidity;
use crate::util::*;

const MISSING: u8 = 0x01;
const ID_MISMATCH: u8 = 0x02;
const FOOTPRINT_ERROR: u8 = 0x04;
const CRC_ERROR: u8 = 0x08;
const EC_PROGRESS_ERROR: u8 = 0x10;
const BC_PROGRESS_ERROR: u8 = 0x20;

const FLAG_NAMES: [(u8, &str); 6] = [
    (MISSING, "missing"),
    (ID_MISMATCH, "ID mismatch"),
    (FOOTPRINT_ERROR, "footprint error"),
    (CRC_ERROR, "CRC error"),
    (EC_PROGRESS_ERROR, "EC progress error"),
    (BC_PROGRESS_ERROR, "BC progress error"),
];

/// Conversion status of one frame, a set of independent error flags.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct VfatStatus(u8);

impl VfatStatus {
    /// Status derived from the outcome of the [FrameValidator](crate::analyze::validators::vfat_frame::FrameValidator).
    pub fn from_validity(validity: FrameValidity) -> Self {
        let mut status = Self::default();
        match validity {
            FrameValidity::Valid => (),
            FrameValidity::FootprintInvalid => status.set_footprint_error(),
            FrameValidity::CrcInvalid => status.set_crc_error(),
        }
        status
    }

    /// True if no flag is set.
    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// True if the frame was expected but not received.
    pub fn is_missing(&self) -> bool {
        self.0 & MISSING != 0
    }
    /// True if the chip ID differs from the configured hardware ID.
    pub fn is_id_mismatch(&self) -> bool {
        self.0 & ID_MISMATCH != 0
    }
    /// True if the marker bits were wrong.
    pub fn is_footprint_error(&self) -> bool {
        self.0 & FOOTPRINT_ERROR != 0
    }
    /// True if the checksum or DAQ error flags failed.
    pub fn is_crc_error(&self) -> bool {
        self.0 & CRC_ERROR != 0
    }
    /// True if the EC disagreed with the cycle consensus.
    pub fn is_ec_progress_error(&self) -> bool {
        self.0 & EC_PROGRESS_ERROR != 0
    }
    /// True if the BC disagreed with the cycle consensus.
    pub fn is_bc_progress_error(&self) -> bool {
        self.0 & BC_PROGRESS_ERROR != 0
    }

    /// True if the frame content can not be trusted: missing, footprint, CRC or ID error.
    ///
    /// Such frames are left out of the counter consensus.
    pub fn is_corrupted(&self) -> bool {
        self.0 & (MISSING | ID_MISMATCH | FOOTPRINT_ERROR | CRC_ERROR) != 0
    }

    #[allow(missing_docs)]
    pub fn set_missing(&mut self) {
        self.0 |= MISSING;
    }
    #[allow(missing_docs)]
    pub fn set_id_mismatch(&mut self) {
        self.0 |= ID_MISMATCH;
    }
    #[allow(missing_docs)]
    pub fn set_footprint_error(&mut self) {
        self.0 |= FOOTPRINT_ERROR;
    }
    #[allow(missing_docs)]
    pub fn set_crc_error(&mut self) {
        self.0 |= CRC_ERROR;
    }

    /// Flag a counter disagreement of the given kind.
    pub fn set_counter_error(&mut self, kind: CounterKind) {
        self.0 |= match kind {
            CounterKind::Ec => EC_PROGRESS_ERROR,
            CounterKind::Bc => BC_PROGRESS_ERROR,
        };
    }

    /// True if the counter of the given kind disagreed with the consensus.
    pub fn is_counter_error(&self, kind: CounterKind) -> bool {
        match kind {
            CounterKind::Ec => self.is_ec_progress_error(),
            CounterKind::Bc => self.is_bc_progress_error(),
        }
    }

    /// Iterate over the names of all set flags.
    pub fn flag_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.0 & flag != 0)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for VfatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "ok");
        }
        write!(f, "{}", self.flag_names().join(", "))
    }
}

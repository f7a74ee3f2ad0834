//! Contains the [FramePosition] that identifies where in the readout hierarchy a frame came from.
use crate::util::*;

const IDX_IN_FIBER_MASK: u32 = 0xF;
const GOH_SHIFT: u32 = 4;
const GOH_MASK: u32 = 0xF;
const OPTO_RX_SHIFT: u32 = 8;
const OPTO_RX_MASK: u32 = 0x3;
const TOT_FED_SHIFT: u32 = 10;
const TOT_FED_MASK: u32 = 0xFFF;
const SUBSYSTEM_SHIFT: u32 = 22;
const SUBSYSTEM_MASK: u32 = 0xF;
const USED_BITS: u32 = (SUBSYSTEM_MASK << SUBSYSTEM_SHIFT) | ((1 << SUBSYSTEM_SHIFT) - 1);

/// Readout position of a VFAT chip: subsystem, TOTFED, OptoRx, GOH and index in the fiber.
///
/// Ordered by the packed raw value. Displayed and parsed as `subsystem:totfed:optorx:goh:idx`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FramePosition(u32);

impl FramePosition {
    /// Create a position from its fields, each field is masked to its width.
    pub const fn new(subsystem: u8, tot_fed: u16, opto_rx: u8, goh: u8, idx_in_fiber: u8) -> Self {
        Self(
            ((subsystem as u32 & SUBSYSTEM_MASK) << SUBSYSTEM_SHIFT)
                | ((tot_fed as u32 & TOT_FED_MASK) << TOT_FED_SHIFT)
                | ((opto_rx as u32 & OPTO_RX_MASK) << OPTO_RX_SHIFT)
                | ((goh as u32 & GOH_MASK) << GOH_SHIFT)
                | (idx_in_fiber as u32 & IDX_IN_FIBER_MASK),
        )
    }

    /// Create a position from the packed raw value, fails if any bit above the subsystem field is set.
    pub fn from_raw(raw: u32) -> Result<Self, PositionParseError> {
        if raw & !USED_BITS != 0 {
            return Err(PositionParseError::RawOutOfRange(raw));
        }
        Ok(Self(raw))
    }

    /// The packed raw value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Subsystem ID.
    pub fn subsystem(&self) -> u8 {
        ((self.0 >> SUBSYSTEM_SHIFT) & SUBSYSTEM_MASK) as u8
    }

    /// TOTFED ID.
    pub fn tot_fed(&self) -> u16 {
        ((self.0 >> TOT_FED_SHIFT) & TOT_FED_MASK) as u16
    }

    /// OptoRx ID.
    pub fn opto_rx(&self) -> u8 {
        ((self.0 >> OPTO_RX_SHIFT) & OPTO_RX_MASK) as u8
    }

    /// GOH ID.
    pub fn goh(&self) -> u8 {
        ((self.0 >> GOH_SHIFT) & GOH_MASK) as u8
    }

    /// Index of the chip in the fiber.
    pub fn idx_in_fiber(&self) -> u8 {
        (self.0 & IDX_IN_FIBER_MASK) as u8
    }
}

impl fmt::Display for FramePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.subsystem(),
            self.tot_fed(),
            self.opto_rx(),
            self.goh(),
            self.idx_in_fiber()
        )
    }
}

impl FromStr for FramePosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(':').collect();
        if fields.len() != 5 {
            return Err(PositionParseError::FieldCount(fields.len()));
        }
        let parse_field = |idx: usize, name: &'static str, max: u32| -> Result<u32, Self::Err> {
            let val: u32 = fields[idx]
                .parse()
                .map_err(|_| PositionParseError::InvalidField(name, fields[idx].to_string()))?;
            if val > max {
                return Err(PositionParseError::InvalidField(name, fields[idx].to_string()));
            }
            Ok(val)
        };
        let subsystem = parse_field(0, "subsystem", SUBSYSTEM_MASK)?;
        let tot_fed = parse_field(1, "TOTFED", TOT_FED_MASK)?;
        let opto_rx = parse_field(2, "OptoRx", OPTO_RX_MASK)?;
        let goh = parse_field(3, "GOH", GOH_MASK)?;
        let idx_in_fiber = parse_field(4, "index in fiber", IDX_IN_FIBER_MASK)?;
        Ok(Self::new(
            subsystem as u8,
            tot_fed as u16,
            opto_rx as u8,
            goh as u8,
            idx_in_fiber as u8,
        ))
    }
}

impl TryFrom<String> for FramePosition {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FramePosition> for String {
    fn from(pos: FramePosition) -> Self {
        pos.to_string()
    }
}

/// Failure to construct a [FramePosition].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionParseError {
    /// Expected 5 colon separated fields.
    FieldCount(usize),
    /// A field is not a number or exceeds its width.
    InvalidField(&'static str, String),
    /// Raw value has bits set above the subsystem field.
    RawOutOfRange(u32),
}

impl fmt::Display for PositionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionParseError::FieldCount(n) => write!(
                f,
                "Frame position needs 5 fields `subsystem:totfed:optorx:goh:idx`, got {n}"
            ),
            PositionParseError::InvalidField(name, val) => {
                write!(f, "Invalid {name} field in frame position: {val}")
            }
            PositionParseError::RawOutOfRange(raw) => {
                write!(f, "Raw frame position {raw:#010X} has bits set outside the position fields")
            }
        }
    }
}

impl error::Error for PositionParseError {}

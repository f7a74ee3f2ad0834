//! Contains the [FrameValidator] that checks the structure and integrity of a [VfatFrame].
use crate::util::*;
use std::fmt::Write;

/// Convenience const for the [FrameValidator].
pub const FRAME_VALIDATOR: FrameValidator = FrameValidator::new_const();

/// Outcome of validating a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameValidity {
    /// Footprint and checksum are fine.
    Valid,
    /// A present marker word has wrong fixed bits.
    FootprintInvalid,
    /// DAQ error flags are set or the checksum does not match.
    CrcInvalid,
}

impl fmt::Display for FrameValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameValidity::Valid => write!(f, "valid"),
            FrameValidity::FootprintInvalid => write!(f, "footprint invalid"),
            FrameValidity::CrcInvalid => write!(f, "CRC invalid"),
        }
    }
}

/// Stateless validator for [VfatFrame]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameValidator;

impl FrameValidator {
    /// Constant initialize a new [FrameValidator]
    pub const fn new_const() -> Self {
        Self
    }

    /// Check the footprint, then the checksum.
    ///
    /// A wrong footprint means the word boundaries are suspect, so it takes precedence over a checksum failure.
    pub fn validate(&self, frame: &VfatFrame) -> FrameValidity {
        if !frame.check_footprint() {
            FrameValidity::FootprintInvalid
        } else if !frame.check_crc() {
            FrameValidity::CrcInvalid
        } else {
            FrameValidity::Valid
        }
    }

    /// Describe what is wrong with a frame, for error messages.
    pub fn sanity_check(&self, frame: &VfatFrame) -> Result<(), String> {
        let mut err_str = String::new();
        match self.validate(frame) {
            FrameValidity::Valid => return Ok(()),
            FrameValidity::FootprintInvalid => {
                write!(err_str, "Footprint invalid, marker nibbles:").unwrap();
                for (word, present) in [
                    (9, frame.is_id_present()),
                    (10, frame.is_ec_present()),
                    (11, frame.is_bc_present()),
                ] {
                    if present {
                        write!(err_str, " {:#03X}", frame.data()[word] >> 12).unwrap();
                    } else {
                        write!(err_str, " -").unwrap();
                    }
                }
            }
            FrameValidity::CrcInvalid => return self.crc_check(frame),
        }
        Err(err_str)
    }

    /// Checksum check on its own, for when the footprint result is not used.
    pub fn crc_check(&self, frame: &VfatFrame) -> Result<(), String> {
        if frame.check_crc() {
            Ok(())
        } else if frame.daq_error_flags() != 0 {
            Err(format!(
                "DAQ error flags set: {:#06X}",
                frame.daq_error_flags()
            ))
        } else {
            Err(format!(
                "CRC mismatch: stored {stored:#06X}, calculated {calculated:#06X}",
                stored = frame.crc(),
                calculated = frame.calculate_crc()
            ))
        }
    }

    /// Compare the 12 bit chip ID against the expected hardware ID, only if the ID word is present.
    pub fn check_chip_id(&self, frame: &VfatFrame, hw_id: u16) -> Result<(), String> {
        if frame.is_id_present() && frame.chip_id() != hw_id & 0x0FFF {
            return Err(format!(
                "Chip ID {id:#05X} does not match expected hardware ID {expected:#05X}",
                id = frame.chip_id(),
                expected = hw_id & 0x0FFF
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::vfat_frame::{VfatFrameBuilder, ALL_PRESENT, ID_PRESENT};
    use pretty_assertions::assert_eq;

    const VALIDATOR: FrameValidator = FrameValidator::new_const();

    fn good_frame() -> VfatFrame {
        VfatFrameBuilder::new()
            .chip_id(0x123)
            .ec(7)
            .bc(1000)
            .channels([3, 64])
            .build()
    }

    #[test]
    fn valid_frame() {
        assert_eq!(VALIDATOR.validate(&good_frame()), FrameValidity::Valid);
        assert!(VALIDATOR.sanity_check(&good_frame()).is_ok());
    }

    #[test]
    fn bad_crc() {
        let mut data = *good_frame().data();
        data[0] ^= 0x0001;
        let frame = VfatFrame::new(data);
        assert_eq!(VALIDATOR.validate(&frame), FrameValidity::CrcInvalid);
        let err = VALIDATOR.sanity_check(&frame).unwrap_err();
        assert!(err.contains("CRC mismatch"), "{err}");
    }

    #[test]
    fn daq_error_reported() {
        let frame = good_frame().with_daq_error_flags(0x4);
        assert_eq!(VALIDATOR.validate(&frame), FrameValidity::CrcInvalid);
        let err = VALIDATOR.sanity_check(&frame).unwrap_err();
        assert_eq!(err, "DAQ error flags set: 0x0004");
    }

    #[test]
    fn footprint_takes_precedence() {
        let mut data = *good_frame().data();
        // Breaks both the EC marker and the checksum
        data[10] = 0x0000;
        let frame = VfatFrame::new(data);
        assert!(!frame.check_crc());
        assert_eq!(VALIDATOR.validate(&frame), FrameValidity::FootprintInvalid);
        let err = VALIDATOR.sanity_check(&frame).unwrap_err();
        assert_eq!(err, "Footprint invalid, marker nibbles: 0xE 0x0 0xA");
        // The checksum can still be judged on its own
        let crc_err = VALIDATOR.crc_check(&frame).unwrap_err();
        assert!(crc_err.starts_with("CRC mismatch"), "{crc_err}");
    }

    #[test]
    fn chip_id_check() {
        let frame = good_frame();
        assert!(VALIDATOR.check_chip_id(&frame, 0x123).is_ok());
        assert!(VALIDATOR.check_chip_id(&frame, 0xF123).is_ok());
        let err = VALIDATOR.check_chip_id(&frame, 0x124).unwrap_err();
        assert!(err.contains("0x123"), "{err}");
        let no_id = frame.with_presence_flags(ALL_PRESENT & !ID_PRESENT);
        assert!(VALIDATOR.check_chip_id(&no_id, 0x124).is_ok());
    }
}

//! Contains the [CaptureHeaderValidator] that checks the file header before any cycle is read.
use crate::input::capture::{CAPTURE_FORMAT_VERSION, CAPTURE_MAGIC};
use crate::util::*;
use std::fmt::Write;

/// Checks the magic bytes and format version of a [CaptureHeader].
#[derive(Debug, Default, Clone, Copy)]
pub struct CaptureHeaderValidator {
    supported_version: u8,
}

impl CaptureHeaderValidator {
    /// Constant initialize a validator for the current format version
    pub const fn new_const() -> Self {
        Self {
            supported_version: CAPTURE_FORMAT_VERSION,
        }
    }

    /// Returns all header problems in one message.
    pub fn sanity_check(&self, header: &CaptureHeader) -> Result<(), String> {
        let mut err_str = String::new();
        if header.magic != CAPTURE_MAGIC {
            write!(
                err_str,
                "Invalid capture magic {magic:02X?}, expected {CAPTURE_MAGIC:02X?}. ",
                magic = header.magic
            )
            .unwrap();
        }
        if header.version != self.supported_version {
            write!(
                err_str,
                "Unsupported capture format version {version}, expected {supported}.",
                version = header.version,
                supported = self.supported_version
            )
            .unwrap();
        }
        if err_str.is_empty() {
            Ok(())
        } else {
            Err(err_str.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALIDATOR: CaptureHeaderValidator = CaptureHeaderValidator::new_const();

    #[test]
    fn default_header_is_valid() {
        assert_eq!(VALIDATOR.sanity_check(&CaptureHeader::default()), Ok(()));
    }

    #[test]
    fn invalid_magic() {
        let header = CaptureHeader {
            magic: *b"GEM0",
            ..Default::default()
        };
        let err = VALIDATOR.sanity_check(&header).unwrap_err();
        assert!(err.starts_with("Invalid capture magic"), "{err}");
        assert!(!err.contains("version"), "{err}");
    }

    #[test]
    fn invalid_magic_and_version() {
        let header = CaptureHeader {
            magic: [0; 4],
            version: 2,
        };
        let err = VALIDATOR.sanity_check(&header).unwrap_err();
        assert!(err.contains("Invalid capture magic"), "{err}");
        assert!(err.ends_with("Unsupported capture format version 2, expected 1."), "{err}");
    }
}

//! Re-exports

pub use super::check::CheckCommands;
pub use super::check::ChecksOpt;
pub use super::inputoutput::DataOutputFormat;
pub use super::inputoutput::DataOutputMode;
pub use super::inputoutput::InputOutputOpt;
pub use super::lib::Config;
pub use super::readout_checks::ConsensusCheck;
pub use super::readout_checks::ReadoutChecks;
pub use super::readout_checks::ReadoutChecksOpt;
pub use super::readout_checks::TestMode;
pub use super::test_util::MockConfig;
pub use super::util::UtilOpt;
pub use super::view::ViewCommands;
pub use super::view::ViewOpt;

//! Trait for all check options.
use clap::Subcommand;

/// A config that implements this trait can be used to enable checks.
pub trait ChecksOpt {
    /// Type of Check to perform.
    fn check(&self) -> Option<CheckCommands>;
}

impl<T> ChecksOpt for &T
where
    T: ChecksOpt,
{
    fn check(&self) -> Option<CheckCommands> {
        (*self).check()
    }
}

impl<T> ChecksOpt for Box<T>
where
    T: ChecksOpt,
{
    fn check(&self) -> Option<CheckCommands> {
        (**self).check()
    }
}
impl<T> ChecksOpt for std::sync::Arc<T>
where
    T: ChecksOpt,
{
    fn check(&self) -> Option<CheckCommands> {
        (**self).check()
    }
}

/// Check subcommand to enable checks, needs to be followed by a check type subcommand
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCommands {
    /// Perform the frame checks (footprint, CRC, chip ID) and compare the EC and BC counters of all frames in a cycle.
    All,
    /// Perform only the frame checks (footprint, CRC, chip ID).
    Sanity,
}

impl CheckCommands {
    /// True if the counter consensus is part of the check.
    pub fn counter_checks_enabled(self) -> bool {
        self == CheckCommands::All
    }
}

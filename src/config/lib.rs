//! Contains the [Config] super trait, and all the sub traits required by it
//!
//! Implementing the [Config] super trait is required by configs passed to structs in other modules as part of instantiation.

use super::{
    check::ChecksOpt, inputoutput::InputOutputOpt, readout_checks::ReadoutChecksOpt,
    util::UtilOpt, view::ViewOpt,
};
use crate::util::*;

/// Super trait for all the traits that needed to be implemented by the config struct
// Generic traits that are required by the config struct
pub trait Config: Send + Sync + std::marker::Sized
where
    // Subtraits that group together related configuration options
    Self: UtilOpt + InputOutputOpt + ChecksOpt + ViewOpt + ReadoutChecksOpt,
{
    /// Validate the arguments of the config
    fn validate_args(&self) -> Result<(), String> {
        if self.any_errors_exit_code().is_some_and(|val| val == 0) {
            return Err("Invalid config: Exit code for any errors cannot be 0".to_string());
        }
        if self.verbosity() > 4 {
            return Err(format!(
                "Invalid config: Verbosity has to be within 0-4, got {}",
                self.verbosity()
            ));
        }
        if self.check().is_some() && self.view().is_some() {
            return Err("Invalid config: Checks and views cannot be combined".to_string());
        }
        if self.stats_output_mode() != DataOutputMode::None && self.stats_output_format().is_none()
        {
            return Err("Invalid config: Stats output requires a stats format (JSON/TOML)".to_string());
        }
        Ok(())
    }

    /// Check if the counter consensus should run, `check all` enables it
    fn counter_checks_enabled(&self) -> bool {
        self.check().is_some_and(|c| c.counter_checks_enabled())
    }
}

impl<T> Config for &T
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (*self).validate_args()
    }

    fn counter_checks_enabled(&self) -> bool {
        (*self).counter_checks_enabled()
    }
}

impl<T> Config for Box<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }

    fn counter_checks_enabled(&self) -> bool {
        (**self).counter_checks_enabled()
    }
}
impl<T> Config for std::sync::Arc<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }

    fn counter_checks_enabled(&self) -> bool {
        (**self).counter_checks_enabled()
    }
}

/// Styling of the help text
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

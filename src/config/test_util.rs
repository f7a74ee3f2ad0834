#![allow(missing_docs)]

use crate::util::*;

#[derive(Debug, Clone)]
/// Complete configurable Mock config for testing
pub struct MockConfig {
    pub check: Option<CheckCommands>,
    pub view: Option<ViewCommands>,
    pub verbosity: u8,
    pub max_tolerate_errors: u32,
    pub input_file: Option<PathBuf>,
    pub exit_code_any_errors: Option<u8>,
    pub mute_errors: bool,
    pub generate_checks_toml: bool,
    pub readout_checks: Option<ReadoutChecks>,
    pub stats_output_mode: DataOutputMode,
    pub stats_output_format: Option<DataOutputFormat>,
    pub show_error_codes: Vec<String>,
    pub disable_styled_views: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self {
            check: None,
            view: None,
            verbosity: 0,
            max_tolerate_errors: 0,
            input_file: None,
            exit_code_any_errors: None,
            mute_errors: false,
            generate_checks_toml: false,
            readout_checks: None,
            stats_output_mode: DataOutputMode::None,
            stats_output_format: None,
            show_error_codes: Vec::new(),
            disable_styled_views: false,
        }
    }

    pub fn new_check_all() -> Self {
        Self {
            check: Some(CheckCommands::All),
            ..Default::default()
        }
    }
}

impl Config for MockConfig {}

impl ChecksOpt for MockConfig {
    fn check(&self) -> Option<CheckCommands> {
        self.check
    }
}

impl ViewOpt for MockConfig {
    fn view(&self) -> Option<ViewCommands> {
        self.view
    }
}

impl InputOutputOpt for MockConfig {
    fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }
    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output_mode.clone()
    }
    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl UtilOpt for MockConfig {
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    fn max_tolerate_errors(&self) -> u32 {
        self.max_tolerate_errors
    }
    fn any_errors_exit_code(&self) -> Option<u8> {
        self.exit_code_any_errors
    }
    fn mute_errors(&self) -> bool {
        self.mute_errors
    }
    fn error_code_filter(&self) -> Option<&[String]> {
        if self.show_error_codes.is_empty() {
            None
        } else {
            Some(&self.show_error_codes)
        }
    }
    fn disable_styled_views(&self) -> bool {
        self.disable_styled_views
    }
}

impl ReadoutChecksOpt for MockConfig {
    fn readout_checks(&self) -> Option<&ReadoutChecks> {
        self.readout_checks.as_ref()
    }
    fn generate_readout_checks_toml_enabled(&self) -> bool {
        self.generate_checks_toml
    }
}

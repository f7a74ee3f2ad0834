//! Contains the [Cfg] struct that parses and stores the command line arguments
//!
//! [Cfg] uses procedural macros from the `clap` library to implement most of the argument parsing and validation logic.
//! The [Cfg] struct implements several options and subcommands, as well as convenience functions to get various parts of the configuration

use crate::util::*;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod check;
pub mod inputoutput;
pub mod lib;
pub mod prelude;
pub mod readout_checks;
pub mod test_util;
pub mod util;
pub mod view;

/// The [CONFIG] static variable is used to store the [Cfg] created from the parsed command line arguments
pub static CONFIG: OnceLock<Cfg> = OnceLock::new();
/// The [READOUT_CHECKS] static variable stores the [ReadoutChecks] read from the TOML file specified on the command line
static READOUT_CHECKS: OnceLock<ReadoutChecks> = OnceLock::new();

/// File name of the generated checks template
pub const READOUT_CHECKS_TEMPLATE_NAME: &str = "readout_checks.toml";

/// The [Cfg] struct uses procedural macros and implements the [Config] trait, to provide convenient access to the command line arguments.
#[derive(Parser, Debug)]
#[command(name = "vfatcheck - VFAT readout frame checker")]
#[command(bin_name = "vfatcheck", version)]
#[command(about = "vfatcheck decodes and validates captured VFAT readout frames.")]
#[command(
    long_about = "\nvfatcheck decodes and validates captured VFAT readout frames.\n\
It checks the frame footprint, checksum and chip ID, and compares\n\
the event and bunch crossing counters of all frames of a cycle\n\
to find the chips that lost synchronization."
)]
#[command(propagate_version = true)]
#[command(styles = lib::styles())]
pub struct Cfg {
    /// Input capture file (default: stdin)
    #[arg(name = "Capture File", global = true, value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Commands such as `Check` or `View` that accepts further subcommands
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Verbosity level 0-4 (Errors, Warnings, Info, Debug, Trace)
    #[arg(short = 'v', long = "verbosity", default_value_t = 1, global = true)]
    verbosity: u8,

    /// Max tolerate errors before exiting, if set to 0 -> no limit to errors
    #[arg(
        short = 'e',
        long = "max-tolerate-errors",
        visible_aliases = ["max-errors", "tolerate-errors"],
        default_value_t = 0,
        global = true
    )]
    max_tolerate_errors: u32,

    /// Set the exit code for if any errors are detected in the input data (cannot be 0)
    #[arg(
        short = 'E',
        long = "any-errors-exit-code",
        visible_alias = "exit-code",
        global = true
    )]
    any_errors_exit_code: Option<u8>,

    /// Don't show error messages - helpful if there's a large amount of errors and you just want to see the report
    #[arg(short, long, default_value_t = false, global = true)]
    mute_errors: bool,

    /// Generate a checks TOML file in the current directory that can be used as a template to configure the checks.
    #[arg(short, long, default_value_t = false, global = true, visible_aliases = ["gen-toml", "gen-checks"])]
    generate_checks_toml: bool,

    /// Path to a checks TOML file with check modes, consensus thresholds and the expected readout mapping.
    #[arg(
        short = 'c',
        long,
        global = true,
        visible_alias = "checks-file",
        value_hint = clap::ValueHint::FilePath
    )]
    checks_toml: Option<PathBuf>,

    /// Output stats (default: none), requires setting a data format option (JSON, TOML)
    #[arg(
        name = "OUTPUT FINAL STATS",
        short = 'S',
        long = "output-stats",
        default_value_t = DataOutputMode::None,
        visible_alias = "output-final-stats",
        global = true,
        requires = "STATS FORMAT",
    )]
    stats_output: DataOutputMode,

    /// Output stats format (JSON/TOML), requires setting a stats output option
    #[arg(
        name = "STATS FORMAT",
        short = 'D',
        long = "stats-format",
        visible_alias = "stats-data-format",
        global = true,
        requires = "OUTPUT FINAL STATS"
    )]
    stats_output_format: Option<DataOutputFormat>,

    /// Show only error with the specified error codes, e.g. `-w 11 20` to only show errors with error codes 11 and 20
    #[arg(
        short = 'w',
        long = "show-only-errors-with-codes",
        visible_aliases = ["error-codes", "show-errors-with-codes"],
        global = true,
        value_delimiter = ' ',
        num_args = 1..
    )]
    show_error_codes: Vec<String>,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(
        long = "generate-completions",
        value_hint = clap::ValueHint::Other,
        value_name = "SHELL"
    )]
    pub generate_completions: Option<Shell>,

    /// Output from view commands is styled by default, set this flag to disable styled views
    #[arg(short = 'd', long, global = true, default_value_t = false)]
    disable_styled_views: bool,
}

impl Cfg {
    /// Get a reference to the global config
    pub fn global() -> &'static Cfg {
        CONFIG.get().expect("Config is not initialized")
    }

    /// If a checks TOML file is specified, parse it and set the readout checks static variable.
    /// If the checks TOML file is not specified, but the `--gen-checks` flag is set, generate a checks TOML file in the current directory.
    pub fn handle_readout_checks(&self) -> Result<(), String> {
        if let Some(checks_toml) = &self.checks_toml {
            let readout_checks = ReadoutChecks::from_path(checks_toml)?;
            log::trace!("Readout checks loaded: {readout_checks:#?}");
            READOUT_CHECKS
                .set(readout_checks)
                .map_err(|_| "Readout checks already initialized".to_string())?;
        } else if self.generate_checks_toml {
            fs::write(
                READOUT_CHECKS_TEMPLATE_NAME,
                ReadoutChecks::default().to_string_pretty_toml()?,
            )
            .map_err(|e| format!("Failed to write {READOUT_CHECKS_TEMPLATE_NAME}: {e}"))?;
        }
        Ok(())
    }

    /// Generate completion scripts for the specified shell.
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Cfg as clap::CommandFactory>::command(),
            "vfatcheck",
            &mut io::stdout(),
        );
    }
}

/// Implementing the config super trait requires implementing all the sub traits
impl Config for Cfg {}

impl ViewOpt for Cfg {
    #[inline]
    fn view(&self) -> Option<ViewCommands> {
        match &self.cmd {
            Some(Command::View(view_sub_cmd)) => Some(view_sub_cmd.cmd),
            _ => None,
        }
    }
}

impl ChecksOpt for Cfg {
    #[inline]
    fn check(&self) -> Option<CheckCommands> {
        match &self.cmd {
            Some(Command::Check(checks)) => Some(checks.cmd),
            _ => None,
        }
    }
}

impl InputOutputOpt for Cfg {
    #[inline]
    fn input_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn stats_output_mode(&self) -> DataOutputMode {
        self.stats_output.clone()
    }

    fn stats_output_format(&self) -> Option<DataOutputFormat> {
        self.stats_output_format
    }
}

impl UtilOpt for Cfg {
    #[inline]
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    #[inline]
    fn max_tolerate_errors(&self) -> u32 {
        self.max_tolerate_errors
    }
    fn any_errors_exit_code(&self) -> Option<u8> {
        self.any_errors_exit_code
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

    #[inline]
    fn disable_styled_views(&self) -> bool {
        self.disable_styled_views
    }
}

impl ReadoutChecksOpt for Cfg {
    fn readout_checks(&self) -> Option<&ReadoutChecks> {
        READOUT_CHECKS.get()
    }

    fn generate_readout_checks_toml_enabled(&self) -> bool {
        self.generate_checks_toml
    }
}

/// Holds the [CheckCommands] subcommands
#[derive(Debug, Args, Clone, Copy)]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
pub struct CheckArgs {
    #[command(subcommand)]
    cmd: CheckCommands,
}
/// Holds the [ViewCommands] subcommands
#[derive(Debug, Args, Clone, Copy)]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
pub struct ViewArgs {
    #[command(subcommand)]
    cmd: ViewCommands,
}

#[derive(Debug, Subcommand, Clone, Copy)]
/// Subcommands to enable checks or views, needs to be followed by a [CheckCommands] or [ViewCommands] subcommand.
pub enum Command {
    /// Enable check mode, requires a `check mode` subcommand [all/sanity]
    #[command(arg_required_else_help = true)]
    Check(CheckArgs),
    /// Enable view mode, requires a view subcommand e.g. `frames` or `status`
    #[command(arg_required_else_help = true)]
    View(ViewArgs),
}

/// Get the [config][super::config::Cfg] from the command line arguments and set the static [CONFIG] variable.
pub fn init_config() -> Result<(), String> {
    let cfg = <super::config::Cfg as clap::Parser>::parse();
    cfg.validate_args()?;
    cfg.handle_readout_checks()?;
    CONFIG
        .set(cfg)
        .map_err(|_| "Config already initialized".to_string())?;
    Ok(())
}

#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
// Readability lints
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool,
    clippy::single_match_else,
    clippy::range_plus_one,
    clippy::int_plus_one,
    clippy::needless_range_loop,
    clippy::needless_continue,
    clippy::shadow_same,
    clippy::shadow_unrelated
)]
// Performance lints
#![warn(variant_size_differences)]
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]
// Safety lints
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(trivial_casts, trivial_numeric_casts)]
// Unhandled results (allow unwrap and expect as there are many cases where the unwrap is totally safe)
#![warn(clippy::map_unwrap_or)]

//! VFAT readout frame checker (vfatcheck), for decoding and validating captured VFAT frames
//!
//! # Usage
//!
//! ## Reading a capture from file and performing checks
//! ```shell
//! # Enable all checks: `sanity` (footprint, CRC, chip ID) AND the EC/BC consensus of every cycle
//! $ vfatcheck <input_file> check all
//!
//! # Same as above but only enable the per frame `sanity` checks
//! $ vfatcheck <input_file> check sanity
//! ```
//!
//! ## Configure check modes, consensus thresholds and the expected readout mapping
//! ```shell
//! # Generate a commented template `readout_checks.toml` in the current directory
//! $ vfatcheck -g
//! $ vfatcheck <input_file> check all -c readout_checks.toml
//! ```
//!
//! ## Reading a capture from stdin and writing the stats as JSON to a file
//! ```shell
//! $ cat <input_file> | vfatcheck check all -S stats.json -D json
//! ```
//!
//! ## Reading from file and printing a view of the frames
//! ```bash
//! $ vfatcheck <input_file> view frames
//! $ vfatcheck <input_file> view status
//! ```

use crate::util::*;
use input::{spawn_reader, InputReader};

/// Write an error message to stderr.
/// All error messages should be written through this function to ensure consistency.
#[inline]
pub fn display_error(err_msg: &str) {
    log::error!("{}", owo_colors::OwoColorize::red(&err_msg));
}

pub mod analyze;
pub mod config;
pub mod controller;
pub mod init;
pub mod input;
pub mod stats;
pub mod util;
pub mod words;

/// Does the initial setup for input data processing
///
/// Loads and checks the [CaptureHeader] before any cycle is read, a bad header stops processing with a [StatType::Fatal].
#[allow(clippy::needless_pass_by_value)] // The reader is moved into the reader thread
pub fn init_processing(
    config: &'static impl Config,
    mut reader: InputReader,
    stat_send: flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<()> {
    const HEADER_VALIDATOR: CaptureHeaderValidator = CaptureHeaderValidator::new_const();

    let header = match CaptureHeader::load(&mut reader) {
        Ok(header) => header,
        Err(e) => {
            let e = io::Error::new(e.kind(), format!("Failed to read capture header: {e}"));
            stat_send
                .send(StatType::Fatal(e.to_string().into()))
                .expect("Couldn't send to Controller");
            return Err(e);
        }
    };
    if let Err(e) = HEADER_VALIDATOR.sanity_check(&header) {
        let e = io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Capture header failed sanity check: {e}"),
        );
        stat_send
            .send(StatType::Fatal(e.to_string().into()))
            .expect("Couldn't send to Controller");
        return Err(e);
    }
    log::info!("Capture format version {}", header.version);
    stat_send
        .send(StatType::FormatVersion(header.version))
        .expect("Couldn't send to Controller");

    let scanner = CaptureScanner::new_from_header(reader, &header);
    process(config, scanner, &stat_send, stop_flag)
}

/// Entry point for scanning the input and delegating to checkers or view generators depending on [Config]
///
/// Follows these steps:
/// 1. Setup reading (`file` or `stdin`) using [input::spawn_reader].
/// 2. Depending on [Config] do one of:
///     - Validate data cycle by cycle with the [CycleAnalyzer][crate::analyze::cycle::CycleAnalyzer].
///     - Generate views of data with [analyze::view::lib::generate_view].
///     - Only count the cycles and frames if neither is set.
pub fn process<R: io::Read + Send + 'static>(
    config: &'static impl Config,
    scanner: CaptureScanner<R>,
    stats_send: &flume::Sender<StatType>,
    stop_flag: Arc<AtomicBool>,
) -> io::Result<()> {
    // 1. Launch reader thread to read data from file or stdin
    let (reader_handle, reader_data_recv) =
        spawn_reader(stop_flag.clone(), scanner, stats_send.clone());

    // 2. Launch analysis thread
    let analysis_handle = analyze::lib::spawn_analysis(
        config,
        stop_flag,
        stats_send.clone(),
        reader_data_recv,
    )?;

    reader_handle.join().expect("Error joining reader thread");

    if let Err(e) = analysis_handle.join() {
        log::error!("Analysis thread terminated early: {:#?}\n", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::capture_writer::CaptureWriter;
    use crate::words::vfat_frame::VfatFrameBuilder;
    use pretty_assertions::assert_eq;

    static CFG_TEST_INIT_PROCESSING: OnceLock<MockConfig> = OnceLock::new();
    static CFG_TEST_BAD_HEADER: OnceLock<MockConfig> = OnceLock::new();

    fn capture_bytes(header: &CaptureHeader, cycles: u32) -> Vec<u8> {
        let mut writer = CaptureWriter::with_header(Vec::new(), header).unwrap();
        for id in 0..cycles {
            let frames: Vec<(FramePosition, VfatFrame)> = (0..12)
                .map(|idx| {
                    (
                        FramePosition::new(1, 200, 0, 3, idx),
                        VfatFrameBuilder::new()
                            .chip_id(0x100 + u16::from(idx))
                            .ec(id as u16)
                            .bc(1234)
                            .channels([idx])
                            .build(),
                    )
                })
                .collect();
            writer.write_cycle(id, &frames).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_init_processing() {
        CFG_TEST_INIT_PROCESSING
            .set(MockConfig::new_check_all())
            .unwrap();
        let reader: InputReader = Box::new(io::Cursor::new(capture_bytes(
            &CaptureHeader::default(),
            40,
        )));
        let (sender, receiver): (flume::Sender<StatType>, flume::Receiver<StatType>) =
            flume::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        init_processing(
            CFG_TEST_INIT_PROCESSING.get().unwrap(),
            reader,
            sender,
            stop_flag.clone(),
        )
        .unwrap();

        let mut format_version = None;
        let mut cycles_seen = 0;
        let mut consensus_verdicts = 0;
        while let Ok(stat) = receiver.recv() {
            match stat {
                StatType::FormatVersion(v) => format_version = Some(v),
                StatType::CycleSeen(cycle) => {
                    cycles_seen += 1;
                    assert_eq!(cycle.valid, 12);
                }
                StatType::Consensus(_, verdict) => {
                    consensus_verdicts += 1;
                    assert!(matches!(verdict, Verdict::Consensus { mismatches: 0, .. }));
                }
                StatType::Error(e) | StatType::Fatal(e) => panic!("Error or Fatal: {e}"),
                _ => (),
            }
        }

        assert_eq!(format_version, Some(1));
        assert_eq!(cycles_seen, 40);
        assert_eq!(consensus_verdicts, 80);
        assert!(!stop_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn bad_header_is_fatal() {
        CFG_TEST_BAD_HEADER.set(MockConfig::new_check_all()).unwrap();
        let header = CaptureHeader {
            magic: *b"GEM0",
            version: 1,
        };
        let reader: InputReader = Box::new(io::Cursor::new(capture_bytes(&header, 1)));
        let (sender, receiver) = flume::unbounded();

        let err = init_processing(
            CFG_TEST_BAD_HEADER.get().unwrap(),
            reader,
            sender,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let stats: Vec<StatType> = receiver.try_iter().collect();
        assert_eq!(stats.len(), 1);
        assert!(matches!(&stats[0], StatType::Fatal(msg) if msg.contains("Invalid capture magic")));
    }
}

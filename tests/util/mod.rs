#![allow(dead_code)]
/// Re-export some common utilities for system tests
pub use assert_cmd::prelude::*; // Add methods on commands
pub use assert_cmd::Command; // Get the methods for the Commands struct
pub use assert_fs::prelude::*;
pub use assert_fs::TempDir;
pub use predicate::str::is_match;
pub use predicates::prelude::*; // Used for writing assertions // Create temporary directories
#[allow(unused_imports)]
use pretty_assertions::{assert_eq, assert_ne, assert_str_eq};
use regex::{Regex, RegexBuilder};
use std::io::Write;
use std::path::PathBuf;
use vfatcheck::input::capture::CaptureHeader;
use vfatcheck::input::capture_writer::CaptureWriter;
use vfatcheck::words::frame_position::FramePosition;
use vfatcheck::words::vfat_frame::{VfatFrame, VfatFrameBuilder};

/// Frames in every generated cycle
pub const FRAMES_PER_CYCLE: u8 = 12;
/// BC reported by every frame of a generated cycle
pub const CYCLE_BC: u16 = 1234;
/// Binary name
pub const BIN: &str = "vfatcheck";

/// Frames of one cycle, in the order they are written to the capture
pub type CycleFrames = Vec<(FramePosition, VfatFrame)>;

/// Readout position of chip `idx` in the generated captures
pub fn position(idx: u8) -> FramePosition {
    FramePosition::new(1, 200, 0, 3, idx)
}

/// A cycle where all chips agree on the counters, chip `idx` has a hit on channel `idx`
pub fn good_cycle(ec: u16) -> CycleFrames {
    (0..FRAMES_PER_CYCLE)
        .map(|idx| {
            (
                position(idx),
                VfatFrameBuilder::new()
                    .chip_id(0x100 + u16::from(idx))
                    .ec(ec)
                    .bc(CYCLE_BC)
                    .channels([idx])
                    .build(),
            )
        })
        .collect()
}

/// Flip bits in a channel word without updating the checksum
pub fn corrupt_crc(frame: &mut VfatFrame) {
    let mut data = *frame.data();
    data[1] ^= 0x00F0;
    frame.set_data(data);
}

/// Byte offset of frame `frame_idx` in cycle `cycle_idx` of a capture of [good_cycle]s
pub fn frame_mem_pos(cycle_idx: u64, frame_idx: u64) -> u64 {
    const FILE_HEADER: u64 = 8;
    const CYCLE_HEADER: u64 = 8;
    const RECORD: u64 = 32;
    let cycle_size = CYCLE_HEADER + u64::from(FRAMES_PER_CYCLE) * RECORD;
    FILE_HEADER + cycle_idx * cycle_size + CYCLE_HEADER + frame_idx * RECORD
}

/// Write the cycles to a capture file named `name` in `tmp_dir`, cycle IDs count up from 0
pub fn write_capture(
    tmp_dir: &TempDir,
    name: &str,
    cycles: &[CycleFrames],
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    write_capture_with_header(tmp_dir, name, &CaptureHeader::default(), cycles)
}

/// Same as [write_capture] but with a custom file header
pub fn write_capture_with_header(
    tmp_dir: &TempDir,
    name: &str,
    header: &CaptureHeader,
    cycles: &[CycleFrames],
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file = tmp_dir.child(name);
    let mut writer = CaptureWriter::with_header(
        std::io::BufWriter::new(std::fs::File::create(file.path())?),
        header,
    )?;
    for (id, frames) in cycles.iter().enumerate() {
        writer.write_cycle(u32::try_from(id)?, frames)?;
    }
    writer.into_inner().flush()?;
    Ok(file.path().to_path_buf())
}

/// Helper function to match the raw output of stderr or stdout, with a pattern a fixed amount of times
pub fn match_on_output(
    byte_output: &[u8],
    re_str: &str,
    match_count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Build regex pattern
    let re = fancy_regex::Regex::new(re_str).unwrap();
    // Make the predicate function
    let pred_regex = predicate::function(|&x| re.find_iter(x).count() == match_count);
    // Convert the output to string as utf-8
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    // Evaluate the output with the predicate
    assert!(pred_regex.eval(&str_res), "regex: {re_str}\nFailed to match on:\n{str_res}");
    Ok(())
}

/// Helper function to match the raw output of stderr or stdout, with a pattern a fixed amount of times, case insensitive
pub fn match_on_out_no_case(
    byte_output: &[u8],
    re_str: &str,
    expect_match: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    // Convert the output to string as utf-8
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    // Build regex pattern
    let re = fancy_regex::Regex::new(&("(?i)".to_owned() + re_str)).unwrap();
    // Count the number of matches
    let match_count = re.find_iter(str_res).count();
    // Assert that the number of matches is equal to the expected number of matches
    assert_eq!(
        match_count, expect_match,
        "regex: {re_str} - expected match count: {expect_match}, got {match_count}\nFailed to match on:\n{str_res}"
    );
    Ok(())
}

/// Helper function takes in the output of stderr and asserts that there are no errors or warnings
pub fn assert_no_errors_or_warn(
    stderr_byte_output: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    match_on_out_no_case(stderr_byte_output, r"(?m)^error ", 0)?;
    match_on_out_no_case(stderr_byte_output, r"(?m)^warn ", 0)?;
    Ok(())
}

/// Create a readout checks TOML file with `toml_content` at the specified `toml_path` path
pub fn create_readout_checks_toml(
    toml_content: &str,
    toml_path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut checks_file = std::fs::File::create(toml_path)?;
    checks_file.write_all(toml_content.as_bytes())?;
    checks_file.sync_all()?;

    Ok(())
}

/// Remove the terminal styling from the output, the report is always styled
fn strip_styling(byte_output: &[u8]) -> String {
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    Regex::new(r"\x1b\[[0-9;]*m")
        .unwrap()
        .replace_all(str_res, "")
        .into_owned()
}

/// Helper to build a case-insensitive regex pattern and assert that there's a match
/// Used to check for a report row ending in some value (e.g. "total cycles" followed by "3")
fn match_count_suffix(
    haystack: &str,
    pre_re: &str,
    expect_cnt: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    // Build regex pattern
    let re = RegexBuilder::new(&format!(r"{pre_re}\s+{expect_cnt}\b"))
        .case_insensitive(true)
        .build()
        .unwrap();
    assert!(
        re.is_match(haystack),
        "regex: {re}\nFailed to match on:\n{haystack}"
    );
    Ok(())
}

/// Assert that the global stats of the report match the expected values
pub fn assert_global_stats_report(
    byte_output: &[u8],
    total_errors: u64,
    cycles: u64,
    frames: u64,
    valid_frames: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = strip_styling(byte_output);

    // Check that the output contains the expected values (short circuits on first failure)
    match_count_suffix(&report, "total errors", total_errors)?;
    match_count_suffix(&report, "total cycles", cycles)?;
    match_count_suffix(&report, "total frames", frames)?;
    match_count_suffix(&report, "valid frames", valid_frames)?;
    Ok(())
}

/// Assert that a row of the report has the expected count
pub fn assert_report_row(
    byte_output: &[u8],
    row: &str,
    expect_cnt: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    match_count_suffix(&strip_styling(byte_output), row, expect_cnt)
}

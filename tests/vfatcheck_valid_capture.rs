use crate::util::*;
mod util;

fn valid_capture(tmp_d: &TempDir) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    write_capture(
        tmp_d,
        "valid.vfat",
        &[good_cycle(0), good_cycle(1), good_cycle(2)],
    )
}

#[test]
fn check_all() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("check").arg("all");
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    assert_global_stats_report(&output.stdout, 0, 3, 36, 36)?;
    assert_report_row(&output.stdout, "positions", 12)?;
    assert_report_row(&output.stdout, "channel hits", 36)?;
    assert_report_row(&output.stdout, "format version", 1)?;
    match_on_out_no_case(&output.stdout, "counter consensus", 1)?;

    Ok(())
}

#[test]
fn check_sanity() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("check").arg("sanity");
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    assert_global_stats_report(&output.stdout, 0, 3, 36, 36)?;
    // No consensus is attempted in sanity mode
    match_on_out_no_case(&output.stdout, "counter consensus", 0)?;

    Ok(())
}

#[test]
fn check_all_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg("check").arg("all").pipe_stdin(&capture)?;
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    assert_global_stats_report(&output.stdout, 0, 3, 36, 36)?;

    Ok(())
}

#[test]
fn no_command_counts_cycles() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture);
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    assert_report_row(&output.stdout, "total cycles", 3)?;
    assert_report_row(&output.stdout, "total frames", 36)?;

    Ok(())
}

#[test]
fn check_all_trace_verbosity() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("check").arg("all").arg("-v4");
    cmd.assert().success();

    let output = cmd.output()?;
    // Every frame agrees with the majority, one debug line per frame per counter per cycle
    match_on_out_no_case(&output.stderr, r"EC: 1:200:0:3:\d+ reports \d+, agrees", 36)?;
    match_on_out_no_case(&output.stderr, r"BC: 1:200:0:3:\d+ reports 1234, agrees", 36)?;
    match_on_out_no_case(&output.stderr, r"(?m)^error ", 0)?;

    Ok(())
}

#[test]
fn stats_output_json_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture)
        .arg("check")
        .arg("all")
        .arg("-S")
        .arg("stdout")
        .arg("-D")
        .arg("json");
    cmd.assert().success();

    let output = cmd.output()?;
    let stats: vfatcheck::stats::stats_collector::StatsCollector =
        serde_json::from_slice(&output.stdout)?;
    assert_eq!(stats.cycles_seen(), 3);
    assert_eq!(stats.frame_stats().frames_seen(), 36);
    assert_eq!(stats.format_version(), Some(1));
    assert_eq!(stats.err_count(), 0);

    Ok(())
}

#[test]
fn stats_output_toml_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = valid_capture(&tmp_d)?;
    let stats_file = tmp_d.child("stats.toml");
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture)
        .arg("check")
        .arg("all")
        .arg("-S")
        .arg(stats_file.path())
        .arg("-D")
        .arg("toml");
    cmd.assert().success();

    // The report is still printed when the stats go to a file
    assert_report_row(&cmd.output()?.stdout, "total cycles", 3)?;
    let stats: vfatcheck::stats::stats_collector::StatsCollector =
        toml::from_str(&std::fs::read_to_string(stats_file.path())?)?;
    assert_eq!(stats.cycles_seen(), 3);

    Ok(())
}

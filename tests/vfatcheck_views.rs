use crate::util::*;
mod util;

#[test]
fn view_frames() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = write_capture(&tmp_d, "views.vfat", &[good_cycle(0), good_cycle(1)])?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("view").arg("frames").arg("-d");
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    match_on_output(&output.stdout, r"Cycle \d \(12 frames\)", 2)?;
    match_on_output(
        &output.stdout,
        &format!(r"(?m)^\s+{:X}: Cycle 1 ", frame_mem_pos(1, 0) - 8),
        1,
    )?;
    match_on_output(&output.stdout, r"1:200:0:3:\d+ ", 24)?;
    // No report in view mode
    match_on_out_no_case(&output.stdout, "total cycles", 0)?;

    Ok(())
}

#[test]
fn view_frames_binary() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = write_capture(&tmp_d, "views.vfat", &[good_cycle(0)])?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("view").arg("frames-binary").arg("-d");
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    match_on_output(&output.stdout, r"Cycle 0 \(12 frames\)", 1)?;
    // The BC word of every frame
    match_on_output(&output.stdout, r"11: 1010\|0100\|1101\|0010\|", 12)?;

    Ok(())
}

#[test]
fn view_status() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = write_capture(&tmp_d, "views.vfat", &[good_cycle(0), good_cycle(5)])?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("view").arg("status").arg("-d");
    cmd.assert().success();

    let output = cmd.output()?;
    assert_no_errors_or_warn(&output.stderr)?;
    match_on_output(&output.stdout, "MEMORY +POSITION +ID +EC +BC +STATUS", 1)?;
    match_on_output(&output.stdout, r"(?m)\s+5\s+1234  ok$", 12)?;
    match_on_output(&output.stdout, r"(?m) ok$", 24)?;

    Ok(())
}

#[test]
fn view_status_styled() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_d = TempDir::new()?;
    let capture = write_capture(&tmp_d, "views.vfat", &[good_cycle(0)])?;
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg(&capture).arg("view").arg("status");
    // Styling codes are in the output
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\x1b["));

    Ok(())
}

//! Contains the entry point and dispatcher function [generate_view()] for generating data views.

use super::{
    frame_view::{frame_binary_view, frame_view},
    status_view::status_view,
};
use crate::util::*;

/// Calls a specific view generator based on the [View][crate::config::view::ViewCommands] type.
#[inline]
pub fn generate_view(
    view: ViewCommands,
    cycles: &[Cycle],
    disable_styled_view: bool,
) -> Result<(), Box<dyn error::Error>> {
    let mut stdio_lock = io::stdout().lock();
    write_view(view, cycles, disable_styled_view, &mut stdio_lock)?;
    Ok(())
}

pub(crate) fn write_view(
    view: ViewCommands,
    cycles: &[Cycle],
    disable_styled_view: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    match view {
        ViewCommands::Frames => frame_view(cycles, disable_styled_view, out),
        ViewCommands::FramesBinary => frame_binary_view(cycles, disable_styled_view, out),
        ViewCommands::Status => status_view(cycles, disable_styled_view, out),
    }
}

/// Formats the header line of a cycle.
pub(crate) fn cycle_header(cycle: &Cycle, disable_styled_view: bool) -> String {
    let text = format!(
        "{mem_pos:>8X}: Cycle {id} ({frames} frames)",
        mem_pos = cycle.mem_pos,
        id = cycle.id,
        frames = cycle.frames.len()
    );
    if disable_styled_view {
        text
    } else {
        text.bold().bright_yellow().to_string()
    }
}

/// Formats the memory position and readout position that starts every frame line.
pub(crate) fn frame_prefix(record: &FrameRecord, disable_styled_view: bool) -> String {
    let position = record.position.to_string();
    if disable_styled_view {
        format!("{mem_pos:>8X}: {position:<14} ", mem_pos = record.mem_pos)
    } else {
        format!(
            "{memory_position}{position} ",
            memory_position = format_args!("{:>8X}: ", record.mem_pos)
                .bg_rgb::<51, 0, 51>()
                .bold(),
            position = format_args!("{position:<14}").bright_cyan()
        )
    }
}

use crate::util::*;

pub(crate) fn frame_view(
    cycles: &[Cycle],
    disable_styled_view: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    for cycle in cycles {
        writeln!(out, "{}", super::lib::cycle_header(cycle, disable_styled_view))?;
        for record in &cycle.frames {
            writeln!(
                out,
                "{prefix}{frame}",
                prefix = super::lib::frame_prefix(record, disable_styled_view),
                frame = record.frame
            )?;
        }
    }
    Ok(())
}

pub(crate) fn frame_binary_view(
    cycles: &[Cycle],
    disable_styled_view: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    for cycle in cycles {
        writeln!(out, "{}", super::lib::cycle_header(cycle, disable_styled_view))?;
        for record in &cycle.frames {
            writeln!(out, "{}", super::lib::frame_prefix(record, disable_styled_view))?;
            write!(out, "{}", record.frame.binary_view())?;
        }
    }
    Ok(())
}

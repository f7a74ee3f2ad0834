use crate::util::*;

const STATUS_HEADER: &str = "MEMORY    POSITION       ID     EC   BC    STATUS";

pub(crate) fn status_view(
    cycles: &[Cycle],
    disable_styled_view: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    if disable_styled_view {
        writeln!(out, "{STATUS_HEADER}")?;
    } else {
        writeln!(out, "{}", STATUS_HEADER.bold().underline())?;
    }
    for cycle in cycles {
        writeln!(out, "{}", super::lib::cycle_header(cycle, disable_styled_view))?;
        for record in &cycle.frames {
            let validity = FRAME_VALIDATOR.validate(&record.frame);
            let status = VfatStatus::from_validity(validity);
            let status_str = if disable_styled_view {
                status.to_string()
            } else if status.is_ok() {
                status.green().to_string()
            } else {
                status.red().to_string()
            };
            writeln!(
                out,
                "{prefix}{id:#05X}  {ec:>3}  {bc:>4}  {status_str}",
                prefix = super::lib::frame_prefix(record, disable_styled_view),
                id = record.frame.chip_id(),
                ec = record.frame.ec(),
                bc = record.frame.bc(),
            )?;
        }
    }
    Ok(())
}

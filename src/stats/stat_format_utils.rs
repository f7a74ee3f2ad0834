use crate::util::*;

/// Used for formatting fields that potentially produces many values.
const MAX_LINE_WIDTH: usize = 60;
/// Positions listed in a single report cell before the rest are summarized.
const MAX_POSITION_LINES: usize = 4;

/// Format error codes, 5 per line.
pub(crate) fn format_error_codes(error_codes: &[String]) -> String {
    error_codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            if i > 0 && i % 5 == 0 {
                format!("\nE{code} ")
            } else {
                format!("E{code} ")
            }
        })
        .collect()
}

/// Format the positions that had errors, wrapped at [MAX_LINE_WIDTH] and cut off after [MAX_POSITION_LINES] lines.
pub(crate) fn format_positions_with_errors(positions: &[FramePosition]) -> String {
    if positions.is_empty() {
        return "none".green().to_string();
    }
    let mut result = String::new();
    let mut line_width = 0;
    let mut line_count = 0;
    for (i, pos) in positions.iter().enumerate() {
        let pos_str = format!("{pos} ");
        if line_width + pos_str.len() > MAX_LINE_WIDTH {
            line_count += 1;
            if line_count >= MAX_POSITION_LINES {
                result.push_str(&format!("... {} more", positions.len() - i).yellow().to_string());
                break;
            }
            result.push('\n');
            line_width = 0;
        }
        line_width += pos_str.len();
        result.push_str(&pos_str.red().to_string());
    }
    result
}

/// Format a count as a percentage of a total, `-` if the total is zero.
pub(crate) fn format_percentage(count: u64, total: u64) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.2} %", count as f64 / total as f64 * 100_f64)
}

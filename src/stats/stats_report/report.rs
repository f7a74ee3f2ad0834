//! The [Report] structures the summary printed by the [Controller](crate::controller::Controller) at the end of execution
//!
//! Report contains several [StatSummary] rows that are used to generate the report table
use super::table_formatter_utils::{
    format_global_stats_sub_table, format_sub_table, format_super_table, SubtableColor,
};
use owo_colors::OwoColorize;
use tabled::{
    settings::{object::Rows, Alignment, Format, Modify, Panel, Style},
    Table, Tabled,
};

/// Describes the columns of the report table
#[derive(Tabled, Default)]
pub struct StatSummary {
    pub(crate) statistic: String,
    pub(crate) value: String,
    pub(crate) notes: String,
}

impl StatSummary {
    /// Create a row, notes default to an empty string
    pub fn new(statistic: impl Into<String>, value: impl ToString, notes: Option<String>) -> Self {
        Self {
            statistic: statistic.into(),
            value: value.to_string(),
            notes: notes.unwrap_or_default(),
        }
    }
}

/// Describes the columns of the counter consensus table
#[derive(Tabled)]
pub struct ConsensusSummary {
    pub(crate) counter: String,
    pub(crate) consensus: u64,
    pub(crate) weak: u64,
    pub(crate) insufficient: u64,
    pub(crate) mismatches: u64,
}

/// Describes the columns of the detected attributes table
#[derive(Tabled)]
struct DetectedAttribute {
    attribute: String,
    detected: String,
}

/// The Report struct is used by the Controller to structure the report printed at the end of execution
///
/// Contains convenience methods to add stats to the report, and to generate the report table
pub struct Report {
    stats: Vec<StatSummary>,
    frame_status: Vec<StatSummary>,
    consensus: Vec<ConsensusSummary>,
    detected_attributes: Vec<DetectedAttribute>,
    processing_time: std::time::Duration,
    fatal_error: Option<String>,
    report_table: Option<Table>,
}

impl Report {
    #[allow(missing_docs)]
    pub fn new(processing_time: std::time::Duration) -> Self {
        Self {
            stats: Vec::new(),
            frame_status: Vec::new(),
            consensus: Vec::new(),
            detected_attributes: Vec::new(),
            processing_time,
            fatal_error: None,
            report_table: None,
        }
    }

    /// Add a row to the global stats
    pub fn add_stat(&mut self, stat: StatSummary) {
        self.stats.push(stat);
    }

    /// Add a row to the frame status table
    pub fn add_frame_status(&mut self, stat: StatSummary) {
        self.frame_status.push(stat);
    }

    /// Add a row to the counter consensus table
    pub fn add_consensus(&mut self, summary: ConsensusSummary) {
        self.consensus.push(summary);
    }

    #[allow(missing_docs)]
    pub fn add_detected_attribute(&mut self, attribute: String, detected: String) {
        self.detected_attributes.push(DetectedAttribute {
            attribute,
            detected,
        });
    }

    #[allow(missing_docs)]
    pub fn add_fatal_error(&mut self, error: String) {
        self.fatal_error = Some(error);
    }

    /// Build the report table, subsequent calls return the same table.
    pub fn format(&mut self) -> &Table {
        if self.report_table.is_none() {
            self.report_table = Some(self.build_table());
        }
        self.report_table.as_ref().expect("Report table was just built")
    }

    fn build_table(&self) -> Table {
        let mut global_stats_table = Table::new(&self.stats);
        format_global_stats_sub_table(&mut global_stats_table);

        let detected_attributes_table = format_sub_table(
            Table::new(&self.detected_attributes),
            "Detected Attributes",
            SubtableColor::Yellow,
        );

        let frame_status_table = (!self.frame_status.is_empty()).then(|| {
            format_sub_table(
                Table::new(&self.frame_status),
                "Frame Status",
                SubtableColor::Purple,
            )
        });
        let consensus_table = (!self.consensus.is_empty()).then(|| {
            format_sub_table(
                Table::new(&self.consensus),
                "Counter Consensus",
                SubtableColor::Blue,
            )
        });

        let mut multi_table = match (frame_status_table, consensus_table) {
            (Some(frame_status), Some(consensus)) => tabled::col![
                global_stats_table,
                tabled::row![detected_attributes_table, frame_status],
                consensus
            ],
            (Some(sub_table), None) | (None, Some(sub_table)) => tabled::col![
                global_stats_table,
                tabled::row![detected_attributes_table, sub_table]
            ],
            (None, None) => {
                tabled::col![global_stats_table, tabled::row![detected_attributes_table]]
            }
        };
        let _ = multi_table.with(Style::rounded());
        let mut report_table = format_super_table(&multi_table, self.processing_time);

        if self.fatal_error.is_some() {
            let _ = report_table
                .with(Panel::header("FATAL ERROR - EARLY TERMINATION"))
                .with(
                    Modify::new(Rows::single(0))
                        .with(Alignment::center())
                        .with(Format::content(|x| x.to_uppercase().red().to_string())),
                );
        }
        report_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_contains_global_stats() {
        let mut report = Report::new(std::time::Duration::from_millis(3));
        report.add_stat(StatSummary::new("Total Errors", 0, None));
        report.add_stat(StatSummary::new("Total Cycles", 725800, None));
        report.add_detected_attribute("Format Version".to_string(), "1".to_string());

        let table = report.format().to_string();
        assert!(table.contains("Total Cycles"));
        assert!(table.contains("725800"));
        assert!(table.contains("Format Version"));
        assert!(!table.contains("FATAL"));
    }

    #[test]
    fn report_contains_sub_tables() {
        let mut report = Report::new(std::time::Duration::from_millis(3));
        report.add_stat(StatSummary::new("Total Frames", 12, None));
        report.add_frame_status(StatSummary::new("CRC errors", 2, None));
        report.add_consensus(ConsensusSummary {
            counter: "EC".to_string(),
            consensus: 10,
            weak: 1,
            insufficient: 0,
            mismatches: 3,
        });

        let table = report.format().to_string();
        assert!(table.contains("CRC errors"), "{table}");
        assert!(table.contains("mismatches"), "{table}");
        // Sub table column names are underlined with a double line
        assert!(table.contains('═'), "{table}");
    }

    #[test]
    fn test_fatal_error_report() {
        let mut report = Report::new(std::time::Duration::from_millis(3));
        report.add_fatal_error("Fatal Error happened".to_string());

        let table = report.format().to_string();
        assert!(table.contains("FATAL ERROR - EARLY TERMINATION"), "{table}");
    }

    #[test]
    fn stats_summary_default() {
        let stats_summary = StatSummary::default();

        assert_eq!(stats_summary.statistic, "");
        assert_eq!(stats_summary.value, "");
        assert_eq!(stats_summary.notes, "");
    }
}

pub mod report;
mod table_formatter_utils;

use super::stat_format_utils::{format_error_codes, format_percentage, format_positions_with_errors};
use crate::util::*;
use report::ConsensusSummary;

/// Helper function that makes the report
pub fn make_report(
    processing_time: Duration,
    stats_collector: &mut StatsCollector,
    mute_errors: bool,
) -> Report {
    stats_collector.finalize(mute_errors);

    let mut report = Report::new(processing_time);

    if let Some(fatal_err) = stats_collector.take_fatal_err() {
        report.add_fatal_error(fatal_err.into_string());
    }

    add_global_stats_to_report(&mut report, stats_collector);
    add_frame_status_to_report(&mut report, stats_collector.frame_stats().status());
    add_consensus_to_report(&mut report, stats_collector);
    add_detected_attributes_to_report(&mut report, stats_collector);

    report
}

/// Helper function that adds the global stats to the report
fn add_global_stats_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    if stats_collector.err_count() == 0 {
        report.add_stat(StatSummary::new(
            "Total Errors".green().to_string(),
            stats_collector.err_count().green(),
            None,
        ));
    } else {
        report.add_stat(StatSummary::new(
            "Total Errors".red().to_string(),
            stats_collector.err_count().red(),
            Some(format_error_codes(stats_collector.unique_error_codes_as_slice())),
        ));
    }

    let frame_stats = stats_collector.frame_stats();
    report.add_stat(StatSummary::new("Total Cycles", frame_stats.cycles_seen(), None));
    report.add_stat(StatSummary::new("Total Frames", frame_stats.frames_seen(), None));
    report.add_stat(StatSummary::new(
        "Valid Frames",
        frame_stats.valid_frames(),
        Some(format_percentage(frame_stats.valid_frames(), frame_stats.frames_seen())),
    ));

    if let Some(positions) = stats_collector.position_summary() {
        report.add_stat(StatSummary::new(
            "Positions",
            positions.positions_seen,
            Some(format_positions_with_errors(
                stats_collector.positions_with_errors_as_slice(),
            )),
        ));
        report.add_stat(StatSummary::new("Channel Hits", positions.channel_hits, None));
    }

    if frame_stats.unknown_positions() > 0 {
        report.add_stat(StatSummary::new(
            "Unknown Positions".yellow().to_string(),
            frame_stats.unknown_positions(),
            Some("Frames from positions not in the VFAT mapping".to_string()),
        ));
    }
    if frame_stats.duplicates() > 0 {
        report.add_stat(StatSummary::new(
            "Duplicate Frames".yellow().to_string(),
            frame_stats.duplicates(),
            None,
        ));
    }
}

fn add_frame_status_to_report(report: &mut Report, status: &StatusCounts) {
    if status.total() == 0 {
        return;
    }
    [
        ("Missing", status.missing),
        ("Chip ID mismatch", status.id_mismatch),
        ("Footprint errors", status.footprint),
        ("CRC errors", status.crc),
        ("EC mismatch", status.ec_progress),
        ("BC mismatch", status.bc_progress),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .for_each(|(name, count)| report.add_frame_status(StatSummary::new(name, count, None)));
}

fn add_consensus_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    for kind in [CounterKind::Ec, CounterKind::Bc] {
        let stats = stats_collector.consensus_stats(kind);
        if stats.verdicts() == 0 {
            continue;
        }
        report.add_consensus(ConsensusSummary {
            counter: kind.to_string(),
            consensus: stats.consensus(),
            weak: stats.weak_majority(),
            insufficient: stats.insufficient(),
            mismatches: stats.mismatches(),
        });
    }
}

// Helper function that adds the detected attributes to the report
fn add_detected_attributes_to_report(report: &mut Report, stats_collector: &StatsCollector) {
    report.add_detected_attribute(
        "Format Version".to_string(),
        match stats_collector.format_version() {
            Some(version) => version.to_string(),
            None => String::from("none").red().to_string(),
        },
    );
}

//! Contains the [ErrorStats] struct which stores error messages observed in the capture and related data
use crate::util::*;

/// Stores error messages observed during analysis
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    fatal_error: Option<Box<str>>,
    reported_errors: Vec<Box<str>>,
    total_errors: u64,
    unique_error_codes: Option<Vec<String>>,
    positions_with_errors: Option<Vec<FramePosition>>,
}

impl ErrorStats {
    /// If data processing is done, sort error messages, extract unique error codes and the positions named in them.
    pub(super) fn finalize_stats(&mut self, mute_errors: bool) {
        if !mute_errors {
            // Sort stats by memory position where they were found before consuming them
            self.sort_error_msgs_by_mem_pos();
        }
        self.process_unique_error_codes();
        self.process_positions_with_errors();
    }

    pub(super) fn sort_error_msgs_by_mem_pos(&mut self) {
        let re = Regex::new(r"^0x(?<mem_pos>[0-9A-F]+)").unwrap();
        // Messages without a memory position go last
        self.reported_errors.sort_by_cached_key(|e| {
            re.captures(e)
                .and_then(|addr| u64::from_str_radix(&addr["mem_pos"], 16).ok())
                .unwrap_or(u64::MAX)
        });
    }

    pub(super) fn process_unique_error_codes(&mut self) {
        if !self.reported_errors.is_empty() {
            self.unique_error_codes = Some(extract_unique_error_codes(&self.reported_errors));
        }
    }

    pub(super) fn process_positions_with_errors(&mut self) {
        if self.positions_with_errors.is_some() {
            return;
        }
        let re = Regex::new(r"at (?P<position>\d+:\d+:\d+:\d+:\d+)").unwrap();
        let positions: Vec<FramePosition> = self
            .reported_errors
            .iter()
            .filter_map(|err_msg| re.captures(err_msg))
            .filter_map(|cap| cap["position"].parse::<FramePosition>().ok())
            .sorted_unstable()
            .dedup()
            .collect();
        self.positions_with_errors = Some(positions);
    }

    pub(super) fn err_count(&self) -> u64 {
        self.total_errors
    }

    pub(super) fn add_err(&mut self, error_msg: Box<str>) {
        self.total_errors += 1;
        self.reported_errors.push(error_msg);
    }

    pub(super) fn add_fatal_err(&mut self, error_msg: Box<str>) {
        self.fatal_error = Some(error_msg);
    }

    pub(super) fn any_fatal_err(&self) -> bool {
        self.fatal_error.is_some()
    }

    pub(super) fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.fatal_error.take()
    }

    /// Unique error codes of the reported errors, empty until finalized or if there were no errors.
    pub fn unique_error_codes_as_slice(&self) -> &[String] {
        self.unique_error_codes.as_deref().unwrap_or_default()
    }

    /// Positions named in the reported errors, empty until finalized or if there were no errors.
    pub fn positions_with_errors_as_slice(&self) -> &[FramePosition] {
        self.positions_with_errors.as_deref().unwrap_or_default()
    }

    /// Return an iterator over all error messages
    pub fn errors_as_slice_iter(&self) -> impl Iterator<Item = &Box<str>> {
        self.reported_errors.iter().chain(self.fatal_error.iter())
    }
}

fn extract_unique_error_codes(error_messages: &[Box<str>]) -> Vec<String> {
    let re = Regex::new(r"\[E(?P<err_code>[0-9]{2,4})\]").unwrap();
    error_messages
        .iter()
        .flat_map(|err_msg| {
            re.captures_iter(err_msg)
                .map(|m| m["err_code"].to_string())
                .collect::<Vec<String>>()
        })
        .unique()
        .collect()
}

//! Contains the [ErrPrinter] that prints error messages in accordance to a given configuration

use crate::util::*;

/// Prints error messages in accordance to a given configuration
#[derive(Debug, Default)]
pub struct ErrPrinter<'a> {
    max_errors: Option<u32>,
    error_code_filter: Option<&'a [String]>,
}

impl<'a> ErrPrinter<'a> {
    /// Create a new [ErrPrinter] with the given configuration
    pub fn new(max_errors: Option<u32>, error_code_filter: Option<&'a [String]>) -> Self {
        Self {
            max_errors,
            error_code_filter,
        }
    }

    /// Print the error messages in accordance to the configuration
    ///
    /// If an error code filter is supplied, only errors matching the filter are displayed.
    /// If the max errors is set, only the first `max_errors` are displayed.
    ///
    /// The unique error codes are used to minify the error code filter to avoid doing unnecessary comparisons
    pub fn print<'b, E: Iterator<Item = &'b Box<str>>>(&self, err_msgs: E, unique_error_codes: &[String]) {
        for err_msg in self.select(err_msgs, unique_error_codes) {
            crate::display_error(err_msg);
        }
    }

    /// The messages [ErrPrinter::print] displays.
    pub fn select<'b, E: Iterator<Item = &'b Box<str>>>(
        &self,
        err_msgs: E,
        unique_error_codes: &[String],
    ) -> Vec<&'b Box<str>> {
        let limit = self.max_errors.map_or(usize::MAX, |max| max as usize);
        match self.error_code_filter {
            Some(filter) => {
                let filter = minify_filter(filter, unique_error_codes);
                if filter.is_empty() {
                    return Vec::new();
                }
                filter_error_msgs(&filter, err_msgs).take(limit).collect()
            }
            None => err_msgs.take(limit).collect(),
        }
    }
}

// Reduce the error code filter to codes that were actually seen in the error messages
fn minify_filter(error_code_filter: &[String], unique_error_codes: &[String]) -> Vec<String> {
    error_code_filter
        .iter()
        .filter(|ec| unique_error_codes.contains(ec))
        .map_into()
        .collect()
}

fn filter_error_msgs<'b, 'f, E: Iterator<Item = &'b Box<str>> + 'f>(
    ec_filter: &'f [String],
    err_msgs: E,
) -> impl Iterator<Item = &'b Box<str>> + 'f {
    let re = Regex::new(r"\[E(?P<err_code>[0-9]+)\]").unwrap();
    err_msgs.filter(move |err_msg| {
        re.captures(err_msg)
            .is_some_and(|cap| ec_filter.iter().any(|ec| ec == &cap["err_code"]))
    })
}

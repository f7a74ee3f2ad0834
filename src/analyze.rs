//! Contains modules for analyzing the data. Displaying the data in a human readable format or performing data validation.

pub mod cycle;
pub mod lib;
pub mod registry;
pub mod validators;
pub mod view;

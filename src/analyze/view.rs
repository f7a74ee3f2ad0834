//! Contains the views of the frames in a capture, selected with the `view` subcommand.

pub mod frame_view;
pub mod lib;
pub mod status_view;

//! Word definitions and decoding of the VFAT readout data

pub mod frame_position;
pub mod vfat_frame;
pub mod vfat_status;

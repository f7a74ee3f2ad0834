//! Contains the validators used by the [CycleAnalyzer](super::cycle::CycleAnalyzer): frame structure, chip identity, cycle counter consensus and the capture header.

pub mod capture_header;
pub mod counter_consensus;
pub mod vfat_frame;

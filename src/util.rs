//! Miscellaneous utility functions
pub mod lib;

pub(crate) use {
    crate::{
        analyze::{
            registry::{PositionRecord, PositionRegistry, PositionSummary},
            validators::{
                capture_header::CaptureHeaderValidator,
                counter_consensus::{CounterConsensus, CounterKind, Verdict},
                vfat_frame::{FrameValidity, FRAME_VALIDATOR},
            },
        },
        config::{prelude::*, Cfg},
        input::capture::{CaptureHeader, CaptureScanner, Cycle, FrameRecord},
        stats::{
            self,
            stats_collector::{
                frame_stats::{CycleStats, StatusCounts},
                StatsCollector,
            },
            stats_report::report::{Report, StatSummary},
            StatType,
        },
        words::{frame_position::FramePosition, vfat_frame::VfatFrame, vfat_status::VfatStatus},
    },
    byteorder::{ByteOrder, LittleEndian},
    clap::builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    crossbeam_channel, flume,
    indicatif::{ProgressBar, ProgressStyle},
    itertools::Itertools,
    owo_colors::OwoColorize,
    regex::Regex,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        error, fmt, fs,
        io::{self, Write},
        path::{Path, PathBuf},
        process::ExitCode,
        str::FromStr,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, OnceLock,
        },
        thread::{self, Builder, JoinHandle},
        time::{Duration, Instant},
    },
};

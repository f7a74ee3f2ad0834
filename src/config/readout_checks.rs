//! Contains the [ReadoutChecks] that configure the checks from a TOML file, and the [ReadoutChecksOpt] trait to access them.
//!
//! All keys are optional, an empty file enables every check with the default thresholds and no readout mapping.
//! A template with all keys commented out is generated by [ReadoutChecks::to_string_pretty_toml].

use crate::util::*;
use crate::words::vfat_frame::CHANNEL_COUNT;
use std::collections::BTreeSet;

/// Default minimum number of frames for the counter consensus
pub const DEFAULT_MIN_SAMPLES: usize = 10;
/// Default minimum fraction of the frames that have to agree on the majority value
pub const DEFAULT_MIN_FRACTION: f64 = 0.6;

/// How the outcome of a check is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Check is not performed
    Off,
    /// Failures are logged as warnings
    Warn,
    /// Failures are reported as errors
    #[default]
    Err,
}

impl TestMode {
    /// True unless the check is turned off.
    pub fn enabled(self) -> bool {
        self != TestMode::Off
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMode::Off => write!(f, "off"),
            TestMode::Warn => write!(f, "warn"),
            TestMode::Err => write!(f, "err"),
        }
    }
}

/// Settings for one counter consensus check (EC or BC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsensusCheck {
    /// How mismatches are handled
    pub test: TestMode,
    /// Distinct frames needed to attempt a consensus
    pub min_samples: usize,
    /// Share of the frames the majority value needs
    pub min_fraction: f64,
}

impl Default for ConsensusCheck {
    fn default() -> Self {
        Self {
            test: TestMode::default(),
            min_samples: DEFAULT_MIN_SAMPLES,
            min_fraction: DEFAULT_MIN_FRACTION,
        }
    }
}

/// Channels left out of the analysis for one chip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisMask {
    /// Drop every channel
    pub full: bool,
    /// Channels to drop
    pub channels: Vec<u8>,
}

impl AnalysisMask {
    /// Remove the masked channels from a list of active channels.
    pub fn apply(&self, mut active: Vec<u8>) -> Vec<u8> {
        if self.full {
            active.clear();
        } else if !self.channels.is_empty() {
            active.retain(|ch| !self.channels.contains(ch));
        }
        active
    }

    /// True if the mask drops nothing.
    pub fn is_empty(&self) -> bool {
        !self.full && self.channels.is_empty()
    }
}

/// An expected chip in the readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VfatMapping {
    /// Readout position of the chip
    pub position: FramePosition,
    /// Hardware ID, the low 12 bits are compared against the chip ID of the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_id: Option<u16>,
    /// Analysis mask
    #[serde(default, skip_serializing_if = "AnalysisMask::is_empty")]
    pub mask: AnalysisMask,
}

/// Checks configuration deserialized from a TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadoutChecks {
    /// Footprint check mode
    pub test_footprint: TestMode,
    /// CRC check mode
    pub test_crc: TestMode,
    /// Chip ID check mode
    pub test_id: TestMode,
    /// EC consensus settings
    pub ec_check: ConsensusCheck,
    /// BC consensus settings
    pub bc_check: ConsensusCheck,
    /// Readout mapping
    pub vfat: Vec<VfatMapping>,
}

impl ReadoutChecks {
    /// Parse and validate a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, String> {
        let checks: Self = toml::from_str(toml_str).map_err(|e| e.to_string())?;
        checks.validate()?;
        Ok(checks)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let toml_str = fs::read_to_string(path).map_err(|e| {
            format!(
                "Failed to read checks TOML file {path}: {e}",
                path = path.display()
            )
        })?;
        Self::from_toml_str(&toml_str).map_err(|e| {
            format!(
                "Invalid checks TOML file {path}: {e}",
                path = path.display()
            )
        })
    }

    /// Validate the values that the types alone do not restrict.
    pub fn validate(&self) -> Result<(), String> {
        for (name, check) in [("ec_check", &self.ec_check), ("bc_check", &self.bc_check)] {
            if !(0.0..=1.0).contains(&check.min_fraction) {
                return Err(format!(
                    "{name}.min_fraction must be within 0 and 1, got {}",
                    check.min_fraction
                ));
            }
        }
        let mut seen = BTreeSet::new();
        for mapping in &self.vfat {
            if !seen.insert(mapping.position) {
                return Err(format!(
                    "Position {} is mapped more than once",
                    mapping.position
                ));
            }
            if let Some(ch) = mapping
                .mask
                .channels
                .iter()
                .find(|&&ch| usize::from(ch) >= CHANNEL_COUNT)
            {
                return Err(format!(
                    "Mask of position {} has channel {ch}, channels are 0-{}",
                    mapping.position,
                    CHANNEL_COUNT - 1
                ));
            }
        }
        Ok(())
    }

    /// Settings of the consensus check for a counter kind.
    pub fn consensus_check(&self, kind: CounterKind) -> &ConsensusCheck {
        match kind {
            CounterKind::Ec => &self.ec_check,
            CounterKind::Bc => &self.bc_check,
        }
    }

    /// The mapping entry of a position, if any.
    pub fn mapping(&self, position: FramePosition) -> Option<&VfatMapping> {
        self.vfat.iter().find(|m| m.position == position)
    }

    /// Generates a TOML template with descriptions and all keys commented out.
    ///
    /// The keys come from serializing the checks, with an example mapping entry if there is none.
    /// Deserializing the template without edits gives [ReadoutChecks::default].
    pub fn to_string_pretty_toml(&self) -> Result<String, String> {
        let mut example = self.clone();
        if example.vfat.is_empty() {
            example.vfat.push(VfatMapping {
                position: FramePosition::new(1, 200, 0, 3, 12),
                hw_id: Some(0x0ABC),
                mask: AnalysisMask {
                    full: false,
                    channels: vec![3, 77],
                },
            });
        }
        let serialized = toml::to_string(&example)
            .map_err(|e| format!("Failed to serialize checks template: {e}"))?;

        let mut toml_string = String::new();
        for (path, line) in toml_paths(&serialized) {
            if line.trim().is_empty() {
                toml_string.push('\n');
                continue;
            }
            if let Some(description) = path.as_deref().and_then(key_description) {
                description
                    .lines()
                    .for_each(|desc_line| toml_string.push_str(&format!("# {desc_line}\n")));
            }
            toml_string.push('#');
            toml_string.push_str(line);
            toml_string.push('\n');
        }
        Ok(toml_string)
    }
}

const TEST_MODES: &str = "One of: \"off\", \"warn\", \"err\"";

/// Template descriptions by dotted key path, a leaf key name applies to every table without its own entry.
const KEY_DESCRIPTIONS: &[(&str, &str)] = &[
    ("test_footprint", "Check of the fixed marker bits in the ID, EC and BC words"),
    ("test_crc", "Check of the frame checksum, frames with DAQ error flags also fail it"),
    ("test_id", "Check of the chip ID against `hw_id` of the mapped position"),
    ("ec_check", "Consensus of the event counter (EC) across the frames of a cycle"),
    ("bc_check", "Consensus of the bunch crossing counter (BC) across the frames of a cycle"),
    ("test", "How frames that disagree with the majority are handled"),
    ("min_samples", "Frames needed to attempt a consensus"),
    ("min_fraction", "Share of the frames that has to agree on the majority value"),
    (
        "vfat",
        "Readout mapping, one entry per expected chip\n\
         Unlisted positions are reported as unknown, listed positions absent from a cycle as missing\n\
         Example:",
    ),
    ("vfat.position", "Readout position as \"subsystem:TOTFED:OptoRx:GOH:index\""),
    ("vfat.hw_id", "Hardware ID, the low 12 bits are compared against the chip ID"),
    ("vfat.mask", "Channels left out of the analysis"),
    ("vfat.mask.full", "Drop every channel of the chip"),
    ("vfat.mask.channels", "Channels to drop, 0-127"),
];

fn key_description(path: &str) -> Option<String> {
    let lookup = |key: &str| {
        KEY_DESCRIPTIONS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, description)| *description)
    };
    let leaf = path.rsplit('.').next().unwrap_or(path);
    let description = lookup(path).or_else(|| lookup(leaf))?;
    if leaf.starts_with("test") {
        Some(format!("{description}\n{TEST_MODES}"))
    } else {
        Some(description.to_string())
    }
}

/// Pairs every line of a serialized TOML string with the dotted path of the table header or key it starts, if any.
fn toml_paths(toml_str: &str) -> Vec<(Option<String>, &str)> {
    let mut table = String::new();
    toml_str
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            let path = if trimmed.starts_with('[') {
                table = trimmed.trim_matches(|c| c == '[' || c == ']').to_string();
                Some(table.clone())
            } else if let Some((key, _)) = trimmed.split_once('=') {
                let key = key.trim();
                if table.is_empty() {
                    Some(key.to_string())
                } else {
                    Some(format!("{table}.{key}"))
                }
            } else {
                None
            };
            (path, line)
        })
        .collect()
}

/// Trait for accessing the [ReadoutChecks] configuration.
pub trait ReadoutChecksOpt {
    /// The checks configuration, if a checks TOML was supplied.
    fn readout_checks(&self) -> Option<&ReadoutChecks>;
    /// True if a template checks TOML should be generated.
    fn generate_readout_checks_toml_enabled(&self) -> bool;
}

impl<T> ReadoutChecksOpt for &T
where
    T: ReadoutChecksOpt,
{
    fn readout_checks(&self) -> Option<&ReadoutChecks> {
        (*self).readout_checks()
    }
    fn generate_readout_checks_toml_enabled(&self) -> bool {
        (*self).generate_readout_checks_toml_enabled()
    }
}

impl<T> ReadoutChecksOpt for Box<T>
where
    T: ReadoutChecksOpt,
{
    fn readout_checks(&self) -> Option<&ReadoutChecks> {
        (**self).readout_checks()
    }
    fn generate_readout_checks_toml_enabled(&self) -> bool {
        (**self).generate_readout_checks_toml_enabled()
    }
}

impl<T> ReadoutChecksOpt for Arc<T>
where
    T: ReadoutChecksOpt,
{
    fn readout_checks(&self) -> Option<&ReadoutChecks> {
        (**self).readout_checks()
    }
    fn generate_readout_checks_toml_enabled(&self) -> bool {
        (**self).generate_readout_checks_toml_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_is_default() {
        let checks = ReadoutChecks::from_toml_str("").unwrap();
        assert_eq!(checks, ReadoutChecks::default());
        assert_eq!(checks.ec_check.min_samples, 10);
        assert_eq!(checks.bc_check.min_fraction, 0.6);
        assert_eq!(checks.test_crc, TestMode::Err);
    }

    #[test]
    fn full_toml() {
        let toml_str = r#"
test_footprint = "warn"
test_crc = "off"
[ec_check]
min_samples = 3
[bc_check]
test = "warn"
min_fraction = 0.5
[[vfat]]
position = "1:200:0:3:12"
hw_id = 0x0ABC
mask = { full = false, channels = [3, 77] }
[[vfat]]
position = "1:200:0:3:13"
"#;
        let checks = ReadoutChecks::from_toml_str(toml_str).unwrap();
        assert_eq!(checks.test_footprint, TestMode::Warn);
        assert_eq!(checks.test_crc, TestMode::Off);
        assert_eq!(checks.test_id, TestMode::Err);
        assert_eq!(
            checks.ec_check,
            ConsensusCheck {
                test: TestMode::Err,
                min_samples: 3,
                min_fraction: 0.6
            }
        );
        assert_eq!(checks.consensus_check(CounterKind::Bc).test, TestMode::Warn);
        assert_eq!(checks.consensus_check(CounterKind::Bc).min_fraction, 0.5);
        assert_eq!(checks.vfat.len(), 2);
        let first = checks
            .mapping(FramePosition::new(1, 200, 0, 3, 12))
            .unwrap();
        assert_eq!(first.hw_id, Some(0xABC));
        assert_eq!(first.mask.channels, vec![3, 77]);
        let second = checks
            .mapping(FramePosition::new(1, 200, 0, 3, 13))
            .unwrap();
        assert_eq!(second.hw_id, None);
        assert!(second.mask.is_empty());
    }

    #[test]
    fn invalid_values_rejected() {
        let err = ReadoutChecks::from_toml_str("[ec_check]\nmin_fraction = 1.5").unwrap_err();
        assert!(err.contains("min_fraction"), "{err}");
        let err = ReadoutChecks::from_toml_str(
            "[[vfat]]\nposition = \"0:1:0:0:0\"\n[[vfat]]\nposition = \"0:1:0:0:0\"",
        )
        .unwrap_err();
        assert!(err.contains("more than once"), "{err}");
        let err = ReadoutChecks::from_toml_str(
            "[[vfat]]\nposition = \"0:1:0:0:0\"\nmask = { channels = [128] }",
        )
        .unwrap_err();
        assert!(err.contains("channel 128"), "{err}");
        assert!(ReadoutChecks::from_toml_str("test_crc = \"maybe\"").is_err());
        assert!(ReadoutChecks::from_toml_str("unknown_key = 1").is_err());
        assert!(ReadoutChecks::from_toml_str("[[vfat]]\nposition = \"1:2:3\"").is_err());
    }

    #[test]
    fn mask_apply() {
        let active = vec![0, 3, 5, 77, 127];
        let partial = AnalysisMask {
            full: false,
            channels: vec![3, 77],
        };
        assert_eq!(partial.apply(active.clone()), vec![0, 5, 127]);
        let full = AnalysisMask {
            full: true,
            channels: Vec::new(),
        };
        assert!(full.apply(active.clone()).is_empty());
        assert_eq!(AnalysisMask::default().apply(active.clone()), active);
    }

    #[test]
    fn template_deserializes_to_default() {
        let template = ReadoutChecks::default().to_string_pretty_toml().unwrap();
        assert!(template.contains("#test_crc = \"err\""), "{template}");
        assert!(template.contains("#[[vfat]]"), "{template}");
        let checks = ReadoutChecks::from_toml_str(&template).unwrap();
        assert_eq!(checks, ReadoutChecks::default());
    }

    #[test]
    fn uncommented_template_is_valid() {
        let template = ReadoutChecks::default().to_string_pretty_toml().unwrap();
        let uncommented: String = template
            .lines()
            .map(|line| match line.strip_prefix('#') {
                Some(rest) if !rest.starts_with(' ') => rest,
                _ => line,
            })
            .join("\n");
        let checks = ReadoutChecks::from_toml_str(&uncommented).unwrap();
        assert_eq!(checks.ec_check, ConsensusCheck::default());
        assert_eq!(checks.vfat.len(), 1);
        assert_eq!(checks.vfat[0].hw_id, Some(0x0ABC));
    }

    #[test]
    fn every_template_key_is_described() {
        let mut example = ReadoutChecks::default();
        example.vfat.push(VfatMapping {
            position: FramePosition::new(0, 1, 0, 0, 0),
            hw_id: Some(1),
            mask: AnalysisMask {
                full: true,
                channels: vec![1],
            },
        });
        let serialized = toml::to_string(&example).unwrap();
        let undescribed: Vec<String> = toml_paths(&serialized)
            .into_iter()
            .filter_map(|(path, _)| path)
            .filter(|path| key_description(path).is_none())
            .collect();
        assert!(undescribed.is_empty(), "{undescribed:?}");
    }

    #[test]
    fn template_keys_follow_the_struct() {
        let template = ReadoutChecks::default().to_string_pretty_toml().unwrap();
        for key in ["test_footprint", "test_crc", "test_id", "min_samples", "min_fraction", "position", "hw_id"] {
            assert!(template.contains(&format!("#{key} = ")), "{key} missing in:\n{template}");
        }
        assert!(template.contains("#[ec_check]"));
        assert!(template.contains("#[bc_check]"));
        assert!(template.contains("# One of: \"off\", \"warn\", \"err\""));
    }
}

//! Contains the [VfatFrame] struct, the readout of one VFAT chip for one trigger, and the [VfatFrameBuilder] to compose frames.
//!
//! Frame layout as sent by the electronics:
//!
//! | Word  | Content                                   |
//! |-------|-------------------------------------------|
//! | 0     | CRC                                       |
//! | 1..=8 | Channel data, 128 bits, channel 0 first   |
//! | 9     | marker `1110` + ChipID (12 bits)          |
//! | 10    | marker `1100` + EC (8 bits) + Flags (4 bits) |
//! | 11    | marker `1010` + BC (12 bits)              |
use crate::util::*;

pub mod crc;

/// Number of 16 bit words in a frame.
pub const FRAME_WORDS: usize = 12;
/// Size of a frame in bytes.
pub const FRAME_SIZE_BYTES: usize = FRAME_WORDS * 2;
/// Number of channels encoded in words 1 to 8.
pub const CHANNEL_COUNT: usize = 128;

/// Presence flag of the BC word (index 11).
pub const BC_PRESENT: u16 = 0x1;
/// Presence flag of the EC word (index 10).
pub const EC_PRESENT: u16 = 0x2;
/// Presence flag of the ID word (index 9).
pub const ID_PRESENT: u16 = 0x4;
/// Presence flag of the CRC word (index 0).
pub const CRC_PRESENT: u16 = 0x8;
/// All words present.
pub const ALL_PRESENT: u16 = BC_PRESENT | EC_PRESENT | ID_PRESENT | CRC_PRESENT;

const CRC_WORD: usize = 0;
const ID_WORD: usize = 9;
const EC_WORD: usize = 10;
const BC_WORD: usize = 11;

const MARKER_MASK: u16 = 0xF000;
const ID_MARKER: u16 = 0xE000;
const EC_MARKER: u16 = 0xC000;
const BC_MARKER: u16 = 0xA000;

/// Raw VFAT frame plus the presence and error flags added by the DAQ.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VfatFrame {
    data: [u16; FRAME_WORDS],
    presence_flags: u16,
    daq_error_flags: u16,
}

impl VfatFrame {
    /// Create a frame from the 12 raw words. All words are marked present and no DAQ error is set.
    pub const fn new(data: [u16; FRAME_WORDS]) -> Self {
        Self {
            data,
            presence_flags: ALL_PRESENT,
            daq_error_flags: 0,
        }
    }

    /// Deserialize a frame from 24 little-endian bytes.
    pub fn from_buf(buf: &[u8]) -> Result<Self, FrameSizeError> {
        if buf.len() != FRAME_SIZE_BYTES {
            return Err(FrameSizeError::Bytes(buf.len()));
        }
        let mut data = [0u16; FRAME_WORDS];
        LittleEndian::read_u16_into(buf, &mut data);
        Ok(Self::new(data))
    }

    /// Serialize the frame words to 24 little-endian bytes.
    pub fn to_buf(&self) -> [u8; FRAME_SIZE_BYTES] {
        let mut buf = [0u8; FRAME_SIZE_BYTES];
        LittleEndian::write_u16_into(&self.data, &mut buf);
        buf
    }

    /// The raw frame words.
    pub fn data(&self) -> &[u16; FRAME_WORDS] {
        &self.data
    }

    /// Replace the frame words, the flags are kept.
    pub fn set_data(&mut self, data: [u16; FRAME_WORDS]) {
        self.data = data;
    }

    /// Presence flags, see [BC_PRESENT], [EC_PRESENT], [ID_PRESENT] and [CRC_PRESENT].
    pub fn presence_flags(&self) -> u16 {
        self.presence_flags
    }

    /// Set the presence flags, only the low nibble is meaningful.
    pub fn set_presence_flags(&mut self, flags: u16) {
        self.presence_flags = flags;
    }

    /// Consume the frame and return it with the given presence flags.
    pub const fn with_presence_flags(mut self, flags: u16) -> Self {
        self.presence_flags = flags;
        self
    }

    /// Error flags reported by the DAQ, opaque to the decoder.
    pub fn daq_error_flags(&self) -> u16 {
        self.daq_error_flags
    }

    /// Set the DAQ error flags.
    pub fn set_daq_error_flags(&mut self, flags: u16) {
        self.daq_error_flags = flags;
    }

    /// Consume the frame and return it with the given DAQ error flags.
    pub const fn with_daq_error_flags(mut self, flags: u16) -> Self {
        self.daq_error_flags = flags;
        self
    }

    /// Bunch Crossing number (BC<11:0>).
    #[inline]
    pub fn bc(&self) -> u16 {
        self.data[BC_WORD] & 0x0FFF
    }

    /// Event Counter (EC<7:0>).
    #[inline]
    pub fn ec(&self) -> u16 {
        (self.data[EC_WORD] & 0x0FF0) >> 4
    }

    /// The 4 flag bits in the EC word.
    #[inline]
    pub fn flags(&self) -> u16 {
        self.data[EC_WORD] & 0x000F
    }

    /// Chip ID (ChipID<11:0>).
    #[inline]
    pub fn chip_id(&self) -> u16 {
        self.data[ID_WORD] & 0x0FFF
    }

    /// The checksum stored in the frame.
    #[inline]
    pub fn crc(&self) -> u16 {
        self.data[CRC_WORD]
    }

    /// True if the BC word is present in the frame.
    pub fn is_bc_present(&self) -> bool {
        self.presence_flags & BC_PRESENT != 0
    }

    /// True if the EC word is present in the frame.
    pub fn is_ec_present(&self) -> bool {
        self.presence_flags & EC_PRESENT != 0
    }

    /// True if the ID word is present in the frame.
    pub fn is_id_present(&self) -> bool {
        self.presence_flags & ID_PRESENT != 0
    }

    /// True if the CRC word is present in the frame.
    pub fn is_crc_present(&self) -> bool {
        self.presence_flags & CRC_PRESENT != 0
    }

    /// Check if `channel` registered a hit.
    ///
    /// # Panics
    /// If `channel` is not in the range 0..=127.
    #[inline]
    pub fn channel_active(&self, channel: u8) -> bool {
        assert!(
            (channel as usize) < CHANNEL_COUNT,
            "Channel {channel} out of range, a frame has {CHANNEL_COUNT} channels"
        );
        self.data[1 + (channel as usize / 16)] & (1 << (channel % 16)) != 0
    }

    /// All channels with a hit, in ascending order.
    ///
    /// Only visits set bits, cheaper than calling [VfatFrame::channel_active] 128 times for sparse frames.
    pub fn active_channels(&self) -> Vec<u8> {
        let mut channels = Vec::new();
        for (word_idx, &word) in self.data[1..=8].iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                channels.push((word_idx * 16 + bit) as u8);
                bits &= bits - 1;
            }
        }
        channels
    }

    /// Check the fixed marker bits of the ID, EC and BC words.
    ///
    /// Words whose presence flag is cleared are not checked.
    pub fn check_footprint(&self) -> bool {
        let marker_ok = |present: bool, word: usize, marker: u16| {
            !present || self.data[word] & MARKER_MASK == marker
        };
        marker_ok(self.is_id_present(), ID_WORD, ID_MARKER)
            && marker_ok(self.is_ec_present(), EC_WORD, EC_MARKER)
            && marker_ok(self.is_bc_present(), BC_WORD, BC_MARKER)
    }

    /// Check the DAQ error flags and the checksum.
    ///
    /// Returns false if any DAQ error flag is set, or if the CRC word is present and does not match the calculated checksum.
    pub fn check_crc(&self) -> bool {
        if self.daq_error_flags != 0 {
            return false;
        }
        if !self.is_crc_present() {
            return true;
        }
        self.calculate_crc() == self.crc()
    }

    /// Calculate the checksum of words 1 to 11, folded from index 11 down to index 1.
    pub fn calculate_crc(&self) -> u16 {
        crc::calculate_crc(self.data[1..].iter().rev().copied())
    }

    /// View of the frame with every word printed as binary, highest index first.
    pub fn binary_view(&self) -> BinaryView<'_> {
        BinaryView(self)
    }
}

impl TryFrom<&[u16]> for VfatFrame {
    type Error = FrameSizeError;

    fn try_from(words: &[u16]) -> Result<Self, Self::Error> {
        let data: [u16; FRAME_WORDS] = words
            .try_into()
            .map_err(|_| FrameSizeError::Words(words.len()))?;
        Ok(Self::new(data))
    }
}

impl fmt::Display for VfatFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {id:#05X}  BC: {bc:>4}  EC: {ec:>3}  Flags: {flags:#03X}  Channels: ",
            id = self.chip_id(),
            bc = self.bc(),
            ec = self.ec(),
            flags = self.flags()
        )?;
        for word in self.data[1..=8].iter().rev() {
            write!(f, "{word:04X}")?;
        }
        write!(
            f,
            "  CRC: {crc:#06X} ({crc_status})  Footprint: {footprint}",
            crc = self.crc(),
            crc_status = if self.check_crc() { "ok" } else { "wrong" },
            footprint = if self.check_footprint() { "ok" } else { "wrong" }
        )
    }
}

/// Prints the words of a [VfatFrame] in binary, nibbles separated by `|`.
#[derive(Debug, Clone, Copy)]
pub struct BinaryView<'a>(&'a VfatFrame);

impl fmt::Display for BinaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, word) in self.0.data.iter().enumerate().rev() {
            write!(f, "{idx:>2}: ")?;
            for nibble in (0..4).rev() {
                write!(f, "{:04b}|", (word >> (nibble * 4)) & 0xF)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A frame was constructed from a buffer of the wrong size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSizeError {
    /// Number of words supplied instead of 12.
    Words(usize),
    /// Number of bytes supplied instead of 24.
    Bytes(usize),
}

impl fmt::Display for FrameSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSizeError::Words(got) => {
                write!(f, "VFAT frame must be {FRAME_WORDS} words, got {got}")
            }
            FrameSizeError::Bytes(got) => {
                write!(f, "VFAT frame must be {FRAME_SIZE_BYTES} bytes, got {got}")
            }
        }
    }
}

impl error::Error for FrameSizeError {}

/// Composes a well formed [VfatFrame]: marker bits set and a valid checksum.
#[derive(Debug, Default, Clone)]
pub struct VfatFrameBuilder {
    chip_id: u16,
    ec: u16,
    flags: u16,
    bc: u16,
    channels: Vec<u8>,
}

impl VfatFrameBuilder {
    /// New builder with all fields zero and no active channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chip ID, masked to 12 bits.
    pub fn chip_id(mut self, chip_id: u16) -> Self {
        self.chip_id = chip_id & 0x0FFF;
        self
    }

    /// Event counter, masked to 8 bits.
    pub fn ec(mut self, ec: u16) -> Self {
        self.ec = ec & 0x00FF;
        self
    }

    /// Flag nibble, masked to 4 bits.
    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags & 0x000F;
        self
    }

    /// Bunch counter, masked to 12 bits.
    pub fn bc(mut self, bc: u16) -> Self {
        self.bc = bc & 0x0FFF;
        self
    }

    /// Channels to mark active.
    ///
    /// # Panics
    /// If a channel is not in the range 0..=127.
    pub fn channels(mut self, channels: impl IntoIterator<Item = u8>) -> Self {
        for ch in channels {
            assert!(
                (ch as usize) < CHANNEL_COUNT,
                "Channel {ch} out of range, a frame has {CHANNEL_COUNT} channels"
            );
            self.channels.push(ch);
        }
        self
    }

    /// Build the frame, the CRC word is calculated from the other words.
    pub fn build(self) -> VfatFrame {
        let mut data = [0u16; FRAME_WORDS];
        for ch in self.channels {
            data[1 + (ch as usize / 16)] |= 1 << (ch % 16);
        }
        data[ID_WORD] = ID_MARKER | self.chip_id;
        data[EC_WORD] = EC_MARKER | (self.ec << 4) | self.flags;
        data[BC_WORD] = BC_MARKER | self.bc;
        let mut frame = VfatFrame::new(data);
        frame.data[CRC_WORD] = frame.calculate_crc();
        frame
    }
}

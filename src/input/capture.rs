//! Contains the capture container types: [CaptureHeader], [Cycle] and [FrameRecord], and the [CaptureScanner] that reads cycles from a reader.
//!
//! All integers are little-endian.
//!
//! | Item          | Size      | Content                                                              |
//! |---------------|-----------|----------------------------------------------------------------------|
//! | File header   | 8 bytes   | magic `VFAT`, format version (u8), 3 reserved bytes                  |
//! | Cycle header  | 8 bytes   | cycle ID (u32), frame record count (u16), reserved (u16)             |
//! | Frame record  | 32 bytes  | raw position (u32), presence flags (u16), DAQ error flags (u16), 12 frame words (u16) |
use crate::util::*;
use crate::words::vfat_frame::FRAME_SIZE_BYTES;

/// Magic bytes at the start of a capture file
pub const CAPTURE_MAGIC: [u8; 4] = *b"VFAT";
/// Supported capture format version
pub const CAPTURE_FORMAT_VERSION: u8 = 1;
/// Size of the file header in bytes
pub const FILE_HEADER_SIZE: usize = 8;
/// Size of a cycle header in bytes
pub const CYCLE_HEADER_SIZE: usize = 8;
/// Size of a frame record in bytes
pub const FRAME_RECORD_SIZE: usize = 8 + FRAME_SIZE_BYTES;

/// The file header of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    /// Magic bytes, `VFAT` in a valid capture
    pub magic: [u8; 4],
    /// Format version
    pub version: u8,
}

impl Default for CaptureHeader {
    fn default() -> Self {
        Self {
            magic: CAPTURE_MAGIC,
            version: CAPTURE_FORMAT_VERSION,
        }
    }
}

impl CaptureHeader {
    /// Read the file header from a reader, the content is not validated.
    pub fn load<R: io::Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        Ok(Self {
            magic: [buf[0], buf[1], buf[2], buf[3]],
            version: buf[4],
        })
    }

    /// Encode the header.
    pub fn to_buf(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[..4].copy_from_slice(&self.magic);
        buf[4] = self.version;
        buf
    }
}

impl fmt::Display for CaptureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "magic: {magic:02X?} version: {version}",
            magic = self.magic,
            version = self.version
        )
    }
}

/// A frame as read from the capture, with its readout position and the offset of its record in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// Readout position
    pub position: FramePosition,
    /// The decoded frame
    pub frame: VfatFrame,
    /// Byte offset of the record in the input
    pub mem_pos: u64,
}

impl FrameRecord {
    /// Decode a 32 byte frame record found at `mem_pos`.
    pub fn from_buf(buf: &[u8; FRAME_RECORD_SIZE], mem_pos: u64) -> io::Result<Self> {
        let position = FramePosition::from_raw(LittleEndian::read_u32(&buf[0..4]))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{mem_pos:#X}: {e}")))?;
        let frame = VfatFrame::from_buf(&buf[8..])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?
            .with_presence_flags(LittleEndian::read_u16(&buf[4..6]))
            .with_daq_error_flags(LittleEndian::read_u16(&buf[6..8]));
        Ok(Self {
            position,
            frame,
            mem_pos,
        })
    }

    /// Encode the record.
    pub fn to_buf(&self) -> [u8; FRAME_RECORD_SIZE] {
        let mut buf = [0u8; FRAME_RECORD_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.position.raw());
        LittleEndian::write_u16(&mut buf[4..6], self.frame.presence_flags());
        LittleEndian::write_u16(&mut buf[6..8], self.frame.daq_error_flags());
        buf[8..].copy_from_slice(&self.frame.to_buf());
        buf
    }
}

/// All frames of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Cycle ID from the cycle header
    pub id: u32,
    /// Byte offset of the cycle header in the input
    pub mem_pos: u64,
    /// Frame records in input order
    pub frames: Vec<FrameRecord>,
}

/// Reads [Cycle]s from a capture, tracking the byte offset in the input.
#[derive(Debug)]
pub struct CaptureScanner<R> {
    reader: R,
    mem_pos: u64,
    cycles_read: u64,
}

impl<R: io::Read> CaptureScanner<R> {
    /// Create a scanner for a reader that is positioned after an already loaded [CaptureHeader].
    pub fn new_from_header(reader: R, header: &CaptureHeader) -> Self {
        log::trace!("Scanning capture with header {header}");
        Self {
            reader,
            mem_pos: FILE_HEADER_SIZE as u64,
            cycles_read: 0,
        }
    }

    /// Byte offset of the next read.
    pub fn mem_pos(&self) -> u64 {
        self.mem_pos
    }

    /// Number of complete cycles read so far.
    pub fn cycles_read(&self) -> u64 {
        self.cycles_read
    }

    /// Load the next cycle.
    ///
    /// Returns `Ok(None)` at the end of the input on a cycle boundary,
    /// and an [io::ErrorKind::UnexpectedEof] error if the input ends inside a cycle.
    pub fn load_cycle(&mut self) -> io::Result<Option<Cycle>> {
        let cycle_mem_pos = self.mem_pos;
        let mut header_buf = [0u8; CYCLE_HEADER_SIZE];
        if !self.fill_or_eof(&mut header_buf)? {
            return Ok(None);
        }
        let id = LittleEndian::read_u32(&header_buf[0..4]);
        let frame_count = LittleEndian::read_u16(&header_buf[4..6]);

        let mut frames = Vec::with_capacity(usize::from(frame_count));
        let mut record_buf = [0u8; FRAME_RECORD_SIZE];
        for idx in 0..frame_count {
            let record_mem_pos = self.mem_pos;
            self.reader.read_exact(&mut record_buf).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!(
                        "Cycle {id} at {cycle_mem_pos:#X} truncated, frame record {idx} of {frame_count} incomplete: {e}"
                    ),
                )
            })?;
            self.mem_pos += FRAME_RECORD_SIZE as u64;
            frames.push(FrameRecord::from_buf(&record_buf, record_mem_pos)?);
        }
        self.cycles_read += 1;
        Ok(Some(Cycle {
            id,
            mem_pos: cycle_mem_pos,
            frames,
        }))
    }

    // Fill the buffer completely, or return false if the input ended before the first byte.
    fn fill_or_eof(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "Cycle header at {mem_pos:#X} truncated after {filled} bytes",
                            mem_pos = self.mem_pos
                        ),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
                Err(e) => return Err(e),
            }
        }
        self.mem_pos += buf.len() as u64;
        Ok(true)
    }
}

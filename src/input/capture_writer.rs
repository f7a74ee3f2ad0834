//! Contains the [CaptureWriter] that encodes cycles of frames into the capture format read by [CaptureScanner](super::capture::CaptureScanner).
use super::capture::{CaptureHeader, FrameRecord};
use crate::util::*;
use byteorder::WriteBytesExt;

/// Writes a capture file: the header on creation, then one cycle per call to [CaptureWriter::write_cycle].
#[derive(Debug)]
pub struct CaptureWriter<W: io::Write> {
    writer: W,
}

impl<W: io::Write> CaptureWriter<W> {
    /// Create a writer and write the default [CaptureHeader].
    pub fn new(writer: W) -> io::Result<Self> {
        Self::with_header(writer, &CaptureHeader::default())
    }

    /// Create a writer and write a custom header, e.g. to produce an invalid capture.
    pub fn with_header(mut writer: W, header: &CaptureHeader) -> io::Result<Self> {
        writer.write_all(&header.to_buf())?;
        Ok(Self { writer })
    }

    /// Write a cycle header followed by a frame record per frame.
    pub fn write_cycle(&mut self, cycle_id: u32, frames: &[(FramePosition, VfatFrame)]) -> io::Result<()> {
        let frame_count = u16::try_from(frames.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cycle {cycle_id} has {} frames, at most {} fit in a cycle", frames.len(), u16::MAX),
            )
        })?;
        self.writer.write_u32::<LittleEndian>(cycle_id)?;
        self.writer.write_u16::<LittleEndian>(frame_count)?;
        self.writer.write_u16::<LittleEndian>(0)?;
        for &(position, frame) in frames {
            let record = FrameRecord {
                position,
                frame,
                mem_pos: 0,
            };
            self.writer.write_all(&record.to_buf())?;
        }
        Ok(())
    }

    /// Flush and return the inner writer.
    pub fn into_inner(mut self) -> W {
        let _ = self.writer.flush();
        self.writer
    }
}

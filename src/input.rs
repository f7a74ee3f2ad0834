//! Input handling: opening the capture file or stdin with [init_reader], and the reader thread spawned with [spawn_reader].
//!
//! The reader thread loads [Cycle]s with a [CaptureScanner] and sends them in chunks through a bounded channel to the analysis.

pub mod capture;
pub mod capture_writer;

use crate::util::*;
use capture::{CaptureScanner, Cycle};
use std::io::IsTerminal;

/// Depth of the FIFO where the cycle chunks are inserted as they are read
const CHANNEL_CYCLE_CHUNK_CAPACITY: usize = 100;
const READER_BUFFER_SIZE: usize = 1024 * 50; // 50KB
/// Max number of cycles sent to the analysis at once
pub const CYCLE_CHUNK_SIZE: usize = 16;

/// A reader of capture data, from a file or stdin.
pub type InputReader = Box<dyn io::Read + Send>;

/// Initializes the reader based on the input mode (file or stdin) and returns it
///
/// Reads from stdin if no path is supplied, which is an error if stdin is a terminal.
pub fn init_reader(input_file: Option<&Path>) -> io::Result<InputReader> {
    if let Some(path) = input_file {
        let f = fs::OpenOptions::new().read(true).open(path).map_err(|e| {
            io::Error::new(e.kind(), format!("Failed to open {}: {e}", path.display()))
        })?;
        Ok(Box::new(io::BufReader::with_capacity(READER_BUFFER_SIZE, f)))
    } else if !io::stdin().is_terminal() {
        Ok(Box::new(io::BufReader::with_capacity(
            READER_BUFFER_SIZE,
            io::stdin(),
        )))
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            "stdin not redirected!",
        ))
    }
}

/// Spawns a reader thread that reads cycles from the input and sends them in chunks to a bounded channel
///
/// Returns the thread handle and the receiver channel.
/// The thread stops at the end of the input, when the stop flag is set, or on a read error, which is sent as a [StatType::Fatal].
pub fn spawn_reader<R: io::Read + Send + 'static>(
    stop_flag: Arc<AtomicBool>,
    scanner: CaptureScanner<R>,
    stats_send: flume::Sender<StatType>,
) -> (JoinHandle<()>, crossbeam_channel::Receiver<Vec<Cycle>>) {
    let reader_thread = Builder::new().name("Reader".to_string());
    let (send_chan, recv_chan) = crossbeam_channel::bounded(CHANNEL_CYCLE_CHUNK_CAPACITY);
    let thread_handle = reader_thread
        .spawn({
            move || {
                let mut scanner = scanner;
                while !stop_flag.load(Ordering::SeqCst) {
                    let (chunk, read_err) = get_chunk(&mut scanner, CYCLE_CHUNK_SIZE);
                    let end_of_input = chunk.len() < CYCLE_CHUNK_SIZE;
                    if !chunk.is_empty() && send_chan.send(chunk).is_err() {
                        break;
                    }
                    if let Some(e) = read_err {
                        log::debug!("Reader stopped after {} cycles", scanner.cycles_read());
                        stats_send
                            .send(StatType::Fatal(format!("Failed reading input: {e}").into()))
                            .expect("Couldn't send to Controller");
                        break;
                    }
                    if end_of_input {
                        log::debug!("End of input after {} cycles", scanner.cycles_read());
                        break;
                    }
                }
            }
        })
        .expect("Failed to spawn reader thread");
    (thread_handle, recv_chan)
}

/// Attempts to fill a chunk with as many cycles as possible (up to the chunk size)
///
/// Returns the cycles read before the end of the input or an error, and the error if one occurred.
fn get_chunk<R: io::Read>(
    scanner: &mut CaptureScanner<R>,
    chunk_size: usize,
) -> (Vec<Cycle>, Option<io::Error>) {
    let mut chunk = Vec::with_capacity(chunk_size);
    while chunk.len() < chunk_size {
        match scanner.load_cycle() {
            Ok(Some(cycle)) => chunk.push(cycle),
            Ok(None) => break,
            Err(e) => return (chunk, Some(e)),
        }
    }
    (chunk, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::capture::CaptureHeader;
    use crate::input::capture_writer::CaptureWriter;
    use crate::words::vfat_frame::VfatFrameBuilder;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn write_capture(cycles: usize) -> Vec<u8> {
        let frame = VfatFrameBuilder::new().ec(1).bc(2).build();
        let pos = FramePosition::new(0, 1, 0, 0, 0);
        let mut writer = CaptureWriter::new(Vec::new()).unwrap();
        for id in 0..cycles {
            writer.write_cycle(id as u32, &[(pos, frame)]).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn init_reader_from_file() {
        let tmp_d = TempDir::new().unwrap();
        let test_file_path = tmp_d.child("test.vfat");
        fs::write(&test_file_path, write_capture(1)).unwrap();

        let mut reader = init_reader(Some(&test_file_path)).unwrap();
        let header = CaptureHeader::load(&mut reader).unwrap();
        assert_eq!(header, CaptureHeader::default());
    }

    #[test]
    fn init_reader_missing_file() {
        let tmp_d = TempDir::new().unwrap();
        let err = init_reader(Some(&tmp_d.child("missing.vfat"))).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn reader_sends_all_cycles_in_chunks() {
        let cycles = CYCLE_CHUNK_SIZE * 2 + 3;
        let bytes = write_capture(cycles);
        let mut reader = io::Cursor::new(bytes);
        let header = CaptureHeader::load(&mut reader).unwrap();
        let scanner = CaptureScanner::new_from_header(reader, &header);
        let (stats_send, stats_recv) = flume::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let (handle, recv) = spawn_reader(stop_flag, scanner, stats_send);
        let chunks: Vec<Vec<Cycle>> = recv.iter().collect();
        handle.join().unwrap();

        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![CYCLE_CHUNK_SIZE, CYCLE_CHUNK_SIZE, 3]
        );
        let ids: Vec<u32> = chunks.iter().flatten().map(|c| c.id).collect();
        assert_eq!(ids, (0..cycles as u32).collect::<Vec<_>>());
        assert!(stats_recv.try_recv().is_err());
    }

    #[test]
    fn reader_reports_truncated_input() {
        let mut bytes = write_capture(3);
        let _ = bytes.pop();
        let mut reader = io::Cursor::new(bytes);
        let header = CaptureHeader::load(&mut reader).unwrap();
        let scanner = CaptureScanner::new_from_header(reader, &header);
        let (stats_send, stats_recv) = flume::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let (handle, recv) = spawn_reader(stop_flag, scanner, stats_send);
        let cycles_received: usize = recv.iter().map(|chunk| chunk.len()).sum();
        handle.join().unwrap();

        assert_eq!(cycles_received, 2);
        match stats_recv.try_recv().unwrap() {
            StatType::Fatal(msg) => assert!(msg.contains("truncated"), "{msg}"),
            other => panic!("Expected fatal, got {other:?}"),
        }
    }
}

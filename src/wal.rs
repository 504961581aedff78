use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::Event;

/// Upper bound on a single encoded event; larger lengths mean a damaged frame.
const MAX_FRAME_LEN: usize = 1 << 20;

/// Encode a single event to [len][bincode][crc32] format.
fn encode_event(writer: &mut impl Write, event: &Event) -> io::Result<()> {
    let payload =
        bincode::serialize(event).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(())
}

/// Append-only Write-Ahead Log.
///
/// Format per entry: `[u32: len][bincode: Event][u32: crc32]`
/// - `len` is the byte length of the bincode payload (not including the CRC).
/// - Truncated last entry (crash) is safely discarded via length-prefix + CRC check.
///
/// The file is created by the first append or compaction, so a missing file
/// means nothing was ever stored. An existing empty file is an empty history.
pub struct Wal {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    appends_since_compact: u64,
}

fn open_for_append(path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

impl Wal {
    /// Open the WAL at `path`. Does not create the file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let writer = if path.exists() { Some(open_for_append(path)?) } else { None };
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            appends_since_compact: 0,
        })
    }

    /// Append a single event, flush, and fsync.
    pub fn append(&mut self, event: &Event) -> io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => open_for_append(&self.path)?,
        };
        let writer = self.writer.insert(writer);
        encode_event(writer, event)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        self.appends_since_compact += 1;
        Ok(())
    }

    /// Return the WAL file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the WAL with a minimal set of events that recreates the current state.
    ///
    /// The events go to a temp file which is fsynced and renamed over the WAL.
    pub fn compact(&mut self, events: &[Event]) -> io::Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");
        let mut tmp = BufWriter::new(File::create(&tmp_path)?);
        for event in events {
            encode_event(&mut tmp, event)?;
        }
        tmp.flush()?;
        tmp.get_ref().sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        self.writer = Some(open_for_append(&self.path)?);
        self.appends_since_compact = 0;
        Ok(())
    }

    pub fn appends_since_compact(&self) -> u64 {
        self.appends_since_compact
    }

    /// Replay the WAL from disk. `None` when the file does not exist.
    /// Replay stops at the first truncated or corrupt frame; everything after it is dropped.
    pub fn replay(path: &Path) -> io::Result<Option<Vec<Event>>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        let mut events = Vec::new();

        while let Some(payload) = read_frame(&mut reader)? {
            match bincode::deserialize::<Event>(&payload) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("WAL {}: undecodable entry #{}: {e}", path.display(), events.len());
                    break;
                }
            }
        }

        debug!("replayed {} events from {}", events.len(), path.display());
        Ok(Some(events))
    }
}

/// Read one `[len][payload][crc]` frame. `None` at end of file or on a damaged tail.
fn read_frame(reader: &mut impl Read) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    if !read_or_eof(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        warn!("WAL frame length {len} exceeds limit, treating as corrupt tail");
        return Ok(None);
    }

    let mut payload = vec![0u8; len];
    let mut crc_buf = [0u8; 4];
    if !read_or_eof(reader, &mut payload)? || !read_or_eof(reader, &mut crc_buf)? {
        warn!("WAL ends with a truncated frame, discarding it");
        return Ok(None);
    }

    if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
        warn!("WAL frame failed CRC check, discarding tail");
        return Ok(None);
    }
    Ok(Some(payload))
}

/// `read_exact` that reports a short read as `false` instead of an error.
fn read_or_eof(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

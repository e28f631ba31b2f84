//! JSONL tapes of everything the instrumenter sent to a backend.
//!
//! The first line is a header; every following line wraps one outbound
//! message with a sequence number and capture time.

mod backend;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::event::CapturedEvent;
use crate::instrument::OutboundMessage;
use crate::util::now_ms;

pub use backend::TapeBackend;

pub const TAPE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeEntry {
    pub seq: u64,
    pub ts_ms: u64,
    pub message: OutboundMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TapeLine {
    Header {
        schema_version: u32,
        created_at_ms: u64,
    },
    Entry {
        entry: TapeEntry,
    },
}

fn write_line(writer: &mut impl Write, line: &TapeLine) -> io::Result<()> {
    writeln!(
        writer,
        "{}",
        serde_json::to_string(line).map_err(io::Error::other)?
    )
}

#[derive(Debug, Clone)]
pub struct Tape {
    pub schema_version: u32,
    pub created_at_ms: u64,
    pub entries: Vec<TapeEntry>,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            entries: Vec::new(),
        }
    }

    /// Captured events in tape order, skipping handshakes and query responses.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.entries
            .iter()
            .filter_map(|entry| entry.message.as_event().cloned())
            .collect()
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_line(
            &mut writer,
            &TapeLine::Header {
                schema_version: self.schema_version,
                created_at_ms: self.created_at_ms,
            },
        )?;
        for entry in &self.entries {
            write_line(
                &mut writer,
                &TapeLine::Entry {
                    entry: entry.clone(),
                },
            )?;
        }
        writer.flush()
    }

    pub fn read_jsonl_from_path(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);

        let mut header: Option<(u32, u64)> = None;
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: TapeLine = serde_json::from_str(&line)
                .map_err(|e| io::Error::other(format!("line {}: {e}", idx + 1)))?;
            match parsed {
                TapeLine::Header {
                    schema_version,
                    created_at_ms,
                } => {
                    if idx != 0 {
                        return Err(io::Error::other("tape header must be the first JSONL line"));
                    }
                    if schema_version > TAPE_SCHEMA_VERSION {
                        return Err(io::Error::other(format!(
                            "unsupported tape schema version {schema_version}"
                        )));
                    }
                    header = Some((schema_version, created_at_ms));
                }
                TapeLine::Entry { entry } => entries.push(entry),
            }
        }

        let (schema_version, created_at_ms) =
            header.ok_or_else(|| io::Error::other("missing tape header"))?;

        Ok(Self {
            schema_version,
            created_at_ms,
            entries,
        })
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks events by id, keeping tape order, or else by the inclusive index
/// range `from..=to`. Ids take precedence over the range.
pub fn select_events(
    events: Vec<CapturedEvent>,
    ids: &[String],
    from: Option<usize>,
    to: Option<usize>,
) -> Vec<CapturedEvent> {
    if !ids.is_empty() {
        return events
            .into_iter()
            .filter(|event| ids.contains(&event.id))
            .collect();
    }

    let from = from.unwrap_or(0);
    let to = to.unwrap_or(usize::MAX);
    events
        .into_iter()
        .enumerate()
        .filter(|(index, _)| (from..=to).contains(index))
        .map(|(_, event)| event)
        .collect()
}

/// Appends entries to a tape file as they happen, flushing each line.
pub struct TapeWriter {
    created_at_ms: u64,
    seq: AtomicU64,
    writer: Mutex<BufWriter<File>>,
}

impl TapeWriter {
    /// Creates (or truncates) `path`, writing the header immediately.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let created_at_ms = now_ms();
        write_line(
            &mut writer,
            &TapeLine::Header {
                schema_version: TAPE_SCHEMA_VERSION,
                created_at_ms,
            },
        )?;
        writer.flush()?;
        Ok(Self {
            created_at_ms,
            seq: AtomicU64::new(1),
            writer: Mutex::new(writer),
        })
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Wraps `message` in the next entry and appends it.
    pub fn record(&self, message: OutboundMessage) -> io::Result<()> {
        self.append(TapeEntry {
            seq: self.next_seq(),
            ts_ms: now_ms(),
            message,
        })
    }

    pub fn append(&self, entry: TapeEntry) -> io::Result<()> {
        let mut writer = self.writer.lock();
        write_line(&mut *writer, &TapeLine::Entry { entry })?;
        writer.flush()
    }
}

impl std::fmt::Debug for TapeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapeWriter")
            .field("created_at_ms", &self.created_at_ms)
            .field("seq", &self.seq.load(Ordering::SeqCst))
            .finish()
    }
}

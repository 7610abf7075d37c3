//! The action log: a totally ordered, append-only record of protocol events.
//!
//! Every actor writes through the same [`ActionLog`]. A line is formatted
//! before the lock is taken; only the sequence increment, the write and the
//! flush happen inside the critical section:
//!
//! ```text
//! 1: BUS: started
//! 2: L 1: started
//! 3: L 1: arrived to 2
//! 4: BUS: arrived to 1
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::error::{Result, SimError};
use crate::stop::StopId;

/// Who produced a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorTag {
    Bus,
    /// Skier identity, starting at 1
    Skier(usize),
}

impl fmt::Display for ActorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => f.write_str("BUS"),
            Self::Skier(id) => write!(f, "L {}", id),
        }
    }
}

/// A protocol event as it appears in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Started,
    ArrivedTo(StopId),
    Leaving(StopId),
    ArrivedToFinal,
    LeavingFinal,
    Boarding,
    GoingToSki,
    Finish,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::ArrivedTo(stop) => write!(f, "arrived to {}", stop),
            Self::Leaving(stop) => write!(f, "leaving {}", stop),
            Self::ArrivedToFinal => f.write_str("arrived to final"),
            Self::LeavingFinal => f.write_str("leaving final"),
            Self::Boarding => f.write_str("boarding"),
            Self::GoingToSki => f.write_str("going to ski"),
            Self::Finish => f.write_str("finish"),
        }
    }
}

/// A log line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed log line: {0:?}")]
pub struct ParseLineError(pub String);

impl FromStr for Event {
    type Err = ParseLineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let event = match s {
            "started" => Self::Started,
            "arrived to final" => Self::ArrivedToFinal,
            "leaving final" => Self::LeavingFinal,
            "boarding" => Self::Boarding,
            "going to ski" => Self::GoingToSki,
            "finish" => Self::Finish,
            other => {
                if let Some(stop) = other.strip_prefix("arrived to ") {
                    Self::ArrivedTo(stop.parse()?)
                } else if let Some(stop) = other.strip_prefix("leaving ") {
                    Self::Leaving(stop.parse()?)
                } else {
                    return Err(ParseLineError(s.to_string()));
                }
            }
        };
        Ok(event)
    }
}

/// One parsed line of the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine {
    pub seq: u64,
    pub actor: ActorTag,
    pub event: Event,
}

impl FromStr for LogLine {
    type Err = ParseLineError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || ParseLineError(line.to_string());

        let (seq, rest) = line.split_once(": ").ok_or_else(malformed)?;
        let seq = seq.parse::<u64>().map_err(|_| malformed())?;
        let (actor, event) = rest.split_once(": ").ok_or_else(malformed)?;

        let actor = if actor == "BUS" {
            ActorTag::Bus
        } else {
            let id = actor
                .strip_prefix("L ")
                .and_then(|id| id.parse::<usize>().ok())
                .ok_or_else(malformed)?;
            ActorTag::Skier(id)
        };

        Ok(Self {
            seq,
            actor,
            event: event.parse().map_err(|_| malformed())?,
        })
    }
}

struct LogInner {
    next_seq: u64,
    sink: Option<Box<dyn Write + Send>>,
}

impl LogInner {
    /// Number, write and flush one line. Called with the log lock held.
    fn append(&mut self, message: &str) -> Result<u64> {
        let seq = self.next_seq;
        let sink = self.sink.as_mut().ok_or_else(|| {
            SimError::LogWrite(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "action log already closed",
            ))
        })?;
        writeln!(sink, "{}: {}", seq, message).map_err(SimError::LogWrite)?;
        sink.flush().map_err(SimError::LogWrite)?;
        self.next_seq += 1;
        Ok(seq)
    }
}

/// Shared, serialized event recorder.
///
/// Backed by a FIFO-fair async mutex so no actor waits on the log forever.
pub struct ActionLog {
    inner: Mutex<LogInner>,
}

impl ActionLog {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(|source| SimError::ResourceInit {
            resource: "action log",
            source,
        })?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Log into an arbitrary writer. Each line is flushed after it is written.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(LogInner {
                next_seq: 1,
                sink: Some(Box::new(writer)),
            }),
        }
    }

    /// Append one event and return the sequence number it was given.
    pub async fn record(&self, actor: ActorTag, event: Event) -> Result<u64> {
        let message = format!("{}: {}", actor, event);

        let seq = self.inner.lock().await.append(&message)?;

        tracing::trace!(seq, %actor, %event, "Recorded action");
        Ok(seq)
    }

    /// Number of lines written so far.
    pub async fn entries_written(&self) -> u64 {
        self.inner.lock().await.next_seq - 1
    }

    /// Flush and release the underlying writer. Safe to call repeatedly.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut sink) = inner.sink.take() {
            if let Err(e) = sink.flush() {
                tracing::warn!(error = %e, "Failed to flush action log on close");
            }
        }
    }

    /// Whether [`close`](Self::close) has already run.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.sink.is_none()
    }
}

impl fmt::Debug for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    /// Writer that appends into a shared buffer so tests can read it back.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_event_display_uses_one_based_stops() {
        assert_eq!(Event::ArrivedTo(StopId(0)).to_string(), "arrived to 1");
        assert_eq!(Event::Leaving(StopId(9)).to_string(), "leaving 10");
        assert_eq!(ActorTag::Skier(42).to_string(), "L 42");
    }

    #[test]
    fn test_parse_line() {
        let line: LogLine = "17: L 3: arrived to 2".parse().unwrap();
        assert_eq!(line.seq, 17);
        assert_eq!(line.actor, ActorTag::Skier(3));
        assert_eq!(line.event, Event::ArrivedTo(StopId(1)));

        let line: LogLine = "1: BUS: arrived to final".parse().unwrap();
        assert_eq!(line.actor, ActorTag::Bus);
        assert_eq!(line.event, Event::ArrivedToFinal);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<LogLine>().is_err());
        assert!("x: BUS: started".parse::<LogLine>().is_err());
        assert!("1: TRAM: started".parse::<LogLine>().is_err());
        assert!("1: BUS: arrived to 0".parse::<LogLine>().is_err());
        assert!("1: BUS: flying".parse::<LogLine>().is_err());
    }

    #[tokio::test]
    async fn test_record_numbers_from_one() {
        let buffer = SharedBuffer::default();
        let log = ActionLog::from_writer(buffer.clone());

        assert_eq!(log.record(ActorTag::Bus, Event::Started).await.unwrap(), 1);
        assert_eq!(
            log.record(ActorTag::Skier(1), Event::Boarding).await.unwrap(),
            2
        );
        assert_eq!(log.entries_written().await, 2);
        assert_eq!(buffer.contents(), "1: BUS: started\n2: L 1: boarding\n");
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_append_numbers_and_writes_under_lock() {
        let buffer = SharedBuffer::default();
        let mut inner = LogInner {
            next_seq: 7,
            sink: Some(Box::new(buffer.clone())),
        };

        assert_eq!(inner.append("BUS: started").unwrap(), 7);
        assert_eq!(inner.next_seq, 8);
        assert_eq!(buffer.contents(), "7: BUS: started\n");
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_number_and_releases_lock() {
        let log = ActionLog::from_writer(FailingFlush);

        let err = log.record(ActorTag::Bus, Event::Started).await.unwrap_err();
        assert_eq!(err.code(), "LOG_WRITE_ERROR");

        // Lock is free again and the failed line did not consume a number.
        let written = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            log.entries_written(),
        )
        .await
        .unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_never_share_a_number() {
        let buffer = SharedBuffer::default();
        let log = Arc::new(ActionLog::from_writer(buffer.clone()));

        let mut handles = Vec::new();
        for id in 1..=64 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    log.record(ActorTag::Skier(id), Event::Started).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let seqs: Vec<u64> = buffer
            .contents()
            .lines()
            .map(|l| l.parse::<LogLine>().unwrap().seq)
            .collect();
        let expected: Vec<u64> = (1..=64 * 50).collect();
        assert_eq!(seqs, expected);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_writes() {
        let log = ActionLog::from_writer(SharedBuffer::default());
        log.record(ActorTag::Bus, Event::Started).await.unwrap();

        log.close().await;
        log.close().await;

        assert!(log.is_closed().await);
        let err = log.record(ActorTag::Bus, Event::Finish).await.unwrap_err();
        assert_eq!(err.code(), "LOG_WRITE_ERROR");
    }
}

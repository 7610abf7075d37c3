//! Offline checker for a finished action log.
//!
//! Replays the log line by line and reports every place where it breaks the
//! protocol's guarantees: numbering, per-skier ordering, where boarding may
//! happen, seat capacity and complete delivery.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::log::{ActorTag, Event, LogLine};
use crate::stop::StopId;

/// One broken guarantee, located by line number (1-based) or sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Violation {
    #[error("line {line}: cannot parse {text:?}")]
    Malformed { line: usize, text: String },

    #[error("line {line}: expected sequence {expected}, found {found}")]
    SequenceGap { line: usize, expected: u64, found: u64 },

    #[error("seq {seq}: skier {skier} does not exist")]
    UnknownSkier { seq: u64, skier: usize },

    #[error("seq {seq}: skier {skier} logged {event:?} out of order")]
    SkierOrder { seq: u64, skier: usize, event: String },

    #[error("seq {seq}: skier {skier} boarded while the bus was not at its stop")]
    BoardedAwayFromStop { seq: u64, skier: usize },

    #[error("seq {seq}: {load} skiers on board exceeds capacity {capacity}")]
    OverCapacity { seq: u64, load: usize, capacity: usize },

    #[error("seq {seq}: skier {skier} went skiing away from the destination")]
    DisembarkedEnRoute { seq: u64, skier: usize },

    #[error("seq {seq}: bus left the destination with {riders} riders still on board")]
    RidersLeftOnBoard { seq: u64, riders: usize },

    #[error("seq {seq}: bus event {event:?} out of place")]
    BusOrder { seq: u64, event: String },

    #[error("bus never logged finish")]
    MissingFinish,

    #[error("{delivered} of {expected} skiers went skiing")]
    Undelivered { expected: usize, delivered: usize },
}

/// Result of auditing one log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub lines: usize,
    pub delivered: usize,
    pub rounds: usize,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Where the bus is, as far as the log tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusPosition {
    Depot,
    AtStop(StopId),
    Travelling,
    AtFinal,
    Finished,
}

/// Stage a skier has reached, in log order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
enum SkierStage {
    #[default]
    Unseen,
    Started,
    Arrived,
    Boarded,
    Skiing,
}

#[derive(Debug, Clone, Copy, Default)]
struct SkierTrack {
    stage: SkierStage,
    stop: Option<StopId>,
}

struct Auditor<'a> {
    config: &'a SimulationConfig,
    report: AuditReport,
    skiers: Vec<SkierTrack>,
    bus: BusPosition,
    /// Index of the stop the bus must reach next in this round
    next_stop: usize,
    on_board: usize,
}

impl<'a> Auditor<'a> {
    fn new(config: &'a SimulationConfig) -> Self {
        Self {
            config,
            report: AuditReport::default(),
            skiers: vec![SkierTrack::default(); config.skiers + 1],
            bus: BusPosition::Depot,
            next_stop: 0,
            on_board: 0,
        }
    }

    fn violation(&mut self, v: Violation) {
        self.report.violations.push(v);
    }

    fn line(&mut self, number: usize, text: &str) {
        self.report.lines += 1;

        let line: LogLine = match text.parse() {
            Ok(line) => line,
            Err(_) => {
                self.violation(Violation::Malformed {
                    line: number,
                    text: text.to_string(),
                });
                return;
            }
        };

        let expected = number as u64;
        if line.seq != expected {
            self.violation(Violation::SequenceGap {
                line: number,
                expected,
                found: line.seq,
            });
        }

        match line.actor {
            ActorTag::Bus => self.bus_event(line.seq, line.event),
            ActorTag::Skier(id) => self.skier_event(line.seq, id, line.event),
        }
    }

    fn bus_event(&mut self, seq: u64, event: Event) {
        let next = match (self.bus, event) {
            (BusPosition::Depot, Event::Started) => Some(BusPosition::Travelling),
            (BusPosition::Travelling, Event::ArrivedTo(stop))
                if stop.index() == self.next_stop && stop.index() < self.config.stops =>
            {
                Some(BusPosition::AtStop(stop))
            }
            (BusPosition::AtStop(at), Event::Leaving(stop)) if at == stop => {
                self.next_stop = stop.index() + 1;
                Some(BusPosition::Travelling)
            }
            (BusPosition::Travelling, Event::ArrivedToFinal) if self.next_stop == self.config.stops => {
                Some(BusPosition::AtFinal)
            }
            (BusPosition::AtFinal, Event::LeavingFinal) => {
                if self.on_board > 0 {
                    self.violation(Violation::RidersLeftOnBoard {
                        seq,
                        riders: self.on_board,
                    });
                }
                self.report.rounds += 1;
                self.next_stop = 0;
                Some(BusPosition::Travelling)
            }
            (BusPosition::Travelling, Event::Finish) if self.report.rounds > 0 => {
                Some(BusPosition::Finished)
            }
            _ => None,
        };

        match next {
            Some(position) => self.bus = position,
            None => self.violation(Violation::BusOrder {
                seq,
                event: event.to_string(),
            }),
        }
    }

    fn skier_event(&mut self, seq: u64, id: usize, event: Event) {
        if id == 0 || id > self.config.skiers {
            self.violation(Violation::UnknownSkier { seq, skier: id });
            return;
        }
        let track = self.skiers[id];

        let next = match (track.stage, event) {
            (SkierStage::Unseen, Event::Started) => SkierStage::Started,
            (SkierStage::Started, Event::ArrivedTo(stop)) if stop.index() < self.config.stops => {
                self.skiers[id].stop = Some(stop);
                SkierStage::Arrived
            }
            (SkierStage::Arrived, Event::Boarding) => {
                if track.stop.map(BusPosition::AtStop) != Some(self.bus) {
                    self.violation(Violation::BoardedAwayFromStop { seq, skier: id });
                }
                self.on_board += 1;
                if self.on_board > self.config.capacity {
                    self.violation(Violation::OverCapacity {
                        seq,
                        load: self.on_board,
                        capacity: self.config.capacity,
                    });
                }
                SkierStage::Boarded
            }
            (SkierStage::Boarded, Event::GoingToSki) => {
                if self.bus != BusPosition::AtFinal {
                    self.violation(Violation::DisembarkedEnRoute { seq, skier: id });
                }
                self.on_board = self.on_board.saturating_sub(1);
                self.report.delivered += 1;
                SkierStage::Skiing
            }
            _ => {
                self.violation(Violation::SkierOrder {
                    seq,
                    skier: id,
                    event: event.to_string(),
                });
                return;
            }
        };
        self.skiers[id].stage = next;
    }

    fn finish(mut self) -> AuditReport {
        if self.bus != BusPosition::Finished {
            self.violation(Violation::MissingFinish);
        }
        if self.report.delivered != self.config.skiers {
            self.violation(Violation::Undelivered {
                expected: self.config.skiers,
                delivered: self.report.delivered,
            });
        }
        self.report
    }
}

/// Audit the full text of an action log against the run's configuration.
pub fn audit_log(contents: &str, config: &SimulationConfig) -> AuditReport {
    let mut auditor = Auditor::new(config);
    for (idx, text) in contents.lines().enumerate() {
        auditor.line(idx + 1, text);
    }
    auditor.finish()
}

/// Read and audit the log file at `path`.
pub fn audit_file(path: impl AsRef<Path>, config: &SimulationConfig) -> std::io::Result<AuditReport> {
    let contents = std::fs::read_to_string(path)?;
    Ok(audit_log(&contents, config))
}

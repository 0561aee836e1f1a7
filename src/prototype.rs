//! Frame templates: ordered transmit and receive segment lists per message

use std::fmt;

use crate::constants::{KEY_RECEIVE, KEY_TRANSMIT};
use crate::logging::CallbackLogger;
use crate::segment::Segment;

/// Frame direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Transmit,
    Receive,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Transmit => KEY_TRANSMIT,
            Direction::Receive => KEY_RECEIVE,
        }
    }

    /// Short label used in frame dumps.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Transmit => "TX",
            Direction::Receive => "RX",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout of one message type: the segments sent by the master and the
/// segments expected back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    name: String,
    desc: String,
    transmit: Vec<Segment>,
    receive: Vec<Segment>,
}

impl Prototype {
    /// Empty segment lists are allowed.
    pub fn new(name: impl Into<String>, transmit: Vec<Segment>, receive: Vec<Segment>) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            transmit,
            receive,
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn segments(&self, direction: Direction) -> &[Segment] {
        match direction {
            Direction::Transmit => &self.transmit,
            Direction::Receive => &self.receive,
        }
    }

    pub fn log(&self, logger: &CallbackLogger) {
        logger.debug(&format!("Prototype Name: {} ({})", self.name, self.desc));
        for segment in &self.transmit {
            logger.debug(&format!("  Transmit Segment: {}", segment));
        }
        for segment in &self.receive {
            logger.debug(&format!("  Receive Segment: {}", segment));
        }
    }
}

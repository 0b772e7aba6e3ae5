/// Digital pin access capability.
///
/// The monitor never talks to GPIO hardware directly: it goes through
/// `PinController`, so the poll loop can be driven by the real pin bank in
/// production and by `SimPinBank` in tests and `--dry-run`.
use std::collections::{HashMap, VecDeque};

/// Pin access by BCM number. High = asserted.
pub trait PinController {
    fn configure_input(&mut self, pin: u8) -> Result<(), PinError>;
    fn configure_output(&mut self, pin: u8) -> Result<(), PinError>;
    fn read(&mut self, pin: u8) -> Result<bool, PinError>;
    fn write(&mut self, pin: u8, level: bool) -> Result<(), PinError>;
}

/// Errors surfaced by pin access.
#[derive(Debug)]
pub enum PinError {
    /// The pin was used before being configured for that direction.
    NotConfigured { pin: u8 },
    /// The underlying GPIO driver failed.
    Hardware { message: String },
}

impl std::fmt::Display for PinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinError::NotConfigured { pin } => {
                write!(f, "pin {} is not configured for this operation", pin)
            }
            PinError::Hardware { message } => {
                write!(f, "GPIO hardware error: {}", message)
            }
        }
    }
}

impl std::error::Error for PinError {}

/// One observable pin operation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinEvent {
    ConfiguredInput { pin: u8 },
    ConfiguredOutput { pin: u8 },
    Read { pin: u8, level: bool },
    Wrote { pin: u8, level: bool },
}

/// In-memory pin bank.
///
/// Inputs are driven by a per-pin script of levels; once the script is
/// exhausted the last level repeats, so a one-entry script models a line
/// held at a constant level. Every operation is recorded in a journal so
/// tests can assert ordering, not just final state.
#[derive(Default)]
pub struct SimPinBank {
    input_scripts: HashMap<u8, VecDeque<bool>>,
    input_last: HashMap<u8, bool>,
    configured_inputs: HashMap<u8, bool>,
    outputs: HashMap<u8, bool>,
    journal: Vec<PinEvent>,
}

#[allow(dead_code)] // inspection helpers are exercised by tests
impl SimPinBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sequence of levels to be returned by successive reads of `pin`.
    pub fn script_input<I: IntoIterator<Item = bool>>(&mut self, pin: u8, levels: I) {
        self.input_scripts
            .entry(pin)
            .or_default()
            .extend(levels);
    }

    /// Hold `pin` at a constant level (clears any queued script).
    pub fn set_input(&mut self, pin: u8, level: bool) {
        self.input_scripts.remove(&pin);
        self.input_last.insert(pin, level);
    }

    /// Current driven level of an output pin, if any.
    pub fn output(&self, pin: u8) -> Option<bool> {
        self.outputs.get(&pin).copied()
    }

    pub fn journal(&self) -> &[PinEvent] {
        &self.journal
    }

    /// Number of reads taken of `pin`.
    pub fn reads_of(&self, pin: u8) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, PinEvent::Read { pin: p, .. } if *p == pin))
            .count()
    }

    /// Number of writes made to `pin`.
    pub fn writes_to(&self, pin: u8) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, PinEvent::Wrote { pin: p, .. } if *p == pin))
            .count()
    }
}

impl PinController for SimPinBank {
    fn configure_input(&mut self, pin: u8) -> Result<(), PinError> {
        self.configured_inputs.insert(pin, true);
        self.journal.push(PinEvent::ConfiguredInput { pin });
        Ok(())
    }

    fn configure_output(&mut self, pin: u8) -> Result<(), PinError> {
        self.outputs.entry(pin).or_insert(false);
        self.journal.push(PinEvent::ConfiguredOutput { pin });
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<bool, PinError> {
        if !self.configured_inputs.contains_key(&pin) {
            return Err(PinError::NotConfigured { pin });
        }
        let level = match self.input_scripts.get_mut(&pin).and_then(|s| s.pop_front()) {
            Some(next) => {
                self.input_last.insert(pin, next);
                next
            }
            None => self.input_last.get(&pin).copied().unwrap_or(false),
        };
        self.journal.push(PinEvent::Read { pin, level });
        Ok(level)
    }

    fn write(&mut self, pin: u8, level: bool) -> Result<(), PinError> {
        if !self.outputs.contains_key(&pin) {
            return Err(PinError::NotConfigured { pin });
        }
        self.outputs.insert(pin, level);
        self.journal.push(PinEvent::Wrote { pin, level });
        Ok(())
    }
}

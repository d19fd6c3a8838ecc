// errors.rs
//
// Error types for the Tomasulo ROB simulator.

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Parsing errors
    ParseError { line: usize, text: String },
    UnknownOpcode { line: usize, opcode: String },

    // System errors
    IoError(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ParseError { line, text } => {
                write!(f, "parse error at line {}: {:?}", line, text)
            },
            SimulatorError::UnknownOpcode { line, opcode } => {
                write!(f, "unknown opcode {:?} at line {}", opcode, line)
            },
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}

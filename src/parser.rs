//! Byte-at-a-time command decoder.
//!
//! | Bytes        | Command                        |
//! |--------------|--------------------------------|
//! | `0`..`8`     | set timeout level, release     |
//! | `ON`         | release, no timeout            |
//! | `OFF`        | hold reset, no timeout         |
//! | `RST`        | reset pulse                    |
//! | `L0` / `L1`  | LED off / on                   |
//! | `?`          | status reply                   |
//!
//! A byte that does not continue the current prefix drops the prefix and is
//! itself discarded, even if it could start a new command. There is no
//! buffering and no error reporting.

use crate::timer::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    #[default]
    Idle,
    L,
    O,
    Of,
    R,
    Rs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    SetTimeout(Level),
    Arm,
    Disarm,
    ForceReset,
    SetLed(bool),
    Query,
}

impl Command {
    /// Wire encoding, for the host side.
    pub fn encode(self, buf: &mut [u8; 3]) -> &[u8] {
        let len = match self {
            Command::SetTimeout(level) => {
                buf[0] = level.to_digit();
                1
            }
            Command::Arm => {
                buf[..2].copy_from_slice(b"ON");
                2
            }
            Command::Disarm => {
                buf.copy_from_slice(b"OFF");
                3
            }
            Command::ForceReset => {
                buf.copy_from_slice(b"RST");
                3
            }
            Command::SetLed(on) => {
                buf[0] = b'L';
                buf[1] = if on { b'1' } else { b'0' };
                2
            }
            Command::Query => {
                buf[0] = b'?';
                1
            }
        };
        &buf[..len]
    }
}

#[derive(Debug, Default)]
pub struct Parser {
    state: ParserState,
}

impl Parser {
    pub const fn new() -> Self {
        Self {
            state: ParserState::Idle,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn push(&mut self, byte: u8) -> Option<Command> {
        use ParserState::*;

        let (next, command) = match (self.state, byte) {
            (Idle, b'L') => (L, None),
            (Idle, b'O') => (O, None),
            (Idle, b'R') => (R, None),
            (Idle, b'?') => (Idle, Some(Command::Query)),
            (Idle, digit) => (Idle, Level::from_digit(digit).map(Command::SetTimeout)),

            (L, b'0') => (Idle, Some(Command::SetLed(false))),
            (L, b'1') => (Idle, Some(Command::SetLed(true))),

            (O, b'N') => (Idle, Some(Command::Arm)),
            (O, b'F') => (Of, None),
            (Of, b'F') => (Idle, Some(Command::Disarm)),

            (R, b'S') => (Rs, None),
            (Rs, b'T') => (Idle, Some(Command::ForceReset)),

            (_, _) => (Idle, None),
        };

        if next == Idle && command.is_none() && self.state != Idle {
            trace!("dropped partial command at {:?}", self.state);
        }
        self.state = next;
        command
    }
}

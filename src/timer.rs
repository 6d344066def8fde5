//! The watchdog countdown.
//!
//! A single signed register, in ticks, holds the whole state:
//!
//! * `0`: disabled, reset released, nothing happens on tick.
//! * `> 0`: counting down. Reaching zero asserts reset and reloads the
//!   register with the negative hold time.
//! * `< 0`: reset held, counting up. Reaching zero releases reset and leaves
//!   the watchdog disabled.
//!
//! A timeout therefore always ends with one reset pulse and then stays
//! disabled until the host sends a new level.

use core::cmp::Ordering;

use embedded_hal_1::digital::OutputPin;

use crate::config::TickConfig;
use crate::driver::ResetLed;
use crate::reply::Status;

/// Timeout level `0..=8`, giving `2^level - 1` units (0 to about 261 s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Level(u8);

impl Level {
    pub const MAX: u8 = 8;
    pub const OFF: Level = Level(0);

    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX {
            Some(Level(level))
        } else {
            None
        }
    }

    /// Level for an ASCII digit `'0'..='8'`.
    pub const fn from_digit(byte: u8) -> Option<Self> {
        match byte {
            b'0'..=b'8' => Some(Level(byte - b'0')),
            _ => None,
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn to_digit(self) -> u8 {
        b'0' + self.0
    }

    /// Timeout length in units.
    pub const fn units(self) -> u32 {
        (1u32 << self.0) - 1
    }
}

/// The register decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Disabled,
    /// Ticks left before reset is asserted.
    CountingDown(u32),
    /// Ticks left before reset is released.
    Holding(u32),
}

/// A change of the RESET line caused by [`Watchdog::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Asserted,
    Released,
}

pub struct Watchdog<R, L> {
    register: i32,
    config: TickConfig,
    lines: ResetLed<R, L>,
}

impl<R, L> Watchdog<R, L>
where
    R: OutputPin,
    L: OutputPin,
{
    /// Starts disabled with reset released.
    pub fn new(lines: ResetLed<R, L>, config: TickConfig) -> Self {
        let mut dog = Self {
            register: 0,
            config,
            lines,
        };
        dog.set_duration(Level::OFF);
        dog.lines.release_reset();
        dog
    }

    /// Loads the countdown. Leaves the RESET line alone.
    pub fn set_duration(&mut self, level: Level) {
        let ticks = level.units() * self.config.ticks_per_unit();
        self.register = ticks as i32;
    }

    /// `ON`: release reset, no countdown.
    pub fn arm(&mut self) {
        self.lines.release_reset();
        self.set_duration(Level::OFF);
    }

    /// `OFF`: hold reset with no automatic release.
    pub fn disarm(&mut self) {
        self.lines.assert_reset();
        self.set_duration(Level::OFF);
    }

    /// `RST`: assert now, release after the hold time.
    pub fn force_reset(&mut self) {
        self.lines.assert_reset();
        self.register = -(self.config.hold_ticks() as i32);
    }

    pub fn tick(&mut self) -> Option<Edge> {
        match self.register.cmp(&0) {
            Ordering::Greater => {
                self.register -= 1;
                if self.register == 0 {
                    self.force_reset();
                    return Some(Edge::Asserted);
                }
            }
            Ordering::Less => {
                self.register += 1;
                if self.register == 0 {
                    self.lines.release_reset();
                    return Some(Edge::Released);
                }
            }
            Ordering::Equal => {}
        }
        None
    }

    /// Line level and remaining whole units, saturated to a byte.
    pub fn query(&self) -> Status {
        let units = self.register.unsigned_abs() / self.config.ticks_per_unit();
        Status {
            line_high: !self.lines.is_reset_asserted(),
            remaining: units.min(u8::MAX as u32) as u8,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.register.cmp(&0) {
            Ordering::Equal => Mode::Disabled,
            Ordering::Greater => Mode::CountingDown(self.register as u32),
            Ordering::Less => Mode::Holding(self.register.unsigned_abs()),
        }
    }

    pub fn register(&self) -> i32 {
        self.register
    }

    pub fn config(&self) -> TickConfig {
        self.config
    }

    pub fn lines(&self) -> &ResetLed<R, L> {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut ResetLed<R, L> {
        &mut self.lines
    }
}

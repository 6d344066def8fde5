//! Timing configuration.
//!
//! Everything the engine counts is expressed in scheduler ticks. The tick
//! period is the only input. The timeout unit and the reset hold time are
//! derived from it.

/// Scheduler period of the reference hardware, 8ms (about 1/128 s).
pub const DEFAULT_TICK_PERIOD_US: u32 = 8_000;

/// One timeout "second". 128 ticks of 8ms, so 1.024 s of wall time.
pub const UNIT_US: u32 = 1_024_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickConfig {
    tick_period_us: u32,
}

impl TickConfig {
    /// A period of zero or longer than one unit is clamped so that a unit is
    /// always at least two ticks.
    pub const fn new(tick_period_us: u32) -> Self {
        let tick_period_us = if tick_period_us == 0 {
            1
        } else if tick_period_us > UNIT_US / 2 {
            UNIT_US / 2
        } else {
            tick_period_us
        };
        Self { tick_period_us }
    }

    pub const fn tick_period_us(&self) -> u32 {
        self.tick_period_us
    }

    /// Ticks in one timeout unit (128 at 8ms).
    pub const fn ticks_per_unit(&self) -> u32 {
        UNIT_US / self.tick_period_us
    }

    /// Length of the reset pulse for a forced or expired watchdog, half a unit
    /// (64 ticks at 8ms).
    pub const fn hold_ticks(&self) -> u32 {
        self.ticks_per_unit() / 2
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD_US)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_cadence() {
        let config = TickConfig::default();
        assert_eq!(config.ticks_per_unit(), 128);
        assert_eq!(config.hold_ticks(), 64);
    }

    #[test]
    fn faster_tick_rescales_both_constants() {
        let config = TickConfig::new(4_000);
        assert_eq!(config.ticks_per_unit(), 256);
        assert_eq!(config.hold_ticks(), 128);
    }

    #[test]
    fn degenerate_periods_are_clamped() {
        assert_eq!(TickConfig::new(0).tick_period_us(), 1);
        assert_eq!(TickConfig::new(u32::MAX).ticks_per_unit(), 2);
        assert_eq!(TickConfig::new(u32::MAX).hold_ticks(), 1);
    }
}

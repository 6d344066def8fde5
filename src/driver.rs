//! RESET and LED outputs.
//!
//! The RESET pin must be open drain: asserting drives it low, releasing
//! lets the target's pull-up take it high. The LED is a plain push-pull
//! output, on while reset is asserted unless overridden by an `L0`/`L1`
//! command.

use embedded_hal_1::digital::OutputPin;

pub struct ResetLed<R, L> {
    reset: R,
    led: L,
    asserted: bool,
    led_on: bool,
}

impl<R, L> ResetLed<R, L>
where
    R: OutputPin,
    L: OutputPin,
{
    /// Takes the pins and puts them in the boot state: released, LED off.
    pub fn new(reset: R, led: L) -> Self {
        let mut driver = Self {
            reset,
            led,
            asserted: false,
            led_on: false,
        };
        driver.release_reset();
        driver
    }

    pub fn assert_reset(&mut self) {
        if self.reset.set_low().is_err() {
            warn!("failed to drive RESET low");
        }
        self.asserted = true;
        self.set_led(true);
    }

    pub fn release_reset(&mut self) {
        if self.reset.set_high().is_err() {
            warn!("failed to release RESET");
        }
        self.asserted = false;
        self.set_led(false);
    }

    pub fn set_led(&mut self, on: bool) {
        let result = if on { self.led.set_high() } else { self.led.set_low() };
        if result.is_err() {
            warn!("failed to set LED");
        }
        self.led_on = on;
    }

    pub fn is_reset_asserted(&self) -> bool {
        self.asserted
    }

    pub fn is_led_on(&self) -> bool {
        self.led_on
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakePin;
    use super::*;

    fn driver() -> (ResetLed<FakePin, FakePin>, FakePin, FakePin) {
        let reset = FakePin::default();
        let led = FakePin::default();
        (ResetLed::new(reset.clone(), led.clone()), reset, led)
    }

    #[test]
    fn boots_released_with_led_off() {
        let (d, reset, led) = driver();
        assert!(!d.is_reset_asserted());
        assert_eq!(reset.level(), Some(true));
        assert_eq!(led.level(), Some(false));
    }

    #[test]
    fn assert_drives_low_and_lights_led() {
        let (mut d, reset, led) = driver();
        d.assert_reset();
        assert!(d.is_reset_asserted());
        assert_eq!(reset.level(), Some(false));
        assert_eq!(led.level(), Some(true));

        d.release_reset();
        assert_eq!(reset.level(), Some(true));
        assert_eq!(led.level(), Some(false));
    }

    #[test]
    fn led_is_independent_of_reset() {
        let (mut d, reset, led) = driver();
        d.set_led(true);
        assert!(d.is_led_on());
        assert!(!d.is_reset_asserted());
        assert_eq!(reset.level(), Some(true));
        assert_eq!(led.level(), Some(true));
    }
}

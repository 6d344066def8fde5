//! Supervisory hardware watchdog. Independent of the watchdog engine: it
//! resets this device, not the target, if the scheduler stops running.

use defmt::*;
use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::Watchdog;
use embassy_time::Duration;

const SUPERVISOR_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) struct Supervisor {
    dog: Watchdog,
}

impl Supervisor {
    pub(crate) fn start(watchdog: WATCHDOG) -> Self {
        let mut dog = Watchdog::new(watchdog);
        if dog.reset_reason().is_some() {
            warn!("Recovered from a supervisory reset");
        }
        dog.start(SUPERVISOR_TIMEOUT);
        info!("Supervisor enabled, timeout {} ms", SUPERVISOR_TIMEOUT.as_millis());
        Supervisor { dog }
    }

    pub(crate) fn feed(&mut self) {
        self.dog.feed();
    }

    /// The scheduler period must leave room for several feeds per timeout.
    pub(crate) fn covers(&self, period: Duration) -> bool {
        period * 4 < SUPERVISOR_TIMEOUT
    }
}

//! Fixed cadence loop driving the engine. Exactly one engine tick per
//! period; the period comes from the engine's own `TickConfig` so the
//! timeout units stay in wall time.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::{Output, OutputOpenDrain};
use embassy_time::{Duration, Ticker};

use uwd_engine::Engine;

use crate::cdc_acm::{NOTIFY_CHANNEL, RX_CHANNEL, TX_CHANNEL, TX_GATE};
use crate::usb_device_handler::ATTACHED;
use crate::watchdog::Supervisor;
use crate::CARRIER;

pub(crate) type AppEngine = Engine<OutputOpenDrain<'static>, Output<'static>>;

#[embassy_executor::task]
pub(crate) async fn scheduler_task(mut engine: AppEngine, mut supervisor: Supervisor) -> ! {
    let period = Duration::from_micros(engine.watchdog().config().tick_period_us() as u64);
    if !supervisor.covers(period) {
        warn!("Tick period {} us is too long for the supervisor", period.as_micros());
    }
    let mut ticker = Ticker::every(period);

    loop {
        supervisor.feed();

        // host => device
        while let Ok(packet) = RX_CHANNEL.try_receive() {
            engine.receive(packet.as_bytes());
        }

        // host <= device, replies wait in the engine until a host is attached
        if ATTACHED.load(Ordering::Relaxed) {
            if let Some(reply) = engine.hand_off(&TX_GATE) {
                if TX_CHANNEL.try_send(reply).is_err() {
                    warn!("Reply channel full while the endpoint was idle");
                    TX_GATE.release();
                }
            }

            if let Some(packet) = CARRIER.next_packet() {
                if NOTIFY_CHANNEL.try_send(packet).is_ok() {
                    CARRIER.sent();
                }
            }
        }

        engine.tick();
        ticker.next().await;
    }
}

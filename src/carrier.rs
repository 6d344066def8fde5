//! Carrier detect notification.
//!
//! Some hosts only open a tty once carrier detect is reported, so every
//! SET_CONTROL_LINE_STATE from the host is answered with a SERIAL_STATE
//! notification on the interrupt endpoint. It goes out in two packets: the
//! 8 byte header, then the 2 byte state.
//!
//! `request` runs in the USB control handler and `next_packet`/`sent` run in
//! the scheduler loop, so the stage lives in a single atomic byte. Requests
//! arriving while a notification is in flight are dropped.

use portable_atomic::{AtomicU8, Ordering};

use crate::cdc::SERIAL_STATE;

const IDLE: u8 = 0;
const STATE: u8 = 1;
const HEADER: u8 = 2;

pub struct CarrierNotifier {
    stage: AtomicU8,
}

impl CarrierNotifier {
    pub const fn new() -> Self {
        Self {
            stage: AtomicU8::new(IDLE),
        }
    }

    pub fn request(&self) {
        if self
            .stage
            .compare_exchange(IDLE, HEADER, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("carrier notification queued");
        }
    }

    /// Packet to send next, if any. Call [`sent`](Self::sent) once the
    /// transport has taken it.
    pub fn next_packet(&self) -> Option<&'static [u8]> {
        match self.stage.load(Ordering::Acquire) {
            HEADER => Some(&SERIAL_STATE[..8]),
            STATE => Some(&SERIAL_STATE[8..]),
            _ => None,
        }
    }

    pub fn sent(&self) {
        let _ = self
            .stage
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |stage| {
                stage.checked_sub(1)
            });
    }

    pub fn is_idle(&self) -> bool {
        self.stage.load(Ordering::Acquire) == IDLE
    }
}

impl Default for CarrierNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_stage_sequence() {
        let n = CarrierNotifier::new();
        assert!(n.next_packet().is_none());

        n.request();
        assert_eq!(n.next_packet(), Some(&[0xa1, 0x20, 0, 0, 0, 0, 2, 0][..]));
        // not sent yet, same packet again
        assert_eq!(n.next_packet().map(<[u8]>::len), Some(8));
        n.sent();
        assert_eq!(n.next_packet(), Some(&[3, 0][..]));
        n.sent();
        assert!(n.is_idle());
        assert!(n.next_packet().is_none());
    }

    #[test]
    fn request_in_flight_is_not_retriggered() {
        let n = CarrierNotifier::new();
        n.request();
        n.sent();
        n.request();
        assert_eq!(n.next_packet(), Some(&[3, 0][..]));
        n.sent();
        assert!(n.is_idle());

        n.request();
        assert_eq!(n.next_packet().map(<[u8]>::len), Some(8));
    }

    #[test]
    fn sent_when_idle_is_harmless() {
        let n = CarrierNotifier::new();
        n.sent();
        assert!(n.is_idle());
    }
}

//! Status reply and the single outbound reply slot.

use portable_atomic::{AtomicBool, Ordering};

/// Largest reply the transport accepts in one packet.
pub const REPLY_CAPACITY: usize = 8;

/// Answer to `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Level of the RESET pin: high when released, low when asserted.
    pub line_high: bool,
    /// Remaining whole timeout units, either until reset or until release.
    pub remaining: u8,
}

impl Status {
    pub const WIRE_LEN: usize = 2;

    /// `['0' | '1', remaining]`
    pub const fn to_bytes(self) -> [u8; Self::WIRE_LEN] {
        [b'0' + self.line_high as u8, self.remaining]
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [state @ (b'0' | b'1'), remaining] => Some(Status {
                line_high: *state == b'1',
                remaining: *remaining,
            }),
            _ => None,
        }
    }
}

/// A reply waiting for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    buf: [u8; REPLY_CAPACITY],
    len: u8,
}

impl Reply {
    /// Anything past [`REPLY_CAPACITY`] is cut off.
    pub fn new(data: &[u8]) -> Self {
        let len = data.len().min(REPLY_CAPACITY);
        let mut buf = [0; REPLY_CAPACITY];
        buf[..len].copy_from_slice(&data[..len]);
        Self { buf, len: len as u8 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

impl From<Status> for Reply {
    fn from(status: Status) -> Self {
        Reply::new(&status.to_bytes())
    }
}

/// Holds at most one reply. A newer reply replaces one not yet sent.
#[derive(Debug, Default)]
pub struct ReplySlot {
    pending: Option<Reply>,
}

impl ReplySlot {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    pub fn put(&mut self, reply: Reply) {
        if self.pending.is_some() {
            trace!("unsent reply overwritten");
        }
        self.pending = Some(reply);
    }

    pub fn take(&mut self) -> Option<Reply> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Ownership of the IN endpoint. A reply leaves the [`ReplySlot`] only once
/// the gate is claimed, and the writer frees it when the write returns, so
/// nothing queues behind a write the host never reads.
pub struct TxGate {
    busy: AtomicBool,
}

impl TxGate {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Claims the endpoint if it is idle.
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Default for TxGate {
    fn default() -> Self {
        Self::new()
    }
}

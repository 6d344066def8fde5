#![cfg_attr(all(not(test), not(feature = "use-std")), no_std)]

//! Watchdog engine for a USB attached reset controller.
//!
//! The host talks to the device over a CDC-ACM serial channel using single
//! byte ASCII commands. Bytes are fed to a [`Parser`], the decoded
//! [`Command`]s are applied by the [`Engine`] to the [`Watchdog`], and the
//! watchdog drives the target's RESET line and the status LED through a
//! [`ResetLed`] driver. Time only moves when the scheduler calls
//! [`Engine::tick`].
//!
//! Shared by the RP2040 firmware and the host test client.

// must come first so the macros are visible in the other modules
mod fmt;

pub mod carrier;
pub mod cdc;
pub mod config;
pub mod driver;
pub mod engine;
pub mod parser;
pub mod reply;
pub mod timer;

pub use carrier::CarrierNotifier;
pub use config::TickConfig;
pub use driver::ResetLed;
pub use engine::Engine;
pub use parser::{Command, Parser, ParserState};
pub use reply::{Reply, ReplySlot, Status, TxGate};
pub use timer::{Edge, Level, Mode, Watchdog};

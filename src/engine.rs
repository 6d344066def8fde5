//! Parser, watchdog and reply slot wired together.
//!
//! The scheduler owns the engine and is the only caller: it feeds inbound
//! packets with [`receive`](Engine::receive), calls [`tick`](Engine::tick)
//! once per period and hands [`take_reply`](Engine::take_reply) to the
//! transport when it has room.

use embedded_hal_1::digital::OutputPin;

use crate::config::TickConfig;
use crate::driver::ResetLed;
use crate::parser::{Command, Parser};
use crate::reply::{Reply, ReplySlot, TxGate};
use crate::timer::{Edge, Level, Watchdog};

pub struct Engine<R, L> {
    parser: Parser,
    watchdog: Watchdog<R, L>,
    reply: ReplySlot,
}

impl<R, L> Engine<R, L>
where
    R: OutputPin,
    L: OutputPin,
{
    pub fn new(lines: ResetLed<R, L>, config: TickConfig) -> Self {
        Self {
            parser: Parser::new(),
            watchdog: Watchdog::new(lines, config),
            reply: ReplySlot::new(),
        }
    }

    /// Feeds one inbound packet, in order. Commands may span packets.
    pub fn receive(&mut self, data: &[u8]) {
        for &byte in data {
            if let Some(command) = self.parser.push(byte) {
                self.execute(command);
            }
        }
    }

    pub fn execute(&mut self, command: Command) {
        debug!("command {:?}", command);
        match command {
            Command::SetTimeout(level) => self.set_timeout(level),
            Command::Arm => self.watchdog.arm(),
            Command::Disarm => self.watchdog.disarm(),
            Command::ForceReset => self.watchdog.force_reset(),
            Command::SetLed(on) => self.watchdog.lines_mut().set_led(on),
            Command::Query => {
                let status = self.watchdog.query();
                self.reply.put(Reply::from(status));
            }
        }
    }

    fn set_timeout(&mut self, level: Level) {
        self.watchdog.set_duration(level);
        self.watchdog.lines_mut().release_reset();
    }

    pub fn tick(&mut self) -> Option<Edge> {
        let edge = self.watchdog.tick();
        match edge {
            Some(Edge::Asserted) => info!("watchdog expired, asserting reset"),
            Some(Edge::Released) => info!("reset released"),
            None => {}
        }
        edge
    }

    pub fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }

    /// Takes the pending reply only if the endpoint is free, claiming it.
    /// While a write is outstanding the reply stays in the slot, where a
    /// newer `?` still replaces it.
    pub fn hand_off(&mut self, gate: &TxGate) -> Option<Reply> {
        if !self.reply.is_pending() || !gate.try_claim() {
            return None;
        }
        self.reply.take()
    }

    pub fn has_reply(&self) -> bool {
        self.reply.is_pending()
    }

    pub fn watchdog(&self) -> &Watchdog<R, L> {
        &self.watchdog
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::FakePin;
    use crate::parser::ParserState;
    use crate::reply::Status;
    use crate::timer::Mode;

    struct Rig {
        engine: Engine<FakePin, FakePin>,
        reset: FakePin,
        led: FakePin,
    }

    impl Rig {
        fn new() -> Self {
            let reset = FakePin::default();
            let led = FakePin::default();
            let lines = ResetLed::new(reset.clone(), led.clone());
            Rig {
                engine: Engine::new(lines, TickConfig::default()),
                reset,
                led,
            }
        }

        fn send(&mut self, data: &[u8]) {
            self.engine.receive(data);
        }

        fn query(&mut self) -> Status {
            self.send(b"?");
            let reply = self.engine.take_reply().expect("no reply to ?");
            Status::from_bytes(reply.as_bytes()).expect("malformed reply")
        }

        fn ticks(&mut self, n: u32) -> [u32; 2] {
            let mut edges = [0; 2];
            for _ in 0..n {
                match self.engine.tick() {
                    Some(Edge::Asserted) => edges[0] += 1,
                    Some(Edge::Released) => edges[1] += 1,
                    None => {}
                }
            }
            edges
        }

        fn reset_asserted(&self) -> bool {
            self.reset.level() == Some(false)
        }

        fn led_on(&self) -> bool {
            self.led.level() == Some(true)
        }
    }

    #[test]
    fn every_level_times_out_once() {
        for n in 0..=8u32 {
            let mut rig = Rig::new();
            rig.send(&[b'0' + n as u8]);
            let status = rig.query();
            assert!(status.line_high);
            let ticks = ((1 << n) - 1) * 128;
            assert_eq!(status.remaining as u32, (1 << n) - 1);

            if n == 0 {
                assert_eq!(rig.ticks(100_000), [0, 0]);
                assert!(!rig.reset_asserted());
                continue;
            }

            assert_eq!(rig.ticks(ticks - 1), [0, 0]);
            assert!(!rig.reset_asserted());
            assert_eq!(rig.ticks(1), [1, 0]);
            assert!(rig.reset_asserted());
            assert_eq!(rig.ticks(63), [0, 0]);
            assert_eq!(rig.ticks(1), [0, 1]);
            assert!(!rig.reset_asserted());
            assert_eq!(rig.ticks(ticks * 2), [0, 0]);
        }
    }

    #[test]
    fn digit_releases_a_held_reset() {
        let mut rig = Rig::new();
        rig.send(b"OFF");
        assert!(rig.reset_asserted());
        rig.send(b"3");
        assert!(!rig.reset_asserted());
        assert_eq!(rig.engine.watchdog().mode(), Mode::CountingDown(7 * 128));
    }

    #[test]
    fn on_always_releases_and_clears() {
        for setup in [&b"5"[..], b"RST", b"OFF", b""] {
            let mut rig = Rig::new();
            rig.send(setup);
            rig.ticks(10);
            rig.send(b"ON");
            assert!(!rig.reset_asserted());
            assert_eq!(rig.engine.watchdog().register(), 0);
            assert_eq!(rig.ticks(50_000), [0, 0]);
        }
    }

    #[test]
    fn off_holds_with_no_release() {
        for setup in [&b"8"[..], b"RST", b"ON"] {
            let mut rig = Rig::new();
            rig.send(setup);
            rig.send(b"OFF");
            assert!(rig.reset_asserted());
            assert_eq!(rig.engine.watchdog().register(), 0);
            assert_eq!(rig.ticks(50_000), [0, 0]);
            assert!(rig.reset_asserted());
        }
    }

    #[test]
    fn rst_pulses_for_the_hold_time() {
        let mut rig = Rig::new();
        rig.send(b"8");
        rig.ticks(1_000);
        rig.send(b"RST");
        assert!(rig.reset_asserted());
        assert!(rig.led_on());
        assert_eq!(rig.ticks(63), [0, 0]);
        assert!(rig.reset_asserted());
        assert_eq!(rig.ticks(1), [0, 1]);
        assert!(!rig.reset_asserted());
        assert!(!rig.led_on());
    }

    #[test]
    fn aborted_prefix_has_no_effect() {
        let mut rig = Rig::new();
        rig.send(b"2");
        let before = rig.engine.watchdog().register();
        rig.send(b"OX");
        rig.send(b"RSX");
        rig.send(b"L7");
        assert_eq!(rig.engine.watchdog().register(), before);
        assert!(!rig.reset_asserted());
        assert!(!rig.led_on());
        assert_eq!(rig.engine.parser().state(), ParserState::Idle);

        rig.send(b"OFF");
        assert!(rig.reset_asserted());
    }

    #[test]
    fn led_override_until_next_edge() {
        let mut rig = Rig::new();
        rig.send(b"1");
        rig.send(b"L1");
        assert!(rig.led_on());
        assert!(!rig.reset_asserted());
        assert_eq!(rig.engine.watchdog().register(), 128);

        rig.ticks(128);
        assert!(rig.led_on());
        rig.send(b"L0");
        assert!(!rig.led_on());
        assert!(rig.reset_asserted());
        rig.ticks(64);
        assert!(!rig.led_on());
        assert!(!rig.reset_asserted());

        rig.send(b"L1OFF");
        assert!(rig.led_on());
        rig.send(b"L0ON");
        assert!(!rig.led_on());
    }

    #[test]
    fn query_twice_is_identical() {
        let mut rig = Rig::new();
        rig.send(b"6");
        rig.ticks(500);
        assert_eq!(rig.query(), rig.query());
        assert_eq!(rig.engine.watchdog().register(), 63 * 128 - 500);
    }

    #[test]
    fn unsent_reply_is_replaced() {
        let mut rig = Rig::new();
        rig.send(b"?");
        rig.send(b"OFF?");
        let reply = rig.engine.take_reply().unwrap();
        assert_eq!(reply.as_bytes(), b"0\x00");
        assert!(!rig.engine.has_reply());
    }

    #[test]
    fn commands_split_across_packets() {
        let mut rig = Rig::new();
        rig.send(b"O");
        rig.send(b"F");
        assert!(!rig.reset_asserted());
        rig.send(b"F");
        assert!(rig.reset_asserted());

        rig.send(b"R");
        rig.send(b"S");
        rig.send(b"T");
        assert_eq!(rig.engine.watchdog().mode(), Mode::Holding(64));
    }

    #[test]
    fn blocked_writer_keeps_only_the_newest_reply() {
        let gate = TxGate::new();
        let mut rig = Rig::new();

        rig.send(b"3?");
        let first = rig.engine.hand_off(&gate).unwrap();
        assert_eq!(first.as_bytes(), b"1\x07");

        // host not reading, the first write is still outstanding
        rig.ticks(1);
        rig.send(b"?");
        assert_eq!(rig.engine.hand_off(&gate), None);
        rig.send(b"OFF?");
        assert_eq!(rig.engine.hand_off(&gate), None);
        assert!(rig.engine.has_reply());

        gate.release();
        let next = rig.engine.hand_off(&gate).unwrap();
        assert_eq!(next.as_bytes(), b"0\x00");
        assert_eq!(rig.engine.hand_off(&gate), None);
        assert!(gate.is_busy());
    }

    #[test]
    fn idle_gate_is_not_claimed_without_a_reply() {
        let gate = TxGate::new();
        let mut rig = Rig::new();
        assert_eq!(rig.engine.hand_off(&gate), None);
        assert!(!gate.is_busy());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_delivery_matches_single_delivery(
                data in proptest::collection::vec(
                    prop::sample::select(&b"0123456789LOFNRST?X"[..]), 0..64),
                at in any::<prop::sample::Index>(),
            ) {
                let at = at.index(data.len() + 1);

                let mut whole = Rig::new();
                whole.send(&data);
                let mut split = Rig::new();
                split.send(&data[..at]);
                split.send(&data[at..]);

                prop_assert_eq!(whole.engine.watchdog().register(), split.engine.watchdog().register());
                prop_assert_eq!(whole.reset.level(), split.reset.level());
                prop_assert_eq!(whole.led.level(), split.led.level());
                prop_assert_eq!(whole.engine.take_reply(), split.engine.take_reply());
            }
        }
    }
}

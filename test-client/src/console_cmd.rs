//! Interactive console syntax for `uwdctl`.

use std::time::Duration;

use uwd_engine::{Command, Level};

#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    Send(Command),
    Status,
    KeepAlive { level: Level, every: Duration },
    Quit,
}

pub const HELP: &str =
    "TIMEOUT <0-8> | ON | OFF | RST | LED <on|off> | STATUS | KEEPALIVE <0-8> <secs> | QUIT";

pub fn parse_line(line: &str) -> Result<ConsoleCommand, &'static str> {
    let parts: Vec<_> = line.split_ascii_whitespace().collect();
    let Some(first) = parts.first() else {
        return Err("No command entered");
    };

    let command = match (first.to_ascii_uppercase().as_str(), &parts[1..]) {
        ("TIMEOUT", [level]) => ConsoleCommand::Send(Command::SetTimeout(parse_level(level)?)),
        ("ON", []) => ConsoleCommand::Send(Command::Arm),
        ("OFF", []) => ConsoleCommand::Send(Command::Disarm),
        ("RST", []) => ConsoleCommand::Send(Command::ForceReset),
        ("LED", [state]) => match state.to_ascii_lowercase().as_str() {
            "on" | "1" => ConsoleCommand::Send(Command::SetLed(true)),
            "off" | "0" => ConsoleCommand::Send(Command::SetLed(false)),
            _ => return Err("LED state should be on or off"),
        },
        ("STATUS", []) => ConsoleCommand::Status,
        ("KEEPALIVE", [level, secs]) => {
            let secs: u64 = secs.parse().map_err(|_| "Interval should be whole seconds")?;
            if secs == 0 {
                return Err("Interval should be at least one second");
            }
            ConsoleCommand::KeepAlive {
                level: parse_level(level)?,
                every: Duration::from_secs(secs),
            }
        }
        ("QUIT" | "EXIT", []) => ConsoleCommand::Quit,
        _ => return Err(HELP),
    };
    Ok(command)
}

fn parse_level(s: &str) -> Result<Level, &'static str> {
    s.parse::<u8>()
        .ok()
        .and_then(Level::new)
        .ok_or("Level should be 0 to 8")
}

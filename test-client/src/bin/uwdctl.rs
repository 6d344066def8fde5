use std::io::Write;

use console::style;
use tokio::time::interval;

use uwd_engine::{Command, Level, Status};
use uwd_test_client::client::{ClientError, WatchdogClient};
use uwd_test_client::console_cmd::{parse_line, ConsoleCommand, HELP};
use uwd_test_client::read_line;

#[tokio::main]
pub async fn main() {
    // RUST_LOG=debug shows the raw bytes on the wire
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let client = match WatchdogClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {e}", style("Could not open watchdog:").red());
            std::process::exit(1);
        }
    };

    match client.status().await {
        Ok(status) => print_status(status),
        Err(e) => println!("{} {e}", style("Status query failed:").yellow()),
    }

    println!("{HELP}");
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let line = read_line().await;
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        let result = match command {
            ConsoleCommand::Send(command) => client.send(command).await,
            ConsoleCommand::Status => client.status().await.map(print_status),
            ConsoleCommand::KeepAlive { level, every } => keep_alive(&client, level, every).await,
            ConsoleCommand::Quit => break,
        };
        if let Err(e) = result {
            println!("{} {e}", style("Error:").red());
        }
    }
}

/// Re-sends the timeout level until Ctrl-C, then sends `ON` so the
/// countdown stops and the target is not reset on exit.
async fn keep_alive(
    client: &WatchdogClient,
    level: Level,
    every: std::time::Duration,
) -> Result<(), ClientError> {
    println!(
        "Feeding level {} every {}s, Ctrl-C to stop",
        level.get(),
        every.as_secs()
    );
    let mut ticker = interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                client.set_timeout(level).await?;
                print!(".");
                let _ = std::io::stdout().flush();
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                return client.send(Command::Arm).await;
            }
        }
    }
}

fn print_status(status: Status) {
    let line = if status.line_high {
        style("released").green()
    } else {
        style("asserted").red()
    };
    println!("RESET {line}, {} units remaining", status.remaining);
}

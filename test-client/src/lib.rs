pub mod client;
pub mod console_cmd;

/// Reads one line from the terminal without blocking the runtime.
pub async fn read_line() -> String {
    tokio::task::spawn_blocking(|| console::Term::stdout().read_line().unwrap_or_default())
        .await
        .unwrap_or_default()
}

use std::fmt;
use std::time::Duration;

use nusb::transfer::{Direction, EndpointType, RequestBuffer, TransferError};
use log::{debug, info};
use nusb::{DeviceInfo, Interface};

use uwd_engine::cdc::{USB_CLASS_CDC_DATA, USB_PID, USB_VID};
use uwd_engine::{Command, Level, Status};

const REPLY_TIMEOUT: Duration = Duration::from_millis(500);
const READ_SIZE: usize = 64;

#[derive(Debug)]
pub enum ClientError {
    NotFound,
    NoCdcInterface,
    Usb(nusb::Error),
    Transfer(TransferError),
    Timeout,
    BadReply(Vec<u8>),
}

impl From<nusb::Error> for ClientError {
    fn from(value: nusb::Error) -> Self {
        Self::Usb(value)
    }
}

impl From<TransferError> for ClientError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NotFound => write!(f, "no watchdog device found"),
            ClientError::NoCdcInterface => write!(f, "device has no CDC data interface"),
            ClientError::Usb(e) => write!(f, "usb error: {e}"),
            ClientError::Transfer(e) => write!(f, "transfer failed: {e}"),
            ClientError::Timeout => write!(f, "no reply from device"),
            ClientError::BadReply(bytes) => write!(f, "unexpected reply {bytes:02x?}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Raw bulk access to the device's CDC data interface, bypassing the tty.
pub struct WatchdogClient {
    interface: Interface,
    ep_out: u8,
    ep_in: u8,
}

impl WatchdogClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::open_with(|d| d.vendor_id() == USB_VID && d.product_id() == USB_PID)
    }

    pub fn open_with(filter: impl Fn(&DeviceInfo) -> bool) -> Result<Self, ClientError> {
        let info = nusb::list_devices()?
            .find(|d| filter(d))
            .ok_or(ClientError::NotFound)?;
        let device = info.open()?;

        let mut found = None;
        for config in device.configurations() {
            for alt in config.interface_alt_settings() {
                if alt.class() != USB_CLASS_CDC_DATA {
                    continue;
                }
                let mut ep_out = None;
                let mut ep_in = None;
                for ep in alt.endpoints() {
                    if ep.transfer_type() != EndpointType::Bulk {
                        continue;
                    }
                    match ep.direction() {
                        Direction::Out => ep_out = Some(ep.address()),
                        Direction::In => ep_in = Some(ep.address()),
                    }
                }
                if let (Some(ep_out), Some(ep_in)) = (ep_out, ep_in) {
                    found = Some((alt.interface_number(), ep_out, ep_in));
                }
            }
        }
        let (number, ep_out, ep_in) = found.ok_or(ClientError::NoCdcInterface)?;

        // cdc_acm may already own the interface
        let interface = device.detach_and_claim_interface(number)?;
        info!("Claimed interface {number}, OUT {ep_out:#04x}, IN {ep_in:#04x}");
        Ok(Self {
            interface,
            ep_out,
            ep_in,
        })
    }

    pub async fn send_raw(&self, bytes: &[u8]) -> Result<(), ClientError> {
        debug!("=> {bytes:02x?}");
        self.interface
            .bulk_out(self.ep_out, bytes.to_vec())
            .await
            .into_result()?;
        Ok(())
    }

    pub async fn send(&self, command: Command) -> Result<(), ClientError> {
        let mut buf = [0; 3];
        self.send_raw(command.encode(&mut buf)).await
    }

    pub async fn set_timeout(&self, level: Level) -> Result<(), ClientError> {
        self.send(Command::SetTimeout(level)).await
    }

    pub async fn status(&self) -> Result<Status, ClientError> {
        self.send(Command::Query).await?;
        let read = self
            .interface
            .bulk_in(self.ep_in, RequestBuffer::new(READ_SIZE));
        let data = tokio::time::timeout(REPLY_TIMEOUT, read)
            .await
            .map_err(|_| ClientError::Timeout)?
            .into_result()?;
        debug!("<= {data:02x?}");
        Status::from_bytes(&data).ok_or(ClientError::BadReply(data))
    }
}

#[cfg(test)]
mod tests {
    use uwd_engine::Parser;

    use super::*;
    use crate::console_cmd::{parse_line, ConsoleCommand};

    fn decode(parser: &mut Parser, command: Command) -> Vec<Command> {
        let mut buf = [0; 3];
        command
            .encode(&mut buf)
            .iter()
            .filter_map(|&b| parser.push(b))
            .collect()
    }

    #[test]
    fn console_commands_reach_the_device_parser_intact() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut parser = Parser::new();
        for line in ["TIMEOUT 5", "ON", "OFF", "RST", "LED on", "LED off"] {
            let ConsoleCommand::Send(command) = parse_line(line).unwrap() else {
                panic!("{line} does not map to a device command");
            };
            assert_eq!(decode(&mut parser, command), [command]);
        }
        assert_eq!(decode(&mut parser, Command::Query), [Command::Query]);
    }

    #[test]
    fn stray_prefix_swallows_the_next_command() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut parser = Parser::new();
        assert_eq!(parser.push(b'R'), None);
        assert!(decode(&mut parser, Command::Disarm).is_empty());
        assert_eq!(decode(&mut parser, Command::Disarm), [Command::Disarm]);
    }
}

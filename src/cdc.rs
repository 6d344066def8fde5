//! CDC-ACM class constants for the USB transport.

/// Shared VID/PID pair for CDC-ACM devices, also used by the host client to
/// find the device.
pub const USB_VID: u16 = 0x16c0;
pub const USB_PID: u16 = 0x05e1;

pub const USB_CLASS_CDC: u8 = 0x02;
pub const USB_CLASS_CDC_DATA: u8 = 0x0a;
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
pub const CDC_PROTOCOL_NONE: u8 = 0x00;

pub const CS_INTERFACE: u8 = 0x24;
pub const CDC_TYPE_HEADER: u8 = 0x00;
pub const CDC_TYPE_CALL_MANAGEMENT: u8 = 0x01;
pub const CDC_TYPE_ACM: u8 = 0x02;
pub const CDC_TYPE_UNION: u8 = 0x06;

/// ACM capabilities: SET_LINE_CODING, GET_LINE_CODING, SET_CONTROL_LINE_STATE.
pub const ACM_CAPABILITIES: u8 = 0x02;

/// Interrupt IN endpoint size, large enough for the notification header.
pub const NOTIFY_PACKET_SIZE: u16 = 8;
pub const NOTIFY_INTERVAL_MS: u8 = 10;

/// Fixed answer to GET_LINE_CODING: 0 baud, 1 stop bit, no parity, 8 bits.
pub const LINE_CODING: [u8; 7] = [0, 0, 0, 0, 0, 0, 8];

/// SERIAL_STATE notification, header then state bitmap (DCD | DSR).
pub const SERIAL_STATE: [u8; 10] = [0xa1, 0x20, 0, 0, 0, 0, 2, 0, 3, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassRequest {
    SendEncapsulatedCommand,
    GetEncapsulatedResponse,
    SetCommFeature,
    GetCommFeature,
    ClearCommFeature,
    SetLineCoding,
    GetLineCoding,
    SetControlLineState,
    SendBreak,
}

impl TryFrom<u8> for ClassRequest {
    type Error = u8;

    fn try_from(request: u8) -> Result<Self, u8> {
        Ok(match request {
            0x00 => ClassRequest::SendEncapsulatedCommand,
            0x01 => ClassRequest::GetEncapsulatedResponse,
            0x02 => ClassRequest::SetCommFeature,
            0x03 => ClassRequest::GetCommFeature,
            0x04 => ClassRequest::ClearCommFeature,
            0x20 => ClassRequest::SetLineCoding,
            0x21 => ClassRequest::GetLineCoding,
            0x22 => ClassRequest::SetControlLineState,
            0x23 => ClassRequest::SendBreak,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_codes() {
        assert_eq!(ClassRequest::try_from(0x22), Ok(ClassRequest::SetControlLineState));
        assert_eq!(ClassRequest::try_from(0x21), Ok(ClassRequest::GetLineCoding));
        assert_eq!(ClassRequest::try_from(0x05), Err(0x05));
    }

    #[test]
    fn notification_header_announces_two_bytes() {
        assert_eq!(SERIAL_STATE[6], 2);
        assert_eq!(SERIAL_STATE[8..].len(), 2);
    }
}

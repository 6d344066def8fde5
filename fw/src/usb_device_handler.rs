use core::sync::atomic::{AtomicBool, Ordering};

use defmt::*;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver as UsbDriver;
use embassy_usb::control::{InResponse, OutResponse, Recipient, Request, RequestType};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::{Handler, UsbDevice};

use uwd_engine::cdc::{ClassRequest, LINE_CODING};

use crate::CARRIER;

type MyUsbDriver = UsbDriver<'static, USB>;
type MyUsbDevice = UsbDevice<'static, MyUsbDriver>;

/// Set while the host has the device configured.
pub(crate) static ATTACHED: AtomicBool = AtomicBool::new(false);

#[embassy_executor::task]
pub(crate) async fn usb_task(mut usb: MyUsbDevice) -> ! {
    usb.run().await
}

/// Device state callbacks plus the CDC-ACM class requests on the
/// communication interface.
pub(crate) struct UsbDeviceHandler {
    comm_if: InterfaceNumber,
}

impl UsbDeviceHandler {
    pub(crate) fn new(comm_if: InterfaceNumber) -> Self {
        UsbDeviceHandler { comm_if }
    }

    fn class_request(&self, req: &Request) -> Option<ClassRequest> {
        if req.request_type != RequestType::Class
            || req.recipient != Recipient::Interface
            || req.index != u8::from(self.comm_if) as u16
        {
            return None;
        }
        ClassRequest::try_from(req.request).ok()
    }
}

impl Handler for UsbDeviceHandler {
    fn enabled(&mut self, enabled: bool) {
        ATTACHED.store(false, Ordering::Relaxed);
        if enabled {
            info!("Device enabled");
        } else {
            info!("Device disabled");
        }
    }

    fn reset(&mut self) {
        ATTACHED.store(false, Ordering::Relaxed);
        info!("Bus reset");
    }

    fn addressed(&mut self, addr: u8) {
        ATTACHED.store(false, Ordering::Relaxed);
        info!("USB address set to: {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        ATTACHED.store(configured, Ordering::Relaxed);
        if configured {
            info!("Host attached");
        } else {
            info!("Host detached");
        }
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        match self.class_request(&req)? {
            ClassRequest::SetLineCoding => Some(OutResponse::Accepted),
            ClassRequest::SetControlLineState => {
                // Hosts won't open the tty without carrier detect
                debug!("Control line state {:#x}", req.value);
                CARRIER.request();
                Some(OutResponse::Accepted)
            }
            other => {
                debug!("Unsupported class request {}", other);
                Some(OutResponse::Rejected)
            }
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        match self.class_request(&req)? {
            ClassRequest::GetLineCoding if buf.len() >= LINE_CODING.len() => {
                buf[..LINE_CODING.len()].copy_from_slice(&LINE_CODING);
                Some(InResponse::Accepted(&buf[..LINE_CODING.len()]))
            }
            other => {
                debug!("Unsupported class request {}", other);
                Some(InResponse::Rejected)
            }
        }
    }
}

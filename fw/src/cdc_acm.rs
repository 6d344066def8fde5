//! Virtual serial port: one CDC-ACM function with a notification endpoint
//! and a bulk data pair. Only the byte streams leave this module, through
//! the channels below.

use defmt::*;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver as UsbDriver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::driver::{Driver, Endpoint, EndpointError, EndpointIn, EndpointOut};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Builder;

use uwd_engine::cdc::*;
use uwd_engine::reply::{Reply, TxGate};

pub(crate) const MAX_PACKET_SIZE: u16 = 64;

type AppDriver = UsbDriver<'static, USB>;
type AppEndpointIn = <AppDriver as Driver<'static>>::EndpointIn;
type AppEndpointOut = <AppDriver as Driver<'static>>::EndpointOut;

/// One OUT transfer, as received.
pub(crate) struct Packet {
    data: [u8; MAX_PACKET_SIZE as usize],
    len: usize,
}

impl Packet {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Host to device bytes, drained by the scheduler every tick.
pub(crate) static RX_CHANNEL: Channel<CriticalSectionRawMutex, Packet, 4> = Channel::new();
/// Replies to `?`. Only written while the scheduler holds `TX_GATE`.
pub(crate) static TX_CHANNEL: Channel<CriticalSectionRawMutex, Reply, 1> = Channel::new();
/// Held from hand off until the bulk IN write returns.
pub(crate) static TX_GATE: TxGate = TxGate::new();
/// Carrier notification packets for the interrupt endpoint.
pub(crate) static NOTIFY_CHANNEL: Channel<CriticalSectionRawMutex, &'static [u8], 1> =
    Channel::new();

pub(crate) struct CdcAcm {
    pub(crate) comm_if: InterfaceNumber,
    pub(crate) notify_ep: AppEndpointIn,
    pub(crate) read_ep: AppEndpointOut,
    pub(crate) write_ep: AppEndpointIn,
}

impl CdcAcm {
    pub(crate) fn new(builder: &mut Builder<'static, AppDriver>) -> Self {
        let mut func = builder.function(USB_CLASS_CDC, CDC_SUBCLASS_ACM, CDC_PROTOCOL_NONE);

        // Communication interface
        let mut iface = func.interface();
        let comm_if = iface.interface_number();
        let data_if = u8::from(comm_if) + 1;
        let mut alt = iface.alt_setting(USB_CLASS_CDC, CDC_SUBCLASS_ACM, CDC_PROTOCOL_NONE, None);
        alt.descriptor(CS_INTERFACE, &[CDC_TYPE_HEADER, 0x10, 0x01]);
        alt.descriptor(CS_INTERFACE, &[CDC_TYPE_ACM, ACM_CAPABILITIES]);
        alt.descriptor(CS_INTERFACE, &[CDC_TYPE_UNION, comm_if.into(), data_if]);
        alt.descriptor(CS_INTERFACE, &[CDC_TYPE_CALL_MANAGEMENT, 0x03, data_if]);
        let notify_ep = alt.endpoint_interrupt_in(NOTIFY_PACKET_SIZE, NOTIFY_INTERVAL_MS);

        // Data interface
        let mut iface = func.interface();
        let mut alt = iface.alt_setting(USB_CLASS_CDC_DATA, 0x00, 0x00, None);
        let read_ep = alt.endpoint_bulk_out(MAX_PACKET_SIZE);
        let write_ep = alt.endpoint_bulk_in(MAX_PACKET_SIZE);

        CdcAcm {
            comm_if,
            notify_ep,
            read_ep,
            write_ep,
        }
    }
}

#[embassy_executor::task]
pub(crate) async fn rx_task(mut read_ep: AppEndpointOut) -> ! {
    loop {
        read_ep.wait_enabled().await;
        info!("Data endpoint enabled");
        loop {
            let mut packet = Packet {
                data: [0; MAX_PACKET_SIZE as usize],
                len: 0,
            };
            match read_ep.read(&mut packet.data).await {
                Ok(n) => {
                    packet.len = n;
                    RX_CHANNEL.send(packet).await;
                }
                Err(EndpointError::BufferOverflow) => warn!("Oversized OUT packet dropped"),
                Err(EndpointError::Disabled) => break,
            }
        }
    }
}

#[embassy_executor::task]
pub(crate) async fn tx_task(mut write_ep: AppEndpointIn) -> ! {
    loop {
        let reply = TX_CHANNEL.receive().await;
        if let Err(e) = write_ep.write(reply.as_bytes()).await {
            warn!("Reply not sent: {}", e);
        }
        TX_GATE.release();
    }
}

#[embassy_executor::task]
pub(crate) async fn notify_task(mut notify_ep: AppEndpointIn) -> ! {
    loop {
        let packet = NOTIFY_CHANNEL.receive().await;
        if let Err(e) = notify_ep.write(packet).await {
            warn!("Serial state notification not sent: {}", e);
        }
    }
}

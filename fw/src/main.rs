#![no_std]
#![no_main]

mod cdc_acm;
mod scheduler;
mod usb_device_handler;
mod watchdog;

use defmt::*;

use embassy_executor::Spawner;

use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, OutputOpenDrain};
use embassy_rp::peripherals::{self, USB};
use embassy_rp::usb::{Driver as UsbDriver, InterruptHandler as UsbInterruptHandler};

use embassy_time::{Duration, Timer};
use embassy_usb::{Builder, Config as UsbConfig};
use static_cell::StaticCell;

use assign_resources::assign_resources;

use uwd_engine::cdc::{USB_PID, USB_VID};
use uwd_engine::{CarrierNotifier, Engine, ResetLed, TickConfig};

use cdc_acm::{notify_task, rx_task, tx_task, CdcAcm};
use scheduler::scheduler_task;
use usb_device_handler::{usb_task, UsbDeviceHandler};
use watchdog::Supervisor;

use {defmt_rtt as _, panic_probe as _};

/// USB stays detached this long after power on so the host sees a clean
/// connect.
const POWER_ON_DELAY: Duration = Duration::from_millis(250);

/// Set by the USB control handler, drained by the scheduler.
pub(crate) static CARRIER: CarrierNotifier = CarrierNotifier::new();

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => UsbInterruptHandler<USB>;
});

assign_resources! {
    target: TargetResources {
        reset: PIN_2,
        led: PIN_25,
    },
    supervisor: SupervisorResources {
        dog: WATCHDOG,
    },
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    let mut supervisor = Supervisor::start(r.supervisor.dog);

    // Released reset is the open drain output left floating
    let lines = ResetLed::new(
        OutputOpenDrain::new(r.target.reset, Level::High),
        Output::new(r.target.led, Level::Low),
    );
    let engine = Engine::new(lines, TickConfig::default());
    info!("Watchdog engine ready, tick {} us", engine.watchdog().config().tick_period_us());

    // Create the driver from the HAL.
    let driver = UsbDriver::new(p.USB, Irqs);

    let mut config = UsbConfig::new(USB_VID, USB_PID);
    config.manufacturer = Some("uwd");
    config.product = Some("usb-watchdog");
    config.serial_number = Some("00000001");
    config.max_power = 100;
    config.max_packet_size_0 = 64;
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUF.init([0; 64]),
    );

    let cdc = CdcAcm::new(&mut builder);

    static DEVICE_HANDLER: StaticCell<UsbDeviceHandler> = StaticCell::new();
    let device_handler = DEVICE_HANDLER.init(UsbDeviceHandler::new(cdc.comm_if));
    builder.handler(device_handler);

    // Build the builder - USB device will be run by usb_task
    let usb = builder.build();

    supervisor.feed();
    spawner.must_spawn(scheduler_task(engine, supervisor));
    spawner.must_spawn(rx_task(cdc.read_ep));
    spawner.must_spawn(tx_task(cdc.write_ep));
    spawner.must_spawn(notify_task(cdc.notify_ep));

    Timer::after(POWER_ON_DELAY).await;
    info!("Connecting USB");
    spawner.must_spawn(usb_task(usb));
}

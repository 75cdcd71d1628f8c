#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{PIO0, USB};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::pio_programs::rotary_encoder::{PioEncoder, PioEncoderProgram};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::usb::Driver;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config as UsbConfig, UsbDevice};
use macropad_firmware::usb_serial::{pump_rx, pump_tx, UsbDriver};
use macropad_firmware::{
    configure_usb_serial, encoder, leds, Controller, ControllerConfig, EmbassyClock, GpioKeys,
    Hardware, LedSignal, LogDisplay, PipeTransport, SerialPipe, SharedEncoder, SignalLeds,
    KEY_COUNT,
};
use portable_atomic::AtomicI32;
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Control loop period.
const TICK: Duration = Duration::from_millis(10);

/// Host → device and device → host byte streams.
static RX_PIPE: SerialPipe = SerialPipe::new();
static TX_PIPE: SerialPipe = SerialPipe::new();

/// Latest LED frame; the LED task only ever needs the newest one.
static LED_SIGNAL: LedSignal = Signal::new();

/// Encoder detents, written by the encoder task and polled by the controller.
static ENCODER_POSITION: AtomicI32 = AtomicI32::new(0);

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("MacroPad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust MacroPad");
    usb_config.product = Some("MacroPad Serial");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    let cdc_state = CDC_STATE.init(State::new());
    let serial = configure_usb_serial(&mut builder, cdc_state);
    let usb_device = builder.build();

    // --- PIO: WS2812 chain on GPIO 19, encoder on GPIO 17/18 ---
    let Pio {
        mut common,
        sm0,
        sm1,
        ..
    } = Pio::new(p.PIO0, Irqs);

    let ws2812_program = PioWs2812Program::new(&mut common);
    let ws2812 = PioWs2812::new(&mut common, sm0, p.DMA_CH0, p.PIN_19, &ws2812_program);

    let encoder_program = PioEncoderProgram::new(&mut common);
    let quadrature = PioEncoder::new(&mut common, sm1, p.PIN_17, p.PIN_18, &encoder_program);

    // --- Keys on GPIO 1..=12, encoder switch on GPIO 0 ---
    let keys = GpioKeys::new([
        p.PIN_1.into(),
        p.PIN_2.into(),
        p.PIN_3.into(),
        p.PIN_4.into(),
        p.PIN_5.into(),
        p.PIN_6.into(),
        p.PIN_7.into(),
        p.PIN_8.into(),
        p.PIN_9.into(),
        p.PIN_10.into(),
        p.PIN_11.into(),
        p.PIN_12.into(),
    ]);
    let switch = Input::new(p.PIN_0, Pull::Up);

    let hardware = Hardware {
        keys,
        leds: SignalLeds::new(&LED_SIGNAL),
        display: LogDisplay,
        encoder: SharedEncoder::new(&ENCODER_POSITION, switch),
        clock: EmbassyClock,
    };
    let config = ControllerConfig {
        debug_framing: cfg!(feature = "debug-framing"),
        ..ControllerConfig::default()
    };
    let controller = Controller::new(hardware, PipeTransport::new(&RX_PIPE, &TX_PIPE), config);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(serial_task(serial).unwrap());
    spawner.spawn(led_task(ws2812).unwrap());
    spawner.spawn(encoder_task(quadrature).unwrap());
    spawner.spawn(control_task(controller).unwrap());

    info!("MacroPad initialized, {} keys", KEY_COUNT);
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// Serial task - moves bytes between the CDC-ACM endpoints and the pipes.
#[embassy_executor::task]
async fn serial_task(class: CdcAcmClass<'static, UsbDriver>) {
    let (mut sender, mut receiver) = class.split();

    loop {
        receiver.wait_connection().await;
        info!("host connected");
        let error = match select(pump_rx(&mut receiver, &RX_PIPE), pump_tx(&mut sender, &TX_PIPE)).await {
            Either::First(result) | Either::Second(result) => result.err(),
        };
        warn!("host disconnected: {:?}", error);
        // Stale events would arrive out of context on the next connection
        TX_PIPE.clear();
        RX_PIPE.clear();
    }
}

/// LED task - pushes the latest frame out over PIO.
#[embassy_executor::task]
async fn led_task(mut ws2812: PioWs2812<'static, PIO0, 0, KEY_COUNT>) {
    leds::run(&mut ws2812, &LED_SIGNAL).await
}

/// Encoder task - accumulates detents for the controller.
#[embassy_executor::task]
async fn encoder_task(mut quadrature: PioEncoder<'static, PIO0, 1>) {
    encoder::run(&mut quadrature, &ENCODER_POSITION).await
}

type BoardController =
    Controller<GpioKeys, SignalLeds, LogDisplay, SharedEncoder, EmbassyClock, PipeTransport>;

/// Control task - the macropad's main loop.
#[embassy_executor::task]
async fn control_task(mut controller: BoardController) {
    let mut ticker = Ticker::every(TICK);
    loop {
        controller.consume_serial();
        controller.refresh();

        let iteration = controller.iteration();
        if iteration % 6000 == 0 {
            info!("tick {}: {}", iteration, controller.stats());
        }

        ticker.next().await;
    }
}

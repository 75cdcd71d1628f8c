//! USB CDC-ACM serial link to the host.
//!
//! The USB class is driven by async tasks that move packets in and out of
//! two byte pipes. The controller only sees [`PipeTransport`], a
//! non-blocking `embedded_io` view of those pipes.
//!
//! ```text
//! host ──USB──▶ rx_task ──▶ RX pipe ──▶ PipeTransport::read
//! host ◀──USB── tx_task ◀── TX pipe ◀── PipeTransport::write
//! ```

use core::convert::Infallible;

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;

/// Full-speed bulk endpoint size.
pub const MAX_PACKET_SIZE: u16 = 64;

/// Bytes buffered in each direction.
pub const PIPE_CAPACITY: usize = 256;

pub type UsbDriver = Driver<'static, USB>;
pub type SerialPipe = Pipe<CriticalSectionRawMutex, PIPE_CAPACITY>;

/// Add a CDC-ACM interface to the USB device being built.
pub fn configure_usb_serial<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> CdcAcmClass<'d, Driver<'d, USB>> {
    CdcAcmClass::new(builder, state, MAX_PACKET_SIZE)
}

/// Error from a [`PipeTransport`] write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SerialError {
    /// The TX pipe is full; the host is not reading.
    Full,
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::OutOfMemory
    }
}

/// Non-blocking byte stream over the USB serial pipes.
///
/// `read` returns `Ok(0)` when the RX pipe is empty, which `embedded_io`
/// otherwise reserves for end of stream. Callers must check `read_ready`
/// first and treat `Ok(0)` as "nothing yet", as
/// [`Controller::consume_serial`](macropad_core::Controller::consume_serial)
/// does.
pub struct PipeTransport {
    rx: &'static SerialPipe,
    tx: &'static SerialPipe,
}

impl PipeTransport {
    #[must_use]
    pub const fn new(rx: &'static SerialPipe, tx: &'static SerialPipe) -> Self {
        Self { rx, tx }
    }
}

impl embedded_io::ErrorType for PipeTransport {
    type Error = SerialError;
}

impl embedded_io::Read for PipeTransport {
    /// Returns 0 when nothing is buffered instead of waiting; gate on
    /// `read_ready`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.rx.try_read(buf).unwrap_or(0))
    }
}

impl embedded_io::ReadReady for PipeTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl embedded_io::Write for PipeTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx.try_write(buf).map_err(|_| SerialError::Full)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Move received packets into `pipe` for as long as the host is connected.
pub async fn pump_rx(receiver: &mut Receiver<'static, UsbDriver>, pipe: &SerialPipe) -> Result<Infallible, EndpointError> {
    let mut packet = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        let len = receiver.read_packet(&mut packet).await?;
        pipe.write_all(&packet[..len]).await;
    }
}

/// Send everything written to `pipe` for as long as the host is connected.
pub async fn pump_tx(sender: &mut Sender<'static, UsbDriver>, pipe: &SerialPipe) -> Result<Infallible, EndpointError> {
    let mut packet = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        let len = pipe.read(&mut packet).await;
        sender.write_packet(&packet[..len]).await?;
        // A full packet must be followed by a short one to end the transfer
        if len == packet.len() && pipe.is_empty() {
            sender.write_packet(&[]).await?;
        }
    }
}

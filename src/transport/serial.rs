//! Serial port transport.
//!
//! The actuator is an Arduino behind a USB CDC port. Opening the port toggles
//! DTR, which resets the board; the handshake waits that reset out.

use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::stream::StreamSource;
use crate::error::{LinkError, Result};

/// Serial source used by real links.
pub type SerialSource = StreamSource<SerialStream>;

/// Baud rates the Arduino serial monitor offers.
pub const BAUD_RATES: &[u32] = &[
    300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 74880, 115200, 230400, 250000, 500000,
    1000000, 2000000,
];

pub fn is_supported_baud_rate(baud_rate: u32) -> bool {
    BAUD_RATES.contains(&baud_rate)
}

/// Open `port` at `baud_rate` (8N1, no flow control).
pub fn open_serial(port: &str, baud_rate: u32) -> Result<SerialSource> {
    let stream = tokio_serial::new(port, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|source| LinkError::Open {
            port: port.to_string(),
            source,
        })?;

    tracing::info!(port, baud_rate, "Serial port opened");
    Ok(StreamSource::new(stream))
}

//! # scopelink
//!
//! Host side of the serial link to a two-axis (RA/DEC) telescope mount
//! actuator: an Arduino driving two DC motors through a motor shield.
//!
//! ## Layers
//!
//! - [`transport`]: byte streams (serial port, or any tokio duplex stream)
//! - [`protocol`]: `<AXIS,SPEED>` frames and speed clamping
//! - [`session`]: start-up handshake, one-command-one-reply exchange, paced
//!   sequences
//! - [`mount`]: per-axis speed bookkeeping for interactive control
//!
//! ## Example
//!
//! ```ignore
//! use scopelink::protocol::Axis;
//! use scopelink::session::{open_link, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> scopelink::Result<()> {
//!     let mut session = open_link("/dev/ttyACM0", 9600, SessionOptions::default()).await?;
//!     let (reply, _) = session.set_axis_speed(Axis::Declination, -255).await?;
//!     println!("actuator said {}", reply.text);
//!     session.close().await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod mount;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{LinkError, Result};
pub use mount::Mount;
pub use protocol::{Axis, Command, FrameCodec, Reply};
pub use session::{LinkState, Session, SessionOptions, SessionRunner};
pub use transport::ByteSource;

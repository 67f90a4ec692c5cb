//! Wire protocol for the mount actuator.
//!
//! Every message is an ASCII frame bounded by `<` and `>`:
//!
//! ```text
//! host -> actuator:   <RA,-255>   <DEC,0>
//! actuator -> host:   <Arduino is ready>   <OK>
//! ```
//!
//! There is no escaping and no checksum. The decoder resynchronizes by
//! discarding everything up to the next start marker.

pub mod command;
pub mod frame;
pub mod speed;

pub use command::{Axis, Command};
pub use frame::{FrameCodec, Markers, Reply, END_MARKER, START_MARKER};
pub use speed::{clamp, nudge, Clamped, MAX_SPEED, MIN_SPEED};

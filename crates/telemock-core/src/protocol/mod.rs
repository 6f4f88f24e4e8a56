//! Protocol module containing the wire frame records, identifier
//! normalization, and id counters.

pub mod frames;
pub mod ids;
pub mod sequence;

pub use frames::{FrameKind, InboundFrame, OutboundFrame, SENDER_TAG};
pub use ids::{IdError, WireId};
pub use sequence::IdCounter;

//! Value module — runtime value model and the bounded serializer.

pub mod captured;
pub mod serialize;

pub use captured::{classify, Captured, SharedMap, SharedSeq, ValueKind};
pub use serialize::{serialize, CYCLE_MARKER, TRUNCATION_SUFFIX};

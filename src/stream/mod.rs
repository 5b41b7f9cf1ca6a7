//! Remediation stream handling.
//!
//! Raw body chunks go through the [`FrameDecoder`] and each resulting line is
//! offered to the [`FragmentAccumulator`].

pub mod accumulator;
pub mod decoder;

pub use accumulator::{FragmentAccumulator, FrameOutcome};
pub use decoder::FrameDecoder;

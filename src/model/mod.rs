//! Document model: segments and the woven document.

mod document;
mod segment;

pub use document::{UnresolvedDirective, WovenDocument};
pub use segment::{FigureRef, Role, Segment, SegmentContent};

//! Persistent state.
//!
//! The only state kept between runs is the last-posted marker.

mod marker;

pub use marker::{parse_marker, Cursor, MarkerStore};

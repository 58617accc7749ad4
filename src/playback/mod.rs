//! Playback primitives: history cache, cursors and trend buffers
//!
//! All three are plain synchronous state owned by the session; the session
//! holds its lock while touching them, so every tick commits atomically.

mod buffer;
mod cache;
mod cursor;

pub use buffer::{DisplayHistoryBuffer, MultiPoint, SinglePoint};
pub use cache::{FetchAction, FetchOutcome, FetchTicket, HistoryCache};
pub use cursor::PlaybackCursor;

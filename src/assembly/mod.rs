//! Study Recording Assembly
//!
//! Plans the playback order, pulls clips from a store, and stitches them
//! into one recording with the configured pauses.

pub mod assembler;
pub mod plan;
pub mod session;
pub mod store;

pub use assembler::Assembler;
pub use plan::{PlaybackPlan, SequencePlanner};
pub use session::{Session, SessionReport};
pub use store::{ClipCategory, ClipSource, ClipStore, DirClipStore, MemoryClipStore};

mod compare;
mod engine;
mod reader;
mod segment;
mod stats;
mod writer;

pub use compare::blocks_differ;
pub use engine::{BlockEvent, STDIN_PATH, SyncObserver, SyncOptions, sync_file, sync_stream};
pub use reader::{BlockBuffers, BlockPair, read_full, read_pair};
pub use segment::{Segment, SegmentHandle, SegmentRotator};
pub use stats::SyncStats;
pub use writer::{BlockAction, apply_block, rewind};

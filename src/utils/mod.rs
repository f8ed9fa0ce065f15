mod fs;
mod path;

pub use fs::{open_destination, open_destination_readonly, open_source};
pub use path::{is_dir_target, resolve_destination, segment_path};

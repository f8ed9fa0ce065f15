mod console;
mod session;

pub use console::{
    ConsoleReporter, ProgressLine, modified_block_line, progress_text, stat_summary,
};
pub use session::SessionReport;

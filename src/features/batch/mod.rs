pub use batch::Batch;
pub use portable::{is_tagged, tag, untag, Portable};

mod batch;
mod portable;

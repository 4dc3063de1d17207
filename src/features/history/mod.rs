pub use http::{get_by_id, routes};
pub use jobhistory::{history_batch, JobHistoryEntry, JobHistoryRow, NewJobRun, HISTORY_COLUMNS};
pub use memory::MemoryJobHistory;
pub use pg::PgJobHistory;
pub use repository::JobHistoryRepository;
pub use timestamper::Timestamper;

mod http;
mod jobhistory;
mod memory;
mod pg;
mod repository;
mod timestamper;

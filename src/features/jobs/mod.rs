pub use http::routes;
pub use job_row::{validate_name, JobCreate, JobRow, MAX_NAME_LEN};

mod http;
mod job_row;

use serde::{Deserialize, Serialize};

pub mod batch;
pub mod history;
pub mod jobs;
pub mod live;
pub mod response;

#[derive(Deserialize)]
pub struct Paging {
    limit: Option<i32>,
    offset: Option<i32>,
}

#[derive(Serialize)]
pub struct PagingResult<T> {
    limit: i32,
    offset: i32,
    data: Vec<T>,
}

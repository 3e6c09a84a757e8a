#![forbid(unsafe_code)]

use cl_core::model::Direction;
use cl_core::query::DEFAULT_LIMIT;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddEntryRequest {
    pub name: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositionEntryRequest {
    pub id: i64,
    pub name: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderQuery {
    pub start_id: Option<i64>,
    pub direction: Direction,
    pub limit: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            start_id: None,
            direction: Direction::Ascending,
            limit: DEFAULT_LIMIT,
        }
    }
}

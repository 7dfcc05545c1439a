pub mod models;
pub mod store;

pub use models::SampleRow;
pub use store::{FetchMode, HistoryStore, SqlOutcome, SqlValue};

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod selection;
pub mod types;

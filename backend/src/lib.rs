pub mod config;
pub mod db;
pub mod notify;
pub mod quotes;
pub mod store;
pub mod tick;

pub mod error;
pub mod logger;
pub mod time;

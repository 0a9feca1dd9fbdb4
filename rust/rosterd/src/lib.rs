pub mod backup;
pub mod catalog;
pub mod db;
pub mod domain;
pub mod error;
pub mod export;
pub mod import;
pub mod ipc;
pub mod query;
pub mod snapshot;
pub mod store;

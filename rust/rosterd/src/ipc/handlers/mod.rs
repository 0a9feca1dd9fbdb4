pub mod activities;
pub mod backup_exchange;
pub mod core;
pub mod filter;
pub mod import;
pub mod setup;
pub mod students;
pub mod templates;

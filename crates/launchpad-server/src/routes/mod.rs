pub mod checklist;
pub mod config;
pub mod events;
pub mod listing;
pub mod projects;

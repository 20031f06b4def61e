// src/services.rs

pub mod auth;
pub mod bucketing;
pub mod call_service;
pub mod client_service;
pub mod import_service;
pub mod note_service;
pub mod report_service;
pub mod spreadsheet;
pub mod user_service;

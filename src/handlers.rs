// src/handlers.rs

pub mod auth;
pub mod calls;
pub mod clients;
pub mod dashboard;
pub mod import;
pub mod notes;
pub mod users;

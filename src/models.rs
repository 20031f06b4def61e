pub mod auth;
pub mod call;
pub mod client;
pub mod dashboard;
pub mod import;
pub mod note;

// src/db.rs

// Banco em memória só para testes
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pg;
pub mod repository;

mod call_repo;
mod client_repo;
mod dashboard_repo;
mod import_repo;
mod note_repo;
mod user_repo;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryDatabase, MemoryStore};
pub use pg::{PgDatabase, PgStore};
pub use repository::{
    CallRepository, ClientRepository, Database, ImportRepository, NoteRepository, ReportRepository, Store,
    UnitOfWork, UserRepository,
};

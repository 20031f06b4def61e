// src/db/pg.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::repository::{Database, UnitOfWork},
};

const SAVEPOINT: &str = "sp_unidade";

/// Banco Postgres: cada `begin` abre uma transação do pool.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Database for PgDatabase {
    type Tx = PgStore;

    async fn begin(&self) -> Result<PgStore, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgStore { tx })
    }
}

/// Unidade de trabalho sobre uma transação aberta. Se for solta sem
/// `commit`, o sqlx faz rollback.
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

impl PgStore {
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

impl UnitOfWork for PgStore {
    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn savepoint(&mut self) -> Result<(), AppError> {
        sqlx::query(&format!("SAVEPOINT {SAVEPOINT}"))
            .execute(self.conn())
            .await?;
        Ok(())
    }

    async fn release_savepoint(&mut self) -> Result<(), AppError> {
        sqlx::query(&format!("RELEASE SAVEPOINT {SAVEPOINT}"))
            .execute(self.conn())
            .await?;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> Result<(), AppError> {
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {SAVEPOINT}"))
            .execute(self.conn())
            .await?;
        Ok(())
    }
}

/// Converte violação de chave única num erro amigável.
pub(crate) fn unique_or(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

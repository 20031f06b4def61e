// src/db/repository.rs

//! Contratos de acesso a dados.
//!
//! Toda operação roda dentro de uma unidade de trabalho (`Database::begin`).
//! Nada é gravado até `commit`; soltar a unidade sem commit desfaz tudo.
//! Os serviços só conhecem estes traits, então o mesmo código roda sobre o
//! Postgres em produção e sobre o banco em memória nos testes.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, User},
        call::{Call, CallWithConsultant, NewCall},
        client::{Client, ClientFilter, ClientOverview, NewClient},
        dashboard::{CallStats, CallWindow, ConsultantCall, ConsultantPerformance, DailyCount, DayCall, OutcomeCount},
        import::NewImportBatch,
        note::{NewNote, Note, NoteView},
    },
};

/// Fábrica de unidades de trabalho.
pub trait Database: Clone + Send + Sync + 'static {
    type Tx: Store + 'static;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx, AppError>> + Send;
}

/// Controle transacional de uma unidade de trabalho.
///
/// Há um único nível de savepoint: o importador abre um por linha para que
/// uma linha com erro não deixe escrita pela metade.
pub trait UnitOfWork: Send {
    fn commit(self) -> impl Future<Output = Result<(), AppError>> + Send;
    fn savepoint(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;
    fn release_savepoint(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;
    fn rollback_to_savepoint(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;
}

pub trait ClientRepository: Send {
    fn find_client(&mut self, id: Uuid) -> impl Future<Output = Result<Option<Client>, AppError>> + Send;

    /// Busca exata por CNPJ entre ativos (`active = true`) ou inativos.
    fn find_client_by_tax_id(
        &mut self,
        tax_id: &str,
        active: bool,
    ) -> impl Future<Output = Result<Option<Client>, AppError>> + Send;

    fn insert_client(&mut self, client: NewClient) -> impl Future<Output = Result<Client, AppError>> + Send;

    /// Regrava todos os campos mutáveis do cliente.
    fn save_client(&mut self, client: &Client) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Clientes ativos com o resumo de ligações, ordenados por nome.
    fn list_client_overviews(
        &mut self,
        filter: &ClientFilter,
    ) -> impl Future<Output = Result<Vec<ClientOverview>, AppError>> + Send;

    fn deactivate_clients_of(&mut self, consultant_id: Uuid) -> impl Future<Output = Result<u64, AppError>> + Send;
}

pub trait CallRepository: Send {
    fn insert_call(&mut self, call: NewCall) -> impl Future<Output = Result<Call, AppError>> + Send;

    fn find_call(&mut self, id: Uuid) -> impl Future<Output = Result<Option<Call>, AppError>> + Send;

    /// Histórico do cliente, mais recente primeiro.
    fn calls_of_client(
        &mut self,
        client_id: Uuid,
    ) -> impl Future<Output = Result<Vec<CallWithConsultant>, AppError>> + Send;

    fn update_call_note(
        &mut self,
        id: Uuid,
        note: Option<&str>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

pub trait NoteRepository: Send {
    fn insert_note(&mut self, note: NewNote) -> impl Future<Output = Result<Note, AppError>> + Send;

    /// Notas do cliente, mais recente primeiro.
    fn notes_of_client(&mut self, client_id: Uuid) -> impl Future<Output = Result<Vec<NoteView>, AppError>> + Send;
}

pub trait UserRepository: Send {
    fn find_user(&mut self, id: Uuid) -> impl Future<Output = Result<Option<User>, AppError>> + Send;
    fn find_user_by_email(&mut self, email: &str) -> impl Future<Output = Result<Option<User>, AppError>> + Send;
    fn insert_user(&mut self, user: NewUser) -> impl Future<Output = Result<User, AppError>> + Send;
    fn list_users(&mut self) -> impl Future<Output = Result<Vec<User>, AppError>> + Send;
    fn count_users(&mut self) -> impl Future<Output = Result<i64, AppError>> + Send;
    fn set_user_active(&mut self, id: Uuid, active: bool) -> impl Future<Output = Result<(), AppError>> + Send;
    fn set_daily_goal(&mut self, id: Uuid, goal: i32) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Grava nome, e-mail, papel e meta. E-mail repetido vira `EmailAlreadyExists`.
    fn update_user(&mut self, user: &User) -> impl Future<Output = Result<(), AppError>> + Send;

    fn set_password(&mut self, id: Uuid, password_hash: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

pub trait ImportRepository: Send {
    fn record_import(&mut self, batch: NewImportBatch) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Agregações somente leitura para painéis e relatório.
pub trait ReportRepository: Send {
    fn count_active_clients(
        &mut self,
        consultant_id: Option<Uuid>,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_active_consultants(&mut self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_all_calls(&mut self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn call_stats(&mut self, window: CallWindow) -> impl Future<Output = Result<CallStats, AppError>> + Send;

    /// Ligações por dia local; `offset_seconds` é o fuso da equipe.
    fn calls_per_day(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        offset_seconds: i32,
    ) -> impl Future<Output = Result<Vec<DailyCount>, AppError>> + Send;

    fn outcome_breakdown(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<OutcomeCount>, AppError>> + Send;

    /// Um registro por consultor ativo (mesmo sem ligações), maior receita primeiro.
    fn consultant_performance(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ConsultantPerformance>, AppError>> + Send;

    fn calls_of_consultant(
        &mut self,
        consultant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ConsultantCall>, AppError>> + Send;

    /// Todas as ligações do intervalo, mais recente primeiro.
    fn calls_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<DayCall>, AppError>> + Send;
}

/// Tudo que uma unidade de trabalho oferece.
pub trait Store:
    UnitOfWork
    + ClientRepository
    + CallRepository
    + NoteRepository
    + UserRepository
    + ImportRepository
    + ReportRepository
{
}

impl<T> Store for T where
    T: UnitOfWork
        + ClientRepository
        + CallRepository
        + NoteRepository
        + UserRepository
        + ImportRepository
        + ReportRepository
{
}

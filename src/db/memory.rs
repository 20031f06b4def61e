// src/db/memory.rs

//! Banco em memória com a mesma semântica transacional do Postgres.
//!
//! `begin` copia o estado, as escritas vão para a cópia e `commit` publica a
//! cópia inteira. Soltar a unidade sem commit descarta tudo. As restrições do
//! schema (tamanho de coluna, chave estrangeira, CNPJ ativo único) são
//! reproduzidas para que erros de linha na importação aconteçam aqui também.

use std::collections::{BTreeMap, HashMap};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{
        CallRepository, ClientRepository, Database, ImportRepository, NoteRepository, ReportRepository,
        UnitOfWork, UserRepository,
    },
    models::{
        auth::{NewUser, Role, User},
        call::{Call, CallOutcome, CallWithConsultant, NewCall},
        client::{Client, ClientFilter, ClientOverview, NewClient},
        dashboard::{CallStats, CallWindow, ConsultantCall, ConsultantPerformance, DailyCount, DayCall, OutcomeCount},
        import::{ImportBatch, NewImportBatch},
        note::{NewNote, Note, NoteView},
    },
};

// Limites das colunas VARCHAR do schema
const MAX_NAME: usize = 200;
const MAX_TAX_ID: usize = 18;
const MAX_PHONE: usize = 20;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    clients: Vec<Client>,
    calls: Vec<Call>,
    notes: Vec<Note>,
    imports: Vec<ImportBatch>,
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
    fail_import_log: Arc<AtomicBool>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// O próximo `commit` falha como se o banco tivesse caído.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Faz a gravação da auditoria de importação falhar.
    pub fn fail_import_log(&self, fail: bool) {
        self.fail_import_log.store(fail, Ordering::SeqCst);
    }

    /// Cadastra um usuário direto no estado publicado (hash fictício).
    pub fn seed_user(&self, name: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@empresa.com", name.to_lowercase().replace(' ', ".")),
            password_hash: String::from("!"),
            role,
            active: true,
            daily_goal: 10,
            created_at: Utc::now(),
        };
        self.guard().users.push(user.clone());
        user
    }

    pub fn clients(&self) -> Vec<Client> {
        self.guard().clients.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.guard().calls.clone()
    }

    pub fn import_batches(&self) -> Vec<ImportBatch> {
        self.guard().imports.clone()
    }

    fn guard(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Database for MemoryDatabase {
    type Tx = MemoryStore;

    async fn begin(&self) -> Result<MemoryStore, AppError> {
        let working = self
            .state
            .lock()
            .map_err(|_| AppError::Persistence("estado em memória corrompido".into()))?
            .clone();

        Ok(MemoryStore {
            working,
            savepoint: None,
            shared: Arc::clone(&self.state),
            fail_commit: Arc::clone(&self.fail_next_commit),
            fail_import_log: self.fail_import_log.load(Ordering::SeqCst),
        })
    }
}

pub struct MemoryStore {
    working: MemoryState,
    savepoint: Option<MemoryState>,
    shared: Arc<Mutex<MemoryState>>,
    fail_commit: Arc<AtomicBool>,
    fail_import_log: bool,
}

impl MemoryStore {
    fn user_exists(&self, id: Uuid) -> bool {
        self.working.users.iter().any(|u| u.id == id)
    }

    fn user_name(&self, id: Uuid) -> String {
        self.working
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn check_client(&self, client: &Client) -> Result<(), AppError> {
        if client.name.trim().is_empty() || client.name.chars().count() > MAX_NAME {
            return Err(column_error("clients.name"));
        }
        if client.tax_id.as_ref().is_some_and(|t| t.len() > MAX_TAX_ID) {
            return Err(column_error("clients.tax_id"));
        }
        if client.phone.as_ref().is_some_and(|p| p.len() > MAX_PHONE) {
            return Err(column_error("clients.phone"));
        }
        if client
            .representative_name
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_NAME)
        {
            return Err(column_error("clients.representative_name"));
        }
        if !self.user_exists(client.consultant_id) {
            return Err(AppError::Persistence("clients.consultant_id viola chave estrangeira".into()));
        }
        if client.active {
            if let Some(tax_id) = &client.tax_id {
                let clash = self
                    .working
                    .clients
                    .iter()
                    .any(|c| c.id != client.id && c.active && c.tax_id.as_deref() == Some(tax_id.as_str()));
                if clash {
                    return Err(AppError::UniqueConstraintViolation(format!(
                        "Já existe um cliente ativo com o CNPJ '{}'.",
                        tax_id
                    )));
                }
            }
        }
        Ok(())
    }

    fn calls_in(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> impl Iterator<Item = &Call> {
        self.working
            .calls
            .iter()
            .filter(move |c| c.called_at >= from && c.called_at < to)
    }
}

fn column_error(column: &str) -> AppError {
    AppError::Persistence(format!("valor inválido para a coluna {}", column))
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn summarize(calls: &[&Call]) -> CallStats {
    let purchases: Vec<&&Call> = calls.iter().filter(|c| c.outcome == CallOutcome::Purchased).collect();
    CallStats {
        calls: calls.len() as i64,
        sales: purchases.len() as i64,
        revenue: purchases.iter().map(|c| c.sale_value).sum::<Decimal>(),
    }
}

impl UnitOfWork for MemoryStore {
    async fn commit(self) -> Result<(), AppError> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::Persistence("falha no commit".into()));
        }
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| AppError::Persistence("estado em memória corrompido".into()))?;
        *shared = self.working;
        Ok(())
    }

    async fn savepoint(&mut self) -> Result<(), AppError> {
        self.savepoint = Some(self.working.clone());
        Ok(())
    }

    async fn release_savepoint(&mut self) -> Result<(), AppError> {
        self.savepoint = None;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> Result<(), AppError> {
        match self.savepoint.take() {
            Some(saved) => {
                self.working = saved;
                Ok(())
            }
            None => Err(AppError::Persistence("nenhum savepoint aberto".into())),
        }
    }
}

impl ClientRepository for MemoryStore {
    async fn find_client(&mut self, id: Uuid) -> Result<Option<Client>, AppError> {
        Ok(self.working.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn find_client_by_tax_id(&mut self, tax_id: &str, active: bool) -> Result<Option<Client>, AppError> {
        Ok(self
            .working
            .clients
            .iter()
            .filter(|c| c.active == active && c.tax_id.as_deref() == Some(tax_id))
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<Client, AppError> {
        let client = Client {
            id: Uuid::new_v4(),
            name: client.name,
            tax_id: client.tax_id,
            phone: client.phone,
            representative_name: client.representative_name,
            consultant_id: client.consultant_id,
            active: true,
            next_call_at: None,
            origin: client.origin,
            created_at: client.created_at,
        };
        self.check_client(&client)?;
        self.working.clients.push(client.clone());
        Ok(client)
    }

    async fn save_client(&mut self, client: &Client) -> Result<(), AppError> {
        self.check_client(client)?;
        match self.working.clients.iter_mut().find(|c| c.id == client.id) {
            Some(stored) => {
                *stored = client.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Cliente")),
        }
    }

    async fn list_client_overviews(&mut self, filter: &ClientFilter) -> Result<Vec<ClientOverview>, AppError> {
        let needle = filter.search.as_ref().map(|q| q.to_lowercase());

        let mut rows: Vec<ClientOverview> = self
            .working
            .clients
            .iter()
            .filter(|c| c.active)
            .filter(|c| filter.consultant_id.is_none_or(|id| c.consultant_id == id))
            .filter(|c| match &needle {
                None => true,
                Some(q) => {
                    contains_ci(Some(&c.name), q)
                        || contains_ci(c.tax_id.as_deref(), q)
                        || contains_ci(c.phone.as_deref(), q)
                        || contains_ci(c.representative_name.as_deref(), q)
                }
            })
            .map(|c| {
                let calls: Vec<&Call> = self.working.calls.iter().filter(|l| l.client_id == c.id).collect();
                ClientOverview {
                    client: c.clone(),
                    total_calls: calls.len() as i64,
                    last_call_at: calls.iter().map(|l| l.called_at).max(),
                }
            })
            .collect();

        rows.sort_by(|a, b| a.client.name.cmp(&b.client.name));
        Ok(rows)
    }

    async fn deactivate_clients_of(&mut self, consultant_id: Uuid) -> Result<u64, AppError> {
        let mut affected = 0;
        for client in self
            .working
            .clients
            .iter_mut()
            .filter(|c| c.active && c.consultant_id == consultant_id)
        {
            client.active = false;
            affected += 1;
        }
        Ok(affected)
    }
}

impl CallRepository for MemoryStore {
    async fn insert_call(&mut self, call: NewCall) -> Result<Call, AppError> {
        if !self.working.clients.iter().any(|c| c.id == call.client_id) {
            return Err(AppError::Persistence("calls.client_id viola chave estrangeira".into()));
        }
        if !self.user_exists(call.consultant_id) {
            return Err(AppError::Persistence("calls.consultant_id viola chave estrangeira".into()));
        }
        if call.contact_name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME) {
            return Err(column_error("calls.contact_name"));
        }

        let call = Call {
            id: Uuid::new_v4(),
            client_id: call.client_id,
            consultant_id: call.consultant_id,
            called_at: call.called_at,
            note: call.note,
            contact_name: call.contact_name,
            outcome: call.outcome,
            sale_value: call.sale_value,
        };
        self.working.calls.push(call.clone());
        Ok(call)
    }

    async fn find_call(&mut self, id: Uuid) -> Result<Option<Call>, AppError> {
        Ok(self.working.calls.iter().find(|c| c.id == id).cloned())
    }

    async fn calls_of_client(&mut self, client_id: Uuid) -> Result<Vec<CallWithConsultant>, AppError> {
        let mut calls: Vec<CallWithConsultant> = self
            .working
            .calls
            .iter()
            .filter(|c| c.client_id == client_id)
            .map(|c| CallWithConsultant {
                call: c.clone(),
                consultant_name: self.user_name(c.consultant_id),
            })
            .collect();
        calls.sort_by(|a, b| b.call.called_at.cmp(&a.call.called_at));
        Ok(calls)
    }

    async fn update_call_note(&mut self, id: Uuid, note: Option<&str>) -> Result<(), AppError> {
        if let Some(call) = self.working.calls.iter_mut().find(|c| c.id == id) {
            call.note = note.map(str::to_string);
        }
        Ok(())
    }
}

impl NoteRepository for MemoryStore {
    async fn insert_note(&mut self, note: NewNote) -> Result<Note, AppError> {
        if !self.working.clients.iter().any(|c| c.id == note.client_id) || !self.user_exists(note.author_id) {
            return Err(AppError::Persistence("notes viola chave estrangeira".into()));
        }
        let note = Note {
            id: Uuid::new_v4(),
            client_id: note.client_id,
            author_id: note.author_id,
            body: note.body,
            created_at: note.created_at,
        };
        self.working.notes.push(note.clone());
        Ok(note)
    }

    async fn notes_of_client(&mut self, client_id: Uuid) -> Result<Vec<NoteView>, AppError> {
        let mut notes: Vec<NoteView> = self
            .working
            .notes
            .iter()
            .filter(|n| n.client_id == client_id)
            .map(|n| NoteView {
                id: n.id,
                author_name: self.user_name(n.author_id),
                body: n.body.clone(),
                created_at: n.created_at,
            })
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

impl UserRepository for MemoryStore {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.working.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        if self.working.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            active: true,
            daily_goal: user.daily_goal,
            created_at: user.created_at,
        };
        self.working.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&mut self) -> Result<Vec<User>, AppError> {
        let mut users = self.working.users.clone();
        users.sort_by(|a, b| {
            let rank = |u: &User| if u.role == Role::Supervisor { 0 } else { 1 };
            rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
        });
        Ok(users)
    }

    async fn count_users(&mut self) -> Result<i64, AppError> {
        Ok(self.working.users.len() as i64)
    }

    async fn set_user_active(&mut self, id: Uuid, active: bool) -> Result<(), AppError> {
        if let Some(user) = self.working.users.iter_mut().find(|u| u.id == id) {
            user.active = active;
        }
        Ok(())
    }

    async fn set_daily_goal(&mut self, id: Uuid, goal: i32) -> Result<(), AppError> {
        if let Some(user) = self.working.users.iter_mut().find(|u| u.id == id) {
            user.daily_goal = goal;
        }
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        if self.working.users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        if let Some(stored) = self.working.users.iter_mut().find(|u| u.id == user.id) {
            stored.name = user.name.clone();
            stored.email = user.email.clone();
            stored.role = user.role;
            stored.daily_goal = user.daily_goal;
        }
        Ok(())
    }

    async fn set_password(&mut self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        if let Some(user) = self.working.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

impl ImportRepository for MemoryStore {
    async fn record_import(&mut self, batch: NewImportBatch) -> Result<(), AppError> {
        if self.fail_import_log || !self.user_exists(batch.consultant_id) {
            return Err(AppError::Persistence("import_batches indisponível".into()));
        }
        self.working.imports.push(ImportBatch {
            id: Uuid::new_v4(),
            file_name: batch.file_name,
            consultant_id: batch.consultant_id,
            imported_count: batch.imported_count,
            imported_at: batch.imported_at,
        });
        Ok(())
    }
}

impl ReportRepository for MemoryStore {
    async fn count_active_clients(&mut self, consultant_id: Option<Uuid>) -> Result<i64, AppError> {
        Ok(self
            .working
            .clients
            .iter()
            .filter(|c| c.active && consultant_id.is_none_or(|id| c.consultant_id == id))
            .count() as i64)
    }

    async fn count_active_consultants(&mut self) -> Result<i64, AppError> {
        Ok(self
            .working
            .users
            .iter()
            .filter(|u| u.active && u.role == Role::Consultant)
            .count() as i64)
    }

    async fn count_all_calls(&mut self) -> Result<i64, AppError> {
        Ok(self.working.calls.len() as i64)
    }

    async fn call_stats(&mut self, window: CallWindow) -> Result<CallStats, AppError> {
        let calls: Vec<&Call> = self
            .calls_in(window.from, window.to)
            .filter(|c| window.consultant_id.is_none_or(|id| c.consultant_id == id))
            .collect();
        Ok(summarize(&calls))
    }

    async fn calls_per_day(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        offset_seconds: i32,
    ) -> Result<Vec<DailyCount>, AppError> {
        let offset = Duration::seconds(i64::from(offset_seconds));
        let mut per_day = BTreeMap::new();
        for call in self.calls_in(from, to) {
            let day = (call.called_at + offset).date_naive();
            *per_day.entry(day).or_insert(0_i64) += 1;
        }
        Ok(per_day
            .into_iter()
            .map(|(day, total)| DailyCount { day, total })
            .collect())
    }

    async fn outcome_breakdown(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<OutcomeCount>, AppError> {
        let mut counts: HashMap<CallOutcome, i64> = HashMap::new();
        for call in self.calls_in(from, to) {
            *counts.entry(call.outcome).or_insert(0) += 1;
        }
        let position = |o: &CallOutcome| CallOutcome::ALL.iter().position(|x| x == o).unwrap_or(usize::MAX);
        let mut data: Vec<OutcomeCount> = counts
            .into_iter()
            .map(|(outcome, total)| OutcomeCount { outcome, total })
            .collect();
        data.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| position(&a.outcome).cmp(&position(&b.outcome))));
        Ok(data)
    }

    async fn consultant_performance(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ConsultantPerformance>, AppError> {
        let mut data: Vec<ConsultantPerformance> = self
            .working
            .users
            .iter()
            .filter(|u| u.active && u.role == Role::Consultant)
            .map(|u| {
                let calls: Vec<&Call> = self.calls_in(from, to).filter(|c| c.consultant_id == u.id).collect();
                let stats = summarize(&calls);
                ConsultantPerformance {
                    consultant_id: u.id,
                    name: u.name.clone(),
                    daily_goal: u.daily_goal,
                    calls: stats.calls,
                    sales: stats.sales,
                    revenue: stats.revenue,
                }
            })
            .collect();
        data.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
        Ok(data)
    }

    async fn calls_of_consultant(
        &mut self,
        consultant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ConsultantCall>, AppError> {
        let mut data: Vec<ConsultantCall> = self
            .calls_in(from, to)
            .filter(|c| c.consultant_id == consultant_id)
            .map(|c| ConsultantCall {
                id: c.id,
                client_id: c.client_id,
                client_name: self
                    .working
                    .clients
                    .iter()
                    .find(|cl| cl.id == c.client_id)
                    .map(|cl| cl.name.clone())
                    .unwrap_or_default(),
                called_at: c.called_at,
                outcome: c.outcome,
                sale_value: c.sale_value,
                note: c.note.clone(),
            })
            .collect();
        data.sort_by(|a, b| b.called_at.cmp(&a.called_at));
        Ok(data)
    }

    async fn calls_between(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<DayCall>, AppError> {
        let mut data: Vec<DayCall> = self
            .calls_in(from, to)
            .map(|c| DayCall {
                id: c.id,
                called_at: c.called_at,
                consultant_name: self.user_name(c.consultant_id),
                client_name: self
                    .working
                    .clients
                    .iter()
                    .find(|cl| cl.id == c.client_id)
                    .map(|cl| cl.name.clone())
                    .unwrap_or_default(),
                contact_name: c.contact_name.clone(),
                outcome: c.outcome,
                sale_value: c.sale_value,
                note: c.note.clone(),
            })
            .collect();
        data.sort_by(|a, b| b.called_at.cmp(&a.called_at));
        Ok(data)
    }
}

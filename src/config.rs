// src/config.rs

use std::{env, str::FromStr, sync::Arc};

use anyhow::Context;

use crate::{
    common::clock::{Clock, LocalCalendar, SystemClock},
    db::{Database, PgDatabase},
    services::{
        auth::AuthService, call_service::CallService, client_service::ClientService, import_service::ImportService,
        note_service::NoteService, report_service::ReportService, user_service::UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub utc_offset_hours: i32,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
    // Primeiro supervisor, criado só quando não há usuário nenhum
    pub supervisor_email: Option<String>,
    pub supervisor_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            utc_offset_hours: parse_var("UTC_OFFSET_HOURS", -3)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            supervisor_email: env::var("SUPERVISOR_EMAIL").ok(),
            supervisor_password: env::var("SUPERVISOR_PASSWORD").ok(),
        })
    }

    pub fn calendar(&self) -> anyhow::Result<LocalCalendar> {
        LocalCalendar::from_hours(self.utc_offset_hours)
            .with_context(|| format!("UTC_OFFSET_HOURS fora do intervalo: {}", self.utc_offset_hours))
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState<D: Database = PgDatabase> {
    pub db: D,
    pub auth_service: AuthService<D>,
    pub user_service: UserService<D>,
    pub client_service: ClientService<D>,
    pub call_service: CallService<D>,
    pub note_service: NoteService<D>,
    pub import_service: ImportService<D>,
    pub report_service: ReportService<D>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db = PgDatabase::connect(&settings.database_url, settings.db_max_connections)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::build(
            db,
            Arc::new(SystemClock),
            settings.calendar()?,
            settings.jwt_secret.clone(),
            settings.bcrypt_cost,
        ))
    }
}

impl<D: Database> AppState<D> {
    // --- Monta o gráfico de dependências ---
    pub fn build(db: D, clock: Arc<dyn Clock>, calendar: LocalCalendar, jwt_secret: String, bcrypt_cost: u32) -> Self {
        let auth_service = AuthService::new(db.clone(), jwt_secret, bcrypt_cost, clock.clone());
        let user_service = UserService::new(db.clone(), clock.clone(), auth_service.clone());
        let call_service = CallService::new(db.clone(), clock.clone(), calendar);
        let client_service = ClientService::new(db.clone(), clock.clone(), calendar, call_service.clone());
        let note_service = NoteService::new(db.clone(), clock.clone());
        let import_service = ImportService::new(db.clone(), clock.clone(), client_service.clone());
        let report_service = ReportService::new(db.clone(), clock, calendar);

        Self {
            db,
            auth_service,
            user_service,
            client_service,
            call_service,
            note_service,
            import_service,
            report_service,
        }
    }
}

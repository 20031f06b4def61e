//! Montagem comum dos testes de integração: banco em memória, relógio fixo
//! e o mesmo grafo de serviços da produção.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use controle_ligacoes::{
    common::clock::{FixedClock, LocalCalendar},
    config::AppState,
    db::MemoryDatabase,
    models::{
        auth::{Identity, Role, User},
        client::{Client, CreateClientPayload},
    },
    services::spreadsheet::Spreadsheet,
};

pub const HEADERS: [&str; 6] = ["Tipo", "CNPJ Empresa", "Consultor", "Representante", "Cliente", "Telefone"];

pub struct TestApp {
    pub db: MemoryDatabase,
    pub clock: FixedClock,
    pub state: AppState<MemoryDatabase>,
    pub supervisor: User,
    pub ana: User,
    pub bruno: User,
}

impl TestApp {
    pub fn supervisor_id(&self) -> Identity {
        self.supervisor.identity()
    }

    pub fn ana_id(&self) -> Identity {
        self.ana.identity()
    }

    pub fn bruno_id(&self) -> Identity {
        self.bruno.identity()
    }

    /// Cliente manual da carteira de `owner`, cadastrado pelo supervisor.
    pub async fn client_for(&self, owner: &User, name: &str, tax_id: Option<&str>) -> Client {
        self.state
            .client_service
            .create_manual(
                &self.supervisor_id(),
                CreateClientPayload {
                    name: name.into(),
                    tax_id: tax_id.map(str::to_string),
                    phone: Some("(54) 3333-0000".into()),
                    representative_name: Some("Representante".into()),
                    consultant_id: Some(owner.id),
                },
            )
            .await
            .unwrap()
    }

    pub fn client(&self, id: uuid::Uuid) -> Client {
        self.db.clients().into_iter().find(|c| c.id == id).unwrap()
    }
}

/// Domingo, 18/10/2026 às 12:00 em São Paulo.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap()
}

pub fn setup() -> TestApp {
    let db = MemoryDatabase::new();
    let clock = FixedClock::new(start());
    let state = AppState::build(
        db.clone(),
        Arc::new(clock.clone()),
        LocalCalendar::sao_paulo(),
        "segredo-de-teste".into(),
        4,
    );

    let supervisor = db.seed_user("Supervisor", Role::Supervisor);
    let ana = db.seed_user("Ana", Role::Consultant);
    let bruno = db.seed_user("Bruno", Role::Consultant);

    TestApp { db, clock, state, supervisor, ana, bruno }
}

pub fn sheet(rows: &[&[&str]]) -> Spreadsheet {
    Spreadsheet {
        headers: HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

// src/services/client_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        clock::{Clock, LocalCalendar},
        error::AppError,
        text::non_blank,
    },
    db::{ClientRepository, Database, NoteRepository, UnitOfWork, UserRepository},
    models::{
        auth::Identity,
        call::{CallInput, CallOutcome},
        client::{
            Bucket, Client, ClientAttributes, ClientFilter, ClientListing, ClientOrigin, CreateClientPayload,
            ListClientsQuery, NewClient,
        },
        note::NewNote,
    },
    services::{bucketing, call_service::CallService},
};

/// Cadastro de clientes.
///
/// As operações de registro (`find_*`, `create`, `update`, `reactivate`,
/// `deactivate`) trabalham dentro da unidade de trabalho de quem chama; o
/// importador usa as mesmas. As demais abrem e fecham a própria transação.
#[derive(Clone)]
pub struct ClientService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
    calendar: LocalCalendar,
    ledger: CallService<D>,
}

impl<D: Database> ClientService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>, calendar: LocalCalendar, ledger: CallService<D>) -> Self {
        Self { db, clock, calendar, ledger }
    }

    // =========================================================================
    //  1. REGISTRO
    // =========================================================================

    pub async fn find_active_by_tax_id<S: ClientRepository>(
        &self,
        store: &mut S,
        tax_id: &str,
    ) -> Result<Option<Client>, AppError> {
        if tax_id.trim().is_empty() {
            return Ok(None);
        }
        store.find_client_by_tax_id(tax_id, true).await
    }

    pub async fn find_inactive_by_tax_id<S: ClientRepository>(
        &self,
        store: &mut S,
        tax_id: &str,
    ) -> Result<Option<Client>, AppError> {
        if tax_id.trim().is_empty() {
            return Ok(None);
        }
        store.find_client_by_tax_id(tax_id, false).await
    }

    /// Cria um cliente ativo. Nome e consultor são obrigatórios.
    pub async fn create<S: ClientRepository>(&self, store: &mut S, attributes: ClientAttributes) -> Result<Client, AppError> {
        let attrs = attributes.normalized();

        let name = attrs
            .name
            .ok_or_else(|| AppError::required("name", "Nome é obrigatório"))?;
        let consultant_id = attrs
            .consultant_id
            .ok_or_else(|| AppError::required("consultant_id", "Consultor é obrigatório"))?;

        store
            .insert_client(NewClient {
                name,
                tax_id: attrs.tax_id,
                phone: attrs.phone,
                representative_name: attrs.representative_name,
                consultant_id,
                origin: attrs.origin.unwrap_or(ClientOrigin::Manual),
                created_at: self.clock.now(),
            })
            .await
    }

    /// Sobrescreve só os campos preenchidos. Devolve se algo mudou de fato.
    pub async fn update<S: ClientRepository>(
        &self,
        store: &mut S,
        client: &mut Client,
        attributes: ClientAttributes,
    ) -> Result<bool, AppError> {
        let attrs = attributes.normalized();
        let mut changed = false;

        if let Some(name) = attrs.name {
            changed |= replace(&mut client.name, name);
        }
        if let Some(tax_id) = attrs.tax_id {
            changed |= replace(&mut client.tax_id, Some(tax_id));
        }
        if let Some(phone) = attrs.phone {
            changed |= replace(&mut client.phone, Some(phone));
        }
        if let Some(representative) = attrs.representative_name {
            changed |= replace(&mut client.representative_name, Some(representative));
        }
        if let Some(consultant_id) = attrs.consultant_id {
            changed |= replace(&mut client.consultant_id, consultant_id);
        }
        if let Some(origin) = attrs.origin {
            changed |= replace(&mut client.origin, origin);
        }

        if changed {
            store.save_client(client).await?;
        }
        Ok(changed)
    }

    /// Reativa com os dados recebidos. Telefone e representante são
    /// regravados mesmo vazios; a origem passa a ser `imported`.
    pub async fn reactivate<S: ClientRepository>(
        &self,
        store: &mut S,
        client: &mut Client,
        attributes: ClientAttributes,
    ) -> Result<(), AppError> {
        let attrs = attributes.normalized();

        if let Some(name) = attrs.name {
            client.name = name;
        }
        if let Some(consultant_id) = attrs.consultant_id {
            client.consultant_id = consultant_id;
        }
        client.phone = attrs.phone;
        client.representative_name = attrs.representative_name;
        client.active = true;
        client.origin = ClientOrigin::Imported;

        store.save_client(client).await
    }

    /// Desativa sem apagar histórico.
    pub async fn deactivate<S: ClientRepository>(&self, store: &mut S, client: &mut Client) -> Result<(), AppError> {
        client.active = false;
        store.save_client(client).await
    }

    // =========================================================================
    //  2. CADASTRO MANUAL E REMOÇÃO
    // =========================================================================

    /// Consultor cadastra para si; supervisor pode escolher o consultor.
    /// CNPJ já conhecido (ativo ou inativo) regrava e reativa o registro.
    pub async fn create_manual(&self, identity: &Identity, payload: CreateClientPayload) -> Result<Client, AppError> {
        let consultant_id = match payload.consultant_id {
            Some(id) if identity.is_supervisor() => id,
            _ => identity.user_id,
        };

        let attrs = ClientAttributes {
            name: Some(payload.name),
            tax_id: payload.tax_id,
            phone: payload.phone,
            representative_name: payload.representative_name,
            consultant_id: Some(consultant_id),
            origin: Some(ClientOrigin::Manual),
        }
        .normalized();

        let mut tx = self.db.begin().await?;

        let author = tx
            .find_user(identity.user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        if consultant_id != identity.user_id && tx.find_user(consultant_id).await?.is_none() {
            return Err(AppError::NotFound("Consultor"));
        }

        let existing = match attrs.tax_id.as_deref() {
            Some(tax_id) => match self.find_active_by_tax_id(&mut tx, tax_id).await? {
                Some(client) => Some(client),
                None => self.find_inactive_by_tax_id(&mut tx, tax_id).await?,
            },
            None => None,
        };

        let (client, action) = match existing {
            Some(mut client) => {
                client.name = attrs
                    .name
                    .clone()
                    .ok_or_else(|| AppError::required("name", "Nome é obrigatório"))?;
                client.phone = attrs.phone.clone();
                client.representative_name = attrs.representative_name.clone();
                client.consultant_id = consultant_id;
                client.active = true;
                client.origin = ClientOrigin::Manual;
                tx.save_client(&client).await?;
                (client, "atualizado/reativado")
            }
            None => (self.create(&mut tx, attrs).await?, "criado"),
        };

        let now = self.clock.now();
        tx.insert_note(NewNote {
            client_id: client.id,
            author_id: author.id,
            body: format!(
                "Cliente {} manualmente por {} em {}.",
                action,
                author.name,
                self.calendar.to_local(now).format("%d/%m/%Y %H:%M")
            ),
            created_at: now,
        })
        .await?;

        tx.commit().await?;

        tracing::info!("👤 Cliente {} {} por {}", client.id, action, author.name);
        Ok(client)
    }

    /// Desativa o cliente. Com motivo, registra uma ligação "sem interesse".
    pub async fn remove(&self, identity: &Identity, client_id: Uuid, reason: Option<&str>) -> Result<Client, AppError> {
        let mut tx = self.db.begin().await?;

        let client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        if !identity.can_act_for(client.consultant_id) {
            return Err(AppError::forbidden("Sem permissão para este cliente."));
        }

        if let Some(reason) = reason.and_then(non_blank) {
            let input = CallInput {
                outcome: CallOutcome::NotInterested.as_str().to_string(),
                note: Some(format!("CLIENTE REMOVIDO: {}", reason)),
                ..Default::default()
            };
            self.ledger.append(&mut tx, client_id, identity.user_id, &input).await?;
        }

        // Relê: a ligação acima pode ter mexido no retorno agendado
        let mut client = tx
            .find_client(client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        self.deactivate(&mut tx, &mut client).await?;

        tx.commit().await?;

        tracing::info!("🗑️ Cliente {} removido", client.id);
        Ok(client)
    }

    /// Desativa todos os clientes ativos de um consultor (supervisor).
    pub async fn deactivate_all_for_consultant(&self, identity: &Identity, consultant_id: Uuid) -> Result<u64, AppError> {
        identity.require_supervisor()?;

        let mut tx = self.db.begin().await?;
        let affected = tx.deactivate_clients_of(consultant_id).await?;
        tx.commit().await?;

        tracing::info!("🧹 {} clientes do consultor {} desativados", affected, consultant_id);
        Ok(affected)
    }

    // =========================================================================
    //  3. LISTAGEM POR ABA
    // =========================================================================

    pub async fn list(&self, identity: &Identity, query: &ListClientsQuery) -> Result<ClientListing, AppError> {
        let only_mine = !identity.is_supervisor() || query.only_mine;
        let filter = ClientFilter {
            consultant_id: only_mine.then_some(identity.user_id),
            search: query.q.as_deref().and_then(non_blank),
        };

        let mut tx = self.db.begin().await?;
        let overviews = tx.list_client_overviews(&filter).await?;

        let now = self.clock.now();
        let (mut pending, mut contacted, mut follow_up) = (Vec::new(), Vec::new(), Vec::new());
        for overview in overviews {
            let card = bucketing::card(overview, now);
            match card.bucket {
                Bucket::Pending => pending.push(card),
                Bucket::Contacted => contacted.push(card),
                Bucket::NeedsFollowUp => follow_up.push(card),
            }
        }

        let (total_pending, total_contacted, total_follow_up) = (pending.len(), contacted.len(), follow_up.len());

        let clients = match query.tab {
            Bucket::Pending => pending,
            Bucket::NeedsFollowUp => {
                bucketing::sort_follow_ups(&mut follow_up);
                follow_up
            }
            Bucket::Contacted => match query.window {
                Some(window) => contacted
                    .into_iter()
                    .filter(|c| bucketing::within_window(c.last_call_at, window, now))
                    .collect(),
                None => contacted,
            },
        };

        Ok(ClientListing {
            tab: query.tab,
            total_pending,
            total_contacted,
            total_follow_up,
            clients,
        })
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

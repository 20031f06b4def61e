//! Login, token e gestão de usuários.
//!
//! Usa o relógio do sistema: a validação do JWT confere `exp` contra a hora real.

use std::sync::Arc;

use controle_ligacoes::{
    common::{
        clock::{LocalCalendar, SystemClock},
        error::AppError,
    },
    config::AppState,
    db::MemoryDatabase,
    models::auth::{ChangePasswordPayload, CreateUserPayload, Role, UpdateUserPayload, User},
};

struct Setup {
    state: AppState<MemoryDatabase>,
    supervisor: User,
}

fn setup() -> Setup {
    let db = MemoryDatabase::new();
    let state = AppState::build(
        db.clone(),
        Arc::new(SystemClock),
        LocalCalendar::sao_paulo(),
        "segredo-de-teste".into(),
        4,
    );
    let supervisor = db.seed_user("Supervisor", Role::Supervisor);
    Setup { state, supervisor }
}

fn payload(email: &str) -> CreateUserPayload {
    CreateUserPayload {
        name: " Carla ".into(),
        email: email.into(),
        password: "senha-forte".into(),
        role: None,
        daily_goal: None,
    }
}

#[tokio::test]
async fn created_user_can_log_in_and_token_resolves() {
    let s = setup();
    let user = s
        .state
        .user_service
        .create(&s.supervisor.identity(), payload("Carla@Empresa.com "))
        .await
        .unwrap();

    assert_eq!(user.name, "Carla");
    assert_eq!(user.email, "carla@empresa.com");
    assert_eq!(user.role, Role::Consultant);
    assert_eq!(user.daily_goal, 10);
    assert_ne!(user.password_hash, "senha-forte");

    let token = s.state.auth_service.login("CARLA@empresa.com", "senha-forte").await.unwrap();
    let resolved = s.state.auth_service.validate_token(&token).await.unwrap();
    assert_eq!(resolved.id, user.id);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_rejected() {
    let s = setup();
    s.state
        .user_service
        .create(&s.supervisor.identity(), payload("carla@empresa.com"))
        .await
        .unwrap();

    let err = s.state.auth_service.login("carla@empresa.com", "errada").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = s.state.auth_service.login("ninguem@empresa.com", "senha-forte").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = s.state.auth_service.validate_token("nao.e.um.token").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));
}

#[tokio::test]
async fn inactive_users_lose_access() {
    let s = setup();
    let sup = s.supervisor.identity();
    let user = s.state.user_service.create(&sup, payload("carla@empresa.com")).await.unwrap();
    let token = s.state.auth_service.login("carla@empresa.com", "senha-forte").await.unwrap();

    let toggled = s.state.user_service.toggle_status(&sup, user.id).await.unwrap();
    assert!(!toggled.active);

    let err = s.state.auth_service.login("carla@empresa.com", "senha-forte").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    let err = s.state.auth_service.validate_token(&token).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));
}

#[tokio::test]
async fn user_management_is_supervisor_only() {
    let s = setup();
    let sup = s.supervisor.identity();
    let user = s.state.user_service.create(&sup, payload("carla@empresa.com")).await.unwrap();

    let err = s
        .state
        .user_service
        .create(&user.identity(), payload("outra@empresa.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = s.state.user_service.list(&user.identity()).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = s.state.user_service.create(&sup, payload("carla@empresa.com")).await.unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyExists));

    let err = s.state.user_service.toggle_status(&sup, sup.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let updated = s.state.user_service.set_daily_goal(&sup, user.id, -5).await.unwrap();
    assert_eq!(updated.daily_goal, 0);

    let users = s.state.user_service.list(&sup).await.unwrap();
    assert_eq!(users[0].role, Role::Supervisor);
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn first_supervisor_is_only_seeded_into_an_empty_database() {
    let db = MemoryDatabase::new();
    let state = AppState::build(
        db.clone(),
        Arc::new(SystemClock),
        LocalCalendar::sao_paulo(),
        "segredo-de-teste".into(),
        4,
    );

    let created = state
        .user_service
        .ensure_supervisor("Supervisor", "chefe@empresa.com", "senha-forte")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.role, Role::Supervisor);

    let again = state
        .user_service
        .ensure_supervisor("Supervisor", "outro@empresa.com", "senha-forte")
        .await
        .unwrap();
    assert!(again.is_none());

    let token = state.auth_service.login("chefe@empresa.com", "senha-forte").await.unwrap();
    assert!(!token.is_empty());
}

#[tokio::test]
async fn supervisor_edits_a_user() {
    let s = setup();
    let sup = s.supervisor.identity();
    let carla = s.state.user_service.create(&sup, payload("carla@empresa.com")).await.unwrap();
    let outra = s.state.user_service.create(&sup, payload("outra@empresa.com")).await.unwrap();

    let edit = |email: &str| UpdateUserPayload {
        name: " Carla Souza ".into(),
        email: email.into(),
        role: Role::Supervisor,
        daily_goal: None,
    };

    let updated = s
        .state
        .user_service
        .update_user(&sup, carla.id, edit("Carla.Souza@Empresa.com"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Carla Souza");
    assert_eq!(updated.email, "carla.souza@empresa.com");
    assert_eq!(updated.role, Role::Supervisor);
    assert_eq!(updated.daily_goal, 10);

    // O login passa a usar o e-mail novo
    s.state.auth_service.login("carla.souza@empresa.com", "senha-forte").await.unwrap();

    let err = s
        .state
        .user_service
        .update_user(&sup, carla.id, edit("outra@empresa.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyExists));

    let err = s
        .state
        .user_service
        .update_user(&outra.identity(), carla.id, edit("x@empresa.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = s
        .state
        .user_service
        .update_user(&sup, uuid::Uuid::new_v4(), edit("y@empresa.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Usuário")));
}

#[tokio::test]
async fn supervisor_resets_a_password() {
    let s = setup();
    let sup = s.supervisor.identity();
    let carla = s.state.user_service.create(&sup, payload("carla@empresa.com")).await.unwrap();

    let err = s.state.user_service.reset_password(&sup, carla.id, "123").await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = s
        .state
        .user_service
        .reset_password(&carla.identity(), carla.id, "nova-senha")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    s.state.user_service.reset_password(&sup, carla.id, "nova-senha").await.unwrap();

    let err = s.state.auth_service.login("carla@empresa.com", "senha-forte").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    s.state.auth_service.login("carla@empresa.com", "nova-senha").await.unwrap();
}

#[tokio::test]
async fn users_change_their_own_password() {
    let s = setup();
    let carla = s
        .state
        .user_service
        .create(&s.supervisor.identity(), payload("carla@empresa.com"))
        .await
        .unwrap();
    let me = carla.identity();

    let change = |current: &str, new: &str, confirm: &str| ChangePasswordPayload {
        current_password: current.into(),
        new_password: new.into(),
        confirm_password: confirm.into(),
    };

    let err = s
        .state
        .user_service
        .change_password(&me, change("errada", "outra-senha", "outra-senha"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = s
        .state
        .user_service
        .change_password(&me, change("senha-forte", "outra-senha", "diferente"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = s
        .state
        .user_service
        .change_password(&me, change("senha-forte", "curta", "curta"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    s.state
        .user_service
        .change_password(&me, change("senha-forte", "outra-senha", "outra-senha"))
        .await
        .unwrap();

    s.state.auth_service.login("carla@empresa.com", "outra-senha").await.unwrap();
    let err = s.state.auth_service.login("carla@empresa.com", "senha-forte").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

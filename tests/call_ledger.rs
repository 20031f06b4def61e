//! Livro de ligações: retorno agendado, normalização da entrada e
//! permissões de edição da observação.

mod common;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use controle_ligacoes::{
    common::error::AppError,
    models::call::{CallInput, CallOutcome},
};

use common::{setup, start};

fn input(outcome: &str) -> CallInput {
    CallInput { outcome: outcome.into(), ..Default::default() }
}

#[tokio::test]
async fn call_back_without_date_schedules_thirty_days_ahead() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    app.state.call_service.log_call(&app.ana_id(), client.id, input("call_back")).await.unwrap();
    assert_eq!(app.client(client.id).next_call_at, Some(start() + Duration::days(30)));

    // Qualquer outro resultado limpa o retorno
    app.clock.advance(Duration::hours(1));
    app.state.call_service.log_call(&app.ana_id(), client.id, input("purchased")).await.unwrap();
    assert_eq!(app.client(client.id).next_call_at, None);
}

#[tokio::test]
async fn explicit_return_date_lands_at_nine_local() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    let call = CallInput {
        outcome: "call_back".into(),
        return_date: Some("2026-11-05".into()),
        return_days: Some(3),
        ..Default::default()
    };
    app.state.call_service.log_call(&app.ana_id(), client.id, call).await.unwrap();

    let expected = Utc.with_ymd_and_hms(2026, 11, 5, 12, 0, 0).unwrap();
    assert_eq!(app.client(client.id).next_call_at, Some(expected));
}

#[tokio::test]
async fn return_days_are_used_when_no_date_given() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    let call = CallInput { outcome: "call_back".into(), return_days: Some(15), ..Default::default() };
    app.state.call_service.log_call(&app.ana_id(), client.id, call).await.unwrap();

    assert_eq!(app.client(client.id).next_call_at, Some(start() + Duration::days(15)));
}

#[tokio::test]
async fn absurd_return_days_schedule_the_default_return() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    let call = CallInput { outcome: "call_back".into(), return_days: Some(100_000_000), ..Default::default() };
    app.state.call_service.log_call(&app.ana_id(), client.id, call).await.unwrap();

    assert_eq!(app.client(client.id).next_call_at, Some(start() + Duration::days(30)));
    assert_eq!(app.db.calls().len(), 1);
}

#[tokio::test]
async fn unknown_outcome_and_sale_value_are_normalized() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    let call = CallInput {
        outcome: "talvez amanhã".into(),
        note: Some("   ".into()),
        contact_name: Some("  João  ".into()),
        sale_value: Some("1500,50".into()),
        ..Default::default()
    };
    let call = app.state.call_service.log_call(&app.ana_id(), client.id, call).await.unwrap();

    assert_eq!(call.outcome, CallOutcome::NotPurchased);
    assert_eq!(call.sale_value, Decimal::new(150050, 2));
    assert_eq!(call.note, None);
    assert_eq!(call.contact_name.as_deref(), Some("João"));
    assert_eq!(call.consultant_id, app.ana.id);
    assert_eq!(call.called_at, start());
}

#[tokio::test]
async fn only_author_or_supervisor_edits_the_note() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;
    let call = CallInput { outcome: "relationship".into(), note: Some("primeiro contato".into()), ..Default::default() };
    let call = app.state.call_service.log_call(&app.ana_id(), client.id, call).await.unwrap();

    let err = app
        .state
        .call_service
        .edit_note(&app.bruno_id(), call.id, Some("intruso"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let edited = app
        .state
        .call_service
        .edit_note(&app.supervisor_id(), call.id, Some("revisado pelo supervisor"))
        .await
        .unwrap();
    assert_eq!(edited.note.as_deref(), Some("revisado pelo supervisor"));

    // Observação em branco vira nula
    let cleared = app.state.call_service.edit_note(&app.ana_id(), call.id, Some("  ")).await.unwrap();
    assert_eq!(cleared.note, None);
    assert_eq!(app.db.calls()[0].note, None);
}

#[tokio::test]
async fn editing_unknown_call_is_not_found() {
    let app = setup();
    let err = app
        .state
        .call_service
        .edit_note(&app.supervisor_id(), uuid::Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Ligação")));
}

#[tokio::test]
async fn history_is_newest_first_with_edit_flags() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    app.state.call_service.log_call(&app.ana_id(), client.id, input("relationship")).await.unwrap();
    app.clock.advance(Duration::hours(2));
    app.state.call_service.log_call(&app.supervisor_id(), client.id, input("purchased")).await.unwrap();

    let history = app.state.call_service.history_for(&app.ana_id(), client.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].call.outcome, CallOutcome::Purchased);
    assert_eq!(history[0].consultant_name, "Supervisor");
    assert!(!history[0].can_edit);
    assert_eq!(history[1].consultant_name, "Ana");
    assert!(history[1].can_edit);

    let history = app.state.call_service.history_for(&app.supervisor_id(), client.id).await.unwrap();
    assert!(history.iter().all(|h| h.can_edit));
}

#[tokio::test]
async fn consultants_cannot_touch_other_portfolios() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    let err = app
        .state
        .call_service
        .log_call(&app.bruno_id(), client.id, input("purchased"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = app.state.call_service.history_for(&app.bruno_id(), client.id).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = app
        .state
        .call_service
        .log_call(&app.ana_id(), uuid::Uuid::new_v4(), input("purchased"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Cliente")));
    assert!(app.db.calls().is_empty());
}

#[tokio::test]
async fn failed_commit_leaves_no_call_behind() {
    let app = setup();
    let client = app.client_for(&app.ana, "Padaria Central", None).await;

    app.db.fail_next_commit();
    let err = app
        .state
        .call_service
        .log_call(&app.ana_id(), client.id, input("call_back"))
        .await
        .unwrap_err();

    assert!(err.is_persistence());
    assert!(app.db.calls().is_empty());
    assert_eq!(app.client(client.id).next_call_at, None);
}

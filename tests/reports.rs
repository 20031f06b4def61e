//! Painéis do consultor e do supervisor, resultados mensais e relatório diário.

mod common;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use controle_ligacoes::{
    common::error::AppError,
    models::{
        call::{CallInput, CallOutcome},
        dashboard::DailyCount,
    },
};

use common::{setup, start, TestApp};

fn sale(outcome: &str, value: &str) -> CallInput {
    CallInput { outcome: outcome.into(), sale_value: Some(value.into()), ..Default::default() }
}

/// Ana: uma venda de 200 há 10 dias e três ligações hoje (uma venda de 100).
async fn seed_calls(app: &TestApp) {
    let ana = app.ana_id();
    let first = app.client_for(&app.ana, "Padaria Central", None).await;
    let second = app.client_for(&app.ana, "Mercado Sul", None).await;
    let calls = &app.state.call_service;

    app.clock.set(start() - Duration::days(10));
    calls.log_call(&ana, first.id, sale("purchased", "200")).await.unwrap();

    app.clock.set(start());
    calls.log_call(&ana, first.id, sale("purchased", "100")).await.unwrap();
    calls.log_call(&ana, second.id, sale("not_purchased", "")).await.unwrap();
    calls.log_call(&ana, second.id, sale("call_back", "")).await.unwrap();
}

#[tokio::test]
async fn consultant_stats_cover_today_week_and_month() {
    let app = setup();
    seed_calls(&app).await;

    let stats = app.state.report_service.consultant_stats(&app.ana_id()).await.unwrap();
    assert_eq!(stats.total_clients, 2);
    assert_eq!(stats.calls_today, 3);
    assert_eq!(stats.calls_week, 3);
    assert_eq!(stats.calls_month, 4);
    assert_eq!(stats.daily_goal, 10);
    assert_eq!(stats.goal_progress, 30.0);
    assert_eq!(stats.conversion_rate, 50.0);
    assert_eq!(stats.revenue_month, Decimal::new(300, 0));

    let empty = app.state.report_service.consultant_stats(&app.bruno_id()).await.unwrap();
    assert_eq!(empty.calls_month, 0);
    assert_eq!(empty.conversion_rate, 0.0);
}

#[tokio::test]
async fn supervisor_dashboard_aggregates_the_team() {
    let app = setup();
    seed_calls(&app).await;

    let dash = app.state.report_service.supervisor_dashboard(&app.supervisor_id()).await.unwrap();
    assert_eq!(dash.total_consultants, 2);
    assert_eq!(dash.total_clients, 2);
    assert_eq!(dash.total_calls, 4);
    assert_eq!(dash.calls_today, 3);

    assert_eq!(dash.ranking[0].name, "Ana");
    assert_eq!(dash.ranking[0].calls, 4);
    assert_eq!(dash.ranking[1].calls, 0);

    assert_eq!(
        dash.calls_per_day,
        vec![DailyCount { day: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), total: 3 }]
    );

    let outcomes: Vec<(CallOutcome, i64)> = dash.outcomes.iter().map(|o| (o.outcome, o.total)).collect();
    assert_eq!(
        outcomes,
        vec![
            (CallOutcome::Purchased, 2),
            (CallOutcome::NotPurchased, 1),
            (CallOutcome::CallBack, 1),
        ]
    );

    let names: Vec<&str> = dash.goal_progress.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Bruno"]);
    assert_eq!(dash.goal_progress[0].done, 3);
    assert_eq!(dash.goal_progress[0].percent, 30.0);

    assert_eq!(dash.conversion[0].name, "Ana");
    assert_eq!(dash.conversion[0].conversion, 50.0);
    assert_eq!(dash.conversion[0].revenue, Decimal::new(300, 0));
}

#[tokio::test]
async fn supervisor_reports_are_denied_to_consultants() {
    let app = setup();
    let ana = app.ana_id();

    let err = app.state.report_service.supervisor_dashboard(&ana).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = app.state.report_service.monthly_results(&ana, None, None).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    let err = app.state.report_service.daily_report(&ana).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn monthly_results_validate_the_month() {
    let app = setup();
    seed_calls(&app).await;
    let sup = app.supervisor_id();

    let err = app.state.report_service.monthly_results(&sup, Some(13), Some(2026)).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let results = app.state.report_service.monthly_results(&sup, None, None).await.unwrap();
    assert_eq!((results.month, results.year), (10, 2026));
    assert_eq!(results.consultants[0].name, "Ana");
    assert_eq!(results.consultants[0].calls, 4);
    assert_eq!(results.consultants[0].sales, 2);

    let september = app.state.report_service.monthly_results(&sup, Some(9), Some(2026)).await.unwrap();
    assert!(september.consultants.iter().all(|c| c.calls == 0));
}

#[tokio::test]
async fn my_monthly_calls_lists_newest_first() {
    let app = setup();
    seed_calls(&app).await;

    let mine = app.state.report_service.my_monthly_calls(&app.ana_id(), None, None).await.unwrap();
    assert_eq!(mine.calls.len(), 4);
    assert_eq!(mine.total_calls, 4);
    assert_eq!(mine.sales, 2);
    assert_eq!(mine.revenue, Decimal::new(300, 0));
    assert_eq!(mine.conversion_rate, 50.0);
    assert_eq!(mine.calls.last().unwrap().called_at, start() - Duration::days(10));
    assert_eq!(mine.calls.last().unwrap().client_name, "Padaria Central");

    let bruno = app.state.report_service.my_monthly_calls(&app.bruno_id(), None, None).await.unwrap();
    assert!(bruno.calls.is_empty());
}

#[tokio::test]
async fn day_drill_down_lists_the_local_day_newest_first() {
    let app = setup();
    seed_calls(&app).await;
    let sup = app.supervisor_id();

    let today = app.state.report_service.calls_of_day(&sup, "2026-10-18").await.unwrap();
    assert_eq!(today.len(), 3);
    assert!(today.windows(2).all(|w| w[0].called_at >= w[1].called_at));
    assert!(today.iter().all(|c| c.consultant_name == "Ana"));
    assert!(today.iter().any(|c| c.client_name == "Padaria Central" && c.sale_value == Decimal::new(100, 0)));

    let earlier = app.state.report_service.calls_of_day(&sup, "2026-10-08").await.unwrap();
    assert_eq!(earlier.len(), 1);
    assert_eq!(earlier[0].outcome, CallOutcome::Purchased);

    let empty = app.state.report_service.calls_of_day(&sup, "2026-10-17").await.unwrap();
    assert!(empty.is_empty());

    let err = app.state.report_service.calls_of_day(&sup, "18/10/2026").await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app.state.report_service.calls_of_day(&app.ana_id(), "2026-10-18").await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn daily_report_summarizes_today_and_month() {
    let app = setup();
    seed_calls(&app).await;

    let report = app.state.report_service.daily_report(&app.supervisor_id()).await.unwrap();
    assert_eq!(report.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    assert_eq!(report.calls_today, 3);
    assert_eq!(report.calls_week, 3);
    assert_eq!(report.calls_month, 4);
    assert_eq!(report.purchases_month, 2);
    assert_eq!(report.conversion_month, 50.0);
    assert_eq!(report.revenue_month, Decimal::new(300, 0));

    let names: Vec<&str> = report.consultants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Bruno"]);
}

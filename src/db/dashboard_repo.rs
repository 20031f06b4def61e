// src/db/dashboard_repo.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{pg::PgStore, repository::ReportRepository},
    models::dashboard::{
        CallStats, CallWindow, ConsultantCall, ConsultantPerformance, DailyCount, DayCall, OutcomeCount,
    },
};

impl ReportRepository for PgStore {
    async fn count_active_clients(&mut self, consultant_id: Option<Uuid>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM clients WHERE active = TRUE AND ($1::uuid IS NULL OR consultant_id = $1)",
        )
        .bind(consultant_id)
        .fetch_one(self.conn())
        .await?;

        Ok(total)
    }

    async fn count_active_consultants(&mut self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = 'consultant' AND active = TRUE",
        )
        .fetch_one(self.conn())
        .await?;

        Ok(total)
    }

    async fn count_all_calls(&mut self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM calls")
            .fetch_one(self.conn())
            .await?;

        Ok(total)
    }

    // 1. Totais de uma janela (ligações, vendas, receita)
    async fn call_stats(&mut self, window: CallWindow) -> Result<CallStats, AppError> {
        let stats = sqlx::query_as::<_, CallStats>(
            r#"
            SELECT
                COUNT(*) AS calls,
                COUNT(*) FILTER (WHERE outcome = 'purchased') AS sales,
                COALESCE(SUM(sale_value) FILTER (WHERE outcome = 'purchased'), 0) AS revenue
            FROM calls
            WHERE called_at >= $1
              AND called_at < $2
              AND ($3::uuid IS NULL OR consultant_id = $3)
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .bind(window.consultant_id)
        .fetch_one(self.conn())
        .await?;

        Ok(stats)
    }

    // 2. Gráfico de barras: ligações por dia no fuso da equipe
    async fn calls_per_day(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        offset_seconds: i32,
    ) -> Result<Vec<DailyCount>, AppError> {
        let data = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT
                ((called_at AT TIME ZONE 'UTC') + make_interval(secs => $3::double precision))::date AS day,
                COUNT(*) AS total
            FROM calls
            WHERE called_at >= $1 AND called_at < $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(f64::from(offset_seconds))
        .fetch_all(self.conn())
        .await?;

        Ok(data)
    }

    // 3. Pizza de resultados
    async fn outcome_breakdown(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<OutcomeCount>, AppError> {
        let data = sqlx::query_as::<_, OutcomeCount>(
            r#"
            SELECT outcome, COUNT(*) AS total
            FROM calls
            WHERE called_at >= $1 AND called_at < $2
            GROUP BY outcome
            ORDER BY total DESC, outcome ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.conn())
        .await?;

        Ok(data)
    }

    // 4. Desempenho por consultor (ranking, conversão, meta)
    async fn consultant_performance(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ConsultantPerformance>, AppError> {
        let data = sqlx::query_as::<_, ConsultantPerformance>(
            r#"
            SELECT
                u.id AS consultant_id,
                u.name,
                u.daily_goal,
                COUNT(l.id) AS calls,
                COUNT(l.id) FILTER (WHERE l.outcome = 'purchased') AS sales,
                COALESCE(SUM(l.sale_value) FILTER (WHERE l.outcome = 'purchased'), 0) AS revenue
            FROM users u
            LEFT JOIN calls l
                   ON l.consultant_id = u.id
                  AND l.called_at >= $1
                  AND l.called_at < $2
            WHERE u.role = 'consultant' AND u.active = TRUE
            GROUP BY u.id, u.name, u.daily_goal
            ORDER BY revenue DESC, u.name ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.conn())
        .await?;

        Ok(data)
    }

    async fn calls_of_consultant(
        &mut self,
        consultant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ConsultantCall>, AppError> {
        let data = sqlx::query_as::<_, ConsultantCall>(
            r#"
            SELECT l.id, l.client_id, c.name AS client_name, l.called_at,
                   l.outcome, l.sale_value, l.note
            FROM calls l
            INNER JOIN clients c ON c.id = l.client_id
            WHERE l.consultant_id = $1
              AND l.called_at >= $2
              AND l.called_at < $3
            ORDER BY l.called_at DESC
            "#,
        )
        .bind(consultant_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.conn())
        .await?;

        Ok(data)
    }

    async fn calls_between(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<DayCall>, AppError> {
        let data = sqlx::query_as::<_, DayCall>(
            r#"
            SELECT l.id, l.called_at, u.name AS consultant_name, c.name AS client_name,
                   l.contact_name, l.outcome, l.sale_value, l.note
            FROM calls l
            INNER JOIN clients c ON c.id = l.client_id
            INNER JOIN users u ON u.id = l.consultant_id
            WHERE l.called_at >= $1
              AND l.called_at < $2
            ORDER BY l.called_at DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.conn())
        .await?;

        Ok(data)
    }
}

// src/services/report_service.rs

//! Painéis e relatório diário. Só leitura.
//!
//! "Hoje" e "mês" são contados no fuso da equipe. As janelas de 7 e 30 dias
//! vão de `agora - N dias` até o fim do dia local corrente.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::{
        clock::{Clock, LocalCalendar},
        error::AppError,
    },
    db::{Database, ReportRepository, UserRepository},
    models::{
        auth::Identity,
        dashboard::{
            CallWindow, ConsultantPerformance, ConsultantStats, ConversionEntry, DailyReport, DayCall, GoalProgress, MonthlyResults,
            MyMonthlyCalls, RankingEntry, SupervisorDashboard,
        },
    },
};

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Percentual com uma casa decimal; total zero dá zero.
pub fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}

fn conversion_entry(p: ConsultantPerformance) -> ConversionEntry {
    ConversionEntry {
        consultant_id: p.consultant_id,
        conversion: percent(p.sales, p.calls),
        name: p.name,
        calls: p.calls,
        sales: p.sales,
        revenue: p.revenue,
    }
}

#[derive(Clone)]
pub struct ReportService<D: Database> {
    db: D,
    clock: Arc<dyn Clock>,
    calendar: LocalCalendar,
}

/// Recortes de tempo calculados a partir de um único "agora".
struct Windows {
    today: (DateTime<Utc>, DateTime<Utc>),
    week_from: DateTime<Utc>,
    month_from: DateTime<Utc>,
}

impl Windows {
    fn window(&self, from: DateTime<Utc>, consultant_id: Option<Uuid>) -> CallWindow {
        CallWindow { from, to: self.today.1, consultant_id }
    }

    fn today(&self, consultant_id: Option<Uuid>) -> CallWindow {
        CallWindow { from: self.today.0, to: self.today.1, consultant_id }
    }
}

impl<D: Database> ReportService<D> {
    pub fn new(db: D, clock: Arc<dyn Clock>, calendar: LocalCalendar) -> Self {
        Self { db, clock, calendar }
    }

    fn windows(&self) -> Result<Windows, AppError> {
        let now = self.clock.now();
        let today = self
            .calendar
            .day_bounds(self.calendar.today(now))
            .ok_or_else(|| anyhow!("relógio fora do intervalo de datas: {now}"))?;
        Ok(Windows {
            today,
            week_from: now - Duration::days(WEEK_DAYS),
            month_from: now - Duration::days(MONTH_DAYS),
        })
    }

    fn month_window(&self, month: Option<u32>, year: Option<i32>) -> Result<(u32, i32, DateTime<Utc>, DateTime<Utc>), AppError> {
        let (current_month, current_year) = self.calendar.current_month(self.clock.now());
        let (month, year) = (month.unwrap_or(current_month), year.unwrap_or(current_year));
        let (from, to) = self
            .calendar
            .month_bounds(month, year)
            .ok_or_else(|| AppError::required("month", "Mês inválido"))?;
        Ok((month, year, from, to))
    }

    // 1. Cards do consultor
    pub async fn consultant_stats(&self, identity: &Identity) -> Result<ConsultantStats, AppError> {
        let w = self.windows()?;
        let me = Some(identity.user_id);

        let mut tx = self.db.begin().await?;

        let user = tx
            .find_user(identity.user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        let total_clients = tx.count_active_clients(me).await?;
        let today = tx.call_stats(w.today(me)).await?;
        let week = tx.call_stats(w.window(w.week_from, me)).await?;
        let month = tx.call_stats(w.window(w.month_from, me)).await?;

        Ok(ConsultantStats {
            total_clients,
            calls_today: today.calls,
            calls_week: week.calls,
            calls_month: month.calls,
            daily_goal: user.daily_goal,
            goal_progress: percent(today.calls, i64::from(user.daily_goal)),
            conversion_rate: percent(month.sales, month.calls),
            revenue_month: month.revenue,
        })
    }

    // 2. Painel do supervisor
    pub async fn supervisor_dashboard(&self, identity: &Identity) -> Result<SupervisorDashboard, AppError> {
        identity.require_supervisor()?;
        let w = self.windows()?;

        let mut tx = self.db.begin().await?;

        let total_consultants = tx.count_active_consultants().await?;
        let total_clients = tx.count_active_clients(None).await?;
        let total_calls = tx.count_all_calls().await?;
        let calls_today = tx.call_stats(w.today(None)).await?.calls;

        let calls_per_day = tx
            .calls_per_day(w.week_from, w.today.1, self.calendar.offset_seconds())
            .await?;
        let outcomes = tx.outcome_breakdown(w.month_from, w.today.1).await?;

        let month = tx.consultant_performance(w.month_from, w.today.1).await?;
        let mut today = tx.consultant_performance(w.today.0, w.today.1).await?;

        let mut ranking: Vec<RankingEntry> = month
            .iter()
            .map(|p| RankingEntry { name: p.name.clone(), calls: p.calls })
            .collect();
        ranking.sort_by(|a, b| b.calls.cmp(&a.calls));

        today.sort_by(|a, b| a.name.cmp(&b.name));
        let goal_progress = today
            .into_iter()
            .map(|p| GoalProgress {
                consultant_id: p.consultant_id,
                percent: percent(p.calls, i64::from(p.daily_goal)),
                name: p.name,
                goal: p.daily_goal,
                done: p.calls,
            })
            .collect();

        Ok(SupervisorDashboard {
            total_consultants,
            total_clients,
            total_calls,
            calls_today,
            ranking,
            calls_per_day,
            outcomes,
            goal_progress,
            conversion: month.into_iter().map(conversion_entry).collect(),
        })
    }

    // 3. Resultados por mês (supervisor)
    pub async fn monthly_results(
        &self,
        identity: &Identity,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<MonthlyResults, AppError> {
        identity.require_supervisor()?;
        let (month, year, from, to) = self.month_window(month, year)?;

        let mut tx = self.db.begin().await?;
        let consultants = tx
            .consultant_performance(from, to)
            .await?
            .into_iter()
            .map(conversion_entry)
            .collect();

        Ok(MonthlyResults { month, year, consultants })
    }

    // 4. Minhas ligações do mês
    pub async fn my_monthly_calls(
        &self,
        identity: &Identity,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<MyMonthlyCalls, AppError> {
        let (month, year, from, to) = self.month_window(month, year)?;

        let mut tx = self.db.begin().await?;
        let calls = tx.calls_of_consultant(identity.user_id, from, to).await?;
        let stats = tx
            .call_stats(CallWindow { from, to, consultant_id: Some(identity.user_id) })
            .await?;

        Ok(MyMonthlyCalls {
            month,
            year,
            calls,
            total_calls: stats.calls,
            sales: stats.sales,
            revenue: stats.revenue,
            conversion_rate: percent(stats.sales, stats.calls),
        })
    }

    // 5. Ligações de um dia (supervisor)
    pub async fn calls_of_day(&self, identity: &Identity, date: &str) -> Result<Vec<DayCall>, AppError> {
        identity.require_supervisor()?;
        let (from, to) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|day| self.calendar.day_bounds(day))
            .ok_or_else(|| AppError::required("date", "Data inválida, use AAAA-MM-DD."))?;

        let mut tx = self.db.begin().await?;
        tx.calls_between(from, to).await
    }

    // 6. Relatório diário
    pub async fn daily_report(&self, identity: &Identity) -> Result<DailyReport, AppError> {
        identity.require_supervisor()?;
        self.build_daily_report().await
    }

    /// Mesmo agregado usado pelo endpoint e por um eventual envio agendado.
    pub async fn build_daily_report(&self) -> Result<DailyReport, AppError> {
        let w = self.windows()?;

        let mut tx = self.db.begin().await?;

        let today = tx.call_stats(w.today(None)).await?;
        let week = tx.call_stats(w.window(w.week_from, None)).await?;
        let month = tx.call_stats(w.window(w.month_from, None)).await?;
        let outcomes = tx.outcome_breakdown(w.month_from, w.today.1).await?;

        let mut consultants: Vec<ConversionEntry> = tx
            .consultant_performance(w.month_from, w.today.1)
            .await?
            .into_iter()
            .map(conversion_entry)
            .collect();
        consultants.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(DailyReport {
            date: self.calendar.today(self.clock.now()),
            calls_today: today.calls,
            calls_week: week.calls,
            calls_month: month.calls,
            purchases_month: month.sales,
            conversion_month: percent(month.sales, month.calls),
            revenue_month: month.revenue,
            outcomes,
            consultants,
        })
    }
}

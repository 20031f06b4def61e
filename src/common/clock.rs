// src/common/clock.rs

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

/// Fonte de "agora" injetável. Produção usa o relógio do sistema; os testes
/// usam um relógio fixo para deixar retorno agendado e abas determinísticos.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Relógio parado num instante, que pode ser avançado manualmente.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(RwLock::new(now)) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

// ---
// Calendário local: a equipe trabalha num fuso fixo (padrão -03:00), e é nele
// que "hoje", "09:00" e "mês" fazem sentido.
// ---
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Fuso de São Paulo (sem horário de verão).
    pub fn sao_paulo() -> Self {
        Self::from_hours(-3).unwrap_or_else(|| Self::new(Utc.fix()))
    }

    pub fn from_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }

    pub fn offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date()
    }

    /// Converte um horário de parede local para UTC. `None` fora do
    /// intervalo representável.
    pub fn at_local(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        let local = date.and_time(time);
        let utc = local.checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))?;
        Some(Utc.from_utc_datetime(&utc))
    }

    /// Intervalo [início, fim) do dia local em UTC.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.at_local(date, NaiveTime::MIN)?;
        Some((start, start.checked_add_signed(Duration::days(1))?))
    }

    /// Intervalo [início, fim) de um mês local em UTC. `None` para mês inválido.
    pub fn month_bounds(&self, month: u32, year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some((self.at_local(first, NaiveTime::MIN)?, self.at_local(next, NaiveTime::MIN)?))
    }

    pub fn current_month(&self, now: DateTime<Utc>) -> (u32, i32) {
        let today = self.today(now);
        (today.month(), today.year())
    }
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::sao_paulo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn local_nine_oclock_is_noon_utc_in_sao_paulo() {
        let cal = LocalCalendar::sao_paulo();
        let date = NaiveDate::from_ymd_opt(2026, 11, 5).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(cal.at_local(date, nine), Some(utc(2026, 11, 5, 12, 0)));
    }

    #[test]
    fn extreme_dates_do_not_overflow() {
        let cal = LocalCalendar::sao_paulo();
        let late = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        // -03:00 empurra o último dia representável para depois do limite
        assert_eq!(cal.at_local(NaiveDate::MAX, late), None);
        assert_eq!(cal.day_bounds(NaiveDate::MAX), None);

        let east = LocalCalendar::from_hours(5).unwrap();
        assert_eq!(east.at_local(NaiveDate::MIN, NaiveTime::MIN), None);
    }

    #[test]
    fn today_uses_local_wall_clock() {
        let cal = LocalCalendar::sao_paulo();
        // 01:30 UTC ainda é o dia anterior em -03:00
        let now = utc(2026, 10, 18, 1, 30);
        assert_eq!(cal.today(now), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    }

    #[test]
    fn month_bounds_wrap_december() {
        let cal = LocalCalendar::sao_paulo();
        let (start, end) = cal.month_bounds(12, 2026).unwrap();
        assert_eq!(start, utc(2026, 12, 1, 3, 0));
        assert_eq!(end, utc(2027, 1, 1, 3, 0));
        assert!(cal.month_bounds(13, 2026).is_none());
        assert!(cal.month_bounds(12, i32::MAX).is_none());
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(utc(2026, 1, 1, 0, 0));
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), utc(2026, 1, 3, 0, 0));
    }
}

// src/services/bucketing.rs

//! Classificação dos clientes nas abas (pendentes, contatados, retornar).
//!
//! Tudo aqui é função pura: recebe o resumo do cliente e o "agora", devolve a
//! aba. Nada é persistido; a aba é recalculada a cada leitura.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::{
    common::clock::LocalCalendar,
    models::{
        call::CallOutcome,
        client::{Bucket, BucketStatus, ClientCard, ClientOverview, ContactedWindow},
    },
};

/// Retorno padrão quando o consultor não informa data nem dias.
pub const DEFAULT_RETURN_DAYS: i64 = 30;
pub const RECENT_DAYS: i64 = 7;
pub const STALE_DAYS: i64 = 30;

/// Horário local fixo dos retornos com data explícita.
pub fn return_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn classify(total_calls: i64, next_call_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> BucketStatus {
    if total_calls == 0 {
        return BucketStatus { bucket: Bucket::Pending, overdue: false };
    }
    match next_call_at {
        Some(at) => BucketStatus { bucket: Bucket::NeedsFollowUp, overdue: now >= at },
        None => BucketStatus { bucket: Bucket::Contacted, overdue: false },
    }
}

/// Próximo retorno gravado no cliente quando uma ligação entra.
///
/// Só `call_back` agenda; qualquer outro resultado limpa (`None`).
/// Ordem: data explícita às 09:00 locais, depois dias positivos, depois 30 dias.
/// Uma data que não parseia, ou que estoura o intervalo de datas, cai direto
/// nos 30 dias.
pub fn scheduled_return(
    outcome: CallOutcome,
    return_date: Option<&str>,
    return_days: Option<i64>,
    now: DateTime<Utc>,
    calendar: &LocalCalendar,
) -> Option<DateTime<Utc>> {
    if outcome != CallOutcome::CallBack {
        return None;
    }

    let default = now.checked_add_signed(Duration::days(DEFAULT_RETURN_DAYS));

    if let Some(raw) = return_date.map(str::trim).filter(|d| !d.is_empty()) {
        return match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => calendar.at_local(date, return_time()).or(default),
            Err(_) => default,
        };
    }

    match return_days {
        Some(days) if days > 0 => Duration::try_days(days)
            .and_then(|d| now.checked_add_signed(d))
            .or(default),
        _ => default,
    }
}

/// Recorte da aba "contatados" pela data da última ligação.
pub fn within_window(last_call_at: Option<DateTime<Utc>>, window: ContactedWindow, now: DateTime<Utc>) -> bool {
    let Some(last) = last_call_at else {
        return false;
    };
    match window {
        ContactedWindow::Recent => last >= now - Duration::days(RECENT_DAYS),
        ContactedWindow::Stale => last < now - Duration::days(STALE_DAYS),
    }
}

/// Retornos mais próximos primeiro; sem data vai para o fim.
pub fn sort_follow_ups(cards: &mut [ClientCard]) {
    cards.sort_by(|a, b| match (a.next_call_at, b.next_call_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub fn card(overview: ClientOverview, now: DateTime<Utc>) -> ClientCard {
    let status = classify(overview.total_calls, overview.client.next_call_at, now);
    let client = overview.client;
    ClientCard {
        id: client.id,
        name: client.name,
        tax_id: client.tax_id,
        phone: client.phone,
        representative_name: client.representative_name,
        consultant_id: client.consultant_id,
        origin: client.origin,
        total_calls: overview.total_calls,
        last_call_at: overview.last_call_at,
        next_call_at: client.next_call_at,
        bucket: status.bucket,
        overdue: status.overdue,
    }
}

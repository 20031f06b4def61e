// src/common/text.rs

// Normalização dos textos que chegam de formulários e planilhas.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Remove espaços das pontas.
pub fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// `Some(texto limpo)` ou `None` se ficou vazio.
pub fn non_blank(value: &str) -> Option<String> {
    let cleaned = value.trim();
    if cleaned.is_empty() { None } else { Some(cleaned.to_string()) }
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Corta em `max` caracteres (não bytes).
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Valor de venda aceita vírgula ou ponto como separador decimal.
/// Qualquer coisa que não seja número vira zero.
pub fn parse_sale_value(raw: &str) -> Decimal {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&normalized)
        .map(|v| v.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

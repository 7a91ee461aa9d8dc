use thiserror::Error;
use time::{
    format_description::FormatItem, macros::format_description, Date, PrimitiveDateTime, Time,
};

/// Products with fewer units than this in stock are flagged as running low
pub(crate) const LOW_STOCK_THRESHOLD: i64 = 10;

/// Number of digits in a CPF (individual taxpayer number)
pub(crate) const CPF_DIGITS: usize = 11;

/// Number of digits in a CNPJ (corporate taxpayer number)
pub(crate) const CNPJ_DIGITS: usize = 14;

/// Area code plus an eight-digit landline number
pub(crate) const MIN_PHONE_DIGITS: usize = 10;

const MAX_PHONE_DIGITS: usize = 11;

pub(crate) static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

static HMS_FMT: &[FormatItem<'_>] =
    format_description!("[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]");

static DISPLAY_FMT: &[FormatItem<'_>] =
    format_description!("[day]/[month]/[year] às [hour]:[minute]");

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum ValidationError {
    #[error("document must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    Document(usize),
    #[error("phone number must have at least 10 digits, got {0}")]
    Phone(usize),
    #[error("invalid amount: {0:?}")]
    Amount(String),
    #[error("{0} must not be empty")]
    Blank(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("unknown status {0:?}; expected ABERTA, EM_ANDAMENTO, AGUARDANDO_PECA, AGUARDANDO_APROVACAO, CONCLUIDA, or CANCELADA")]
    Status(String),
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Formats an amount in reais with Brazilian separators, e.g. `R$ 1.234,56`
pub(crate) fn format_brl(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Parses currency input the way the amount field does: every digit typed is
/// taken as a cent, so `"R$ 1.234,56"` and `"123456"` both mean 1234.56.
pub(crate) fn parse_brl_amount(raw: &str) -> Result<f64, ValidationError> {
    let digits = digits(raw);
    let digits = digits.trim_start_matches('0');
    let padded = format!("{digits:0>3}");
    let (reais, cents) = padded.split_at(padded.len() - 2);
    format!("{reais}.{cents}")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::Amount(raw.to_owned()))
}

/// Applies the CPF mask (`000.000.000-00`) to up to eleven digits and the CNPJ
/// mask (`00.000.000/0000-00`) to longer input, dropping anything past
/// fourteen digits.  Partial input is masked as far as it goes.
pub(crate) fn mask_document(raw: &str) -> String {
    let mut digits = digits(raw);
    digits.truncate(CNPJ_DIGITS);
    let separators: &[(usize, char)] = if digits.len() <= CPF_DIGITS {
        &[(3, '.'), (6, '.'), (9, '-')]
    } else {
        &[(2, '.'), (5, '.'), (8, '/'), (12, '-')]
    };
    let mut masked = String::with_capacity(digits.len() + separators.len());
    for (i, ch) in digits.chars().enumerate() {
        if let Some(&(_, sep)) = separators.iter().find(|&&(pos, _)| pos == i) {
            masked.push(sep);
        }
        masked.push(ch);
    }
    masked
}

/// Applies the phone mask: `(00) 0000-0000` for landlines and
/// `(00) 00000-0000` for mobile numbers
pub(crate) fn mask_phone(raw: &str) -> String {
    let mut digits = digits(raw);
    digits.truncate(MAX_PHONE_DIGITS);
    if digits.len() <= 2 {
        return digits;
    }
    let (area, number) = digits.split_at(2);
    if number.len() < 8 {
        format!("({area}) {number}")
    } else {
        let (head, tail) = number.split_at(number.len() - 4);
        format!("({area}) {head}-{tail}")
    }
}

pub(crate) fn validate_document(raw: &str) -> Result<(), ValidationError> {
    match digits(raw).len() {
        CPF_DIGITS | CNPJ_DIGITS => Ok(()),
        n => Err(ValidationError::Document(n)),
    }
}

pub(crate) fn validate_phone(raw: &str) -> Result<(), ValidationError> {
    let n = digits(raw).len();
    if n >= MIN_PHONE_DIGITS {
        Ok(())
    } else {
        Err(ValidationError::Phone(n))
    }
}

pub(crate) fn validate_present(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank(field))
    } else {
        Ok(())
    }
}

/// Parses a timestamp as sent by the backend: an ISO 8601 local date-time
/// (`2025-06-15T10:00:00`, optionally with fractional seconds), the same with
/// a trailing UTC offset, which is ignored, or a bare date.
pub(crate) fn parse_timestamp(s: &str) -> Option<PrimitiveDateTime> {
    let s = s.trim();
    let (date_part, time_part) = match s.split_once(['T', ' ']) {
        Some((d, t)) => (d, Some(t)),
        None => (s, None),
    };
    let date = Date::parse(date_part, &YMD_FMT).ok()?;
    let time = match time_part {
        Some(t) => Time::parse(strip_offset(t), &HMS_FMT).ok()?,
        None => Time::MIDNIGHT,
    };
    Some(PrimitiveDateTime::new(date, time))
}

fn strip_offset(t: &str) -> &str {
    if let Some(t) = t.strip_suffix('Z') {
        t
    } else if let Some(i) = t.rfind(['+', '-']) {
        &t[..i]
    } else {
        t
    }
}

/// Renders a backend timestamp as `dd/MM/yyyy às HH:mm`, or `-` if it is
/// missing or malformed
pub(crate) fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .and_then(|dt| dt.format(&DISPLAY_FMT).ok())
        .unwrap_or_else(|| String::from("-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(5.5), "R$ 5,50");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1_234_567.8), "R$ 1.234.567,80");
        assert_eq!(format_brl(-42.0), "-R$ 42,00");
        assert_eq!(format_brl(-0.001), "R$ 0,00");
    }

    #[test]
    fn test_parse_brl_amount() {
        assert_eq!(parse_brl_amount("R$ 1.234,56"), Ok(1234.56));
        assert_eq!(parse_brl_amount("123456"), Ok(1234.56));
        assert_eq!(parse_brl_amount("5"), Ok(0.05));
        assert_eq!(parse_brl_amount("000050"), Ok(0.5));
        assert_eq!(parse_brl_amount(""), Ok(0.0));
    }

    #[test]
    fn test_mask_document() {
        assert_eq!(mask_document("123"), "123");
        assert_eq!(mask_document("1234"), "123.4");
        assert_eq!(mask_document("1234567"), "123.456.7");
        assert_eq!(mask_document("12345678901"), "123.456.789-01");
        assert_eq!(mask_document("123.456.789-01"), "123.456.789-01");
        assert_eq!(mask_document("123456789012"), "12.345.678/9012");
        assert_eq!(mask_document("12345678000190"), "12.345.678/0001-90");
        assert_eq!(mask_document("12345678000190999"), "12.345.678/0001-90");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("1"), "1");
        assert_eq!(mask_phone("119"), "(11) 9");
        assert_eq!(mask_phone("1132345678"), "(11) 3234-5678");
        assert_eq!(mask_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(mask_phone("(11) 98765-4321 ramal 2"), "(11) 98765-4321");
    }

    #[test]
    fn test_validate_document() {
        assert_eq!(validate_document("123.456.789-01"), Ok(()));
        assert_eq!(validate_document("12.345.678/0001-90"), Ok(()));
        assert_eq!(validate_document("123.456.789"), Err(ValidationError::Document(9)));
        assert_eq!(validate_document("123456789012"), Err(ValidationError::Document(12)));
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("(11) 3234-5678"), Ok(()));
        assert_eq!(validate_phone("(11) 3234-567"), Err(ValidationError::Phone(9)));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("2025-06-15T10:00:00"),
            Some(datetime!(2025 - 06 - 15 10:00:00))
        );
        assert_eq!(
            parse_timestamp("2025-06-15T10:00"),
            Some(datetime!(2025 - 06 - 15 10:00))
        );
        assert_eq!(
            parse_timestamp("2025-06-15T10:00:00.123456"),
            Some(datetime!(2025 - 06 - 15 10:00:00.123456))
        );
        assert_eq!(
            parse_timestamp("2025-06-15T23:30:00-03:00"),
            Some(datetime!(2025 - 06 - 15 23:30:00))
        );
        assert_eq!(
            parse_timestamp("2025-06-15T10:00:00Z"),
            Some(datetime!(2025 - 06 - 15 10:00:00))
        );
        assert_eq!(parse_timestamp("2025-06-15"), Some(datetime!(2025 - 06 - 15 0:00)));
        assert_eq!(parse_timestamp("15/06/2025"), None);
        assert_eq!(parse_timestamp("2025-13-01T10:00:00"), None);
        assert_eq!(parse_timestamp("2025-06-15Tlunch"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(Some("2025-06-15T09:05:00")),
            "15/06/2025 às 09:05"
        );
        assert_eq!(format_timestamp(Some("garbage")), "-");
        assert_eq!(format_timestamp(None), "-");
    }
}

// Wire helpers - lenient decoding of backend JSON
//
// The backend is not consistent about scalar encodings:
// - amounts arrive as numbers or as strings ("50.00")
// - dates arrive as "2024-01-15" or as full ISO timestamps
// - ids arrive as numbers or strings
//
// These helpers are used through `#[serde(deserialize_with = ...)]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Int(i64),
    Text(String),
}

/// Parse a date from either a plain date or an ISO timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    // Fall back to the leading YYYY-MM-DD of anything longer
    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) => {
            let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return Ok(0.0);
            }
            cleaned
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}")))
        }
    }
}

pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}"))),
    }
}

pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdValue::deserialize(deserializer)? {
        IdValue::Int(n) => n.to_string(),
        IdValue::Text(s) => s,
    })
}

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdValue>::deserialize(deserializer)? {
        None => None,
        Some(IdValue::Int(n)) => Some(n.to_string()),
        Some(IdValue::Text(s)) if s.is_empty() => None,
        Some(IdValue::Text(s)) => Some(s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("2024-01-15T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_date("2024-01-15T08:30:00"), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "amount")]
        amount: f64,
        #[serde(default, deserialize_with = "opt_id")]
        member_id: Option<String>,
    }

    #[test]
    fn test_amount_accepts_strings_and_numbers() {
        let p: Probe = serde_json::from_str(r#"{"amount": "1,250.50", "member_id": 42}"#).unwrap();
        assert_eq!(p.amount, 1250.50);
        assert_eq!(p.member_id.as_deref(), Some("42"));

        let p: Probe = serde_json::from_str(r#"{"amount": 75}"#).unwrap();
        assert_eq!(p.amount, 75.0);
        assert_eq!(p.member_id, None);
    }

    #[test]
    fn test_amount_rejects_garbage() {
        let result: Result<Probe, _> = serde_json::from_str(r#"{"amount": "abc"}"#);
        assert!(result.is_err());
    }
}

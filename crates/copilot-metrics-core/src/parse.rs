//! Strict parsing of raw usage payloads
//!
//! A payload is a JSON array of day records. Each day is decoded separately
//! with path tracking, so a failure names the day index and the field path
//! (e.g. `breakdown[2].active_users`). Any failure rejects the whole batch.

use crate::error::{MetricsError, Result};
use crate::types::RawDailyRecord;
use serde_json::Value;
use tracing::debug;

/// Parse a raw `copilot/usage` response body
///
/// # Examples
/// ```
/// use copilot_metrics_core::parse::parse_raw_days;
///
/// let days = parse_raw_days("[]").unwrap();
/// assert!(days.is_empty());
///
/// let err = parse_raw_days(r#"[{"day": "2024-06-24"}]"#).unwrap_err();
/// assert!(err.to_string().contains("day 0"));
/// ```
pub fn parse_raw_days(body: &str) -> Result<Vec<RawDailyRecord>> {
    let value: Value = serde_json::from_str(body)?;
    parse_raw_days_value(value)
}

/// Parse an already decoded JSON payload
pub fn parse_raw_days_value(value: Value) -> Result<Vec<RawDailyRecord>> {
    let Value::Array(items) = value else {
        return Err(MetricsError::MalformedInput {
            day: 0,
            field: "<payload>".to_string(),
            reason: "expected an array of daily records".to_string(),
        });
    };

    let days = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_day(index, item))
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} raw usage days", days.len());
    Ok(days)
}

fn parse_day(index: usize, item: Value) -> Result<RawDailyRecord> {
    serde_path_to_error::deserialize(item).map_err(|err| {
        let field = field_path(&err);
        MetricsError::MalformedInput {
            day: index,
            field,
            reason: err.into_inner().to_string(),
        }
    })
}

/// Dotted path of the offending field, relative to the day record
///
/// A missing field is reported at its parent, so the name carried by the
/// error is appended to the path.
fn field_path(err: &serde_path_to_error::Error<serde_json::Error>) -> String {
    let path = err.path().to_string();
    let parent = (path != ".").then_some(path);
    match (parent, missing_field(err.inner())) {
        (Some(parent), Some(name)) => format!("{parent}.{name}"),
        (None, Some(name)) => name,
        (Some(parent), None) => parent,
        (None, None) => "<record>".to_string(),
    }
}

fn missing_field(err: &serde_json::Error) -> Option<String> {
    let message = err.to_string();
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next().map(str::to_string)
}

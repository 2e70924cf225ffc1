//! Canonical deal records and the record normalizer
//!
//! Converts raw `{id, fields}` items from the upstream table API into
//! `DealRecord`s. Normalization degrades field by field: a bad date or a
//! non-numeric amount never rejects the record, it only withdraws that
//! record from the aggregates that need the field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One raw record as returned by the upstream table API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

/// Deal lifecycle stage
///
/// Only `Won` and `Lost` are terminal; every other label counts as
/// in-progress for conversion math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStage {
    Won,
    Lost,
    Other(String),
}

impl DealStage {
    fn from_field(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("Won") => DealStage::Won,
            Some("Lost") => DealStage::Lost,
            Some(other) => DealStage::Other(other.to_string()),
            None => DealStage::Other(String::new()),
        }
    }
}

/// Canonical normalized deal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    /// `None` when absent or not `YYYY-MM-DD`; the record then stays out of
    /// date-scoped aggregates but remains in the snapshot.
    pub close_date: Option<NaiveDate>,
    /// Used only by opportunity-volume queries.
    pub engage_date: Option<NaiveDate>,
    /// `Some(0.0)` when the field is absent; `None` when present but
    /// non-numeric (the record is skipped for monetary sums only).
    pub close_value: Option<f64>,
    pub deal_stage: DealStage,
    pub status: Option<String>,
    pub agent: Option<String>,
    pub manager: Option<String>,
    pub account: Option<String>,
    pub product: Option<String>,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub office_location: Option<String>,
}

impl DealRecord {
    /// Normalize one raw record
    pub fn from_raw(raw: &RawRecord) -> Self {
        let fields = &raw.fields;

        let close_value = coerce_amount(fields.get("close_value"));
        if close_value.is_none() {
            warn!("record {}: non-numeric close_value, excluded from sums", raw.id);
        }

        DealRecord {
            close_date: parse_date(fields.get("close_date")),
            engage_date: parse_date(fields.get("engage_date")),
            close_value,
            deal_stage: DealStage::from_field(fields.get("deal_stage")),
            status: fields.get("status").and_then(Value::as_str).map(str::to_string),
            agent: first_linked(fields.get("sales_agent")),
            manager: first_linked(fields.get("manager")),
            account: first_linked(fields.get("account")),
            product: first_linked(fields.get("product")),
            sector: first_linked(fields.get("sector")),
            region: first_linked(fields.get("region")),
            office_location: first_linked(fields.get("office_location")),
        }
    }
}

/// Parse a `YYYY-MM-DD` date field; anything else is "no date"
fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Collapse a linked-lookup field to a single scalar
///
/// Linked fields arrive either as a scalar or as an ordered list; the list
/// case reduces to its first element. The collapse is lossy by design.
fn first_linked(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Coerce a monetary amount
///
/// Absent or null counts as 0.0; a value that is present but not numeric is
/// a coercion failure (`None`).
fn coerce_amount(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(fields: Value) -> RawRecord {
        RawRecord {
            id: "rec001".to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn linked_field_collapses_to_first_element() {
        let record = DealRecord::from_raw(&raw(json!({
            "sales_agent": ["A", "B"],
            "product": "GTX Basic",
        })));

        assert_eq!(record.agent.as_deref(), Some("A"));
        assert_eq!(record.product.as_deref(), Some("GTX Basic"));
        assert_eq!(record.manager, None);
    }

    #[test]
    fn bad_or_missing_dates_yield_none() {
        let record = DealRecord::from_raw(&raw(json!({
            "close_date": "05/03/2024",
            "engage_date": "",
        })));

        assert_eq!(record.close_date, None);
        assert_eq!(record.engage_date, None);

        let record = DealRecord::from_raw(&raw(json!({ "close_date": "2024-03-05" })));
        assert_eq!(record.close_date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn close_value_coercion() {
        let absent = DealRecord::from_raw(&raw(json!({})));
        assert_eq!(absent.close_value, Some(0.0));

        let numeric = DealRecord::from_raw(&raw(json!({ "close_value": 1250.5 })));
        assert_eq!(numeric.close_value, Some(1250.5));

        let stringy = DealRecord::from_raw(&raw(json!({ "close_value": "99" })));
        assert_eq!(stringy.close_value, Some(99.0));

        let garbage = DealRecord::from_raw(&raw(json!({ "close_value": "n/a" })));
        assert_eq!(garbage.close_value, None);
    }

    #[test]
    fn stage_recognizes_only_won_and_lost() {
        let won = DealRecord::from_raw(&raw(json!({ "deal_stage": "Won" })));
        let lost = DealRecord::from_raw(&raw(json!({ "deal_stage": "Lost" })));
        let engaging = DealRecord::from_raw(&raw(json!({ "deal_stage": "Engaging" })));

        assert_eq!(won.deal_stage, DealStage::Won);
        assert_eq!(lost.deal_stage, DealStage::Lost);
        assert_eq!(engaging.deal_stage, DealStage::Other("Engaging".to_string()));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// A roster row. The id is always the canonical string form, leading zeros kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
}

impl ClientRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    // Maps one raw list item. Only non-object items are rejected.
    pub fn from_list_item(item: &Value) -> Option<Self> {
        let obj = item.as_object()?;
        let id = obj.get("id").map(canonical_id).unwrap_or_default();
        let name = obj
            .get("name")
            .and_then(non_empty_string)
            .or_else(|| obj.get("displayName").and_then(non_empty_string));
        Some(Self {
            id,
            name,
            age: obj.get("age").and_then(coerce_number),
            region: obj.get("region").and_then(non_empty_string),
            income: obj.get("income").and_then(coerce_number),
        })
    }
}

/// Trimmed record summary kept in the recently viewed list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
}

impl From<&ClientRecord> for HistoryEntry {
    fn from(record: &ClientRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            age: record.age,
            region: record.region.clone(),
            income: record.income,
        }
    }
}

impl From<&HistoryEntry> for ClientRecord {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            age: entry.age,
            region: entry.region.clone(),
            income: entry.income,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

impl PaginationState {
    pub fn initial(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            total_pages: 1,
            has_more: false,
        }
    }

    pub(crate) fn settle(&mut self, page: u32, total_pages: u32) {
        self.page = page;
        self.total_pages = total_pages.max(1);
        self.has_more = page < self.total_pages - 1;
    }
}

// Keys the detail pane renders in dedicated sections.
pub const APPROVAL_PROBABILITY: &str = "approvalProbability";
pub const DECISION: &str = "decision";
pub const PREDICTED_SALARY: &str = "predictedSalary";
pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const ADMIN_AREA: &str = "adminarea";
pub const INCOME_VALUE: &str = "incomeValue";
pub const INCOME_VALUE_CATEGORY: &str = "incomeValueCategory";

/// Schema-free prediction payload for one client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredictionResult {
    fields: Map<String, Value>,
}

impl PredictionResult {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn approval_probability(&self) -> Option<f64> {
        self.get(APPROVAL_PROBABILITY)
            .and_then(coerce_number)
            .map(|p| p.clamp(0.0, 1.0))
    }

    pub fn decision(&self) -> Option<String> {
        self.get(DECISION).and_then(scalar_text)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| is_truthy(v)).and_then(scalar_text)
    }
}

pub(crate) fn canonical_id(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(_) => scalar_text(value).unwrap_or_default(),
        other => other.to_string(),
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Numeric view of a JSON scalar: numbers, numeric strings and nothing else.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Renders a scalar the way a loosely typed client would print it: whole
/// floats drop their fraction, strings pass through.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Some(n.to_string());
            }
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Some(format!("{}", f as i64))
            } else {
                Some(f.to_string())
            }
        }
        _ => None,
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_item_coerces_numeric_id_to_string() {
        let record =
            ClientRecord::from_list_item(&json!({"id": 7, "age": 30, "region": "X", "income": 50000}))
                .unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.age, Some(30.0));
        assert_eq!(record.region.as_deref(), Some("X"));
        assert_eq!(record.income, Some(50000.0));
        assert_eq!(record.name, None);
    }

    #[test]
    fn list_item_keeps_leading_zeros_and_display_name() {
        let record =
            ClientRecord::from_list_item(&json!({"id": "0000007", "displayName": "Ivanov"})).unwrap();
        assert_eq!(record.id, "0000007");
        assert_eq!(record.name.as_deref(), Some("Ivanov"));
        assert_eq!(record.age, None);
    }

    #[test]
    fn list_item_keeps_fractional_age() {
        let record = ClientRecord::from_list_item(&json!({"id": 3, "age": 30.5})).unwrap();
        assert_eq!(record.age, Some(30.5));
        let record = ClientRecord::from_list_item(&json!({"id": 3, "age": "41"})).unwrap();
        assert_eq!(record.age, Some(41.0));
    }

    #[test]
    fn list_item_rejects_scalars() {
        assert!(ClientRecord::from_list_item(&json!(5)).is_none());
    }

    #[test]
    fn whole_float_renders_without_fraction() {
        assert_eq!(scalar_text(&json!(7.0)).as_deref(), Some("7"));
        assert_eq!(scalar_text(&json!(0.25)).as_deref(), Some("0.25"));
    }

    #[test]
    fn settle_keeps_has_more_invariant() {
        let mut state = PaginationState::initial(20);
        state.settle(0, 5);
        assert!(state.has_more);
        state.settle(4, 5);
        assert!(!state.has_more);
        state.settle(2, 0);
        assert_eq!(state.total_pages, 1);
        assert!(!state.has_more);
    }
}

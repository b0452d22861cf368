pub mod locale;
pub mod profile;

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::model::{self, PredictionResult};

pub use locale::{Locale, LIST_PLACEHOLDER, PLACEHOLDER};
pub use profile::{ProfileSummary, ScoreBand, ScoreSummary};

/// Keys rendered in dedicated sections, never in the generic field grid.
pub const DEDICATED_KEYS: &[&str] = &[
    "id",
    model::APPROVAL_PROBABILITY,
    model::DECISION,
    model::PREDICTED_SALARY,
    model::AGE,
    model::GENDER,
    model::ADMIN_AREA,
    model::INCOME_VALUE,
    model::INCOME_VALUE_CATEGORY,
    "city_smart_name",
];

const MONEY_KEY_PARTS: &[&str] = &[
    "avg", "sum", "limit", "amt", "turn", "salary", "income", "outstand",
];

fn money_key_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("(?i){}", MONEY_KEY_PARTS.join("|"))).ok())
        .as_ref()
}

pub fn is_money_key(key: &str) -> bool {
    money_key_re().map_or(false, |re| re.is_match(key))
}

struct FormatRule {
    name: &'static str,
    applies: fn(&str, &Value) -> bool,
    render: fn(Locale, &Value) -> String,
}

// Evaluated top to bottom; the first rule that applies wins.
const RULES: &[FormatRule] = &[
    FormatRule {
        name: "missing",
        applies: |_, v| v.is_null(),
        render: |_, _| PLACEHOLDER.to_string(),
    },
    FormatRule {
        name: "flag",
        applies: |_, v| v.is_boolean(),
        render: |locale, v| locale.yes_no(v.as_bool().unwrap_or(false)).to_string(),
    },
    FormatRule {
        name: "blank_money",
        applies: |key, v| is_money_key(key) && v.as_str().map_or(false, |s| s.trim().is_empty()),
        render: |_, _| PLACEHOLDER.to_string(),
    },
    FormatRule {
        name: "money",
        applies: |key, v| is_money_key(key) && model::coerce_number(v).is_some(),
        render: |locale, v| locale.money(model::coerce_number(v).unwrap_or(0.0)),
    },
    FormatRule {
        name: "scalar",
        applies: |_, v| v.is_number() || v.is_string(),
        render: |_, v| model::scalar_text(v).unwrap_or_default(),
    },
];

fn render_fallback(value: &Value) -> String {
    value.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayField {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Default)]
pub struct FieldFormatter {
    locale: Locale,
    labels: HashMap<String, String>,
}

impl FieldFormatter {
    pub fn new(locale: Locale, labels: HashMap<String, String>) -> Self {
        Self { locale, labels }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn format(&self, key: &str, value: &Value) -> String {
        match RULES.iter().find(|rule| (rule.applies)(key, value)) {
            Some(rule) => {
                trace!(key, rule = rule.name, "formatting field");
                (rule.render)(self.locale, value)
            }
            None => render_fallback(value),
        }
    }

    #[cfg(test)]
    fn rule_name(key: &str, value: &Value) -> &'static str {
        RULES
            .iter()
            .find(|rule| (rule.applies)(key, value))
            .map(|rule| rule.name)
            .unwrap_or("fallback")
    }

    /// Currency for anything truthy or zero, the placeholder otherwise.
    pub fn money(&self, value: Option<&Value>) -> String {
        match value.and_then(model::coerce_number) {
            Some(n) => self.locale.money(n),
            None => PLACEHOLDER.to_string(),
        }
    }

    /// Free-form fields of a prediction, dedicated keys and nested values
    /// removed, in payload order.
    pub fn display_fields(&self, prediction: &PredictionResult) -> Vec<DisplayField> {
        prediction
            .fields()
            .iter()
            .filter(|(key, _)| !DEDICATED_KEYS.contains(&key.as_str()))
            .filter(|(_, value)| !value.is_object() && !value.is_array())
            .map(|(key, value)| DisplayField {
                key: key.clone(),
                label: self.label(key).to_string(),
                value: self.format(key, value),
            })
            .collect()
    }

    /// Signed factor value with four decimals, `+` for positive values.
    pub fn factor_value(&self, value: f64) -> String {
        if value > 0.0 {
            format!("+{value:.4}")
        } else {
            format!("{value:.4}")
        }
    }
}

use serde_json::Value;

use super::{FieldFormatter, PLACEHOLDER};
use crate::model::{self, ClientRecord, PredictionResult};

/// Profile and finance sections of the detail pane. Prediction values win
/// over the list record; the record fills in while the prediction loads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileSummary {
    pub id: String,
    pub initial: char,
    pub age: String,
    pub gender: String,
    pub region: String,
    pub income: String,
    pub income_category: String,
    pub predicted_salary: Option<String>,
}

impl ProfileSummary {
    pub fn build(
        record: &ClientRecord,
        prediction: Option<&PredictionResult>,
        formatter: &FieldFormatter,
    ) -> Self {
        let text = |key: &str| prediction.and_then(|p| p.text(key));
        let truthy = |key: &str| {
            prediction
                .and_then(|p| p.get(key))
                .filter(|v| model::is_truthy(v))
                .cloned()
        };

        let age = text(model::AGE)
            .or_else(|| record.age.filter(|a| *a > 0.0).map(|a| a.to_string()))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let region = text(model::ADMIN_AREA)
            .or_else(|| record.region.clone())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let income_value = truthy(model::INCOME_VALUE).or_else(|| record.income.map(Value::from));
        let predicted_salary = truthy(model::PREDICTED_SALARY).map(|v| formatter.money(Some(&v)));

        Self {
            id: record.id.clone(),
            initial: record
                .name
                .as_deref()
                .and_then(|n| n.chars().next())
                .unwrap_or('C'),
            age,
            gender: text(model::GENDER).unwrap_or_else(|| PLACEHOLDER.to_string()),
            region,
            income: formatter.money(income_value.as_ref()),
            income_category: text(model::INCOME_VALUE_CATEGORY)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            predicted_salary,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBand {
    Approve,
    Borderline,
    Decline,
}

impl ScoreBand {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.7 {
            Self::Approve
        } else if probability >= 0.6 {
            Self::Borderline
        } else {
            Self::Decline
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreSummary {
    pub probability: f64,
    pub percent: u8,
    pub band: ScoreBand,
    pub decision: String,
}

impl ScoreSummary {
    pub fn from_prediction(prediction: &PredictionResult) -> Self {
        let probability = prediction.approval_probability().unwrap_or(0.0);
        Self {
            probability,
            percent: (probability * 100.0).round() as u8,
            band: ScoreBand::from_probability(probability),
            decision: prediction
                .decision()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::format::Locale;
    use serde_json::json;

    fn record() -> ClientRecord {
        ClientRecord {
            name: Some("Olga".to_string()),
            age: Some(41.0),
            region: Some("Tatarstan".to_string()),
            income: Some(80000.0),
            ..ClientRecord::new("0000007")
        }
    }

    #[test]
    fn record_fills_in_while_loading() {
        let f = FieldFormatter::new(Locale::Ru, HashMap::new());
        let profile = ProfileSummary::build(&record(), None, &f);
        assert_eq!(profile.initial, 'O');
        assert_eq!(profile.age, "41");
        assert_eq!(profile.gender, PLACEHOLDER);
        assert_eq!(profile.region, "Tatarstan");
        assert_eq!(profile.income, "80\u{a0}000\u{a0}₽");
        assert_eq!(profile.predicted_salary, None);
    }

    #[test]
    fn prediction_values_take_precedence() {
        let f = FieldFormatter::new(Locale::Ru, HashMap::new());
        let prediction = PredictionResult::from_value(json!({
            "age": 42,
            "gender": "F",
            "adminarea": "Moscow",
            "incomeValue": 0,
            "incomeValueCategory": "mid",
            "predictedSalary": 95000.4
        }))
        .unwrap();
        let profile = ProfileSummary::build(&record(), Some(&prediction), &f);
        assert_eq!(profile.age, "42");
        assert_eq!(profile.gender, "F");
        assert_eq!(profile.region, "Moscow");
        // zero income value is falsy, so the record's income shows
        assert_eq!(profile.income, "80\u{a0}000\u{a0}₽");
        assert_eq!(profile.income_category, "mid");
        assert_eq!(profile.predicted_salary.as_deref(), Some("95\u{a0}000\u{a0}₽"));
    }

    #[test]
    fn score_bands_follow_thresholds() {
        let summary = |p: f64| {
            ScoreSummary::from_prediction(
                &PredictionResult::from_value(json!({"approvalProbability": p, "decision": "APPROVE"}))
                    .unwrap(),
            )
        };
        assert_eq!(summary(0.7).band, ScoreBand::Approve);
        assert_eq!(summary(0.65).band, ScoreBand::Borderline);
        assert_eq!(summary(0.2).band, ScoreBand::Decline);
        assert_eq!(summary(0.456).percent, 46);
        assert_eq!(summary(0.456).decision, "APPROVE");
    }

    #[test]
    fn missing_probability_reads_as_zero() {
        let summary = ScoreSummary::from_prediction(&PredictionResult::default());
        assert_eq!(summary.percent, 0);
        assert_eq!(summary.band, ScoreBand::Decline);
        assert_eq!(summary.decision, PLACEHOLDER);
    }
}

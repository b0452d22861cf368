use serde::{Deserialize, Serialize};

pub const PLACEHOLDER: &str = "—";
pub const LIST_PLACEHOLDER: &str = "-";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ru" | "ru-ru" => Some(Self::Ru),
            "en" | "en-us" | "en-gb" => Some(Self::En),
            _ => None,
        }
    }

    pub fn yes_no(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::Ru, true) => "Да",
            (Self::Ru, false) => "Нет",
            (Self::En, true) => "Yes",
            (Self::En, false) => "No",
        }
    }

    fn group_separator(self) -> char {
        match self {
            Self::Ru => '\u{a0}',
            Self::En => ',',
        }
    }

    fn decimal_separator(self) -> char {
        match self {
            Self::Ru => ',',
            Self::En => '.',
        }
    }

    /// Locale grouping with up to three fraction digits, no currency.
    pub fn number(self, value: f64) -> String {
        let rounded = (value * 1000.0).round() / 1000.0;
        let negative = rounded < 0.0;
        let abs = rounded.abs();
        let whole = abs.trunc();
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&group(whole, self.group_separator()));
        let frac = format!("{:.3}", abs - whole);
        let frac = frac.trim_start_matches('0').trim_start_matches('.');
        let frac = frac.trim_end_matches('0');
        if !frac.is_empty() {
            out.push(self.decimal_separator());
            out.push_str(frac);
        }
        out
    }

    /// Whole-rouble currency amount.
    pub fn money(self, value: f64) -> String {
        let rounded = value.round();
        let sign = if rounded < 0.0 { "-" } else { "" };
        let digits = group(rounded.abs(), self.group_separator());
        match self {
            Self::Ru => format!("{sign}{digits}\u{a0}₽"),
            Self::En => format!("{sign}₽{digits}"),
        }
    }
}

fn group(whole: f64, separator: char) -> String {
    let digits = format!("{whole:.0}");
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

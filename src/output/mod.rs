use colored::Colorize;

use crate::coordinator::{DetailBody, DetailView};
use crate::format::{FieldFormatter, Locale, ScoreBand, LIST_PLACEHOLDER};
use crate::model::{ClientRecord, HistoryEntry, PaginationState};
use crate::shap::{FactorBar, FactorSign};

const BAR_WIDTH: usize = 24;

fn cell<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| LIST_PLACEHOLDER.to_string())
}

fn format_kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(":: {:<18}: {}\n", label, value));
}

pub fn render_list(records: &[&ClientRecord], locale: Locale) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "{:>3}  {:<22} {:>4}  {:<20} {:>12}  {}",
            "#", "name", "age", "region", "income", "id"
        )
        .bold()
    ));
    if records.is_empty() {
        out.push_str(&format!("{}\n", "   no clients to show".dimmed()));
        return out;
    }
    for (i, r) in records.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<22} {:>4}  {:<20} {:>12}  {}\n",
            i + 1,
            cell(r.name.as_deref()),
            cell(r.age),
            cell(r.region.as_deref()),
            cell(r.income.map(|n| locale.number(n))),
            r.id.cyan()
        ));
    }
    out
}

pub fn render_pager(state: PaginationState, loading: bool) -> String {
    let mut line = format!("page {} / {}", state.page + 1, state.total_pages);
    if state.page > 0 {
        line = format!("[p] < {line}");
    }
    if state.has_more {
        line = format!("{line} > [n]");
    }
    if loading {
        line.push_str("  (loading)");
    }
    line
}

pub fn render_status(status: Option<&str>) -> Option<String> {
    status.map(|s| format!("{} {}", "!".yellow().bold(), s.yellow()))
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("{}", "history is empty".dimmed());
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| match e.name.as_deref() {
            Some(name) => format!("[h{}] {} ({})", i + 1, name, e.id),
            None => format!("[h{}] {}", i + 1, e.id),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn factor_line(bar: &FactorBar, formatter: &FieldFormatter) -> String {
    let filled = ((bar.width_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let blocks = "█".repeat(filled.min(BAR_WIDTH));
    let pad = " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH));
    let blocks = match bar.sign {
        FactorSign::Positive => blocks.green(),
        FactorSign::Negative => blocks.red(),
    };
    format!(
        "  {:<28} {}{} {}\n",
        formatter.label(&bar.feature_key),
        blocks,
        pad,
        formatter.factor_value(bar.value)
    )
}

pub fn render_detail(view: &DetailView, formatter: &FieldFormatter) -> String {
    let profile = &view.profile;
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        format!("({})", profile.initial).bold(),
        format!("client {}", profile.id).bold()
    ));
    format_kv_line(&mut out, "age", &profile.age);
    format_kv_line(&mut out, "gender", &profile.gender);
    format_kv_line(&mut out, "region", &profile.region);
    format_kv_line(&mut out, "income", &profile.income);
    format_kv_line(&mut out, "income category", &profile.income_category);
    if let Some(salary) = profile.predicted_salary.as_deref() {
        format_kv_line(&mut out, "predicted salary", salary);
    }
    out.push('\n');

    match &view.body {
        DetailBody::Loading => {
            out.push_str(&format!("{}\n", "loading prediction...".dimmed()));
        }
        DetailBody::Failed { message } => {
            out.push_str(&format!("{} {}\n", "prediction failed:".red().bold(), message));
        }
        DetailBody::Ready {
            score,
            factors,
            fields,
        } => {
            let band = match score.band {
                ScoreBand::Approve => "Approve".green().bold(),
                ScoreBand::Borderline => "Borderline".yellow().bold(),
                ScoreBand::Decline => "Decline".red().bold(),
            };
            out.push_str(&format!(
                "score {}%  {}  decision: {}\n",
                score.percent, band, score.decision
            ));
            if !factors.is_empty() {
                out.push_str(&format!("\n{}\n", "top factors".bold()));
                for bar in factors {
                    out.push_str(&factor_line(bar, formatter));
                }
            }
            if !fields.is_empty() {
                out.push_str(&format!("\n{}\n", "details".bold()));
                for field in fields {
                    format_kv_line(&mut out, &field.label, &field.value);
                }
            }
        }
    }
    out
}

pub fn render_help() -> String {
    [
        "commands:",
        "  /text, search text   filter the loaded page (empty clears)",
        "  n, p                 next / previous page",
        "  <row>, open <id>     show a client",
        "  b                    back to the list",
        "  h, h<N>              toggle history / open N-th recent client",
        "  clear                clear history",
        "  r                    reload the current page",
        "  q                    quit",
    ]
    .join("\n")
}

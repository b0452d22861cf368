use crate::model::ClientRecord;

// Filters the loaded page only; there is no cross-page search.
pub fn filter<'a>(records: &'a [ClientRecord], query: &str) -> Vec<&'a ClientRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.iter().collect();
    }
    let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
    records
        .iter()
        .filter(|record| matches(record, &query, &digits))
        .collect()
}

fn matches(record: &ClientRecord, query: &str, digits: &str) -> bool {
    if let Some(name) = record.name.as_deref() {
        if name.to_lowercase().contains(query) {
            return true;
        }
    }
    let id = record.id.to_lowercase();
    if id.contains(query) {
        return true;
    }
    if digits.is_empty() {
        return false;
    }
    let id_stripped = id.trim_start_matches('0');
    let digits_stripped = digits.trim_start_matches('0');
    id.contains(digits)
        || id_stripped.contains(digits)
        || (!digits_stripped.is_empty() && id_stripped.contains(digits_stripped))
}

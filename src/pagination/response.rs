use serde_json::Value;
use thiserror::Error;

use crate::model::{self, ClientRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct ListPage {
    pub records: Vec<ClientRecord>,
    pub total_pages: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected an array or an object with content/clients, got {0}")]
    UnexpectedBody(&'static str),

    #[error("item {index} is not an object")]
    UnexpectedItem { index: usize },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without a content/clients array",
    }
}

fn items_of(body: &Value) -> Result<&[Value], ShapeError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => ["content", "clients"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(|items| items.as_slice())
            .ok_or_else(|| ShapeError::UnexpectedBody(kind_of(body))),
        other => Err(ShapeError::UnexpectedBody(kind_of(other))),
    }
}

// Server total wins; otherwise infer from how full the page came back.
fn total_pages_of(body: &Value, page: u32, page_size: u32, returned: usize) -> u32 {
    let obj = body.as_object();
    let server_pages = obj
        .and_then(|o| o.get("totalPages"))
        .and_then(model::coerce_number)
        .filter(|n| *n >= 0.0);
    if let Some(pages) = server_pages {
        return (pages.ceil() as u32).max(1);
    }

    let server_total = obj.and_then(|o| {
        ["totalElements", "total", "count"]
            .iter()
            .find_map(|key| o.get(*key).and_then(model::coerce_number))
    });
    if let Some(total) = server_total.filter(|n| *n >= 0.0) {
        let size = f64::from(page_size.max(1));
        return ((total / size).ceil() as u32).max(1);
    }

    if returned > 0 && returned >= page_size as usize {
        page.saturating_add(2)
    } else {
        page.saturating_add(1)
    }
}

pub fn normalize_list_response(
    body: &Value,
    page: u32,
    page_size: u32,
) -> Result<ListPage, ShapeError> {
    let items = items_of(body)?;
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let record =
            ClientRecord::from_list_item(item).ok_or(ShapeError::UnexpectedItem { index })?;
        records.push(record);
    }
    let total_pages = total_pages_of(body, page, page_size, records.len());
    Ok(ListPage {
        records,
        total_pages,
    })
}

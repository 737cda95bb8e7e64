//! Validation of the AI's reply to a receipt scan.

use serde_json::{Map, Value};
use time::{Date, macros::format_description};

use crate::{
    category::Category,
    database_id::CategoryId,
    receipt::{ScanError, ScannedItem, StagedReceipt},
    transaction::MAX_YEN,
};

/// Extract the receipt from the AI's reply.
///
/// The reply may wrap the JSON object in prose or a code fence, everything from the first `{` to
/// the last `}` is taken as the object. Items with a category the user does not have are put in
/// the first of `categories`.
///
/// # Errors
///
/// Returns [ScanError::MalformedResponse] if the reply has no JSON object or the object does not
/// have the expected fields.
pub fn parse_reply(text: &str, categories: &[Category]) -> Result<StagedReceipt, ScanError> {
    let json = extract_object(text).ok_or_else(|| malformed("reply contains no JSON object"))?;
    let value: Value =
        serde_json::from_str(json).map_err(|error| malformed(&format!("invalid JSON: {error}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("reply is not a JSON object"))?;

    let store = object
        .get("store")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("\"store\" must be a string"))?
        .trim()
        .to_owned();

    let date = object
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("\"date\" must be a string"))?;
    let date = Date::parse(date.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|error| malformed(&format!("invalid date {date:?}: {error}")))?;

    let items = object
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("\"items\" must be an array"))?;
    if items.is_empty() {
        return Err(malformed("\"items\" is empty"));
    }

    let items = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item, categories))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StagedReceipt { store, date, items })
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    (start < end).then(|| &text[start..=end])
}

fn parse_item(
    index: usize,
    item: &Value,
    categories: &[Category],
) -> Result<ScannedItem, ScanError> {
    let item: &Map<String, Value> = item
        .as_object()
        .ok_or_else(|| malformed(&format!("item {index} is not an object")))?;

    let name = item
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed(&format!("item {index} has no name")))?
        .to_owned();

    let price = item
        .get("price")
        .and_then(whole_number)
        .filter(|price| (0..=MAX_YEN).contains(price))
        .ok_or_else(|| {
            malformed(&format!(
                "item {index} price must be a whole number from 0 to {MAX_YEN}"
            ))
        })?;

    let category_id = item
        .get("category")
        .and_then(whole_number)
        .ok_or_else(|| malformed(&format!("item {index} category must be an integer")))?;
    let category_id = resolve_category(category_id, categories)
        .ok_or_else(|| malformed("there are no categories to assign items to"))?;

    Ok(ScannedItem {
        name,
        price,
        category_id,
    })
}

/// Integers, and floats with no fractional part such as `100.0`.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }

    value
        .as_f64()
        .filter(|number| number.fract() == 0.0 && number.abs() < i64::MAX as f64)
        .map(|number| number as i64)
}

fn resolve_category(category_id: CategoryId, categories: &[Category]) -> Option<CategoryId> {
    if categories.iter().any(|category| category.id == category_id) {
        return Some(category_id);
    }

    let fallback = categories.first()?.id;
    tracing::debug!("Unknown category {category_id} in scan reply, using {fallback}");

    Some(fallback)
}

fn malformed(reason: &str) -> ScanError {
    ScanError::MalformedResponse(reason.to_owned())
}

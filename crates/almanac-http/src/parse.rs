use almanac_core::error::{
  CalendarError,
  CalendarResult
};
use almanac_shared::{
  ItemDetail,
  ItemsByDate
};
use serde_json::Value;

fn parse_document(
  body: &str,
  what: &str
) -> CalendarResult<Value> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(
      CalendarError::EmptyOrMalformedResponse(
        format!("{what}: empty body")
      )
    );
  }
  serde_json::from_str(trimmed).map_err(
    |error| {
      CalendarError::EmptyOrMalformedResponse(
        format!("{what}: {error}")
      )
    }
  )
}

/// Decodes the bulk read. The server
/// encodes an empty map as `[]`.
pub fn parse_items(
  body: &str
) -> CalendarResult<ItemsByDate> {
  match parse_document(
    body,
    "calendar data"
  )? {
    | Value::Array(entries)
      if entries.is_empty() =>
    {
      Ok(ItemsByDate::new())
    }
    | value @ Value::Object(_) => {
      serde_json::from_value(value).map_err(
        |error| {
          CalendarError::EmptyOrMalformedResponse(
            format!(
              "calendar data: {error}"
            )
          )
        }
      )
    }
    | other => {
      Err(
        CalendarError::EmptyOrMalformedResponse(
          format!(
            "calendar data: expected an \
             object keyed by date, got \
             {}",
            kind(&other)
          )
        )
      )
    }
  }
}

pub fn parse_detail(
  body: &str
) -> CalendarResult<ItemDetail> {
  match parse_document(body, "item data")? {
    | value @ Value::Object(_) => {
      serde_json::from_value(value).map_err(
        |error| {
          CalendarError::EmptyOrMalformedResponse(
            format!("item data: {error}")
          )
        }
      )
    }
    | other => {
      Err(
        CalendarError::EmptyOrMalformedResponse(
          format!(
            "item data: expected an \
             object, got {}",
            kind(&other)
          )
        )
      )
    }
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    | Value::Null => "null",
    | Value::Bool(_) => "a boolean",
    | Value::Number(_) => "a number",
    | Value::String(_) => "a string",
    | Value::Array(_) => "an array",
    | Value::Object(_) => "an object"
  }
}

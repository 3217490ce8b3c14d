use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};
use serde_json::Value;

/// Server-side identifier of a
/// schedulable item.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for ItemId {
  type Err = std::num::ParseIntError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    s.trim().parse::<u64>().map(ItemId)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct CalendarItem {
  pub id:       ItemId,
  #[serde(default)]
  pub title:    String,
  #[serde(default)]
  pub status:   String,
  #[serde(default)]
  pub datetime: String,
  /// Display-only fields (icon, color,
  /// post type label, ...) passed through
  /// untouched.
  #[serde(flatten)]
  pub extra:    BTreeMap<String, Value>
}

impl CalendarItem {
  pub fn new(
    id: u64,
    title: &str,
    status: &str,
    datetime: &str
  ) -> Self {
    Self {
      id:       ItemId(id),
      title:    title.to_string(),
      status:   status.to_string(),
      datetime: datetime.to_string(),
      extra:    BTreeMap::new()
    }
  }
}

/// Bulk read payload keyed by canonical
/// `YYYY-MM-DD` date strings.
pub type ItemsByDate =
  BTreeMap<String, Vec<CalendarItem>>;

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
pub struct ItemDetail {
  #[serde(default)]
  pub id:     Option<ItemId>,
  #[serde(default)]
  pub title:  String,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub fields: BTreeMap<String, Value>,
  #[serde(default)]
  pub links:  BTreeMap<String, Value>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct QueryFilter {
  pub param: String,
  pub value: String
}

/// Parameters of one bulk calendar read.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct CalendarQuery {
  pub start_date:      String,
  pub number_of_weeks: u32,
  #[serde(default)]
  pub filters:         Vec<QueryFilter>
}

impl CalendarQuery {
  pub fn pairs(
    &self
  ) -> Vec<(String, String)> {
    let mut pairs = vec![
      (
        "start_date".to_string(),
        self.start_date.clone()
      ),
      (
        "number_of_weeks".to_string(),
        self.number_of_weeks.to_string()
      ),
    ];
    pairs.extend(
      self.filters.iter().map(|filter| {
        (
          filter.param.clone(),
          filter.value.clone()
        )
      })
    );
    pairs
  }

  pub fn filter_value(
    &self,
    param: &str
  ) -> Option<&str> {
    self
      .filters
      .iter()
      .find(|filter| filter.param == param)
      .map(|filter| filter.value.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct MoveItemArgs {
  pub id:    ItemId,
  pub year:  i32,
  pub month: u32,
  pub day:   u32
}

impl MoveItemArgs {
  pub fn pairs(
    &self
  ) -> Vec<(String, String)> {
    vec![
      ("id".to_string(), self.id.to_string()),
      (
        "year".to_string(),
        self.year.to_string()
      ),
      (
        "month".to_string(),
        self.month.to_string()
      ),
      ("day".to_string(), self.day.to_string()),
    ]
  }
}

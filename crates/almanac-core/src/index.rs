use almanac_shared::{
  CalendarItem,
  ItemDetail,
  ItemId,
  ItemsByDate
};
use chrono::NaiveDate;

use crate::datetime::format_for_query;

/// Items bucketed by canonical date key,
/// always the complete result of the last
/// accepted bulk fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemIndex {
  by_date: ItemsByDate
}

impl ItemIndex {
  pub fn new(by_date: ItemsByDate) -> Self {
    Self { by_date }
  }

  /// Atomic full replacement.
  pub fn replace(
    &mut self,
    by_date: ItemsByDate
  ) {
    self.by_date = by_date;
  }

  /// Missing keys read as an empty
  /// sequence.
  pub fn items_on(
    &self,
    date_key: &str
  ) -> &[CalendarItem] {
    self
      .by_date
      .get(date_key)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn items_on_date(
    &self,
    date: NaiveDate
  ) -> &[CalendarItem] {
    self.items_on(&format_for_query(date))
  }

  pub fn get(
    &self,
    date_key: &str,
    index: usize
  ) -> Option<&CalendarItem> {
    self.items_on(date_key).get(index)
  }

  pub fn find(
    &self,
    id: ItemId
  ) -> Option<(&str, &CalendarItem)> {
    self.by_date.iter().find_map(
      |(key, items)| {
        items
          .iter()
          .find(|item| item.id == id)
          .map(|item| (key.as_str(), item))
      }
    )
  }

  pub fn len(&self) -> usize {
    self.by_date.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The only partial update: refreshes
  /// the summary fields of an item after
  /// its detail was fetched.
  pub fn refresh_item(
    &mut self,
    id: ItemId,
    detail: &ItemDetail
  ) -> bool {
    let Some(item) = self
      .by_date
      .values_mut()
      .flat_map(|items| items.iter_mut())
      .find(|item| item.id == id)
    else {
      return false;
    };

    if !detail.title.is_empty() {
      item.title = detail.title.clone();
    }
    if let Some(status) =
      detail.status.as_ref()
    {
      item.status = status.clone();
    }
    true
  }
}

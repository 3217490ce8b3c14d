use almanac_shared::{
  ItemId,
  MoveItemArgs
};
use chrono::{
  Datelike,
  NaiveDate
};

use crate::error::CalendarError;
use crate::index::ItemIndex;

/// A completed drop reported by the
/// drag library: where the item came from
/// and which cell it landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
  pub source_date_key: String,
  pub source_index:    usize,
  pub year:            i32,
  pub month:           u32,
  pub day:             u32
}

impl DropEvent {
  pub fn new(
    source_date_key: &str,
    source_index: usize,
    destination: NaiveDate
  ) -> Self {
    Self {
      source_date_key: source_date_key
        .to_string(),
      source_index,
      year: destination.year(),
      month: destination.month(),
      day: destination.day()
    }
  }

  pub fn destination(
    &self
  ) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
      self.year, self.month, self.day
    )
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DragDecision {
  Allow,
  Deny
}

impl DragDecision {
  pub fn is_allowed(self) -> bool {
    matches!(self, Self::Allow)
  }
}

/// Transient cell highlighting driven by
/// the drag library.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct DragMarkers {
  pub dragging: Option<ItemId>,
  pub hover:    Option<NaiveDate>,
  pub loading:  Option<NaiveDate>
}

impl DragMarkers {
  pub fn hover(&mut self, date: NaiveDate) {
    self.hover = Some(date);
  }

  /// Clears hover and drop-target
  /// markers; run at every fetch cycle.
  pub fn reset_cells(&mut self) {
    self.hover = None;
    self.loading = None;
  }
}

/// Resolves the dragged item into a move
/// request. A missing item means the index
/// changed under the drag.
pub fn resolve_move(
  index: &ItemIndex,
  drop: &DropEvent
) -> Result<MoveItemArgs, CalendarError> {
  let item = index
    .get(
      &drop.source_date_key,
      drop.source_index
    )
    .ok_or_else(|| {
      CalendarError::StaleReference {
        date_key: drop
          .source_date_key
          .clone(),
        index:    drop.source_index
      }
    })?;

  Ok(MoveItemArgs {
    id:    item.id,
    year:  drop.year,
    month: drop.month,
    day:   drop.day
  })
}

use almanac_shared::{
  CalendarQuery,
  QueryFilter
};
use tracing::debug;

use crate::datetime::{
  DateWindow,
  begin_of_week,
  format_for_query
};
use crate::filter::{
  FilterName,
  FilterOverride,
  FilterSet
};

pub const LOADING_MESSAGE: &str =
  "Loading...";
pub const MOVING_MESSAGE: &str =
  "Moving the item...";

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct LoadingState {
  pub is_loading: bool,
  pub message:    Option<String>
}

impl LoadingState {
  pub fn start(message: &str) -> Self {
    Self {
      is_loading: true,
      message:    Some(message.to_string())
    }
  }

  pub fn idle() -> Self {
    Self::default()
  }
}

/// Builds the bulk read parameters. The
/// override always wins for its field,
/// even when `filters` has not caught up
/// with the change yet.
pub fn build_query(
  window: &DateWindow,
  filters: &FilterSet,
  pending: Option<&FilterOverride>
) -> CalendarQuery {
  let start = begin_of_week(
    window.start(),
    window.week_start()
  );
  let number_of_weeks = pending
    .and_then(FilterOverride::weeks)
    .or(filters.weeks())
    .unwrap_or(window.weeks());

  let query_filters = FilterName::ALL
    .iter()
    .filter_map(|name| {
      filters.resolve(*name, pending).map(
        |value| QueryFilter {
          param: name
            .query_param()
            .to_string(),
          value
        }
      )
    })
    .collect();

  CalendarQuery {
    start_date: format_for_query(start),
    number_of_weeks,
    filters: query_filters
  }
}

/// Everything a bulk fetch depends on.
/// A new fetch is issued whenever this
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchKey {
  pub window:  DateWindow,
  pub filters: FilterSet,
  pub refresh: u64
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct FetchTicket {
  pub generation: u64
}

/// Hands out fetch generations and
/// decides which response is
/// authoritative: only the latest issued.
#[derive(Debug, Default)]
pub struct FetchTracker {
  latest:    u64,
  in_flight: bool,
  last_key:  Option<FetchKey>
}

impl FetchTracker {
  /// Marks `key` as already loaded, for
  /// preloaded items.
  pub fn seed(&mut self, key: FetchKey) {
    self.last_key = Some(key);
  }

  pub fn needs_fetch(
    &self,
    key: &FetchKey
  ) -> bool {
    self.last_key.as_ref() != Some(key)
  }

  pub fn issue(
    &mut self,
    key: FetchKey
  ) -> FetchTicket {
    self.latest += 1;
    self.in_flight = true;
    self.last_key = Some(key);
    debug!(
      generation = self.latest,
      "bulk fetch issued"
    );
    FetchTicket {
      generation: self.latest
    }
  }

  pub fn is_current(
    &self,
    ticket: FetchTicket
  ) -> bool {
    ticket.generation == self.latest
  }

  /// Settles `ticket`. Returns false for
  /// superseded responses.
  pub fn complete(
    &mut self,
    ticket: FetchTicket
  ) -> bool {
    if !self.is_current(ticket) {
      debug!(
        generation = ticket.generation,
        latest = self.latest,
        "discarding superseded bulk fetch"
      );
      return false;
    }
    self.in_flight = false;
    true
  }

  pub fn in_flight(&self) -> bool {
    self.in_flight
  }

  pub fn latest_generation(&self) -> u64 {
    self.latest
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::datetime::WeekStart;

  fn window(weeks: u32) -> DateWindow {
    DateWindow::new(
      NaiveDate::from_ymd_opt(2024, 1, 3)
        .expect("valid date"),
      weeks,
      WeekStart::Monday
    )
  }

  #[test]
  fn query_uses_week_start_and_window() {
    let query = build_query(
      &window(2),
      &FilterSet::default(),
      None
    );

    assert_eq!(query.start_date, "2024-01-01");
    assert_eq!(query.number_of_weeks, 2);
    assert!(query.filters.is_empty());
  }

  #[test]
  fn status_override_reaches_query_before_commit()
  {
    let committed = FilterSet::default();
    let pending = FilterOverride {
      name:  FilterName::Status,
      value: Some("draft".to_string())
    };

    let query = build_query(
      &window(2),
      &committed,
      Some(&pending)
    );
    assert_eq!(
      query.filter_value("post_status"),
      Some("draft")
    );
  }

  #[test]
  fn weeks_precedence_is_override_then_filter_then_window()
  {
    let mut filters = FilterSet::default();
    filters.apply_change(
      FilterName::Weeks,
      Some("3"),
      5
    );

    let from_filter =
      build_query(&window(2), &filters, None);
    assert_eq!(from_filter.number_of_weeks, 3);

    let pending = FilterOverride {
      name:  FilterName::Weeks,
      value: Some("6".to_string())
    };
    let from_override = build_query(
      &window(2),
      &filters,
      Some(&pending)
    );
    assert_eq!(
      from_override.number_of_weeks,
      6
    );
    assert_eq!(
      from_override.filter_value("weeks"),
      Some("6")
    );
  }

  #[test]
  fn every_active_filter_becomes_a_param()
  {
    let mut filters = FilterSet::default();
    for (name, value) in [
      (FilterName::Status, "pending"),
      (FilterName::Category, "12"),
      (FilterName::Tag, "34"),
      (FilterName::Author, "5"),
      (FilterName::PostType, "page")
    ] {
      filters.apply_change(
        name,
        Some(value),
        5
      );
    }

    let query =
      build_query(&window(1), &filters, None);
    let params: Vec<&str> = query
      .filters
      .iter()
      .map(|f| f.param.as_str())
      .collect();
    assert_eq!(
      params,
      vec![
        "post_status",
        "category",
        "post_tag",
        "post_author",
        "post_type"
      ]
    );
  }

  #[test]
  fn tracker_accepts_only_latest_generation()
  {
    let mut tracker =
      FetchTracker::default();
    let key = FetchKey {
      window:  window(1),
      filters: FilterSet::default(),
      refresh: 0
    };
    let first = tracker.issue(key.clone());
    let second = tracker.issue(FetchKey {
      refresh: 1,
      ..key
    });

    assert!(!tracker.complete(first));
    assert!(tracker.in_flight());
    assert!(tracker.complete(second));
    assert!(!tracker.in_flight());
  }
}

//! Turns a snapshot into the rows and
//! cells a renderer draws. Pure; no
//! rendering technology is assumed.

use almanac_shared::{
  CalendarItem,
  ItemId
};
use chrono::{
  Datelike,
  NaiveDate
};

use crate::datetime::{
  WeekStart,
  format_for_query
};
use crate::model::CalendarSnapshot;
use crate::overlay::Overlay;

const MONTH_NAMES: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May",
  "Jun", "Jul", "Aug", "Sep", "Oct",
  "Nov", "Dec"
];

pub fn weekday_labels(
  week_start: WeekStart
) -> [&'static str; 7] {
  match week_start {
    | WeekStart::Sunday => {
      [
        "Sun", "Mon", "Tue", "Wed",
        "Thu", "Fri", "Sat"
      ]
    }
    | WeekStart::Monday => {
      [
        "Mon", "Tue", "Wed", "Thu",
        "Fri", "Sat", "Sun"
      ]
    }
  }
}

pub fn month_label(
  date: NaiveDate
) -> &'static str {
  MONTH_NAMES[date.month0() as usize]
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
  pub date:            NaiveDate,
  pub key:             String,
  /// First cell of the grid or first
  /// day of a month.
  pub show_month_name: bool,
  pub is_today:        bool,
  pub visible:         Vec<CalendarItem>,
  pub hidden_count:    usize,
  pub is_hovered:      bool,
  pub is_loading:      bool,
  pub opened_item:     Option<ItemId>
}

impl DayCell {
  pub fn total(&self) -> usize {
    self.visible.len() + self.hidden_count
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekRow {
  pub cells: Vec<DayCell>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
  pub labels:          [&'static str; 7],
  pub rows:            Vec<WeekRow>,
  pub loading_message: Option<String>
}

impl CalendarGrid {
  pub fn from_snapshot(
    snapshot: &CalendarSnapshot
  ) -> Self {
    let opened = match &snapshot.overlay {
      | Overlay::Viewing(viewing) => {
        Some(viewing.id)
      }
      | _ => None
    };
    let limit = snapshot.max_visible_items;

    let cells = snapshot
      .window
      .days()
      .enumerate()
      .map(|(position, date)| {
        let items =
          snapshot.index.items_on_date(date);
        let shown = items.len().min(limit);
        DayCell {
          show_month_name: position == 0
            || date.day() == 1,
          is_today: date == snapshot.today,
          visible: items[..shown].to_vec(),
          hidden_count: items.len() - shown,
          is_hovered: snapshot.markers.hover
            == Some(date),
          is_loading: snapshot
            .markers
            .loading
            == Some(date),
          opened_item: opened.filter(|id| {
            items
              .iter()
              .any(|item| item.id == *id)
          }),
          key: format_for_query(date),
          date
        }
      })
      .collect::<Vec<_>>();

    let rows = cells
      .chunks(7)
      .map(|week| {
        WeekRow {
          cells: week.to_vec()
        }
      })
      .collect();

    Self {
      labels: weekday_labels(
        snapshot.window.week_start()
      ),
      rows,
      loading_message: snapshot
        .loading
        .is_loading
        .then(|| {
          snapshot
            .loading
            .message
            .clone()
            .unwrap_or_default()
        })
    }
  }

  pub fn cells(
    &self
  ) -> impl Iterator<Item = &DayCell> {
    self
      .rows
      .iter()
      .flat_map(|row| row.cells.iter())
  }

  pub fn cell(
    &self,
    date: NaiveDate
  ) -> Option<&DayCell> {
    self.cells().find(|cell| cell.date == date)
  }
}

use almanac_shared::{
  ItemDetail,
  ItemId
};
use chrono::NaiveDate;
use tracing::{
  debug,
  trace
};

use crate::error::CalendarError;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailStatus {
  Loading,
  Loaded(ItemDetail),
  Failed(String)
}

impl DetailStatus {
  pub fn detail(
    &self
  ) -> Option<&ItemDetail> {
    match self {
      | Self::Loaded(detail) => Some(detail),
      | _ => None
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewingItem {
  pub id:            ItemId,
  pub detail:        DetailStatus,
  /// Bumped by every in-overlay edit
  /// that asks for the detail again.
  pub refresh_count: u64,
  latest_ticket:     u64,
  awaiting:          bool
}

impl ViewingItem {
  /// A detail request for this item has
  /// not been answered yet. Stays true
  /// during a refresh even though the
  /// previous detail is still shown.
  pub fn is_awaiting_detail(&self) -> bool {
    self.awaiting
  }
}

/// At most one overlay is ever visible.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Overlay {
  #[default]
  Closed,
  Viewing(ViewingItem),
  Creating {
    date: NaiveDate
  }
}

/// Identifies one detail request. A
/// response is applied only if its ticket
/// is still the latest one for the item
/// being viewed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DetailTicket {
  pub id:       ItemId,
  pub sequence: u64
}

#[derive(Debug, Default)]
pub struct OverlayMachine {
  state:         Overlay,
  next_sequence: u64
}

impl OverlayMachine {
  pub fn state(&self) -> &Overlay {
    &self.state
  }

  pub fn viewing_id(
    &self
  ) -> Option<ItemId> {
    match &self.state {
      | Overlay::Viewing(viewing) => {
        Some(viewing.id)
      }
      | _ => None
    }
  }

  pub fn is_viewing(
    &self,
    id: ItemId
  ) -> bool {
    self.viewing_id() == Some(id)
  }

  /// Opens the detail overlay for `id`.
  /// Returns the ticket of the detail
  /// fetch to issue, or `None` when that
  /// item is already open.
  #[tracing::instrument(skip(self))]
  pub fn open_item(
    &mut self,
    id: ItemId
  ) -> Option<DetailTicket> {
    if self.is_viewing(id) {
      trace!(
        item_id = %id,
        "item overlay already open"
      );
      return None;
    }

    let ticket = self.issue(id);
    self.state =
      Overlay::Viewing(ViewingItem {
        id,
        detail: DetailStatus::Loading,
        refresh_count: 0,
        latest_ticket: ticket.sequence,
        awaiting: true
      });
    debug!(
      item_id = %id,
      sequence = ticket.sequence,
      "item overlay opened"
    );
    Some(ticket)
  }

  /// Opens the creation form for `date`
  /// when the user may create items. Any
  /// viewed item is closed first.
  pub fn open_new_item(
    &mut self,
    date: NaiveDate,
    can_create: bool
  ) -> bool {
    if !can_create {
      debug!(
        %date,
        "creation form denied"
      );
      return false;
    }

    self.state =
      Overlay::Creating { date };
    true
  }

  /// Forces `Closed`. Returns whether an
  /// overlay was open.
  pub fn close(&mut self) -> bool {
    let was_open = !matches!(
      self.state,
      Overlay::Closed
    );
    self.state = Overlay::Closed;
    was_open
  }

  /// Re-requests the detail of the open
  /// item without closing it.
  pub fn refresh(
    &mut self
  ) -> Option<DetailTicket> {
    let id = self.viewing_id()?;
    let ticket = self.issue(id);
    if let Overlay::Viewing(viewing) =
      &mut self.state
    {
      viewing.refresh_count += 1;
      viewing.latest_ticket =
        ticket.sequence;
      viewing.awaiting = true;
    }
    Some(ticket)
  }

  /// Applies a detail response. Responses
  /// for a closed overlay, another item or
  /// a superseded request are discarded.
  pub fn accept_detail(
    &mut self,
    ticket: DetailTicket,
    result: Result<
      ItemDetail,
      CalendarError
    >
  ) -> bool {
    let Overlay::Viewing(viewing) =
      &mut self.state
    else {
      debug!(
        item_id = %ticket.id,
        "detail arrived after overlay closed"
      );
      return false;
    };

    if viewing.id != ticket.id
      || viewing.latest_ticket
        != ticket.sequence
    {
      debug!(
        item_id = %ticket.id,
        viewing = %viewing.id,
        sequence = ticket.sequence,
        "discarding stale item detail"
      );
      return false;
    }

    viewing.awaiting = false;
    viewing.detail = match result {
      | Ok(detail) => {
        DetailStatus::Loaded(detail)
      }
      | Err(error) => {
        DetailStatus::Failed(
          error.to_string()
        )
      }
    };
    true
  }

  fn issue(
    &mut self,
    id: ItemId
  ) -> DetailTicket {
    self.next_sequence += 1;
    DetailTicket {
      id,
      sequence: self.next_sequence
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10)
      .expect("valid date")
  }

  fn detail(title: &str) -> ItemDetail {
    ItemDetail {
      title: title.to_string(),
      ..ItemDetail::default()
    }
  }

  #[test]
  fn reopening_same_item_is_noop() {
    let mut overlay =
      OverlayMachine::default();
    assert!(
      overlay.open_item(ItemId(4)).is_some()
    );
    assert!(
      overlay.open_item(ItemId(4)).is_none()
    );
  }

  #[test]
  fn switching_items_discards_old_detail()
  {
    let mut overlay =
      OverlayMachine::default();
    let first = overlay
      .open_item(ItemId(1))
      .expect("first ticket");
    let second = overlay
      .open_item(ItemId(2))
      .expect("second ticket");

    assert!(!overlay.accept_detail(
      first,
      Ok(detail("one"))
    ));
    assert!(overlay.accept_detail(
      second,
      Ok(detail("two"))
    ));
    match overlay.state() {
      | Overlay::Viewing(viewing) => {
        assert_eq!(
          viewing
            .detail
            .detail()
            .map(|d| d.title.as_str()),
          Some("two")
        );
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn escape_discards_late_detail() {
    let mut overlay =
      OverlayMachine::default();
    let ticket = overlay
      .open_item(ItemId(3))
      .expect("ticket");
    assert!(overlay.close());
    assert!(!overlay.accept_detail(
      ticket,
      Ok(detail("late"))
    ));
    assert_eq!(
      overlay.state(),
      &Overlay::Closed
    );
  }

  #[test]
  fn reopen_after_close_ignores_first_request()
  {
    let mut overlay =
      OverlayMachine::default();
    let stale = overlay
      .open_item(ItemId(3))
      .expect("ticket");
    overlay.close();
    let fresh = overlay
      .open_item(ItemId(3))
      .expect("ticket");

    assert!(!overlay.accept_detail(
      stale,
      Ok(detail("old"))
    ));
    assert!(overlay.accept_detail(
      fresh,
      Ok(detail("new"))
    ));
  }

  #[test]
  fn creating_replaces_viewing() {
    let mut overlay =
      OverlayMachine::default();
    overlay.open_item(ItemId(8));
    assert!(
      overlay.open_new_item(date(), true)
    );
    assert_eq!(
      overlay.state(),
      &Overlay::Creating { date: date() }
    );
    assert_eq!(overlay.viewing_id(), None);
  }

  #[test]
  fn unauthorized_creation_keeps_state() {
    let mut overlay =
      OverlayMachine::default();
    overlay.open_item(ItemId(8));
    assert!(
      !overlay.open_new_item(date(), false)
    );
    assert!(overlay.is_viewing(ItemId(8)));
  }

  #[test]
  fn refresh_keeps_overlay_open() {
    let mut overlay =
      OverlayMachine::default();
    let first = overlay
      .open_item(ItemId(5))
      .expect("ticket");
    assert!(overlay.accept_detail(
      first,
      Ok(detail("v1"))
    ));

    let refreshed = overlay
      .refresh()
      .expect("refresh ticket");
    assert_eq!(refreshed.id, ItemId(5));
    match overlay.state() {
      | Overlay::Viewing(viewing) => {
        assert!(viewing.is_awaiting_detail());
        assert_eq!(
          viewing
            .detail
            .detail()
            .map(|d| d.title.as_str()),
          Some("v1")
        );
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
    assert!(overlay.accept_detail(
      refreshed,
      Err(CalendarError::NetworkFailure(
        "timeout".to_string()
      ))
    ));

    match overlay.state() {
      | Overlay::Viewing(viewing) => {
        assert_eq!(viewing.refresh_count, 1);
        assert!(!viewing.is_awaiting_detail());
        assert!(matches!(
          viewing.detail,
          DetailStatus::Failed(_)
        ));
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn refresh_without_open_item_is_noop()
  {
    let mut overlay =
      OverlayMachine::default();
    assert!(overlay.refresh().is_none());
  }
}

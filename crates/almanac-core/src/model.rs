//! Pure state machine of the calendar
//! view. `update` applies one message and
//! returns the backend calls to run; it
//! never performs I/O itself.

use almanac_shared::{
  CalendarQuery,
  ItemDetail,
  ItemId,
  ItemsByDate,
  MoveItemArgs
};
use chrono::NaiveDate;
use tracing::{
  debug,
  info,
  warn
};

use crate::config::CalendarConfig;
use crate::datetime::{
  DateWindow,
  WeekStart
};
use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::fetch::{
  FetchKey,
  FetchTicket,
  FetchTracker,
  LOADING_MESSAGE,
  LoadingState,
  MOVING_MESSAGE,
  build_query
};
use crate::filter::{
  FilterName,
  FilterOverride,
  FilterSet
};
use crate::index::ItemIndex;
use crate::overlay::{
  DetailTicket,
  Overlay,
  OverlayMachine
};
use crate::reschedule::{
  DragDecision,
  DragMarkers,
  DropEvent,
  resolve_move
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Navigation {
  Refresh,
  BackPage,
  Back,
  Forward,
  ForwardPage,
  Today
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
  Escape,
  Other(String)
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarMsg {
  Navigate(Navigation),
  FilterChanged {
    name:  FilterName,
    value: Option<String>
  },
  ClickItem(ItemId),
  ClickEmptyCell(NaiveDate),
  /// An edit made inside the open item
  /// overlay.
  RefreshItemPopup,
  KeyDown(Key),
  DragHover(NaiveDate),
  DragStop,
  Drop(DropEvent),
  CalendarLoaded {
    ticket: FetchTicket,
    result: CalendarResult<ItemsByDate>
  },
  DetailLoaded {
    ticket: DetailTicket,
    result: CalendarResult<ItemDetail>
  },
  MoveFinished {
    args:   MoveItemArgs,
    result: CalendarResult<()>
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCmd {
  FetchCalendar {
    ticket: FetchTicket,
    query:  CalendarQuery
  },
  FetchDetail {
    ticket: DetailTicket
  },
  MoveItem {
    args: MoveItemArgs
  }
}

/// Construction inputs of a calendar
/// view.
#[derive(Debug, Clone)]
pub struct CalendarProps {
  pub first_date:        NaiveDate,
  pub today:             NaiveDate,
  pub number_of_weeks:   u32,
  pub week_start:        WeekStart,
  pub max_visible_items: usize,
  pub can_create_items:  bool,
  /// Server-rendered first page; when
  /// present the first fetch is skipped.
  pub initial_items:     Option<ItemsByDate>
}

impl CalendarProps {
  pub fn from_config(
    config: &CalendarConfig,
    first_date: Option<NaiveDate>
  ) -> Self {
    let today = config.today();
    Self {
      first_date: first_date
        .unwrap_or(today),
      today,
      number_of_weeks: config
        .calendar
        .number_of_weeks,
      week_start: config.week_start(),
      max_visible_items: config
        .calendar
        .max_visible_items,
      can_create_items: config
        .calendar
        .can_create_items,
      initial_items: None
    }
  }
}

/// Read-only view of the controller
/// state handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSnapshot {
  pub window:            DateWindow,
  pub filters:           FilterSet,
  pub index:             ItemIndex,
  pub overlay:           Overlay,
  pub loading:           LoadingState,
  pub markers:           DragMarkers,
  pub refresh:           u64,
  pub generation:        u64,
  pub fetch_in_flight:   bool,
  pub moving:            Option<MoveItemArgs>,
  pub last_error:        Option<CalendarError>,
  pub today:             NaiveDate,
  pub max_visible_items: usize,
  pub can_create_items:  bool
}

impl CalendarSnapshot {
  /// No request of any kind is pending.
  pub fn is_settled(&self) -> bool {
    let detail_pending = matches!(
      &self.overlay,
      Overlay::Viewing(viewing)
        if viewing.is_awaiting_detail()
    );
    !self.loading.is_loading
      && !self.fetch_in_flight
      && self.moving.is_none()
      && !detail_pending
  }
}

#[derive(Debug)]
pub struct CalendarModel {
  window:            DateWindow,
  filters:           FilterSet,
  index:             ItemIndex,
  overlay:           OverlayMachine,
  loading:           LoadingState,
  markers:           DragMarkers,
  refresh:           u64,
  tracker:           FetchTracker,
  moving:            Option<MoveItemArgs>,
  last_error:        Option<CalendarError>,
  today:             NaiveDate,
  default_weeks:     u32,
  max_visible_items: usize,
  can_create_items:  bool
}

impl CalendarModel {
  pub fn new(props: CalendarProps) -> Self {
    let default_weeks =
      props.number_of_weeks.max(1);
    let window = DateWindow::new(
      props.first_date,
      default_weeks,
      props.week_start
    );

    let mut model = Self {
      window,
      filters: FilterSet::default(),
      index: ItemIndex::default(),
      overlay: OverlayMachine::default(),
      loading: LoadingState::idle(),
      markers: DragMarkers::default(),
      refresh: 0,
      tracker: FetchTracker::default(),
      moving: None,
      last_error: None,
      today: props.today,
      default_weeks,
      max_visible_items: props
        .max_visible_items
        .max(1),
      can_create_items: props
        .can_create_items
    };

    if let Some(items) = props.initial_items
    {
      model.index.replace(items);
      let key = model.fetch_key();
      model.tracker.seed(key);
    }
    model
  }

  /// Applies a filter before `start`
  /// without issuing a fetch.
  pub fn preset_filter(
    &mut self,
    name: FilterName,
    value: &str
  ) {
    let pending = self.filters.apply_change(
      name,
      Some(value),
      self.default_weeks
    );
    if let Some(weeks) = pending.weeks() {
      self.window =
        self.window.with_weeks(weeks);
    }
  }

  /// Called once the view is mounted.
  pub fn start(
    &mut self
  ) -> Vec<CalendarCmd> {
    self.sync_fetch(None)
  }

  pub fn window(&self) -> &DateWindow {
    &self.window
  }

  pub fn filters(&self) -> &FilterSet {
    &self.filters
  }

  pub fn index(&self) -> &ItemIndex {
    &self.index
  }

  pub fn overlay(&self) -> &Overlay {
    self.overlay.state()
  }

  pub fn loading(&self) -> &LoadingState {
    &self.loading
  }

  pub fn markers(&self) -> &DragMarkers {
    &self.markers
  }

  pub fn refresh_counter(&self) -> u64 {
    self.refresh
  }

  pub fn last_error(
    &self
  ) -> Option<&CalendarError> {
    self.last_error.as_ref()
  }

  pub fn fetch_key(&self) -> FetchKey {
    FetchKey {
      window:  self.window,
      filters: self.filters.clone(),
      refresh: self.refresh
    }
  }

  pub fn snapshot(
    &self
  ) -> CalendarSnapshot {
    CalendarSnapshot {
      window:            self.window,
      filters:           self.filters.clone(),
      index:             self.index.clone(),
      overlay:           self
        .overlay
        .state()
        .clone(),
      loading:           self.loading.clone(),
      markers:           self.markers.clone(),
      refresh:           self.refresh,
      generation:        self
        .tracker
        .latest_generation(),
      fetch_in_flight:   self
        .tracker
        .in_flight(),
      moving:            self.moving,
      last_error:        self
        .last_error
        .clone(),
      today:             self.today,
      max_visible_items: self
        .max_visible_items,
      can_create_items:  self
        .can_create_items
    }
  }

  /// Drag-start guard. The open item
  /// cannot be dragged; dragging anything
  /// else closes the overlay.
  pub fn begin_drag(
    &mut self,
    id: ItemId
  ) -> DragDecision {
    if self.overlay.is_viewing(id) {
      debug!(
        item_id = %id,
        "drag rejected while item overlay is open"
      );
      return DragDecision::Deny;
    }

    self.overlay.close();
    self.markers.dragging = Some(id);
    DragDecision::Allow
  }

  pub fn update(
    &mut self,
    msg: CalendarMsg
  ) -> Vec<CalendarCmd> {
    match msg {
      | CalendarMsg::Navigate(nav) => {
        self.navigate(nav)
      }
      | CalendarMsg::FilterChanged {
        name,
        value
      } => {
        self.change_filter(
          name,
          value.as_deref()
        )
      }
      | CalendarMsg::ClickItem(id) => {
        self
          .overlay
          .open_item(id)
          .map(|ticket| {
            vec![CalendarCmd::FetchDetail {
              ticket
            }]
          })
          .unwrap_or_default()
      }
      | CalendarMsg::ClickEmptyCell(
        date
      ) => {
        self.overlay.open_new_item(
          date,
          self.can_create_items
        );
        Vec::new()
      }
      | CalendarMsg::RefreshItemPopup => {
        self
          .overlay
          .refresh()
          .map(|ticket| {
            vec![CalendarCmd::FetchDetail {
              ticket
            }]
          })
          .unwrap_or_default()
      }
      | CalendarMsg::KeyDown(key) => {
        if key == Key::Escape
          && self.overlay.close()
        {
          debug!("overlay closed by escape");
        }
        Vec::new()
      }
      | CalendarMsg::DragHover(date) => {
        self.markers.hover(date);
        Vec::new()
      }
      | CalendarMsg::DragStop => {
        self.markers.dragging = None;
        self.markers.hover = None;
        Vec::new()
      }
      | CalendarMsg::Drop(drop) => {
        self.drop_item(&drop)
      }
      | CalendarMsg::CalendarLoaded {
        ticket,
        result
      } => {
        self.calendar_loaded(
          ticket, result
        );
        Vec::new()
      }
      | CalendarMsg::DetailLoaded {
        ticket,
        result
      } => {
        self.detail_loaded(ticket, result);
        Vec::new()
      }
      | CalendarMsg::MoveFinished {
        args,
        result
      } => self.move_finished(args, result)
    }
  }

  fn navigate(
    &mut self,
    nav: Navigation
  ) -> Vec<CalendarCmd> {
    let page =
      i64::from(self.window.weeks());
    match nav {
      | Navigation::Refresh => {
        self.refresh += 1;
      }
      | Navigation::BackPage => {
        self.window =
          self.window.shifted_by_weeks(-page);
      }
      | Navigation::Back => {
        self.window =
          self.window.shifted_by_weeks(-1);
      }
      | Navigation::Forward => {
        self.window =
          self.window.shifted_by_weeks(1);
      }
      | Navigation::ForwardPage => {
        self.window =
          self.window.shifted_by_weeks(page);
      }
      | Navigation::Today => {
        self.window =
          self.window.starting_at(self.today);
      }
    }
    debug!(
      ?nav,
      start = %self.window.start(),
      "navigated"
    );
    self.sync_fetch(None)
  }

  fn change_filter(
    &mut self,
    name: FilterName,
    value: Option<&str>
  ) -> Vec<CalendarCmd> {
    let pending = self.filters.apply_change(
      name,
      value,
      self.default_weeks
    );
    if let Some(weeks) = pending.weeks() {
      self.window =
        self.window.with_weeks(weeks);
    }
    self.sync_fetch(Some(pending))
  }

  /// Issues a bulk fetch when any of
  /// window, filters or refresh counter
  /// moved since the last one.
  fn sync_fetch(
    &mut self,
    pending: Option<FilterOverride>
  ) -> Vec<CalendarCmd> {
    let key = self.fetch_key();
    if !self.tracker.needs_fetch(&key) {
      return Vec::new();
    }

    let query = build_query(
      &self.window,
      &self.filters,
      pending.as_ref()
    );
    self.markers.hover = None;
    self.loading =
      LoadingState::start(LOADING_MESSAGE);
    let ticket = self.tracker.issue(key);
    info!(
      generation = ticket.generation,
      start_date = %query.start_date,
      weeks = query.number_of_weeks,
      "refetching calendar"
    );
    vec![CalendarCmd::FetchCalendar {
      ticket,
      query
    }]
  }

  fn calendar_loaded(
    &mut self,
    ticket: FetchTicket,
    result: CalendarResult<ItemsByDate>
  ) {
    if !self.tracker.complete(ticket) {
      return;
    }

    match result {
      | Ok(items) => {
        debug!(
          generation = ticket.generation,
          dates = items.len(),
          "calendar items loaded"
        );
        self.index.replace(items);
        self.last_error = None;
      }
      | Err(error) => {
        warn!(
          generation = ticket.generation,
          %error,
          "calendar fetch failed; keeping previous items"
        );
        self.last_error = Some(error);
      }
    }

    self.markers.reset_cells();
    self.loading = self.idle_loading();
  }

  fn detail_loaded(
    &mut self,
    ticket: DetailTicket,
    result: CalendarResult<ItemDetail>
  ) {
    let fresh = result.as_ref().ok().cloned();
    let failure = result.as_ref().err().cloned();
    if !self.overlay.accept_detail(
      ticket, result
    ) {
      return;
    }

    if let Some(detail) = fresh {
      self
        .index
        .refresh_item(ticket.id, &detail);
    }
    if let Some(error) = failure {
      warn!(
        item_id = %ticket.id,
        %error,
        "item detail fetch failed"
      );
      self.last_error = Some(error);
    }
  }

  fn drop_item(
    &mut self,
    drop: &DropEvent
  ) -> Vec<CalendarCmd> {
    self.markers.dragging = None;
    let args =
      match resolve_move(&self.index, drop) {
        | Ok(args) => args,
        | Err(error) => {
          debug!(
            %error,
            "drop ignored; item no longer indexed"
          );
          self.markers.hover = None;
          return Vec::new();
        }
      };

    info!(
      item_id = %args.id,
      year = args.year,
      month = args.month,
      day = args.day,
      "moving item"
    );
    self.markers.loading =
      drop.destination();
    self.loading =
      LoadingState::start(MOVING_MESSAGE);
    self.moving = Some(args);
    vec![CalendarCmd::MoveItem { args }]
  }

  fn move_finished(
    &mut self,
    args: MoveItemArgs,
    result: CalendarResult<()>
  ) -> Vec<CalendarCmd> {
    if self.moving == Some(args) {
      self.moving = None;
    }

    match result {
      | Ok(()) => {
        self.refresh += 1;
        self.sync_fetch(None)
      }
      | Err(error) => {
        warn!(
          item_id = %args.id,
          %error,
          "move failed; item stays in place"
        );
        self.last_error = Some(error);
        self.markers.reset_cells();
        self.loading = self.idle_loading();
        Vec::new()
      }
    }
  }

  fn idle_loading(&self) -> LoadingState {
    if self.tracker.in_flight() {
      LoadingState::start(LOADING_MESSAGE)
    } else if self.moving.is_some() {
      LoadingState::start(MOVING_MESSAGE)
    } else {
      LoadingState::idle()
    }
  }
}

#[cfg(test)]
mod tests {
  use almanac_shared::CalendarItem;

  use super::*;

  fn ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .expect("valid date")
  }

  fn props() -> CalendarProps {
    CalendarProps {
      first_date:        ymd(2024, 1, 1),
      today:             ymd(2024, 1, 17),
      number_of_weeks:   2,
      week_start:        WeekStart::Monday,
      max_visible_items: 3,
      can_create_items:  true,
      initial_items:     None
    }
  }

  fn items() -> ItemsByDate {
    let mut by_date = ItemsByDate::new();
    by_date.insert(
      "2024-01-03".to_string(),
      vec![
        CalendarItem::new(
          1,
          "First",
          "draft",
          "2024-01-03 09:00:00"
        ),
        CalendarItem::new(
          2,
          "Second",
          "draft",
          "2024-01-03 11:00:00"
        ),
      ]
    );
    by_date
  }

  fn fetch_ticket(
    cmds: &[CalendarCmd]
  ) -> FetchTicket {
    cmds
      .iter()
      .find_map(|cmd| match cmd {
        | CalendarCmd::FetchCalendar {
          ticket,
          ..
        } => Some(*ticket),
        | _ => None
      })
      .expect("fetch command")
  }

  fn loaded_model() -> CalendarModel {
    let mut model =
      CalendarModel::new(props());
    let cmds = model.start();
    model.update(
      CalendarMsg::CalendarLoaded {
        ticket: fetch_ticket(&cmds),
        result: Ok(items())
      }
    );
    model
  }

  #[test]
  fn start_fetches_without_initial_items()
  {
    let mut model =
      CalendarModel::new(props());
    let cmds = model.start();

    assert_eq!(cmds.len(), 1);
    assert!(model.loading().is_loading);
    assert_eq!(
      model.loading().message.as_deref(),
      Some("Loading...")
    );
  }

  #[test]
  fn initial_items_skip_first_fetch() {
    let mut model =
      CalendarModel::new(CalendarProps {
        initial_items: Some(items()),
        ..props()
      });

    assert!(model.start().is_empty());
    assert_eq!(model.index().len(), 2);
  }

  #[test]
  fn preset_filters_shape_first_query() {
    let mut model =
      CalendarModel::new(props());
    model.preset_filter(
      FilterName::Category,
      "news"
    );
    model.preset_filter(FilterName::Weeks, "6");
    let cmds = model.start();

    assert_eq!(model.window().weeks(), 6);
    match &cmds[..] {
      | [CalendarCmd::FetchCalendar {
        query,
        ..
      }] => {
        assert_eq!(
          query.filter_value("category"),
          Some("news")
        );
        assert_eq!(query.number_of_weeks, 6);
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn forward_moves_window_one_week() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::Navigate(
        Navigation::Forward
      )
    );

    assert_eq!(
      model.window().start(),
      ymd(2024, 1, 8)
    );
    match &cmds[0] {
      | CalendarCmd::FetchCalendar {
        query,
        ..
      } => {
        assert_eq!(
          query.start_date,
          "2024-01-08"
        );
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn page_navigation_uses_window_size() {
    let mut model = loaded_model();
    model.update(CalendarMsg::Navigate(
      Navigation::BackPage
    ));
    assert_eq!(
      model.window().start(),
      ymd(2023, 12, 18)
    );

    model.update(CalendarMsg::Navigate(
      Navigation::Today
    ));
    assert_eq!(
      model.window().start(),
      ymd(2024, 1, 15)
    );
  }

  #[test]
  fn refresh_forces_fetch_with_same_window()
  {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::Navigate(
        Navigation::Refresh
      )
    );

    assert_eq!(cmds.len(), 1);
    assert_eq!(model.refresh_counter(), 1);
  }

  #[test]
  fn status_filter_reaches_query() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::FilterChanged {
        name:  FilterName::Status,
        value: Some("draft".to_string())
      }
    );

    match &cmds[0] {
      | CalendarCmd::FetchCalendar {
        query,
        ..
      } => {
        assert_eq!(
          query.filter_value("post_status"),
          Some("draft")
        );
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn weeks_filter_resizes_window() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::FilterChanged {
        name:  FilterName::Weeks,
        value: Some("0".to_string())
      }
    );

    assert_eq!(model.window().weeks(), 2);
    assert_eq!(
      model.filters().weeks(),
      Some(2)
    );
    assert_eq!(cmds.len(), 1);

    let cmds = model.update(
      CalendarMsg::FilterChanged {
        name:  FilterName::Weeks,
        value: Some("4".to_string())
      }
    );
    assert_eq!(model.window().weeks(), 4);
    match &cmds[0] {
      | CalendarCmd::FetchCalendar {
        query,
        ..
      } => {
        assert_eq!(query.number_of_weeks, 4)
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  #[test]
  fn superseded_fetch_result_is_ignored()
  {
    let mut model = loaded_model();
    let first = fetch_ticket(&model.update(
      CalendarMsg::Navigate(
        Navigation::Forward
      )
    ));
    let second =
      fetch_ticket(&model.update(
        CalendarMsg::Navigate(
          Navigation::Forward
        )
      ));

    model.update(
      CalendarMsg::CalendarLoaded {
        ticket: second,
        result: Ok(ItemsByDate::new())
      }
    );
    assert!(!model.loading().is_loading);

    model.update(
      CalendarMsg::CalendarLoaded {
        ticket: first,
        result: Ok(items())
      }
    );
    assert!(model.index().is_empty());
  }

  #[test]
  fn failed_fetch_keeps_items_and_clears_loading()
  {
    let mut model = loaded_model();
    let ticket = fetch_ticket(&model.update(
      CalendarMsg::Navigate(
        Navigation::Refresh
      )
    ));
    model.update(
      CalendarMsg::CalendarLoaded {
        ticket,
        result: Err(
          CalendarError::NetworkFailure(
            "offline".to_string()
          )
        )
      }
    );

    assert!(!model.loading().is_loading);
    assert_eq!(model.index().len(), 2);
    assert!(model.last_error().is_some());
  }

  #[test]
  fn clicking_same_item_twice_fetches_once()
  {
    let mut model = loaded_model();
    let first = model
      .update(CalendarMsg::ClickItem(
        ItemId(1)
      ));
    let second = model
      .update(CalendarMsg::ClickItem(
        ItemId(1)
      ));

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
  }

  fn detail_ticket(
    cmds: &[CalendarCmd]
  ) -> DetailTicket {
    match cmds {
      | [CalendarCmd::FetchDetail {
        ticket
      }] => *ticket,
      | other => {
        panic!("unexpected {other:?}")
      }
    }
  }

  fn detail(title: &str) -> ItemDetail {
    ItemDetail {
      id: Some(ItemId(1)),
      title: title.to_string(),
      ..ItemDetail::default()
    }
  }

  #[test]
  fn popup_refresh_refetches_open_item_once()
  {
    let mut model = loaded_model();
    let opened = detail_ticket(&model.update(
      CalendarMsg::ClickItem(ItemId(1))
    ));
    model.update(
      CalendarMsg::DetailLoaded {
        ticket: opened,
        result: Ok(detail("First"))
      }
    );
    assert!(model.snapshot().is_settled());

    let refreshed = detail_ticket(
      &model.update(
        CalendarMsg::RefreshItemPopup
      )
    );
    assert_eq!(refreshed.id, ItemId(1));
    assert_ne!(refreshed, opened);
    assert!(!model.snapshot().is_settled());

    model.update(
      CalendarMsg::DetailLoaded {
        ticket: refreshed,
        result: Ok(detail("First, edited"))
      }
    );
    assert!(model.snapshot().is_settled());
    match model.overlay() {
      | Overlay::Viewing(viewing) => {
        assert_eq!(viewing.refresh_count, 1);
        assert_eq!(
          viewing
            .detail
            .detail()
            .map(|d| d.title.as_str()),
          Some("First, edited")
        );
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    }
    assert_eq!(
      model
        .index()
        .get("2024-01-03", 0)
        .map(|item| item.title.as_str()),
      Some("First, edited")
    );
  }

  #[test]
  fn popup_refresh_without_open_item_is_noop()
  {
    let mut model = loaded_model();
    assert!(
      model
        .update(CalendarMsg::RefreshItemPopup)
        .is_empty()
    );
  }

  #[test]
  fn escape_discards_pending_detail() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::ClickItem(ItemId(2))
    );
    let ticket = match &cmds[0] {
      | CalendarCmd::FetchDetail {
        ticket
      } => *ticket,
      | other => {
        panic!("unexpected {other:?}")
      }
    };

    model.update(CalendarMsg::KeyDown(
      Key::Escape
    ));
    model.update(
      CalendarMsg::DetailLoaded {
        ticket,
        result: Ok(ItemDetail {
          title: "Late".to_string(),
          ..ItemDetail::default()
        })
      }
    );

    assert_eq!(
      model.overlay(),
      &Overlay::Closed
    );
    assert_eq!(
      model
        .index()
        .get("2024-01-03", 1)
        .map(|item| item.title.as_str()),
      Some("Second")
    );
  }

  #[test]
  fn drag_guard_rejects_open_item() {
    let mut model = loaded_model();
    model.update(CalendarMsg::ClickItem(
      ItemId(1)
    ));

    assert_eq!(
      model.begin_drag(ItemId(1)),
      DragDecision::Deny
    );
    assert_eq!(
      model.begin_drag(ItemId(2)),
      DragDecision::Allow
    );
    assert_eq!(
      model.overlay(),
      &Overlay::Closed
    );
  }

  #[test]
  fn drop_moves_then_refetches_once() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::Drop(DropEvent::new(
        "2024-01-03",
        1,
        ymd(2024, 1, 10)
      ))
    );

    let args = match &cmds[..] {
      | [CalendarCmd::MoveItem { args }] => {
        *args
      }
      | other => {
        panic!("unexpected {other:?}")
      }
    };
    assert_eq!(args.id, ItemId(2));
    assert_eq!(
      model.loading().message.as_deref(),
      Some("Moving the item...")
    );
    assert_eq!(model.index().len(), 2);

    let cmds = model.update(
      CalendarMsg::MoveFinished {
        args,
        result: Ok(())
      }
    );
    assert_eq!(model.refresh_counter(), 1);
    assert_eq!(cmds.len(), 1);
    assert_eq!(
      model
        .index()
        .items_on("2024-01-03")
        .len(),
      2
    );
  }

  #[test]
  fn stale_drop_sends_nothing() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::Drop(DropEvent::new(
        "2024-01-05",
        0,
        ymd(2024, 1, 10)
      ))
    );

    assert!(cmds.is_empty());
    assert!(!model.loading().is_loading);
    assert!(model.last_error().is_none());
  }

  #[test]
  fn failed_move_clears_loading() {
    let mut model = loaded_model();
    let cmds = model.update(
      CalendarMsg::Drop(DropEvent::new(
        "2024-01-03",
        0,
        ymd(2024, 1, 9)
      ))
    );
    let CalendarCmd::MoveItem { args } =
      cmds[0].clone()
    else {
      panic!("expected move");
    };

    let cmds = model.update(
      CalendarMsg::MoveFinished {
        args,
        result: Err(
          CalendarError::NetworkFailure(
            "500".to_string()
          )
        )
      }
    );
    assert!(cmds.is_empty());
    assert!(!model.loading().is_loading);
    assert_eq!(model.markers().loading, None);
    assert_eq!(model.refresh_counter(), 0);
  }

  #[test]
  fn hover_resets_when_fetch_starts() {
    let mut model = loaded_model();
    model.update(CalendarMsg::DragHover(
      ymd(2024, 1, 4)
    ));
    assert_eq!(
      model.markers().hover,
      Some(ymd(2024, 1, 4))
    );

    model.update(CalendarMsg::Navigate(
      Navigation::Refresh
    ));
    assert_eq!(model.markers().hover, None);
  }

  #[test]
  fn empty_cell_opens_creation_form() {
    let mut model = loaded_model();
    model.update(CalendarMsg::ClickItem(
      ItemId(1)
    ));
    model.update(
      CalendarMsg::ClickEmptyCell(ymd(
        2024, 1, 12
      ))
    );

    assert_eq!(
      model.overlay(),
      &Overlay::Creating {
        date: ymd(2024, 1, 12)
      }
    );
  }
}

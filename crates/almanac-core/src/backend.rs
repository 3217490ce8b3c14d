use std::future::Future;

use almanac_shared::{
  CalendarQuery,
  ItemDetail,
  ItemId,
  ItemsByDate,
  MoveItemArgs
};

use crate::error::CalendarResult;

/// Server boundary of the calendar. Every
/// call is a suspension point of the
/// controller; the controller stays
/// responsive while one is pending.
pub trait CalendarBackend:
  Send + Sync + 'static
{
  /// Bulk read: date key to ordered
  /// items.
  fn fetch_calendar(
    &self,
    query: CalendarQuery
  ) -> impl Future<
    Output = CalendarResult<ItemsByDate>
  > + Send;

  fn fetch_item_detail(
    &self,
    id: ItemId
  ) -> impl Future<
    Output = CalendarResult<ItemDetail>
  > + Send;

  /// Any resolved response counts as
  /// success.
  fn move_item(
    &self,
    args: MoveItemArgs
  ) -> impl Future<
    Output = CalendarResult<()>
  > + Send;
}

pub mod backend;
pub mod config;
pub mod datetime;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod index;
pub mod model;
pub mod overlay;
pub mod reschedule;
pub mod runtime;
pub mod view;

pub use backend::CalendarBackend;
pub use config::CalendarConfig;
pub use datetime::{
  DateWindow,
  WeekStart
};
pub use error::{
  CalendarError,
  CalendarResult
};
pub use filter::{
  FilterName,
  FilterSet
};
pub use model::{
  CalendarCmd,
  CalendarModel,
  CalendarMsg,
  CalendarProps,
  CalendarSnapshot,
  Key,
  Navigation
};
pub use overlay::{
  DetailStatus,
  Overlay
};
pub use reschedule::{
  DragDecision,
  DropEvent
};
pub use runtime::{
  CalendarController,
  ControllerHandle
};
pub use view::CalendarGrid;

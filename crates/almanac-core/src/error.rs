use thiserror::Error;

/// Failures surfaced by the calendar
/// controller and its backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
  #[error("request failed: {0}")]
  NetworkFailure(String),

  #[error(
    "unexpected response payload: {0}"
  )]
  EmptyOrMalformedResponse(String),

  #[error(
    "no item at {date_key}[{index}]"
  )]
  StaleReference {
    date_key: String,
    index:    usize
  },

  #[error("calendar controller is not mounted")]
  Unmounted
}

impl CalendarError {
  /// Stale references abort silently;
  /// everything else reaches the error
  /// channel.
  pub fn is_user_facing(&self) -> bool {
    !matches!(
      self,
      Self::StaleReference { .. }
    )
  }
}

pub type CalendarResult<T> =
  Result<T, CalendarError>;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};

/// Server date format used for item
/// index keys and query parameters.
pub const QUERY_DATE_FORMAT: &str =
  "%Y-%m-%d";

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
  Sunday,
  #[default]
  Monday
}

impl WeekStart {
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "sunday" | "sun" => {
        Some(Self::Sunday)
      }
      | "monday" | "mon" => {
        Some(Self::Monday)
      }
      | _ => None
    }
  }

  pub fn from_sunday_flag(
    week_starts_on_sunday: bool
  ) -> Self {
    if week_starts_on_sunday {
      Self::Sunday
    } else {
      Self::Monday
    }
  }

  pub fn weekday(self) -> Weekday {
    match self {
      | Self::Sunday => Weekday::Sun,
      | Self::Monday => Weekday::Mon
    }
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Sunday => "sunday",
      | Self::Monday => "monday"
    }
  }
}

/// First day of the week containing
/// `date`.
#[must_use]
pub fn begin_of_week(
  date: NaiveDate,
  week_start: WeekStart
) -> NaiveDate {
  let day_idx = date
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .weekday()
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(date, -diff)
}

/// Moves `date` by whole weeks. Works on
/// calendar days, so DST transitions
/// never shift the result.
#[must_use]
pub fn offset_by_weeks(
  date: NaiveDate,
  weeks: i64
) -> NaiveDate {
  add_days(date, weeks.saturating_mul(7))
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  match date
    .checked_add_signed(Duration::days(
      days
    )) {
    | Some(shifted) => shifted,
    | None => {
      tracing::warn!(
        %date,
        days,
        "date offset out of range; \
         keeping original date"
      );
      date
    }
  }
}

#[must_use]
pub fn format_for_query(
  date: NaiveDate
) -> String {
  date
    .format(QUERY_DATE_FORMAT)
    .to_string()
}

/// Parses a date key or the date part of
/// a server datetime such as
/// `2024-01-03 10:00:00`.
pub fn parse_date_key(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  let date_part = trimmed
    .split([' ', 'T'])
    .next()
    .unwrap_or(trimmed);
  NaiveDate::parse_from_str(
    date_part,
    QUERY_DATE_FORMAT
  )
  .ok()
}

pub fn today_in_timezone(
  timezone: Tz
) -> NaiveDate {
  Utc::now()
    .with_timezone(&timezone)
    .date_naive()
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

/// The contiguous, week-aligned range
/// of rendered dates. Replaced on every
/// navigation, never mutated in place.
/// Largest window a view may span.
pub const MAX_WEEKS: u32 = 52;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DateWindow {
  start:      NaiveDate,
  weeks:      u32,
  week_start: WeekStart
}

impl DateWindow {
  pub fn new(
    anchor: NaiveDate,
    weeks: u32,
    week_start: WeekStart
  ) -> Self {
    Self {
      start: begin_of_week(
        anchor, week_start
      ),
      weeks: weeks.clamp(1, MAX_WEEKS),
      week_start
    }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn weeks(&self) -> u32 {
    self.weeks
  }

  pub fn week_start(&self) -> WeekStart {
    self.week_start
  }

  pub fn day_count(&self) -> i64 {
    i64::from(self.weeks) * 7
  }

  /// Last rendered day, inclusive.
  pub fn end(&self) -> NaiveDate {
    add_days(
      self.start,
      self.day_count() - 1
    )
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date >= self.start
      && date <= self.end()
  }

  pub fn days(
    &self
  ) -> impl Iterator<Item = NaiveDate>
  {
    let start = self.start;
    (0..self.day_count())
      .map(move |offset| {
        add_days(start, offset)
      })
  }

  #[must_use]
  pub fn shifted_by_weeks(
    &self,
    weeks: i64
  ) -> Self {
    Self::new(
      offset_by_weeks(self.start, weeks),
      self.weeks,
      self.week_start
    )
  }

  #[must_use]
  pub fn starting_at(
    &self,
    anchor: NaiveDate
  ) -> Self {
    Self::new(
      anchor,
      self.weeks,
      self.week_start
    )
  }

  #[must_use]
  pub fn with_weeks(
    &self,
    weeks: u32
  ) -> Self {
    Self::new(
      self.start,
      weeks,
      self.week_start
    )
  }
}

use tracing::{
  debug,
  trace
};

use crate::datetime::MAX_WEEKS;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum FilterName {
  Status,
  Category,
  Tag,
  Author,
  PostType,
  Weeks
}

impl FilterName {
  pub const ALL: [FilterName; 6] = [
    FilterName::Status,
    FilterName::Category,
    FilterName::Tag,
    FilterName::Author,
    FilterName::PostType,
    FilterName::Weeks
  ];

  /// Accepts the filter bar's event
  /// names.
  pub fn from_key(
    raw: &str
  ) -> Option<Self> {
    match raw.trim() {
      | "status" => Some(Self::Status),
      | "category" => {
        Some(Self::Category)
      }
      | "tag" => Some(Self::Tag),
      | "author" => Some(Self::Author),
      | "postType" | "post_type"
      | "posttype" => {
        Some(Self::PostType)
      }
      | "weeks" => Some(Self::Weeks),
      | _ => None
    }
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Status => "status",
      | Self::Category => "category",
      | Self::Tag => "tag",
      | Self::Author => "author",
      | Self::PostType => "postType",
      | Self::Weeks => "weeks"
    }
  }

  /// Query-string parameter sent to the
  /// bulk read endpoint.
  pub fn query_param(
    self
  ) -> &'static str {
    match self {
      | Self::Status => "post_status",
      | Self::Category => "category",
      | Self::Tag => "post_tag",
      | Self::Author => "post_author",
      | Self::PostType => "post_type",
      | Self::Weeks => "weeks"
    }
  }
}

/// One-shot value that accompanies a
/// single fetch and always wins for the
/// field it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOverride {
  pub name:  FilterName,
  pub value: Option<String>
}

impl FilterOverride {
  pub fn weeks(&self) -> Option<u32> {
    if self.name != FilterName::Weeks {
      return None;
    }
    self
      .value
      .as_deref()
      .and_then(|raw| raw.parse().ok())
      .filter(|weeks: &u32| *weeks > 0)
  }
}

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct FilterSet {
  status:    Option<String>,
  category:  Option<String>,
  tag:       Option<String>,
  author:    Option<String>,
  post_type: Option<String>,
  weeks:     Option<u32>
}

impl FilterSet {
  pub fn get(
    &self,
    name: FilterName
  ) -> Option<String> {
    match name {
      | FilterName::Weeks => {
        self.weeks.map(|w| w.to_string())
      }
      | other => {
        self.slot(other).cloned().flatten()
      }
    }
  }

  pub fn weeks(&self) -> Option<u32> {
    self.weeks
  }

  pub fn is_empty(&self) -> bool {
    FilterName::ALL
      .iter()
      .all(|name| self.get(*name).is_none())
  }

  /// Value used for `name` in a request,
  /// letting `pending` take precedence for
  /// the field it targets.
  pub fn resolve(
    &self,
    name: FilterName,
    pending: Option<&FilterOverride>
  ) -> Option<String> {
    match pending {
      | Some(pending)
        if pending.name == name =>
      {
        pending.value.clone()
      }
      | _ => self.get(name)
    }
  }

  /// Stores a filter bar change and
  /// returns the override to send with the
  /// refetch it causes. Empty values clear
  /// the field; `weeks` is sanitized.
  #[tracing::instrument(skip(self))]
  pub fn apply_change(
    &mut self,
    name: FilterName,
    value: Option<&str>,
    default_weeks: u32
  ) -> FilterOverride {
    if name == FilterName::Weeks {
      let weeks =
        sanitize_weeks(value, default_weeks);
      self.weeks = Some(weeks);
      debug!(weeks, "weeks filter applied");
      return FilterOverride {
        name,
        value: Some(weeks.to_string())
      };
    }

    let normalized = value
      .map(str::trim)
      .filter(|raw| !raw.is_empty())
      .map(str::to_string);
    trace!(
      filter = name.as_key(),
      value = ?normalized,
      "filter applied"
    );
    if let Some(slot) = self.slot_mut(name)
    {
      *slot = normalized.clone();
    }

    FilterOverride {
      name,
      value: normalized
    }
  }

  fn slot(
    &self,
    name: FilterName
  ) -> Option<&Option<String>> {
    match name {
      | FilterName::Status => {
        Some(&self.status)
      }
      | FilterName::Category => {
        Some(&self.category)
      }
      | FilterName::Tag => Some(&self.tag),
      | FilterName::Author => {
        Some(&self.author)
      }
      | FilterName::PostType => {
        Some(&self.post_type)
      }
      | FilterName::Weeks => None
    }
  }

  fn slot_mut(
    &mut self,
    name: FilterName
  ) -> Option<&mut Option<String>> {
    match name {
      | FilterName::Status => {
        Some(&mut self.status)
      }
      | FilterName::Category => {
        Some(&mut self.category)
      }
      | FilterName::Tag => {
        Some(&mut self.tag)
      }
      | FilterName::Author => {
        Some(&mut self.author)
      }
      | FilterName::PostType => {
        Some(&mut self.post_type)
      }
      | FilterName::Weeks => None
    }
  }
}

/// Integer coercion with the filter bar's
/// leniency: leading digits count, while
/// zero, negatives and garbage fall back
/// to `default_weeks`. Results never
/// exceed [`MAX_WEEKS`].
pub fn sanitize_weeks(
  raw: Option<&str>,
  default_weeks: u32
) -> u32 {
  let fallback =
    default_weeks.clamp(1, MAX_WEEKS);
  let Some(raw) = raw else {
    return fallback;
  };

  let trimmed = raw.trim();
  let digits: String = trimmed
    .chars()
    .take_while(char::is_ascii_digit)
    .collect();

  match digits.parse::<u32>() {
    | Ok(weeks) if weeks > MAX_WEEKS => {
      debug!(
        weeks,
        max = MAX_WEEKS,
        "weeks value clamped"
      );
      MAX_WEEKS
    }
    | Ok(weeks) if weeks > 0 => weeks,
    | Err(_) if !digits.is_empty() => {
      debug!(
        raw = %trimmed,
        max = MAX_WEEKS,
        "weeks value overflowed; clamped"
      );
      MAX_WEEKS
    }
    | _ => {
      debug!(
        raw = %trimmed,
        fallback,
        "invalid weeks value; using default"
      );
      fallback
    }
  }
}

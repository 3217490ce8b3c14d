use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::{
  MAX_WEEKS,
  WeekStart,
  parse_timezone,
  today_in_timezone
};

pub const CONFIG_FILE_NAME: &str =
  "almanac.toml";
pub const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
pub const NONCE_ENV_VAR: &str =
  "ALMANAC_NONCE";
pub const AJAX_URL_ENV_VAR: &str =
  "ALMANAC_AJAX_URL";

const DEFAULT_NUMBER_OF_WEEKS: u32 = 5;
const DEFAULT_MAX_VISIBLE_ITEMS: usize =
  4;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
)]
pub struct CalendarConfig {
  #[serde(default)]
  pub server:   ServerConfig,
  #[serde(default)]
  pub calendar: CalendarSection
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct ServerConfig {
  #[serde(default = "default_ajax_url")]
  pub ajax_url:         String,
  #[serde(default)]
  pub nonce:            String,
  #[serde(
    default = "default_action_get_data"
  )]
  pub action_get_data:  String,
  #[serde(
    default = "default_action_move_item"
  )]
  pub action_move_item: String,
  #[serde(
    default = "default_action_get_item"
  )]
  pub action_get_item:  String,
  #[serde(
    default = "default_timeout_secs"
  )]
  pub timeout_secs:     u64
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      ajax_url:         default_ajax_url(),
      nonce:            String::new(),
      action_get_data:
        default_action_get_data(),
      action_move_item:
        default_action_move_item(),
      action_get_item:
        default_action_get_item(),
      timeout_secs:
        default_timeout_secs()
    }
  }
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CalendarSection {
  #[serde(default = "default_week_start")]
  pub week_start:        String,
  #[serde(
    default = "default_number_of_weeks"
  )]
  pub number_of_weeks:   u32,
  #[serde(
    default = "default_max_visible_items"
  )]
  pub max_visible_items: usize,
  #[serde(default = "default_timezone")]
  pub timezone:          String,
  #[serde(default = "default_true")]
  pub can_create_items:  bool,
  #[serde(default = "default_theme")]
  pub theme:             String,
  #[serde(
    default = "default_time_format"
  )]
  pub time_format:       String
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      week_start:        default_week_start(
      ),
      number_of_weeks:
        default_number_of_weeks(),
      max_visible_items:
        default_max_visible_items(),
      timezone:          default_timezone(),
      can_create_items:  true,
      theme:             default_theme(),
      time_format:
        default_time_format()
    }
  }
}

fn default_true() -> bool {
  true
}

fn default_ajax_url() -> String {
  "http://localhost/wp-admin/admin-ajax.php"
    .to_string()
}

fn default_action_get_data() -> String {
  "publishpress_calendar_get_data"
    .to_string()
}

fn default_action_move_item() -> String {
  "publishpress_calendar_move_item"
    .to_string()
}

fn default_action_get_item() -> String {
  "publishpress_calendar_get_post_data"
    .to_string()
}

fn default_timeout_secs() -> u64 {
  DEFAULT_TIMEOUT_SECS
}

fn default_week_start() -> String {
  WeekStart::Monday.as_key().to_string()
}

fn default_number_of_weeks() -> u32 {
  DEFAULT_NUMBER_OF_WEEKS
}

fn default_max_visible_items() -> usize {
  DEFAULT_MAX_VISIBLE_ITEMS
}

fn default_timezone() -> String {
  DEFAULT_TIMEZONE.to_string()
}

fn default_theme() -> String {
  "light".to_string()
}

fn default_time_format() -> String {
  "%H:%M".to_string()
}

impl CalendarConfig {
  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<CalendarConfig>(raw)
        .context(
          "failed parsing calendar config"
        )?;
    sanitize_calendar_config(&mut config);
    Ok(config)
  }

  /// Loads the config file (explicit
  /// path, `ALMANAC_CONFIG`, then the user
  /// config dir) and applies env
  /// overrides.
  #[tracing::instrument(skip(
    path_override
  ))]
  pub fn load(
    path_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut config =
      match resolve_config_path(
        path_override
      ) {
        | Some(path) => {
          info!(
            file = %path.display(),
            "loading calendar config"
          );
          let raw = fs::read_to_string(
            &path
          )
          .with_context(|| {
            format!(
              "failed to read {}",
              path.display()
            )
          })?;
          Self::from_toml_str(&raw)
            .with_context(|| {
              format!(
                "invalid config file {}",
                path.display()
              )
            })?
        }
        | None => {
          warn!(
            "no calendar config found; \
             using defaults"
          );
          Self::default()
        }
      };

    config.apply_overrides(
      std::env::vars().filter(|(key, _)| {
        key == NONCE_ENV_VAR
          || key == AJAX_URL_ENV_VAR
      })
    );
    Ok(config)
  }

  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      match key.as_str() {
        | NONCE_ENV_VAR => {
          debug!("nonce overridden");
          self.server.nonce = value;
        }
        | AJAX_URL_ENV_VAR => {
          debug!(url = %value, "ajax url overridden");
          self.server.ajax_url = value;
        }
        | other => {
          debug!(
            key = other,
            "ignoring unknown override"
          );
        }
      }
    }
  }

  pub fn week_start(&self) -> WeekStart {
    WeekStart::parse(
      &self.calendar.week_start
    )
    .unwrap_or_default()
  }

  pub fn timezone(&self) -> Tz {
    parse_timezone(
      &self.calendar.timezone,
      "calendar.timezone"
    )
    .unwrap_or(chrono_tz::UTC)
  }

  pub fn today(&self) -> NaiveDate {
    today_in_timezone(self.timezone())
  }
}

fn sanitize_calendar_config(
  config: &mut CalendarConfig
) {
  if WeekStart::parse(
    &config.calendar.week_start
  )
  .is_none()
  {
    warn!(
      week_start = %config.calendar.week_start,
      "unknown week start; using monday"
    );
    config.calendar.week_start =
      default_week_start();
  }

  if config.calendar.number_of_weeks == 0
  {
    config.calendar.number_of_weeks =
      default_number_of_weeks();
  }
  if config.calendar.number_of_weeks
    > MAX_WEEKS
  {
    warn!(
      number_of_weeks =
        config.calendar.number_of_weeks,
      max = MAX_WEEKS,
      "number_of_weeks too large; clamping"
    );
    config.calendar.number_of_weeks =
      MAX_WEEKS;
  }

  if config.calendar.max_visible_items
    == 0
  {
    config.calendar.max_visible_items =
      default_max_visible_items();
  }

  if parse_timezone(
    &config.calendar.timezone,
    "calendar.timezone"
  )
  .is_none()
  {
    config.calendar.timezone =
      default_timezone();
  }

  if config.server.timeout_secs == 0 {
    config.server.timeout_secs =
      default_timeout_secs();
  }
}

fn resolve_config_path(
  path_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = path_override {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(trimmed));
    }
  }

  dirs::config_dir()
    .map(|dir| {
      dir
        .join("almanac")
        .join(CONFIG_FILE_NAME)
    })
    .filter(|path| path.exists())
}

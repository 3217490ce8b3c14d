//! `admin-ajax` style HTTP implementation
//! of [`CalendarBackend`].

pub mod parse;

use std::time::Duration;

use almanac_core::CalendarBackend;
use almanac_core::config::ServerConfig;
use almanac_core::error::{
  CalendarError,
  CalendarResult
};
use almanac_shared::{
  CalendarQuery,
  ItemDetail,
  ItemId,
  ItemsByDate,
  MoveItemArgs
};
use anyhow::Context;
use tracing::{
  debug,
  warn
};

pub use parse::{
  parse_detail,
  parse_items
};

#[derive(Debug, Clone)]
pub struct HttpBackend {
  client: reqwest::Client,
  server: ServerConfig
}

impl HttpBackend {
  pub fn new(
    server: &ServerConfig
  ) -> anyhow::Result<Self> {
    let client =
      reqwest::Client::builder()
        .timeout(Duration::from_secs(
          server.timeout_secs
        ))
        .build()
        .context(
          "failed building HTTP client \
           for calendar backend"
        )?;
    Ok(Self {
      client,
      server: server.clone()
    })
  }

  /// Every request carries the action
  /// name and the nonce in its query
  /// string.
  pub fn action_pairs(
    &self,
    action: &str
  ) -> Vec<(String, String)> {
    vec![
      (
        "action".to_string(),
        action.to_string()
      ),
      (
        "nonce".to_string(),
        self.server.nonce.clone()
      ),
    ]
  }

  async fn read_body(
    &self,
    request: reqwest::RequestBuilder,
    action: &str
  ) -> CalendarResult<String> {
    let response = request
      .send()
      .await
      .map_err(|error| {
        warn!(
          action,
          error = %error,
          "calendar request failed"
        );
        CalendarError::NetworkFailure(
          format!("{action}: {error}")
        )
      })?;

    let status = response.status();
    let body =
      response.text().await.map_err(
        |error| {
          CalendarError::NetworkFailure(
            format!(
              "{action}: failed reading \
               body: {error}"
            )
          )
        }
      )?;

    if !status.is_success() {
      warn!(
        action,
        status = %status,
        "calendar endpoint returned \
         non-success status"
      );
      return Err(
        CalendarError::NetworkFailure(
          format!(
            "{action}: HTTP {status}"
          )
        )
      );
    }

    debug!(
      action,
      bytes = body.len(),
      "calendar response received"
    );
    Ok(body)
  }
}

impl CalendarBackend for HttpBackend {
  async fn fetch_calendar(
    &self,
    query: CalendarQuery
  ) -> CalendarResult<ItemsByDate> {
    let action =
      self.server.action_get_data.as_str();
    let mut pairs =
      self.action_pairs(action);
    pairs.extend(query.pairs());

    let request = self
      .client
      .get(self.server.ajax_url.as_str())
      .query(&pairs);
    let body =
      self.read_body(request, action).await?;
    parse_items(&body)
  }

  async fn fetch_item_detail(
    &self,
    id: ItemId
  ) -> CalendarResult<ItemDetail> {
    let action =
      self.server.action_get_item.as_str();
    let mut pairs =
      self.action_pairs(action);
    pairs.push((
      "id".to_string(),
      id.to_string()
    ));

    let request = self
      .client
      .get(self.server.ajax_url.as_str())
      .query(&pairs);
    let body =
      self.read_body(request, action).await?;
    parse_detail(&body)
  }

  async fn move_item(
    &self,
    args: MoveItemArgs
  ) -> CalendarResult<()> {
    let action =
      self.server.action_move_item.as_str();
    let request = self
      .client
      .post(self.server.ajax_url.as_str())
      .query(&self.action_pairs(action))
      .form(&args.pairs());

    // The body is never inspected; a 2xx
    // reply is a completed move.
    self.read_body(request, action).await?;
    Ok(())
  }
}

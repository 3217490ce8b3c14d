//! Runs a [`CalendarModel`] inside one
//! tokio task. All state mutation happens
//! on that task; UI events and backend
//! results are marshalled onto it through
//! channels.

use std::sync::Arc;

use almanac_shared::ItemId;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::{
  mpsc,
  oneshot,
  watch
};
use tokio::task::JoinHandle;
use tracing::{
  debug,
  info,
  trace
};

use crate::backend::CalendarBackend;
use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::filter::FilterName;
use crate::model::{
  CalendarCmd,
  CalendarModel,
  CalendarMsg,
  CalendarSnapshot,
  Key,
  Navigation
};
use crate::reschedule::{
  DragDecision,
  DropEvent
};

#[derive(Debug)]
enum ControllerEvent {
  Msg {
    msg:       CalendarMsg,
    processed:
      Option<oneshot::Sender<CalendarSnapshot>>
  },
  DragStart {
    id:    ItemId,
    reply: oneshot::Sender<DragDecision>
  }
}

enum Lifecycle {
  Ready {
    model:     Box<CalendarModel>,
    publisher: watch::Sender<CalendarSnapshot>
  },
  Mounted {
    handle: ControllerHandle,
    task:   JoinHandle<()>
  },
  Unmounted
}

/// Owns a calendar model and the backend
/// it talks to. `mount` starts listening
/// exactly once, `unmount` stops exactly
/// once. The running task owns the only
/// snapshot sender, so observers see the
/// channel close once it is gone.
pub struct CalendarController<B> {
  backend:   Arc<B>,
  lifecycle: Mutex<Lifecycle>,
  snapshot:  watch::Receiver<CalendarSnapshot>
}

impl<B> CalendarController<B>
where
  B: CalendarBackend
{
  pub fn new(
    model: CalendarModel,
    backend: B
  ) -> Self {
    let (publisher, snapshot) =
      watch::channel(model.snapshot());
    Self {
      backend: Arc::new(backend),
      lifecycle: Mutex::new(
        Lifecycle::Ready {
          model: Box::new(model),
          publisher
        }
      ),
      snapshot
    }
  }

  /// Spawns the controller task. Calling
  /// it again while mounted returns the
  /// existing handle. Must run inside a
  /// tokio runtime.
  pub fn mount(
    &self
  ) -> CalendarResult<ControllerHandle> {
    let mut lifecycle = self.lifecycle.lock();
    let (mut model, publisher) =
      match std::mem::replace(
        &mut *lifecycle,
        Lifecycle::Unmounted
      ) {
        | Lifecycle::Ready {
          model,
          publisher
        } => (model, publisher),
        | Lifecycle::Mounted {
          handle,
          task
        } => {
          debug!(
            "calendar already mounted"
          );
          let existing = handle.clone();
          *lifecycle = Lifecycle::Mounted {
            handle,
            task
          };
          return Ok(existing);
        }
        | Lifecycle::Unmounted => {
          return Err(
            CalendarError::Unmounted
          );
        }
      };

    let initial = model.start();
    publisher.send_replace(model.snapshot());

    let (events_tx, events_rx) =
      mpsc::unbounded_channel();
    let handle = ControllerHandle {
      events:   events_tx,
      snapshot: self.snapshot.clone()
    };
    let task = tokio::spawn(run_actor(
      *model,
      initial,
      Arc::clone(&self.backend),
      events_rx,
      publisher
    ));
    info!("calendar mounted");

    *lifecycle = Lifecycle::Mounted {
      handle: handle.clone(),
      task
    };
    Ok(handle)
  }

  /// Stops the controller task. Returns
  /// false when it was not mounted. The
  /// task drops the snapshot sender as it
  /// is torn down, which fails every
  /// pending `wait_for` with `Unmounted`.
  pub fn unmount(&self) -> bool {
    let mut lifecycle = self.lifecycle.lock();
    match std::mem::replace(
      &mut *lifecycle,
      Lifecycle::Unmounted
    ) {
      | Lifecycle::Mounted {
        task, ..
      } => {
        task.abort();
        info!("calendar unmounted");
        true
      }
      | ready @ Lifecycle::Ready { .. } => {
        *lifecycle = ready;
        false
      }
      | Lifecycle::Unmounted => false
    }
  }

  pub fn is_mounted(&self) -> bool {
    matches!(
      *self.lifecycle.lock(),
      Lifecycle::Mounted { .. }
    )
  }

  pub fn snapshot(
    &self
  ) -> CalendarSnapshot {
    self.snapshot.borrow().clone()
  }
}

impl<B> Drop for CalendarController<B> {
  fn drop(&mut self) {
    if let Lifecycle::Mounted {
      task, ..
    } = &*self.lifecycle.lock()
    {
      task.abort();
    }
  }
}

/// Cheap, cloneable entry point used by
/// the view and input sources.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
  events:   mpsc::UnboundedSender<
    ControllerEvent
  >,
  snapshot: watch::Receiver<
    CalendarSnapshot
  >
}

impl ControllerHandle {
  /// Queues `msg` without waiting for it
  /// to be applied.
  pub fn send(
    &self,
    msg: CalendarMsg
  ) -> CalendarResult<()> {
    self
      .events
      .send(ControllerEvent::Msg {
        msg,
        processed: None
      })
      .map_err(|_| CalendarError::Unmounted)
  }

  /// Queues `msg` and resolves with the
  /// snapshot taken right after it was
  /// applied.
  pub async fn dispatch(
    &self,
    msg: CalendarMsg
  ) -> CalendarResult<CalendarSnapshot> {
    let (processed, snapshot) =
      oneshot::channel();
    self
      .events
      .send(ControllerEvent::Msg {
        msg,
        processed: Some(processed)
      })
      .map_err(|_| CalendarError::Unmounted)?;
    snapshot
      .await
      .map_err(|_| CalendarError::Unmounted)
  }

  pub fn navigate(
    &self,
    nav: Navigation
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::Navigate(nav))
  }

  pub fn change_filter(
    &self,
    name: FilterName,
    value: Option<&str>
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::FilterChanged {
      name,
      value: value.map(str::to_string)
    })
  }

  pub fn click_item(
    &self,
    id: ItemId
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::ClickItem(id))
  }

  pub fn click_empty_cell(
    &self,
    date: NaiveDate
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::ClickEmptyCell(
      date
    ))
  }

  pub fn refresh_item_popup(
    &self
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::RefreshItemPopup)
  }

  pub fn key_down(
    &self,
    key: Key
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::KeyDown(key))
  }

  pub fn drag_hover(
    &self,
    date: NaiveDate
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::DragHover(date))
  }

  pub fn drag_stop(
    &self
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::DragStop)
  }

  pub fn drop_item(
    &self,
    drop: DropEvent
  ) -> CalendarResult<()> {
    self.send(CalendarMsg::Drop(drop))
  }

  /// Asks whether `id` may start
  /// dragging.
  pub async fn drag_start(
    &self,
    id: ItemId
  ) -> CalendarResult<DragDecision> {
    let (reply, decision) =
      oneshot::channel();
    self
      .events
      .send(ControllerEvent::DragStart {
        id,
        reply
      })
      .map_err(|_| CalendarError::Unmounted)?;
    decision
      .await
      .map_err(|_| CalendarError::Unmounted)
  }

  pub fn snapshot(
    &self
  ) -> CalendarSnapshot {
    self.snapshot.borrow().clone()
  }

  pub fn subscribe(
    &self
  ) -> watch::Receiver<CalendarSnapshot> {
    self.snapshot.clone()
  }

  /// Resolves with the first snapshot
  /// satisfying `ready`, or `Unmounted`
  /// once the controller task is gone.
  pub async fn wait_for<F>(
    &self,
    ready: F
  ) -> CalendarResult<CalendarSnapshot>
  where
    F: FnMut(&CalendarSnapshot) -> bool
  {
    if self.events.is_closed() {
      return Err(CalendarError::Unmounted);
    }
    let mut receiver = self.snapshot.clone();
    let snapshot = receiver
      .wait_for(ready)
      .await
      .map_err(|_| CalendarError::Unmounted)?;
    Ok(snapshot.clone())
  }

  /// Resolves once no request of any kind
  /// is pending.
  pub async fn settled(
    &self
  ) -> CalendarResult<CalendarSnapshot> {
    self
      .wait_for(CalendarSnapshot::is_settled)
      .await
  }
}

async fn run_actor<B>(
  mut model: CalendarModel,
  initial: Vec<CalendarCmd>,
  backend: Arc<B>,
  mut events: mpsc::UnboundedReceiver<
    ControllerEvent
  >,
  snapshot: watch::Sender<CalendarSnapshot>
) where
  B: CalendarBackend
{
  let (results_tx, mut results) =
    mpsc::unbounded_channel();

  execute(&backend, &results_tx, initial);

  loop {
    let event = tokio::select! {
      event = events.recv() => match event {
        | Some(event) => event,
        | None => break
      },
      Some(msg) = results.recv() => {
        ControllerEvent::Msg {
          msg,
          processed: None
        }
      }
    };

    match event {
      | ControllerEvent::Msg {
        msg,
        processed
      } => {
        trace!(?msg, "calendar message");
        let cmds = model.update(msg);
        execute(&backend, &results_tx, cmds);
        let current = model.snapshot();
        if let Some(processed) = processed {
          let _ = processed.send(current.clone());
        }
        snapshot.send_replace(current);
        continue;
      }
      | ControllerEvent::DragStart {
        id,
        reply
      } => {
        let decision = model.begin_drag(id);
        if reply.send(decision).is_err() {
          debug!(
            item_id = %id,
            "drag start requester went away"
          );
        }
      }
    }

    snapshot.send_replace(model.snapshot());
  }

  debug!("calendar event loop finished");
}

fn execute<B>(
  backend: &Arc<B>,
  results: &mpsc::UnboundedSender<
    CalendarMsg
  >,
  cmds: Vec<CalendarCmd>
) where
  B: CalendarBackend
{
  for cmd in cmds {
    let backend = Arc::clone(backend);
    let results = results.clone();
    tokio::spawn(async move {
      let msg = match cmd {
        | CalendarCmd::FetchCalendar {
          ticket,
          query
        } => CalendarMsg::CalendarLoaded {
          ticket,
          result: backend
            .fetch_calendar(query)
            .await
        },
        | CalendarCmd::FetchDetail {
          ticket
        } => CalendarMsg::DetailLoaded {
          ticket,
          result: backend
            .fetch_item_detail(ticket.id)
            .await
        },
        | CalendarCmd::MoveItem { args } => {
          CalendarMsg::MoveFinished {
            args,
            result: backend
              .move_item(args)
              .await
          }
        }
      };
      if results.send(msg).is_err() {
        trace!(
          "controller gone before response arrived"
        );
      }
    });
  }
}

use almanac_core::{
    CalendarMsg, CalendarSnapshot, ControllerHandle, DropEvent, FilterName, Key, Navigation,
};
use almanac_shared::ItemId;
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::render::Renderer;

pub const HELP: &str = "\
commands:
  next | prev                 move one week
  next-page | prev-page       move one page
  today | refresh             jump to today, reload
  filter <name> [value]       status, category, tag, author, postType, weeks
  open <id>                   show item detail
  new <date>                  open the creation form
  edit                        reload the open item
  esc                         close the overlay
  hover <date>                mark a drop target
  move <date> <index> <dest>  drag an item to another day
  show | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Dispatch(CalendarMsg),
    Move { drop: DropEvent },
    Show,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest = words.collect::<Vec<_>>();

        let command = match (head, rest.as_slice()) {
            ("next", []) => nav(Navigation::Forward),
            ("prev", []) => nav(Navigation::Back),
            ("next-page", []) => nav(Navigation::ForwardPage),
            ("prev-page", []) => nav(Navigation::BackPage),
            ("today", []) => nav(Navigation::Today),
            ("refresh", []) => nav(Navigation::Refresh),
            ("filter", [name, value @ ..]) => {
                let name = FilterName::from_key(name)
                    .ok_or_else(|| anyhow!("unknown filter: {name}"))?;
                Self::Dispatch(CalendarMsg::FilterChanged {
                    name,
                    value: (!value.is_empty()).then(|| value.join(" ")),
                })
            }
            ("open", [id]) => {
                let id = id
                    .parse::<ItemId>()
                    .with_context(|| format!("invalid item id: {id}"))?;
                Self::Dispatch(CalendarMsg::ClickItem(id))
            }
            ("new", [date]) => Self::Dispatch(CalendarMsg::ClickEmptyCell(parse_date(date)?)),
            ("edit", []) => Self::Dispatch(CalendarMsg::RefreshItemPopup),
            ("esc", []) => Self::Dispatch(CalendarMsg::KeyDown(Key::Escape)),
            ("hover", [date]) => Self::Dispatch(CalendarMsg::DragHover(parse_date(date)?)),
            ("move", [source, index, destination]) => {
                let index = index
                    .parse::<usize>()
                    .with_context(|| format!("invalid index: {index}"))?;
                let source_key = parse_date(source)?.format("%Y-%m-%d").to_string();
                Self::Move {
                    drop: DropEvent::new(&source_key, index, parse_date(destination)?),
                }
            }
            ("show", []) => Self::Show,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            (other, _) => bail!("unrecognized command: {line} (`{other}`; try `help`)"),
        };
        Ok(Some(command))
    }
}

fn nav(navigation: Navigation) -> ShellCommand {
    ShellCommand::Dispatch(CalendarMsg::Navigate(navigation))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got: {raw}"))
}

/// Resolves `drop` the way a drag library would: ask the guard first,
/// then report the drop.
pub async fn drag_and_drop(
    handle: &ControllerHandle,
    drop: DropEvent,
) -> anyhow::Result<CalendarSnapshot> {
    let current = handle.snapshot();
    let item = current
        .index
        .get(&drop.source_date_key, drop.source_index)
        .ok_or_else(|| {
            anyhow!(
                "no item at {}[{}]",
                drop.source_date_key,
                drop.source_index
            )
        })?;

    if !handle.drag_start(item.id).await?.is_allowed() {
        bail!("item {} is open; close it before moving", item.id);
    }
    if let Some(destination) = drop.destination() {
        handle.drag_hover(destination)?;
    }
    handle.dispatch(CalendarMsg::Drop(drop)).await?;
    Ok(handle.settled().await?)
}

#[tracing::instrument(skip_all)]
pub async fn run_shell(handle: &ControllerHandle, renderer: &Renderer) -> anyhow::Result<()> {
    renderer.print_snapshot(&handle.settled().await?)?;
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("error: {err:#}");
                continue;
            }
        };
        debug!(?command, "shell command");

        let snapshot = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ShellCommand::Show => handle.snapshot(),
            ShellCommand::Dispatch(msg) => {
                handle.dispatch(msg).await?;
                handle.settled().await?
            }
            ShellCommand::Move { drop } => match drag_and_drop(handle, drop).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    eprintln!("error: {err:#}");
                    continue;
                }
            },
        };
        renderer.print_snapshot(&snapshot)?;
    }

    info!("shell finished");
    Ok(())
}

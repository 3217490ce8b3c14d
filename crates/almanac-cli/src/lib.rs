pub mod cli;
pub mod render;
pub mod shell;

use std::ffi::OsString;

use almanac_core::config::CalendarConfig;
use almanac_core::datetime::{format_for_query, parse_date_key};
use almanac_core::{
    CalendarController, CalendarModel, CalendarMsg, CalendarProps, CalendarSnapshot, DetailStatus,
    DropEvent, Overlay,
};
use almanac_http::HttpBackend;
use almanac_shared::ItemId;
use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Command, GlobalCli, ViewArgs};
use crate::render::Renderer;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = GlobalCli::parse_from(raw_args);
    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting almanac CLI"
    );

    let cfg = CalendarConfig::load(cli.config.as_deref())?;
    debug!(ajax_url = %cfg.server.ajax_url, "calendar endpoint");
    let backend = HttpBackend::new(&cfg.server)?;
    let renderer = Renderer::new(&cfg);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(execute(cli.command, cfg, backend, renderer))
}

async fn execute(
    command: Command,
    cfg: CalendarConfig,
    backend: HttpBackend,
    renderer: Renderer,
) -> anyhow::Result<()> {
    match command {
        Command::Show { view } => {
            let controller = build_controller(&cfg, &view, backend);
            let handle = controller.mount()?;
            let snapshot = handle.settled().await?;
            renderer.print_snapshot(&snapshot)?;
            controller.unmount();
            fail_on_error(&snapshot)
        }
        Command::Item { id } => {
            let controller = build_controller(&cfg, &ViewArgs::default(), backend);
            let handle = controller.mount()?;
            handle.settled().await?;
            handle.dispatch(CalendarMsg::ClickItem(ItemId(id))).await?;
            let snapshot = handle.settled().await?;
            controller.unmount();
            print_opened_item(&renderer, &snapshot.overlay)
        }
        Command::Move {
            source_date,
            index,
            destination,
            view,
        } => {
            let source = parse_date_key(&source_date)
                .with_context(|| format!("invalid source date: {source_date}"))?;
            let controller = build_controller(&cfg, &view, backend);
            let handle = controller.mount()?;
            handle.settled().await?;

            let drop = DropEvent::new(&format_for_query(source), index, destination);
            let snapshot = shell::drag_and_drop(&handle, drop).await?;
            renderer.print_snapshot(&snapshot)?;
            controller.unmount();
            fail_on_error(&snapshot)
        }
        Command::Shell { view } => {
            let controller = build_controller(&cfg, &view, backend);
            let handle = controller.mount()?;
            let result = shell::run_shell(&handle, &renderer).await;
            controller.unmount();
            result
        }
    }
}

fn build_controller(
    cfg: &CalendarConfig,
    view: &ViewArgs,
    backend: HttpBackend,
) -> CalendarController<HttpBackend> {
    let mut model = CalendarModel::new(CalendarProps::from_config(cfg, view.start));
    for (name, value) in view.filters() {
        model.preset_filter(name, value);
    }
    CalendarController::new(model, backend)
}

fn print_opened_item(renderer: &Renderer, overlay: &Overlay) -> anyhow::Result<()> {
    match overlay {
        Overlay::Viewing(viewing) => match &viewing.detail {
            DetailStatus::Loaded(detail) => renderer.print_detail(detail),
            DetailStatus::Failed(message) => bail!("item {}: {message}", viewing.id),
            DetailStatus::Loading => bail!("item {} did not load", viewing.id),
        },
        other => bail!("item overlay did not open: {other:?}"),
    }
}

fn fail_on_error(snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
    match &snapshot.last_error {
        Some(error) => bail!("calendar request failed: {error}"),
        None => Ok(()),
    }
}

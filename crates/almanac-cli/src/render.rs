use std::io::{self, IsTerminal, Write};

use almanac_core::view::{month_label, CalendarGrid, DayCell};
use almanac_core::{CalendarConfig, CalendarSnapshot, DetailStatus, Overlay};
use almanac_shared::{CalendarItem, ItemDetail};
use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDateTime};
use serde_json::Value;
use tracing::warn;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CELL_WIDTH: usize = 16;
const DEFAULT_TIME_FORMAT: &str = "%H:%M";
const ITEM_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    dark: bool,
    time_format: String,
}

impl Renderer {
    pub fn new(cfg: &CalendarConfig) -> Self {
        Self {
            color: io::stdout().is_terminal(),
            dark: cfg.calendar.theme.eq_ignore_ascii_case("dark"),
            time_format: checked_time_format(&cfg.calendar.time_format),
        }
    }

    pub fn plain(cfg: &CalendarConfig) -> Self {
        Self {
            color: false,
            ..Self::new(cfg)
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_snapshot(&self, snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_snapshot(&mut out, snapshot)
    }

    pub fn write_snapshot<W: Write>(
        &self,
        mut out: W,
        snapshot: &CalendarSnapshot,
    ) -> anyhow::Result<()> {
        let grid = CalendarGrid::from_snapshot(snapshot);
        writeln!(
            out,
            "{} .. {} ({} weeks)",
            snapshot.window.start(),
            snapshot.window.end(),
            snapshot.window.weeks()
        )?;
        self.write_grid(&mut out, &grid)?;
        self.write_overlay(&mut out, &snapshot.overlay)?;

        if let Some(message) = &grid.loading_message {
            writeln!(out, "{message}")?;
        }
        if let Some(error) = &snapshot.last_error {
            writeln!(out, "{}", self.paint(&format!("error: {error}"), "31"))?;
        }
        Ok(())
    }

    pub fn write_grid<W: Write>(&self, mut out: W, grid: &CalendarGrid) -> anyhow::Result<()> {
        for label in grid.labels {
            write!(out, "{} ", fit(label, CELL_WIDTH))?;
        }
        writeln!(out)?;
        for _ in grid.labels {
            write!(out, "{:-<width$} ", "", width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for row in &grid.rows {
            for cell in &row.cells {
                let heading = fit(&day_heading(cell), CELL_WIDTH);
                let heading = if cell.is_today {
                    self.paint(&heading, if self.dark { "1;96" } else { "1;34" })
                } else {
                    heading
                };
                write!(out, "{heading} ")?;
            }
            writeln!(out)?;

            let height = row
                .cells
                .iter()
                .map(|cell| cell.visible.len() + usize::from(cell.hidden_count > 0))
                .max()
                .unwrap_or(0);
            for line in 0..height {
                for cell in &row.cells {
                    write!(out, "{} ", fit(&self.cell_line(cell, line), CELL_WIDTH))?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_overlay<W: Write>(&self, mut out: W, overlay: &Overlay) -> anyhow::Result<()> {
        match overlay {
            Overlay::Closed => {}
            Overlay::Creating { date } => {
                writeln!(out, "[new item on {date}]")?;
            }
            Overlay::Viewing(viewing) => match &viewing.detail {
                DetailStatus::Loading => {
                    writeln!(out, "[item {}: loading]", viewing.id)?;
                }
                DetailStatus::Failed(message) => {
                    writeln!(
                        out,
                        "{}",
                        self.paint(&format!("[item {}: {message}]", viewing.id), "31")
                    )?;
                }
                DetailStatus::Loaded(detail) => {
                    writeln!(out, "[item {}]", viewing.id)?;
                    write_detail(&mut out, detail)?;
                }
            },
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_detail(&self, detail: &ItemDetail) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        write_detail(&mut out, detail)
    }

    fn cell_line(&self, cell: &DayCell, line: usize) -> String {
        match cell.visible.get(line) {
            Some(item) => {
                let marker = if cell.opened_item == Some(item.id) {
                    ">"
                } else {
                    " "
                };
                format!("{marker}{}", self.item_label(item))
            }
            None if line == cell.visible.len() && cell.hidden_count > 0 => {
                format!(" +{} more", cell.hidden_count)
            }
            None => String::new(),
        }
    }

    fn item_label(&self, item: &CalendarItem) -> String {
        match NaiveDateTime::parse_from_str(&item.datetime, ITEM_DATETIME_FORMAT) {
            Ok(at) => format!("{} {}", at.format(&self.time_format), item.title),
            Err(_) => item.title.clone(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn checked_time_format(raw: &str) -> String {
    let invalid = StrftimeItems::new(raw).any(|item| matches!(item, Item::Error));
    if invalid {
        warn!(time_format = raw, "invalid time format; using %H:%M");
        return DEFAULT_TIME_FORMAT.to_string();
    }
    raw.to_string()
}

fn day_heading(cell: &DayCell) -> String {
    let mut heading = if cell.show_month_name {
        format!("{} {}", month_label(cell.date), cell.date.day())
    } else {
        cell.date.day().to_string()
    };
    if cell.is_hovered {
        heading.push_str(" ~");
    }
    if cell.is_loading {
        heading.push_str(" ...");
    }
    heading
}

fn write_detail<W: Write>(mut out: W, detail: &ItemDetail) -> anyhow::Result<()> {
    writeln!(out, "title     {}", detail.title)?;
    writeln!(
        out,
        "status    {}",
        detail.status.clone().unwrap_or_default()
    )?;
    for (name, value) in &detail.fields {
        writeln!(out, "{:<9} {}", name, display_value(value))?;
    }
    for (name, value) in &detail.links {
        writeln!(out, "link      {name}: {}", display_value(value))?;
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("label"))
            .or_else(|| map.get("url"))
            .map(display_value)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Truncates to `width` display columns, then pads.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0usize;
    let truncated = UnicodeWidthStr::width(text) > width;
    let budget = if truncated { width.saturating_sub(1) } else { width };

    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    if truncated {
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use almanac_core::{CalendarModel, CalendarMsg, CalendarProps, WeekStart};
    use almanac_shared::{ItemId, ItemsByDate};
    use chrono::NaiveDate;

    use super::*;

    fn snapshot_with_busy_day() -> CalendarSnapshot {
        let mut by_date = ItemsByDate::new();
        by_date.insert(
            "2024-01-03".to_string(),
            (1..=6)
                .map(|id| {
                    CalendarItem::new(id, &format!("Post {id}"), "draft", "2024-01-03 09:30:00")
                })
                .collect(),
        );
        let mut model = CalendarModel::new(CalendarProps {
            first_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            today: NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"),
            number_of_weeks: 1,
            week_start: WeekStart::Monday,
            max_visible_items: 4,
            can_create_items: true,
            initial_items: Some(by_date),
        });
        model.update(CalendarMsg::ClickEmptyCell(
            NaiveDate::from_ymd_opt(2024, 1, 5).expect("date"),
        ));
        model.snapshot()
    }

    #[test]
    fn broken_time_format_falls_back() {
        assert_eq!(checked_time_format("%Q"), "%H:%M");
        assert_eq!(checked_time_format("%I:%M %p"), "%I:%M %p");
    }

    #[test]
    fn fit_pads_and_truncates_by_display_width() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcd…");
        assert_eq!(UnicodeWidthStr::width(fit("日本語のタイトル", 6).as_str()), 6);
    }

    #[test]
    fn grid_shows_capped_items_and_overflow() {
        let renderer = Renderer::plain(&CalendarConfig::default());
        let mut out = Vec::new();
        renderer
            .write_snapshot(&mut out, &snapshot_with_busy_day())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.starts_with("2024-01-01 .. 2024-01-07 (1 weeks)"));
        assert!(text.contains("Mon"));
        assert!(text.contains("Jan 1"));
        assert!(text.contains("09:30 Post 4"));
        assert!(!text.contains("Post 5"));
        assert!(text.contains("+2 more"));
        assert!(text.contains("[new item on 2024-01-05]"));
    }

    #[test]
    fn loaded_detail_lists_fields() {
        let renderer = Renderer::plain(&CalendarConfig::default());
        let mut detail = ItemDetail {
            id: Some(ItemId(4)),
            title: "Post 4".to_string(),
            status: Some("draft".to_string()),
            ..ItemDetail::default()
        };
        detail
            .fields
            .insert("author".to_string(), serde_json::json!({"label": "Author", "value": "ann"}));

        let mut out = Vec::new();
        write_detail(&mut out, &detail).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("title     Post 4"));
        assert!(text.contains("author    ann"));

        let mut out = Vec::new();
        renderer.write_overlay(&mut out, &Overlay::Closed).expect("render");
        assert!(out.is_empty());
    }
}

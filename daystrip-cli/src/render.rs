//! TUI rendering traits for daystrip types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to daystrip-core types using owo_colors.

use chrono::NaiveDate;
use chrono_tz::Tz;
use daystrip_core::{DayView, Event};
use owo_colors::OwoColorize;

/// What every rendered line needs to know about the viewer.
pub struct RenderContext {
    pub timezone: Tz,
    pub today: NaiveDate,
    pub max_events_per_day: usize,
}

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self, ctx: &RenderContext) -> String;
}

impl Render for Event {
    fn render(&self, ctx: &RenderContext) -> String {
        let title = if self.is_all_day() {
            clean_all_day_title(self.title())
        } else {
            self.title().to_string()
        };

        let marker = match self.color().and_then(parse_hex_color) {
            Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
            None => "•".to_string(),
        };

        let time = format!("{:<13}", format_event_time(self, ctx.timezone));
        let mut line = format!("  {} {} {}", marker, time, title);

        if !self.calendar_name().is_empty() {
            line.push_str(&format!(" {}", format!("[{}]", self.calendar_name()).dimmed()));
        }
        line
    }
}

impl Render for DayView {
    fn render(&self, ctx: &RenderContext) -> String {
        let mut lines = vec![format_date_label(self.date, ctx.today).bold().to_string()];

        let (shown, overflow) = self.visible(ctx.max_events_per_day);
        if shown.is_empty() {
            lines.push(format!("  {}", "No events".dimmed()));
        }
        lines.extend(shown.iter().map(|event| event.render(ctx)));
        if overflow > 0 {
            lines.push(format!("  {}", format!("+{} more", overflow).dimmed()));
        }

        lines.join("\n")
    }
}

impl Render for [DayView] {
    fn render(&self, ctx: &RenderContext) -> String {
        self.iter()
            .map(|day| day.render(ctx))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// "Today", "Tomorrow", or e.g. "Wed Mar 25".
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// "all-day", or local "HH:MM - HH:MM" (just "HH:MM" for instants).
pub fn format_event_time(event: &Event, timezone: Tz) -> String {
    if event.is_all_day() {
        return "all-day".to_string();
    }

    let start = event.start().with_timezone(&timezone).format("%H:%M");
    if event.end() == event.start() {
        return start.to_string();
    }

    let end = event.end().with_timezone(&timezone).format("%H:%M");
    format!("{} - {}", start, end)
}

/// Drop a redundant "all day"/"all-day" phrase from an all-day title.
///
/// The phrase must stand as its own word(s); a title that is nothing but the
/// phrase is returned unchanged.
pub fn clean_all_day_title(title: &str) -> String {
    let mut cleaned = title.to_string();

    for phrase in ["all-day", "all day"] {
        while let Some(pos) = find_phrase(&cleaned, phrase) {
            cleaned.replace_range(pos..pos + phrase.len(), " ");
        }
    }

    let cleaned = collapse_whitespace(&cleaned);
    let cleaned = ["( )", "()", "[ ]", "[]"]
        .iter()
        .fold(cleaned, |acc, empty| acc.replace(empty, " "));
    let cleaned = collapse_whitespace(&cleaned);
    let cleaned = cleaned.trim_matches(|c: char| matches!(c, '-' | ':' | ',' | '|' | ' '));

    if cleaned.is_empty() {
        title.to_string()
    } else {
        cleaned.to_string()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of `phrase` in `text`, ASCII case-insensitive, on word boundaries.
fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;

    while let Some(offset) = lower[from..].find(phrase) {
        let start = from + offset;
        let end = start + phrase.len();

        let before_ok = !lower[..start].chars().next_back().is_some_and(char::is_alphanumeric);
        let after_ok = !lower[end..].chars().next().is_some_and(char::is_alphanumeric);
        if before_ok && after_ok {
            return Some(start);
        }
        from = end;
    }

    None
}

/// `#rrggbb` or `#rgb`. Anything else, including non-ASCII text, is `None`.
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let double = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((double(0)?, double(1)?, double(2)?))
        }
        _ => None,
    }
}

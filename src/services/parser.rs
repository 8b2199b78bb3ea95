// src/services/parser.rs

//! Latest-deaths table parser.
//!
//! Walks every `<tr>` inside any `<table>` in document order and turns rows
//! with at least three `<td>` cells into [`DeathRecord`]s. Field extraction
//! never fails: bad cells degrade to defaults and unusable rows are skipped.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{DEFAULT_TIME_LABEL, DeathRecord};

/// Upper bound on records kept from one page.
pub const MAX_RECORDS: usize = 20;

/// Player names must be longer than this many characters.
const MIN_PLAYER_LEN: usize = 2;

/// Parser for death tables with compiled selectors.
pub struct DeathTableParser {
    row_sel: Selector,
    cell_sel: Selector,
}

impl DeathTableParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row_sel: Self::parse_selector("table tr")?,
            cell_sel: Self::parse_selector("td")?,
        })
    }

    /// Parse markup into at most [`MAX_RECORDS`] records, in row order.
    ///
    /// Index 0 of the combined row sequence is always skipped as a header,
    /// even when the page holds several tables.
    pub fn parse(&self, html: &str, captured_at: DateTime<Utc>) -> Vec<DeathRecord> {
        let document = Html::parse_document(html);

        document
            .select(&self.row_sel)
            .skip(1)
            .filter_map(|row| self.parse_row(&row, captured_at))
            .take(MAX_RECORDS)
            .collect()
    }

    /// Parse raw bytes; fails only when they are not UTF-8 text.
    pub fn parse_bytes(&self, bytes: &[u8], captured_at: DateTime<Utc>) -> Result<Vec<DeathRecord>> {
        let html = std::str::from_utf8(bytes)
            .map_err(|e| AppError::Markup(format!("document is not valid UTF-8: {e}")))?;
        Ok(self.parse(html, captured_at))
    }

    fn parse_row(&self, row: &ElementRef, captured_at: DateTime<Utc>) -> Option<DeathRecord> {
        let cells: Vec<String> = row.select(&self.cell_sel).map(cell_text).collect();
        if cells.len() < 3 {
            return None;
        }

        let player = &cells[0];
        let level_text = &cells[1];
        if player.is_empty() || level_text.is_empty() || !is_valid_player(player) {
            return None;
        }

        let time = cells
            .get(3)
            .map(String::as_str)
            .unwrap_or(DEFAULT_TIME_LABEL);

        Some(DeathRecord::new(
            player.as_str(),
            parse_level(level_text),
            cells[2].as_str(),
            time,
            captured_at,
        ))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Concatenated, trimmed text of a cell and its descendants.
fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn is_valid_player(name: &str) -> bool {
    name.graphemes(true).count() > MIN_PLAYER_LEN
}

/// Leading decimal digits of `text`, or 0.
///
/// `"312"` → 312, `"45 (dead)"` → 45, `"+7"` → 7, `"-3"`, `"lvl 9"`
/// and values beyond `u32` → 0.
pub fn parse_level(text: &str) -> u32 {
    let text = text.trim();
    let digits = text.strip_prefix('+').unwrap_or(text);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}

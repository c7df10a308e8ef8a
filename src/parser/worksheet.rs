//! Worksheet parsing - parses individual sheet XML into Sheet structs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::{CbqaError, Result};
use crate::types::{CellValue, Sheet};

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Pane splits may be written as `1` or `1.0`.
fn parse_split(value: &[u8]) -> Option<u32> {
    let s = std::str::from_utf8(value).ok()?;
    parse_u32_bytes(s.strip_suffix(".0").unwrap_or(s).as_bytes())
}

/// Which child of `<c>` is collecting text.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Capture {
    None,
    Formula,
    Value,
    InlineText,
}

/// A `<c>` element being read.
struct PendingCell {
    col: u32,
    row: u32,
    tag: CellTypeTag,
    formula: String,
    value: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>, fallback_row: u32, fallback_col: u32) -> Self {
        let mut cell = Self {
            col: fallback_col,
            row: fallback_row,
            tag: CellTypeTag::Default,
            formula: String::new(),
            value: None,
            inline: None,
        };
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                        cell.col = c;
                        cell.row = r;
                    }
                }
                b"t" => cell.tag = parse_cell_type_tag(&attr.value),
                _ => {}
            }
        }
        cell
    }

    fn resolve(self, shared_strings: &[String]) -> Result<Option<CellValue>> {
        if !self.formula.is_empty() {
            return Ok(Some(CellValue::formula(self.formula)));
        }
        let value = match self.tag {
            CellTypeTag::Inline => self.inline.map(CellValue::Text),
            CellTypeTag::Str => self.value.map(CellValue::Text),
            CellTypeTag::Error => self.value.map(CellValue::Error),
            CellTypeTag::Shared => match self.value {
                Some(v) => {
                    let idx = parse_u32_bytes(v.trim().as_bytes())
                        .and_then(|i| shared_strings.get(usize::try_from(i).ok()?))
                        .ok_or_else(|| {
                            CbqaError::Parse(format!("bad shared string index `{v}`"))
                        })?;
                    Some(CellValue::Text(idx.clone()))
                }
                None => None,
            },
            CellTypeTag::Bool => self
                .value
                .map(|v| CellValue::Number(if v.trim() == "1" { 1.0 } else { 0.0 })),
            CellTypeTag::Default => match self.value {
                Some(v) => Some(CellValue::Number(v.trim().parse().map_err(|_| {
                    CbqaError::Parse(format!("cell value `{v}` is not a number"))
                })?)),
                None => None,
            },
        };
        Ok(value)
    }
}

/// Parse one worksheet part into a [`Sheet`].
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut sheet = Sheet::new(info.name.clone());
    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut capture = Capture::None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = current_row.saturating_add(1);
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"r" {
                                if let Some(r) = parse_u32_bytes(&attr.value) {
                                    current_row = r;
                                }
                            }
                        }
                        next_col = 0;
                    }
                    b"c" => {
                        let cell =
                            PendingCell::from_start(e, current_row.saturating_sub(1), next_col);
                        next_col = cell.col.saturating_add(1);
                        // <c r="A1"/> has no value
                        if is_start {
                            pending = Some(cell);
                        }
                    }
                    b"f" if is_start && pending.is_some() => capture = Capture::Formula,
                    b"v" if is_start && pending.is_some() => capture = Capture::Value,
                    b"t" if is_start && pending.is_some() => {
                        capture = Capture::InlineText;
                        if let Some(cell) = pending.as_mut() {
                            cell.inline.get_or_insert_with(String::new);
                        }
                    }
                    b"pane" => read_pane(e, &mut sheet),
                    b"col" => read_col(e, &mut sheet),
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) if capture != Capture::None => {
                let text = t.unescape()?;
                if let Some(cell) = pending.as_mut() {
                    match capture {
                        Capture::Formula => cell.formula.push_str(&text),
                        Capture::Value => cell.value.get_or_insert_with(String::new).push_str(&text),
                        Capture::InlineText => {
                            cell.inline.get_or_insert_with(String::new).push_str(&text);
                        }
                        Capture::None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"f" | b"v" | b"t" => capture = Capture::None,
                b"c" => {
                    capture = Capture::None;
                    if let Some(cell) = pending.take() {
                        let (row, col) = (cell.row, cell.col);
                        if let Some(value) = cell.resolve(shared_strings)? {
                            sheet.set_cell(row, col, value);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

/// Frozen pane splits from `<pane>`.
fn read_pane(e: &BytesStart<'_>, sheet: &mut Sheet) {
    let mut frozen = false;
    let (mut x, mut y) = (0, 0);
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"xSplit" => x = parse_split(&attr.value).unwrap_or(0),
            b"ySplit" => y = parse_split(&attr.value).unwrap_or(0),
            b"state" => frozen = matches!(attr.value.as_ref(), b"frozen" | b"frozenSplit"),
            _ => {}
        }
    }
    if frozen {
        sheet.frozen_cols = x;
        sheet.frozen_rows = y;
    }
}

/// Column width from `<col min max width>`.
fn read_col(e: &BytesStart<'_>, sheet: &mut Sheet) {
    let (mut min, mut max, mut width) = (None, None, None);
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"min" => min = parse_u32_bytes(&attr.value),
            b"max" => max = parse_u32_bytes(&attr.value),
            b"width" => {
                width = std::str::from_utf8(&attr.value)
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok());
            }
            _ => {}
        }
    }
    if let (Some(min), Some(max), Some(width)) = (min, max, width) {
        for col in min.max(1)..=max {
            sheet.col_widths.insert(col.saturating_sub(1), width);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_type_tag() {
        assert_eq!(parse_cell_type_tag(b"s"), CellTypeTag::Shared);
        assert_eq!(parse_cell_type_tag(b"inlineStr"), CellTypeTag::Inline);
        assert_eq!(parse_cell_type_tag(b"n"), CellTypeTag::Default);
    }

    #[test]
    fn test_parse_u32_bytes() {
        assert_eq!(parse_u32_bytes(b"42"), Some(42));
        assert_eq!(parse_u32_bytes(b""), None);
        assert_eq!(parse_u32_bytes(b"4a"), None);
        assert_eq!(parse_split(b"1.0"), Some(1));
    }

    #[test]
    fn test_resolve_shared_string() {
        let cell = PendingCell {
            col: 0,
            row: 0,
            tag: CellTypeTag::Shared,
            formula: String::new(),
            value: Some("1".to_string()),
            inline: None,
        };
        let shared = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cell.resolve(&shared).unwrap(), Some(CellValue::from("b")));
    }

    #[test]
    fn test_formula_wins_over_cached_value() {
        let cell = PendingCell {
            col: 0,
            row: 0,
            tag: CellTypeTag::Default,
            formula: "B1+C1".to_string(),
            value: Some("3".to_string()),
            inline: None,
        };
        assert_eq!(cell.resolve(&[]).unwrap(), Some(CellValue::formula("=B1+C1")));
    }
}

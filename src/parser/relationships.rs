//! Package-level parts: workbook relationships, the sheet list, shared strings.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;

use super::worksheet::SheetInfo;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Targets of `xl/_rels/workbook.xml.rels`, as full zip paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> worksheet part, e.g. `rId1` -> `xl/worksheets/sheet1.xml`
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
}

fn attr_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    target
        .strip_prefix('/')
        .map_or_else(|| format!("xl/{target}"), str::to_string)
}

/// Call `visit` for every start or empty element named `element` in `part`.
///
/// A missing part is not an error: `Ok(false)` tells the caller to fall back.
fn scan_elements<R, F>(
    archive: &mut ZipArchive<R>,
    part: &str,
    element: &[u8],
    mut visit: F,
) -> Result<bool>
where
    R: Read + Seek,
    F: FnMut(&BytesStart<'_>),
{
    let Ok(file) = archive.by_name(part) else {
        return Ok(false);
    };
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == element => {
                visit(e);
            }
            Event::Eof => return Ok(true),
            _ => {}
        }
        buf.clear();
    }
}

pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<WorkbookRelationships> {
    let mut rels = WorkbookRelationships::default();
    scan_elements(archive, WORKBOOK_RELS_PART, b"Relationship", |e| {
        let (mut id, mut target, mut kind) = (String::new(), String::new(), String::new());
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"Id" => id = attr_string(&attr.value),
                b"Target" => target = attr_string(&attr.value),
                b"Type" => kind = attr_string(&attr.value),
                _ => {}
            }
        }
        if target.is_empty() {
            return;
        }
        if kind.ends_with("/worksheet") && !id.is_empty() {
            rels.worksheets.insert(id, resolve_target(&target));
        } else if kind.ends_with("/sharedStrings") {
            rels.shared_strings = Some(resolve_target(&target));
        }
    })?;
    Ok(rels)
}

/// Sheet names and part paths from `xl/workbook.xml`, in tab order.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    worksheets: &HashMap<String, String>,
) -> Result<Vec<SheetInfo>> {
    let mut sheets = Vec::new();
    let found = scan_elements(archive, WORKBOOK_PART, b"sheet", |e| {
        let mut name = String::new();
        let mut rel_id = String::new();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"name" => {
                    name = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                }
                // r:id, whatever the prefix
                key if key == b"id" || key.ends_with(b":id") => rel_id = attr_string(&attr.value),
                _ => {}
            }
        }
        if name.is_empty() {
            return;
        }
        let path = worksheets.get(&rel_id).cloned().unwrap_or_else(|| {
            format!("xl/worksheets/sheet{}.xml", sheets.len().saturating_add(1))
        });
        sheets.push(SheetInfo { name, path });
    })?;
    if !found {
        // surface the zip error for the missing part
        archive.by_name(WORKBOOK_PART)?;
    }
    Ok(sheets)
}

/// Shared string table; rich text runs are joined, phonetic runs skipped.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<Vec<String>> {
    let Ok(file) = archive.by_name(path.unwrap_or(SHARED_STRINGS_PART)) else {
        return Ok(Vec::new());
    };
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = current.is_some() && !in_phonetic,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(ref t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

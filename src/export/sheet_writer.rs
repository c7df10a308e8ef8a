//! Generates worksheet XML from a `Sheet`.
//!
//! Text cells use inline strings (`t="inlineStr"`) so no shared string
//! table is needed. Formula cells carry no cached value; the workbook asks
//! Excel to recalculate on load.

use crate::cell_ref::col_to_letter;
use crate::types::{CellValue, Sheet};

/// Write a complete worksheet XML string from a `Sheet`.
pub(crate) fn write_sheet_xml(sheet: &Sheet, selected: bool) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    if !sheet.is_empty() {
        let end_col = col_to_letter(sheet.max_col().saturating_sub(1));
        out.push_str(&format!(
            "<dimension ref=\"A1:{}{}\"/>\n",
            end_col,
            sheet.max_row()
        ));
    }

    // <sheetViews>: frozen panes
    let tab = if selected { " tabSelected=\"1\"" } else { "" };
    if sheet.frozen_rows > 0 || sheet.frozen_cols > 0 {
        out.push_str(&format!("<sheetViews><sheetView{tab} workbookViewId=\"0\">"));
        let top_left = format!(
            "{}{}",
            col_to_letter(sheet.frozen_cols),
            sheet.frozen_rows.saturating_add(1)
        );
        out.push_str("<pane");
        if sheet.frozen_cols > 0 {
            out.push_str(&format!(" xSplit=\"{}\"", sheet.frozen_cols));
        }
        if sheet.frozen_rows > 0 {
            out.push_str(&format!(" ySplit=\"{}\"", sheet.frozen_rows));
        }
        out.push_str(&format!(
            " topLeftCell=\"{top_left}\" activePane=\"{}\" state=\"frozen\"/>",
            active_pane(sheet)
        ));
        out.push_str("</sheetView></sheetViews>\n");
    } else {
        out.push_str(&format!(
            "<sheetViews><sheetView{tab} workbookViewId=\"0\"/></sheetViews>\n"
        ));
    }

    // <cols>
    if !sheet.col_widths.is_empty() {
        out.push_str("<cols>\n");
        for (&col, &width) in &sheet.col_widths {
            let col1 = col.saturating_add(1); // XLSX is 1-based
            out.push_str(&format!(
                "<col min=\"{col1}\" max=\"{col1}\" width=\"{width:.4}\" customWidth=\"1\"/>\n"
            ));
        }
        out.push_str("</cols>\n");
    }

    // <sheetData>
    if sheet.is_empty() {
        out.push_str("<sheetData/>\n");
    } else {
        out.push_str("<sheetData>\n");
        write_sheet_data(&mut out, sheet);
        out.push_str("</sheetData>\n");
    }

    out.push_str("</worksheet>");
    out
}

fn active_pane(sheet: &Sheet) -> &'static str {
    match (sheet.frozen_rows > 0, sheet.frozen_cols > 0) {
        (true, true) => "bottomRight",
        (true, false) => "bottomLeft",
        _ => "topRight",
    }
}

/// Write all cell rows into `<sheetData>`.
fn write_sheet_data(out: &mut String, sheet: &Sheet) {
    let mut current: Option<u32> = None;
    for (row, col, value) in sheet.cells() {
        if current != Some(row) {
            if current.is_some() {
                out.push_str("</row>\n");
            }
            out.push_str(&format!("<row r=\"{}\">", row.saturating_add(1)));
            current = Some(row);
        }
        write_cell(out, row, col, value);
    }
    if current.is_some() {
        out.push_str("</row>\n");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, row: u32, col: u32, value: &CellValue) {
    let cell_ref = format!("{}{}", col_to_letter(col), row.saturating_add(1));
    out.push_str(&format!("<c r=\"{cell_ref}\""));

    match value {
        CellValue::Text(s) => {
            out.push_str(" t=\"inlineStr\"><is><t xml:space=\"preserve\">");
            out.push_str(&xml_escape(s));
            out.push_str("</t></is>");
        }
        CellValue::Number(n) if n.is_finite() => {
            out.push_str(&format!("><v>{n}</v>"));
        }
        CellValue::Number(_) => {
            out.push_str(" t=\"e\"><v>#NUM!</v>");
        }
        CellValue::Formula(f) => {
            out.push_str("><f>");
            out.push_str(&xml_escape(f.strip_prefix('=').unwrap_or(f)));
            out.push_str("</f>");
        }
        CellValue::Error(e) => {
            out.push_str(" t=\"e\"><v>");
            out.push_str(&xml_escape(e));
            out.push_str("</v>");
        }
    }

    out.push_str("</c>");
}

/// Minimal XML escaping for attribute/text content.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_and_rows() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(0, 1, CellValue::Number(7.0));
        sheet.set_cell(2, 0, CellValue::from("a<b"));
        sheet.set_cell(2, 1, CellValue::formula("=(B1/ABS(B3))*1000"));
        sheet.set_cell(2, 2, CellValue::Error("#DIV/0!".to_string()));
        let xml = write_sheet_xml(&sheet, false);

        assert!(xml.contains("<dimension ref=\"A1:C3\"/>"));
        assert!(xml.contains("<row r=\"1\"><c r=\"B1\"><v>7</v></c></row>"));
        assert!(xml.contains(
            "<c r=\"A3\" t=\"inlineStr\"><is><t xml:space=\"preserve\">a&lt;b</t></is></c>"
        ));
        assert!(xml.contains("<c r=\"B3\"><f>(B1/ABS(B3))*1000</f></c>"));
        assert!(xml.contains("<c r=\"C3\" t=\"e\"><v>#DIV/0!</v></c>"));
        assert!(!xml.contains("<row r=\"2\""));
    }

    #[test]
    fn test_non_finite_number_is_error_cell() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(0, 0, CellValue::Number(f64::NAN));
        let xml = write_sheet_xml(&sheet, false);
        assert!(xml.contains("<c r=\"A1\" t=\"e\"><v>#NUM!</v></c>"));
    }

    #[test]
    fn test_frozen_pane_and_widths() {
        let mut sheet = Sheet::new("S");
        sheet.frozen_rows = 1;
        sheet.frozen_cols = 1;
        sheet.col_widths.insert(0, 24.0);
        let xml = write_sheet_xml(&sheet, true);
        assert!(xml.contains("tabSelected=\"1\""));
        assert!(xml.contains(
            "<pane xSplit=\"1\" ySplit=\"1\" topLeftCell=\"B2\" activePane=\"bottomRight\" state=\"frozen\"/>"
        ));
        assert!(xml.contains("<col min=\"1\" max=\"1\" width=\"24.0000\" customWidth=\"1\"/>"));
        assert!(xml.contains("<sheetData/>"));
    }
}

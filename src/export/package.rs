//! Assemble the XLSX ZIP package around the worksheet XML.
//!
//! The package is the minimum Excel opens without repair: content types,
//! package and workbook relationships, `workbook.xml`, a one-font
//! `styles.xml`, and one worksheet part per sheet.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::types::Workbook;

use super::sheet_writer::{write_sheet_xml, xml_escape};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Zip path of the `index`-th (0-based) worksheet.
fn sheet_path(index: usize) -> String {
    format!("xl/worksheets/sheet{}.xml", index.saturating_add(1))
}

/// Write every part of the package and return the archive bytes.
pub(crate) fn write_package(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let sheet_count = workbook.sheets().len();
    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".to_string(), content_types_xml(sheet_count)),
        ("_rels/.rels".to_string(), root_rels_xml()),
        ("xl/workbook.xml".to_string(), workbook_xml(workbook)),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            workbook_rels_xml(sheet_count),
        ),
        ("xl/styles.xml".to_string(), styles_xml()),
    ];
    for (idx, sheet) in workbook.sheets().iter().enumerate() {
        parts.push((sheet_path(idx), write_sheet_xml(sheet, idx == 0)));
    }

    for (name, xml) in &parts {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(xml.as_bytes())?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    out.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    out.push_str(
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for idx in 0..sheet_count {
        out.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            sheet_path(idx)
        ));
    }
    out.push_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    out.push_str("</Types>");
    out
}

fn root_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{REL_OFFICE_DOC}" Target="xl/workbook.xml"/></Relationships>"#
    )
}

/// Sheets get `rId1..=rIdN`; styles come last.
fn workbook_xml(workbook: &Workbook) -> String {
    let mut out = format!(r#"{XML_DECL}<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}">"#);
    out.push_str("<bookViews><workbookView activeTab=\"0\"/></bookViews><sheets>");
    for (idx, sheet) in workbook.sheets().iter().enumerate() {
        let n = idx.saturating_add(1);
        out.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            xml_escape(&sheet.name)
        ));
    }
    out.push_str("</sheets>");
    out.push_str(r#"<calcPr calcId="191029" fullCalcOnLoad="1"/>"#);
    out.push_str("</workbook>");
    out
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut out = format!(r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}">"#);
    for idx in 0..sheet_count {
        let n = idx.saturating_add(1);
        out.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{REL_WORKSHEET}" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    out.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_STYLES}" Target="styles.xml"/>"#,
        sheet_count.saturating_add(1)
    ));
    out.push_str("</Relationships>");
    out
}

fn styles_xml() -> String {
    format!(
        concat!(
            r#"{}<styleSheet xmlns="{}">"#,
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            "</styleSheet>"
        ),
        XML_DECL, NS_MAIN
    )
}

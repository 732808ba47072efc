use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// A hyperlink anchored on one cell. `row` and `col` are 0-based from A1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLink {
    pub row: usize,
    pub col: usize,
    pub target: String,
    pub display: Option<String>,
}

#[derive(Debug, Clone)]
struct Relationship {
    ty: String,
    target: String,
}

/// Whether the file is an OOXML package whose hyperlinks calamine leaves out.
pub fn has_hyperlink_parts(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"))
}

/// Reads the `<hyperlinks>` of every worksheet, keyed by sheet name. External
/// targets come from the sheet relationships; in-workbook targets are kept as
/// `internal:Sheet!A1`.
pub fn read_sheet_hyperlinks(xlsx_path: &Path) -> Result<BTreeMap<String, Vec<CellLink>>> {
    let file = File::open(xlsx_path)
        .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;
    let mut archive = ZipArchive::new(file).context("failed to open xlsx package")?;

    let workbook_xml =
        read_part(&mut archive, "xl/workbook.xml")?.context("xlsx package has no workbook part")?;
    let workbook_rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?.unwrap_or_default();
    let rels = parse_relationships(&workbook_rels)?;

    let mut links = BTreeMap::new();
    for (sheet_name, rel_id) in parse_sheet_entries(&workbook_xml)? {
        let Some(rel) = rels.get(&rel_id) else {
            debug!(sheet = %sheet_name, %rel_id, "sheet relationship missing");
            continue;
        };
        let sheet_part = resolve_part("xl", &rel.target);
        let Some(sheet_xml) = read_part(&mut archive, &sheet_part)? else {
            continue;
        };
        let sheet_rels = read_part(&mut archive, &rels_part_for(&sheet_part))?;
        let sheet_links = parse_worksheet_hyperlinks(&sheet_xml, sheet_rels.as_deref())?;
        if !sheet_links.is_empty() {
            debug!(sheet = %sheet_name, links = sheet_links.len(), "read hyperlinks");
            links.insert(sheet_name, sheet_links);
        }
    }
    Ok(links)
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("failed to read part: {name}")),
    };
    let mut text = String::new();
    part.read_to_string(&mut text)
        .with_context(|| format!("failed to read part: {name}"))?;
    Ok(Some(text))
}

/// Resolves a relationship target against the folder of its source part.
fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parse_relationships(rels_xml: &str) -> Result<BTreeMap<String, Relationship>> {
    let mut rels = BTreeMap::new();
    for_each_element(rels_xml, b"Relationship", |e| {
        let attrs = attributes(e)?;
        if let Some(id) = attrs.get("Id") {
            rels.insert(
                id.clone(),
                Relationship {
                    ty: attrs.get("Type").cloned().unwrap_or_default(),
                    target: attrs.get("Target").cloned().unwrap_or_default(),
                },
            );
        }
        Ok(())
    })?;
    Ok(rels)
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheet_entries(workbook_xml: &str) -> Result<Vec<(String, String)>> {
    let mut sheets = Vec::new();
    for_each_element(workbook_xml, b"sheet", |e| {
        let attrs = attributes(e)?;
        if let (Some(name), Some(rel_id)) = (attrs.get("name"), attrs.get("id")) {
            sheets.push((name.clone(), rel_id.clone()));
        }
        Ok(())
    })?;
    Ok(sheets)
}

pub fn parse_worksheet_hyperlinks(sheet_xml: &str, rels_xml: Option<&str>) -> Result<Vec<CellLink>> {
    let rels = rels_xml.map(parse_relationships).transpose()?.unwrap_or_default();

    let mut links = Vec::new();
    for_each_element(sheet_xml, b"hyperlink", |e| {
        let attrs = attributes(e)?;
        let Some(reference) = attrs.get("ref") else {
            return Ok(());
        };
        let target = match (attrs.get("id"), attrs.get("location")) {
            (Some(rel_id), _) => match rels.get(rel_id) {
                Some(rel) if rel.ty == REL_TYPE_HYPERLINK => rel.target.clone(),
                _ => {
                    debug!(%reference, %rel_id, "hyperlink relationship missing");
                    return Ok(());
                }
            },
            (None, Some(location)) => format!("internal:{}", location.trim_start_matches('#')),
            (None, None) => return Ok(()),
        };
        let Some(((first_row, first_col), (last_row, last_col))) = parse_range(reference) else {
            debug!(%reference, "unreadable hyperlink reference");
            return Ok(());
        };
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                links.push(CellLink {
                    row,
                    col,
                    target: target.clone(),
                    display: attrs.get("display").cloned(),
                });
            }
        }
        Ok(())
    })?;
    Ok(links)
}

fn for_each_element<F>(xml: &str, local_name: &[u8], mut visit: F) -> Result<()>
where
    F: FnMut(&BytesStart<'_>) -> Result<()>,
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).context("malformed xlsx xml")? {
            Event::Eof => break,
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == local_name => {
                visit(&e)?;
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Attribute values keyed by local name, so `r:id` reads as `id`.
fn attributes(e: &BytesStart<'_>) -> Result<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.context("malformed xml attribute")?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().context("malformed xml attribute value")?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}

type CellPos = (usize, usize);

fn parse_range(reference: &str) -> Option<(CellPos, CellPos)> {
    match reference.trim().split_once(':') {
        Some((start, end)) => Some((cell_from_a1(start)?, cell_from_a1(end)?)),
        None => {
            let cell = cell_from_a1(reference)?;
            Some((cell, cell))
        }
    }
}

/// `B3` -> `(2, 1)`.
fn cell_from_a1(a1: &str) -> Option<CellPos> {
    let a1 = a1.trim().replace('$', "");
    let split = a1.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = a1.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row = digits.parse::<usize>().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_refs_and_part_paths_resolve() {
        assert_eq!(cell_from_a1("B3"), Some((2, 1)));
        assert_eq!(cell_from_a1("$AA$10"), Some((9, 26)));
        assert_eq!(cell_from_a1("A0"), None);
        assert_eq!(resolve_part("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_part("xl", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(
            rels_part_for("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn worksheet_hyperlinks_resolve_external_and_internal_targets() {
        let sheet_xml = r##"<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheetData/>
            <hyperlinks>
                <hyperlink ref="C2" r:id="rId1" display="profile"/>
                <hyperlink ref="A4:A5" location="'Contacts'!A1"/>
            </hyperlinks>
        </worksheet>"##;
        let rels_xml = r#"<Relationships>
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/ada" TargetMode="External"/>
        </Relationships>"#;

        let links = parse_worksheet_hyperlinks(sheet_xml, Some(rels_xml)).expect("should parse");

        assert_eq!(links.len(), 3);
        assert_eq!(
            links[0],
            CellLink {
                row: 1,
                col: 2,
                target: "https://example.com/ada".to_string(),
                display: Some("profile".to_string()),
            }
        );
        assert_eq!(links[1].target, "internal:'Contacts'!A1");
        assert_eq!((links[2].row, links[2].col), (4, 0));
    }
}

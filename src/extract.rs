use scraper::{ElementRef, Html, Selector};

use crate::formats::FlatRecord;

/// Position of one field inside a table row: the cell index, then how many
/// first-child elements to descend before reading text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub column: usize,
    pub depth: usize,
}

const fn field(column: usize, depth: usize) -> FieldPath {
    FieldPath { column, depth }
}

/// Where the listing keeps its rows and which cell holds which field.
/// The markup assumption lives here and nowhere else.
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    /// Header body; the data body is its next sibling element.
    pub header_selector: &'static str,
    pub subdistrict_id: FieldPath,
    pub postal_code: FieldPath,
    pub subdistrict_name: FieldPath,
    pub subdistrict_code: FieldPath,
    pub district_name: FieldPath,
    pub city_type: FieldPath,
    pub city_name: FieldPath,
    pub province_name: FieldPath,
}

pub const NOMOR_NET_LAYOUT: TableLayout = TableLayout {
    header_selector: "tbody.header_mentok",
    subdistrict_id: field(0, 0),
    postal_code: field(1, 1),
    subdistrict_name: field(2, 1),
    subdistrict_code: field(3, 1),
    district_name: field(4, 1),
    city_type: field(5, 0),
    city_name: field(6, 1),
    province_name: field(7, 1),
};

pub fn extract_rows(html: &str, layout: &TableLayout) -> anyhow::Result<Vec<FlatRecord>> {
    let document = Html::parse_document(html);
    let header_selector = Selector::parse(layout.header_selector)
        .map_err(|err| anyhow::anyhow!("parse selector {}: {err}", layout.header_selector))?;

    let header = document
        .select(&header_selector)
        .next()
        .ok_or_else(|| anyhow::anyhow!("table container not found: {}", layout.header_selector))?;
    let body = header
        .next_siblings()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no data rows after table container: {}",
                layout.header_selector
            )
        })?;

    let mut records = Vec::new();
    for (index, row) in child_elements(body)
        .filter(|el| el.value().name() == "tr")
        .enumerate()
    {
        let cells: Vec<ElementRef<'_>> = child_elements(row).collect();
        let read = |path: FieldPath| cell_text(&cells, path, index);

        records.push(FlatRecord {
            subdistrict_id: read(layout.subdistrict_id)?,
            postal_code: read(layout.postal_code)?,
            subdistrict_name: read(layout.subdistrict_name)?,
            subdistrict_code: read(layout.subdistrict_code)?,
            district_name: read(layout.district_name)?,
            city_name: format!("{} {}", read(layout.city_type)?, read(layout.city_name)?),
            province_name: read(layout.province_name)?,
        });
    }

    Ok(records)
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn cell_text(cells: &[ElementRef<'_>], path: FieldPath, row: usize) -> anyhow::Result<String> {
    let mut node = *cells
        .get(path.column)
        .ok_or_else(|| anyhow::anyhow!("row {row}: missing column {}", path.column))?;

    for level in 0..path.depth {
        node = child_elements(node).next().ok_or_else(|| {
            anyhow::anyhow!(
                "row {row}: column {} has no element at depth {}",
                path.column,
                level + 1
            )
        })?;
    }

    // Only the leading text node counts; anything after a `<br>` or inline tag is dropped.
    let text = node
        .first_child()
        .and_then(|child| child.value().as_text().map(|text| text.trim().to_owned()))
        .unwrap_or_default();
    Ok(text)
}

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;
use std::time::Instant;

use anyhow::Context as _;

use crate::formats::{City, District, FlatRecord, Province, Subdistrict};
use crate::normalize::Hierarchy;

pub const FLAT_FILE: &str = "subdistricts_to_provinces.sql";
pub const PROVINCES_FILE: &str = "provinces.sql";
pub const CITIES_FILE: &str = "cities.sql";
pub const DISTRICTS_FILE: &str = "districts.sql";
pub const SUBDISTRICTS_FILE: &str = "subdistricts.sql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlValue<'a> {
    Int(i64),
    Text(&'a str),
}

/// A row that knows which table it lands in.
pub trait InsertRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue<'_>>;
}

/// A `subdistrict_id` that is not an integer is written as `0`, the same
/// value the normalizer assigns to it.
impl InsertRow for FlatRecord {
    const TABLE: &'static str = "subdistricts_to_provinces";
    const COLUMNS: &'static [&'static str] = &[
        "subdistrict_id",
        "subdistrict_name",
        "subdistrict_code",
        "postal_code",
        "district_name",
        "city_name",
        "province_name",
    ];

    fn values(&self) -> Vec<SqlValue<'_>> {
        vec![
            SqlValue::Int(self.subdistrict_id.parse().unwrap_or(0)),
            SqlValue::Text(&self.subdistrict_name),
            SqlValue::Text(&self.subdistrict_code),
            SqlValue::Text(&self.postal_code),
            SqlValue::Text(&self.district_name),
            SqlValue::Text(&self.city_name),
            SqlValue::Text(&self.province_name),
        ]
    }
}

impl InsertRow for Province {
    const TABLE: &'static str = "provinces";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn values(&self) -> Vec<SqlValue<'_>> {
        vec![SqlValue::Int(self.id.into()), SqlValue::Text(&self.name)]
    }
}

impl InsertRow for City {
    const TABLE: &'static str = "cities";
    const COLUMNS: &'static [&'static str] = &["id", "province_id", "name"];

    fn values(&self) -> Vec<SqlValue<'_>> {
        vec![
            SqlValue::Int(self.id.into()),
            SqlValue::Int(self.province_id.into()),
            SqlValue::Text(&self.name),
        ]
    }
}

impl InsertRow for District {
    const TABLE: &'static str = "districts";
    const COLUMNS: &'static [&'static str] = &["id", "city_id", "name"];

    fn values(&self) -> Vec<SqlValue<'_>> {
        vec![
            SqlValue::Int(self.id.into()),
            SqlValue::Int(self.city_id.into()),
            SqlValue::Text(&self.name),
        ]
    }
}

impl InsertRow for Subdistrict {
    const TABLE: &'static str = "subdistricts";
    const COLUMNS: &'static [&'static str] = &["id", "district_id", "name", "code", "postal_code"];

    fn values(&self) -> Vec<SqlValue<'_>> {
        vec![
            SqlValue::Int(self.id),
            SqlValue::Int(self.district_id.into()),
            SqlValue::Text(&self.name),
            SqlValue::Text(&self.code),
            SqlValue::Text(&self.postal_code),
        ]
    }
}

/// Doubles single quotes. No other character is touched.
pub fn escape_single_quote(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn insert_statement<R: InsertRow>(row: &R) -> String {
    let columns = R::COLUMNS
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let values = row
        .values()
        .into_iter()
        .map(|value| match value {
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Text(s) => format!("'{}'", escape_single_quote(s)),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO \"{}\" ({columns}) VALUES ({values});", R::TABLE)
}

pub fn render_inserts<R: InsertRow>(rows: &[R]) -> String {
    let mut sql = String::new();
    for row in rows {
        // Writing into a String cannot fail.
        let _ = writeln!(sql, "{}", insert_statement(row));
    }
    sql
}

/// Creates (or truncates) `out_dir/file_name` and returns the bytes written.
pub fn write_inserts<R: InsertRow>(
    out_dir: &Path,
    file_name: &str,
    rows: &[R],
) -> anyhow::Result<usize> {
    let started = Instant::now();
    let path = out_dir.join(file_name);

    let sql = render_inserts(rows);
    let file =
        File::create(&path).with_context(|| format!("create sql file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(sql.as_bytes())
        .with_context(|| format!("write sql file: {}", path.display()))?;
    out.flush()
        .with_context(|| format!("flush sql file: {}", path.display()))?;

    tracing::info!(
        file = %path.display(),
        rows = rows.len(),
        bytes = sql.len(),
        elapsed = ?started.elapsed(),
        "wrote sql file"
    );
    Ok(sql.len())
}

/// Writes the five export files in a fixed order. A failure stops the export;
/// files already written stay on disk.
pub fn write_all(out_dir: &Path, records: &[FlatRecord], hierarchy: &Hierarchy) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create sql output dir: {}", out_dir.display()))?;

    write_inserts(out_dir, FLAT_FILE, records).context("export flat rows")?;
    write_inserts(out_dir, PROVINCES_FILE, &hierarchy.provinces).context("export provinces")?;
    write_inserts(out_dir, CITIES_FILE, &hierarchy.cities).context("export cities")?;
    write_inserts(out_dir, DISTRICTS_FILE, &hierarchy.districts).context("export districts")?;
    write_inserts(out_dir, SUBDISTRICTS_FILE, &hierarchy.subdistricts)
        .context("export subdistricts")?;

    Ok(())
}

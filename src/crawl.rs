use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::cli::{CrawlArgs, SourceArgs};
use crate::extract::{NOMOR_NET_LAYOUT, TableLayout, extract_rows};
use crate::fetch::{HttpPageSource, PageSource};
use crate::formats::FlatRecord;
use crate::paginate::plan_pages;

/// Walks every listing page in order and returns the rows of all of them.
/// The first error ends the crawl.
pub async fn crawl_pages(
    source: &dyn PageSource,
    layout: &TableLayout,
    args: &SourceArgs,
) -> anyhow::Result<Vec<FlatRecord>> {
    let plan = plan_pages(&args.base_url, args.total, args.per_page).context("plan pages")?;
    let delay = Duration::from_secs(args.delay_secs);
    tracing::info!(
        pages = plan.len(),
        total = args.total,
        per_page = args.per_page,
        "crawl: start"
    );

    let mut records = Vec::new();
    for request in &plan {
        if request.number > 1 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let started = Instant::now();
        tracing::info!(page = request.number, url = %request.url, "opening page");
        let html = source
            .fetch(&request.url)
            .await
            .with_context(|| format!("fetch page {}", request.number))?;
        let rows = extract_rows(&html, layout)
            .with_context(|| format!("extract rows from page {}: {}", request.number, request.url))?;
        tracing::info!(
            page = request.number,
            rows = rows.len(),
            elapsed = ?started.elapsed(),
            "parsed page"
        );

        records.extend(rows);
    }

    tracing::info!(rows = records.len(), "crawl: done");
    Ok(records)
}

/// Crawls with the HTTP fetcher. The client lives for this call only.
pub async fn crawl_site(args: &SourceArgs) -> anyhow::Result<Vec<FlatRecord>> {
    let source = HttpPageSource::new()?;
    crawl_pages(&source, &NOMOR_NET_LAYOUT, args).await
}

pub async fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let out_path = PathBuf::from(&args.out);
    let records = crawl_site(&args.source).await?;
    write_rows_snapshot(&out_path, &records)?;
    tracing::info!(out = %out_path.display(), rows = records.len(), "wrote rows snapshot");
    Ok(())
}

pub fn write_rows_snapshot(path: &Path, records: &[FlatRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create rows snapshot dir: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("create rows snapshot: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut out, record).context("write flat record json")?;
        out.write_all(b"\n").context("write flat record newline")?;
    }
    out.flush().context("flush rows snapshot")?;
    Ok(())
}

pub fn read_rows_snapshot(path: &Path) -> anyhow::Result<Vec<FlatRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read rows snapshot: {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: FlatRecord = serde_json::from_str(line)
            .with_context(|| format!("parse flat record at line {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}

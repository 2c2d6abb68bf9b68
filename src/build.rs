use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;

use crate::cli::BuildArgs;
use crate::normalize::Hierarchy;

pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    let started_at = chrono::Utc::now();
    let started = Instant::now();
    let out_dir = PathBuf::from(&args.out);
    tracing::info!(
        url = %args.source.base_url,
        out = %out_dir.display(),
        started_at = %started_at.to_rfc3339(),
        "build: crawl"
    );

    let records = crate::crawl::crawl_site(&args.source)
        .await
        .context("crawl")?;

    tracing::info!("build: normalize");
    let hierarchy = Hierarchy::from_records(&records).context("normalize")?;

    tracing::info!("build: export");
    crate::sql::write_all(&out_dir, &records, &hierarchy).context("export")?;

    tracing::info!(
        started_at = %started_at.to_rfc3339(),
        finished_at = %chrono::Utc::now().to_rfc3339(),
        elapsed = ?started.elapsed(),
        "build: done"
    );
    Ok(())
}

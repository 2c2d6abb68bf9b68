use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::ExportArgs;
use crate::normalize::Hierarchy;

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let rows_path = PathBuf::from(&args.rows);
    let out_dir = PathBuf::from(&args.out);

    let records = crate::crawl::read_rows_snapshot(&rows_path).context("read rows")?;
    tracing::info!(rows = records.len(), path = %rows_path.display(), "export: loaded rows");

    let hierarchy = Hierarchy::from_records(&records).context("normalize rows")?;
    crate::sql::write_all(&out_dir, &records, &hierarchy).context("write sql")?;

    Ok(())
}

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    kodepos::logging::init().context("init logging")?;

    let cli = kodepos::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        None => {
            kodepos::build::run(kodepos::cli::BuildArgs::default())
                .await
                .context("build")?;
        }
        Some(kodepos::cli::Command::Build(args)) => {
            kodepos::build::run(args).await.context("build")?;
        }
        Some(kodepos::cli::Command::Crawl(args)) => {
            kodepos::crawl::run(args).await.context("crawl")?;
        }
        Some(kodepos::cli::Command::Export(args)) => {
            kodepos::export::run(args).context("export")?;
        }
    }

    Ok(())
}

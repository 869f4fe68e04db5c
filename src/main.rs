mod cli;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use exn::ResultExt;
use ird_catalog::{Catalog, CatalogClient};
use ird_compat::{Amount, CompatClient, RequestBuilder};
use ird_config::Config;
use ird_library::Resolver;
use ird_storage::backend::LocalBackend;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(directory) = cli.cache_dir {
        config.cache.directory = Some(directory);
    }
    match cli.command {
        Command::Resolve { product_code } => resolve(&config, &product_code, cancel).await,
        Command::Search { query } => search(&config, &query, cancel).await,
        Command::Compat { search, amount } => compat(&config, &search, Amount::at_least(amount), cancel).await,
        Command::Update { commit } => update(&config, commit.as_deref(), cancel).await,
    }
}

fn catalog(config: &Config) -> Result<CatalogClient> {
    CatalogClient::new(&config.catalog.base_url, config.catalog.timeout())
        .or_raise(|| ErrorKind::Setup("catalog client"))
}

fn compat_client(config: &Config) -> Result<CompatClient> {
    Ok(CompatClient::new(config.compat.timeout())
        .or_raise(|| ErrorKind::Setup("compatibility client"))?
        .with_base_url(&config.compat.base_url)
        .with_update_url(&config.compat.update_url)
        .with_max_attempts(config.compat.max_attempts()))
}

async fn resolve(config: &Config, product_code: &str, cancel: &CancellationToken) -> Result<()> {
    let directory = config.cache.resolved_directory().or_raise(|| ErrorKind::Config)?;
    if let Err(err) = tokio::fs::create_dir_all(&directory).await {
        tracing::warn!(directory = %directory.display(), error = %err, "could not create IRD cache directory");
    }
    let backend = LocalBackend::new("cache", &directory).or_raise(|| ErrorKind::Setup("IRD cache"))?;
    let resolver = Resolver::new(Arc::new(catalog(config)?), Arc::new(backend));
    let resolution = match resolver.resolve(product_code, cancel).await {
        Ok(resolution) => resolution,
        Err(err) => return Err(err.raise(ErrorKind::Cancelled)),
    };
    for record in &resolution.records {
        println!("{}\t{}\tv{}\tapp {}", record.product_code, record.title, record.game_version, record.app_version);
    }
    if !resolution.issues.is_empty() {
        println!("{} issue(s):", resolution.issues.len());
        for issue in &resolution.issues {
            println!("  {issue}");
        }
    }
    Ok(())
}

async fn search(config: &Config, query: &str, cancel: &CancellationToken) -> Result<()> {
    let catalog = catalog(config)?;
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
        result = catalog.search(query) => result.or_raise(|| ErrorKind::Communication("the IRD Library"))?,
    };
    for item in &result.items {
        let filename = item.filename.as_ref().map_or("-", |filename| filename.as_str());
        println!("{filename}\t{}", item.title.as_deref().unwrap_or("-"));
    }
    Ok(())
}

fn from_compat(err: ird_compat::error::Error, service: &'static str) -> error::Error {
    let kind = match &*err {
        ird_compat::error::ErrorKind::Cancelled => ErrorKind::Cancelled,
        ird_compat::error::ErrorKind::InvalidUrl(_) => ErrorKind::Config,
        _ => ErrorKind::Communication(service),
    };
    err.raise(kind)
}

async fn compat(config: &Config, search: &str, amount: Amount, cancel: &CancellationToken) -> Result<()> {
    let request = RequestBuilder::new(search).with_amount(amount);
    let result = compat_client(config)?
        .compat_result(&request, cancel)
        .await
        .map_err(|err| from_compat(err, "the compatibility API"))?;
    tracing::debug!(
        return_code = result.return_code,
        duration = ?result.request_duration,
        "compatibility list answered"
    );
    if result.results.is_empty() {
        println!("no results for {search}");
    }
    for (product_code, info) in &result.results {
        println!(
            "{product_code}\t{}\t{}",
            info.title.as_deref().unwrap_or("-"),
            info.status.as_deref().unwrap_or("Unknown")
        );
    }
    Ok(())
}

async fn update(config: &Config, commit: Option<&str>, cancel: &CancellationToken) -> Result<()> {
    let info = compat_client(config)?
        .update(commit, cancel)
        .await
        .map_err(|err| from_compat(err, "the update API"))?;
    let describe = |build: Option<&ird_compat::BuildInfo>| match build {
        Some(build) => format!(
            "{} ({})",
            build.version.as_deref().unwrap_or("unknown version"),
            build.datetime.as_deref().unwrap_or("unknown date")
        ),
        None => "-".to_string(),
    };
    println!("latest:  {}", describe(info.latest_build.as_ref()));
    println!("current: {}", describe(info.current_build.as_ref()));
    if info.return_code == 1 {
        println!("an update is available");
    }
    Ok(())
}

//! RSCN content CLI - read site content through the caching gateway
//!
//! Prints the requested content as pretty JSON on stdout. Logs go to stderr;
//! set `RUST_LOG=rscn_content=debug` to watch cache decisions.

use std::error::Error;

use clap::Parser;
use serde::Serialize;

use rscn_content::cli::{parse_params, Cli, Command};
use rscn_content::config::Config;
use rscn_content::data::WordPressClient;
use rscn_content::site::{proxy_url, SiteContent};
use rscn_content::ContentGateway;

/// Writes `value` to stdout as pretty JSON
fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rscn=info,rscn_content=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Loads configuration, builds the gateway and runs one command
async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
        config.validate()?;
    }
    tracing::debug!(
        api_url = %config.api_url,
        fresh = config.fresh_ttl_secs,
        stale = config.stale_ttl_secs,
        "configuration loaded"
    );

    let client = WordPressClient::new(config.api_url.clone(), config.request_timeout())?;
    let gateway = ContentGateway::new(client, config.policy()?);
    let site = SiteContent::new(gateway, config.api_url.clone());

    match cli.command {
        Command::Get { endpoint, params } => {
            let params = parse_params(&params)?;
            let value = site.gateway().get(&endpoint, &params).await?;
            print_json(&*value)?;
        }
        Command::Pages => print_json(&site.pages().await)?,
        Command::Page { slug } => print_json(&site.page_by_slug(&slug).await)?,
        Command::About => print_json(&site.about().await)?,
        Command::News { page, category } => {
            print_json(&site.posts(page, category, "posts").await)?
        }
        Command::Post { slug } => print_json(&site.post_by_slug(&slug, "posts").await)?,
        Command::Projects { page } => print_json(&site.projects(page).await)?,
        Command::Project { slug } => print_json(&site.project_by_slug(&slug).await)?,
        Command::Events { page } => print_json(&site.events(page).await)?,
        Command::Event { slug } => print_json(&site.event_by_slug(&slug).await)?,
        Command::ReferenceSites => print_json(&site.reference_sites().await)?,
        Command::Media { ids, proxy } => {
            let mut urls = site.media_urls(&ids).await;
            if proxy {
                for url in urls.iter_mut().flatten() {
                    *url = proxy_url(url);
                }
            }
            print_json(&urls)?
        }
    }

    Ok(())
}

use std::net::TcpListener;

use anyhow::Context;
use copro::{configuration::get_configuration, services::DirectoryScraper, startup::run};
use env_logger::Env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let scraper = DirectoryScraper::new(&configuration.scraper)
        .context("Failed to build directory scraper.")?;
    log::info!(
        "Default search page: {} ({:?} on profile failure)",
        scraper.search_query(),
        scraper.failure_policy()
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on {}", address);

    run(listener, scraper)?.await?;

    Ok(())
}

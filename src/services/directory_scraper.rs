use std::time::Duration;

use url::{Origin, Url};
use uuid::Uuid;

use crate::{
    configuration::{FailurePolicy, ScraperSettings},
    domain::{
        company::{CompanyLink, CompanyRecord, CompanyTable, SearchQuery, SkippedProfile},
        selector_rule::CompiledSelectors,
    },
    error::ScrapeError,
};

use super::{collect_links, extract_profile, PageFetcher};

pub struct DirectoryScraper {
    fetcher: PageFetcher,
    selectors: CompiledSelectors,
    origin: String,
    search_query: SearchQuery,
    failure_policy: FailurePolicy,
    allowed_origins: Vec<Origin>,
}

impl DirectoryScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScrapeError> {
        let fetcher = PageFetcher::new(
            Duration::from_secs(settings.request_timeout_secs),
            settings.user_agent.as_deref(),
        )?;
        let selectors = settings.selectors.compile()?;
        let allowed_origins = vec![
            url_origin("origin", &settings.origin)?,
            url_origin("search_url", &settings.search_url)?,
        ];

        Ok(DirectoryScraper {
            fetcher,
            selectors,
            origin: settings.origin.trim_end_matches('/').to_string(),
            search_query: SearchQuery::new(settings.search_url.clone()),
            failure_policy: settings.failure_policy,
            allowed_origins,
        })
    }

    /// Search pages may only live on the configured origin or search host.
    pub fn accepts_search_url(&self, url: &Url) -> bool {
        self.allowed_origins.contains(&url.origin())
    }

    /// The search page configured for this scraper.
    pub fn search_query(&self) -> &SearchQuery {
        &self.search_query
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub async fn collect_links(&self, query: &SearchQuery) -> Result<Vec<CompanyLink>, ScrapeError> {
        collect_links(&self.fetcher, &self.selectors, query).await
    }

    pub async fn extract_profile(&self, link: &CompanyLink) -> Result<CompanyRecord, ScrapeError> {
        extract_profile(&self.fetcher, &self.selectors, &self.origin, link).await
    }

    pub async fn run(&self, query: &SearchQuery) -> Result<CompanyTable, ScrapeError> {
        self.run_with_id(Uuid::new_v4(), query).await
    }

    /// Collects once, then extracts each link in turn. Records keep link order.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        query: &SearchQuery,
    ) -> Result<CompanyTable, ScrapeError> {
        log::info!("[{}] Started directory run on {}", run_id, query);

        let company_links = self.collect_links(query).await?;
        let mut table = CompanyTable::default();

        for link in company_links {
            match self.extract_profile(&link).await {
                Ok(record) => table.records.push(record),
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        log::error!("[{}] Aborting run on {}: {}", run_id, link, e);
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        log::warn!("[{}] Skipping {}: {}", run_id, link, e);
                        table.skipped.push(SkippedProfile {
                            link,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        log::info!(
            "[{}] Finished with {} records, {} skipped",
            run_id,
            table.records.len(),
            table.skipped.len()
        );

        Ok(table)
    }
}

fn url_origin(field: &'static str, value: &str) -> Result<Origin, ScrapeError> {
    let url = Url::parse(value).map_err(|e| ScrapeError::InvalidUrl {
        field,
        reason: format!("`{}`: {}", value, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url.origin()),
        scheme => Err(ScrapeError::InvalidUrl {
            field,
            reason: format!("unsupported scheme `{}`", scheme),
        }),
    }
}

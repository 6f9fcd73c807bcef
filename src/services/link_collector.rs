use scraper::Html;

use crate::{
    domain::{
        company::{CompanyLink, SearchQuery},
        selector_rule::{CompiledSelectors, Lookup},
    },
    error::ScrapeError,
};

use super::PageFetcher;

pub async fn collect_links(
    fetcher: &PageFetcher,
    selectors: &CompiledSelectors,
    query: &SearchQuery,
) -> Result<Vec<CompanyLink>, ScrapeError> {
    let html_content = fetcher.fetch_text(query.as_str()).await?;
    let links = links_from_html(&html_content, selectors, query.as_str())?;

    log::info!("Found {} profile links on {}", links.len(), query);

    Ok(links)
}

/// One link per profile card heading, in document order.
pub fn links_from_html(
    html_content: &str,
    selectors: &CompiledSelectors,
    page_url: &str,
) -> Result<Vec<CompanyLink>, ScrapeError> {
    let html_document = Html::parse_document(html_content);

    html_document
        .select(&selectors.profile_card)
        .map(|heading| match selectors.profile_link.apply(heading) {
            Lookup::Found(href) => Ok(CompanyLink::new(href)),
            Lookup::Empty | Lookup::Missing => Err(ScrapeError::RequiredFieldMissing {
                field: "profile_link",
                url: page_url.to_string(),
            }),
        })
        .collect()
}

use scraper::Html;

use crate::{
    domain::{
        company::{CompanyLink, CompanyRecord},
        selector_rule::{CompiledRule, CompiledSelectors, Lookup},
    },
    error::ScrapeError,
};

use super::PageFetcher;

pub async fn extract_profile(
    fetcher: &PageFetcher,
    selectors: &CompiledSelectors,
    origin: &str,
    link: &CompanyLink,
) -> Result<CompanyRecord, ScrapeError> {
    let company_url = link.absolute_url(origin);
    log::info!("Scraping company profile: {}", company_url);

    let html_content = fetcher.fetch_text(&company_url).await?;
    profile_from_html(&html_content, selectors, company_url)
}

/// Builds a record from a profile page. Required fields fail the whole record.
pub fn profile_from_html(
    html_content: &str,
    selectors: &CompiledSelectors,
    company_url: String,
) -> Result<CompanyRecord, ScrapeError> {
    let html_document = Html::parse_document(html_content);

    let name = required(&html_document, &selectors.name, "name", &company_url)?;
    let address = required(&html_document, &selectors.address, "address", &company_url)?;
    let website = required(&html_document, &selectors.website, "website", &company_url)?;

    let business_description = match selectors
        .business_description
        .apply_document(&html_document)
    {
        Lookup::Found(text) => Some(text),
        Lookup::Empty => {
            log::warn!(
                "Description block on {} has no paragraph, leaving it empty",
                company_url
            );
            None
        }
        Lookup::Missing => None,
    };

    // Positional lookup, the site exposes no class or id on this node
    let phone_number = selectors
        .phone_number
        .apply_document(&html_document)
        .found();

    Ok(CompanyRecord {
        name,
        address,
        website,
        thomasnet_company_url: company_url,
        business_description,
        phone_number,
    })
}

fn required(
    html_document: &Html,
    rule: &CompiledRule,
    field: &'static str,
    company_url: &str,
) -> Result<String, ScrapeError> {
    rule.apply_document(html_document)
        .found()
        .map(|value| value.replace('\n', ""))
        .ok_or_else(|| ScrapeError::RequiredFieldMissing {
            field,
            url: company_url.to_string(),
        })
}

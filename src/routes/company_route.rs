use actix_web::{get, http::header::ContentType, web, HttpResponse};
use askama::Template;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{
    domain::company::{CompanyRecord, CompanyTable, SearchQuery, SkippedProfile},
    error::ScrapeError,
    services::DirectoryScraper,
};

#[derive(Deserialize)]
pub struct CompaniesQuery {
    /// Search page to run against instead of the configured one.
    pub url: Option<String>,
}

#[derive(Serialize)]
struct CompaniesResponse {
    run_id: Uuid,
    columns: &'static [&'static str],
    records: Vec<CompanyRecord>,
    skipped: Vec<SkippedProfile>,
}

#[derive(Template)]
#[template(path = "companies.html")]
struct CompaniesTemplate<'a> {
    run_id: Uuid,
    search_url: &'a str,
    columns: &'static [&'static str],
    records: &'a [CompanyRecord],
    skipped: &'a [SkippedProfile],
}

#[get("")]
pub async fn get_companies(
    scraper: web::Data<DirectoryScraper>,
    query: web::Query<CompaniesQuery>,
) -> HttpResponse {
    let run_id = Uuid::new_v4();
    let (_, table) = match scrape(&scraper, query.into_inner(), run_id).await {
        Ok(result) => result,
        Err(res) => return res,
    };

    HttpResponse::Ok().json(CompaniesResponse {
        run_id,
        columns: table.columns(),
        records: table.records,
        skipped: table.skipped,
    })
}

#[get("/csv")]
pub async fn get_companies_csv(
    scraper: web::Data<DirectoryScraper>,
    query: web::Query<CompaniesQuery>,
) -> HttpResponse {
    let run_id = Uuid::new_v4();
    let (_, table) = match scrape(&scraper, query.into_inner(), run_id).await {
        Ok(result) => result,
        Err(res) => return res,
    };

    match table.to_csv() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(("Content-Disposition", "attachment; filename=\"companies.csv\""))
            .body(body),
        Err(e) => {
            log::error!("[{}] Failed to write csv: {:?}", run_id, e);
            HttpResponse::InternalServerError().body(format!("Failed to write csv: {}", e))
        }
    }
}

#[get("/table")]
pub async fn get_companies_table(
    scraper: web::Data<DirectoryScraper>,
    query: web::Query<CompaniesQuery>,
) -> HttpResponse {
    let run_id = Uuid::new_v4();
    let (search_query, table) = match scrape(&scraper, query.into_inner(), run_id).await {
        Ok(result) => result,
        Err(res) => return res,
    };

    let page = CompaniesTemplate {
        run_id,
        search_url: search_query.as_str(),
        columns: table.columns(),
        records: &table.records,
        skipped: &table.skipped,
    };

    match page.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            log::error!("[{}] Failed to render table: {:?}", run_id, e);
            HttpResponse::InternalServerError().body("Failed to render table")
        }
    }
}

async fn scrape(
    scraper: &DirectoryScraper,
    query: CompaniesQuery,
    run_id: Uuid,
) -> Result<(SearchQuery, CompanyTable), HttpResponse> {
    let search_query = match query.url {
        Some(url) => match Url::parse(&url) {
            Ok(parsed) if scraper.accepts_search_url(&parsed) => SearchQuery::new(url),
            _ => {
                log::warn!("[{}] Refusing search url outside the directory: {}", run_id, url);
                return Err(HttpResponse::BadRequest()
                    .body(format!("Search url must be on the directory site: {}", url)));
            }
        },
        None => scraper.search_query().clone(),
    };

    match scraper.run_with_id(run_id, &search_query).await {
        Ok(table) => Ok((search_query, table)),
        Err(e) => Err(error_response(run_id, &e)),
    }
}

fn error_response(run_id: Uuid, e: &ScrapeError) -> HttpResponse {
    log::error!("[{}] Run failed: {}", run_id, e);
    let body = format!("Run {} failed: {}", run_id, e);

    match e.is_upstream() {
        true => HttpResponse::BadGateway().body(body),
        false => HttpResponse::InternalServerError().body(body),
    }
}

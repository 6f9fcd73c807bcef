use actix_web::{test, web, App};
use copro::{
    configuration::{FailurePolicy, ScraperSettings},
    domain::company::SearchQuery,
    error::ScrapeError,
    services::DirectoryScraper,
    startup::routes,
};
use mockito::{Mock, ServerGuard};

const COMPLETE: &str = include_str!("fixtures/profile_complete.html");
const NO_PHONE: &str = include_str!("fixtures/profile_no_phone.html");

const ACME: &str = "/profile/01011221/acme-foods.html";
const BETA: &str = "/profile/30062254/beta-bakery.html";

fn search_page(links: &[&str]) -> String {
    let cards: String = links
        .iter()
        .map(|link| {
            format!(
                r#"<div class="profile-card"><h2 class="profile-card__title"><a href="{}">x</a></h2></div>"#,
                link
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", cards)
}

fn scraper(server: &ServerGuard, failure_policy: FailurePolicy) -> DirectoryScraper {
    DirectoryScraper::new(&ScraperSettings {
        search_url: format!("{}/nsearch.html", server.url()),
        origin: server.url(),
        request_timeout_secs: 5,
        user_agent: Some("copro-test".to_string()),
        failure_policy,
        ..ScraperSettings::default()
    })
    .unwrap()
}

async fn serve(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn run_returns_one_record_per_heading_in_order() {
    let mut server = mockito::Server::new_async().await;
    let search = serve(&mut server, "/nsearch.html", 200, &search_page(&[ACME, BETA])).await;
    let acme = serve(&mut server, ACME, 200, COMPLETE).await;
    let beta = serve(&mut server, BETA, 200, NO_PHONE).await;
    let scraper = scraper(&server, FailurePolicy::Abort);

    let table = scraper.run(&scraper.search_query().clone()).await.unwrap();

    assert_eq!(table.len(), 2);
    assert!(table.skipped.is_empty());

    let first = &table.records[0];
    assert_eq!(first.name, "Acme Foods Inc.");
    assert_eq!(first.address, "100 Main Street, Springfield, IL 62701");
    assert_eq!(first.website, "https://www.acmefoods.example");
    assert_eq!(first.thomasnet_company_url, format!("{}{}", server.url(), ACME));
    assert!(first.business_description.is_some());
    assert_eq!(first.phone_number.as_deref(), Some("(217) 555-0100"));

    let second = &table.records[1];
    assert_eq!(second.name, "Beta Bakery LLC");
    assert_eq!(second.thomasnet_company_url, format!("{}{}", server.url(), BETA));
    assert!(second.business_description.is_some());
    assert_eq!(second.phone_number, None);

    search.assert_async().await;
    acme.assert_async().await;
    beta.assert_async().await;
}

#[tokio::test]
async fn empty_search_page_gives_empty_table() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/other.html", 200, &search_page(&[])).await;
    let scraper = scraper(&server, FailurePolicy::Abort);

    let table = scraper
        .run(&SearchQuery::new(format!("{}/other.html", server.url())))
        .await
        .unwrap();

    assert!(table.is_empty());
}

#[tokio::test]
async fn failing_profile_aborts_by_default() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/nsearch.html", 200, &search_page(&[ACME, BETA])).await;
    let _acme = serve(&mut server, ACME, 500, "").await;
    let beta = server
        .mock("GET", BETA)
        .with_status(200)
        .with_body(NO_PHONE)
        .expect(0)
        .create_async()
        .await;
    let scraper = scraper(&server, FailurePolicy::Abort);

    let result = scraper.run(&scraper.search_query().clone()).await;

    match result {
        Err(ScrapeError::Status { url, status }) => {
            assert_eq!(url, format!("{}{}", server.url(), ACME));
            assert_eq!(status.as_u16(), 500);
        }
        other => panic!("expected status error, got {:?}", other),
    }
    beta.assert_async().await;
}

#[tokio::test]
async fn skip_policy_keeps_remaining_records() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/nsearch.html", 200, &search_page(&[ACME, BETA])).await;
    let _acme = serve(
        &mut server,
        ACME,
        200,
        include_str!("fixtures/profile_missing_name.html"),
    )
    .await;
    let _beta = serve(&mut server, BETA, 200, NO_PHONE).await;
    let scraper = scraper(&server, FailurePolicy::Skip);

    let table = scraper.run(&scraper.search_query().clone()).await.unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.records[0].name, "Beta Bakery LLC");
    assert_eq!(table.skipped.len(), 1);
    assert_eq!(table.skipped[0].link.as_str(), ACME);
    assert!(table.skipped[0].reason.contains("`name`"));
}

#[actix_web::test]
async fn companies_route_serves_json_and_csv() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/nsearch.html", 200, &search_page(&[ACME, BETA])).await;
    let _acme = serve(&mut server, ACME, 200, COMPLETE).await;
    let _beta = serve(&mut server, BETA, 200, NO_PHONE).await;
    let app = test::init_service(
        App::new()
            .configure(routes)
            .app_data(web::Data::new(scraper(&server, FailurePolicy::Abort))),
    )
    .await;

    let req = test::TestRequest::get().uri("/companies").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(json["records"].as_array().unwrap().len(), 2);
    assert_eq!(json["records"][0]["name"], "Acme Foods Inc.");
    assert!(json["records"][1]["phone_number"].is_null());
    assert_eq!(json["columns"][3], "thomasnet_company_url");

    let req = test::TestRequest::get().uri("/companies/csv").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let csv = String::from_utf8(body.to_vec()).unwrap();

    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("name,address,website,thomasnet_company_url"));
}

#[actix_web::test]
async fn companies_route_rejects_non_http_url_and_reports_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/nsearch.html", 404, "").await;
    let app = test::init_service(
        App::new()
            .configure(routes)
            .app_data(web::Data::new(scraper(&server, FailurePolicy::Abort))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/companies?url=ftp%3A%2F%2Fexample.com")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);

    let req = test::TestRequest::get().uri("/companies").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 502);
}

#[actix_web::test]
async fn companies_route_refuses_search_url_on_foreign_host() {
    let server = mockito::Server::new_async().await;
    let mut foreign = mockito::Server::new_async().await;
    let internal = foreign
        .mock("GET", "/latest/meta-data/")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;
    let app = test::init_service(
        App::new()
            .configure(routes)
            .app_data(web::Data::new(scraper(&server, FailurePolicy::Abort))),
    )
    .await;

    let target = format!("{}/latest/meta-data/", foreign.url());
    let req = test::TestRequest::get()
        .uri(&format!("/companies?url={}", target.replace(':', "%3A").replace('/', "%2F")))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status().as_u16(), 400);
    internal.assert_async().await;
}

#[actix_web::test]
async fn companies_table_shows_blank_phone_and_skipped_links() {
    let mut server = mockito::Server::new_async().await;
    let _search = serve(&mut server, "/nsearch.html", 200, &search_page(&[ACME, BETA])).await;
    let _acme = serve(
        &mut server,
        ACME,
        200,
        include_str!("fixtures/profile_missing_name.html"),
    )
    .await;
    let _beta = serve(&mut server, BETA, 200, NO_PHONE).await;
    let app = test::init_service(
        App::new()
            .configure(routes)
            .app_data(web::Data::new(scraper(&server, FailurePolicy::Skip))),
    )
    .await;

    let req = test::TestRequest::get().uri("/companies/table").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 200);

    let body = test::read_body(res).await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert!(html.contains("Beta Bakery LLC"));
    assert!(html.contains("<td></td>"));
    assert!(html.contains("<h2>Skipped</h2>"));
    assert!(html.contains("acme-foods.html"));
    assert!(html.contains("required field `name` not found"));
}

use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{company_route, default_route},
    services::DirectoryScraper,
};

pub fn run(listener: TcpListener, scraper: DirectoryScraper) -> Result<Server, std::io::Error> {
    let scraper = web::Data::new(scraper);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(routes)
            .app_data(scraper.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(default_route::default).service(
        web::scope("/companies")
            .service(company_route::get_companies)
            .service(company_route::get_companies_csv)
            .service(company_route::get_companies_table),
    );
}

use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use employee_registry_backend::config::Config;
use employee_registry_backend::db;
use employee_registry_backend::routes;
use employee_registry_backend::services::admin::AdminGate;
use employee_registry_backend::services::employee::EmployeeService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let store = db::connect(&config.database_url)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let employees = web::Data::new(EmployeeService::new(store));
    let gate = web::Data::new(AdminGate::new(config.admin.clone()));
    let allowed_origins = config.allowed_origins.clone();

    info!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors(&allowed_origins))
            .wrap(Logger::default())
            .app_data(employees.clone())
            .app_data(gate.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

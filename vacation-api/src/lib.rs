#[macro_use]
extern crate rocket;

use rocket::figment::value::Map;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod admin_init_fairing;
pub mod api;
pub mod calendar;
pub mod config;
pub mod logged_json;
pub mod models;
pub mod offline_schema;
pub mod orm;
pub use orm::{DbConn, OfflineDbConn};
pub mod schema;
pub mod session_guards;

fn error_body(message: &str, req: &Request, status: u16) -> Json<Value> {
    Json(json!({
        "error": message,
        "path": req.uri().path().to_string(),
        "status": status
    }))
}

#[catch(400)]
fn bad_request(req: &Request) -> Json<Value> {
    error_body("Bad Request", req, 400)
}

#[catch(401)]
fn unauthorized(req: &Request) -> Json<Value> {
    error_body("Unauthorized", req, 401)
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<Value> {
    error_body("Forbidden", req, 403)
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    error_body("Not Found", req, 404)
}

#[catch(409)]
fn conflict(req: &Request) -> Json<Value> {
    error_body("Conflict", req, 409)
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    error_body("Unprocessable Entity", req, 422)
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    error_body("Internal Server Error", req, 500)
}

#[catch(503)]
fn service_unavailable(req: &Request) -> Json<Value> {
    error_body("Service Unavailable", req, 503)
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<Value> {
    error_body(status.reason().unwrap_or("Unknown Error"), req, status.code)
}

pub fn register_catchers(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.register(
        "/",
        catchers![
            bad_request,
            unauthorized,
            forbidden,
            not_found,
            conflict,
            unprocessable_entity,
            internal_server_error,
            service_unavailable,
            default_catcher
        ],
    )
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes())
}

fn log_database_url(figment: &Figment, name: &str) {
    match figment.extract_inner::<Map<String, Value>>(&format!("databases.{}", name)) {
        Ok(db_config) => {
            if let Some(Value::String(url)) = db_config.get("url") {
                info!("Database '{}' URL: {}", name, url);
            } else {
                warn!("Database '{}' URL not found in configuration", name);
            }
        }
        Err(e) => {
            warn!("Failed to extract '{}' configuration: {}", name, e);
        }
    }
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    log_database_url(figment, "sqlite_db");
    log_database_url(figment, "offline_db");
}

/// Builds the server from `Rocket.toml`, `ROCKET_*` variables and the
/// optional `DATABASE_URL` / `OFFLINE_DATABASE_URL` overrides.
///
/// Tests use `orm::testing::test_rocket` instead, which sets up
/// in-memory databases.
pub fn rocket() -> Rocket<Build> {
    dotenvy::dotenv().ok();

    let mut figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global());
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        figment = figment.merge(("databases.sqlite_db.url", database_url));
    }
    if let Ok(offline_url) = std::env::var("OFFLINE_DATABASE_URL") {
        figment = figment.merge(("databases.offline_db.url", offline_url));
    }

    let rocket = rocket::custom(figment)
        .attach(config::config_fairing())
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(OfflineDbConn::fairing())
        .attach(orm::offline::run_offline_migrations_fairing())
        .attach(admin_init_fairing::admin_init_fairing());

    log_rocket_info(&rocket);

    register_catchers(mount_api_routes(rocket))
}

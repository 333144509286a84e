//! Commands that talk to a running server instead of the database.
//!
//! A remembered session lives in the encrypted [`CredentialCache`]; the
//! employee overview is kept as a snapshot and reused while it is fresh.

use clap::Subcommand;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils::prompt_for_login_password;
use crate::credential_cache::{CredentialCache, SNAPSHOT_MAX_AGE, SavedCredentials};

pub const SERVER_URL_ENV: &str = "VACATION_SERVER_URL";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const SESSION_COOKIE: &str = "session";

#[derive(Subcommand)]
pub enum RemoteAction {
    #[command(about = "Log in to the server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(short, long, help = "Password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(short, long, help = "Keep the session for later commands")]
        remember_me: bool,
    },
    #[command(about = "End the remembered session")]
    Logout {
        #[arg(long, help = "Also delete the snapshot and the generated cache key")]
        all: bool,
    },
    #[command(about = "Show the employee overview")]
    Employees {
        #[arg(short, long, help = "Ignore the cached snapshot")]
        refresh: bool,
    },
    #[command(about = "Show who the remembered session belongs to")]
    Whoami,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    username: String,
    name: String,
    role: String,
    #[serde(default)]
    offline: bool,
}

/// Server base URL from `VACATION_SERVER_URL`, without a trailing slash.
pub fn server_url() -> String {
    std::env::var(SERVER_URL_ENV)
        .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

pub async fn handle_remote_command(
    server: &str,
    cache: &CredentialCache,
    action: RemoteAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new();
    match action {
        RemoteAction::Login {
            username,
            password,
            remember_me,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_login_password()?,
            };
            // A remembered session still occupies one of the session slots.
            if cache.has_saved_credentials() {
                remote_logout(&client, server, cache).await?;
            }
            remote_login(&client, server, cache, &username, &password, remember_me).await?;
        }
        RemoteAction::Logout { all } => {
            remote_logout(&client, server, cache).await?;
            if all {
                cache.clear_all()?;
                println!("Local cache cleared.");
            }
        }
        RemoteAction::Employees { refresh } => {
            let overview = remote_employees(&client, server, cache, refresh).await?;
            print_overview(&overview);
        }
        RemoteAction::Whoami => {
            let creds = require_credentials(cache)?;
            let response = with_session(client.get(api_url(server, "hello")), &creds)
                .send()
                .await?;
            let me: LoginReply = checked(response, cache).await?.json().await?;
            println!("{} ({}), role: {}", me.name, me.username, me.role);
            println!("Session remembered since {}", creds.saved_at.format("%d.%m.%Y %H:%M UTC"));
        }
    }
    Ok(())
}

fn api_url(server: &str, path: &str) -> String {
    format!("{}/api/1/{}", server, path)
}

fn with_session(request: RequestBuilder, creds: &SavedCredentials) -> RequestBuilder {
    request.header(header::COOKIE, cookie_header(&creds.session_token))
}

fn cookie_header(token: &str) -> String {
    format!("{}={}", SESSION_COOKIE, token)
}

fn require_credentials(
    cache: &CredentialCache,
) -> Result<SavedCredentials, Box<dyn std::error::Error>> {
    cache
        .load_credentials()?
        .ok_or_else(|| "Not logged in. Run `remote login <username> --remember-me` first.".into())
}

/// The `error` field of a JSON error body, or the status text.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

/// Passes successful responses through. A 401 means the remembered session
/// is gone, so the stored credentials are dropped.
async fn checked(
    response: Response,
    cache: &CredentialCache,
) -> Result<Response, Box<dyn std::error::Error>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        cache.save_credentials("", "", false)?;
        cache.invalidate_snapshot()?;
        return Err("Session expired. Log in again.".into());
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("{} ({})", error_message(status, &body), status.as_u16()).into())
}

pub async fn remote_login(
    client: &Client,
    server: &str,
    cache: &CredentialCache,
    username: &str,
    password: &str,
    remember_me: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(api_url(server, "login"))
        .json(&LoginRequest { username, password })
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Login failed: {}", error_message(status, &body)).into());
    }

    let token = response
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string());
    let reply: LoginReply = response.json().await?;

    if reply.offline {
        println!(
            "Logged in offline as {} ({}). The server could not reach its database; no session was created.",
            reply.name, reply.role
        );
        return Ok(());
    }
    let token = token.ok_or("Server did not return a session cookie")?;

    cache.invalidate_snapshot()?;
    if remember_me {
        cache.save_credentials(&reply.username, &token, true)?;
        println!("Logged in as {} ({}). Session remembered.", reply.name, reply.role);
    } else {
        // Release the session slot right away.
        client
            .post(api_url(server, "logout"))
            .header(header::COOKIE, cookie_header(&token))
            .send()
            .await?;
        cache.save_credentials(&reply.username, "", false)?;
        println!(
            "Credentials verified for {} ({}). Use --remember-me to stay logged in.",
            reply.name, reply.role
        );
    }
    Ok(())
}

pub async fn remote_logout(
    client: &Client,
    server: &str,
    cache: &CredentialCache,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(creds) = cache.load_credentials()? else {
        println!("Not logged in.");
        return Ok(());
    };
    let result = with_session(client.post(api_url(server, "logout")), &creds)
        .send()
        .await;
    cache.save_credentials(&creds.username, "", false)?;
    cache.invalidate_snapshot()?;
    result?;
    println!("Logged out {}.", creds.username);
    Ok(())
}

/// Employee overview, from the snapshot while it is fresh and from the
/// server otherwise.
pub async fn remote_employees(
    client: &Client,
    server: &str,
    cache: &CredentialCache,
    refresh: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    if !refresh {
        if let Some(snapshot) = fresh_snapshot(cache)? {
            println!("(cached)");
            return Ok(snapshot);
        }
    }

    let creds = require_credentials(cache)?;
    let response = with_session(client.get(api_url(server, "employees/overview")), &creds)
        .send()
        .await?;
    let overview: Value = checked(response, cache).await?.json().await?;
    cache.save_snapshot(&overview)?;
    Ok(overview)
}

/// A regular employee's overview holds only their own row and may be reused
/// for longer than the full list an admin sees.
fn fresh_snapshot(
    cache: &CredentialCache,
) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if !cache.is_snapshot_valid_for_user() {
        return Ok(None);
    }
    let Some(snapshot) = cache.load_snapshot()? else {
        return Ok(None);
    };
    let own_row_only = snapshot.as_array().is_some_and(|rows| rows.len() == 1);
    if own_row_only || cache.is_snapshot_valid(SNAPSHOT_MAX_AGE) {
        Ok(Some(snapshot))
    } else {
        Ok(None)
    }
}

fn overview_lines(overview: &Value) -> Vec<String> {
    let Some(rows) = overview.as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            let employee = &row["employee"];
            format!(
                "  {} ({}), Used: {}, Remaining: {}, Sessions: {}",
                employee["name"].as_str().unwrap_or("?"),
                employee["username"].as_str().unwrap_or("?"),
                row["used_days"].as_i64().unwrap_or(0),
                row["remaining_days"].as_i64().unwrap_or(0),
                row["active_session_count"].as_i64().unwrap_or(0),
            )
        })
        .collect()
}

fn print_overview(overview: &Value) {
    let lines = overview_lines(overview);
    if lines.is_empty() {
        println!("No employees found.");
    } else {
        println!("Employees:");
        for line in lines {
            println!("{}", line);
        }
    }
}

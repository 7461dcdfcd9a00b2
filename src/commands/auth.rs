use crate::api::ApiClient;
use crate::error::{ErrorKind, TmError};
use crate::format::{Column, is_non_empty, render_card};
use crate::prompt;
use serde_json::{Value, json};
use tracing::debug;

const USER_CARD: &[Column] = &[
    Column::new("name", "NAME"),
    Column::new("email", "EMAIL"),
    Column::new("id", "ID"),
    Column::new("credits", "CREDITS"),
];

pub async fn register(
    client: &ApiClient,
    email: &str,
    name: Option<String>,
    password: Option<String>,
) -> Result<(), TmError> {
    let password = obtain_password(password)?;
    let mut body = json!({ "email": email, "password": password });
    if let Some(name) = name {
        body["name"] = json!(name);
    }
    let payload = client.post("/auth/register", &body).await?;
    finish_sign_in(client, &payload).await?;
    println!("Account created. Logged in as {email}.");
    Ok(())
}

pub async fn login(
    client: &ApiClient,
    email: &str,
    password: Option<String>,
) -> Result<(), TmError> {
    let password = obtain_password(password)?;
    let body = json!({ "email": email, "password": password });
    let payload = client.post("/auth/login", &body).await?;
    finish_sign_in(client, &payload).await?;
    println!("Logged in as {email}.");
    Ok(())
}

/// Sign out. Local auth state is dropped whether or not the server call
/// succeeds, so a dead server can never wedge the client in a half
/// signed-in state.
pub async fn logout(client: &ApiClient) -> Result<(), TmError> {
    let result = client.post("/auth/logout", &json!({})).await;
    client.session().clear_auth()?;
    if let Err(err) = result {
        debug!("remote logout failed: {err}");
    }
    println!("Logged out.");
    Ok(())
}

/// Ask the server who we are. The cached profile is refreshed from the
/// answer; an anonymous session is an answer too, not a failure.
pub async fn whoami(client: &ApiClient) -> Result<(), TmError> {
    let payload = match client.get("/auth/status").await {
        Ok(payload) => payload,
        Err(err) if err.kind() == ErrorKind::Unauthorized => {
            println!("Not logged in.");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let authenticated = payload
        .get("authenticated")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let user = payload
        .get("user")
        .filter(|u| is_non_empty(u))
        .cloned()
        .or_else(|| payload.get("email").map(|_| payload.clone()));

    match user {
        Some(user) if authenticated => {
            client.session().set_user(user.clone())?;
            println!("{}", render_card(&user, USER_CARD));
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

pub async fn profile(
    client: &ApiClient,
    name: Option<String>,
    bio: Option<String>,
    email: Option<String>,
) -> Result<(), TmError> {
    let mut body = serde_json::Map::new();
    if let Some(name) = name {
        body.insert("name".into(), json!(name));
    }
    if let Some(bio) = bio {
        body.insert("bio".into(), json!(bio));
    }
    if let Some(email) = email {
        body.insert("email".into(), json!(email));
    }
    if body.is_empty() {
        return Err(TmError::Validation(
            "Provide at least one of --name, --bio or --email".into(),
        ));
    }

    let payload = client.patch("/profile", &Value::Object(body)).await?;
    if let Some(user) = payload.get("user").filter(|u| is_non_empty(u)) {
        client.session().set_user(user.clone())?;
    }
    println!("Profile updated.");
    Ok(())
}

fn obtain_password(flag: Option<String>) -> Result<String, TmError> {
    let password = match flag {
        Some(password) => password,
        None => prompt::read_password("Password: ")?,
    };
    if password.is_empty() {
        return Err(TmError::Validation("Password must not be empty".into()));
    }
    Ok(password)
}

/// Shared login/register epilogue: cache the returned profile, then fetch a
/// CSRF token and the authoritative account state. The follow-ups are
/// best-effort; the session cookie was already captured from the response.
async fn finish_sign_in(client: &ApiClient, payload: &Value) -> Result<(), TmError> {
    if let Some(user) = payload.get("user").filter(|u| is_non_empty(u)) {
        client.session().set_user(user.clone())?;
    }
    if let Err(err) = client.fetch_csrf_token().await {
        debug!("csrf token fetch failed: {err}");
    }
    match client.get("/auth/status").await {
        Ok(status) => {
            if let Some(user) = status.get("user").filter(|u| is_non_empty(u)) {
                client.session().set_user(user.clone())?;
            }
        }
        Err(err) => debug!("auth status refresh failed: {err}"),
    }
    Ok(())
}

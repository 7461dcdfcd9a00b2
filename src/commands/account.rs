use crate::api::ApiClient;
use crate::commands::{
    extract_list, print_list, resolve_product_id, shorten_timestamps, try_extract_list,
};
use crate::error::TmError;
use crate::format::{Column, render_card, render_table, value_to_cell};
use crate::pipeline::Shape;
use crate::store::{Location, Session};
use serde_json::{Value, json};
use url::Url;

const CONFIG_CARD: &[Column] = &[
    Column::new("apiBase", "API BASE"),
    Column::new("cookieName", "COOKIE NAME"),
    Column::new("session", "SESSION"),
    Column::new("account", "ACCOUNT"),
    Column::new("location", "LOCATION"),
];

const ALIAS_COLUMNS: &[Column] = &[
    Column::new("name", "NAME"),
    Column::new("target", "TARGET"),
    Column::new("id", "ID"),
];

const REWARD_COLUMNS: &[Column] = &[
    Column::new("name", "NAME"),
    Column::new("points", "POINTS"),
    Column::new("reason", "REASON"),
    Column::new("earnedAt", "EARNED"),
];

const REWARD_CARD: &[Column] = &[
    Column::new("balance", "BALANCE"),
    Column::new("points", "POINTS"),
    Column::new("tier", "TIER"),
];

const SUBSCRIPTION_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("product.name", "PRODUCT"),
    Column::new("frequency", "FREQ"),
    Column::new("dayOfWeek", "DAY"),
    Column::new("status", "STATUS"),
];

const WISHLIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("product.name", "PRODUCT"),
    Column::new("product.price", "PRICE"),
    Column::new("createdAt", "ADDED"),
];

const WEBHOOK_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("url", "URL"),
    Column::new("events", "EVENTS"),
];

const FREQUENCIES: &[&str] = &["daily", "weekly", "monthly"];
const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub fn location_set(session: &Session, city: &str, country: &str) -> Result<(), TmError> {
    let location = Location {
        city: city.to_string(),
        country: country.to_string(),
    };
    session.set_location(&location)?;
    println!("Location set to {city}, {country}.");
    Ok(())
}

pub fn location_show(session: &Session) -> Result<(), TmError> {
    match session.location() {
        Some(location) => println!("{}, {}", location.city, location.country),
        None => println!("No location set."),
    }
    Ok(())
}

pub fn location_clear(session: &Session) -> Result<(), TmError> {
    session.clear_location()?;
    println!("Location cleared.");
    Ok(())
}

pub fn config_show(session: &Session) -> Result<(), TmError> {
    let location = session
        .location()
        .map(|l| format!("{}, {}", l.city, l.country));
    let account = session
        .user()
        .and_then(|u| u.get("email").cloned())
        .unwrap_or(Value::Null);
    let snapshot = json!({
        "apiBase": session.api_base(),
        "cookieName": session.cookie_name(),
        "session": if session.session_cookie().is_some() { "active" } else { "none" },
        "account": account,
        "location": location,
    });
    println!("{}", render_card(&snapshot, CONFIG_CARD));
    Ok(())
}

pub fn config_set_api(session: &Session, url: &str) -> Result<(), TmError> {
    let parsed = Url::parse(url)
        .map_err(|_| TmError::Validation(format!("'{url}' is not a valid URL")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TmError::Validation(
            "API base must be an http(s) URL".into(),
        ));
    }
    session.set_api_base(url)?;
    println!("API base set to {url}.");
    Ok(())
}

pub fn config_set_cookie_name(session: &Session, name: &str) -> Result<(), TmError> {
    if name.trim().is_empty() {
        return Err(TmError::Validation("Cookie name must not be empty".into()));
    }
    session.set_cookie_name(name.trim())?;
    println!("Session cookie name set to {}.", name.trim());
    Ok(())
}

pub fn config_reset(session: &Session) -> Result<(), TmError> {
    session.reset()?;
    println!("Local state cleared.");
    Ok(())
}

pub async fn alias_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/aliases").await?;
    print_list(
        extract_list(&payload),
        ALIAS_COLUMNS,
        &Shape::default(),
    );
    Ok(())
}

pub async fn alias_add(client: &ApiClient, name: &str, target: &str) -> Result<(), TmError> {
    client
        .post("/aliases", &json!({ "name": name, "target": target }))
        .await?;
    println!("Alias '{name}' created.");
    Ok(())
}

pub async fn alias_update(client: &ApiClient, name: &str, target: &str) -> Result<(), TmError> {
    client
        .patch(&format!("/aliases/{name}"), &json!({ "target": target }))
        .await?;
    println!("Alias '{name}' updated.");
    Ok(())
}

pub async fn alias_rm(client: &ApiClient, name: &str) -> Result<(), TmError> {
    client.delete(&format!("/aliases/{name}")).await?;
    println!("Alias '{name}' removed.");
    Ok(())
}

/// Rewards come back as either an earned-reward list or a single balance
/// object, depending on the account.
pub async fn rewards(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/rewards").await?;
    match try_extract_list(&payload) {
        Some(mut items) => {
            shorten_timestamps(&mut items, &["earnedAt"]);
            println!("{}", render_table(&items, REWARD_COLUMNS));
        }
        None => println!("{}", render_card(&payload, REWARD_CARD)),
    }
    Ok(())
}

pub async fn subs_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/subscriptions").await?;
    print_list(
        extract_list(&payload),
        SUBSCRIPTION_COLUMNS,
        &Shape::default(),
    );
    Ok(())
}

pub async fn subs_create(
    client: &ApiClient,
    product: &str,
    freq: &str,
    day: Option<String>,
) -> Result<(), TmError> {
    let freq = freq.to_lowercase();
    if !FREQUENCIES.contains(&freq.as_str()) {
        return Err(TmError::Validation(
            "Frequency must be daily, weekly or monthly".into(),
        ));
    }
    let day = day.map(|d| d.to_lowercase());
    if freq == "weekly" {
        match day.as_deref() {
            Some(d) if WEEKDAYS.contains(&d) => {}
            Some(d) => {
                return Err(TmError::Validation(format!(
                    "'{d}' is not a day of the week"
                )));
            }
            None => {
                return Err(TmError::Validation(
                    "Weekly subscriptions need --day with a day of the week".into(),
                ));
            }
        }
    }

    let (_, record) = resolve_product_id(client, product).await?;
    let mut body = json!({
        "productId": record["id"],
        "frequency": freq,
    });
    if let Some(day) = day {
        body["dayOfWeek"] = json!(day);
    }
    client.post("/subscriptions", &body).await?;
    println!(
        "Subscribed to {} ({freq}).",
        display_name(&record, product)
    );
    Ok(())
}

pub async fn subs_cancel(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client.delete(&format!("/subscriptions/{id}")).await?;
    println!("Subscription cancelled.");
    Ok(())
}

pub async fn wishlist_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/wishlist").await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["createdAt"]);
    println!("{}", render_table(&items, WISHLIST_COLUMNS));
    Ok(())
}

pub async fn wishlist_add(client: &ApiClient, product: &str) -> Result<(), TmError> {
    let (_, record) = resolve_product_id(client, product).await?;
    client
        .post("/wishlist", &json!({ "productId": record["id"] }))
        .await?;
    println!("Added {} to wishlist.", display_name(&record, product));
    Ok(())
}

pub async fn wishlist_rm(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client.delete(&format!("/wishlist/{id}")).await?;
    println!("Removed from wishlist.");
    Ok(())
}

pub async fn webhooks_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/user/webhooks").await?;
    print_list(
        extract_list(&payload),
        WEBHOOK_COLUMNS,
        &Shape::default(),
    );
    Ok(())
}

pub async fn webhooks_add(
    client: &ApiClient,
    url: &str,
    events: Vec<String>,
) -> Result<(), TmError> {
    let mut body = json!({ "url": url });
    if !events.is_empty() {
        body["events"] = json!(events);
    }
    client.post("/user/webhooks", &body).await?;
    println!("Webhook registered.");
    Ok(())
}

pub async fn webhooks_rm(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client.delete(&format!("/user/webhooks/{id}")).await?;
    println!("Webhook removed.");
    Ok(())
}

fn display_name<'a>(record: &'a Value, fallback: &'a str) -> String {
    let name = value_to_cell(record.get("name").unwrap_or(&Value::Null));
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

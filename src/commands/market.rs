use crate::api::ApiClient;
use crate::commands::{extract_list, id_of, print_list, shorten_timestamps};
use crate::error::TmError;
use crate::format::{Column, render_card, render_table};
use crate::pipeline::Shape;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

const REQUEST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "TITLE"),
    Column::new("budget", "BUDGET"),
    Column::new("status", "STATUS"),
    Column::new("createdAt", "CREATED"),
];

const REQUEST_CARD: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "TITLE"),
    Column::new("description", "DESCRIPTION"),
    Column::new("budget", "BUDGET"),
    Column::new("status", "STATUS"),
    Column::new("user.name", "POSTED BY"),
    Column::new("createdAt", "CREATED"),
];

const PROPOSAL_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("price", "PRICE"),
    Column::new("message", "MESSAGE"),
    Column::new("status", "STATUS"),
    Column::new("createdAt", "CREATED"),
];

const VACANCY_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "TITLE"),
    Column::new("store.name", "STORE"),
    Column::new("location", "LOCATION"),
    Column::new("salary", "SALARY"),
];

const VACANCY_CARD: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "TITLE"),
    Column::new("store.name", "STORE"),
    Column::new("location", "LOCATION"),
    Column::new("salary", "SALARY"),
    Column::new("description", "DESCRIPTION"),
    Column::new("status", "STATUS"),
];

const LIBRARY_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("type", "TYPE"),
    Column::new("createdAt", "ADDED"),
];

pub async fn requests_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/requests").await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["createdAt"]);
    println!("{}", render_table(&items, REQUEST_COLUMNS));
    Ok(())
}

pub async fn requests_create(
    client: &ApiClient,
    title: &str,
    budget: Option<f64>,
    description: Option<&str>,
) -> Result<(), TmError> {
    let mut body = json!({ "title": title });
    if let Some(budget) = budget {
        body["budget"] = json!(budget);
    }
    if let Some(description) = description {
        body["description"] = json!(description);
    }
    let payload = client.post("/requests", &body).await?;
    match id_of(&payload) {
        Some(id) => println!("Request {id} created."),
        None => println!("Request created."),
    }
    Ok(())
}

pub async fn requests_show(client: &ApiClient, id: &str) -> Result<(), TmError> {
    let payload = client.get(&format!("/requests/{id}")).await?;
    println!("{}", render_card(&payload, REQUEST_CARD));

    match client.get(&format!("/requests/{id}/proposals")).await {
        Ok(listing) => {
            let mut proposals = extract_list(&listing);
            if !proposals.is_empty() {
                shorten_timestamps(&mut proposals, &["createdAt"]);
                println!("\nProposals:");
                println!("{}", render_table(&proposals, PROPOSAL_COLUMNS));
            }
        }
        Err(err) => debug!("proposal listing unavailable: {err}"),
    }
    Ok(())
}

pub async fn propose(
    client: &ApiClient,
    id: &str,
    price: Option<f64>,
    message: &str,
) -> Result<(), TmError> {
    let mut body = json!({ "message": message });
    if let Some(price) = price {
        body["price"] = json!(price);
    }
    client
        .post(&format!("/requests/{id}/proposals"), &body)
        .await?;
    println!("Proposal sent.");
    Ok(())
}

pub async fn vacancies(client: &ApiClient, shape: &Shape) -> Result<(), TmError> {
    let payload = client.get("/vacancies").await?;
    print_list(extract_list(&payload), VACANCY_COLUMNS, shape);
    Ok(())
}

pub async fn vacancy(client: &ApiClient, id: &str) -> Result<(), TmError> {
    let payload = client.get(&format!("/vacancies/{id}")).await?;
    println!("{}", render_card(&payload, VACANCY_CARD));
    Ok(())
}

pub async fn apply(
    client: &ApiClient,
    vacancy_id: &str,
    message: Option<&str>,
) -> Result<(), TmError> {
    let mut body = json!({ "vacancyId": vacancy_id });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    client.post("/applications", &body).await?;
    println!("Application sent.");
    Ok(())
}

pub async fn library_list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/library").await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["createdAt"]);
    println!("{}", render_table(&items, LIBRARY_COLUMNS));
    Ok(())
}

pub async fn library_get(
    client: &ApiClient,
    id: &str,
    output: Option<PathBuf>,
) -> Result<(), TmError> {
    let fallback = format!("{id}.bin");
    let (path, bytes) = client
        .download(&format!("/library/{id}/download"), output, &fallback)
        .await?;
    println!("Saved {} ({bytes} bytes).", path.display());
    Ok(())
}

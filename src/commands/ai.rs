use crate::api::ApiClient;
use crate::commands::{checkout_url, extract_list, first_field, open_in_browser, print_list};
use crate::error::TmError;
use crate::format::{Column, render_card};
use crate::pipeline::Shape;
use crate::prompt;
use serde_json::{Value, json};
use tracing::debug;

const MODEL_COLUMNS: &[Column] = &[
    Column::new("name", "NAME"),
    Column::new("type", "TYPE"),
    Column::new("description", "DESCRIPTION"),
    Column::new("cost", "COST"),
];

const CREDITS_CARD: &[Column] = &[
    Column::new("balance", "BALANCE"),
    Column::new("credits", "CREDITS"),
    Column::new("plan", "PLAN"),
];

/// Field names the reply text may arrive under, across model backends.
const OUTPUT_FIELDS: &[&str] = &["output", "message", "response", "text"];

pub async fn models(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/ai/models").await?;
    print_list(extract_list(&payload), MODEL_COLUMNS, &Shape::default());
    Ok(())
}

/// One-shot model invocation. Chat-capable agents go through the stateful
/// chat endpoint so their server-side setup applies; plain models use the
/// stateless run endpoint.
pub async fn run(client: &ApiClient, model: &str, input: Vec<String>) -> Result<(), TmError> {
    let input = input.join(" ");
    if input.trim().is_empty() {
        return Err(TmError::Validation("Input text is required".into()));
    }

    let payload = if chat_capable(&lookup_model(client, model).await) {
        client
            .post("/ai/chat", &chat_body(model, &input, None))
            .await?
    } else {
        client
            .post("/ai/run", &json!({ "model": model, "input": input }))
            .await?
    };
    println!("{}", reply_text(&payload));
    Ok(())
}

/// Interactive chat. The server's response id is echoed back on the next
/// turn so stateful agents keep their conversation context; the client
/// itself stores nothing between turns.
pub async fn chat(client: &ApiClient, model: &str) -> Result<(), TmError> {
    println!("Chatting with {model}. Type 'exit' or press Ctrl-D to end.");
    let mut previous: Option<String> = None;
    loop {
        let Some(line) = prompt::read_line("> ")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        let payload = client
            .post("/ai/chat", &chat_body(model, line, previous.as_deref()))
            .await?;
        previous = first_field(&payload, &["responseId", "id"]);
        println!("{}", reply_text(&payload));
    }
    Ok(())
}

pub async fn credits_show(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/credits").await?;
    println!("{}", render_card(&payload, CREDITS_CARD));
    Ok(())
}

pub async fn credits_buy(client: &ApiClient, pack: &str) -> Result<(), TmError> {
    let payload = client
        .post("/credits/purchase", &json!({ "pack": pack }))
        .await?;
    match checkout_url(&payload) {
        Some(url) => {
            println!("Checkout: {url}");
            open_in_browser(&url, false);
            Ok(())
        }
        None => Err(TmError::NotFound("Checkout URL".into())),
    }
}

fn chat_body(model: &str, message: &str, previous: Option<&str>) -> Value {
    let mut body = json!({ "model": model, "message": message });
    if let Some(previous) = previous {
        body["previousResponseId"] = json!(previous);
    }
    body
}

fn reply_text(payload: &Value) -> String {
    first_field(payload, OUTPUT_FIELDS).unwrap_or_else(|| payload.to_string())
}

fn chat_capable(info: &Option<Value>) -> bool {
    let Some(info) = info else { return false };
    info.get("chat").and_then(Value::as_bool).unwrap_or(false)
        || info.get("chatCapable").and_then(Value::as_bool).unwrap_or(false)
        || info.get("type").and_then(Value::as_str) == Some("agent")
}

async fn lookup_model(client: &ApiClient, name: &str) -> Option<Value> {
    match client.get(&format!("/ai/models/{name}")).await {
        Ok(info) => Some(info),
        Err(err) => {
            debug!("model lookup for {name} failed: {err}");
            None
        }
    }
}

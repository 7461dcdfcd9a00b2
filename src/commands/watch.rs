use crate::api::ApiClient;
use crate::commands::{extract_list, id_of, print_list, shorten_timestamps};
use crate::error::TmError;
use crate::format::{Column, render_table};
use crate::pipeline::Shape;
use serde_json::json;

const RULE_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("query", "QUERY"),
    Column::new("interval", "INTERVAL"),
    Column::new("notify", "NOTIFY"),
    Column::new("action", "ACTION"),
    Column::new("status", "STATUS"),
];

const LOG_COLUMNS: &[Column] = &[
    Column::new("triggeredAt", "TIME"),
    Column::new("matches", "MATCHES"),
    Column::new("status", "STATUS"),
    Column::new("message", "MESSAGE"),
];

/// A parsed watch-rule definition, before submission.
#[derive(Debug, PartialEq)]
pub struct RuleSpec {
    pub query: String,
    pub notify: String,
    pub interval: u64,
    pub action: String,
    pub name: Option<String>,
}

/// Parse the free-form trailing arguments of `watch create`. The four
/// recognized flags each consume exactly the next token wherever they
/// appear; every other token, recognized-looking or not, is query text in
/// input order.
pub fn parse_rule_args(args: &[String]) -> Result<RuleSpec, TmError> {
    let mut query_words: Vec<&str> = Vec::new();
    let mut notify = None;
    let mut interval = None;
    let mut action = None;
    let mut name = None;

    let mut idx = 0;
    while idx < args.len() {
        let token = args[idx].as_str();
        match token {
            "--notify" | "--interval" | "--action" | "--name" => {
                let value = args
                    .get(idx + 1)
                    .ok_or_else(|| TmError::Validation(format!("{token} needs a value")))?
                    .clone();
                match token {
                    "--notify" => notify = Some(value),
                    "--interval" => interval = Some(value),
                    "--action" => action = Some(value),
                    _ => name = Some(value),
                }
                idx += 2;
            }
            other => {
                query_words.push(other);
                idx += 1;
            }
        }
    }

    let query = query_words.join(" ").trim().to_string();
    if query.is_empty() {
        return Err(TmError::Validation("Watch query is required".into()));
    }

    let interval = match interval {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                TmError::Validation(format!("'{raw}' is not a valid interval in minutes"))
            })?,
        None => 60,
    };

    Ok(RuleSpec {
        query,
        notify: notify.unwrap_or_else(|| "in_app".to_string()),
        interval,
        action: action.unwrap_or_else(|| "notify".to_string()),
        name,
    })
}

pub async fn create(client: &ApiClient, args: &[String]) -> Result<(), TmError> {
    let rule = parse_rule_args(args)?;
    let mut body = json!({
        "query": rule.query,
        "notify": rule.notify,
        "interval": rule.interval,
        "action": rule.action,
    });
    if let Some(name) = &rule.name {
        body["name"] = json!(name);
    }
    let payload = client.post("/watch-rules", &body).await?;
    match id_of(&payload) {
        Some(id) => println!("Watch rule {id} created."),
        None => println!("Watch rule created."),
    }
    Ok(())
}

pub async fn list(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/watch-rules").await?;
    print_list(extract_list(&payload), RULE_COLUMNS, &Shape::default());
    Ok(())
}

pub async fn pause(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client
        .patch(&format!("/watch-rules/{id}"), &json!({ "status": "paused" }))
        .await?;
    println!("Rule {id} paused.");
    Ok(())
}

pub async fn resume(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client
        .patch(&format!("/watch-rules/{id}"), &json!({ "status": "active" }))
        .await?;
    println!("Rule {id} resumed.");
    Ok(())
}

pub async fn rm(client: &ApiClient, id: &str) -> Result<(), TmError> {
    client.delete(&format!("/watch-rules/{id}")).await?;
    println!("Rule {id} removed.");
    Ok(())
}

pub async fn logs(client: &ApiClient, id: &str) -> Result<(), TmError> {
    let payload = client.get(&format!("/watch-rules/{id}/logs")).await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["triggeredAt"]);
    println!("{}", render_table(&items, LOG_COLUMNS));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Session};
    use std::sync::Arc;
    use test_case::test_case;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn client_for(server: &mockito::Server) -> ApiClient {
        let session = Session::new(Arc::new(MemoryStore::new()))
            .with_api_override(Some(server.url()));
        ApiClient::new(session).unwrap()
    }

    #[test]
    fn test_parse_defaults() {
        let rule = parse_rule_args(&args(&["coffee", "beans"])).unwrap();
        assert_eq!(
            rule,
            RuleSpec {
                query: "coffee beans".into(),
                notify: "in_app".into(),
                interval: 60,
                action: "notify".into(),
                name: None,
            }
        );
    }

    #[test]
    fn test_parse_flags_anywhere_in_the_stream() {
        let rule = parse_rule_args(&args(&[
            "coffee", "--interval", "30", "beans", "--notify", "email",
        ]))
        .unwrap();
        assert_eq!(rule.query, "coffee beans");
        assert_eq!(rule.interval, 30);
        assert_eq!(rule.notify, "email");
    }

    #[test]
    fn test_parse_name_and_action() {
        let rule = parse_rule_args(&args(&[
            "--name", "deal-watch", "--action", "auto_buy", "espresso",
        ]))
        .unwrap();
        assert_eq!(rule.name.as_deref(), Some("deal-watch"));
        assert_eq!(rule.action, "auto_buy");
        assert_eq!(rule.query, "espresso");
    }

    #[test]
    fn test_parse_unrecognized_flag_is_query_text() {
        let rule = parse_rule_args(&args(&["--urgent", "coffee"])).unwrap();
        assert_eq!(rule.query, "--urgent coffee");
    }

    #[test]
    fn test_parse_repeated_flag_last_wins() {
        let rule =
            parse_rule_args(&args(&["a", "--notify", "email", "--notify", "sms"])).unwrap();
        assert_eq!(rule.notify, "sms");
    }

    #[test_case(&["coffee", "--interval"] ; "flag at end of stream")]
    #[test_case(&["--name"] ; "only a dangling flag")]
    fn test_parse_missing_flag_value(tokens: &[&str]) {
        let err = parse_rule_args(&args(tokens)).unwrap_err();
        assert!(matches!(err, TmError::Validation(_)));
        assert!(err.to_string().contains("needs a value"));
    }

    #[test_case(&["coffee", "--interval", "abc"] ; "not a number")]
    #[test_case(&["coffee", "--interval", "0"] ; "zero minutes")]
    #[test_case(&["coffee", "--interval", "-5"] ; "negative minutes")]
    fn test_parse_bad_interval(tokens: &[&str]) {
        let err = parse_rule_args(&args(tokens)).unwrap_err();
        assert!(matches!(err, TmError::Validation(_)));
    }

    #[test_case(&[] ; "no tokens at all")]
    #[test_case(&["--interval", "30"] ; "flags but no query words")]
    fn test_parse_empty_query(tokens: &[&str]) {
        let err = parse_rule_args(&args(tokens)).unwrap_err();
        assert_eq!(err.to_string(), "Watch query is required");
    }

    #[tokio::test]
    async fn test_create_posts_parsed_rule() {
        let mut server = mockito::Server::new_async().await;
        let created = server
            .mock("POST", "/watch-rules")
            .match_body(mockito::Matcher::Json(json!({
                "query": "coffee beans",
                "notify": "email",
                "interval": 30,
                "action": "notify",
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 5}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        create(
            &client,
            &args(&["coffee", "beans", "--interval", "30", "--notify", "email"]),
        )
        .await
        .unwrap();
        created.assert_async().await;
    }

    #[tokio::test]
    async fn test_pause_patches_status() {
        let mut server = mockito::Server::new_async().await;
        let paused = server
            .mock("PATCH", "/watch-rules/5")
            .match_body(mockito::Matcher::Json(json!({ "status": "paused" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 5, "status": "paused"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        pause(&client, "5").await.unwrap();
        paused.assert_async().await;
    }

    #[tokio::test]
    async fn test_resume_patches_status() {
        let mut server = mockito::Server::new_async().await;
        let resumed = server
            .mock("PATCH", "/watch-rules/5")
            .match_body(mockito::Matcher::Json(json!({ "status": "active" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 5, "status": "active"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        resume(&client, "5").await.unwrap();
        resumed.assert_async().await;
    }
}

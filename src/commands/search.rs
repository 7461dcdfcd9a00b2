use crate::api::ApiClient;
use crate::commands::catalog::PRODUCT_COLUMNS;
use crate::commands::{extract_list, print_list, with_query};
use crate::error::TmError;
use crate::pipeline::{self, Shape};
use serde_json::Value;
use tracing::debug;

/// Server-side search filters. All optional; `q` itself is positional.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub category: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub limit: Option<u32>,
}

pub async fn search(
    client: &ApiClient,
    query: &str,
    params: SearchParams,
    shape: &Shape,
) -> Result<(), TmError> {
    let items = fetch_results(client, query, params).await?;
    print_list(items, PRODUCT_COLUMNS, shape);
    Ok(())
}

/// Ask the server to search; when that fails for any reason, fall back to
/// the unfiltered product list with a local substring match. Shaping happens
/// after either path.
pub(crate) async fn fetch_results(
    client: &ApiClient,
    query: &str,
    params: SearchParams,
) -> Result<Vec<Value>, TmError> {
    let path = with_query(
        "/products/search",
        &[
            ("q", Some(query.to_string())),
            ("limit", params.limit.map(|n| n.to_string())),
            ("category", params.category),
            ("city", params.city),
            ("country", params.country),
            ("price_min", params.price_min.map(|p| p.to_string())),
            ("price_max", params.price_max.map(|p| p.to_string())),
        ],
    );

    match client.get(&path).await {
        Ok(payload) => Ok(extract_list(&payload)),
        Err(err) => {
            debug!("server search failed, filtering locally: {err}");
            let payload = client.get("/products").await?;
            Ok(pipeline::filter_items(extract_list(&payload), query))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Session};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn client_for(server: &mockito::Server) -> ApiClient {
        let session = Session::new(Arc::new(MemoryStore::new()))
            .with_api_override(Some(server.url()));
        ApiClient::new(session).unwrap()
    }

    #[tokio::test]
    async fn test_server_results_are_used_as_is() {
        let mut server = mockito::Server::new_async().await;
        let searched = server
            .mock("GET", "/products/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "coffee".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results": [{"id": 1, "name": "Coffee Sampler"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let params = SearchParams {
            limit: Some(5),
            ..SearchParams::default()
        };
        let items = fetch_results(&client, "coffee", params).await.unwrap();
        searched.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], json!("Coffee Sampler"));
    }

    #[tokio::test]
    async fn test_price_bounds_are_sent_as_query_params() {
        let mut server = mockito::Server::new_async().await;
        let searched = server
            .mock("GET", "/products/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "beans".into()),
                Matcher::UrlEncoded("price_min".into(), "2.5".into()),
                Matcher::UrlEncoded("price_max".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let params = SearchParams {
            price_min: Some(2.5),
            price_max: Some(10.0),
            ..SearchParams::default()
        };
        fetch_results(&client, "beans", params).await.unwrap();
        searched.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_search_falls_back_to_local_filter() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/products/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();
        let _products = server
            .mock("GET", "/products")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": 1, "name": "Coffee Beans"}, {"id": 2, "name": "Green Tea"}]"#,
            )
            .create();

        let client = client_for(&server);
        let items = fetch_results(&client, "coffee", SearchParams::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_fallback_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/products/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();
        let _products = server.mock("GET", "/products").with_status(500).create();

        let client = client_for(&server);
        let err = fetch_results(&client, "coffee", SearchParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_fixture_sorted_desc_head_one() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/products/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "A", "price": "5"}, {"name": "B", "price": "9"}]"#)
            .create();

        let client = client_for(&server);
        let items = fetch_results(&client, "x", SearchParams::default())
            .await
            .unwrap();
        let shape = Shape {
            sort: Some("-price".into()),
            head: Some(1),
            count: false,
        };
        let shaped = shape.apply(items);
        assert_eq!(shaped, vec![json!({"name": "B", "price": "9"})]);
    }
}

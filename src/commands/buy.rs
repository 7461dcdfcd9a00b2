use crate::api::ApiClient;
use crate::commands::{checkout_url, open_in_browser, resolve_product_id};
use crate::error::TmError;
use serde_json::{Value, json};
use tracing::debug;

/// Buy a product: resolve it, record the advisory intent and click, print
/// the checkout URL and hand it to the browser. The only hard failures are
/// an unresolvable product and a missing checkout URL; the advisory records
/// never block a purchase.
pub async fn buy(
    client: &ApiClient,
    reference: &str,
    offer: Option<String>,
    no_browser: bool,
) -> Result<(), TmError> {
    let (url, product) = resolve_checkout(client, reference, offer.as_deref()).await?;

    let mut intent = json!({ "productId": product["id"] });
    if let Some(offer_id) = &offer {
        intent["offerId"] = json!(offer_id);
    }
    client.post_advisory("/intents", &intent).await;
    client
        .post_advisory("/clicks", &json!({ "productId": product["id"], "url": url }))
        .await;

    println!("Checkout: {url}");
    open_in_browser(&url, no_browser);
    Ok(())
}

/// Determine the checkout URL: an explicitly requested offer's `url` wins,
/// then the product's `checkoutUrl`, `url` and `purchaseUrl` in that order.
pub(crate) async fn resolve_checkout(
    client: &ApiClient,
    reference: &str,
    offer: Option<&str>,
) -> Result<(String, Value), TmError> {
    let (_, product) = resolve_product_id(client, reference).await?;

    let mut url = None;
    if let Some(offer_id) = offer {
        match client.get(&format!("/offers/{offer_id}")).await {
            Ok(record) => {
                url = record
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|u| !u.is_empty())
                    .map(String::from);
            }
            Err(err) => debug!("offer {offer_id} lookup failed: {err}"),
        }
    }

    match url.or_else(|| checkout_url(&product)) {
        Some(url) => Ok((url, product)),
        None => Err(TmError::NotFound(format!(
            "Checkout URL for '{reference}'"
        ))),
    }
}

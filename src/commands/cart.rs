use crate::api::ApiClient;
use crate::commands::{
    checkout_url, extract_list, first_field, open_in_browser, print_list, resolve_product_id,
    shorten_timestamps, with_query,
};
use crate::error::TmError;
use crate::format::{Column, render_table};
use crate::pipeline::Shape;
use serde_json::{Value, json};

const CART_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("product.name", "PRODUCT"),
    Column::new("quantity", "QTY"),
    Column::new("price", "PRICE"),
];

const ORDER_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("product.name", "PRODUCT"),
    Column::new("status", "STATUS"),
    Column::new("total", "TOTAL"),
    Column::new("createdAt", "DATE"),
];

pub async fn show(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.get("/cart").await?;
    let items = extract_list(&payload);
    println!("{}", render_table(&items, CART_COLUMNS));
    if let Some(total) = first_field(&payload, &["total", "subtotal"]) {
        println!("Total: {total}");
    }
    Ok(())
}

pub async fn add(client: &ApiClient, product: &str, qty: Option<u32>) -> Result<(), TmError> {
    let (_, record) = resolve_product_id(client, product).await?;
    let body = json!({
        "productId": record["id"],
        "quantity": qty.unwrap_or(1),
    });
    client.post("/cart/items", &body).await?;
    let name = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(product);
    println!("Added {name} to cart.");
    Ok(())
}

pub async fn remove(client: &ApiClient, item_id: &str) -> Result<(), TmError> {
    client.delete(&format!("/cart/items/{item_id}")).await?;
    println!("Removed from cart.");
    Ok(())
}

pub async fn checkout(client: &ApiClient) -> Result<(), TmError> {
    let payload = client.post("/cart/checkout", &json!({})).await?;
    match checkout_url(&payload) {
        Some(url) => {
            println!("Checkout: {url}");
            open_in_browser(&url, false);
            Ok(())
        }
        None => Err(TmError::NotFound("Checkout URL".into())),
    }
}

pub async fn orders(
    client: &ApiClient,
    status: Option<String>,
    shape: &Shape,
) -> Result<(), TmError> {
    let path = with_query("/orders", &[("status", status)]);
    let payload = client.get(&path).await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["createdAt"]);
    print_list(items, ORDER_COLUMNS, shape);
    Ok(())
}

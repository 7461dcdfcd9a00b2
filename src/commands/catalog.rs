use crate::api::ApiClient;
use crate::commands::{
    extract_list, first_field, id_of, print_list, resolve_product, shorten_timestamps, with_query,
};
use crate::error::TmError;
use crate::format::{Column, render_card, render_table};
use crate::pipeline::Shape;
use serde_json::json;
use tracing::debug;

pub(crate) const PRODUCT_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("price", "PRICE"),
    Column::new("category", "CATEGORY"),
    Column::new("seller.name", "SELLER"),
    Column::new("city", "CITY"),
];

const PRODUCT_CARD: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("slug", "SLUG"),
    Column::new("price", "PRICE"),
    Column::new("category", "CATEGORY"),
    Column::new("description", "DESCRIPTION"),
    Column::new("seller.name", "SELLER"),
    Column::new("city", "CITY"),
    Column::new("country", "COUNTRY"),
    Column::new("tags", "TAGS"),
];

const OFFER_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "OFFER"),
    Column::new("price", "PRICE"),
    Column::new("serviceType", "TYPE"),
];

const SELLER_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("city", "CITY"),
    Column::new("country", "COUNTRY"),
    Column::new("rating", "RATING"),
];

const SELLER_CARD: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "NAME"),
    Column::new("description", "DESCRIPTION"),
    Column::new("city", "CITY"),
    Column::new("country", "COUNTRY"),
];

const REVIEW_COLUMNS: &[Column] = &[
    Column::new("rating", "RATING"),
    Column::new("comment", "COMMENT"),
    Column::new("user.name", "BY"),
    Column::new("createdAt", "DATE"),
];

pub async fn products(
    client: &ApiClient,
    category: Option<String>,
    city: Option<String>,
    country: Option<String>,
    shape: &Shape,
) -> Result<(), TmError> {
    let (city, country) = with_location_bias(client, city, country);
    let path = with_query(
        "/products",
        &[("category", category), ("city", city), ("country", country)],
    );
    let payload = client.get(&path).await?;
    print_list(extract_list(&payload), PRODUCT_COLUMNS, shape);
    Ok(())
}

pub async fn product(client: &ApiClient, reference: &str) -> Result<(), TmError> {
    let product = resolve_product(client, reference).await?;
    println!("{}", render_card(&product, PRODUCT_CARD));

    // Offers are an enrichment; a product without them still renders.
    let Some(id) = id_of(&product) else {
        return Ok(());
    };
    match client.get(&format!("/products/{id}/offers")).await {
        Ok(payload) => {
            let mut offers = extract_list(&payload);
            for offer in &mut offers {
                if offer.get("title").is_none() {
                    if let Some(name) = offer.get("name").cloned() {
                        offer["title"] = name;
                    }
                }
            }
            if !offers.is_empty() {
                println!();
                println!("Offers:");
                println!("{}", render_table(&offers, OFFER_COLUMNS));
            }
        }
        Err(err) => debug!("offers lookup failed: {err}"),
    }
    Ok(())
}

pub async fn sellers(
    client: &ApiClient,
    city: Option<String>,
    country: Option<String>,
    shape: &Shape,
) -> Result<(), TmError> {
    let (city, country) = with_location_bias(client, city, country);
    let path = with_query("/sellers", &[("city", city), ("country", country)]);
    let payload = client.get(&path).await?;
    print_list(extract_list(&payload), SELLER_COLUMNS, shape);
    Ok(())
}

pub async fn seller(client: &ApiClient, id: &str) -> Result<(), TmError> {
    let payload = client.get(&format!("/sellers/{id}")).await?;
    println!("{}", render_card(&payload, SELLER_CARD));

    match client.get(&format!("/stores/{id}/rating")).await {
        Ok(rating) => {
            let average = first_field(&rating, &["rating", "average", "avg"]);
            let count = first_field(&rating, &["count", "total", "reviews"]);
            match (average, count) {
                (Some(average), Some(count)) => {
                    println!("Rating: {average} ({count} reviews)");
                }
                (Some(average), None) => println!("Rating: {average}"),
                _ => {}
            }
        }
        Err(err) => debug!("rating lookup failed: {err}"),
    }
    Ok(())
}

pub async fn reviews(client: &ApiClient, store_id: &str, shape: &Shape) -> Result<(), TmError> {
    let payload = client.get(&format!("/stores/{store_id}/reviews")).await?;
    let mut items = extract_list(&payload);
    shorten_timestamps(&mut items, &["createdAt"]);
    print_list(items, REVIEW_COLUMNS, shape);
    Ok(())
}

pub async fn review(
    client: &ApiClient,
    store_id: &str,
    rating: i64,
    comment: Option<String>,
) -> Result<(), TmError> {
    if !(1..=5).contains(&rating) {
        return Err(TmError::Validation("Rating must be between 1 and 5".into()));
    }
    let mut body = json!({ "rating": rating });
    if let Some(comment) = comment {
        body["comment"] = json!(comment);
    }
    client
        .post(&format!("/stores/{store_id}/reviews"), &body)
        .await?;
    println!("Review posted.");
    Ok(())
}

/// Fill absent city/country flags from the stored location preference.
fn with_location_bias(
    client: &ApiClient,
    city: Option<String>,
    country: Option<String>,
) -> (Option<String>, Option<String>) {
    let location = client.session().location();
    let city = city.or_else(|| location.as_ref().map(|l| l.city.clone()));
    let country = country.or_else(|| location.as_ref().map(|l| l.country.clone()));
    (city, country)
}

use proptest::prelude::*;
use serde_json::{Value, json};
use tm::pipeline::{Shape, filter_items, matches_query, sort_items};

/// Generate rows whose price is a number, a numeric string, or absent, the
/// three shapes the marketplace API actually returns.
fn arb_row() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,8}",
        prop_oneof![
            (0.0f64..1000.0).prop_map(|p| Some(json!(p))),
            (0u32..100_000u32)
                .prop_map(|cents| Some(json!(format!("{}.{:02}", cents / 100, cents % 100)))),
            Just(None),
        ],
    )
        .prop_map(|(name, price)| {
            let mut row = json!({ "name": name });
            if let Some(price) = price {
                row["price"] = price;
            }
            row
        })
}

fn arb_rows() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_row(), 0..30)
}

/// Ids as they actually appear: bare numbers, slugs, and hybrids of the two.
fn arb_mixed_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,3}",
        "[a-z]{2,5}",
        "[0-9]{1,2}[a-z]{1,3}",
    ]
}

fn arb_mixed_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_mixed_id(), 0..30)
}

/// Price as the pipeline's comparator sees it.
fn numeric_price(row: &Value) -> Option<f64> {
    match row.get("price") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod shaping_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_sort_is_a_permutation(mut rows in arb_rows()) {
            let mut before: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
            sort_items(&mut rows, "price");
            let mut after: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn test_ascending_adjacent_prices_are_ordered(mut rows in arb_rows()) {
            sort_items(&mut rows, "price");
            for pair in rows.windows(2) {
                if let (Some(a), Some(b)) = (numeric_price(&pair[0]), numeric_price(&pair[1])) {
                    prop_assert!(a <= b, "{a} sorted before {b}");
                }
            }
        }

        #[test]
        fn test_missing_prices_sort_last_in_both_directions(rows in arb_rows()) {
            for spec in ["price", "-price"] {
                let mut sorted = rows.clone();
                sort_items(&mut sorted, spec);
                if let Some(idx) = sorted.iter().position(|r| numeric_price(r).is_none()) {
                    prop_assert!(
                        sorted[idx..].iter().all(|r| numeric_price(r).is_none()),
                        "row with a price after the first priceless row ({spec})"
                    );
                }
            }
        }

        #[test]
        fn test_equal_keys_keep_input_order(names in prop::collection::vec("[a-z]{1,6}", 0..20)) {
            let mut rows: Vec<Value> = names
                .iter()
                .enumerate()
                .map(|(seq, name)| json!({ "seq": seq, "price": 5, "name": name }))
                .collect();
            sort_items(&mut rows, "price");
            let seqs: Vec<u64> = rows.iter().map(|r| r["seq"].as_u64().unwrap()).collect();
            prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_mixed_id_columns_sort_in_text_order(ids in arb_mixed_ids()) {
            let mut rows: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
            sort_items(&mut rows, "id");
            prop_assert_eq!(rows.len(), ids.len());
            for pair in rows.windows(2) {
                let a = pair[0]["id"].as_str().unwrap();
                let b = pair[1]["id"].as_str().unwrap();
                prop_assert!(a <= b, "{a} sorted before {b}");
            }
        }

        #[test]
        fn test_head_takes_a_prefix_of_the_sorted_rows(rows in arb_rows(), n in 0usize..40) {
            let shape = Shape {
                sort: Some("price".to_string()),
                head: Some(n),
                count: false,
            };
            let shaped = shape.apply(rows.clone());

            let mut full = rows;
            sort_items(&mut full, "price");
            prop_assert_eq!(shaped.len(), n.min(full.len()));
            prop_assert_eq!(&shaped[..], &full[..shaped.len()]);
        }

        #[test]
        fn test_filter_keeps_only_matching_rows(rows in arb_rows(), query in "[a-z]{1,4}") {
            let filtered = filter_items(rows.clone(), &query);
            prop_assert!(filtered.len() <= rows.len());
            for row in &filtered {
                prop_assert!(matches_query(row, &query));
            }
            let again = filter_items(filtered.clone(), &query);
            prop_assert_eq!(again, filtered);
        }
    }
}

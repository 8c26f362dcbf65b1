use serde_json::Value;

use crate::domain::product::Product;
use crate::intake::keys;
use crate::intake::normalize::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

use Segment::{Index, Key};

/// Every response shape the extraction service has emitted, newest first.
const PRODUCT_PATHS: &[&[Segment]] = &[
    &[Key("message"), Key("content"), Key("Products")],
    &[Index(0), Key("message"), Key("content"), Key("Products")],
    &[Key("Products")],
    &[Key("message"), Key("content"), Key("products")],
    &[Index(0), Key("message"), Key("content"), Key("products")],
    &[Index(0), Key("products")],
    &[Key("products")],
];

/// Finds the raw products list inside an extraction response.
///
/// Returns the first non-empty array along [`PRODUCT_PATHS`], then falls back
/// to a bare array of product objects. `None` means no recognizable shape.
pub fn locate_products(payload: &Value) -> Option<&[Value]> {
    PRODUCT_PATHS
        .iter()
        .filter_map(|path| follow(payload, path))
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
        .map(Vec::as_slice)
        .or_else(|| bare_product_array(payload))
}

/// Locates and normalizes every product in an extraction response.
pub fn extract_products(payload: &Value) -> Vec<Product> {
    locate_products(payload)
        .map(|items| items.iter().enumerate().map(|(index, raw)| normalize(raw, index)).collect())
        .unwrap_or_default()
}

fn follow<'a>(payload: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |current, segment| match segment {
        Key(key) => current.get(*key),
        Index(index) => current.get(*index),
    })
}

fn bare_product_array(payload: &Value) -> Option<&[Value]> {
    let items = payload.as_array()?;
    let first = items.first()?.as_object()?;
    keys::SKU.keys.iter().any(|key| first.contains_key(*key)).then_some(items.as_slice())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_products, locate_products};

    #[test]
    fn finds_capitalized_products_under_message_content() {
        let payload = json!({"message": {"content": {"Products": [{"sku": "A"}]}}});
        assert_eq!(locate_products(&payload), Some(&[json!({"sku": "A"})][..]));
    }

    #[test]
    fn empty_object_has_no_products() {
        assert_eq!(locate_products(&json!({})), None);
        assert_eq!(locate_products(&json!(null)), None);
        assert_eq!(locate_products(&json!("products")), None);
        assert_eq!(locate_products(&json!([])), None);
    }

    #[test]
    fn array_wrapped_message_is_unwrapped() {
        let payload = json!([{"message": {"content": {"Products": [{"SKU": "B"}]}}}]);
        assert_eq!(locate_products(&payload).map(<[_]>::len), Some(1));
    }

    #[test]
    fn capitalized_shapes_win_over_legacy_lowercase() {
        let payload = json!({
            "Products": [{"SKU": "top-level"}],
            "message": {"content": {"products": [{"SKU": "legacy"}]}}
        });
        assert_eq!(locate_products(&payload).expect("products")[0]["SKU"], "top-level");
    }

    #[test]
    fn empty_arrays_fall_through_to_later_shapes() {
        let payload = json!({
            "message": {"content": {"Products": [], "products": [{"SKU": "legacy"}]}}
        });
        assert_eq!(locate_products(&payload).expect("products")[0]["SKU"], "legacy");
    }

    #[test]
    fn legacy_shapes_are_still_recognized() {
        for payload in [
            json!([{"message": {"content": {"products": [{"sku": "C"}]}}}]),
            json!([{"products": [{"sku": "C"}]}]),
            json!({"products": [{"sku": "C"}]}),
            json!([{"sku": "C"}, {"sku": "D"}]),
        ] {
            let products = locate_products(&payload).expect("legacy shape should match");
            assert_eq!(products[0]["sku"], "C", "payload {payload}");
        }
    }

    #[test]
    fn bare_arrays_without_sku_are_not_products() {
        assert_eq!(locate_products(&json!([{"name": "lamp"}])), None);
    }

    #[test]
    fn extract_products_normalizes_each_entry() {
        let payload = json!({"message": {"content": {"Products": [
            {"Brand Name": "Lumos", "SKU": "L-1", "Quantity": "4"},
            {"brandName": "Arc", "sku": "A-9"}
        ]}}});

        let products = extract_products(&payload);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id.as_str(), "product-0");
        assert_eq!(products[0].brand, "Lumos");
        assert_eq!(products[0].quantity, 4);
        assert_eq!(products[1].id.as_str(), "product-1");
        assert_eq!(products[1].sku.as_deref(), Some("A-9"));
        assert!(extract_products(&json!({"status": "queued"})).is_empty());
    }
}

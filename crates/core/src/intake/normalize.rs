use serde_json::{Map, Value};

use crate::domain::product::{
    parse_quantity, AccessoryPart, ComponentPart, Product, ProductId, ProductSpecs, DEFAULT_BRAND,
    DEFAULT_QUANTITY, DEFAULT_TYPE,
};
use crate::intake::keys::{self, Encoding, FieldKeys};

/// Maps one raw product entry from the extraction service onto a [`Product`].
///
/// Never fails: unknown or malformed fields fall back to their defaults, and an
/// entry that is not a JSON object yields an all-default product.
pub fn normalize(raw: &Value, index: usize) -> Product {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    Product {
        id: ProductId::extracted(index),
        brand: resolve(fields, &keys::BRAND).unwrap_or_else(|| DEFAULT_BRAND.to_owned()),
        kind: resolve(fields, &keys::LIGHT_TYPE).unwrap_or_else(|| DEFAULT_TYPE.to_owned()),
        sku: resolve(fields, &keys::SKU),
        quantity: resolve_quantity(fields, &keys::QUANTITY).unwrap_or(DEFAULT_QUANTITY),
        url: resolve(fields, &keys::URL),
        verified: false,
        specs: Some(ProductSpecs {
            wattage: resolve(fields, &keys::WATTAGE),
            dimming: resolve(fields, &keys::DIMMING),
            direction: resolve(fields, &keys::DIRECTION),
            color_temperature: resolve(fields, &keys::COLOR_TEMPERATURE),
            color: resolve(fields, &keys::COLOR),
            mount_type: resolve(fields, &keys::MOUNT_TYPE),
            lumen: resolve(fields, &keys::LUMEN),
            cri: resolve(fields, &keys::CRI),
            dimensions: resolve(fields, &keys::DIMENSIONS),
            components: resolve_parts(fields, &keys::COMPONENTS, component),
            accessories: resolve_parts(fields, &keys::ACCESSORIES, accessory),
        }),
    }
}

/// First non-empty rendering of `field` among its candidate keys.
pub fn resolve(fields: &Map<String, Value>, field: &FieldKeys) -> Option<String> {
    candidates(fields, field).find_map(|value| render(value, field.encoding))
}

fn resolve_quantity(fields: &Map<String, Value>, field: &FieldKeys) -> Option<u32> {
    candidates(fields, field).find_map(quantity)
}

fn resolve_parts<T>(
    fields: &Map<String, Value>,
    field: &FieldKeys,
    map_part: fn(&Map<String, Value>) -> T,
) -> Option<Vec<T>> {
    let items = candidates(fields, field)
        .filter_map(Value::as_array)
        .find(|items| items.iter().any(Value::is_object))?;
    Some(items.iter().filter_map(Value::as_object).map(map_part).collect())
}

fn candidates<'a>(
    fields: &'a Map<String, Value>,
    field: &'a FieldKeys,
) -> impl Iterator<Item = &'a Value> + 'a {
    field.keys.iter().filter_map(move |key| fields.get(*key))
}

fn component(fields: &Map<String, Value>) -> ComponentPart {
    ComponentPart {
        sku: resolve(fields, &keys::PART_SKU),
        description: resolve(fields, &keys::PART_DESCRIPTION),
        length: resolve(fields, &keys::PART_LENGTH),
        power: resolve(fields, &keys::PART_POWER),
        quantity: resolve_quantity(fields, &keys::PART_QUANTITY).unwrap_or(DEFAULT_QUANTITY),
    }
}

fn accessory(fields: &Map<String, Value>) -> AccessoryPart {
    AccessoryPart {
        sku: resolve(fields, &keys::PART_SKU),
        description: resolve(fields, &keys::PART_DESCRIPTION),
        dimming: resolve(fields, &keys::PART_DIMMING),
        quantity: resolve_quantity(fields, &keys::PART_QUANTITY).unwrap_or(DEFAULT_QUANTITY),
    }
}

fn render(value: &Value, encoding: Encoding) -> Option<String> {
    match (value, encoding) {
        (Value::Array(items), Encoding::Joined) => join(items.iter()),
        (Value::Object(entries), Encoding::Joined) => join(entries.values()),
        (other, _) => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn join<'a>(values: impl Iterator<Item = &'a Value>) -> Option<String> {
    let parts: Vec<String> = values.filter_map(render_scalar).collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn quantity(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            let whole = number.as_u64().or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && *value >= 1.0)
                    .map(|value| value.floor() as u64)
            })?;
            (whole >= 1).then(|| whole.min(u64::from(u32::MAX)) as u32)
        }
        Value::String(text) => parse_quantity(text),
        _ => None,
    }
}

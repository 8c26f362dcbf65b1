use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BRAND: &str = "N/A";
pub const DEFAULT_TYPE: &str = "Unknown";
pub const DEFAULT_QUANTITY: u32 = 1;
pub const MANUAL_ENTRY_ID: &str = "text-input-1";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    /// Id assigned to the `index`-th product of an extraction response.
    pub fn extracted(index: usize) -> Self {
        Self(format!("product-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// One line item of a quote request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub brand: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<ProductSpecs>,
}

impl Product {
    /// Placeholder created when the client typed their requirements instead of
    /// uploading a document.
    pub fn manual_entry() -> Self {
        Self {
            id: ProductId(MANUAL_ENTRY_ID.to_owned()),
            brand: "Manual Entry".to_owned(),
            kind: "Custom Product".to_owned(),
            sku: Some("MANUAL-001".to_owned()),
            quantity: DEFAULT_QUANTITY,
            url: None,
            verified: false,
            specs: None,
        }
    }

    pub fn set_quantity_from_input(&mut self, input: &str) {
        self.quantity = coerce_quantity(input);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wattage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimming: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ComponentPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<AccessoryPart>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimming: Option<String>,
    pub quantity: u32,
}

/// Reads a positive quantity from free text the way a number input does:
/// the leading run of digits counts, anything after it is ignored.
/// Returns `None` for blank, signed-negative, non-numeric or zero input.
pub fn parse_quantity(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(unsigned.len());
    let digits = &unsigned[..end];
    if digits.is_empty() {
        return None;
    }

    // a digit run too long for u64 is still a (very large) positive number
    let value = match digits.parse::<u64>() {
        Ok(value) => value.min(u64::from(u32::MAX)) as u32,
        Err(_) => u32::MAX,
    };
    (value >= 1).then_some(value)
}

pub fn coerce_quantity(input: &str) -> u32 {
    parse_quantity(input).unwrap_or(DEFAULT_QUANTITY)
}

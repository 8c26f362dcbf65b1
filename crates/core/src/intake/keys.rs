//! Key spellings the extraction service has used for each product field.
//!
//! Lookups walk each list in order and take the first key holding a non-empty
//! value, so a new upstream spelling is one more entry in the right table.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Strings, numbers and booleans only.
    Scalar,
    /// Scalars, plus keyed mappings and sequences whose values are joined with `", "`.
    Joined,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldKeys {
    pub field: &'static str,
    pub keys: &'static [&'static str],
    pub encoding: Encoding,
}

const fn scalar(field: &'static str, keys: &'static [&'static str]) -> FieldKeys {
    FieldKeys { field, keys, encoding: Encoding::Scalar }
}

const fn joined(field: &'static str, keys: &'static [&'static str]) -> FieldKeys {
    FieldKeys { field, keys, encoding: Encoding::Joined }
}

pub const BRAND: FieldKeys =
    scalar("brand", &["Brand Name", "BrandName", "brand_name", "Brand_Name", "brandName", "brand", "Brand"]);
pub const LIGHT_TYPE: FieldKeys =
    scalar("type", &["Light Type", "LightType", "light_type", "Light_Type", "lightType", "type", "Type"]);
pub const SKU: FieldKeys = joined("sku", &["SKU", "sku", "Sku"]);
pub const QUANTITY: FieldKeys = scalar("quantity", &["Quantity", "quantity", "QTY", "qty"]);
pub const URL: FieldKeys = scalar("url", &["URL", "url", "Url", "product_url", "productUrl"]);

pub const WATTAGE: FieldKeys = joined("wattage", &["Wattage", "wattage", "Power", "power"]);
pub const DIMMING: FieldKeys = scalar("dimming", &["Dimming", "dimming"]);
pub const DIRECTION: FieldKeys = scalar("direction", &["Direction", "direction"]);
pub const COLOR_TEMPERATURE: FieldKeys = scalar(
    "colorTemperature",
    &["Color Temperature", "ColorTemperature", "color_temperature", "colorTemperature", "CCT", "cct"],
);
pub const COLOR: FieldKeys = scalar("color", &["Color", "color", "Finish", "finish"]);
pub const MOUNT_TYPE: FieldKeys =
    joined("mountType", &["Mount Type", "MountType", "mount_type", "mountType"]);
pub const LUMEN: FieldKeys = joined("lumen", &["Lumen", "Lumens", "lumen", "lumens"]);
pub const CRI: FieldKeys = scalar("cri", &["CRI", "cri"]);
pub const DIMENSIONS: FieldKeys = joined("dimensions", &["Dimensions", "dimensions"]);

pub const COMPONENTS: FieldKeys = scalar("components", &["Components", "components"]);
pub const ACCESSORIES: FieldKeys = scalar("accessories", &["Accessories", "accessories"]);

pub const PART_SKU: FieldKeys = scalar("sku", &["SKU", "sku", "Sku"]);
pub const PART_DESCRIPTION: FieldKeys = scalar("description", &["Description", "description"]);
pub const PART_LENGTH: FieldKeys = scalar("length", &["Length", "length"]);
pub const PART_POWER: FieldKeys = scalar("power", &["Power", "power", "Wattage", "wattage"]);
pub const PART_DIMMING: FieldKeys = scalar("dimming", &["Dimming", "dimming"]);
pub const PART_QUANTITY: FieldKeys = scalar("quantity", &["Quantity", "quantity", "QTY", "qty"]);

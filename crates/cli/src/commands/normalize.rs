use std::fs;
use std::path::Path;

use anyhow::Context;
use lightquote_core::extract_products;
use serde_json::{json, Value};

use crate::commands::CommandResult;

pub fn run(response_path: &Path) -> CommandResult {
    let response = match read_response(response_path) {
        Ok(response) => response,
        Err(error) => {
            return CommandResult::failure("normalize", "invalid_input", format!("{error:#}"), 2)
        }
    };

    let products = extract_products(&response);
    let message = if products.is_empty() {
        "no products found in response".to_string()
    } else {
        format!("normalized {} product(s)", products.len())
    };

    CommandResult::success_with_data("normalize", message, Some(json!({ "products": products })))
}

fn read_response(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read response file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("response file `{}` is not valid JSON", path.display()))
}

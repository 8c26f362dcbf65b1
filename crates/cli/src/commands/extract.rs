use std::path::Path;

use lightquote_core::config::{AppConfig, LoadOptions};
use lightquote_core::extract_products;
use lightquote_webhooks::{DocumentUpload, ExtractionClient, ExtractionService};
use serde_json::json;

use crate::commands::{current_thread_runtime, CommandResult};

pub fn run(document: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "extract",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match current_thread_runtime("extract") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let upload = DocumentUpload::from_path(document)
            .await
            .map_err(|error| (error.class(), error.to_string(), 4u8))?;
        let client = ExtractionClient::from_config(reqwest::Client::new(), &config);
        let delivery = client
            .extract(&upload)
            .await
            .map_err(|failure| (failure.error.class(), failure.to_string(), 5u8))?;
        Ok::<_, (&'static str, String, u8)>((upload, delivery))
    });

    match result {
        Ok((upload, delivery)) => {
            let products = extract_products(&delivery.value);
            let message = format!(
                "extracted {} product(s) from {} in {} attempt(s)",
                products.len(),
                upload.file_name,
                delivery.attempts
            );
            CommandResult::success_with_data(
                "extract",
                message,
                Some(json!({
                    "file_name": upload.file_name,
                    "file_type": upload.content_type,
                    "attempts": delivery.attempts,
                    "products": products,
                })),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("extract", error_class, message, exit_code)
        }
    }
}

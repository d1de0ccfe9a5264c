//! Item list input

use crate::core::batch::WorkItem;
use crate::utils::error::{Result, ServiceError};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemInput {
    Code(String),
    Item(WorkItem),
}

/// Parse a JSON array of codes or work items, keeping the order
pub fn parse_items(content: &str) -> Result<Vec<WorkItem>> {
    let inputs: Vec<ItemInput> = serde_json::from_str(content)?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let item = match input {
                ItemInput::Code(code) => WorkItem::new(code),
                ItemInput::Item(item) => item,
            };
            if item.code.trim().is_empty() {
                return Err(ServiceError::validation(format!(
                    "item {} has an empty code",
                    index
                )));
            }
            Ok(item)
        })
        .collect()
}

pub async fn load_items<P: AsRef<Path>>(path: P) -> Result<Vec<WorkItem>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ServiceError::validation(format!("Failed to read items from {:?}: {}", path, e))
    })?;
    parse_items(&content)
}

//! Subcommand definitions and shared CLI helpers.

pub mod attribute;
pub mod company;
pub mod product;
pub mod product_type;

use catalog_core::{AttributeKind, ProductAttributeValue, ServiceError};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

/// Paging and search flags shared by every `list` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, help = "Case-insensitive substring search")]
    pub search: Option<String>,
    #[arg(long, help = "Page size (default 20, max 100)")]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    #[arg(long, help = "Include soft-deleted rows")]
    pub include_deleted: bool,
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_deleted(entity: &str, id: Uuid) -> anyhow::Result<()> {
    print_json(&serde_json::json!({ "entity": entity, "uuid": id, "deleted": true }))
}

/// Keeps the stable error code next to the message.
pub(crate) fn service_error(err: ServiceError) -> anyhow::Error {
    let code = err.code();
    anyhow::Error::new(err).context(format!("catalog request failed (error_code={code})"))
}

pub(crate) fn parse_kind(value: &str) -> Result<AttributeKind, String> {
    AttributeKind::parse(value)
        .ok_or_else(|| format!("unknown attribute kind `{value}`; expected text|number|boolean|select"))
}

/// Parses `ATTRIBUTE_UUID=VALUE`.
pub(crate) fn parse_value(raw: &str) -> Result<ProductAttributeValue, String> {
    let (attribute, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ATTRIBUTE_UUID=VALUE, got `{raw}`"))?;
    let attribute_uuid = Uuid::parse_str(attribute.trim())
        .map_err(|err| format!("invalid attribute uuid `{attribute}`: {err}"))?;
    Ok(ProductAttributeValue {
        attribute_uuid,
        value: value.to_string(),
    })
}

pub(crate) fn not_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

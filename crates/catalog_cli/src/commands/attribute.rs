use crate::commands::{not_empty, parse_kind, print_deleted, print_json, service_error, ListArgs};
use anyhow::Context;
use catalog_core::db::Connection;
use catalog_core::{
    AttributeKind, AttributeListQuery, AttributeService, CreateAttributeRequest,
    SqliteAttributeRepository, UpdateAttributeRequest,
};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum AttributeCommands {
    #[command(about = "List attributes")]
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long, value_parser = parse_kind, help = "Filter by kind")]
        kind: Option<AttributeKind>,
        #[arg(long, help = "Only filterable (true) or non-filterable (false)")]
        filterable: Option<bool>,
    },

    #[command(about = "Show one attribute")]
    Show { id: Uuid },

    #[command(about = "Create an attribute")]
    Create {
        code: String,
        name: String,
        #[arg(long, value_parser = parse_kind, default_value = "text")]
        kind: AttributeKind,
        #[arg(long = "option", help = "Select option; repeat for each value")]
        options: Vec<String>,
        #[arg(long)]
        required: bool,
        #[arg(long)]
        filterable: bool,
    },

    #[command(about = "Update an attribute")]
    Update {
        id: Uuid,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<AttributeKind>,
        #[arg(long = "option", help = "Replaces all select options")]
        options: Vec<String>,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long)]
        filterable: Option<bool>,
    },

    #[command(about = "Soft-delete an attribute unless products use it")]
    Delete { id: Uuid },

    #[command(about = "Restore a soft-deleted attribute")]
    Restore { id: Uuid },
}

pub fn handle(cmd: AttributeCommands, conn: &Connection) -> anyhow::Result<()> {
    let repo = SqliteAttributeRepository::try_new(conn).context("opening attribute storage")?;
    let service = AttributeService::new(repo);

    match cmd {
        AttributeCommands::List {
            list,
            kind,
            filterable,
        } => {
            let page = service
                .list(AttributeListQuery {
                    search: list.search,
                    kind,
                    is_filterable: filterable,
                    include_deleted: list.include_deleted,
                    limit: list.limit,
                    offset: list.offset,
                })
                .map_err(service_error)?;
            print_json(&page)
        }
        AttributeCommands::Show { id } => {
            let attribute = service.get(id).map_err(service_error)?;
            let product_count = service.product_count(id).map_err(service_error)?;
            print_json(&serde_json::json!({
                "attribute": attribute,
                "product_count": product_count,
            }))
        }
        AttributeCommands::Create {
            code,
            name,
            kind,
            options,
            required,
            filterable,
        } => {
            let attribute = service
                .create(CreateAttributeRequest {
                    code,
                    name,
                    kind,
                    options,
                    is_required: required,
                    is_filterable: filterable,
                })
                .map_err(service_error)?;
            print_json(&attribute)
        }
        AttributeCommands::Update {
            id,
            code,
            name,
            kind,
            options,
            required,
            filterable,
        } => {
            let attribute = service
                .update(
                    id,
                    UpdateAttributeRequest {
                        code,
                        name,
                        kind,
                        options: not_empty(options),
                        is_required: required,
                        is_filterable: filterable,
                    },
                )
                .map_err(service_error)?;
            print_json(&attribute)
        }
        AttributeCommands::Delete { id } => {
            service.delete(id).map_err(service_error)?;
            print_deleted("attribute", id)
        }
        AttributeCommands::Restore { id } => {
            let attribute = service.restore(id).map_err(service_error)?;
            print_json(&attribute)
        }
    }
}

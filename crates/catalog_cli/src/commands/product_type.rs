use crate::commands::{not_empty, print_deleted, print_json, service_error, ListArgs};
use anyhow::Context;
use catalog_core::db::Connection;
use catalog_core::{
    CreateProductTypeRequest, ProductTypeListQuery, ProductTypeService,
    SqliteProductTypeRepository, UpdateProductTypeRequest,
};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ProductTypeCommands {
    #[command(about = "List product types")]
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long, help = "Only types linking this attribute")]
        attribute: Option<Uuid>,
    },

    #[command(about = "Show one product type")]
    Show { id: Uuid },

    #[command(about = "Create a product type")]
    Create {
        code: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "attribute", help = "Linked attribute uuid; repeat in display order")]
        attributes: Vec<Uuid>,
    },

    #[command(about = "Update a product type")]
    Update {
        id: Uuid,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "attribute", help = "Replaces the linked attribute set")]
        attributes: Vec<Uuid>,
    },

    #[command(about = "Replace the linked attribute set; no attributes unlinks all")]
    SetAttributes {
        id: Uuid,
        #[arg(long = "attribute")]
        attributes: Vec<Uuid>,
    },

    #[command(about = "Soft-delete a product type unless products use it")]
    Delete { id: Uuid },

    #[command(about = "Restore a soft-deleted product type")]
    Restore { id: Uuid },
}

pub fn handle(cmd: ProductTypeCommands, conn: &Connection) -> anyhow::Result<()> {
    let repo =
        SqliteProductTypeRepository::try_new(conn).context("opening product type storage")?;
    let service = ProductTypeService::new(repo);

    match cmd {
        ProductTypeCommands::List { list, attribute } => {
            let page = service
                .list(ProductTypeListQuery {
                    search: list.search,
                    attribute_uuid: attribute,
                    include_deleted: list.include_deleted,
                    limit: list.limit,
                    offset: list.offset,
                })
                .map_err(service_error)?;
            print_json(&page)
        }
        ProductTypeCommands::Show { id } => {
            let product_type = service.get(id).map_err(service_error)?;
            let product_count = service.product_count(id).map_err(service_error)?;
            print_json(&serde_json::json!({
                "product_type": product_type,
                "product_count": product_count,
            }))
        }
        ProductTypeCommands::Create {
            code,
            name,
            description,
            attributes,
        } => {
            let product_type = service
                .create(CreateProductTypeRequest {
                    code,
                    name,
                    description,
                    attribute_ids: attributes,
                })
                .map_err(service_error)?;
            print_json(&product_type)
        }
        ProductTypeCommands::Update {
            id,
            code,
            name,
            description,
            attributes,
        } => {
            let product_type = service
                .update(
                    id,
                    UpdateProductTypeRequest {
                        code,
                        name,
                        description,
                        attribute_ids: not_empty(attributes),
                    },
                )
                .map_err(service_error)?;
            print_json(&product_type)
        }
        ProductTypeCommands::SetAttributes { id, attributes } => {
            let product_type = service
                .set_attributes(id, attributes)
                .map_err(service_error)?;
            print_json(&product_type)
        }
        ProductTypeCommands::Delete { id } => {
            service.delete(id).map_err(service_error)?;
            print_deleted("product_type", id)
        }
        ProductTypeCommands::Restore { id } => {
            let product_type = service.restore(id).map_err(service_error)?;
            print_json(&product_type)
        }
    }
}

use crate::commands::{not_empty, parse_value, print_deleted, print_json, service_error, ListArgs};
use anyhow::Context;
use catalog_core::db::Connection;
use catalog_core::{
    CreateProductRequest, ProductAttributeValue, ProductListQuery, ProductService,
    SqliteAttributeRepository, SqliteProductRepository, SqliteProductTypeRepository,
    UpdateProductRequest,
};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ProductCommands {
    #[command(about = "List products")]
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        company: Option<Uuid>,
        #[arg(long = "product-type")]
        product_type: Option<Uuid>,
    },

    #[command(about = "Show one product")]
    Show { id: Uuid },

    #[command(about = "Create a product")]
    Create {
        sku: String,
        name: String,
        #[arg(long)]
        company: Uuid,
        #[arg(long = "product-type")]
        product_type: Uuid,
        #[arg(long = "value", value_parser = parse_value, help = "ATTRIBUTE_UUID=VALUE; repeat per attribute")]
        values: Vec<ProductAttributeValue>,
    },

    #[command(about = "Update a product")]
    Update {
        id: Uuid,
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<Uuid>,
        #[arg(long = "product-type")]
        product_type: Option<Uuid>,
        #[arg(long = "value", value_parser = parse_value, help = "Replaces all attribute values")]
        values: Vec<ProductAttributeValue>,
    },

    #[command(about = "Soft-delete a product")]
    Delete { id: Uuid },

    #[command(about = "Restore a soft-deleted product")]
    Restore { id: Uuid },
}

pub fn handle(cmd: ProductCommands, conn: &Connection) -> anyhow::Result<()> {
    let service = ProductService::new(
        SqliteProductRepository::try_new(conn).context("opening product storage")?,
        SqliteProductTypeRepository::try_new(conn).context("opening product type storage")?,
        SqliteAttributeRepository::try_new(conn).context("opening attribute storage")?,
    );

    match cmd {
        ProductCommands::List {
            list,
            company,
            product_type,
        } => {
            let page = service
                .list(ProductListQuery {
                    search: list.search,
                    company_uuid: company,
                    product_type_uuid: product_type,
                    include_deleted: list.include_deleted,
                    limit: list.limit,
                    offset: list.offset,
                })
                .map_err(service_error)?;
            print_json(&page)
        }
        ProductCommands::Show { id } => {
            let product = service.get(id).map_err(service_error)?;
            print_json(&product)
        }
        ProductCommands::Create {
            sku,
            name,
            company,
            product_type,
            values,
        } => {
            let product = service
                .create(CreateProductRequest {
                    sku,
                    name,
                    company_uuid: company,
                    product_type_uuid: product_type,
                    attribute_values: values,
                })
                .map_err(service_error)?;
            print_json(&product)
        }
        ProductCommands::Update {
            id,
            sku,
            name,
            company,
            product_type,
            values,
        } => {
            let product = service
                .update(
                    id,
                    UpdateProductRequest {
                        sku,
                        name,
                        company_uuid: company,
                        product_type_uuid: product_type,
                        attribute_values: not_empty(values),
                    },
                )
                .map_err(service_error)?;
            print_json(&product)
        }
        ProductCommands::Delete { id } => {
            service.delete(id).map_err(service_error)?;
            print_deleted("product", id)
        }
        ProductCommands::Restore { id } => {
            let product = service.restore(id).map_err(service_error)?;
            print_json(&product)
        }
    }
}

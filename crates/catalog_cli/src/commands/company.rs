use crate::commands::{print_deleted, print_json, service_error, ListArgs};
use anyhow::Context;
use catalog_core::db::Connection;
use catalog_core::{
    CompanyListQuery, CompanyService, CreateCompanyRequest, SqliteCompanyRepository,
    UpdateCompanyRequest,
};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum CompanyCommands {
    #[command(about = "List companies")]
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long, help = "Only active (true) or inactive (false) companies")]
        active: Option<bool>,
    },

    #[command(about = "Show one company")]
    Show { id: Uuid },

    #[command(about = "Create a company")]
    Create {
        code: String,
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },

    #[command(about = "Update a company; pass an empty string to clear a contact field")]
    Update {
        id: Uuid,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },

    #[command(about = "Allow new product writes for a company")]
    Activate { id: Uuid },

    #[command(about = "Block new product writes for a company")]
    Deactivate { id: Uuid },

    #[command(about = "Soft-delete a company unless it owns products")]
    Delete { id: Uuid },

    #[command(about = "Restore a soft-deleted company")]
    Restore { id: Uuid },
}

pub fn handle(cmd: CompanyCommands, conn: &Connection) -> anyhow::Result<()> {
    let repo = SqliteCompanyRepository::try_new(conn).context("opening company storage")?;
    let service = CompanyService::new(repo);

    match cmd {
        CompanyCommands::List { list, active } => {
            let page = service
                .list(CompanyListQuery {
                    search: list.search,
                    is_active: active,
                    include_deleted: list.include_deleted,
                    limit: list.limit,
                    offset: list.offset,
                })
                .map_err(service_error)?;
            print_json(&page)
        }
        CompanyCommands::Show { id } => {
            let company = service.get(id).map_err(service_error)?;
            let product_count = service.product_count(id).map_err(service_error)?;
            print_json(&serde_json::json!({
                "company": company,
                "product_count": product_count,
            }))
        }
        CompanyCommands::Create {
            code,
            name,
            email,
            phone,
            website,
        } => {
            let company = service
                .create(CreateCompanyRequest {
                    code,
                    name,
                    email,
                    phone,
                    website,
                })
                .map_err(service_error)?;
            print_json(&company)
        }
        CompanyCommands::Update {
            id,
            code,
            name,
            email,
            phone,
            website,
        } => {
            let company = service
                .update(
                    id,
                    UpdateCompanyRequest {
                        code,
                        name,
                        email,
                        phone,
                        website,
                    },
                )
                .map_err(service_error)?;
            print_json(&company)
        }
        CompanyCommands::Activate { id } => {
            let company = service.activate(id).map_err(service_error)?;
            print_json(&company)
        }
        CompanyCommands::Deactivate { id } => {
            let company = service.deactivate(id).map_err(service_error)?;
            print_json(&company)
        }
        CompanyCommands::Delete { id } => {
            service.delete(id).map_err(service_error)?;
            print_deleted("company", id)
        }
        CompanyCommands::Restore { id } => {
            let company = service.restore(id).map_err(service_error)?;
            print_json(&company)
        }
    }
}

use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Attribute, AttributeKind, AttributeRepository, Company, CompanyRepository,
    CreateProductRequest, EntityKind, ProductAttributeValue, ProductListQuery, ProductService,
    ProductType, ProductTypeRepository, ServiceError, SqliteAttributeRepository,
    SqliteCompanyRepository, SqliteProductRepository, SqliteProductTypeRepository,
    UpdateProductRequest,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    company: Uuid,
    product_type: Uuid,
    color: Uuid,
    weight: Uuid,
    unlinked: Uuid,
}

fn seed(conn: &Connection) -> Fixture {
    let attributes = SqliteAttributeRepository::try_new(conn).unwrap();
    let mut color = Attribute::new("color", "Color", AttributeKind::Select);
    color.options = vec!["red".to_string(), "blue".to_string()];
    color.is_required = true;
    attributes.create_attribute(&color).unwrap();
    let weight = Attribute::new("weight", "Weight", AttributeKind::Number);
    attributes.create_attribute(&weight).unwrap();
    let unlinked = Attribute::new("fragile", "Fragile", AttributeKind::Boolean);
    attributes.create_attribute(&unlinked).unwrap();

    let companies = SqliteCompanyRepository::try_new(conn).unwrap();
    let company = Company::new("acme", "Acme");
    companies.create_company(&company).unwrap();

    let product_types = SqliteProductTypeRepository::try_new(conn).unwrap();
    let mut product_type = ProductType::new("mug", "Mug");
    product_type.attribute_ids = vec![color.uuid, weight.uuid];
    product_types.create_product_type(&product_type).unwrap();

    Fixture {
        company: company.uuid,
        product_type: product_type.uuid,
        color: color.uuid,
        weight: weight.uuid,
        unlinked: unlinked.uuid,
    }
}

fn service(
    conn: &Connection,
) -> ProductService<
    SqliteProductRepository<'_>,
    SqliteProductTypeRepository<'_>,
    SqliteAttributeRepository<'_>,
> {
    ProductService::new(
        SqliteProductRepository::try_new(conn).unwrap(),
        SqliteProductTypeRepository::try_new(conn).unwrap(),
        SqliteAttributeRepository::try_new(conn).unwrap(),
    )
}

fn value(attribute_uuid: Uuid, value: &str) -> ProductAttributeValue {
    ProductAttributeValue {
        attribute_uuid,
        value: value.to_string(),
    }
}

fn request(fixture: &Fixture, sku: &str, values: Vec<ProductAttributeValue>) -> CreateProductRequest {
    CreateProductRequest {
        sku: sku.to_string(),
        name: format!("{sku} product"),
        company_uuid: fixture.company,
        product_type_uuid: fixture.product_type,
        attribute_values: values,
    }
}

#[test]
fn create_stores_trimmed_values() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let created = service
        .create(request(
            &fixture,
            "MUG-001",
            vec![value(fixture.color, " red "), value(fixture.weight, "0.35")],
        ))
        .unwrap();

    assert_eq!(created.sku, "mug-001");
    assert_eq!(created.value_of(fixture.color), Some("red"));
    assert_eq!(created.value_of(fixture.weight), Some("0.35"));
    assert_eq!(created.attribute_values.len(), 2);
}

#[test]
fn values_are_checked_against_attribute_kinds() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let err = service
        .create(request(&fixture, "mug-1", vec![value(fixture.color, "green")]))
        .unwrap_err();
    match err {
        ServiceError::InvalidValue { attribute, value } => {
            assert_eq!(attribute, fixture.color);
            assert_eq!(value, "green");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = service
        .create(request(
            &fixture,
            "mug-1",
            vec![value(fixture.color, "red"), value(fixture.weight, "heavy")],
        ))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidValue { .. }));
}

#[test]
fn required_attribute_must_have_a_value() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let err = service
        .create(request(&fixture, "mug-1", vec![value(fixture.weight, "1")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MissingRequiredValue { attribute } if attribute == fixture.color
    ));
}

#[test]
fn value_for_unlinked_attribute_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let err = service
        .create(request(
            &fixture,
            "mug-1",
            vec![value(fixture.color, "red"), value(fixture.unlinked, "true")],
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MissingReference {
            entity: EntityKind::Attribute,
            id,
        } if id == fixture.unlinked
    ));
}

#[test]
fn inactive_or_unknown_references_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let mut unknown_type = request(&fixture, "mug-1", vec![value(fixture.color, "red")]);
    unknown_type.product_type_uuid = Uuid::new_v4();
    assert!(matches!(
        service.create(unknown_type),
        Err(ServiceError::MissingReference {
            entity: EntityKind::ProductType,
            ..
        })
    ));

    SqliteCompanyRepository::try_new(&conn)
        .unwrap()
        .set_company_active(fixture.company, false)
        .unwrap();
    assert!(matches!(
        service.create(request(&fixture, "mug-1", vec![value(fixture.color, "red")])),
        Err(ServiceError::MissingReference {
            entity: EntityKind::Company,
            ..
        })
    ));
}

#[test]
fn update_replaces_values_only_when_given() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let created = service
        .create(request(
            &fixture,
            "mug-1",
            vec![value(fixture.color, "red"), value(fixture.weight, "2")],
        ))
        .unwrap();

    let renamed = service
        .update(
            created.uuid,
            UpdateProductRequest {
                name: Some("Travel mug".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Travel mug");
    assert_eq!(renamed.attribute_values.len(), 2);

    let recolored = service
        .update(
            created.uuid,
            UpdateProductRequest {
                attribute_values: Some(vec![value(fixture.color, "blue")]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(recolored.value_of(fixture.color), Some("blue"));
    assert_eq!(recolored.value_of(fixture.weight), None);
}

#[test]
fn duplicate_sku_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    service
        .create(request(&fixture, "mug-1", vec![value(fixture.color, "red")]))
        .unwrap();
    let err = service
        .create(request(&fixture, "MUG-1", vec![value(fixture.color, "red")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Conflict {
            entity: EntityKind::Product,
            ..
        }
    ));
}

#[test]
fn delete_is_idempotent_and_restore_rechecks_references() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let created = service
        .create(request(&fixture, "mug-1", vec![value(fixture.color, "red")]))
        .unwrap();
    service.delete(created.uuid).unwrap();
    service.delete(created.uuid).unwrap();
    assert!(matches!(
        service.get(created.uuid),
        Err(ServiceError::NotFound { .. })
    ));

    SqliteCompanyRepository::try_new(&conn)
        .unwrap()
        .set_company_active(fixture.company, false)
        .unwrap();
    assert!(matches!(
        service.restore(created.uuid),
        Err(ServiceError::MissingReference {
            entity: EntityKind::Company,
            ..
        })
    ));

    SqliteCompanyRepository::try_new(&conn)
        .unwrap()
        .set_company_active(fixture.company, true)
        .unwrap();
    let restored = service.restore(created.uuid).unwrap();
    assert_eq!(restored.value_of(fixture.color), Some("red"));
}

#[test]
fn list_filters_by_company_and_type() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = service(&conn);

    let other_company = Company::new("globex", "Globex");
    SqliteCompanyRepository::try_new(&conn)
        .unwrap()
        .create_company(&other_company)
        .unwrap();

    service
        .create(request(&fixture, "mug-1", vec![value(fixture.color, "red")]))
        .unwrap();
    service
        .create(CreateProductRequest {
            company_uuid: other_company.uuid,
            ..request(&fixture, "mug-2", vec![value(fixture.color, "blue")])
        })
        .unwrap();

    let page = service
        .list(ProductListQuery {
            company_uuid: Some(other_company.uuid),
            product_type_uuid: Some(fixture.product_type),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].sku, "mug-2");
}

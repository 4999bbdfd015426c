use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Attribute, AttributeKind, AttributeRepository, AttributeService, Company, CompanyRepository,
    CompanyService, EntityKind, Product, ProductAttributeValue, ProductRepository, ProductService,
    ProductType, ProductTypeRepository, ProductTypeService, RepoError, ServiceError,
    SqliteAttributeRepository, SqliteCompanyRepository, SqliteProductRepository,
    SqliteProductTypeRepository, UpdateAttributeRequest,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    company: Uuid,
    product_type: Uuid,
    size: Uuid,
    note: Uuid,
    product: Uuid,
}

/// One company, one type linking `size` (select) and `note` (text), and one
/// product holding a `size` value.
fn seed(conn: &Connection) -> Fixture {
    let attributes = SqliteAttributeRepository::try_new(conn).unwrap();
    let mut size = Attribute::new("size", "Size", AttributeKind::Select);
    size.options = vec!["s".to_string(), "m".to_string(), "l".to_string()];
    attributes.create_attribute(&size).unwrap();
    let note = Attribute::new("note", "Note", AttributeKind::Text);
    attributes.create_attribute(&note).unwrap();

    let company = Company::new("acme", "Acme");
    SqliteCompanyRepository::try_new(conn)
        .unwrap()
        .create_company(&company)
        .unwrap();

    let mut product_type = ProductType::new("shirt", "Shirt");
    product_type.attribute_ids = vec![size.uuid, note.uuid];
    SqliteProductTypeRepository::try_new(conn)
        .unwrap()
        .create_product_type(&product_type)
        .unwrap();

    let mut product = Product::new("shirt-1", "Shirt", company.uuid, product_type.uuid);
    product.attribute_values = vec![ProductAttributeValue {
        attribute_uuid: size.uuid,
        value: "m".to_string(),
    }];
    SqliteProductRepository::try_new(conn)
        .unwrap()
        .create_product(&product)
        .unwrap();

    Fixture {
        company: company.uuid,
        product_type: product_type.uuid,
        size: size.uuid,
        note: note.uuid,
        product: product.uuid,
    }
}

fn delete_product(conn: &Connection, id: Uuid) {
    SqliteProductRepository::try_new(conn)
        .unwrap()
        .soft_delete_product(id)
        .unwrap();
}

#[test]
fn company_with_products_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = CompanyService::new(SqliteCompanyRepository::try_new(&conn).unwrap());

    let err = service.delete(fixture.company).unwrap_err();
    match err {
        ServiceError::InUse {
            entity,
            id,
            product_count,
        } => {
            assert_eq!(entity, EntityKind::Company);
            assert_eq!(id, fixture.company);
            assert_eq!(product_count, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!service.get(fixture.company).unwrap().is_deleted);

    delete_product(&conn, fixture.product);
    assert_eq!(service.product_count(fixture.company).unwrap(), 0);
    service.delete(fixture.company).unwrap();
}

#[test]
fn deactivated_company_still_blocks_delete() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = CompanyService::new(SqliteCompanyRepository::try_new(&conn).unwrap());

    service.deactivate(fixture.company).unwrap();
    assert!(matches!(
        service.delete(fixture.company),
        Err(ServiceError::InUse { .. })
    ));
}

#[test]
fn product_type_with_products_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.delete(fixture.product_type),
        Err(ServiceError::InUse {
            entity: EntityKind::ProductType,
            product_count: 1,
            ..
        })
    ));
    assert_eq!(service.product_count(fixture.product_type).unwrap(), 1);

    delete_product(&conn, fixture.product);
    service.delete(fixture.product_type).unwrap();
}

#[test]
fn attribute_with_product_values_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.delete(fixture.size),
        Err(ServiceError::InUse {
            entity: EntityKind::Attribute,
            product_count: 1,
            ..
        })
    ));
    assert_eq!(service.product_count(fixture.size).unwrap(), 1);
    assert_eq!(service.product_count(fixture.note).unwrap(), 0);
}

#[test]
fn deleting_unused_attribute_detaches_it_from_product_types() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());
    let product_types = SqliteProductTypeRepository::try_new(&conn).unwrap();

    service.delete(fixture.note).unwrap();

    let product_type = product_types
        .get_product_type(fixture.product_type, false)
        .unwrap()
        .unwrap();
    assert_eq!(product_type.attribute_ids, vec![fixture.size]);

    service.restore(fixture.note).unwrap();
    let product_type = product_types
        .get_product_type(fixture.product_type, false)
        .unwrap()
        .unwrap();
    assert_eq!(product_type.attribute_ids, vec![fixture.size]);
}

#[test]
fn changing_kind_of_used_attribute_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let err = service
        .update(
            fixture.size,
            UpdateAttributeRequest {
                kind: Some(AttributeKind::Text),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InUse { .. }));
    assert_eq!(service.get(fixture.size).unwrap().kind, AttributeKind::Select);
}

#[test]
fn dropping_used_select_option_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let err = service
        .update(
            fixture.size,
            UpdateAttributeRequest {
                name: Some("Shirt size".to_string()),
                options: Some(vec!["s".to_string(), "l".to_string()]),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InUse { .. }));

    let unchanged = service.get(fixture.size).unwrap();
    assert_eq!(unchanged.name, "Size");
    assert_eq!(unchanged.options, vec!["s", "m", "l"]);

    let trimmed = service
        .update(
            fixture.size,
            UpdateAttributeRequest {
                options: Some(vec!["m".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(trimmed.options, vec!["m"]);
}

#[test]
fn unlinking_attribute_with_product_values_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap());

    let err = service
        .set_attributes(fixture.product_type, vec![fixture.note])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InUse {
            entity: EntityKind::Attribute,
            id,
            ..
        } if id == fixture.size
    ));
    assert_eq!(
        service.get(fixture.product_type).unwrap().attribute_ids,
        vec![fixture.size, fixture.note]
    );

    let updated = service
        .set_attributes(fixture.product_type, vec![fixture.size])
        .unwrap();
    assert_eq!(updated.attribute_ids, vec![fixture.size]);
}

#[test]
fn deleted_products_do_not_block_anything() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    delete_product(&conn, fixture.product);

    AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap())
        .delete(fixture.size)
        .unwrap();
    ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap())
        .delete(fixture.product_type)
        .unwrap();
    CompanyService::new(SqliteCompanyRepository::try_new(&conn).unwrap())
        .delete(fixture.company)
        .unwrap();

    let products = SqliteProductRepository::try_new(&conn).unwrap();
    let err = products.restore_product(fixture.product).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MissingReference {
            entity: EntityKind::Company,
            ..
        }
    ));

    CompanyService::new(SqliteCompanyRepository::try_new(&conn).unwrap())
        .restore(fixture.company)
        .unwrap();
    ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap())
        .restore(fixture.product_type)
        .unwrap();

    // `size` was detached from the type when it was deleted.
    let err = products.restore_product(fixture.product).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MissingReference {
            entity: EntityKind::Attribute,
            id,
        } if id == fixture.size
    ));
    assert!(products.get_product(fixture.product, false).unwrap().is_none());

    let attributes = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());
    attributes.restore(fixture.size).unwrap();
    assert_eq!(attributes.product_count(fixture.size).unwrap(), 0);
    attributes.delete(fixture.size).unwrap();
}

fn product_service(
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

#[test]
fn restore_refuses_values_of_unlinked_attribute() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    delete_product(&conn, fixture.product);

    ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap())
        .set_attributes(fixture.product_type, vec![fixture.note])
        .unwrap();

    let products = product_service(&conn);
    let err = products.restore(fixture.product).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MissingReference {
            entity: EntityKind::Attribute,
            id,
        } if id == fixture.size
    ));
    assert!(matches!(
        products.get(fixture.product),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn restore_refuses_values_the_attribute_no_longer_accepts() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    delete_product(&conn, fixture.product);

    AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap())
        .update(
            fixture.size,
            UpdateAttributeRequest {
                options: Some(vec!["s".to_string(), "l".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();

    let err = product_service(&conn).restore(fixture.product).unwrap_err();
    match err {
        ServiceError::InvalidValue { attribute, value } => {
            assert_eq!(attribute, fixture.size);
            assert_eq!(value, "m");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn restore_refuses_product_missing_a_newly_required_value() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    delete_product(&conn, fixture.product);

    AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap())
        .update(
            fixture.note,
            UpdateAttributeRequest {
                is_required: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

    let products = SqliteProductRepository::try_new(&conn).unwrap();
    let err = products.restore_product(fixture.product).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MissingRequiredValue { attribute } if attribute == fixture.note
    ));
}

#[test]
fn requiring_attribute_that_products_lack_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let err = service
        .update(
            fixture.note,
            UpdateAttributeRequest {
                is_required: Some(true),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InUse {
            entity: EntityKind::Attribute,
            product_count: 1,
            ..
        }
    ));
    assert!(!service.get(fixture.note).unwrap().is_required);

    let required = service
        .update(
            fixture.size,
            UpdateAttributeRequest {
                is_required: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(required.is_required);
}

#[test]
fn linking_required_attribute_to_used_type_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut material = Attribute::new("material", "Material", AttributeKind::Text);
    material.is_required = true;
    SqliteAttributeRepository::try_new(&conn)
        .unwrap()
        .create_attribute(&material)
        .unwrap();
    let service = ProductTypeService::new(SqliteProductTypeRepository::try_new(&conn).unwrap());

    let err = service
        .set_attributes(
            fixture.product_type,
            vec![fixture.size, fixture.note, material.uuid],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InUse {
            entity: EntityKind::Attribute,
            id,
            product_count: 1,
        } if id == material.uuid
    ));
    assert_eq!(
        service.get(fixture.product_type).unwrap().attribute_ids,
        vec![fixture.size, fixture.note]
    );

    delete_product(&conn, fixture.product);
    let updated = service
        .set_attributes(
            fixture.product_type,
            vec![fixture.size, fixture.note, material.uuid],
        )
        .unwrap();
    assert_eq!(updated.attribute_ids.len(), 3);
}

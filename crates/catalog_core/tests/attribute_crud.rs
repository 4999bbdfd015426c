use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Attribute, AttributeKind, AttributeListQuery, AttributeRepository, AttributeService,
    CreateAttributeRequest, EntityKind, RepoError, ServiceError, SqliteAttributeRepository,
    UpdateAttributeRequest, ValidationError,
};
use uuid::Uuid;

fn select_request(code: &str, options: &[&str]) -> CreateAttributeRequest {
    CreateAttributeRequest {
        code: code.to_string(),
        name: format!("{code} name"),
        kind: AttributeKind::Select,
        options: options.iter().map(|option| option.to_string()).collect(),
        is_required: false,
        is_filterable: true,
    }
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttributeRepository::try_new(&conn).unwrap();

    let mut attribute = Attribute::new("color", "Color", AttributeKind::Select);
    attribute.options = vec!["red".to_string(), "blue".to_string()];
    attribute.is_filterable = true;
    let id = repo.create_attribute(&attribute).unwrap();

    let loaded = repo.get_attribute(id, false).unwrap().unwrap();
    assert_eq!(loaded.uuid, attribute.uuid);
    assert_eq!(loaded.kind, AttributeKind::Select);
    assert_eq!(loaded.options, vec!["red", "blue"]);
    assert!(loaded.is_filterable);
    assert!(!loaded.is_required);
    assert!(!loaded.is_deleted);
    assert!(loaded.created_at > 0);
}

#[test]
fn service_normalizes_code_name_and_options() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let created = service
        .create(CreateAttributeRequest {
            code: "  Size ".to_string(),
            name: "  Shirt size  ".to_string(),
            kind: AttributeKind::Select,
            options: vec![" S ".to_string(), "".to_string(), "M".to_string()],
            is_required: true,
            is_filterable: false,
        })
        .unwrap();

    assert_eq!(created.code, "size");
    assert_eq!(created.name, "Shirt size");
    assert_eq!(created.options, vec!["S", "M"]);
    assert!(created.is_required);
}

#[test]
fn create_rejects_invalid_definitions() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let err = service.create(select_request("size", &[])).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::SelectWithoutOptions)
    ));

    let err = service
        .create(select_request("size", &["S", "s"]))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::DuplicateOption(_))
    ));

    let mut text = select_request("note", &["x"]);
    text.kind = AttributeKind::Text;
    let err = service.create(text).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::OptionsNotAllowed("text"))
    ));

    let err = service.create(select_request("bad code", &["a"])).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidCode(_))
    ));
}

#[test]
fn duplicate_code_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    service.create(select_request("color", &["red"])).unwrap();
    let err = service
        .create(select_request("COLOR", &["blue"]))
        .unwrap_err();
    match err {
        ServiceError::Conflict { entity, code } => {
            assert_eq!(entity, EntityKind::Attribute);
            assert_eq!(code, "color");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_applies_partial_changes() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let created = service.create(select_request("color", &["red"])).unwrap();
    let updated = service
        .update(
            created.uuid,
            UpdateAttributeRequest {
                name: Some("Colour".to_string()),
                options: Some(vec!["red".to_string(), "green".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.code, "color");
    assert_eq!(updated.name, "Colour");
    assert_eq!(updated.options, vec!["red", "green"]);
    assert!(updated.is_filterable);
}

#[test]
fn switching_kind_away_from_select_drops_options() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let created = service.create(select_request("material", &["wood"])).unwrap();
    let updated = service
        .update(
            created.uuid,
            UpdateAttributeRequest {
                kind: Some(AttributeKind::Text),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.kind, AttributeKind::Text);
    assert!(updated.options.is_empty());
}

#[test]
fn missing_attribute_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());
    let id = Uuid::new_v4();

    assert!(matches!(
        service.get(id),
        Err(ServiceError::NotFound {
            entity: EntityKind::Attribute,
            ..
        })
    ));
    assert!(matches!(
        service.update(id, UpdateAttributeRequest::default()),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        service.delete(id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn unused_attribute_soft_delete_and_restore() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttributeRepository::try_new(&conn).unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    let created = service.create(select_request("color", &["red"])).unwrap();
    service.delete(created.uuid).unwrap();
    service.delete(created.uuid).unwrap();

    assert!(matches!(
        service.get(created.uuid),
        Err(ServiceError::NotFound { .. })
    ));
    let tombstone = repo.get_attribute(created.uuid, true).unwrap().unwrap();
    assert!(tombstone.is_deleted);

    let err = service
        .create(select_request("color", &["blue"]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { .. }));

    let restored = service.restore(created.uuid).unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(restored.options, vec!["red"]);

    let err = service.restore(created.uuid).unwrap_err();
    assert!(matches!(err, ServiceError::NotDeleted { .. }));
}

#[test]
fn repository_update_of_deleted_attribute_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAttributeRepository::try_new(&conn).unwrap();

    let mut attribute = Attribute::new("weight", "Weight", AttributeKind::Number);
    repo.create_attribute(&attribute).unwrap();
    repo.soft_delete_attribute(attribute.uuid).unwrap();

    attribute.name = "Mass".to_string();
    let err = repo.update_attribute(&attribute).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Attribute,
            ..
        }
    ));
}

#[test]
fn list_filters_by_kind_and_filterable() {
    let conn = open_db_in_memory().unwrap();
    let service = AttributeService::new(SqliteAttributeRepository::try_new(&conn).unwrap());

    service.create(select_request("color", &["red"])).unwrap();
    service
        .create(CreateAttributeRequest {
            code: "weight".to_string(),
            name: "Weight".to_string(),
            kind: AttributeKind::Number,
            options: Vec::new(),
            is_required: false,
            is_filterable: false,
        })
        .unwrap();

    let numbers = service
        .list(AttributeListQuery {
            kind: Some(AttributeKind::Number),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(numbers.items.len(), 1);
    assert_eq!(numbers.items[0].code, "weight");

    let filterable = service
        .list(AttributeListQuery {
            is_filterable: Some(true),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(filterable.items.len(), 1);
    assert_eq!(filterable.items[0].code, "color");
}

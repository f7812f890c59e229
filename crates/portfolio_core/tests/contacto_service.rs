use portfolio_core::{
    Contacto, ContactoField, ContactoId, ContactoPatch, ContactoRepository, ContactoService,
    ContactoView, DeleteOutcome, FieldError, FormData, KvContactoRepository, MemoryStore,
    Notification, NotificationLevel, ServiceError,
};

#[derive(Default)]
struct RecordingView {
    rendered: Vec<Vec<ContactoId>>,
    field_errors: Vec<FieldError>,
    cleared_fields: Vec<ContactoField>,
    clear_all_calls: usize,
    resets: usize,
    notifications: Vec<Notification>,
    prompts: Vec<String>,
    confirm_answer: bool,
}

impl RecordingView {
    fn confirming() -> Self {
        Self {
            confirm_answer: true,
            ..Self::default()
        }
    }

    fn last_notification(&self) -> &Notification {
        self.notifications.last().expect("a notification")
    }

    fn levels(&self) -> Vec<NotificationLevel> {
        self.notifications.iter().map(|item| item.level).collect()
    }
}

impl ContactoView for RecordingView {
    fn render_contacts(&mut self, contacts: &[Contacto]) {
        self.rendered
            .push(contacts.iter().map(|item| item.id().clone()).collect());
    }

    fn show_field_errors(&mut self, errors: &[FieldError]) {
        self.field_errors.extend_from_slice(errors);
    }

    fn clear_field_error(&mut self, field: ContactoField) {
        self.cleared_fields.push(field);
    }

    fn clear_field_errors(&mut self) {
        self.clear_all_calls += 1;
    }

    fn reset_form(&mut self) {
        self.resets += 1;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirm_answer
    }
}

type TestService<'a> = ContactoService<KvContactoRepository<&'a MemoryStore>, RecordingView>;

fn service(store: &MemoryStore, view: RecordingView) -> TestService<'_> {
    ContactoService::new(KvContactoRepository::new(store), view)
}

fn ana_form() -> FormData {
    FormData::new()
        .with("nombre", "  Ana Ruiz ")
        .with("email", "Ana@X.com")
        .with("asunto", "consulta")
        .with("preferenciaContacto", "Email")
        .with("aceptaTerminos", "on")
}

#[test]
fn submit_success_resets_form_notifies_and_renders() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());

    let contacto = service.submit(&ana_form()).unwrap();
    assert_eq!(contacto.email(), "ana@x.com");

    let view = service.view();
    assert_eq!(view.resets, 1);
    assert_eq!(view.clear_all_calls, 1);
    assert_eq!(view.levels(), vec![NotificationLevel::Success]);
    assert!(view.last_notification().message.contains("Ana Ruiz"));
    assert_eq!(view.rendered, vec![vec![contacto.id().clone()]]);
}

#[test]
fn submit_with_invalid_fields_shows_inline_errors() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    let form = FormData::new().with("preferenciaContacto", "Email");

    let err = service.submit(&form).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let view = service.view();
    let fields: Vec<_> = view.field_errors.iter().map(|error| error.field).collect();
    assert_eq!(
        fields,
        vec![
            ContactoField::Nombre,
            ContactoField::Email,
            ContactoField::Asunto,
            ContactoField::AceptaTerminos,
        ]
    );
    assert_eq!(view.last_notification().level, NotificationLevel::Error);
    assert_eq!(view.resets, 0);
    assert!(view.rendered.is_empty());
    assert!(service.repo().get_all().unwrap().is_empty());
}

#[test]
fn submit_with_duplicate_email_notifies_failure() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    service.submit(&ana_form()).unwrap();

    let form = ana_form().with("nombre", "Otra Persona").with("email", "ANA@x.com");
    let err = service.submit(&form).unwrap_err();

    assert!(matches!(err, ServiceError::DuplicateEmail(_)));
    let last = service.view().last_notification();
    assert_eq!(last.level, NotificationLevel::Error);
    assert!(last.message.contains("email"));
    assert_eq!(service.repo().get_all().unwrap().len(), 1);
}

#[test]
fn submit_over_quota_reports_insufficient_storage() {
    let store = MemoryStore::with_quota(100);
    let mut service = service(&store, RecordingView::default());

    let err = service.submit(&ana_form()).unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStorage { .. }));
    let last = service.view().last_notification();
    assert_eq!(last.level, NotificationLevel::Error);
    assert!(last.message.contains("almacenamiento"));
}

#[test]
fn submit_near_quota_warns_about_storage() {
    let store = MemoryStore::with_quota(300);
    let mut service = service(&store, RecordingView::default());

    service.submit(&ana_form()).unwrap();

    let view = service.view();
    assert_eq!(
        view.levels(),
        vec![NotificationLevel::Success, NotificationLevel::Warning]
    );
    assert!(service.storage_report().unwrap().near_quota);
}

#[test]
fn submit_below_threshold_does_not_warn() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());

    service.submit(&ana_form()).unwrap();

    let report = service.storage_report().unwrap();
    assert!(!report.near_quota);
    assert_eq!(report.usage.record_count, 1);
    assert_eq!(service.view().levels(), vec![NotificationLevel::Success]);
}

#[test]
fn check_field_shows_and_clears_inline_error() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());

    let bad = FormData::new().with("email", "no-es-un-email");
    let error = service.check_field(&bad, ContactoField::Email).unwrap();
    assert_eq!(error.field, ContactoField::Email);

    let good = FormData::new().with("email", "ana@x.com");
    assert!(service.check_field(&good, ContactoField::Email).is_none());

    let view = service.view();
    assert_eq!(view.field_errors.len(), 1);
    assert_eq!(view.cleared_fields, vec![ContactoField::Email]);
    assert!(view.notifications.is_empty());
}

#[test]
fn delete_declined_does_not_touch_repository() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    let contacto = service.submit(&ana_form()).unwrap();

    let outcome = service.delete(contacto.id()).unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(service.view().prompts.len(), 1);
    assert_eq!(service.repo().get_all().unwrap().len(), 1);
}

#[test]
fn delete_confirmed_removes_and_rerenders() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::confirming());
    let contacto = service.submit(&ana_form()).unwrap();

    let outcome = service.delete(contacto.id()).unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    let view = service.view();
    assert_eq!(view.rendered.last().unwrap(), &Vec::<ContactoId>::new());
    assert_eq!(view.last_notification().level, NotificationLevel::Success);
    assert!(service.repo().get_all().unwrap().is_empty());
}

#[test]
fn delete_of_unknown_id_reports_not_found() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::confirming());
    let unknown = ContactoId::parse("ghost42").unwrap();

    let err = service.delete(&unknown).unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(
        service.view().last_notification().level,
        NotificationLevel::Error
    );
}

#[test]
fn edit_updates_message_and_timestamp() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    let contacto = service.submit(&ana_form()).unwrap();

    let patch = ContactoPatch {
        mensaje: Some("Me interesa colaborar".to_string()),
        ..ContactoPatch::default()
    };
    let updated = service.edit(contacto.id(), &patch).unwrap();

    assert_eq!(updated.mensaje(), Some("Me interesa colaborar"));
    assert!(updated.fecha_actualizacion() > updated.fecha_creacion());
    assert_eq!(
        service.repo().get_by_id(contacto.id()).unwrap().unwrap(),
        updated
    );
}

#[test]
fn edit_with_invalid_patch_shows_field_errors() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    let contacto = service.submit(&ana_form()).unwrap();

    let patch = ContactoPatch {
        mensaje: Some("x".repeat(1001)),
        ..ContactoPatch::default()
    };
    let err = service.edit(contacto.id(), &patch).unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(
        service.view().field_errors.last().unwrap().field,
        ContactoField::Mensaje
    );
    assert_eq!(
        service.repo().get_by_id(contacto.id()).unwrap().unwrap(),
        contacto
    );
}

#[test]
fn edit_of_unknown_id_reports_not_found() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    let unknown = ContactoId::parse("ghost42").unwrap();

    let err = service
        .edit(&unknown, &ContactoPatch::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref id) if *id == unknown));
}

#[test]
fn clear_all_requires_confirmation() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    service.submit(&ana_form()).unwrap();

    assert_eq!(service.clear_all().unwrap(), DeleteOutcome::Cancelled);
    assert_eq!(service.repo().get_all().unwrap().len(), 1);

    service.view_mut().confirm_answer = true;
    assert_eq!(service.clear_all().unwrap(), DeleteOutcome::Deleted);
    assert_eq!(service.clear_all().unwrap(), DeleteOutcome::Deleted);
    assert!(service.repo().get_all().unwrap().is_empty());
}

#[test]
fn export_and_import_through_service() {
    let source_store = MemoryStore::new();
    let mut source = service(&source_store, RecordingView::default());
    source.submit(&ana_form()).unwrap();
    let json = source.export().unwrap();

    let target_store = MemoryStore::new();
    let mut target = service(&target_store, RecordingView::default());
    let summary = target.import(&json).unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(
        target.repo().get_all().unwrap(),
        source.repo().get_all().unwrap()
    );
    assert_eq!(target.view().rendered.len(), 1);

    let err = target.import("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, ServiceError::InvalidImport(_)));
    assert_eq!(
        target.view().last_notification().level,
        NotificationLevel::Error
    );
}

#[test]
fn refresh_renders_current_collection() {
    let store = MemoryStore::new();
    let mut service = service(&store, RecordingView::default());
    service.submit(&ana_form()).unwrap();

    let contacts = service.refresh().unwrap();

    assert_eq!(contacts.len(), 1);
    assert_eq!(service.view().rendered.len(), 2);
}

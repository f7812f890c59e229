//! Contact form mediator.
//!
//! # Responsibility
//! - Turn form submissions into repository calls.
//! - Translate every outcome into inline field errors and toast notifications.
//! - Re-render the full contact list after each successful mutation.
//! - Watch storage utilization and warn before the quota is reached.
//!
//! # Invariants
//! - The mediator never reaches for ambient state: the repository and the
//!   view are injected at construction.
//! - Deleting or clearing requires `ContactoView::confirm` to return `true`
//!   before the repository is called.
//! - Every error is reported to the view before being returned.

use crate::config::DEFAULT_USAGE_WARNING_RATIO;
use crate::model::contacto::{
    Contacto, ContactoDraft, ContactoField, ContactoId, ContactoPatch, FieldError,
    ValidationErrors,
};
use crate::model::form::FormData;
use crate::repo::contacto_repo::{ContactoRepository, ImportSummary, RepoError, StorageUsage};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rendering callbacks the mediator drives.
pub trait ContactoView {
    /// Replaces the rendered list with `contacts`.
    fn render_contacts(&mut self, contacts: &[Contacto]);
    /// Shows inline error text next to each listed field.
    fn show_field_errors(&mut self, errors: &[FieldError]);
    fn clear_field_error(&mut self, field: ContactoField);
    fn clear_field_errors(&mut self);
    /// Empties all form inputs.
    fn reset_form(&mut self);
    /// Shows a transient toast.
    fn notify(&mut self, notification: Notification);
    /// Asks the user to confirm a destructive action.
    fn confirm(&mut self, prompt: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Toast-style, page-level feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Error, message)
    }

    fn with_level(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Field-attributed input failures.
    Validation(ValidationErrors),
    NotFound(ContactoId),
    DuplicateEmail(String),
    /// Quota exhausted; a higher-capacity store is needed.
    InsufficientStorage {
        requested_bytes: u64,
        quota_bytes: u64,
    },
    InvalidImport(String),
    Repo(RepoError),
}

impl ServiceError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::InsufficientStorage { .. } => "insufficient_storage",
            Self::InvalidImport(_) => "invalid_import",
            Self::Repo(_) => "repo_error",
        }
    }

    /// Message shown to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => format!(
                "Revisa los campos marcados en el formulario ({} con errores)",
                errors.errors().len()
            ),
            Self::NotFound(_) => "No se encontró el contacto solicitado".to_string(),
            Self::DuplicateEmail(_) => {
                "Ya existe un contacto registrado con ese email".to_string()
            }
            Self::InsufficientStorage { .. } => "Espacio de almacenamiento insuficiente. \
                 Considera usar un almacenamiento con más capacidad, como una base de datos."
                .to_string(),
            Self::InvalidImport(_) => "El archivo de importación no es válido".to_string(),
            Self::Repo(_) => "No se pudo completar la operación".to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "duplicate contact email: {email}"),
            Self::InsufficientStorage {
                requested_bytes,
                quota_bytes,
            } => write!(
                f,
                "insufficient storage: {requested_bytes} bytes needed, quota is {quota_bytes} bytes"
            ),
            Self::InvalidImport(message) => write!(f, "invalid import: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(errors) => Self::Validation(errors),
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::InsufficientStorage {
                requested_bytes,
                quota_bytes,
            } => Self::InsufficientStorage {
                requested_bytes,
                quota_bytes,
            },
            RepoError::InvalidImport(message) => Self::InvalidImport(message),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Result of a confirm-gated destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined; the repository was not called.
    Cancelled,
}

/// Storage utilization plus the near-quota verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageReport {
    pub usage: StorageUsage,
    pub near_quota: bool,
}

/// Form mediator over an injected repository and view.
pub struct ContactoService<R: ContactoRepository, V: ContactoView> {
    repo: R,
    view: V,
    usage_warning_ratio: f64,
}

impl<R: ContactoRepository, V: ContactoView> ContactoService<R, V> {
    pub fn new(repo: R, view: V) -> Self {
        Self {
            repo,
            view,
            usage_warning_ratio: DEFAULT_USAGE_WARNING_RATIO,
        }
    }

    pub fn with_usage_warning_ratio(mut self, ratio: f64) -> Self {
        self.usage_warning_ratio = ratio;
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_parts(self) -> (R, V) {
        (self.repo, self.view)
    }

    /// Handles one form submission.
    ///
    /// On success the form is reset, the list is re-rendered and storage
    /// usage is reported. On failure field errors (if any) and a failure
    /// toast are shown.
    pub fn submit(&mut self, form: &FormData) -> Result<Contacto, ServiceError> {
        let draft = ContactoDraft::from_form(form);
        match self.repo.add(&draft) {
            Ok(contacto) => {
                self.view.clear_field_errors();
                self.view.reset_form();
                self.view.notify(Notification::success(format!(
                    "¡Gracias, {}! Tu mensaje se guardó correctamente.",
                    contacto.nombre()
                )));
                info!(
                    "event=contact_submit module=service status=ok id={}",
                    contacto.id()
                );
                self.rerender();
                self.report_storage();
                Ok(contacto)
            }
            Err(err) => Err(self.fail("submit", err.into())),
        }
    }

    /// Blur-time check of a single field.
    ///
    /// Shows the field's inline error, or clears it when the value is valid.
    pub fn check_field(&mut self, form: &FormData, field: ContactoField) -> Option<FieldError> {
        let error = ContactoDraft::from_form(form).validate_field(field);
        match &error {
            Some(error) => self.view.show_field_errors(std::slice::from_ref(error)),
            None => self.view.clear_field_error(field),
        }
        error
    }

    /// Applies `patch` to a stored record and persists it.
    pub fn edit(
        &mut self,
        id: &ContactoId,
        patch: &ContactoPatch,
    ) -> Result<Contacto, ServiceError> {
        let result = self.repo.get_by_id(id).and_then(|found| {
            let mut contacto = found.ok_or_else(|| RepoError::NotFound(id.clone()))?;
            contacto.revise(patch)?;
            self.repo.update(&contacto)
        });

        match result {
            Ok(updated) => {
                self.view.clear_field_errors();
                self.view
                    .notify(Notification::success("Contacto actualizado correctamente"));
                info!(
                    "event=contact_edit module=service status=ok id={}",
                    updated.id()
                );
                self.rerender();
                Ok(updated)
            }
            Err(err) => Err(self.fail("edit", err.into())),
        }
    }

    /// Deletes one record after interactive confirmation.
    pub fn delete(&mut self, id: &ContactoId) -> Result<DeleteOutcome, ServiceError> {
        if !self
            .view
            .confirm(&format!("¿Seguro que deseas eliminar el contacto {id}?"))
        {
            info!("event=contact_delete module=service status=cancelled id={id}");
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.repo.remove(id) {
            Ok(()) => {
                self.view
                    .notify(Notification::success("Contacto eliminado correctamente"));
                info!("event=contact_delete module=service status=ok id={id}");
                self.rerender();
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => Err(self.fail("delete", err.into())),
        }
    }

    /// Clears the whole collection after interactive confirmation.
    pub fn clear_all(&mut self) -> Result<DeleteOutcome, ServiceError> {
        if !self
            .view
            .confirm("¿Seguro que deseas eliminar todos los contactos guardados?")
        {
            info!("event=contacts_clear module=service status=cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.repo.clear() {
            Ok(()) => {
                self.view
                    .notify(Notification::success("Se eliminaron todos los contactos"));
                info!("event=contacts_clear module=service status=ok");
                self.rerender();
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => Err(self.fail("clear", err.into())),
        }
    }

    /// Re-reads the stored collection and renders it.
    pub fn refresh(&mut self) -> Result<Vec<Contacto>, ServiceError> {
        match self.repo.get_all() {
            Ok(contacts) => {
                self.view.render_contacts(&contacts);
                Ok(contacts)
            }
            Err(err) => Err(self.fail("refresh", err.into())),
        }
    }

    /// Serializes the collection for download.
    pub fn export(&mut self) -> Result<String, ServiceError> {
        match self.repo.export_json() {
            Ok(json) => {
                self.view
                    .notify(Notification::info("Contactos exportados en formato JSON"));
                Ok(json)
            }
            Err(err) => Err(self.fail("export", err.into())),
        }
    }

    /// Merges a previously exported collection into the stored one.
    pub fn import(&mut self, json: &str) -> Result<ImportSummary, ServiceError> {
        match self.repo.import_json(json) {
            Ok(summary) => {
                self.view.notify(Notification::success(format!(
                    "Importados {} contactos ({} duplicados omitidos)",
                    summary.imported, summary.skipped_duplicates
                )));
                self.rerender();
                self.report_storage();
                Ok(summary)
            }
            Err(err) => Err(self.fail("import", err.into())),
        }
    }

    /// Current utilization without emitting any feedback.
    pub fn storage_report(&self) -> Result<StorageReport, ServiceError> {
        let usage = self.repo.storage_usage()?;
        Ok(StorageReport {
            usage,
            near_quota: usage.exceeds(self.usage_warning_ratio),
        })
    }

    fn report_storage(&mut self) -> Option<StorageReport> {
        let report = match self.storage_report() {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    "event=storage_usage module=service status=error error_code={} error={}",
                    err.code(),
                    err
                );
                return None;
            }
        };

        let usage = report.usage;
        info!(
            "event=storage_usage module=service status=ok used_bytes={} quota_bytes={} percent={:.1} records={}",
            usage.used_bytes,
            usage.quota_bytes,
            usage.percent(),
            usage.record_count
        );
        if report.near_quota {
            warn!(
                "event=storage_usage module=service status=near_quota percent={:.1} threshold={:.2}",
                usage.percent(),
                self.usage_warning_ratio
            );
            self.view.notify(Notification::warning(format!(
                "El almacenamiento local está al {:.0}% de su capacidad. \
                 Considera migrar a un almacenamiento con más capacidad.",
                usage.percent()
            )));
        }
        Some(report)
    }

    fn rerender(&mut self) {
        // Failure feedback is emitted by `refresh` itself.
        let _ = self.refresh();
    }

    fn fail(&mut self, operation: &'static str, err: ServiceError) -> ServiceError {
        if let ServiceError::Validation(errors) = &err {
            self.view.show_field_errors(errors.errors());
        }
        warn!(
            "event=contact_{operation} module=service status=error error_code={}",
            err.code()
        );
        self.view.notify(Notification::error(err.user_message()));
        err
    }
}

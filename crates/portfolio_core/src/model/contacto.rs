//! Contact record domain model.
//!
//! # Responsibility
//! - Define the persisted shape of one contact-form submission.
//! - Normalize and validate raw drafts into records.
//! - Report validation failures per form field.
//!
//! # Invariants
//! - `nombre` is 2..=100 chars, `asunto` is non-empty, `mensaje` <= 1000 chars.
//! - `email` is lower-cased and matches `local@domain.tld`.
//! - `telefono`, when present, has 7..=15 digits and only phone punctuation.
//! - `acepta_terminos` is always `true`.
//! - `fecha_actualizacion >= fecha_creacion`.

use crate::model::form::FormData;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const NOMBRE_MIN_CHARS: usize = 2;
pub const NOMBRE_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const MENSAJE_MAX_CHARS: usize = 1000;
pub const TELEFONO_MIN_DIGITS: usize = 7;
pub const TELEFONO_MAX_DIGITS: usize = 15;

const ID_RANDOM_SUFFIX_CHARS: usize = 9;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static TELEFONO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\d\s().-]+$").expect("valid phone regex"));

/// Returns current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Identifier of one stored contact.
///
/// Generated as base36 creation time followed by a random hex suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactoId(String);

impl ContactoId {
    /// Generates a fresh identifier for a record created at `now_ms`.
    pub fn generate(now_ms: i64) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        let suffix: String = random.chars().take(ID_RANDOM_SUFFIX_CHARS).collect();
        let millis = u64::try_from(now_ms).unwrap_or(0);
        Self(format!("{}{}", to_base36(millis), suffix))
    }

    /// Parses a caller-provided identifier (CLI arguments, imports).
    ///
    /// Returns `None` for empty values or values with characters outside
    /// `[A-Za-z0-9_-]`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if is_valid_id(trimmed) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ContactoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContactoId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid contact id `{value}`"))
    }
}

impl From<ContactoId> for String {
    fn from(value: ContactoId) -> Self {
        value.0
    }
}

/// Preferred channel for answering the inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreferenciaContacto {
    #[default]
    Email,
    Phone,
    WhatsApp,
}

impl PreferenciaContacto {
    pub const ALL: [PreferenciaContacto; 3] = [Self::Email, Self::Phone, Self::WhatsApp];

    /// Case-insensitive parse of the three wire names.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::WhatsApp => "WhatsApp",
        }
    }
}

impl Display for PreferenciaContacto {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form field a validation failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactoField {
    Id,
    Nombre,
    Email,
    Telefono,
    Asunto,
    Mensaje,
    PreferenciaContacto,
    AceptaTerminos,
    FechaActualizacion,
}

impl ContactoField {
    /// Fields a user fills in, in form order.
    pub const FORM_FIELDS: [ContactoField; 7] = [
        Self::Nombre,
        Self::Email,
        Self::Telefono,
        Self::Asunto,
        Self::Mensaje,
        Self::PreferenciaContacto,
        Self::AceptaTerminos,
    ];

    /// Wire/form name of this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Nombre => "nombre",
            Self::Email => "email",
            Self::Telefono => "telefono",
            Self::Asunto => "asunto",
            Self::Mensaje => "mensaje",
            Self::PreferenciaContacto => "preferenciaContacto",
            Self::AceptaTerminos => "aceptaTerminos",
            Self::FechaActualizacion => "fechaActualizacion",
        }
    }
}

impl Display for ContactoField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-attributed validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ContactoField,
    pub message: String,
}

impl FieldError {
    fn new(field: ContactoField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Non-empty list of validation failures for one candidate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the failure attributed to `field`, if any.
    pub fn for_field(&self, field: ContactoField) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field == field)
    }

    pub fn contains(&self, field: ContactoField) -> bool {
        self.for_field(field).is_some()
    }

    pub fn fields(&self) -> Vec<ContactoField> {
        self.0.iter().map(|error| error.field).collect()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    fn from_errors(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid contact record: ")?;
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Unvalidated candidate record, exactly as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactoDraft {
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub asunto: String,
    pub mensaje: Option<String>,
    /// Raw preference text; parsed with `PreferenciaContacto::parse`.
    pub preferencia_contacto: String,
    pub acepta_terminos: bool,
}

impl ContactoDraft {
    /// Maps a submitted form onto a draft using the wire field names.
    pub fn from_form(form: &FormData) -> Self {
        let text = |field: ContactoField| form.get(field.as_str()).unwrap_or_default().to_string();
        Self {
            nombre: text(ContactoField::Nombre),
            email: text(ContactoField::Email),
            telefono: form.get(ContactoField::Telefono.as_str()).map(str::to_string),
            asunto: text(ContactoField::Asunto),
            mensaje: form.get(ContactoField::Mensaje.as_str()).map(str::to_string),
            preferencia_contacto: text(ContactoField::PreferenciaContacto),
            acepta_terminos: form.is_checked(ContactoField::AceptaTerminos.as_str()),
        }
    }

    /// Validates every form field and collects all failures.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors = ContactoField::FORM_FIELDS
            .into_iter()
            .filter_map(|field| self.validate_field(field))
            .collect();
        ValidationErrors::from_errors(errors)
    }

    /// Validates a single field; used for blur-time inline feedback.
    pub fn validate_field(&self, field: ContactoField) -> Option<FieldError> {
        let message = match field {
            ContactoField::Nombre => check_nombre(self.nombre.trim()),
            ContactoField::Email => check_email(&normalize_email(&self.email)),
            ContactoField::Telefono => normalize_optional(self.telefono.as_deref())
                .and_then(|telefono| check_telefono(&telefono)),
            ContactoField::Asunto => check_asunto(self.asunto.trim()),
            ContactoField::Mensaje => normalize_optional(self.mensaje.as_deref())
                .and_then(|mensaje| check_mensaje(&mensaje)),
            ContactoField::PreferenciaContacto => {
                if PreferenciaContacto::parse(&self.preferencia_contacto).is_some() {
                    None
                } else {
                    Some(
                        "Selecciona una preferencia de contacto válida (Email, Phone o WhatsApp)"
                            .to_string(),
                    )
                }
            }
            ContactoField::AceptaTerminos => check_terminos(self.acepta_terminos),
            ContactoField::Id | ContactoField::FechaActualizacion => None,
        };
        message.map(|message| FieldError::new(field, message))
    }
}

/// Partial revision of an existing record.
///
/// `None` keeps the current value. For optional fields, `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactoPatch {
    pub asunto: Option<String>,
    pub mensaje: Option<String>,
    pub telefono: Option<String>,
    pub preferencia_contacto: Option<String>,
}

impl ContactoPatch {
    pub fn is_empty(&self) -> bool {
        self.asunto.is_none()
            && self.mensaje.is_none()
            && self.telefono.is_none()
            && self.preferencia_contacto.is_none()
    }
}

/// One validated contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ContactoRecord")]
pub struct Contacto {
    id: ContactoId,
    nombre: String,
    email: String,
    telefono: Option<String>,
    asunto: String,
    mensaje: Option<String>,
    preferencia_contacto: PreferenciaContacto,
    acepta_terminos: bool,
    /// Unix epoch milliseconds.
    fecha_creacion: i64,
    /// Unix epoch milliseconds. Never earlier than `fecha_creacion`.
    fecha_actualizacion: i64,
}

impl Contacto {
    /// Normalizes and validates `draft` into a new record with a generated id.
    ///
    /// Both timestamps are set to `now_ms`.
    ///
    /// # Errors
    /// - Returns every failing field when the draft is invalid.
    pub fn parse(draft: &ContactoDraft, now_ms: i64) -> Result<Self, ValidationErrors> {
        Self::parse_with_id(ContactoId::generate(now_ms), draft, now_ms)
    }

    /// Same as [`Contacto::parse`] with a caller-provided identifier.
    pub fn parse_with_id(
        id: ContactoId,
        draft: &ContactoDraft,
        now_ms: i64,
    ) -> Result<Self, ValidationErrors> {
        draft.validate()?;
        let preferencia_contacto = PreferenciaContacto::parse(&draft.preferencia_contacto)
            .ok_or_else(|| {
                ValidationErrors(vec![FieldError::new(
                    ContactoField::PreferenciaContacto,
                    "Preferencia de contacto no reconocida",
                )])
            })?;

        Ok(Self {
            id,
            nombre: draft.nombre.trim().to_string(),
            email: normalize_email(&draft.email),
            telefono: normalize_optional(draft.telefono.as_deref()),
            asunto: draft.asunto.trim().to_string(),
            mensaje: normalize_optional(draft.mensaje.as_deref()),
            preferencia_contacto,
            acepta_terminos: draft.acepta_terminos,
            fecha_creacion: now_ms,
            fecha_actualizacion: now_ms,
        })
    }

    /// Re-checks every invariant of an already constructed record.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        let mut push = |field: ContactoField, message: Option<String>| {
            if let Some(message) = message {
                errors.push(FieldError::new(field, message));
            }
        };

        if !is_valid_id(self.id.as_str()) {
            push(
                ContactoField::Id,
                Some(format!("identificador inválido `{}`", self.id)),
            );
        }
        push(ContactoField::Nombre, check_nombre(self.nombre.trim()));
        push(ContactoField::Email, check_email(&self.email));
        push(
            ContactoField::Telefono,
            self.telefono.as_deref().and_then(check_telefono),
        );
        push(ContactoField::Asunto, check_asunto(self.asunto.trim()));
        push(
            ContactoField::Mensaje,
            self.mensaje.as_deref().and_then(check_mensaje),
        );
        push(
            ContactoField::AceptaTerminos,
            check_terminos(self.acepta_terminos),
        );
        if self.fecha_actualizacion < self.fecha_creacion {
            push(
                ContactoField::FechaActualizacion,
                Some(format!(
                    "fechaActualizacion ({}) must be >= fechaCreacion ({})",
                    self.fecha_actualizacion, self.fecha_creacion
                )),
            );
        }

        ValidationErrors::from_errors(errors)
    }

    /// Applies `patch` after validating the resulting record.
    ///
    /// The record is left untouched when validation fails. Timestamps are not
    /// changed here; the repository refreshes them on `update`.
    pub fn revise(&mut self, patch: &ContactoPatch) -> Result<(), ValidationErrors> {
        let mut candidate = self.clone();
        let mut errors = Vec::new();

        if let Some(asunto) = &patch.asunto {
            candidate.asunto = asunto.trim().to_string();
        }
        if let Some(mensaje) = &patch.mensaje {
            candidate.mensaje = normalize_optional(Some(mensaje));
        }
        if let Some(telefono) = &patch.telefono {
            candidate.telefono = normalize_optional(Some(telefono));
        }
        if let Some(preferencia) = &patch.preferencia_contacto {
            match PreferenciaContacto::parse(preferencia) {
                Some(value) => candidate.preferencia_contacto = value,
                None => errors.push(FieldError::new(
                    ContactoField::PreferenciaContacto,
                    "Selecciona una preferencia de contacto válida (Email, Phone o WhatsApp)",
                )),
            }
        }

        if let Err(validation) = candidate.validate() {
            errors.extend(validation.into_inner());
        }
        ValidationErrors::from_errors(errors)?;

        *self = candidate;
        Ok(())
    }

    /// Refreshes the modification timestamp.
    ///
    /// The new value is strictly greater than the previous one even when the
    /// clock has not advanced.
    pub fn touch(&mut self, now_ms: i64) {
        self.fecha_actualizacion = now_ms.max(self.fecha_actualizacion.saturating_add(1));
    }

    /// Copies the revisable fields of `other` onto this record.
    ///
    /// Id, nombre, email, terms acceptance and both timestamps are kept.
    pub(crate) fn adopt_revision(&mut self, other: &Contacto) {
        self.telefono = other.telefono.clone();
        self.asunto = other.asunto.clone();
        self.mensaje = other.mensaje.clone();
        self.preferencia_contacto = other.preferencia_contacto;
    }

    /// Case-insensitive email comparison.
    pub fn has_email(&self, email: &str) -> bool {
        self.email == normalize_email(email)
    }

    pub fn id(&self) -> &ContactoId {
        &self.id
    }

    pub fn nombre(&self) -> &str {
        &self.nombre
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn telefono(&self) -> Option<&str> {
        self.telefono.as_deref()
    }

    pub fn asunto(&self) -> &str {
        &self.asunto
    }

    pub fn mensaje(&self) -> Option<&str> {
        self.mensaje.as_deref()
    }

    pub fn preferencia_contacto(&self) -> PreferenciaContacto {
        self.preferencia_contacto
    }

    pub fn acepta_terminos(&self) -> bool {
        self.acepta_terminos
    }

    pub fn fecha_creacion(&self) -> i64 {
        self.fecha_creacion
    }

    pub fn fecha_actualizacion(&self) -> i64 {
        self.fecha_actualizacion
    }
}

/// Deserialization shape; normalized, then checked by `Contacto::validate`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactoRecord {
    id: ContactoId,
    nombre: String,
    email: String,
    #[serde(default)]
    telefono: Option<String>,
    asunto: String,
    #[serde(default)]
    mensaje: Option<String>,
    preferencia_contacto: PreferenciaContacto,
    acepta_terminos: bool,
    fecha_creacion: i64,
    fecha_actualizacion: i64,
}

impl TryFrom<ContactoRecord> for Contacto {
    type Error = ValidationErrors;

    fn try_from(record: ContactoRecord) -> Result<Self, Self::Error> {
        let contacto = Self {
            id: record.id,
            nombre: record.nombre.trim().to_string(),
            email: normalize_email(&record.email),
            telefono: normalize_optional(record.telefono.as_deref()),
            asunto: record.asunto.trim().to_string(),
            mensaje: normalize_optional(record.mensaje.as_deref()),
            preferencia_contacto: record.preferencia_contacto,
            acepta_terminos: record.acepta_terminos,
            fecha_creacion: record.fecha_creacion,
            fecha_actualizacion: record.fecha_actualizacion,
        };
        contacto.validate()?;
        Ok(contacto)
    }
}

/// Trims and lower-cases an email address.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn check_nombre(nombre: &str) -> Option<String> {
    let chars = nombre.chars().count();
    if chars == 0 {
        Some("El nombre es obligatorio".to_string())
    } else if chars < NOMBRE_MIN_CHARS {
        Some(format!(
            "El nombre debe tener al menos {NOMBRE_MIN_CHARS} caracteres"
        ))
    } else if chars > NOMBRE_MAX_CHARS {
        Some(format!(
            "El nombre no puede superar {NOMBRE_MAX_CHARS} caracteres"
        ))
    } else {
        None
    }
}

fn check_email(email: &str) -> Option<String> {
    if email.is_empty() {
        Some("El email es obligatorio".to_string())
    } else if email.chars().count() > EMAIL_MAX_CHARS || !EMAIL_RE.is_match(email) {
        Some("El email no tiene un formato válido".to_string())
    } else {
        None
    }
}

fn check_telefono(telefono: &str) -> Option<String> {
    let digits = telefono.chars().filter(char::is_ascii_digit).count();
    if !TELEFONO_RE.is_match(telefono) {
        Some("El teléfono solo puede contener dígitos, espacios y + - ( ) .".to_string())
    } else if !(TELEFONO_MIN_DIGITS..=TELEFONO_MAX_DIGITS).contains(&digits) {
        Some(format!(
            "El teléfono debe tener entre {TELEFONO_MIN_DIGITS} y {TELEFONO_MAX_DIGITS} dígitos"
        ))
    } else {
        None
    }
}

fn check_asunto(asunto: &str) -> Option<String> {
    if asunto.is_empty() {
        Some("El asunto es obligatorio".to_string())
    } else {
        None
    }
}

fn check_mensaje(mensaje: &str) -> Option<String> {
    if mensaje.chars().count() > MENSAJE_MAX_CHARS {
        Some(format!(
            "El mensaje no puede superar {MENSAJE_MAX_CHARS} caracteres"
        ))
    } else {
        None
    }
}

fn check_terminos(accepted: bool) -> Option<String> {
    if accepted {
        None
    } else {
        Some("Debes aceptar los términos y condiciones".to_string())
    }
}

fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut reversed = Vec::new();
    while value > 0 {
        reversed.push(char::from(DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    reversed.into_iter().rev().collect()
}

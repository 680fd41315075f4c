//! Field rules for a brief. All rules run; failures are collected, never short-circuited.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::field::Field;
use crate::record::BriefRecord;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+()\-.\s]{6,25}$").expect("phone pattern"));

/// Shape check only: `local@domain.tld` with no whitespace. Not RFC 5322.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Empty (after trim) is valid; otherwise digits, `+ ( ) - .` and spaces, 6 to 25 long.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.trim().is_empty() || PHONE.is_match(phone)
}

/// Outcome of [`validate`]. Errors are keyed by field and ordered by registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: BTreeMap<Field, String>,
}

impl ValidationResult {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.values().cloned().collect()
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            ok: bool,
            errors: BTreeMap<&'static str, &'a str>,
        }
        Wire {
            ok: self.ok(),
            errors: self
                .errors
                .iter()
                .map(|(field, msg)| (field.name(), msg.as_str()))
                .collect(),
        }
        .serialize(serializer)
    }
}

fn min_trimmed(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Check a record against the intake rules.
pub fn validate(record: &BriefRecord) -> ValidationResult {
    let mut errors = BTreeMap::new();
    let mut fail = |field: Field, msg: &str| {
        errors.insert(field, msg.to_string());
    };

    if !min_trimmed(record.text(Field::ClienteNombre), 3) {
        fail(
            Field::ClienteNombre,
            "Nombre del cliente requerido (mínimo 3 caracteres).",
        );
    }
    if !min_trimmed(record.text(Field::ContactoNombre), 3) {
        fail(
            Field::ContactoNombre,
            "Nombre de la persona de contacto es obligatorio.",
        );
    }
    if !is_valid_email(record.text(Field::ContactoEmail)) {
        fail(Field::ContactoEmail, "Ingrese un correo electrónico válido.");
    }
    if !min_trimmed(record.text(Field::DescripcionProyecto), 20) {
        fail(
            Field::DescripcionProyecto,
            "Descripción breve obligatoria (mínimo 20 caracteres).",
        );
    }
    if !min_trimmed(record.text(Field::Audiencia), 10) {
        fail(
            Field::Audiencia,
            "Describe el público objetivo (mínimo 10 caracteres).",
        );
    }
    if !is_valid_phone(record.text(Field::ContactoTel)) {
        fail(Field::ContactoTel, "Número de teléfono inválido.");
    }
    let copy = record.text(Field::EmailCopia);
    if !copy.is_empty() && !is_valid_email(copy) {
        fail(
            Field::EmailCopia,
            "El correo para la copia no parece válido.",
        );
    }

    ValidationResult { errors }
}

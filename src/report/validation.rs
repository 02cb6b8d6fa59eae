//! Field-level validation for report requests.
//!
//! Rules are declared as static tables of [`Rule`] values, one table per
//! entity, and evaluated by [`apply_rules`]. Messages are in Portuguese since
//! they are returned to API clients as-is.

use chrono::{Datelike, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::model::{MaintenanceEntry, OwnerRecord, RequestParts, VehicleRecord};
use super::traits::Validator;

lazy_static! {
    /// Legacy Brazilian plate, normalized (AAA9999)
    static ref REGEX_LEGACY_PLATE: Regex = Regex::new(r"^[A-Z]{3}[0-9]{4}$").unwrap();
    /// Mercosul plate, normalized (AAA9A99)
    static ref REGEX_MERCOSUL_PLATE: Regex = Regex::new(r"^[A-Z]{3}[0-9][A-Z][0-9]{2}$").unwrap();
    /// CPF, punctuated (000.000.000-00)
    static ref REGEX_DOCUMENT: Regex =
        Regex::new(r"^[0-9]{3}\.[0-9]{3}\.[0-9]{3}-[0-9]{2}$").unwrap();
}

/// A single field failure, serialized as `{ "field": ..., "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    /// Path of the offending field, e.g. `historicoManutencao[1].custo`
    #[schema(example = "veiculo.placa")]
    pub field: String,
    #[schema(example = "Placa é obrigatória.")]
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Ordered collection of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// True if any error was reported for exactly this field path.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} erro(s) de validação: {}", self.len(), self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Shared inputs for rule evaluation. `now` is captured once per request so
/// every time-based rule sees the same instant.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub now: NaiveDateTime,
}

impl ValidationContext {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

pub type Check<T> = fn(&T, &ValidationContext) -> bool;

/// One constraint on one field of `T`.
pub struct Rule<T> {
    pub field: &'static str,
    pub check: Check<T>,
    pub message: &'static str,
}

/// Evaluate `rules` against `target`, appending failures under `path`.
///
/// Rules for the same field short-circuit after the first failure; rules for
/// other fields still run.
pub fn apply_rules<T>(
    target: &T,
    rules: &[Rule<T>],
    path: &str,
    ctx: &ValidationContext,
    errors: &mut ValidationErrors,
) {
    let mut failed: Vec<&'static str> = Vec::new();

    for rule in rules {
        if failed.contains(&rule.field) {
            continue;
        }
        if !(rule.check)(target, ctx) {
            failed.push(rule.field);
            errors.add(ValidationError::new(
                format!("{}.{}", path, rule.field),
                rule.message,
            ));
        }
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Present and not blank.
pub fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Character count at most `max`. Absent values pass; presence is its own rule.
pub fn max_chars(value: &Option<String>, max: usize) -> bool {
    value.as_deref().map_or(true, |v| v.chars().count() <= max)
}

pub fn chars_between(value: &Option<String>, min: usize, max: usize) -> bool {
    value.as_deref().map_or(true, |v| {
        let count = v.chars().count();
        count >= min && count <= max
    })
}

/// Strip spaces and hyphens and uppercase, e.g. `abc-1234` -> `ABC1234`.
pub fn normalize_plate(plate: &str) -> String {
    plate.replace([' ', '-'], "").to_uppercase()
}

/// Legacy (AAA-9999) or Mercosul (AAA9A99) plate.
pub fn is_valid_plate(plate: &str) -> bool {
    if plate.is_empty() {
        return false;
    }
    let normalized = normalize_plate(plate);
    REGEX_LEGACY_PLATE.is_match(&normalized) || REGEX_MERCOSUL_PLATE.is_match(&normalized)
}

pub fn is_valid_document(document: &str) -> bool {
    REGEX_DOCUMENT.is_match(document)
}

// ============================================================================
// Rule tables
// ============================================================================

pub static VEHICLE_RULES: &[Rule<VehicleRecord>] = &[
    Rule {
        field: "placa",
        check: |v, _| is_present(&v.plate),
        message: "Placa é obrigatória.",
    },
    Rule {
        field: "placa",
        check: |v, _| v.plate.as_deref().is_some_and(is_valid_plate),
        message: "Placa deve seguir o formato brasileiro (AAA-9999) ou Mercosul (AAA9A99).",
    },
    Rule {
        field: "marca",
        check: |v, _| is_present(&v.make),
        message: "Marca é obrigatória.",
    },
    Rule {
        field: "marca",
        check: |v, _| max_chars(&v.make, 50),
        message: "Marca deve ter no máximo 50 caracteres.",
    },
    Rule {
        field: "modelo",
        check: |v, _| is_present(&v.model),
        message: "Modelo é obrigatório.",
    },
    Rule {
        field: "modelo",
        check: |v, _| max_chars(&v.model, 50),
        message: "Modelo deve ter no máximo 50 caracteres.",
    },
    Rule {
        field: "ano",
        check: |v, _| v.year > 1900,
        message: "Ano inválido.",
    },
    Rule {
        field: "ano",
        check: |v, ctx| v.year <= ctx.now.year(),
        message: "Ano não pode ser posterior ao ano atual.",
    },
];

pub static OWNER_RULES: &[Rule<OwnerRecord>] = &[
    Rule {
        field: "nome",
        check: |o, _| is_present(&o.name),
        message: "Nome é obrigatório.",
    },
    Rule {
        field: "nome",
        check: |o, _| chars_between(&o.name, 3, 100),
        message: "Nome deve ter entre 3 e 100 caracteres.",
    },
    Rule {
        field: "documento",
        check: |o, _| is_present(&o.document),
        message: "Documento é obrigatório.",
    },
    Rule {
        field: "documento",
        check: |o, _| o.document.as_deref().is_some_and(is_valid_document),
        message: "Documento deve estar no formato 000.000.000-00",
    },
    Rule {
        field: "endereco",
        check: |o, _| is_present(&o.address),
        message: "Endereço é obrigatório.",
    },
    Rule {
        field: "endereco",
        check: |o, _| max_chars(&o.address, 200),
        message: "Endereço deve ter no máximo 200 caracteres.",
    },
];

pub static MAINTENANCE_RULES: &[Rule<MaintenanceEntry>] = &[
    Rule {
        field: "data",
        check: |m, _| m.date.is_some(),
        message: "Data é obrigatória.",
    },
    Rule {
        field: "data",
        check: |m, ctx| m.date.map_or(true, |d| d <= ctx.now),
        message: "Data não pode ser futura.",
    },
    Rule {
        field: "servico",
        check: |m, _| is_present(&m.service),
        message: "Serviço é obrigatório.",
    },
    Rule {
        field: "servico",
        check: |m, _| max_chars(&m.service, 100),
        message: "Serviço deve ter no máximo 100 caracteres.",
    },
    Rule {
        field: "quilometragem",
        check: |m, _| m.mileage > 0,
        message: "Quilometragem deve ser maior que zero.",
    },
    Rule {
        field: "custo",
        check: |m, _| m.cost > Decimal::ZERO,
        message: "Custo deve ser maior que zero.",
    },
];

impl Validator for RequestParts<'_> {
    /// Validate every nested entity and every history entry, collecting all
    /// failures before returning.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        apply_rules(self.vehicle, VEHICLE_RULES, "veiculo", ctx, &mut errors);
        apply_rules(self.owner, OWNER_RULES, "proprietario", ctx, &mut errors);
        for (index, entry) in self.history.iter().enumerate() {
            let path = format!("historicoManutencao[{}]", index);
            apply_rules(entry, MAINTENANCE_RULES, &path, ctx, &mut errors);
        }

        errors.into_result()
    }
}

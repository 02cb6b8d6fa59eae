//! Request payload for the vehicle maintenance report.
//!
//! Every field is optional on the wire so that a missing value surfaces as a
//! validation message instead of a deserialization failure. Presence of the
//! nested objects is checked through [`ReportRequest::parts`].

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Dados do veículo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VehicleRecord {
    #[serde(rename = "placa", default)]
    #[schema(example = "ABC-1234")]
    pub plate: Option<String>,
    #[serde(rename = "marca", default)]
    #[schema(example = "Volkswagen")]
    pub make: Option<String>,
    #[serde(rename = "modelo", default)]
    #[schema(example = "Gol")]
    pub model: Option<String>,
    #[serde(rename = "ano", default)]
    #[schema(example = 2018)]
    pub year: i32,
}

/// Dados do proprietário.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OwnerRecord {
    #[serde(rename = "nome", default)]
    #[schema(example = "Maria da Silva")]
    pub name: Option<String>,
    /// CPF no formato 000.000.000-00
    #[serde(rename = "documento", default)]
    #[schema(example = "123.456.789-00")]
    pub document: Option<String>,
    #[serde(rename = "endereco", default)]
    #[schema(example = "Rua das Flores, 123 - São Paulo/SP")]
    pub address: Option<String>,
}

/// Um registro do histórico de manutenção.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceEntry {
    #[serde(rename = "data", default, deserialize_with = "flexible_datetime")]
    #[schema(value_type = Option<String>, example = "2024-03-15")]
    pub date: Option<NaiveDateTime>,
    #[serde(rename = "servico", default)]
    #[schema(example = "Troca de óleo")]
    pub service: Option<String>,
    #[serde(rename = "quilometragem", default)]
    #[schema(example = 45000)]
    pub mileage: i64,
    #[serde(rename = "custo", default)]
    #[schema(value_type = f64, example = 189.9)]
    pub cost: Decimal,
}

/// Request body for `POST /api/relatorio/gerar-relatorio`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[serde(rename = "veiculo", default)]
    pub vehicle: Option<VehicleRecord>,
    #[serde(rename = "proprietario", default)]
    pub owner: Option<OwnerRecord>,
    #[serde(rename = "historicoManutencao", default)]
    pub history: Option<Vec<MaintenanceEntry>>,
}

/// Borrowed view over a request whose nested objects are all present and whose
/// maintenance history holds at least one entry.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub vehicle: &'a VehicleRecord,
    pub owner: &'a OwnerRecord,
    pub history: &'a [MaintenanceEntry],
}

/// First nested object found missing by [`ReportRequest::parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    Vehicle,
    Owner,
    History,
}

impl MissingPart {
    pub fn message(self) -> &'static str {
        match self {
            MissingPart::Vehicle => "Dados do veículo são obrigatórios",
            MissingPart::Owner => "Dados do proprietário são obrigatórios",
            MissingPart::History => "Histórico de manutenção é obrigatório",
        }
    }
}

impl ReportRequest {
    /// Split the request into its nested objects, failing on the first one that
    /// is absent. An empty history counts as absent.
    pub fn parts(&self) -> Result<RequestParts<'_>, MissingPart> {
        let vehicle = self.vehicle.as_ref().ok_or(MissingPart::Vehicle)?;
        let owner = self.owner.as_ref().ok_or(MissingPart::Owner)?;
        let history = match self.history.as_deref() {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Err(MissingPart::History),
        };

        Ok(RequestParts {
            vehicle,
            owner,
            history,
        })
    }
}

/// Parse the date formats clients send for `data`.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("data inválida: '{}'", s))),
    }
}

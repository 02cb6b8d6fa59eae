//! Declarative description of the report document.
//!
//! [`ReportDocument::build`] turns a request into header lines, body blocks
//! and a footer. It holds no geometry beyond column widths; pagination and
//! drawing belong to [`super::engine`].

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::common::{
    format_currency, format_date, format_mileage, format_timestamp, or_placeholder,
};
use super::model::RequestParts;
use super::RenderError;

pub const TITLE: &str = "RELATÓRIO DE VEÍCULO";
pub const TOTAL_LABEL: &str = "TOTAL:";
pub const TOTAL_OVERFLOW_MESSAGE: &str = "Soma dos custos excede o valor máximo suportado";

/// A centered line in the page header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLine {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    /// Extra space above the line, in points.
    pub padding_top: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Fixed width in points.
    Constant(f32),
    /// Share of the width left after constant columns.
    Relative(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<ColumnWidth>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total: Vec<String>,
}

impl Table {
    /// Header row, data rows and total row.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Bold section title.
    Heading(String),
    /// Indented `label: value` line.
    Field { label: String, value: String },
    Table(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub header: Vec<HeaderLine>,
    pub body: Vec<Block>,
    pub footer: String,
    pub total_cost: Decimal,
}

fn field(label: &str, value: impl Into<String>) -> Block {
    Block::Field {
        label: label.to_string(),
        value: value.into(),
    }
}

impl ReportDocument {
    /// Lay out the fixed report structure for `parts`, stamped with `generated_at`.
    pub fn build(
        parts: &RequestParts<'_>,
        generated_at: NaiveDateTime,
    ) -> Result<Self, RenderError> {
        let vehicle = parts.vehicle;
        let owner = parts.owner;
        let plate = or_placeholder(vehicle.plate.as_deref());
        let owner_name = or_placeholder(owner.name.as_deref());

        let header = vec![
            HeaderLine {
                text: TITLE.to_string(),
                size: 20.0,
                bold: true,
                padding_top: 0.0,
            },
            HeaderLine {
                text: format!("Placa: {}", plate),
                size: 14.0,
                bold: true,
                padding_top: 0.0,
            },
            HeaderLine {
                text: format!("Proprietário: {}", owner_name),
                size: 12.0,
                bold: false,
                padding_top: 5.0,
            },
        ];

        let mut rows = Vec::with_capacity(parts.history.len());
        for (index, entry) in parts.history.iter().enumerate() {
            let date = entry.date.ok_or_else(|| {
                RenderError::Precondition(format!(
                    "Data da manutenção {} não informada",
                    index + 1
                ))
            })?;
            rows.push(vec![
                format_date(date.date()),
                or_placeholder(entry.service.as_deref()).to_string(),
                format_mileage(entry.mileage),
                format_currency(entry.cost),
            ]);
        }

        let total_cost = parts
            .history
            .iter()
            .try_fold(Decimal::ZERO, |sum, entry| sum.checked_add(entry.cost))
            .ok_or_else(|| RenderError::Precondition(TOTAL_OVERFLOW_MESSAGE.to_string()))?;

        let table = Table {
            columns: vec![
                ColumnWidth::Constant(80.0),
                ColumnWidth::Relative(1.0),
                ColumnWidth::Constant(80.0),
                ColumnWidth::Constant(80.0),
            ],
            header: ["Data", "Serviço", "KM", "Custo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows,
            total: vec![
                String::new(),
                String::new(),
                TOTAL_LABEL.to_string(),
                format_currency(total_cost),
            ],
        };

        let body = vec![
            Block::Heading("DADOS DO VEÍCULO".to_string()),
            field("Placa", plate),
            field("Marca", or_placeholder(vehicle.make.as_deref())),
            field("Modelo", or_placeholder(vehicle.model.as_deref())),
            field("Ano", vehicle.year.to_string()),
            Block::Heading("DADOS DO PROPRIETÁRIO".to_string()),
            field("Nome", owner_name),
            field("Documento", or_placeholder(owner.document.as_deref())),
            field("Endereço", or_placeholder(owner.address.as_deref())),
            Block::Heading("HISTÓRICO DE MANUTENÇÃO".to_string()),
            Block::Table(table),
        ];

        Ok(Self {
            header,
            body,
            footer: format!("Gerado em: {}", format_timestamp(generated_at)),
            total_cost,
        })
    }

    pub fn table(&self) -> Option<&Table> {
        self.body.iter().find_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }
}

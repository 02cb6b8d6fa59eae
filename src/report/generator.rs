//! Generator for the vehicle maintenance report.

use chrono::NaiveDateTime;

use super::common::report_filename;
use super::engine::PdfRenderEngine;
use super::layout::ReportDocument;
use super::model::ReportRequest;
use super::traits::Generator;
use super::{GeneratedReport, RenderError};

/// Renders validated requests to PDF.
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    engine: PdfRenderEngine,
}

impl ReportGenerator {
    pub fn new(engine: PdfRenderEngine) -> Self {
        Self { engine }
    }
}

impl<'a> Generator<&'a ReportRequest> for ReportGenerator {
    /// Re-checks the request's nested objects, lays the document out and
    /// renders it. Never renders a partial report.
    fn generate(
        &self,
        request: &'a ReportRequest,
        generated_at: NaiveDateTime,
    ) -> Result<GeneratedReport, RenderError> {
        let parts = request
            .parts()
            .map_err(|missing| RenderError::Precondition(missing.message().to_string()))?;

        let plate = parts.vehicle.plate.as_deref().unwrap_or_default();
        log::info!("Iniciando geração do relatório para placa {}", plate);

        let document = ReportDocument::build(&parts, generated_at)?;
        let pdf = self.engine.render(&document, generated_at)?;

        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        log::info!(
            "Relatório gerado com sucesso para {} ({} bytes)",
            plate,
            pdf.len()
        );

        Ok(GeneratedReport {
            filename: report_filename(plate, generated_at.date()),
            pdf,
            generated_at,
        })
    }
}

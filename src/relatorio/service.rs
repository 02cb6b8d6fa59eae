//! Report pipeline, independent of the HTTP layer.
//!
//! `Received -> PresenceChecked -> Validated -> Rendered -> Responded`; any
//! failure ends the request with a [`ReportError`].

use std::fmt;

use chrono::NaiveDateTime;

use super::error::{ReportError, NULL_PAYLOAD_MESSAGE};
use crate::report::{
    GeneratedReport, Generator, PdfRenderEngine, ReportGenerator, ReportRequest,
    ValidationContext, Validator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    Received,
    PresenceChecked,
    Validated,
    Rendered,
    Responded,
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportStage::Received => "received",
            ReportStage::PresenceChecked => "presence-checked",
            ReportStage::Validated => "validated",
            ReportStage::Rendered => "rendered",
            ReportStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportService {
    generator: ReportGenerator,
}

impl ReportService {
    pub fn new(generator: ReportGenerator) -> Self {
        Self { generator }
    }

    /// Service backed by the process-wide engine settings.
    pub fn from_settings() -> Self {
        Self::new(ReportGenerator::new(PdfRenderEngine::from_global()))
    }

    /// Run one request through presence checks, validation and rendering.
    /// `now` is used both as the validation reference and the render timestamp.
    pub fn generate(
        &self,
        payload: Option<ReportRequest>,
        now: NaiveDateTime,
    ) -> Result<GeneratedReport, ReportError> {
        let request = payload.ok_or_else(|| {
            log::warn!("Requisição recebida com payload nulo");
            ReportError::PayloadMissing(NULL_PAYLOAD_MESSAGE.to_string())
        })?;

        let parts = request.parts().map_err(|missing| {
            log::warn!("Requisição incompleta: {}", missing.message());
            ReportError::from_missing(missing)
        })?;
        log::debug!("Report request {}", ReportStage::PresenceChecked);

        parts
            .validate(&ValidationContext::new(now))
            .map_err(|errors| {
                log::warn!("Falha de validação: {}", errors.summary());
                ReportError::ValidationFailed(errors)
            })?;
        log::debug!("Report request {}", ReportStage::Validated);

        let report = self.generator.generate(&request, now).map_err(|err| {
            log::error!("Erro ao gerar relatório: {}", err);
            ReportError::from(err)
        })?;
        log::debug!("Report request {}", ReportStage::Rendered);

        Ok(report)
    }
}

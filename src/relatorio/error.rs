//! Error taxonomy for report requests and its mapping to HTTP responses.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use super::service::ReportStage;
use crate::middleware::TraceId;
use crate::report::model::MissingPart;
use crate::report::{RenderError, ValidationErrors};
use crate::{ErrorDetails, ErrorResponse};

pub const NULL_PAYLOAD_MESSAGE: &str = "Payload da requisição não pode ser nulo";
pub const INVALID_DATA_MESSAGE: &str = "Dados inválidos";
pub const EMPTY_HISTORY_MESSAGE: &str =
    "Histórico de manutenção é obrigatório e deve conter pelo menos um registro";
pub const INVALID_ARGUMENT_MESSAGE: &str = "Dados fornecidos são inválidos";
pub const INTERNAL_ERROR: &str = "Erro interno do servidor";
pub const INTERNAL_ERROR_MESSAGE: &str = "Ocorreu um erro inesperado ao gerar o relatório";

/// Why a report request did not produce a PDF.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Null payload or a required nested object is absent.
    #[error("{0}")]
    PayloadMissing(String),
    #[error("validação falhou: {0}")]
    ValidationFailed(ValidationErrors),
    /// Maintenance history present but empty (or absent).
    #[error("Histórico de manutenção é obrigatório e deve conter pelo menos um registro")]
    EmptyHistory,
    /// The renderer rejected a request that slipped past the handler's checks.
    #[error("{0}")]
    RenderPrecondition(String),
    #[error("erro na formatação do documento PDF: {0}")]
    RenderLayout(String),
    #[error("falha na geração do PDF - arquivo vazio")]
    RenderEmptyOutput,
    #[error("erro inesperado ao gerar relatório: {0}")]
    Unexpected(String),
}

impl ReportError {
    /// Classify a missing nested object found by the boundary presence check.
    pub fn from_missing(missing: MissingPart) -> Self {
        match missing {
            MissingPart::History => ReportError::EmptyHistory,
            other => ReportError::PayloadMissing(other.message().to_string()),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::PayloadMissing(_)
                | ReportError::ValidationFailed(_)
                | ReportError::EmptyHistory
                | ReportError::RenderPrecondition(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Stage of the pipeline during which the request failed.
    pub fn stage(&self) -> ReportStage {
        match self {
            ReportError::PayloadMissing(_) | ReportError::EmptyHistory => {
                ReportStage::PresenceChecked
            }
            ReportError::ValidationFailed(_) => ReportStage::Validated,
            _ => ReportStage::Rendered,
        }
    }

    /// Client-facing body. Internal failures carry only a generic message.
    pub fn to_error_response(&self, trace_id: &TraceId) -> ErrorResponse {
        let response = match self {
            ReportError::PayloadMissing(message) => ErrorResponse::new(message.as_str()),
            ReportError::ValidationFailed(errors) => ErrorResponse::new(INVALID_DATA_MESSAGE)
                .with_details(ErrorDetails::Fields(errors.iter().cloned().collect())),
            ReportError::EmptyHistory => ErrorResponse::new(EMPTY_HISTORY_MESSAGE),
            ReportError::RenderPrecondition(message) => {
                ErrorResponse::new(INVALID_ARGUMENT_MESSAGE)
                    .with_details(ErrorDetails::Text(message.clone()))
            }
            ReportError::RenderLayout(_)
            | ReportError::RenderEmptyOutput
            | ReportError::Unexpected(_) => ErrorResponse::internal_error(),
        };

        response.with_trace_id(trace_id)
    }

    pub fn error_response(&self, trace_id: &TraceId) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_error_response(trace_id))
    }
}

impl From<RenderError> for ReportError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Precondition(message) => ReportError::RenderPrecondition(message),
            RenderError::Layout(detail) => ReportError::RenderLayout(detail),
            RenderError::EmptyOutput => ReportError::RenderEmptyOutput,
            other => ReportError::Unexpected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ValidationError;

    #[test]
    fn test_render_errors_map_to_internal() {
        let layout: ReportError = RenderError::Layout("overflow".into()).into();
        assert_eq!(layout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let empty: ReportError = RenderError::EmptyOutput.into();
        assert!(matches!(empty, ReportError::RenderEmptyOutput));

        let io: ReportError =
            RenderError::Write(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into();
        assert!(matches!(io, ReportError::Unexpected(_)));
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let trace_id = TraceId::new();
        let body = ReportError::RenderLayout("linha excede a página".into())
            .to_error_response(&trace_id);
        assert_eq!(body.error, INTERNAL_ERROR);
        assert_eq!(body.message.as_deref(), Some(INTERNAL_ERROR_MESSAGE));
        assert!(body.details.is_none());
        assert_eq!(body.trace_id, Some(trace_id.to_string()));
    }

    #[test]
    fn test_validation_details() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("veiculo.placa", "Placa é obrigatória."));
        let body = ReportError::ValidationFailed(errors).to_error_response(&TraceId::new());

        assert_eq!(body.error, INVALID_DATA_MESSAGE);
        match body.details {
            Some(ErrorDetails::Fields(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "veiculo.placa");
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_from_missing() {
        assert!(matches!(
            ReportError::from_missing(MissingPart::History),
            ReportError::EmptyHistory
        ));
        assert!(matches!(
            ReportError::from_missing(MissingPart::Owner),
            ReportError::PayloadMissing(_)
        ));
    }
}

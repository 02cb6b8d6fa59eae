use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;

use super::error::{ReportError, INVALID_DATA_MESSAGE, NULL_PAYLOAD_MESSAGE};
use super::service::{ReportService, ReportStage};
use crate::middleware::TraceId;
use crate::report::ReportRequest;
use crate::{ErrorDetails, ErrorResponse};

/// Default maximum accepted JSON body, in bytes.
pub const DEFAULT_JSON_LIMIT: usize = 256 * 1024;

/// Gera o relatório em PDF de um veículo e seu histórico de manutenção.
#[utoipa::path(
    post,
    path = "/api/relatorio/gerar-relatorio",
    tag = "Relatório",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Relatório gerado", content_type = "application/pdf"),
        (status = 400, description = "Dados inválidos", body = ErrorResponse),
        (status = 500, description = "Erro interno do servidor", body = ErrorResponse)
    )
)]
pub async fn generate_report(
    req: HttpRequest,
    service: web::Data<ReportService>,
    body: web::Json<Option<ReportRequest>>,
) -> HttpResponse {
    let trace_id = TraceId::of(&req);
    log::info!(
        "Recebida requisição para gerar relatório (trace {}, {})",
        trace_id,
        ReportStage::Received
    );

    let payload = body.into_inner();
    let now = Local::now().naive_local();
    let service = service.into_inner();

    let outcome = web::block(move || service.generate(payload, now))
        .await
        .unwrap_or_else(|err| {
            log::error!("Falha inesperada no pool de geração (trace {}): {}", trace_id, err);
            Err(ReportError::Unexpected(err.to_string()))
        });

    match outcome {
        Ok(report) => {
            log::info!(
                "Relatório {} enviado (trace {}, {})",
                report.filename,
                trace_id,
                ReportStage::Responded
            );
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(report.filename)],
                })
                .body(report.pdf)
        }
        Err(err) => {
            if err.is_client_error() {
                log::warn!(
                    "Relatório rejeitado na etapa {} (trace {}): {}",
                    err.stage(),
                    trace_id,
                    err
                );
            } else {
                log::error!(
                    "Erro interno na etapa {} (trace {}): {}",
                    err.stage(),
                    trace_id,
                    err
                );
            }
            err.error_response(&trace_id)
        }
    }
}

/// serde_json reports an empty body as EOF before the first character.
fn is_empty_body(err: &serde_json::Error) -> bool {
    err.is_eof() && err.line() == 1 && err.column() == 0
}

/// JSON extractor settings: bodies that fail to parse become JSON 400s.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, req| {
            let trace_id = TraceId::of(req);
            log::warn!("Corpo da requisição inválido (trace {}): {}", trace_id, err);

            let body = match &err {
                JsonPayloadError::Deserialize(e) if is_empty_body(e) => {
                    ErrorResponse::new(NULL_PAYLOAD_MESSAGE)
                }
                other => ErrorResponse::new(INVALID_DATA_MESSAGE)
                    .with_details(ErrorDetails::Text(other.to_string())),
            };

            let response = HttpResponse::BadRequest().json(body.with_trace_id(&trace_id));
            InternalError::from_response(err, response).into()
        })
}

/// Register the report route with a custom JSON body limit.
pub fn configure_with_limit(cfg: &mut web::ServiceConfig, limit: usize) {
    cfg.service(
        web::resource("/relatorio/gerar-relatorio")
            .app_data(json_config(limit))
            .route(web::post().to(generate_report)),
    );
}

pub fn config(cfg: &mut web::ServiceConfig) {
    configure_with_limit(cfg, DEFAULT_JSON_LIMIT);
}

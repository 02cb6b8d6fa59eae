use actix_cors::Cors;
use actix_web::middleware::{from_fn, Compress, Logger};
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod middleware;
pub mod relatorio;
pub mod report;

use crate::middleware::TraceId;
use crate::relatorio::error::{INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE};
use crate::report::ValidationError;

/// Extra information attached to an error response: either one entry per
/// invalid field, or a free-text detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorDetails {
    Fields(Vec<ValidationError>),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
            trace_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Generic 500 body; never carries internal detail.
    pub fn internal_error() -> Self {
        Self::new(INTERNAL_ERROR).with_message(INTERNAL_ERROR_MESSAGE)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_trace_id(mut self, trace_id: &TraceId) -> Self {
        self.trace_id = Some(trace_id.to_string());
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::relatorio::handlers::generate_report),
    components(schemas(
        report::ReportRequest,
        report::VehicleRecord,
        report::OwnerRecord,
        report::MaintenanceEntry,
        ValidationError,
        ErrorDetails,
        ErrorResponse,
    )),
    tags(
        (
            name = "Relatório",
            description = "Geração de relatórios de manutenção de veículos em PDF."
        )
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    if !report::engine::configure(config.engine.clone()) {
        log::warn!("Report engine settings were already configured; keeping the existing ones");
    }
    log::info!(
        "Report engine: debug_layout={}, compress={}",
        config.engine.debug_layout,
        config.engine.compress
    );

    let service = web::Data::new(relatorio::ReportService::from_settings());

    let prometheus = PrometheusMetricsBuilder::new("relatorio_veiculo")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    let origins = config.allowed_origins.clone();
    let json_limit = config.json_limit;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static(middleware::TRACE_ID_HEADER),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(from_fn(middleware::fault_boundary))
            .app_data(service.clone())
            .service(
                web::scope("/api")
                    .configure(|cfg| relatorio::configure_with_limit(cfg, json_limit)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("server terminated with an error")
}

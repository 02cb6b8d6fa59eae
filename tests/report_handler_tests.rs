mod common;

use actix_web::body::{to_bytes, BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{from_fn, Next};
use actix_web::{test, web, App, Error, HttpResponse};
use common::{plain_engine, sample_json};
use relatorio_veiculo_server::middleware::{fault_boundary, TRACE_ID_HEADER};
use relatorio_veiculo_server::relatorio::error::{
    EMPTY_HISTORY_MESSAGE, INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE, INVALID_ARGUMENT_MESSAGE,
    INVALID_DATA_MESSAGE, NULL_PAYLOAD_MESSAGE,
};
use relatorio_veiculo_server::relatorio::{self, ReportService};
use relatorio_veiculo_server::report::layout::TOTAL_OVERFLOW_MESSAGE;
use relatorio_veiculo_server::report::ReportGenerator;
use serde_json::{json, Value};

const ROUTE: &str = "/api/relatorio/gerar-relatorio";

macro_rules! report_app {
    () => {
        test::init_service(
            App::new()
                .wrap(from_fn(fault_boundary))
                .app_data(web::Data::new(ReportService::new(ReportGenerator::new(
                    plain_engine(),
                ))))
                .service(web::scope("/api").configure(relatorio::config)),
        )
        .await
    };
}

fn field_paths(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[actix_web::test]
async fn test_generate_report_returns_pdf() {
    let app = report_app!();

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(sample_json())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("relatorio_ABC_1234_"));
    assert!(disposition.contains(".pdf"));
    assert!(resp.headers().contains_key(TRACE_ID_HEADER));

    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF-"));
}

#[actix_web::test]
async fn test_null_payload_is_rejected() {
    let app = report_app!();

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .insert_header(header::ContentType::json())
        .set_payload("null")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], NULL_PAYLOAD_MESSAGE);
    assert!(body["traceId"].is_string());
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn test_empty_body_is_null_payload() {
    let app = report_app!();

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .insert_header(header::ContentType::json())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], NULL_PAYLOAD_MESSAGE);
}

#[actix_web::test]
async fn test_missing_owner_is_rejected() {
    let app = report_app!();
    let mut payload = sample_json();
    payload.as_object_mut().unwrap().remove("proprietario");

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Dados do proprietário são obrigatórios");
}

#[actix_web::test]
async fn test_empty_history_is_rejected() {
    let app = report_app!();
    let mut payload = sample_json();
    payload["historicoManutencao"] = json!([]);

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], EMPTY_HISTORY_MESSAGE);
}

#[actix_web::test]
async fn test_validation_errors_list_every_field() {
    let app = report_app!();
    let mut payload = sample_json();
    payload["veiculo"]["placa"] = json!("AB12345");
    payload["proprietario"]["documento"] = json!("12345678900");
    payload["historicoManutencao"][1]["custo"] = json!(0);

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], INVALID_DATA_MESSAGE);
    assert_eq!(
        field_paths(&body),
        vec![
            "veiculo.placa",
            "proprietario.documento",
            "historicoManutencao[1].custo",
        ]
    );
    assert_eq!(body["details"][2]["message"], "Custo deve ser maior que zero.");
}

#[actix_web::test]
async fn test_malformed_json_is_rejected() {
    let app = report_app!();

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .insert_header(header::ContentType::json())
        .set_payload("{ \"veiculo\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], INVALID_DATA_MESSAGE);
    assert!(body["details"].is_string());
    assert!(body["traceId"].is_string());
}

#[actix_web::test]
async fn test_unparseable_date_is_rejected() {
    let app = report_app!();
    let mut payload = sample_json();
    payload["historicoManutencao"][0]["data"] = json!("15/03/2024");

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], INVALID_DATA_MESSAGE);
}

#[actix_web::test]
async fn test_unknown_route_returns_json_with_trace_id() {
    let app = report_app!();
    let trace_id = "6f1c1c8e-3b8a-4d0e-9a57-0f4a5b3e2c11";

    let req = test::TestRequest::get()
        .uri("/api/nao-existe")
        .insert_header((TRACE_ID_HEADER, trace_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get(TRACE_ID_HEADER).unwrap(), trace_id);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["traceId"], trace_id);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_wrong_method_returns_json() {
    let app = report_app!();

    let req = test::TestRequest::get().uri(ROUTE).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[actix_web::test]
async fn test_cost_sum_overflow_is_rejected() {
    let app = report_app!();
    let mut payload = sample_json();
    payload["historicoManutencao"][0]["custo"] = json!(5e28);
    payload["historicoManutencao"][1]["custo"] = json!(5e28);

    let req = test::TestRequest::post()
        .uri(ROUTE)
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], INVALID_ARGUMENT_MESSAGE);
    assert_eq!(body["details"], TOTAL_OVERFLOW_MESSAGE);
}

async fn failing_service(
    _req: ServiceRequest,
    _next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    Err(ErrorInternalServerError("falha no disco: /var/tmp/render"))
}

async fn rejecting_service(
    _req: ServiceRequest,
    _next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    Err(ErrorBadRequest("cabeçalho ausente"))
}

async fn read_error(err: Error) -> (StatusCode, Option<String>, Value) {
    let response: HttpResponse = err.error_response();
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    let bytes = to_bytes(response.into_body()).await.unwrap();
    (status, trace, serde_json::from_slice(&bytes).unwrap())
}

#[actix_web::test]
async fn test_inner_server_error_becomes_generic_json() {
    let app = test::init_service(
        App::new()
            .wrap(from_fn(failing_service))
            .wrap(from_fn(fault_boundary))
            .route("/", web::get().to(HttpResponse::Ok)),
    )
    .await;
    let trace_id = "0b7e4a52-9f0c-4c2e-8d6b-2f1a3c4d5e6f";

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((TRACE_ID_HEADER, trace_id))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    let (status, trace, body) = read_error(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace.as_deref(), Some(trace_id));
    assert_eq!(body["error"], INTERNAL_ERROR);
    assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
    assert_eq!(body["traceId"], trace_id);
    assert!(!body.to_string().contains("/var/tmp"));
}

#[actix_web::test]
async fn test_inner_client_error_keeps_message() {
    let app = test::init_service(
        App::new()
            .wrap(from_fn(rejecting_service))
            .wrap(from_fn(fault_boundary))
            .route("/", web::get().to(HttpResponse::Ok)),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    let (status, trace, body) = read_error(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(trace.is_some());
    assert_eq!(body["message"], "cabeçalho ausente");
    assert_eq!(body["traceId"].as_str(), trace.as_deref());
}

mod common;

use common::{contains_bytes, date, entry, fixed_now, plain_engine, sample_request};
use relatorio_veiculo_server::report::layout::ReportDocument;
use relatorio_veiculo_server::report::{
    EngineSettings, Generator, PdfRenderEngine, RenderError, ReportGenerator,
};
use rust_decimal::Decimal;

fn render(request: &relatorio_veiculo_server::report::ReportRequest) -> Vec<u8> {
    let document = ReportDocument::build(&request.parts().unwrap(), fixed_now()).unwrap();
    plain_engine().render(&document, fixed_now()).unwrap()
}

fn page_count(pdf: &[u8]) -> usize {
    lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
}

#[test]
fn test_render_produces_pdf() {
    let pdf = render(&sample_request());

    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(page_count(&pdf), 1);
    assert!(contains_bytes(&pdf, b"(TOTAL:)"));
    assert!(contains_bytes(&pdf, b"(R$ 1.439,90)"));
    assert!(contains_bytes(&pdf, b"(Placa: ABC-1234)"));
    assert!(contains_bytes(&pdf, b"Helvetica-Bold"));
    assert!(contains_bytes(&pdf, b"D:20261016120000"));
}

#[test]
fn test_render_is_deterministic() {
    let request = sample_request();
    assert_eq!(render(&request), render(&request));
}

#[test]
fn test_long_history_spans_pages() {
    let mut request = sample_request();
    request.history = Some(
        (0..200)
            .map(|i| entry(date(2020, 1, 1), &format!("Serviço {}", i), 1_000 + i, Decimal::ONE))
            .collect(),
    );

    let pdf = render(&request);
    assert!(page_count(&pdf) > 1);
    assert!(contains_bytes(&pdf, b"(Servi\xe7o 199)"));
    assert!(contains_bytes(&pdf, b"(R$ 200,00)"));
}

#[test]
fn test_compressed_output_still_loads() {
    let request = sample_request();
    let document = ReportDocument::build(&request.parts().unwrap(), fixed_now()).unwrap();
    let engine = PdfRenderEngine::new(EngineSettings {
        debug_layout: true,
        compress: true,
    });

    let pdf = engine.render(&document, fixed_now()).unwrap();
    assert_eq!(page_count(&pdf), 1);
}

#[test]
fn test_row_taller_than_page_is_layout_error() {
    let mut request = sample_request();
    request.history.as_mut().unwrap()[0].service = Some("manutenção ".repeat(3_000));

    let document = ReportDocument::build(&request.parts().unwrap(), fixed_now()).unwrap();
    let result = plain_engine().render(&document, fixed_now());
    assert!(matches!(result, Err(RenderError::Layout(_))));
}

#[test]
fn test_generator_names_file_after_plate_and_date() {
    let generator = ReportGenerator::new(plain_engine());
    let request = sample_request();

    let report = generator.generate(&request, fixed_now()).unwrap();
    assert_eq!(report.filename, "relatorio_ABC_1234_16102026.pdf");
    assert_eq!(report.generated_at, fixed_now());
    assert!(report.pdf.starts_with(b"%PDF-"));
}

#[test]
fn test_generator_rejects_empty_history() {
    let generator = ReportGenerator::new(plain_engine());
    let mut request = sample_request();
    request.history = Some(Vec::new());

    match generator.generate(&request, fixed_now()) {
        Err(RenderError::Precondition(message)) => {
            assert_eq!(message, "Histórico de manutenção é obrigatório")
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.filename)),
    }
}

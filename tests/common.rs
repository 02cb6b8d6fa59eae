#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use relatorio_veiculo_server::report::{
    EngineSettings, MaintenanceEntry, OwnerRecord, PdfRenderEngine, ReportRequest, VehicleRecord,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// Reference instant used wherever a test needs "now".
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn entry(when: NaiveDateTime, service: &str, mileage: i64, cost: Decimal) -> MaintenanceEntry {
    MaintenanceEntry {
        date: Some(when),
        service: Some(service.to_string()),
        mileage,
        cost,
    }
}

pub fn sample_vehicle() -> VehicleRecord {
    VehicleRecord {
        plate: Some("ABC-1234".to_string()),
        make: Some("Volkswagen".to_string()),
        model: Some("Gol".to_string()),
        year: 2018,
    }
}

pub fn sample_owner() -> OwnerRecord {
    OwnerRecord {
        name: Some("Maria da Silva".to_string()),
        document: Some("123.456.789-00".to_string()),
        address: Some("Rua das Flores, 123 - São Paulo/SP".to_string()),
    }
}

/// A request that passes every rule: two entries totalling R$ 1.439,90.
pub fn sample_request() -> ReportRequest {
    ReportRequest {
        vehicle: Some(sample_vehicle()),
        owner: Some(sample_owner()),
        history: Some(vec![
            entry(date(2024, 3, 15), "Troca de óleo", 45_000, Decimal::new(18990, 2)),
            entry(date(2025, 1, 10), "Revisão dos freios", 52_000, Decimal::new(125000, 2)),
        ]),
    }
}

pub fn sample_json() -> Value {
    json!({
        "veiculo": {
            "placa": "ABC-1234",
            "marca": "Volkswagen",
            "modelo": "Gol",
            "ano": 2018
        },
        "proprietario": {
            "nome": "Maria da Silva",
            "documento": "123.456.789-00",
            "endereco": "Rua das Flores, 123 - São Paulo/SP"
        },
        "historicoManutencao": [
            { "data": "2024-03-15", "servico": "Troca de óleo", "quilometragem": 45000, "custo": 189.90 },
            { "data": "2025-01-10", "servico": "Revisão dos freios", "quilometragem": 52000, "custo": 1250.00 }
        ]
    })
}

/// Engine writing uncompressed content streams, so tests can search the bytes.
pub fn plain_engine() -> PdfRenderEngine {
    PdfRenderEngine::new(EngineSettings {
        debug_layout: false,
        compress: false,
    })
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

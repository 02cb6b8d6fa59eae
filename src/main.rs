#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    relatorio_veiculo_server::run().await
}

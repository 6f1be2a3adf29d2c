//! Ponto de entrada do ETL de vendas
//!
//! Sequencia um run completo: conecta no banco, garante o schema,
//! detecta os arquivos CSV do diretório de dados e executa um pipeline
//! por arquivo, logando as estatísticas por arquivo, as globais do run e
//! as agregadas pelo banco. O código de saída reflete sucesso ou falha.

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use vendastar::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variáveis de ambiente do .env, quando presente
    dotenv::dotenv().ok();

    let config = ETLConfig::from_env()?;

    // Configura logging estruturado; RUST_LOG tem precedência
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone())),
        )
        .init();

    tracing::info!(versao = vendastar::version(), "Iniciando run do vendastar");

    let loader = StarSchemaLoader::connect(&config.database)
        .await?
        .with_columns(ColumnMapping::from(&config.pipeline));
    loader.ensure_schema().await?;

    let global_stats = Arc::new(Mutex::new(RunningStats::new()));

    let files = discover_csv_files(&config.pipeline.data_dir)?;
    tracing::info!(
        arquivos = files.len(),
        diretorio = %config.pipeline.data_dir,
        "Arquivos CSV detectados"
    );

    for file in &files {
        tracing::info!(arquivo = %file.display(), "Trabalhando com o arquivo");

        let transformer =
            SalesTransformer::from_config(&config.pipeline, Arc::clone(&global_stats));
        let file_summary = transformer.summary_handle();

        let pipeline = Pipeline::with_config(config.clone())
            .extract(CsvExtractor::new(file))
            .transform(transformer)
            .load(loader.clone())
            .build();

        let result = pipeline.execute().await?;

        if let Some(summary) = file_summary.lock().unwrap().clone() {
            tracing::info!(
                arquivo = %file.display(),
                coluna = %config.pipeline.amount_column,
                "Estatísticas do arquivo: {}",
                summary
            );
        }

        tracing::info!(
            fatos = result.rows_successful,
            descartadas = result.rows_failed,
            "Estatísticas globais do run: {}",
            global_stats.lock().unwrap().snapshot()
        );

        let db_stats = loader.fact_statistics().await?;
        tracing::info!("Estatísticas do banco: {}", db_stats);
    }

    tracing::info!("Run concluído com sucesso");

    Ok(())
}

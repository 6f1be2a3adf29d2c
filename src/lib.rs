//! # Vendastar - ETL de vendas para esquema estrela
//!
//! Utilitário batch que carrega registros de vendas em CSV, limpa e
//! transforma os dados e persiste o resultado em um esquema estrela
//! (fato/dimensão) no PostgreSQL.
//!
//! ## Características Principais
//!
//! - 📂 **Entrada CSV**: detecção automática dos arquivos no diretório de dados
//! - 🧹 **Limpeza**: linhas malformadas são descartadas e logadas, nunca persistidas
//! - 📅 **Dimensão de tempo**: ano, semestre, trimestre e mês derivados da data da venda
//! - 💰 **Precisão monetária**: valores como `Decimal` de ponta a ponta, duas casas decimais
//! - 📊 **Estatísticas**: resumo por arquivo, acumulado global e agregados direto do banco
//! - ⭐ **Esquema estrela**: dimensões resolvidas por lookup-or-insert, fatos em uma transação
//!
//! ## Exemplo Rápido
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use vendastar::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ETLConfig::from_env()?;
//!     let global = Arc::new(Mutex::new(RunningStats::new()));
//!
//!     let loader = StarSchemaLoader::connect(&config.database).await?;
//!     loader.ensure_schema().await?;
//!
//!     let pipeline = Pipeline::builder()
//!         .extract(CsvExtractor::new("./data/vendas.csv"))
//!         .transform(SalesTransformer::from_config(&config.pipeline, global))
//!         .load(loader)
//!         .build();
//!
//!     pipeline.execute().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Arquitetura
//!
//! O fluxo segue três componentes encadeados pelo [`Pipeline`]:
//!
//! ### Extractors
//! Detectam e leem os arquivos CSV do diretório de dados.
//!
//! ### Transformers
//! Removem linhas com nulos, derivam os campos de calendário, validam o
//! valor monetário e calculam as estatísticas descritivas.
//!
//! ### Loaders
//! Resolvem as dimensões de usuário e de tempo e inserem os fatos de
//! venda no PostgreSQL (ou em memória, nos testes).

pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod stats;
pub mod traits;
pub mod transform;
pub mod types;

// Re-exports para facilitar o uso
pub use config::ETLConfig;
pub use error::{ETLError, Result};
pub use events::{InMemoryEventEmitter, LoggingEventEmitter};
pub use pipeline::Pipeline;
pub use traits::*;
pub use types::{DataRow, DataValue, PipelineEvent, PipelineResult, PipelineState};

/// Prelude com imports mais comuns
pub mod prelude {
    pub use crate::config::ETLConfig;
    pub use crate::error::{ETLError, Result};
    pub use crate::events::{InMemoryEventEmitter, LoggingEventEmitter};
    pub use crate::pipeline::Pipeline;
    pub use crate::traits::{EventEmitter, Extractor, Loader, Transformer};
    pub use crate::types::{DataRow, DataValue, PipelineEvent, PipelineResult, PipelineState};

    // Extractors
    pub use crate::extract::csv::CsvExtractor;
    pub use crate::extract::discover_csv_files;

    // Transformers
    pub use crate::transform::sales::{
        AmountTransform, CalendarTransform, ColumnStatsTransform, CompositeTransformer,
        DropNullRowsTransform, FilterTransform, SalesTransformer,
    };

    // Loaders
    pub use crate::load::memory::MemoryLoader;
    pub use crate::load::star::{FactStatistics, StarSchemaLoader};

    // Modelo e estatísticas
    pub use crate::model::{CleanSale, ColumnMapping, DimTime, DimUser, FactSale};
    pub use crate::stats::{describe, RunningStats, Summary};
}

/// Informações sobre a versão da biblioteca
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Informações sobre a biblioteca
pub fn about() -> &'static str {
    env!("CARGO_PKG_DESCRIPTION")
}

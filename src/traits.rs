use async_trait::async_trait;
use crate::error::Result;
use crate::types::{DataRow, PipelineResult};

/// Trait para componentes que extraem dados
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extrai dados da fonte
    async fn extract(&self) -> Result<Vec<DataRow>>;
}

/// Trait para componentes que transformam dados
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transforma um lote de dados
    ///
    /// Linhas malformadas são removidas do lote (e logadas); um erro
    /// só deve ser retornado quando a execução inteira precisa abortar.
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>>;
}

/// Trait para componentes que carregam dados
#[async_trait]
pub trait Loader: Send + Sync {
    /// Carrega dados para o destino
    async fn load(&self, data: Vec<DataRow>) -> Result<PipelineResult>;

    /// Finaliza o carregamento (flush, commit, etc.)
    async fn finalize(&self) -> Result<()> {
        Ok(()) // Implementação padrão
    }

    /// Verifica se o destino está disponível
    async fn health_check(&self) -> Result<bool> {
        Ok(true) // Implementação padrão
    }
}

/// Trait para emissão de eventos do pipeline
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Emite um evento do pipeline
    async fn emit(&self, event: crate::types::PipelineEvent) -> Result<()>;
}

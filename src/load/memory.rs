//! # Memory Loader
//!
//! Carregador que acumula as linhas em memória. Usado nos testes do
//! pipeline e em execuções de desenvolvimento sem banco disponível.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::Loader;
use crate::types::{DataRow, PipelineResult};

/// Carregador que acumula dados em memória
///
/// Os dados ficam atrás de `Arc<Mutex<>>`, então clones compartilham o
/// mesmo armazenamento e o conteúdo pode ser inspecionado após a carga.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    data: std::sync::Arc<std::sync::Mutex<Vec<DataRow>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtém uma cópia dos dados armazenados
    pub fn get_data(&self) -> Vec<DataRow> {
        self.data.lock().unwrap().clone()
    }

    /// Limpa todos os dados armazenados
    pub fn clear(&self) {
        self.data.lock().unwrap().clear();
    }

    /// Número de registros armazenados
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&self, data: Vec<DataRow>) -> Result<PipelineResult> {
        let start_time = std::time::Instant::now();
        let mut result = PipelineResult::new();

        result.rows_processed = data.len();
        result.rows_successful = data.len();

        self.data.lock().unwrap().extend(data);
        result.execution_time_ms = start_time.elapsed().as_millis() as u64;

        Ok(result)
    }
}

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::ETLConfig;
use crate::error::Result;
use crate::events::LoggingEventEmitter;
use crate::traits::{EventEmitter, Extractor, Loader, Transformer};
use crate::types::{PipelineEvent, PipelineResult, PipelineState};

/// Pipeline ETL principal com suporte a eventos e estado
///
/// Sequencia extração, transformação e carga de um arquivo de vendas.
/// A execução é estritamente sequencial: um estágio por vez, na ordem.
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    config: ETLConfig,
    metrics: Arc<std::sync::Mutex<PipelineMetrics>>,
    state: Arc<std::sync::Mutex<PipelineState>>,
    event_emitter: Arc<dyn EventEmitter>,
    pipeline_id: String,
}

/// Métricas do pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub executions: Vec<PipelineExecution>,
    pub total_rows_processed: usize,
    pub total_execution_time_ms: u64,
    pub success_rate: f64,
}

/// Informações de uma execução do pipeline
#[derive(Debug, Clone)]
pub struct PipelineExecution {
    pub timestamp: SystemTime,
    pub result: PipelineResult,
    pub config_snapshot: ETLConfig,
}

impl Pipeline<(), (), ()> {
    /// Cria um novo builder de pipeline
    pub fn builder() -> PipelineBuilder<(), (), ()> {
        PipelineBuilder::new()
    }

    /// Cria um builder com configuração personalizada
    pub fn with_config(config: ETLConfig) -> PipelineBuilder<(), (), ()> {
        PipelineBuilder::with_config(config)
    }
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor + Send + Sync,
    T: Transformer + Send + Sync,
    L: Loader + Send + Sync,
{
    /// Retorna o ID do pipeline
    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Retorna o estado atual do pipeline
    pub fn current_state(&self) -> PipelineState {
        self.state.lock().unwrap().clone()
    }

    /// Altera o estado do pipeline e emite evento
    async fn set_state(&self, new_state: PipelineState) -> Result<()> {
        let old_state = {
            let mut state = self.state.lock().unwrap();
            let old = state.clone();
            *state = new_state.clone();
            old
        };

        let event = PipelineEvent::StateChanged {
            pipeline_id: self.pipeline_id.clone(),
            old_state,
            new_state,
            timestamp: SystemTime::now(),
        };

        self.event_emitter.emit(event).await?;
        Ok(())
    }

    /// Emite evento de erro e marca o pipeline como falho
    async fn fail(&self, error_msg: String) -> Result<()> {
        self.set_state(PipelineState::Failed(error_msg.clone())).await?;

        let event = PipelineEvent::Error {
            pipeline_id: self.pipeline_id.clone(),
            error: error_msg,
            timestamp: SystemTime::now(),
        };
        self.event_emitter.emit(event).await?;
        Ok(())
    }

    /// Executa o pipeline com gerenciamento de estado e eventos
    pub async fn execute(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let mut final_result = PipelineResult::new();

        let start_event = PipelineEvent::Started {
            pipeline_id: self.pipeline_id.clone(),
            timestamp: SystemTime::now(),
        };
        self.event_emitter.emit(start_event).await?;

        self.set_state(PipelineState::Extracting).await?;

        tracing::info!("Iniciando execução do pipeline");

        // Validações de saúde
        if !self.loader.health_check().await? {
            let error_msg = "Health check do loader falhou".to_string();
            self.fail(error_msg.clone()).await?;
            return Err(crate::error::ETLError::Pipeline(error_msg));
        }

        // Extração
        tracing::info!("Iniciando extração de dados");
        let extracted_data = match self.extractor.extract().await {
            Ok(data) => {
                tracing::info!("Extraídos {} registros", data.len());
                data
            }
            Err(e) => {
                self.fail(format!("Erro na extração: {}", e)).await?;
                return Err(e);
            }
        };
        let extracted_count = extracted_data.len();

        self.set_state(PipelineState::Transforming).await?;

        // Transformação (linhas malformadas são descartadas aqui)
        tracing::info!("Iniciando transformação de dados");
        let transformed_data = match self.transformer.transform(extracted_data).await {
            Ok(data) => {
                tracing::info!("Transformados {} registros", data.len());
                data
            }
            Err(e) => {
                self.fail(format!("Erro na transformação: {}", e)).await?;
                return Err(e);
            }
        };

        let discarded = extracted_count - transformed_data.len();
        if discarded > 0 {
            let event = PipelineEvent::RowsDiscarded {
                pipeline_id: self.pipeline_id.clone(),
                stage: "transformação".to_string(),
                count: discarded,
                timestamp: SystemTime::now(),
            };
            self.event_emitter.emit(event).await?;
        }

        self.set_state(PipelineState::Loading).await?;

        // Carregamento
        tracing::info!("Iniciando carregamento de dados");
        let load_result = match self.loader.load(transformed_data).await {
            Ok(result) => {
                tracing::info!("Carregados {} registros", result.rows_successful);
                result
            }
            Err(e) => {
                self.fail(format!("Erro no carregamento: {}", e)).await?;
                return Err(e);
            }
        };

        // Finalização
        self.loader.finalize().await?;

        final_result.rows_processed = extracted_count;
        final_result.rows_successful = load_result.rows_successful;
        final_result.rows_failed = discarded + load_result.rows_failed;
        final_result.execution_time_ms = start_time.elapsed().as_millis() as u64;
        final_result.errors = load_result.errors;

        self.set_state(PipelineState::Completed).await?;

        let completion_event = PipelineEvent::Completed {
            pipeline_id: self.pipeline_id.clone(),
            result: final_result.clone(),
            timestamp: SystemTime::now(),
        };
        self.event_emitter.emit(completion_event).await?;

        self.record_execution(&final_result);

        tracing::info!(
            "Pipeline executado com sucesso, {} registros processados em {}ms",
            final_result.rows_processed,
            final_result.execution_time_ms
        );

        Ok(final_result)
    }

    /// Obtém métricas do pipeline
    pub fn get_metrics(&self) -> PipelineMetrics {
        self.metrics.lock().unwrap().clone()
    }

    /// Reseta métricas do pipeline
    pub fn reset_metrics(&self) {
        *self.metrics.lock().unwrap() = PipelineMetrics::default();
    }

    /// Registra uma execução nas métricas
    fn record_execution(&self, result: &PipelineResult) {
        let mut metrics = self.metrics.lock().unwrap();

        metrics.executions.push(PipelineExecution {
            timestamp: SystemTime::now(),
            result: result.clone(),
            config_snapshot: self.config.clone(),
        });
        metrics.total_rows_processed += result.rows_processed;
        metrics.total_execution_time_ms += result.execution_time_ms;

        let total_successful: usize = metrics
            .executions
            .iter()
            .map(|e| e.result.rows_successful)
            .sum();
        let total_processed: usize = metrics
            .executions
            .iter()
            .map(|e| e.result.rows_processed)
            .sum();

        metrics.success_rate = if total_processed > 0 {
            total_successful as f64 / total_processed as f64
        } else {
            0.0
        };
    }
}

/// Builder para criação de pipelines
pub struct PipelineBuilder<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    config: ETLConfig,
    event_emitter: Option<Arc<dyn EventEmitter>>,
    _phantom: PhantomData<(E, T, L)>,
}

impl PipelineBuilder<(), (), ()> {
    /// Cria um novo builder
    pub fn new() -> Self {
        Self {
            extractor: (),
            transformer: (),
            loader: (),
            config: ETLConfig::default(),
            event_emitter: None,
            _phantom: PhantomData,
        }
    }

    /// Cria um builder com configuração personalizada
    pub fn with_config(config: ETLConfig) -> Self {
        Self {
            extractor: (),
            transformer: (),
            loader: (),
            config,
            event_emitter: None,
            _phantom: PhantomData,
        }
    }
}

impl<E, T, L> PipelineBuilder<E, T, L> {
    /// Define o extrator
    pub fn extract<NewE: Extractor + Send + Sync>(
        self,
        extractor: NewE,
    ) -> PipelineBuilder<NewE, T, L> {
        PipelineBuilder {
            extractor,
            transformer: self.transformer,
            loader: self.loader,
            config: self.config,
            event_emitter: self.event_emitter,
            _phantom: PhantomData,
        }
    }

    /// Define o transformador
    pub fn transform<NewT: Transformer + Send + Sync>(
        self,
        transformer: NewT,
    ) -> PipelineBuilder<E, NewT, L> {
        PipelineBuilder {
            extractor: self.extractor,
            transformer,
            loader: self.loader,
            config: self.config,
            event_emitter: self.event_emitter,
            _phantom: PhantomData,
        }
    }

    /// Define o carregador
    pub fn load<NewL: Loader + Send + Sync>(
        self,
        loader: NewL,
    ) -> PipelineBuilder<E, T, NewL> {
        PipelineBuilder {
            extractor: self.extractor,
            transformer: self.transformer,
            loader,
            config: self.config,
            event_emitter: self.event_emitter,
            _phantom: PhantomData,
        }
    }

    /// Define a configuração
    pub fn config(mut self, config: ETLConfig) -> Self {
        self.config = config;
        self
    }

    /// Define o event emitter
    pub fn event_emitter<EventEmitterType: EventEmitter + 'static>(
        mut self,
        emitter: EventEmitterType,
    ) -> Self {
        self.event_emitter = Some(Arc::new(emitter));
        self
    }
}

impl<E, T, L> PipelineBuilder<E, T, L>
where
    E: Extractor + Send + Sync,
    T: Transformer + Send + Sync,
    L: Loader + Send + Sync,
{
    /// Constrói o pipeline
    pub fn build(self) -> Pipeline<E, T, L> {
        Pipeline {
            extractor: self.extractor,
            transformer: self.transformer,
            loader: self.loader,
            config: self.config,
            metrics: Arc::new(std::sync::Mutex::new(PipelineMetrics::default())),
            state: Arc::new(std::sync::Mutex::new(PipelineState::default())),
            event_emitter: self
                .event_emitter
                .unwrap_or_else(|| Arc::new(LoggingEventEmitter::default())),
            pipeline_id: format!(
                "vendas-{}-{}",
                std::process::id(),
                SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis()
            ),
        }
    }
}

impl Default for PipelineBuilder<(), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::events::InMemoryEventEmitter;
    use crate::extract::csv::CsvExtractor;
    use crate::load::memory::MemoryLoader;
    use crate::stats::RunningStats;
    use crate::transform::sales::{FilterTransform, SalesTransformer};
    use crate::types::DataValue;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn sales_file() -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "user_id,price,timestamp").unwrap();
        writeln!(temp_file, "1,10.00,01/15/2023").unwrap();
        writeln!(temp_file, "2,20.00,07/04/2023").unwrap();
        writeln!(temp_file, "3,abc,07/05/2023").unwrap();
        temp_file
    }

    #[tokio::test]
    async fn test_pipeline_builder_limpa_e_carrega() {
        let temp_file = sales_file();
        let global = Arc::new(Mutex::new(RunningStats::new()));
        let loader = MemoryLoader::new();

        let pipeline = Pipeline::builder()
            .extract(CsvExtractor::new(temp_file.path()))
            .transform(SalesTransformer::from_config(
                &PipelineConfig::default(),
                Arc::clone(&global),
            ))
            .load(loader.clone())
            .build();

        let result = pipeline.execute().await.unwrap();

        // a linha com valor não numérico é descartada na limpeza
        assert_eq!(result.rows_processed, 3);
        assert_eq!(result.rows_successful, 2);
        assert_eq!(result.rows_failed, 1);

        assert_eq!(loader.len(), 2);
        assert_eq!(global.lock().unwrap().record_count(), 2);
        assert_eq!(pipeline.current_state(), PipelineState::Completed);
    }

    #[tokio::test]
    async fn test_pipeline_emite_eventos() {
        let temp_file = sales_file();
        let emitter = InMemoryEventEmitter::new();

        let pipeline = Pipeline::builder()
            .extract(CsvExtractor::new(temp_file.path()))
            .transform(SalesTransformer::from_config(
                &PipelineConfig::default(),
                Arc::new(Mutex::new(RunningStats::new())),
            ))
            .load(MemoryLoader::new())
            .event_emitter(emitter.clone())
            .build();

        pipeline.execute().await.unwrap();

        let events = emitter.get_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Started { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::RowsDiscarded { count: 1, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Completed { .. })));
    }

    #[tokio::test]
    async fn test_pipeline_metrics() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "user_id,price,timestamp").unwrap();
        writeln!(temp_file, "1,30.00,02/01/2023").unwrap();

        let pipeline = Pipeline::builder()
            .extract(CsvExtractor::new(temp_file.path()))
            .transform(FilterTransform::new(|_: &crate::types::DataRow| true))
            .load(MemoryLoader::new())
            .build();

        pipeline.execute().await.unwrap();
        pipeline.execute().await.unwrap();

        let metrics = pipeline.get_metrics();
        assert_eq!(metrics.executions.len(), 2);
        assert_eq!(metrics.total_rows_processed, 2);
        assert!(metrics.success_rate > 0.0);

        pipeline.reset_metrics();
        assert_eq!(pipeline.get_metrics().executions.len(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_aborta_com_lote_vazio() {
        // arquivo só com linhas inválidas: as estatísticas não têm entrada
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "user_id,price,timestamp").unwrap();
        writeln!(temp_file, "1,10.00,data inválida").unwrap();

        let pipeline = Pipeline::builder()
            .extract(CsvExtractor::new(temp_file.path()))
            .transform(SalesTransformer::from_config(
                &PipelineConfig::default(),
                Arc::new(Mutex::new(RunningStats::new())),
            ))
            .load(MemoryLoader::new())
            .build();

        let result = pipeline.execute().await;
        assert!(result.is_err());
        assert!(matches!(
            pipeline.current_state(),
            PipelineState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_pipeline_with_config() {
        let config = ETLConfig::builder().log_level("debug").build().unwrap();

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "user_id,price,timestamp").unwrap();
        writeln!(temp_file, "5,12.34,03/03/2023").unwrap();

        let loader = MemoryLoader::new();
        let pipeline = Pipeline::with_config(config)
            .extract(CsvExtractor::new(temp_file.path()))
            .transform(FilterTransform::new(|_: &crate::types::DataRow| true))
            .load(loader.clone())
            .build();

        let result = pipeline.execute().await.unwrap();
        assert_eq!(result.rows_processed, 1);
        assert_eq!(
            loader.get_data()[0].get("user_id"),
            Some(&DataValue::Integer(5))
        );
    }
}

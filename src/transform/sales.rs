//! Limpeza e enriquecimento das linhas de venda
//!
//! A cadeia padrão de preparação dos dados:
//! remover linhas com valores nulos, converter a coluna de data e derivar
//! os campos de calendário, validar o valor monetário e, por fim, um passo
//! de observação que calcula as estatísticas da coluna de valor sem
//! alterar as linhas.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::CalendarParts;
use crate::stats::{describe, RunningStats, Summary};
use crate::traits::Transformer;
use crate::types::{DataRow, DataValue};

/// Colunas de calendário derivadas da data da venda
pub const YEAR_COLUMN: &str = "year";
pub const SEMESTER_COLUMN: &str = "semester";
pub const TRIMESTER_COLUMN: &str = "trimester";
pub const MONTH_COLUMN: &str = "month";

/// Transformador que filtra linhas baseado em uma condição
#[derive(Clone)]
pub struct FilterTransform<F> {
    filter_fn: F,
}

impl<F> FilterTransform<F>
where
    F: Fn(&DataRow) -> bool + Send + Sync + Clone,
{
    pub fn new(filter_fn: F) -> Self {
        Self { filter_fn }
    }
}

#[async_trait]
impl<F> Transformer for FilterTransform<F>
where
    F: Fn(&DataRow) -> bool + Send + Sync + Clone,
{
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        Ok(data.into_iter().filter(|row| (self.filter_fn)(row)).collect())
    }
}

/// Transformador que remove linhas contendo qualquer valor nulo
#[derive(Debug, Clone, Default)]
pub struct DropNullRowsTransform;

impl DropNullRowsTransform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transformer for DropNullRowsTransform {
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        let before = data.len();
        let result: Vec<DataRow> = data
            .into_iter()
            .filter(|row| !row.values().any(|value| value.is_null()))
            .collect();

        let dropped = before - result.len();
        if dropped > 0 {
            tracing::warn!(descartadas = dropped, "Linhas com valores nulos removidas");
        }
        tracing::info!(linhas = result.len(), "Shape após remover linhas com nulos");

        Ok(result)
    }
}

/// Transformador que converte a coluna de data e deriva campos de calendário
///
/// A coluna configurada é convertida de string para data e as colunas
/// `year`, `semester`, `trimester` e `month` são adicionadas. Linhas com
/// data ausente ou não parseável são descartadas com um aviso.
#[derive(Debug, Clone)]
pub struct CalendarTransform {
    column: String,
    format: String,
}

impl CalendarTransform {
    pub fn new(column: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            format: format.into(),
        }
    }

    fn parse_date(&self, value: &DataValue) -> Option<NaiveDate> {
        match value {
            DataValue::Date(date) => Some(*date),
            DataValue::String(s) => NaiveDate::parse_from_str(s.trim(), &self.format).ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl Transformer for CalendarTransform {
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        let before = data.len();
        let mut result = Vec::with_capacity(before);

        for mut row in data {
            let date = match row.get(&self.column).and_then(|value| self.parse_date(value)) {
                Some(date) => date,
                None => {
                    tracing::debug!(
                        coluna = %self.column,
                        valor = ?row.get(&self.column),
                        "Linha descartada: data ausente ou inválida"
                    );
                    continue;
                }
            };

            let parts = CalendarParts::from_date(date);
            row.insert(self.column.clone(), DataValue::Date(date));
            row.insert(YEAR_COLUMN.to_string(), DataValue::Integer(parts.year as i64));
            row.insert(
                SEMESTER_COLUMN.to_string(),
                DataValue::Integer(parts.semester as i64),
            );
            row.insert(
                TRIMESTER_COLUMN.to_string(),
                DataValue::Integer(parts.trimester as i64),
            );
            row.insert(MONTH_COLUMN.to_string(), DataValue::Integer(parts.month as i64));

            result.push(row);
        }

        let dropped = before - result.len();
        if dropped > 0 {
            tracing::warn!(
                descartadas = dropped,
                coluna = %self.column,
                "Linhas com data inválida removidas"
            );
        }
        tracing::info!(linhas = result.len(), "Shape após transformar a data");

        Ok(result)
    }
}

/// Transformador que valida e normaliza o valor monetário
///
/// O valor precisa ser decimal e não negativo; é normalizado a duas casas
/// antes de seguir para a carga. Linhas que não passam são descartadas
/// com um aviso.
#[derive(Debug, Clone)]
pub struct AmountTransform {
    column: String,
}

impl AmountTransform {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

#[async_trait]
impl Transformer for AmountTransform {
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        let before = data.len();
        let mut result = Vec::with_capacity(before);

        for mut row in data {
            let amount = row
                .get(&self.column)
                .and_then(|value| value.as_decimal())
                .filter(|amount| !amount.is_sign_negative());

            match amount {
                Some(amount) => {
                    row.insert(self.column.clone(), DataValue::Decimal(amount.round_dp(2)));
                    result.push(row);
                }
                None => {
                    tracing::debug!(
                        coluna = %self.column,
                        valor = ?row.get(&self.column),
                        "Linha descartada: valor monetário inválido"
                    );
                }
            }
        }

        let dropped = before - result.len();
        if dropped > 0 {
            tracing::warn!(
                descartadas = dropped,
                coluna = %self.column,
                "Linhas com valor monetário inválido removidas"
            );
        }

        Ok(result)
    }
}

/// Passo de observação que calcula estatísticas de uma coluna numérica
///
/// Não altera as linhas: resume a coluna configurada, loga o resultado,
/// alimenta o acumulador global (quando presente) e guarda o último
/// resumo para consulta após a execução. Um lote sem valores numéricos
/// aborta a execução, já que estatísticas exigem ao menos um valor.
pub struct ColumnStatsTransform {
    column: String,
    percentiles: Vec<f64>,
    global: Option<Arc<Mutex<RunningStats>>>,
    last_summary: Arc<Mutex<Option<Summary>>>,
}

impl ColumnStatsTransform {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            percentiles: vec![25.0, 50.0, 75.0],
            global: None,
            last_summary: Arc::new(Mutex::new(None)),
        }
    }

    /// Define os percentis reportados
    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = percentiles;
        self
    }

    /// Acopla o acumulador global de estatísticas do run
    pub fn with_global(mut self, global: Arc<Mutex<RunningStats>>) -> Self {
        self.global = Some(global);
        self
    }

    /// Handle compartilhado para o último resumo calculado
    pub fn summary_handle(&self) -> Arc<Mutex<Option<Summary>>> {
        Arc::clone(&self.last_summary)
    }
}

#[async_trait]
impl Transformer for ColumnStatsTransform {
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        let values: Vec<f64> = data
            .iter()
            .filter_map(|row| row.get(&self.column))
            .filter_map(|value| value.as_f64())
            .collect();

        let summary = describe(&values, &self.percentiles)?;
        tracing::info!(coluna = %self.column, "Estatísticas do lote: {}", summary);

        if let Some(global) = &self.global {
            global.lock().unwrap().update_all(&values);
        }
        *self.last_summary.lock().unwrap() = Some(summary);

        Ok(data)
    }
}

/// Transformador que combina múltiplas transformações em sequência
pub struct CompositeTransformer {
    transformers: Vec<Box<dyn Transformer + Send + Sync>>,
}

impl CompositeTransformer {
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    pub fn add<T: Transformer + Send + Sync + 'static>(mut self, transformer: T) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }
}

impl Default for CompositeTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transformer for CompositeTransformer {
    async fn transform(&self, mut data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        for transformer in &self.transformers {
            data = transformer.transform(data).await?;
        }
        Ok(data)
    }
}

/// Cadeia padrão de limpeza das vendas
///
/// Monta a sequência nulos → calendário → valor → estatísticas a partir
/// da configuração do pipeline e expõe o resumo do último lote.
pub struct SalesTransformer {
    inner: CompositeTransformer,
    summary: Arc<Mutex<Option<Summary>>>,
}

impl SalesTransformer {
    pub fn from_config(config: &PipelineConfig, global: Arc<Mutex<RunningStats>>) -> Self {
        let stats = ColumnStatsTransform::new(&config.amount_column)
            .with_percentiles(config.stats_percentiles.clone())
            .with_global(global);
        let summary = stats.summary_handle();

        let inner = CompositeTransformer::new()
            .add(DropNullRowsTransform::new())
            .add(CalendarTransform::new(&config.date_column, &config.date_format))
            .add(AmountTransform::new(&config.amount_column))
            .add(stats);

        Self { inner, summary }
    }

    /// Resumo estatístico do último lote transformado
    pub fn last_summary(&self) -> Option<Summary> {
        self.summary.lock().unwrap().clone()
    }

    /// Handle compartilhado para o resumo, útil quando o transformador
    /// é movido para dentro de um pipeline
    pub fn summary_handle(&self) -> Arc<Mutex<Option<Summary>>> {
        Arc::clone(&self.summary)
    }
}

#[async_trait]
impl Transformer for SalesTransformer {
    async fn transform(&self, data: Vec<DataRow>) -> Result<Vec<DataRow>> {
        self.inner.transform(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(user: DataValue, price: DataValue, date: DataValue) -> DataRow {
        let mut row = DataRow::new();
        row.insert("user_id".to_string(), user);
        row.insert("price".to_string(), price);
        row.insert("timestamp".to_string(), date);
        row
    }

    fn valid_row(user: i64, price: &str, date: &str) -> DataRow {
        row(
            DataValue::Integer(user),
            DataValue::Decimal(price.parse().unwrap()),
            DataValue::String(date.to_string()),
        )
    }

    #[tokio::test]
    async fn test_drop_null_rows() {
        let data = vec![
            valid_row(1, "10.00", "01/15/2023"),
            row(
                DataValue::Integer(2),
                DataValue::Null,
                DataValue::String("01/16/2023".to_string()),
            ),
        ];

        let result = DropNullRowsTransform::new().transform(data).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("user_id"), Some(&DataValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_calendar_transform_deriva_campos() {
        let data = vec![valid_row(1, "10.00", "07/14/2023")];

        let transform = CalendarTransform::new("timestamp", "%m/%d/%Y");
        let result = transform.transform(data).await.unwrap();

        assert_eq!(result.len(), 1);
        let expected_date = NaiveDate::from_ymd_opt(2023, 7, 14).unwrap();
        assert_eq!(result[0].get("timestamp"), Some(&DataValue::Date(expected_date)));
        assert_eq!(result[0].get(YEAR_COLUMN), Some(&DataValue::Integer(2023)));
        assert_eq!(result[0].get(SEMESTER_COLUMN), Some(&DataValue::Integer(2)));
        assert_eq!(result[0].get(TRIMESTER_COLUMN), Some(&DataValue::Integer(3)));
        assert_eq!(result[0].get(MONTH_COLUMN), Some(&DataValue::Integer(7)));
    }

    #[tokio::test]
    async fn test_calendar_transform_descarta_data_invalida() {
        let data = vec![
            valid_row(1, "10.00", "01/15/2023"),
            valid_row(2, "20.00", "2023/99/99"),
            valid_row(3, "30.00", "não é data"),
        ];

        let transform = CalendarTransform::new("timestamp", "%m/%d/%Y");
        let result = transform.transform(data).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("user_id"), Some(&DataValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_amount_transform_normaliza_e_descarta() {
        let data = vec![
            valid_row(1, "10.999", "01/15/2023"),
            row(
                DataValue::Integer(2),
                DataValue::Decimal(Decimal::new(-500, 2)),
                DataValue::String("01/16/2023".to_string()),
            ),
            row(
                DataValue::Integer(3),
                DataValue::String("caro".to_string()),
                DataValue::String("01/17/2023".to_string()),
            ),
        ];

        let transform = AmountTransform::new("price");
        let result = transform.transform(data).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].get("price"),
            Some(&DataValue::Decimal(Decimal::new(1100, 2)))
        );
    }

    #[tokio::test]
    async fn test_column_stats_transform_passa_adiante() {
        let global = Arc::new(Mutex::new(RunningStats::new()));
        let transform = ColumnStatsTransform::new("price")
            .with_percentiles(vec![50.0])
            .with_global(Arc::clone(&global));
        let handle = transform.summary_handle();

        let data = vec![
            valid_row(1, "10.00", "01/15/2023"),
            valid_row(2, "20.00", "01/16/2023"),
            valid_row(3, "30.00", "01/17/2023"),
        ];

        let result = transform.transform(data).await.unwrap();
        assert_eq!(result.len(), 3);

        let summary = handle.lock().unwrap().clone().unwrap();
        assert_eq!(summary.mean, 20.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);

        assert_eq!(global.lock().unwrap().record_count(), 3);
    }

    #[tokio::test]
    async fn test_column_stats_transform_lote_vazio_falha() {
        let transform = ColumnStatsTransform::new("price");
        let result = transform.transform(Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_filter_transform() {
        let data = vec![valid_row(1, "10.00", "01/15/2023"), valid_row(2, "20.00", "01/16/2023")];

        let transform = FilterTransform::new(|row: &DataRow| {
            row.get("user_id").and_then(|v| v.as_integer()).unwrap_or(0) > 1
        });

        let result = transform.transform(data).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("user_id"), Some(&DataValue::Integer(2)));
    }

    #[tokio::test]
    async fn test_sales_transformer_cadeia_completa() {
        let config = PipelineConfig::default();
        let global = Arc::new(Mutex::new(RunningStats::new()));
        let transformer = SalesTransformer::from_config(&config, Arc::clone(&global));

        let data = vec![
            valid_row(1, "10.00", "01/15/2023"),
            valid_row(2, "20.00", "06/30/2023"),
            // descartada: data inválida
            valid_row(3, "99.00", "30/02/2023"),
            // descartada: valor nulo
            row(
                DataValue::Integer(4),
                DataValue::Null,
                DataValue::String("01/20/2023".to_string()),
            ),
        ];

        let result = transformer.transform(data).await.unwrap();
        assert_eq!(result.len(), 2);

        // estatísticas calculadas só sobre as linhas válidas
        let summary = transformer.last_summary().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, 15.0);
        assert_eq!(global.lock().unwrap().record_count(), 2);
    }
}

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Representa uma linha de dados genérica vinda do CSV
pub type DataRow = HashMap<String, DataValue>;

/// Valores de dados suportados pelo pipeline
///
/// Valores monetários são representados como `Decimal` (ponto fixo),
/// nunca como ponto flutuante, para preservar as duas casas decimais
/// até a escrita no banco.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    /// Data sem horário (YYYY-MM-DD)
    Date(NaiveDate),
    Null,
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<Decimal> for DataValue {
    fn from(value: Decimal) -> Self {
        DataValue::Decimal(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<NaiveDate> for DataValue {
    fn from(value: NaiveDate) -> Self {
        DataValue::Date(value)
    }
}

impl DataValue {
    /// Converte para string se possível
    pub fn as_string(&self) -> Option<String> {
        match self {
            DataValue::String(s) => Some(s.clone()),
            DataValue::Integer(i) => Some(i.to_string()),
            DataValue::Decimal(d) => Some(d.to_string()),
            DataValue::Boolean(b) => Some(b.to_string()),
            DataValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            DataValue::Null => None,
        }
    }

    /// Converte para inteiro se possível
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DataValue::Integer(i) => Some(*i),
            DataValue::Decimal(d) => d.to_i64(),
            DataValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Converte para decimal se possível
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DataValue::Decimal(d) => Some(*d),
            DataValue::Integer(i) => Some(Decimal::from(*i)),
            DataValue::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Converte para f64 se possível (uso exclusivo das estatísticas)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Decimal(d) => d.to_f64(),
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Converte para data (NaiveDate) se possível
    ///
    /// Strings são testadas nos formatos mais comuns dos arquivos de
    /// venda (`%m/%d/%Y`, `%Y-%m-%d`, `%d/%m/%Y`).
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DataValue::Date(d) => Some(*d),
            DataValue::String(s) => {
                let s = s.trim();
                NaiveDate::parse_from_str(s, "%m/%d/%Y")
                    .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                    .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
                    .ok()
            }
            _ => None,
        }
    }

    /// Verifica se é nulo
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

/// Resultado de uma execução do pipeline
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Linhas extraídas da fonte
    pub rows_processed: usize,
    /// Linhas que viraram fatos persistidos no destino
    pub rows_successful: usize,
    /// Linhas descartadas na limpeza ou rejeitadas na carga
    pub rows_failed: usize,
    pub execution_time_ms: u64,
    pub errors: Vec<String>,
}

impl PipelineResult {
    pub fn new() -> Self {
        Self {
            rows_processed: 0,
            rows_successful: 0,
            rows_failed: 0,
            execution_time_ms: 0,
            errors: Vec::new(),
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.rows_processed == 0 {
            0.0
        } else {
            self.rows_successful as f64 / self.rows_processed as f64
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Default for PipelineResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Estados do pipeline para rastreamento de execução
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Completed,
    Failed(String),
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Ocioso"),
            PipelineState::Extracting => write!(f, "Extraindo"),
            PipelineState::Transforming => write!(f, "Transformando"),
            PipelineState::Loading => write!(f, "Carregando"),
            PipelineState::Completed => write!(f, "Concluído"),
            PipelineState::Failed(error) => write!(f, "Falhou: {}", error),
        }
    }
}

/// Eventos do pipeline para monitoramento externo
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Pipeline iniciado
    Started {
        pipeline_id: String,
        timestamp: std::time::SystemTime,
    },
    /// Estado alterado
    StateChanged {
        pipeline_id: String,
        old_state: PipelineState,
        new_state: PipelineState,
        timestamp: std::time::SystemTime,
    },
    /// Linhas descartadas durante a limpeza
    RowsDiscarded {
        pipeline_id: String,
        stage: String,
        count: usize,
        timestamp: std::time::SystemTime,
    },
    /// Erro ocorreu
    Error {
        pipeline_id: String,
        error: String,
        timestamp: std::time::SystemTime,
    },
    /// Pipeline concluído
    Completed {
        pipeline_id: String,
        result: PipelineResult,
        timestamp: std::time::SystemTime,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_decimal_from_string() {
        let value = DataValue::String("  10.50 ".to_string());
        assert_eq!(value.as_decimal(), Some(Decimal::new(1050, 2)));
    }

    #[test]
    fn test_as_decimal_from_integer() {
        assert_eq!(DataValue::Integer(42).as_decimal(), Some(Decimal::from(42)));
    }

    #[test]
    fn test_as_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 7, 14).unwrap();
        assert_eq!(DataValue::String("07/14/2023".into()).as_date(), Some(expected));
        assert_eq!(DataValue::String("2023-07-14".into()).as_date(), Some(expected));
        assert_eq!(DataValue::Date(expected).as_date(), Some(expected));
        assert_eq!(DataValue::String("não é data".into()).as_date(), None);
    }

    #[test]
    fn test_is_null() {
        assert!(DataValue::Null.is_null());
        assert!(!DataValue::Integer(0).is_null());
    }

    #[test]
    fn test_pipeline_result_success_rate() {
        let mut result = PipelineResult::new();
        assert_eq!(result.success_rate(), 0.0);

        result.rows_processed = 4;
        result.rows_successful = 3;
        result.rows_failed = 1;
        assert_eq!(result.success_rate(), 0.75);
        assert!(!result.has_errors());
    }
}

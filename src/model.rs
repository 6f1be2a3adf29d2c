//! Registros do esquema estrela de vendas
//!
//! Registros planos de dados, sem camada ORM: a persistência acontece com
//! SQL parametrizado em `load::star`. `CleanSale` é a linha validada que
//! faz a ponte entre o mundo `DataRow` do pipeline e as três tabelas.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::TransformError;
use crate::types::DataRow;

/// Dimensão de usuário (`dim_user`)
///
/// Imutável depois de criada; resolvida por lookup-or-insert na primeira
/// ocorrência da chave natural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DimUser {
    pub id: i32,
    pub user_key: i64,
}

/// Dimensão de tempo (`dim_time`)
///
/// Uma linha por data de calendário, com os campos derivados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DimTime {
    pub id: i32,
    pub date: NaiveDate,
    pub year: i32,
    pub semester: i16,
    pub trimester: i16,
    pub month: i16,
}

/// Fato de venda (`facts_sales`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FactSale {
    pub id: i32,
    pub user_id: i32,
    pub time_id: i32,
    pub amount: Decimal,
}

/// Campos de calendário derivados de uma data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarParts {
    pub year: i32,
    pub semester: i16,
    pub trimester: i16,
    pub month: i16,
}

impl CalendarParts {
    /// Deriva ano, semestre (1 ou 2), trimestre (1 a 4) e mês (1 a 12)
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month() as i16;
        Self {
            year: date.year(),
            semester: if month > 6 { 2 } else { 1 },
            trimester: (month - 1) / 3 + 1,
            month,
        }
    }
}

/// Mapeamento das colunas de entrada para os campos da venda
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub user: String,
    pub amount: String,
    pub date: String,
}

impl From<&PipelineConfig> for ColumnMapping {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            user: config.user_column.clone(),
            amount: config.amount_column.clone(),
            date: config.date_column.clone(),
        }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Linha de venda validada, pronta para persistência
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSale {
    pub user_key: i64,
    pub date: NaiveDate,
    pub calendar: CalendarParts,
    pub amount: Decimal,
}

impl CleanSale {
    /// Extrai uma venda validada de uma linha transformada
    ///
    /// Valida as três colunas mapeadas: chave de usuário inteira, data
    /// parseável e valor decimal não negativo (normalizado a duas casas).
    pub fn from_row(row: &DataRow, columns: &ColumnMapping) -> Result<Self, TransformError> {
        let user_value = row
            .get(&columns.user)
            .ok_or_else(|| TransformError::MissingColumn(columns.user.clone()))?;
        let user_key = user_value.as_integer().ok_or_else(|| {
            TransformError::ProcessingError(format!(
                "chave de usuário não inteira na coluna {}: {:?}",
                columns.user, user_value
            ))
        })?;

        let date_value = row
            .get(&columns.date)
            .ok_or_else(|| TransformError::MissingColumn(columns.date.clone()))?;
        let date = date_value.as_date().ok_or_else(|| TransformError::InvalidDate {
            column: columns.date.clone(),
            value: date_value.as_string().unwrap_or_else(|| "null".to_string()),
        })?;

        let amount_value = row
            .get(&columns.amount)
            .ok_or_else(|| TransformError::MissingColumn(columns.amount.clone()))?;
        let amount = amount_value
            .as_decimal()
            .filter(|amount| !amount.is_sign_negative())
            .ok_or_else(|| TransformError::InvalidAmount {
                column: columns.amount.clone(),
                value: amount_value.as_string().unwrap_or_else(|| "null".to_string()),
            })?
            .round_dp(2);

        Ok(Self {
            user_key,
            date,
            calendar: CalendarParts::from_date(date),
            amount,
        })
    }
}

//! # Star Schema Loader
//!
//! Carregamento das vendas limpas no esquema estrela do PostgreSQL.
//!
//! As dimensões são resolvidas por lookup-or-insert na chave natural
//! (usuário e data), com memoização dentro do run; os fatos são inseridos
//! dentro de uma única transação por carga. Em erro de banco a transação
//! inteira é desfeita e a execução aborta, sem retry.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::model::{CleanSale, ColumnMapping};
use crate::traits::Loader;
use crate::types::{DataRow, PipelineResult};

/// Carregador do esquema estrela de vendas
#[derive(Clone)]
pub struct StarSchemaLoader {
    pool: PgPool,
    columns: ColumnMapping,
    user_cache: Arc<Mutex<HashMap<i64, i32>>>,
    time_cache: Arc<Mutex<HashMap<NaiveDate, i32>>>,
}

/// Estatísticas agregadas direto da tabela de fatos
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FactStatistics {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    /// Média arredondada a duas casas pelo próprio banco
    pub average: Option<Decimal>,
    pub record_count: i64,
}

impl std::fmt::Display for FactStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.min, &self.max, &self.average) {
            (Some(min), Some(max), Some(avg)) => write!(
                f,
                "min={} max={} média={} registros={}",
                min, max, avg, self.record_count
            ),
            _ => write!(f, "sem registros"),
        }
    }
}

impl StarSchemaLoader {
    /// Abre a conexão com o banco a partir da configuração
    ///
    /// O pool é limitado a uma única conexão: o pipeline é sequencial e
    /// o banco é usado por um chamador de cada vez dentro do run.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url())
            .await?;

        tracing::info!(banco = %config.display_url(), "Conectado ao PostgreSQL");

        Ok(Self::new(pool))
    }

    /// Cria um carregador sobre um pool existente
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            columns: ColumnMapping::default(),
            user_cache: Arc::new(Mutex::new(HashMap::new())),
            time_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Define o mapeamento das colunas de entrada
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Aplica o DDL do esquema estrela (migrations embutidas)
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("Schema do esquema estrela verificado");
        Ok(())
    }

    /// Resolve a dimensão de usuário: retorna o id existente ou insere
    async fn resolve_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_key: i64,
    ) -> Result<i32> {
        if let Some(id) = self.user_cache.lock().unwrap().get(&user_key) {
            return Ok(*id);
        }

        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM dim_user WHERE user_key = $1")
            .bind(user_key)
            .fetch_optional(&mut **tx)
            .await?;

        let id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar("INSERT INTO dim_user (user_key) VALUES ($1) RETURNING id")
                    .bind(user_key)
                    .fetch_one(&mut **tx)
                    .await?
            }
        };

        self.user_cache.lock().unwrap().insert(user_key, id);
        Ok(id)
    }

    /// Resolve a dimensão de tempo: retorna o id existente ou insere
    async fn resolve_time(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale: &CleanSale,
    ) -> Result<i32> {
        if let Some(id) = self.time_cache.lock().unwrap().get(&sale.date) {
            return Ok(*id);
        }

        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM dim_time WHERE date = $1")
            .bind(sale.date)
            .fetch_optional(&mut **tx)
            .await?;

        let id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar(
                    "INSERT INTO dim_time (date, year, semester, trimester, month) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING id",
                )
                .bind(sale.date)
                .bind(sale.calendar.year)
                .bind(sale.calendar.semester)
                .bind(sale.calendar.trimester)
                .bind(sale.calendar.month)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        self.time_cache.lock().unwrap().insert(sale.date, id);
        Ok(id)
    }

    /// Estatísticas calculadas pelo banco sobre a tabela de fatos
    pub async fn fact_statistics(&self) -> Result<FactStatistics> {
        let stats = sqlx::query_as::<_, FactStatistics>(
            "SELECT MIN(amount) AS min, MAX(amount) AS max, \
             ROUND(AVG(amount), 2) AS average, COUNT(id) AS record_count \
             FROM facts_sales",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[async_trait]
impl Loader for StarSchemaLoader {
    async fn load(&self, data: Vec<DataRow>) -> Result<PipelineResult> {
        let start_time = std::time::Instant::now();
        let mut result = PipelineResult::new();
        result.rows_processed = data.len();

        let mut tx = self.pool.begin().await?;

        for row in &data {
            let sale = match CleanSale::from_row(row, &self.columns) {
                Ok(sale) => sale,
                Err(err) => {
                    tracing::warn!(erro = %err, "Linha rejeitada na carga");
                    result.rows_failed += 1;
                    result.errors.push(err.to_string());
                    continue;
                }
            };

            let user_id = self.resolve_user(&mut tx, sale.user_key).await?;
            let time_id = self.resolve_time(&mut tx, &sale).await?;

            sqlx::query("INSERT INTO facts_sales (user_id, time_id, amount) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(time_id)
                .bind(sale.amount)
                .execute(&mut *tx)
                .await?;

            result.rows_successful += 1;
        }

        tx.commit().await?;

        result.execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            fatos = result.rows_successful,
            rejeitadas = result.rows_failed,
            "Carga no esquema estrela concluída"
        );

        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        let ping: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(ping == 1)
    }
}

// Testes de integração: precisam de um PostgreSQL acessível em
// DATABASE_URL, por isso ficam atrás de #[ignore].
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataValue;

    fn sale_row(user: i64, price: &str, date: &str) -> DataRow {
        let mut row = DataRow::new();
        row.insert("user_id".to_string(), DataValue::Integer(user));
        row.insert(
            "price".to_string(),
            DataValue::Decimal(price.parse().unwrap()),
        );
        row.insert("timestamp".to_string(), DataValue::String(date.to_string()));
        row
    }

    async fn test_loader() -> StarSchemaLoader {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL não definida");
        let pool = PgPool::connect(&url).await.expect("falha ao conectar");
        let loader = StarSchemaLoader::new(pool);
        loader.ensure_schema().await.expect("falha nas migrations");
        loader
    }

    #[tokio::test]
    #[ignore = "requer PostgreSQL acessível em DATABASE_URL"]
    async fn test_carga_cria_fatos_e_dimensoes() {
        let loader = test_loader().await;

        let data = vec![
            sale_row(9001, "10.00", "01/15/2023"),
            sale_row(9002, "20.00", "01/15/2023"),
        ];

        let result = loader.load(data).await.unwrap();
        assert_eq!(result.rows_successful, 2);
        assert_eq!(result.rows_failed, 0);

        let stats = loader.fact_statistics().await.unwrap();
        assert!(stats.record_count >= 2);
    }

    #[tokio::test]
    #[ignore = "requer PostgreSQL acessível em DATABASE_URL"]
    async fn test_dimensoes_idempotentes_em_recarga() {
        let loader = test_loader().await;

        let data = vec![sale_row(9100, "15.50", "03/10/2023")];
        loader.load(data.clone()).await.unwrap();
        loader.load(data).await.unwrap();

        let user_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM dim_user WHERE user_key = 9100")
                .fetch_one(&loader.pool)
                .await
                .unwrap();
        assert_eq!(user_rows, 1);

        let time_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM dim_time WHERE date = '2023-03-10'")
                .fetch_one(&loader.pool)
                .await
                .unwrap();
        assert_eq!(time_rows, 1);
    }

    #[tokio::test]
    #[ignore = "requer PostgreSQL acessível em DATABASE_URL"]
    async fn test_linha_malformada_rejeitada_na_carga() {
        let loader = test_loader().await;

        let mut bad_row = DataRow::new();
        bad_row.insert("user_id".to_string(), DataValue::String("abc".to_string()));
        bad_row.insert("price".to_string(), DataValue::Decimal(Decimal::ONE));
        bad_row.insert(
            "timestamp".to_string(),
            DataValue::String("01/15/2023".to_string()),
        );

        let result = loader.load(vec![bad_row]).await.unwrap();
        assert_eq!(result.rows_successful, 0);
        assert_eq!(result.rows_failed, 1);
        assert!(result.has_errors());
    }
}

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::traits::Extractor;
use crate::types::{DataRow, DataValue};

/// Extrator para arquivos CSV de vendas
#[derive(Debug, Clone)]
pub struct CsvExtractor {
    file_path: String,
    delimiter: u8,
    has_headers: bool,
    quote_char: u8,
}

impl CsvExtractor {
    /// Cria um novo extrator CSV
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
            delimiter: b',',
            has_headers: true,
            quote_char: b'"',
        }
    }

    /// Define o delimitador
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Define se tem cabeçalhos
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Define o caractere de aspas
    pub fn with_quote_char(mut self, quote_char: u8) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Converte um campo CSV para DataValue
    ///
    /// Inteiros ganham prioridade sobre decimais; valores fracionários
    /// viram `Decimal` para preservar a precisão monetária. Campos
    /// vazios ou `null` viram `Null` e são descartados na limpeza.
    fn parse_value(&self, value: &str) -> DataValue {
        let trimmed = value.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        if let Ok(int_val) = trimmed.parse::<i64>() {
            return DataValue::Integer(int_val);
        }

        if let Ok(dec_val) = Decimal::from_str(trimmed) {
            return DataValue::Decimal(dec_val);
        }

        match trimmed.to_lowercase().as_str() {
            "true" | "yes" | "y" => return DataValue::Boolean(true),
            "false" | "no" | "n" => return DataValue::Boolean(false),
            _ => {}
        }

        DataValue::String(trimmed.to_string())
    }
}

#[async_trait]
impl Extractor for CsvExtractor {
    async fn extract(&self) -> Result<Vec<DataRow>> {
        use std::fs::File;
        use std::io::BufReader;

        let file = File::open(&self.file_path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .quote(self.quote_char)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();

        if self.has_headers {
            let headers = csv_reader.headers()?.clone();

            for result in csv_reader.records() {
                let record = result?;
                let mut row = DataRow::new();

                for (i, field) in record.iter().enumerate() {
                    if let Some(header) = headers.get(i) {
                        row.insert(header.to_string(), self.parse_value(field));
                    }
                }

                // colunas declaradas no cabeçalho e ausentes no registro
                for header in headers.iter().skip(record.len()) {
                    row.insert(header.to_string(), DataValue::Null);
                }

                rows.push(row);
            }
        } else {
            for result in csv_reader.records() {
                let record = result?;
                let mut row = DataRow::new();

                for (i, field) in record.iter().enumerate() {
                    row.insert(format!("column_{}", i), self.parse_value(field));
                }

                rows.push(row);
            }
        }

        tracing::debug!(arquivo = %self.file_path, linhas = rows.len(), "Extração concluída");

        Ok(rows)
    }
}

//! Estatísticas descritivas sobre colunas numéricas
//!
//! Duas peças: [`describe`], que resume uma sequência completa (contagem,
//! média, desvio padrão amostral, mínimo, máximo e percentis), e
//! [`RunningStats`], um acumulador incremental usado para as estatísticas
//! globais entre arquivos de um mesmo run.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Resumo descritivo de uma sequência numérica
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Desvio padrão amostral (n - 1); `None` com menos de dois valores
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Pares (percentil solicitado, valor)
    pub percentiles: Vec<(f64, f64)>,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} média={:.2} min={:.2} max={:.2}",
            self.count, self.mean, self.min, self.max
        )?;
        if let Some(std_dev) = self.std_dev {
            write!(f, " desvio={:.2}", std_dev)?;
        }
        for (p, v) in &self.percentiles {
            write!(f, " p{}={:.2}", p, v)?;
        }
        Ok(())
    }
}

/// Calcula as estatísticas descritivas de uma sequência
///
/// Falha com [`StatsError::EmptyInput`] quando a sequência é vazia e com
/// [`StatsError::InvalidPercentile`] quando algum percentil solicitado está
/// fora de `[0, 100]`.
pub fn describe(values: &[f64], percentiles: &[f64]) -> Result<Summary> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput.into());
    }

    for &p in percentiles {
        if !(0.0..=100.0).contains(&p) {
            return Err(StatsError::InvalidPercentile(p).into());
        }
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;

    let std_dev = if count < 2 {
        None
    } else {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (count - 1) as f64).sqrt())
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = sorted[0];
    let max = sorted[count - 1];

    let percentiles = percentiles
        .iter()
        .map(|&p| (p, percentile_of_sorted(&sorted, p)))
        .collect();

    Ok(Summary {
        count,
        mean,
        std_dev,
        min,
        max,
        percentiles,
    })
}

/// Percentil por interpolação linear entre as posições vizinhas
///
/// `sorted` precisa estar ordenado e não vazio.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

/// Acumulador incremental de estatísticas globais
///
/// Mantém mínimo, máximo, soma e contagem para resumir todos os valores
/// vistos no run, independentemente do arquivo de origem.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    min: Option<f64>,
    max: Option<f64>,
    sum: f64,
    count: usize,
}

/// Fotografia do acumulador, com valores arredondados a duas casas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningSnapshot {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub record_count: usize,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incorpora um novo valor às estatísticas
    pub fn update(&mut self, value: f64) {
        self.min = Some(match self.min {
            Some(min) => min.min(value),
            None => value,
        });
        self.max = Some(match self.max {
            Some(max) => max.max(value),
            None => value,
        });
        self.sum += value;
        self.count += 1;
    }

    /// Incorpora todos os valores de uma sequência
    pub fn update_all(&mut self, values: &[f64]) {
        for &value in values {
            self.update(value);
        }
    }

    pub fn record_count(&self) -> usize {
        self.count
    }

    /// Fotografia atual, arredondada a duas casas decimais
    pub fn snapshot(&self) -> RunningSnapshot {
        if self.count == 0 {
            return RunningSnapshot {
                min: None,
                max: None,
                average: None,
                record_count: 0,
            };
        }

        RunningSnapshot {
            min: self.min.map(round2),
            max: self.max.map(round2),
            average: Some(round2(self.sum / self.count as f64)),
            record_count: self.count,
        }
    }
}

impl std::fmt::Display for RunningSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.min, self.max, self.average) {
            (Some(min), Some(max), Some(avg)) => write!(
                f,
                "min={:.2} max={:.2} média={:.2} registros={}",
                min, max, avg, self.record_count
            ),
            _ => write!(f, "sem registros"),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

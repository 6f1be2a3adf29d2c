//! Transformações de limpeza e enriquecimento das vendas

pub mod sales;

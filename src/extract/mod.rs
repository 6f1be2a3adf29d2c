//! Extração de dados dos arquivos de venda

pub mod csv;

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Detecta os arquivos CSV presentes no diretório de dados
///
/// Retorna os caminhos em ordem determinística: primeiro os arquivos
/// regulares (ordenados por nome), por último os que contêm `validation`
/// no nome, que fecham o run. Falha quando o diretório não contém nenhum
/// CSV.
pub fn discover_csv_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();

    if files.is_empty() {
        return Err(ExtractError::NoCsvFiles(dir.display().to_string()).into());
    }

    files.sort();
    files.sort_by_key(|path| is_validation_file(path));

    Ok(files)
}

/// Arquivos de validação são processados depois dos demais
pub fn is_validation_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.contains("validation"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_discover_ordena_validation_por_ultimo() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("validation.csv")).unwrap();
        File::create(dir.path().join("vendas_b.csv")).unwrap();
        File::create(dir.path().join("vendas_a.csv")).unwrap();
        File::create(dir.path().join("notas.txt")).unwrap();

        let files = discover_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["vendas_a.csv", "vendas_b.csv", "validation.csv"]);
    }

    #[test]
    fn test_discover_sem_csv_falha() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notas.txt")).unwrap();

        let result = discover_csv_files(dir.path());
        assert!(matches!(
            result,
            Err(crate::error::ETLError::Extract(ExtractError::NoCsvFiles(_)))
        ));
    }

    #[test]
    fn test_discover_diretorio_inexistente_falha() {
        let result = discover_csv_files("/caminho/que/nao/existe");
        assert!(result.is_err());
    }
}

/*!
 * Solscope Traits
 *
 * Traits para os colaboradores externos usados pelo núcleo
 */

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Fonte das versões de compilador instaláveis (rede, cache local, etc.)
pub trait VersionSource {
    /// Lista as versões disponíveis, em qualquer ordem
    fn fetch(&self) -> Result<Vec<semver::Version>>;
}

/// Leitor de arquivos fonte referenciados pela AST
pub trait SourceReader {
    /// Lê o conteúdo de um caminho como aparece na AST (`absolutePath`)
    fn read(&self, path: &str) -> Result<String>;
}

/// Leitor padrão baseado no sistema de arquivos, com raiz opcional
#[derive(Debug, Clone, Default)]
pub struct FsSourceReader {
    pub base_path: Option<PathBuf>,
}

impl FsSourceReader {
    pub fn new(base_path: Option<PathBuf>) -> Self {
        Self { base_path }
    }

    /// Resolve um caminho relativo contra a raiz configurada
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.base_path {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl SourceReader for FsSourceReader {
    fn read(&self, path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.resolve(path))?)
    }
}

/// Fontes em memória, indexadas pelo caminho da AST
#[derive(Debug, Clone, Default)]
pub struct MemorySourceReader {
    sources: HashMap<String, String>,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(path.into(), content.into());
        self
    }
}

impl SourceReader for MemorySourceReader {
    fn read(&self, path: &str) -> Result<String> {
        self.sources
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("fonte {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_reader_resolves_against_base() {
        let reader = FsSourceReader::new(Some(PathBuf::from("/tmp/proj")));
        assert_eq!(reader.resolve("a/B.sol"), PathBuf::from("/tmp/proj/a/B.sol"));
        assert_eq!(FsSourceReader::default().resolve("x.sol"), PathBuf::from("x.sol"));
    }

    #[test]
    fn memory_reader_misses_are_not_found() {
        let reader = MemorySourceReader::new().with("A.sol", "contract A {}");
        assert_eq!(reader.read("A.sol").unwrap(), "contract A {}");
        assert!(reader.read("B.sol").unwrap_err().is_missing());
    }
}

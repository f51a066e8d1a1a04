//! Configuração dos parsers de artefatos

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capacidade padrão dos caches de índice e de fragmentos
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Configuração compartilhada pelos dois formatos de saída do compilador
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Raiz para os caminhos relativos (`absolutePath`) das fontes
    pub base_path: Option<PathBuf>,

    /// Capacidade de cada cache de memoização
    pub cache_capacity: usize,

    /// Usa `asm.sourceList` quando o compilador o emitiu (0.8.15+)
    pub prefer_asm_source_list: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            prefer_asm_source_list: true,
        }
    }
}

impl ParserConfig {
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

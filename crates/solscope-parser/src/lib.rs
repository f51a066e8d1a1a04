/*!
 * Solscope Parser
 *
 * Leitura das saídas combined-json e standard-json do compilador Solidity,
 * resolução de program counters para trechos de fonte e registro de versões
 */

pub mod artifact;
pub mod cache;
pub mod config;
pub mod resolver;
pub mod combined;
pub mod standard;
pub mod versions;

// Re-exportações públicas
pub use artifact::CompiledArtifact;
pub use cache::{CacheStats, MemoCache};
pub use combined::{CombinedContract, CombinedJsonParser};
pub use config::ParserConfig;
pub use resolver::{GeneratedSource, SourceFragment};
pub use standard::{
    compilation_errors, has_compilation_error, select_all_outputs, Diagnostic, StandardJsonParser,
};
pub use versions::{next_candidate, InstallableVersions, SolidityPragma, StaticVersions};

/*!
 * Solscope Types
 *
 * Tipos comuns usados em toda a workspace Solscope
 */

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intervalo de linhas (início, fim), 1-based e inclusivo
pub type LineRange = (usize, usize);

/// Faixa de bytes `start:length:fileIndex` como emitida pelo compilador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SrcRange {
    pub start: usize,
    pub length: usize,
    /// Índice do arquivo na lista de fontes; negativo indica código sem fonte
    pub file_index: i64,
}

impl SrcRange {
    pub fn new(start: usize, length: usize, file_index: i64) -> Self {
        Self { start, length, file_index }
    }

    /// Offset final (exclusivo) em bytes
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Índice do arquivo, se não for negativo
    pub fn file(&self) -> Option<usize> {
        usize::try_from(self.file_index).ok()
    }
}

impl FromStr for SrcRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let (start, length, file) = match parts.as_slice() {
            [start, length, file, ..] => (*start, *length, *file),
            _ => return Err(Error::schema("src", format!("esperado start:length:fileIndex em '{}'", s))),
        };

        let start = start
            .parse()
            .map_err(|_| Error::schema("src", format!("start inválido em '{}'", s)))?;
        let length = length
            .parse()
            .map_err(|_| Error::schema("src", format!("length inválido em '{}'", s)))?;
        let file_index = file
            .parse()
            .map_err(|_| Error::schema("src", format!("fileIndex inválido em '{}'", s)))?;
        Ok(Self { start, length, file_index })
    }
}

impl fmt::Display for SrcRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.length, self.file_index)
    }
}

/// Entrada decodificada de um source map, sempre totalmente resolvida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMapEntry {
    pub start: usize,
    pub length: usize,
    pub file_index: i64,
}

impl From<SourceMapEntry> for SrcRange {
    fn from(e: SourceMapEntry) -> Self {
        SrcRange::new(e.start, e.length, e.file_index)
    }
}

/// Dialeto do esquema da AST, por linha de release do compilador
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AstDialect {
    V4,
    V5,
    V6,
    V7,
    V8,
}

impl AstDialect {
    /// Seleciona o dialeto a partir da versão exata do compilador
    pub fn from_version(version: &str) -> Result<Self> {
        let cleaned = version.trim().trim_start_matches('v');
        let parsed = semver::Version::parse(cleaned)
            .map_err(|e| Error::InvalidVersion(format!("{}: {}", version, e)))?;
        if parsed.major != 0 {
            return Ok(AstDialect::V8);
        }
        Ok(match parsed.minor {
            0..=4 => AstDialect::V4,
            5 => AstDialect::V5,
            6 => AstDialect::V6,
            7 => AstDialect::V7,
            _ => AstDialect::V8,
        })
    }

    /// Dialetos anteriores a 0.8 usam `attributes`/`children` aninhados
    pub fn is_legacy(&self) -> bool {
        *self != AstDialect::V8
    }

    /// Chave que carrega o tipo do nó
    pub fn kind_key(&self) -> &'static str {
        if self.is_legacy() { "name" } else { "nodeType" }
    }

    /// Chave que carrega os filhos estruturais do nó
    pub fn children_key(&self) -> &'static str {
        if self.is_legacy() { "children" } else { "nodes" }
    }
}

impl fmt::Display for AstDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstDialect::V4 => write!(f, "v4"),
            AstDialect::V5 => write!(f, "v5"),
            AstDialect::V6 => write!(f, "v6"),
            AstDialect::V7 => write!(f, "v7"),
            AstDialect::V8 => write!(f, "v8"),
        }
    }
}

/// Tipo de contrato
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Contract => "contract",
            ContractKind::Interface => "interface",
            ContractKind::Library => "library",
        }
    }

    /// Interfaces e bibliotecas não são contratos implantáveis por si só
    pub fn is_interface_or_library(&self) -> bool {
        matches!(self, ContractKind::Interface | ContractKind::Library)
    }
}

impl FromStr for ContractKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contract" => Ok(ContractKind::Contract),
            "interface" => Ok(ContractKind::Interface),
            "library" => Ok(ContractKind::Library),
            other => Err(Error::schema("contractKind", format!("valor desconhecido '{}'", other))),
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de função
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Constructor,
    Fallback,
    Receive,
    Event,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Constructor => "constructor",
            FunctionKind::Fallback => "fallback",
            FunctionKind::Receive => "receive",
            FunctionKind::Event => "event",
        }
    }
}

impl FromStr for FunctionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "function" | "freeFunction" => Ok(FunctionKind::Function),
            "constructor" => Ok(FunctionKind::Constructor),
            "fallback" => Ok(FunctionKind::Fallback),
            "receive" => Ok(FunctionKind::Receive),
            "event" => Ok(FunctionKind::Event),
            other => Err(Error::schema("kind", format!("valor desconhecido '{}'", other))),
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibilidade declarada de um membro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Visibility {
    Default,
    Internal,
    Public,
    Private,
    External,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Default => "default",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::External => "external",
        }
    }

    /// Converte o texto do compilador; valores ausentes ou desconhecidos viram `Default`
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s {
            Some("internal") => Visibility::Internal,
            Some("public") => Visibility::Public,
            Some("private") => Visibility::Private,
            Some("external") => Visibility::External,
            _ => Visibility::Default,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Todas as visibilidades de campos
pub const FIELD_VISIBILITY_ALL: &[Visibility] = &[
    Visibility::Default,
    Visibility::Internal,
    Visibility::Public,
    Visibility::Private,
];

/// Visibilidades de campos herdáveis
pub const FIELD_VISIBILITY_NON_PRIVATE: &[Visibility] =
    &[Visibility::Default, Visibility::Internal, Visibility::Public];

/// Todas as visibilidades de funções
pub const FUNC_VISIBILITY_ALL: &[Visibility] = &[
    Visibility::External,
    Visibility::Private,
    Visibility::Internal,
    Visibility::Public,
];

/// Visibilidades de funções não privadas
pub const FUNC_VISIBILITY_NON_PRIVATE: &[Visibility] =
    &[Visibility::External, Visibility::Internal, Visibility::Public];

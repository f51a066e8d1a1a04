use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use solscope_core::{ContractKind, FunctionKind, LineRange, SrcRange, Visibility};

/// Variável de estado de um contrato
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRecord {
    pub name: String,
    pub visibility: Visibility,
    pub raw: String,
    pub src: SrcRange,
    pub lines: Option<LineRange>,
    /// Contrato de origem quando herdado; `None` se declarado localmente
    pub inherited_from: Option<String>,
}

/// Função, construtor, fallback ou receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub state_mutability: Option<String>,
    pub is_abstract: bool,
    /// `nome(tipo1, tipo2)`; vazio para construtores
    pub signature: String,
    /// `(tipo1, tipo2)`; vazio para construtores
    pub return_signature: String,
    pub modifiers: Vec<String>,
    pub raw: String,
    pub src: SrcRange,
    pub lines: Option<LineRange>,
    pub inherited_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub visibility: Visibility,
    pub anonymous: bool,
    pub signature: String,
    pub raw: String,
    pub src: SrcRange,
    pub lines: Option<LineRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifierRecord {
    pub name: String,
    pub visibility: Visibility,
    pub raw: String,
    pub src: SrcRange,
    pub lines: Option<LineRange>,
}

/// Contrato, interface ou biblioteca.
///
/// A identidade é o id atribuído pelo compilador; nomes podem se repetir
/// entre arquivos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractRecord {
    pub id: i64,
    pub name: String,
    pub kind: ContractKind,
    pub is_abstract: bool,
    /// Ids das bases, na ordem declarada
    pub base_contracts: Vec<i64>,
    /// Chave da unidade de compilação (caminho do arquivo)
    pub source_id: String,
    pub src: SrcRange,
    pub lines: Option<LineRange>,
    pub fields: Vec<FieldRecord>,
    pub functions: Vec<FunctionRecord>,
    pub modifiers: Vec<ModifierRecord>,
    pub events: Vec<EventRecord>,
}

impl FieldRecord {
    pub fn is_inherited(&self) -> bool {
        self.inherited_from.is_some()
    }
}

impl FunctionRecord {
    pub fn is_inherited(&self) -> bool {
        self.inherited_from.is_some()
    }
}

/// Modelo completo de uma compilação, imutável após a construção
#[derive(Debug, Clone, Default)]
pub struct ContractModel {
    pub(crate) contracts: BTreeMap<i64, ContractRecord>,
    /// `exportedSymbols` de todas as unidades: nome -> id
    pub(crate) exported_symbols: HashMap<String, i64>,
    /// Índice reverso: id -> nome exportado
    pub(crate) id_to_symbol: HashMap<i64, String>,
}

impl ContractModel {
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn exported_symbols(&self) -> &HashMap<String, i64> {
        &self.exported_symbols
    }

    /// Nome exportado de um id
    pub fn symbol_of(&self, id: i64) -> Option<&str> {
        self.id_to_symbol.get(&id).map(String::as_str)
    }
}

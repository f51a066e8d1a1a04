//! Adaptador de dialetos da AST do compilador.
//!
//! Há dois formatos de nó: o legado (até 0.7, `name`/`attributes`/`children`)
//! e o moderno (0.8+, `nodeType` com campos planos). Cada um tem seu próprio
//! desserializador; o restante da crate usa apenas [`NodeView`].

mod legacy;
mod modern;

pub use legacy::LegacyNode;
pub use modern::ModernNode;

use std::collections::BTreeMap;

use serde_json::Value;
use solscope_core::{AstDialect, Error, FunctionKind, Result, SrcRange};

use crate::literal::Literal;

/// Tipos de nó usados pelo construtor do modelo
pub mod kinds {
    pub const SOURCE_UNIT: &str = "SourceUnit";
    pub const PRAGMA_DIRECTIVE: &str = "PragmaDirective";
    pub const IMPORT_DIRECTIVE: &str = "ImportDirective";
    pub const CONTRACT_DEFINITION: &str = "ContractDefinition";
    pub const FUNCTION_DEFINITION: &str = "FunctionDefinition";
    pub const VARIABLE_DECLARATION: &str = "VariableDeclaration";
    pub const MODIFIER_DEFINITION: &str = "ModifierDefinition";
    pub const EVENT_DEFINITION: &str = "EventDefinition";
    pub const PARAMETER_LIST: &str = "ParameterList";
    pub const MODIFIER_INVOCATION: &str = "ModifierInvocation";
    pub const INHERITANCE_SPECIFIER: &str = "InheritanceSpecifier";
    pub const LITERAL: &str = "Literal";
}

/// Tipos dos parâmetros e retornos de uma função
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTypes {
    pub parameters: Vec<String>,
    pub returns: Vec<String>,
}

/// Vocabulário comum de acesso a nós, independente do dialeto
pub trait NodeView: Sized {
    /// `nodeType` (moderno) ou `name` (legado)
    fn kind(&self) -> &str;

    fn id(&self) -> Option<i64>;

    fn src(&self) -> Option<&str>;

    /// Filhos estruturais em ordem de declaração
    fn children(&self) -> &[Self];

    /// Campo do nó; no dialeto legado vem de `attributes`
    fn attr(&self, key: &str) -> Option<&Value>;

    /// Tipos de parâmetros e retornos de uma `FunctionDefinition`.
    ///
    /// Falha com `Error::Schema` quando uma das listas não é encontrada.
    fn parameter_types(&self) -> Result<ParameterTypes>;

    /// Tipos dos parâmetros de uma `EventDefinition`
    fn event_parameter_types(&self) -> Result<Vec<String>>;

    /// Nomes dos modificadores aplicados a uma função
    fn modifier_names(&self) -> Vec<String>;

    /// Ids das bases declaradas explicitamente, `None` se o nó não as lista
    fn explicit_base_ids(&self) -> Option<Vec<i64>>;

    /// Abstração do contrato conforme o dialeto
    fn contract_is_abstract(&self) -> Option<bool>;

    /// Literal descrito por este nó, se for um `Literal`
    fn as_literal(&self) -> Option<Literal>;

    /// Visita todos os literais da subárvore
    fn visit_literals(&self, visit: &mut dyn FnMut(Literal));

    fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attr(key).and_then(Value::as_bool)
    }

    /// Nome declarado, ignorando strings vazias
    fn name(&self) -> Option<&str> {
        self.attr_str("name").filter(|n| !n.is_empty())
    }

    fn is(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    fn src_range(&self) -> Result<SrcRange> {
        self.src()
            .ok_or_else(|| Error::schema(self.kind(), "nó sem campo src"))?
            .parse()
    }

    /// Ids das dependências (`contractDependencies`)
    fn dependency_ids(&self) -> Vec<i64> {
        self.attr("contractDependencies")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    /// Bases explícitas, senão as dependências
    fn base_contract_ids(&self) -> Vec<i64> {
        self.explicit_base_ids().unwrap_or_else(|| self.dependency_ids())
    }

    /// Tipo da função, normalizando construtores do 0.4 (`isConstructor`)
    fn function_kind(&self) -> Result<FunctionKind> {
        if let Some(kind) = self.attr_str("kind") {
            return kind.parse();
        }
        if self.attr_bool("isConstructor").unwrap_or(false) {
            return Ok(FunctionKind::Constructor);
        }
        Ok(match self.name() {
            Some(_) => FunctionKind::Function,
            None => FunctionKind::Fallback,
        })
    }

    /// Nome da função; anônimas recebem o nome do seu tipo
    fn function_name(&self) -> Result<String> {
        match self.name() {
            Some(name) => Ok(name.to_string()),
            None => Ok(self.function_kind()?.as_str().to_string()),
        }
    }

    /// `stateMutability`, derivado de `payable`/`constant` no 0.4
    fn state_mutability(&self) -> Option<String> {
        if let Some(m) = self.attr_str("stateMutability") {
            return Some(m.to_string());
        }
        if self.attr_bool("payable") == Some(true) {
            return Some("payable".to_string());
        }
        match self.attr_bool("constant") {
            Some(true) => Some("view".to_string()),
            Some(false) => Some("nonpayable".to_string()),
            None => None,
        }
    }

    /// `exportedSymbols` do SourceUnit: nome -> id
    fn exported_symbols(&self) -> BTreeMap<String, i64> {
        let mut out = BTreeMap::new();
        if let Some(symbols) = self.attr("exportedSymbols").and_then(Value::as_object) {
            for (name, ids) in symbols {
                if let Some(id) = ids.as_array().and_then(|a| a.first()).and_then(Value::as_i64) {
                    out.insert(name.clone(), id);
                }
            }
        }
        out
    }
}

/// AST de uma unidade de compilação, em um dos dois dialetos
#[derive(Debug, Clone)]
pub enum SourceUnitAst {
    Legacy(LegacyNode),
    Modern(ModernNode),
}

impl SourceUnitAst {
    /// Desserializa a raiz conforme o dialeto e valida que é um `SourceUnit`
    pub fn from_value(value: Value, dialect: AstDialect) -> Result<Self> {
        let unit = if dialect.is_legacy() {
            let root: LegacyNode = serde_json::from_value(value)?;
            if !root.is(kinds::SOURCE_UNIT) || !root.has_children() {
                return Err(Error::InvalidRoot(root.kind().to_string()));
            }
            SourceUnitAst::Legacy(root)
        } else {
            let root: ModernNode = serde_json::from_value(value)?;
            if !root.is(kinds::SOURCE_UNIT) {
                return Err(Error::InvalidRoot(root.kind().to_string()));
            }
            SourceUnitAst::Modern(root)
        };
        Ok(unit)
    }

    pub fn dialect_is_legacy(&self) -> bool {
        matches!(self, SourceUnitAst::Legacy(_))
    }

    pub fn absolute_path(&self) -> Option<&str> {
        match self {
            SourceUnitAst::Legacy(n) => n.attr_str("absolutePath"),
            SourceUnitAst::Modern(n) => n.attr_str("absolutePath"),
        }
    }

    /// Índice de arquivo do `src` da raiz
    pub fn file_index(&self) -> Option<i64> {
        let src = match self {
            SourceUnitAst::Legacy(n) => n.src_range(),
            SourceUnitAst::Modern(n) => n.src_range(),
        };
        src.ok().map(|s| s.file_index)
    }

    pub fn exported_symbols(&self) -> BTreeMap<String, i64> {
        match self {
            SourceUnitAst::Legacy(n) => n.exported_symbols(),
            SourceUnitAst::Modern(n) => n.exported_symbols(),
        }
    }

    /// Literais do contrato `name` declarado nesta unidade
    pub fn contract_literals(&self, name: &str) -> Option<Vec<Literal>> {
        fn collect<N: NodeView>(root: &N, name: &str) -> Option<Vec<Literal>> {
            let contract = root
                .children()
                .iter()
                .find(|n| n.is(kinds::CONTRACT_DEFINITION) && n.name() == Some(name))?;
            let mut out = Vec::new();
            contract.visit_literals(&mut |lit| out.push(lit));
            Some(out)
        }

        match self {
            SourceUnitAst::Legacy(n) => collect(n, name),
            SourceUnitAst::Modern(n) => collect(n, name),
        }
    }
}

/// Tipo declarado de um parâmetro
pub(crate) fn type_string<'a>(param: &'a Value, path: &[&str], owner: &str) -> Result<&'a str> {
    let mut cur = param;
    for key in path {
        cur = cur
            .get(key)
            .ok_or_else(|| Error::schema(owner, format!("parâmetro sem '{}'", path.join("."))))?;
    }
    cur.as_str()
        .ok_or_else(|| Error::schema(owner, format!("'{}' não é string", path.join("."))))
}

//! Contract Model Builder.

use std::collections::{BTreeMap, HashSet, VecDeque};

use solscope_core::{ContractKind, Error, FunctionKind, LineRange, Result, SrcRange, Visibility};
use tracing::{debug, warn};

use crate::locator::SourceLocator;
use crate::model::{
    ContractModel, ContractRecord, EventRecord, FieldRecord, FunctionRecord, ModifierRecord,
};
use crate::node::{kinds, NodeView, SourceUnitAst};

/// Unidade de compilação identificada pelo caminho do arquivo
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub key: String,
    pub ast: SourceUnitAst,
}

impl SourceUnit {
    pub fn new(key: impl Into<String>, ast: SourceUnitAst) -> Self {
        Self { key: key.into(), ast }
    }
}

/// `nome(tipo1, tipo2)`; construtores não têm assinatura
pub fn signature(name: &str, types: &[String], kind: FunctionKind) -> String {
    if kind == FunctionKind::Constructor {
        return String::new();
    }
    format!("{}({})", name, types.join(", "))
}

/// Constrói os registros de contratos a partir das unidades de compilação
pub struct ModelBuilder<'a> {
    locator: &'a SourceLocator,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(locator: &'a SourceLocator) -> Self {
        Self { locator }
    }

    /// Constrói o modelo e resolve a herança.
    ///
    /// Unidades repetidas (mesma chave) são processadas uma única vez.
    pub fn build(&self, units: &[SourceUnit]) -> Result<ContractModel> {
        let mut model = ContractModel::default();
        let mut seen = HashSet::new();

        for unit in units {
            if !seen.insert(unit.key.as_str()) {
                continue;
            }
            model.exported_symbols.extend(unit.ast.exported_symbols());
            match &unit.ast {
                SourceUnitAst::Legacy(root) => self.build_unit(root, &unit.key, &mut model.contracts)?,
                SourceUnitAst::Modern(root) => self.build_unit(root, &unit.key, &mut model.contracts)?,
            }
        }

        model.id_to_symbol = model
            .exported_symbols
            .iter()
            .map(|(name, id)| (*id, name.clone()))
            .collect();

        resolve_inheritance(&mut model.contracts);
        Ok(model)
    }

    fn build_unit<N: NodeView>(
        &self,
        root: &N,
        key: &str,
        out: &mut BTreeMap<i64, ContractRecord>,
    ) -> Result<()> {
        for node in root.children() {
            if node.is(kinds::CONTRACT_DEFINITION) {
                let contract = self.contract(node, key)?;
                debug!(
                    contract = %contract.name,
                    id = contract.id,
                    functions = contract.functions.len(),
                    fields = contract.fields.len(),
                    "contrato construído"
                );
                out.insert(contract.id, contract);
            }
        }
        Ok(())
    }

    /// Faixa, linhas e texto bruto de um nó
    fn anchor<N: NodeView>(&self, node: &N) -> Result<(SrcRange, Option<LineRange>, String)> {
        let src = node.src_range()?;
        match self.locator.locate(src) {
            Some(located) => Ok((src, Some(located.lines), located.text)),
            None => {
                debug!(kind = node.kind(), src = %src, "fonte indisponível para o nó");
                Ok((src, None, String::new()))
            }
        }
    }

    pub fn contract<N: NodeView>(&self, node: &N, source_id: &str) -> Result<ContractRecord> {
        let id = node
            .id()
            .filter(|id| *id >= 0)
            .ok_or_else(|| Error::schema(node.kind(), "contrato sem id"))?;
        let name = node
            .name()
            .ok_or_else(|| Error::schema(node.kind(), "contrato sem nome"))?
            .to_string();
        let is_abstract = node
            .contract_is_abstract()
            .ok_or_else(|| Error::schema(node.kind(), format!("abstração indefinida em {}", name)))?;
        let kind = match node.attr_str("contractKind") {
            Some(k) => k.parse()?,
            None => ContractKind::Contract,
        };
        let (src, lines, _) = self.anchor(node)?;

        let mut contract = ContractRecord {
            id,
            name,
            kind,
            is_abstract,
            base_contracts: node.base_contract_ids(),
            source_id: source_id.to_string(),
            src,
            lines,
            fields: Vec::new(),
            functions: Vec::new(),
            modifiers: Vec::new(),
            events: Vec::new(),
        };

        for member in node.children() {
            match member.kind() {
                kinds::FUNCTION_DEFINITION => contract.functions.push(self.function(member)?),
                kinds::VARIABLE_DECLARATION => contract.fields.push(self.field(member)?),
                kinds::MODIFIER_DEFINITION => contract.modifiers.push(self.modifier(member)?),
                kinds::EVENT_DEFINITION => contract.events.push(self.event(member)?),
                _ => {}
            }
        }
        Ok(contract)
    }

    pub fn function<N: NodeView>(&self, node: &N) -> Result<FunctionRecord> {
        let types = node.parameter_types()?;
        let kind = node.function_kind()?;
        let name = node.function_name()?;
        let (src, lines, raw) = self.anchor(node)?;

        Ok(FunctionRecord {
            signature: signature(&name, &types.parameters, kind),
            return_signature: signature("", &types.returns, kind),
            name,
            kind,
            visibility: Visibility::parse_lenient(node.attr_str("visibility")),
            state_mutability: node.state_mutability(),
            is_abstract: !node.attr_bool("implemented").unwrap_or(false),
            modifiers: node.modifier_names(),
            raw,
            src,
            lines,
            inherited_from: None,
        })
    }

    pub fn field<N: NodeView>(&self, node: &N) -> Result<FieldRecord> {
        let (src, lines, raw) = self.anchor(node)?;
        Ok(FieldRecord {
            name: node.name().unwrap_or_default().to_string(),
            visibility: Visibility::parse_lenient(node.attr_str("visibility")),
            raw,
            src,
            lines,
            inherited_from: None,
        })
    }

    pub fn event<N: NodeView>(&self, node: &N) -> Result<EventRecord> {
        let name = node
            .name()
            .ok_or_else(|| Error::schema(node.kind(), "evento sem nome"))?
            .to_string();
        let types = node.event_parameter_types()?;
        let (src, lines, raw) = self.anchor(node)?;
        Ok(EventRecord {
            signature: signature(&name, &types, FunctionKind::Event),
            name,
            visibility: Visibility::parse_lenient(node.attr_str("visibility")),
            anonymous: node.attr_bool("anonymous").unwrap_or(false),
            raw,
            src,
            lines,
        })
    }

    pub fn modifier<N: NodeView>(&self, node: &N) -> Result<ModifierRecord> {
        let (src, lines, raw) = self.anchor(node)?;
        Ok(ModifierRecord {
            name: node.name().unwrap_or_default().to_string(),
            visibility: Visibility::parse_lenient(node.attr_str("visibility")),
            raw,
            src,
            lines,
        })
    }
}

/// Ancestrais de `id` em largura (bases diretas primeiro), sem repetição
fn ancestors_of(id: i64, contracts: &BTreeMap<i64, ContractRecord>) -> Vec<i64> {
    let mut order = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut queue: VecDeque<i64> = contracts
        .get(&id)
        .map(|c| c.base_contracts.iter().copied().collect())
        .unwrap_or_default();

    while let Some(base) = queue.pop_front() {
        if !seen.insert(base) {
            continue;
        }
        match contracts.get(&base) {
            Some(record) => {
                order.push(base);
                queue.extend(record.base_contracts.iter().copied());
            }
            None => warn!(contract = id, base, "base não encontrada na compilação"),
        }
    }
    order
}

/// Copia para cada contrato os campos e funções declarados localmente por
/// todos os seus ancestrais, marcando `inherited_from`.
///
/// As cópias são calculadas a partir dos membros locais, então o resultado
/// não depende da ordem de processamento.
pub fn resolve_inheritance(contracts: &mut BTreeMap<i64, ContractRecord>) {
    let mut inherited = Vec::with_capacity(contracts.len());

    for id in contracts.keys().copied() {
        let mut fields = Vec::new();
        let mut functions = Vec::new();
        for ancestor in ancestors_of(id, contracts) {
            let Some(base) = contracts.get(&ancestor) else {
                continue;
            };
            fields.extend(base.fields.iter().filter(|f| !f.is_inherited()).map(|f| FieldRecord {
                inherited_from: Some(base.name.clone()),
                ..f.clone()
            }));
            functions.extend(base.functions.iter().filter(|f| !f.is_inherited()).map(|f| {
                FunctionRecord { inherited_from: Some(base.name.clone()), ..f.clone() }
            }));
        }
        inherited.push((id, fields, functions));
    }

    for (id, fields, functions) in inherited {
        if let Some(contract) = contracts.get_mut(&id) {
            contract.fields.extend(fields);
            contract.functions.extend(functions);
        }
    }
}

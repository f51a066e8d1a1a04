//! Consultas sobre o [`ContractModel`].
//!
//! Buscas por um item nomeado retornam `Err` quando nada é encontrado;
//! consultas em lote retornam coleções possivelmente vazias.

use std::collections::BTreeSet;

use solscope_core::{
    ContractKind, Error, Result, Visibility, FIELD_VISIBILITY_ALL, FIELD_VISIBILITY_NON_PRIVATE,
    FUNC_VISIBILITY_ALL,
};

use crate::model::{ContractModel, ContractRecord, EventRecord, FieldRecord, FunctionRecord};

/// Filtro de campos
#[derive(Debug, Clone, Copy)]
pub struct FieldQuery<'a> {
    /// Visibilidades aceitas; `None` aceita todas
    pub field_visibility: Option<&'a [Visibility]>,
    /// Visibilidades aceitas para campos herdados
    pub parent_field_visibility: &'a [Visibility],
    /// Inclui campos herdados das bases
    pub with_base_fields: bool,
}

impl Default for FieldQuery<'_> {
    fn default() -> Self {
        Self {
            field_visibility: None,
            parent_field_visibility: FIELD_VISIBILITY_NON_PRIVATE,
            with_base_fields: false,
        }
    }
}

impl<'a> FieldQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(mut self, visibility: &'a [Visibility]) -> Self {
        self.field_visibility = Some(visibility);
        self
    }

    pub fn parent_visibility(mut self, visibility: &'a [Visibility]) -> Self {
        self.parent_field_visibility = visibility;
        self
    }

    pub fn with_base_fields(mut self, include: bool) -> Self {
        self.with_base_fields = include;
        self
    }

    fn accepts(&self, field: &FieldRecord) -> bool {
        if let Some(allowed) = self.field_visibility {
            if !same_set(allowed, FIELD_VISIBILITY_ALL) && !allowed.contains(&field.visibility) {
                return false;
            }
        }
        match &field.inherited_from {
            None => true,
            Some(_) => {
                self.with_base_fields && self.parent_field_visibility.contains(&field.visibility)
            }
        }
    }
}

/// Filtro de funções
#[derive(Debug, Clone, Copy)]
pub struct FunctionQuery<'a> {
    pub function_visibility: Option<&'a [Visibility]>,
    /// Inclui funções herdadas (padrão: sim)
    pub check_base_contract: bool,
}

impl Default for FunctionQuery<'_> {
    fn default() -> Self {
        Self { function_visibility: None, check_base_contract: true }
    }
}

impl<'a> FunctionQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(mut self, visibility: &'a [Visibility]) -> Self {
        self.function_visibility = Some(visibility);
        self
    }

    pub fn check_base_contract(mut self, include: bool) -> Self {
        self.check_base_contract = include;
        self
    }

    fn accepts(&self, function: &FunctionRecord) -> bool {
        if !self.check_base_contract && function.is_inherited() {
            return false;
        }
        match self.function_visibility {
            Some(allowed) if !same_set(allowed, FUNC_VISIBILITY_ALL) => {
                allowed.contains(&function.visibility)
            }
            _ => true,
        }
    }
}

fn same_set(a: &[Visibility], b: &[Visibility]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

impl ContractModel {
    pub fn all_contracts(&self) -> Vec<&ContractRecord> {
        self.contracts.values().collect()
    }

    /// Nomes exportados de todos os contratos
    pub fn all_contract_names(&self) -> Vec<String> {
        self.contracts
            .values()
            .map(|c| self.symbol_of(c.id).unwrap_or(c.name.as_str()).to_string())
            .collect()
    }

    pub fn contract_by_id(&self, id: i64) -> Option<&ContractRecord> {
        self.contracts.get(&id)
    }

    pub fn contract_by_name(&self, name: &str) -> Result<&ContractRecord> {
        self.exported_symbols
            .get(name)
            .and_then(|id| self.contracts.get(id))
            .or_else(|| self.contracts.values().find(|c| c.name == name))
            .ok_or_else(|| Error::MissingContract(name.to_string()))
    }

    pub fn all_abstract_contracts(&self) -> Vec<&ContractRecord> {
        self.contracts.values().filter(|c| c.is_abstract).collect()
    }

    pub fn all_abstract_contract_names(&self) -> Vec<String> {
        self.all_abstract_contracts().into_iter().map(|c| c.name.clone()).collect()
    }

    pub fn all_libraries(&self) -> Vec<&ContractRecord> {
        self.contracts.values().filter(|c| c.kind == ContractKind::Library).collect()
    }

    pub fn all_library_names(&self) -> Vec<String> {
        self.all_libraries().into_iter().map(|c| c.name.clone()).collect()
    }

    /// Nomes de todos os contratos que aparecem como base de outro
    pub fn base_contract_names(&self) -> BTreeSet<String> {
        self.contracts
            .values()
            .flat_map(|c| c.base_contracts.iter())
            .filter_map(|id| {
                self.symbol_of(*id)
                    .map(str::to_string)
                    .or_else(|| self.contracts.get(id).map(|c| c.name.clone()))
            })
            .collect()
    }

    /// Contratos concretos que não são base de nenhum outro
    pub fn pruned_contracts(&self) -> Vec<&ContractRecord> {
        let bases = self.base_contract_names();
        self.contracts
            .values()
            .filter(|c| {
                !bases.contains(&c.name) && !c.kind.is_interface_or_library() && !c.is_abstract
            })
            .collect()
    }

    pub fn pruned_contract_names(&self) -> Vec<String> {
        self.pruned_contracts().into_iter().map(|c| c.name.clone()).collect()
    }

    pub fn fields_in_contract<'m>(
        &self,
        contract: &'m ContractRecord,
        query: &FieldQuery<'_>,
    ) -> Vec<&'m FieldRecord> {
        contract.fields.iter().filter(|f| query.accepts(f)).collect()
    }

    pub fn fields_in_contract_by_name(&self, name: &str, query: &FieldQuery<'_>) -> Result<Vec<&FieldRecord>> {
        let contract = self.contract_by_name(name)?;
        Ok(self.fields_in_contract(contract, query))
    }

    pub fn field_names_in_contract_by_name(&self, name: &str, query: &FieldQuery<'_>) -> Result<Vec<String>> {
        Ok(self
            .fields_in_contract_by_name(name, query)?
            .into_iter()
            .map(|f| f.name.clone())
            .collect())
    }

    pub fn functions_in_contract<'m>(
        &self,
        contract: &'m ContractRecord,
        query: &FunctionQuery<'_>,
    ) -> Vec<&'m FunctionRecord> {
        contract.functions.iter().filter(|f| query.accepts(f)).collect()
    }

    pub fn functions_in_contract_by_name(
        &self,
        name: &str,
        query: &FunctionQuery<'_>,
    ) -> Result<Vec<&FunctionRecord>> {
        let contract = self.contract_by_name(name)?;
        Ok(self.functions_in_contract(contract, query))
    }

    pub fn function_names_in_contract_by_name(
        &self,
        name: &str,
        query: &FunctionQuery<'_>,
    ) -> Result<Vec<String>> {
        Ok(self
            .functions_in_contract_by_name(name, query)?
            .into_iter()
            .map(|f| f.name.clone())
            .collect())
    }

    pub fn abstract_functions_in_contract_by_name(&self, name: &str) -> Result<Vec<&FunctionRecord>> {
        Ok(self
            .functions_in_contract_by_name(name, &FunctionQuery::default())?
            .into_iter()
            .filter(|f| f.is_abstract)
            .collect())
    }

    pub fn function_by_name(&self, contract: &str, function: &str) -> Result<&FunctionRecord> {
        self.functions_in_contract_by_name(contract, &FunctionQuery::default())?
            .into_iter()
            .find(|f| f.name == function)
            .ok_or_else(|| Error::MissingFunction {
                contract: contract.to_string(),
                function: function.to_string(),
            })
    }

    pub fn events_in_contract<'m>(&self, contract: &'m ContractRecord) -> &'m [EventRecord] {
        &contract.events
    }

    pub fn events_in_contract_by_name(&self, name: &str) -> Result<&[EventRecord]> {
        Ok(&self.contract_by_name(name)?.events)
    }

    pub fn event_by_name(&self, contract: &str, event: &str) -> Result<&EventRecord> {
        self.events_in_contract_by_name(contract)?
            .iter()
            .find(|e| e.name == event)
            .ok_or_else(|| Error::MissingEvent {
                contract: contract.to_string(),
                event: event.to_string(),
            })
    }
}

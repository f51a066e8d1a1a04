use serde::Deserialize;
use serde_json::{Map, Value};
use solscope_core::{Error, Result};

use super::{kinds, NodeView, ParameterTypes};
use crate::literal::Literal;

/// Nó da AST legada (0.4 a 0.7)
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyNode {
    #[serde(rename = "name")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub children: Option<Vec<LegacyNode>>,
}

impl LegacyNode {
    pub(crate) fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// Tipos declarados dos filhos de uma `ParameterList`
    fn list_types(list: &LegacyNode, owner: &str) -> Result<Vec<String>> {
        list.children()
            .iter()
            .map(|param| {
                param
                    .attr_str("type")
                    .map(str::to_string)
                    .ok_or_else(|| Error::schema(owner, "parâmetro sem attributes.type"))
            })
            .collect()
    }

    fn first_parameter_list(&self) -> Option<usize> {
        self.children().iter().position(|c| c.is(kinds::PARAMETER_LIST))
    }
}

impl NodeView for LegacyNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn children(&self) -> &[Self] {
        self.children.as_deref().unwrap_or(&[])
    }

    fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.as_ref()?.get(key).filter(|v| !v.is_null())
    }

    fn parameter_types(&self) -> Result<ParameterTypes> {
        // [ParameterList, ParameterList (retornos), ModifierInvocation..., Block]
        let pos = self
            .first_parameter_list()
            .ok_or_else(|| Error::schema(self.kind(), "lista de parâmetros ausente"))?;
        let returns = self
            .children()
            .get(pos + 1)
            .filter(|c| c.is(kinds::PARAMETER_LIST))
            .ok_or_else(|| Error::schema(self.kind(), "lista de retornos ausente"))?;

        Ok(ParameterTypes {
            parameters: Self::list_types(&self.children()[pos], self.kind())?,
            returns: Self::list_types(returns, self.kind())?,
        })
    }

    fn event_parameter_types(&self) -> Result<Vec<String>> {
        let pos = self
            .first_parameter_list()
            .ok_or_else(|| Error::schema(self.kind(), "lista de parâmetros ausente"))?;
        Self::list_types(&self.children()[pos], self.kind())
    }

    fn modifier_names(&self) -> Vec<String> {
        self.children()
            .iter()
            .filter(|c| c.is(kinds::MODIFIER_INVOCATION))
            .filter_map(|inv| {
                let target = inv.children().first()?;
                // chamadas a construtores de base têm tipo `type(contract X)`
                if !target.attr_str("type")?.starts_with("modifier") {
                    return None;
                }
                target.attr_str("value").map(str::to_string)
            })
            .collect()
    }

    fn explicit_base_ids(&self) -> Option<Vec<i64>> {
        let specs: Vec<&LegacyNode> = self
            .children()
            .iter()
            .filter(|c| c.is(kinds::INHERITANCE_SPECIFIER))
            .collect();
        if specs.is_empty() {
            return None;
        }
        Some(
            specs
                .iter()
                .filter_map(|s| s.children().first()?.attr("referencedDeclaration")?.as_i64())
                .collect(),
        )
    }

    fn contract_is_abstract(&self) -> Option<bool> {
        self.attr_bool("fullyImplemented").map(|full| !full)
    }

    fn as_literal(&self) -> Option<Literal> {
        if !self.is(kinds::LITERAL) {
            return None;
        }
        let attrs = self.attributes.as_ref()?;
        let text = |key: &str| attrs.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Literal {
            token_type: text("token"),
            sub_type: text("type"),
            value: text("value"),
            hex_value: text("hexvalue"),
        })
    }

    fn visit_literals(&self, visit: &mut dyn FnMut(Literal)) {
        if let Some(lit) = self.as_literal() {
            visit(lit);
            return;
        }
        for child in self.children() {
            child.visit_literals(visit);
        }
    }
}

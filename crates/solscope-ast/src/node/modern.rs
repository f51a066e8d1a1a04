use serde::Deserialize;
use serde_json::{Map, Value};
use solscope_core::{Error, Result};

use super::{kinds, type_string, NodeView, ParameterTypes};
use crate::literal::Literal;

/// Nó da AST moderna (0.8+ e standard-json).
///
/// Só `nodes` é tipado; os demais campos aninhados (`parameters`, `body`,
/// expressões) ficam em `fields` e são lidos sob demanda.
#[derive(Debug, Clone, Deserialize)]
pub struct ModernNode {
    #[serde(rename = "nodeType")]
    pub node_type: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub nodes: Vec<ModernNode>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

const TYPE_STRING: [&str; 2] = ["typeDescriptions", "typeString"];

impl ModernNode {
    fn list_types(&self, key: &str) -> Result<Vec<String>> {
        let params = self
            .fields
            .get(key)
            .and_then(|list| list.get("parameters"))
            .and_then(Value::as_array)
            .ok_or_else(|| Error::schema(&self.node_type, format!("'{}' ausente", key)))?;
        params
            .iter()
            .map(|p| type_string(p, &TYPE_STRING, &self.node_type).map(str::to_string))
            .collect()
    }
}

fn literal_from_map(node: &Map<String, Value>) -> Option<Literal> {
    let text = |key: &str| node.get(key).and_then(Value::as_str).map(str::to_string);
    let sub_type = node
        .get("typeDescriptions")?
        .get("typeString")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Literal {
        token_type: text("kind"),
        sub_type,
        value: text("value"),
        hex_value: text("hexValue"),
    })
}

/// Percorre valores arbitrários procurando nós `Literal`
fn walk_values(value: &Value, visit: &mut dyn FnMut(Literal)) {
    match value {
        Value::Object(map) => {
            if map.get("nodeType").and_then(Value::as_str) == Some(kinds::LITERAL) {
                if let Some(lit) = literal_from_map(map) {
                    visit(lit);
                }
                return;
            }
            for v in map.values() {
                walk_values(v, visit);
            }
        }
        Value::Array(items) => {
            for v in items {
                walk_values(v, visit);
            }
        }
        _ => {}
    }
}

impl NodeView for ModernNode {
    fn kind(&self) -> &str {
        &self.node_type
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.nodes
    }

    fn attr(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn parameter_types(&self) -> Result<ParameterTypes> {
        Ok(ParameterTypes {
            parameters: self.list_types("parameters")?,
            returns: self.list_types("returnParameters")?,
        })
    }

    fn event_parameter_types(&self) -> Result<Vec<String>> {
        self.list_types("parameters")
    }

    fn modifier_names(&self) -> Vec<String> {
        self.attr("modifiers")
            .and_then(Value::as_array)
            .map(|mods| {
                mods.iter()
                    .filter_map(|m| m.get("modifierName")?.get("name")?.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn explicit_base_ids(&self) -> Option<Vec<i64>> {
        let bases = self.attr("baseContracts")?.as_array()?;
        Some(
            bases
                .iter()
                .filter(|b| !b.is_null())
                .filter_map(|b| b.get("baseName")?.get("referencedDeclaration")?.as_i64())
                .collect(),
        )
    }

    fn contract_is_abstract(&self) -> Option<bool> {
        self.attr_bool("abstract")
            .or_else(|| self.attr_bool("fullyImplemented").map(|full| !full))
    }

    fn as_literal(&self) -> Option<Literal> {
        if !self.is(kinds::LITERAL) {
            return None;
        }
        literal_from_map(&self.fields)
    }

    fn visit_literals(&self, visit: &mut dyn FnMut(Literal)) {
        if let Some(lit) = self.as_literal() {
            visit(lit);
            return;
        }
        for v in self.fields.values() {
            walk_values(v, visit);
        }
        for child in &self.nodes {
            child.visit_literals(visit);
        }
    }
}

use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

use ethereum_types::U256;
use serde::Serialize;
use solscope_core::utils::{decimal_to_u256, hex_to_u256};

use crate::node::NodeView;

/// Literal constante encontrado na AST
#[derive(Debug, Clone, Serialize)]
pub struct Literal {
    /// `number`, `string`, `bool`, `hexString`...
    pub token_type: Option<String>,
    /// Tipo declarado pelo compilador, ex. `int_const 42`
    pub sub_type: Option<String>,
    pub value: Option<String>,
    pub hex_value: Option<String>,
}

// Identidade por (value, sub_type)
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.sub_type == other.sub_type
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.sub_type.hash(state);
    }
}

/// Categoria de um literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralClass {
    Number,
    String,
    Address,
    Boolean,
    Other,
}

impl Literal {
    pub fn classify(&self) -> LiteralClass {
        match self.sub_type.as_deref() {
            None if self.token_type.as_deref() == Some("number") => LiteralClass::Number,
            None => LiteralClass::Other,
            Some(t) if t.starts_with("address") => LiteralClass::Address,
            Some(t) if t.starts_with("int") => LiteralClass::Number,
            Some(t) if t.starts_with("literal_string") => LiteralClass::String,
            Some(t) if t.starts_with("bool") => LiteralClass::Boolean,
            Some(_) => LiteralClass::Other,
        }
    }

    /// Valor numérico: hexadecimal se prefixado com `0x`, senão o valor do
    /// `int_const`, senão o texto decimal.
    pub fn numeric_value(&self) -> Option<U256> {
        let raw = self.value.as_deref()?;
        if raw.starts_with("0x") || raw.starts_with("0X") {
            return hex_to_u256(raw);
        }
        let from_type = self
            .sub_type
            .as_deref()
            .and_then(|t| t.split_whitespace().nth(1))
            .and_then(decimal_to_u256);
        from_type.or_else(|| decimal_to_u256(raw))
    }
}

/// Literais agrupados por categoria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiteralSet {
    pub number: HashSet<Literal>,
    pub string: HashSet<Literal>,
    pub address: HashSet<Literal>,
    pub other: HashSet<Literal>,
}

/// Somente os valores, agrupados por categoria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiteralValues {
    pub number: BTreeSet<U256>,
    pub string: BTreeSet<String>,
    pub address: BTreeSet<String>,
    pub other: BTreeSet<String>,
}

impl LiteralSet {
    pub fn from_literals<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        let mut set = LiteralSet::default();
        for lit in literals {
            match lit.classify() {
                LiteralClass::Number => set.number.insert(lit),
                LiteralClass::String => set.string.insert(lit),
                LiteralClass::Address => set.address.insert(lit),
                LiteralClass::Boolean => continue,
                LiteralClass::Other => set.other.insert(lit),
            };
        }
        set
    }

    /// Coleta os literais da subárvore de `node`
    pub fn collect<N: NodeView>(node: &N) -> Self {
        let mut found = Vec::new();
        node.visit_literals(&mut |lit| found.push(lit));
        Self::from_literals(found)
    }

    pub fn is_empty(&self) -> bool {
        self.number.is_empty() && self.string.is_empty() && self.address.is_empty() && self.other.is_empty()
    }
}

impl LiteralValues {
    pub fn from_literals<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        let mut values = LiteralValues::default();
        for lit in literals {
            let class = lit.classify();
            if class == LiteralClass::Boolean {
                continue;
            }
            let Some(raw) = lit.value.clone() else {
                continue;
            };
            match class {
                // números que não convertem caem em `other`
                LiteralClass::Number => match lit.numeric_value() {
                    Some(n) => {
                        values.number.insert(n);
                    }
                    None => {
                        values.other.insert(raw);
                    }
                },
                LiteralClass::String => {
                    values.string.insert(raw);
                }
                LiteralClass::Address => {
                    values.address.insert(raw);
                }
                LiteralClass::Boolean | LiteralClass::Other => {
                    values.other.insert(raw);
                }
            }
        }
        values
    }
}

impl From<&LiteralSet> for LiteralValues {
    fn from(set: &LiteralSet) -> Self {
        let all = set
            .number
            .iter()
            .chain(&set.string)
            .chain(&set.address)
            .chain(&set.other)
            .cloned();
        LiteralValues::from_literals(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(token: &str, sub: Option<&str>, value: &str) -> Literal {
        Literal {
            token_type: Some(token.into()),
            sub_type: sub.map(Into::into),
            value: Some(value.into()),
            hex_value: None,
        }
    }

    #[test]
    fn identity_ignores_token_and_hex() {
        let mut a = lit("number", Some("int_const 1"), "1");
        let b = lit("hexString", Some("int_const 1"), "1");
        a.hex_value = Some("31".into());
        assert_eq!(a, b);

        let set = LiteralSet::from_literals(vec![a, b]);
        assert_eq!(set.number.len(), 1);
    }

    #[test]
    fn classification() {
        assert_eq!(lit("number", None, "5").classify(), LiteralClass::Number);
        assert_eq!(lit("bool", Some("bool"), "true").classify(), LiteralClass::Boolean);
        assert_eq!(lit("number", Some("address"), "0x00").classify(), LiteralClass::Address);
        assert_eq!(lit("string", Some("literal_string \"a\""), "a").classify(), LiteralClass::String);
        assert_eq!(lit("number", Some("rational_const 1 / 2"), "0.5").classify(), LiteralClass::Other);
        assert_eq!(lit("string", None, "a").classify(), LiteralClass::Other);
    }

    #[test]
    fn numeric_values() {
        assert_eq!(lit("number", Some("int_const 255"), "0xff").numeric_value(), Some(U256::from(255)));
        assert_eq!(
            lit("number", Some("int_const 1000000000000000000"), "1e18").numeric_value(),
            Some(U256::exp10(18))
        );
        assert_eq!(lit("number", Some("int_const 1000"), "1_000").numeric_value(), Some(U256::from(1000)));
        assert_eq!(lit("number", None, "1e18").numeric_value(), None);
    }

    #[test]
    fn values_drop_booleans() {
        let values = LiteralValues::from_literals(vec![
            lit("bool", Some("bool"), "true"),
            lit("number", Some("int_const 3"), "3"),
            lit("number", None, "1e3"),
        ]);
        assert_eq!(values.number, BTreeSet::from([U256::from(3)]));
        assert_eq!(values.other, BTreeSet::from(["1e3".to_string()]));
    }
}

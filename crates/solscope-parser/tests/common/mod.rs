#![allow(dead_code)]

use serde_json::{json, Value};

/// `start:length:file` of the first occurrence of `needle`
pub fn span(source: &str, needle: &str, file: i64) -> String {
    let (begin, end) = bounds(source, needle);
    format!("{}:{}:{}", begin, end - begin, file)
}

/// `start:length:file` from the first `first` to the end of the last `last`
pub fn span_range(source: &str, first: &str, last: &str, file: i64) -> String {
    let begin = source.find(first).unwrap_or_else(|| panic!("'{}' not in source", first));
    let end = source.rfind(last).unwrap_or_else(|| panic!("'{}' not in source", last)) + last.len();
    format!("{}:{}:{}", begin, end - begin, file)
}

/// Byte bounds of the first occurrence of `needle`
pub fn bounds(source: &str, needle: &str) -> (usize, usize) {
    let begin = source.find(needle).unwrap_or_else(|| panic!("'{}' not in source", needle));
    (begin, begin + needle.len())
}

pub fn params(types: &[&str]) -> Value {
    let params: Vec<Value> = types
        .iter()
        .map(|t| json!({ "nodeType": "VariableDeclaration", "typeDescriptions": { "typeString": t } }))
        .collect();
    json!({ "nodeType": "ParameterList", "parameters": params })
}

pub fn number_literal(value: &str) -> Value {
    json!({
        "nodeType": "Literal",
        "kind": "number",
        "value": value,
        "typeDescriptions": { "typeString": format!("int_const {}", value) }
    })
}

pub fn string_literal(value: &str) -> Value {
    json!({
        "nodeType": "Literal",
        "kind": "string",
        "value": value,
        "typeDescriptions": { "typeString": format!("literal_string \"{}\"", value) }
    })
}

pub fn state_var(src: String, name: &str, visibility: &str, id: i64) -> Value {
    json!({
        "nodeType": "VariableDeclaration",
        "id": id,
        "name": name,
        "visibility": visibility,
        "stateVariable": true,
        "src": src
    })
}

pub fn function(src: String, name: &str, inputs: &[&str], outputs: &[&str], id: i64, body: Vec<Value>) -> Value {
    json!({
        "nodeType": "FunctionDefinition",
        "id": id,
        "name": name,
        "kind": "function",
        "visibility": "public",
        "stateMutability": "nonpayable",
        "implemented": true,
        "modifiers": [],
        "parameters": params(inputs),
        "returnParameters": params(outputs),
        "body": { "nodeType": "Block", "statements": body },
        "src": src
    })
}

pub fn event(src: String, name: &str, inputs: &[&str], id: i64) -> Value {
    json!({
        "nodeType": "EventDefinition",
        "id": id,
        "name": name,
        "anonymous": false,
        "parameters": params(inputs),
        "src": src
    })
}

pub fn contract(src: String, name: &str, kind: &str, id: i64, nodes: Vec<Value>) -> Value {
    json!({
        "nodeType": "ContractDefinition",
        "id": id,
        "name": name,
        "contractKind": kind,
        "abstract": false,
        "baseContracts": [],
        "src": src,
        "nodes": nodes
    })
}

pub fn unit(source: &str, path: &str, file: i64, symbols: Value, nodes: Vec<Value>) -> Value {
    json!({
        "nodeType": "SourceUnit",
        "id": 1000 + file,
        "absolutePath": path,
        "exportedSymbols": symbols,
        "src": format!("0:{}:{}", source.len(), file),
        "nodes": nodes
    })
}

/// Assembly item annotated with a source file
pub fn item(name: &str, value: Option<&str>, range: (usize, usize), source: i64) -> Value {
    let mut item = json!({ "name": name, "begin": range.0, "end": range.1, "source": source });
    if let Some(value) = value {
        item["value"] = json!(value);
    }
    item
}

/// Assembly item without a `source` annotation (older compilers)
pub fn bare_item(name: &str, value: Option<&str>, range: (usize, usize)) -> Value {
    let mut item = json!({ "name": name, "begin": range.0, "end": range.1 });
    if let Some(value) = value {
        item["value"] = json!(value);
    }
    item
}

pub fn tag(value: &str) -> Value {
    json!({ "name": "tag", "value": value, "begin": 0, "end": 0 })
}

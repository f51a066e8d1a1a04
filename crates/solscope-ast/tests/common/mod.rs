#![allow(dead_code)]

use serde_json::{json, Value};
use solscope_ast::{SourceFile, SourceLocator, SourceUnit, SourceUnitAst};
use solscope_core::AstDialect;

/// `start:length:file` of the first occurrence of `needle`
pub fn span(source: &str, needle: &str, file: i64) -> String {
    let start = source.find(needle).unwrap_or_else(|| panic!("'{}' not in source", needle));
    format!("{}:{}:{}", start, needle.len(), file)
}

pub fn locator(path: &str, source: &str) -> SourceLocator {
    SourceLocator::new(vec![SourceFile::new(path, Some(source.to_string()))])
}

pub fn unit(path: &str, ast: Value, dialect: AstDialect) -> SourceUnit {
    SourceUnit::new(path, SourceUnitAst::from_value(ast, dialect).unwrap())
}

pub fn modern_params(types: &[&str]) -> Value {
    let params: Vec<Value> = types
        .iter()
        .map(|t| json!({ "nodeType": "VariableDeclaration", "typeDescriptions": { "typeString": t } }))
        .collect();
    json!({ "nodeType": "ParameterList", "parameters": params })
}

pub fn legacy_params(types: &[&str]) -> Value {
    let params: Vec<Value> = types
        .iter()
        .map(|t| json!({ "name": "VariableDeclaration", "attributes": { "type": t } }))
        .collect();
    json!({ "name": "ParameterList", "children": params })
}

pub fn modern_state_var(source: &str, decl: &str, name: &str, visibility: &str, id: i64) -> Value {
    json!({
        "nodeType": "VariableDeclaration",
        "id": id,
        "name": name,
        "visibility": visibility,
        "stateVariable": true,
        "src": span(source, decl, 0)
    })
}

pub fn modern_function(source: &str, decl: &str, name: &str, kind: &str, id: i64) -> Value {
    json!({
        "nodeType": "FunctionDefinition",
        "id": id,
        "name": name,
        "kind": kind,
        "visibility": "public",
        "stateMutability": "nonpayable",
        "implemented": true,
        "modifiers": [],
        "parameters": modern_params(&[]),
        "returnParameters": modern_params(&[]),
        "src": span(source, decl, 0)
    })
}

pub fn legacy_function(source: &str, decl: &str, name: &str, kind: &str, id: i64) -> Value {
    json!({
        "name": "FunctionDefinition",
        "id": id,
        "src": span(source, decl, 0),
        "attributes": {
            "name": name,
            "kind": kind,
            "visibility": "public",
            "stateMutability": "nonpayable",
            "implemented": true,
            "modifiers": null
        },
        "children": [
            legacy_params(&[]),
            legacy_params(&[]),
            { "name": "Block", "children": [] }
        ]
    })
}

pub fn modern_contract(source: &str, decl: &str, name: &str, id: i64, bases: &[i64], nodes: Vec<Value>) -> Value {
    let bases: Vec<Value> = bases
        .iter()
        .map(|b| json!({ "nodeType": "InheritanceSpecifier", "baseName": { "referencedDeclaration": b } }))
        .collect();
    json!({
        "nodeType": "ContractDefinition",
        "id": id,
        "name": name,
        "contractKind": "contract",
        "abstract": false,
        "baseContracts": bases,
        "src": span(source, decl, 0),
        "nodes": nodes
    })
}

pub fn modern_unit(source: &str, path: &str, symbols: Value, nodes: Vec<Value>) -> Value {
    json!({
        "nodeType": "SourceUnit",
        "id": 1000,
        "absolutePath": path,
        "exportedSymbols": symbols,
        "src": format!("0:{}:0", source.len()),
        "nodes": nodes
    })
}

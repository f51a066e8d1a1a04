mod common;

use std::collections::BTreeSet;

use common::*;
use serde_json::json;
use solscope_ast::{FieldQuery, FunctionQuery, ModelBuilder, SourceUnitAst};
use solscope_core::{AstDialect, Error, FunctionKind, FIELD_VISIBILITY_NON_PRIVATE};

const AB_SOURCE: &str = r#"pragma solidity ^0.8.0;

contract A {
    uint offering;
    uint internal threshold;
    uint public level;
    mapping(address => uint) balancesA;
    uint step;
    uint private private_var;
}

contract B is A {
}
"#;

fn ab_unit() -> serde_json::Value {
    let s = AB_SOURCE;
    let a_body = "contract A {\n    uint offering;";
    let fields = vec![
        modern_state_var(s, "uint offering", "offering", "internal", 2),
        modern_state_var(s, "uint internal threshold", "threshold", "internal", 3),
        modern_state_var(s, "uint public level", "level", "public", 4),
        modern_state_var(s, "mapping(address => uint) balancesA", "balancesA", "internal", 5),
        modern_state_var(s, "uint step", "step", "internal", 6),
        modern_state_var(s, "uint private private_var", "private_var", "private", 7),
    ];
    modern_unit(
        s,
        "AB.sol",
        json!({ "A": [10], "B": [20] }),
        vec![
            json!({ "nodeType": "PragmaDirective", "id": 1, "src": span(s, "pragma solidity ^0.8.0;", 0) }),
            modern_contract(s, a_body, "A", 10, &[], fields),
            modern_contract(s, "contract B is A {\n}", "B", 20, &[10], vec![]),
        ],
    )
}

#[test]
fn derived_contract_sees_non_private_base_fields() {
    let locator = locator("AB.sol", AB_SOURCE);
    let model = ModelBuilder::new(&locator)
        .build(&[unit("AB.sol", ab_unit(), AstDialect::V8)])
        .unwrap();

    let query = FieldQuery::new()
        .visibility(FIELD_VISIBILITY_NON_PRIVATE)
        .with_base_fields(true);
    let names: BTreeSet<String> = model
        .field_names_in_contract_by_name("B", &query)
        .unwrap()
        .into_iter()
        .collect();
    let expected: BTreeSet<String> = ["offering", "threshold", "level", "balancesA", "step"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, expected);

    let b = model.contract_by_name("B").unwrap();
    assert!(b.fields.iter().all(|f| f.inherited_from.as_deref() == Some("A")));

    // sem campos herdados, B não declara nada
    assert!(model.fields_in_contract(b, &FieldQuery::default()).is_empty());

    // A mantém seus próprios registros, intocados
    let a = model.contract_by_name("A").unwrap();
    assert_eq!(a.fields.len(), 6);
    assert!(a.fields.iter().all(|f| f.inherited_from.is_none()));
    assert_eq!(a.fields[0].raw, "uint offering");
    assert_eq!(a.fields[0].lines, Some((4, 4)));
}

const KINDS_SOURCE: &str = r#"contract K {
    receive() external payable {}
    function a(uint256 x) public returns (uint256) { return x; }
    function b() internal {}
    fallback() external {}
}
"#;

#[test]
fn function_kinds_in_declaration_order_modern() {
    let s = KINDS_SOURCE;
    let mut a = modern_function(s, "function a(uint256 x) public returns (uint256) { return x; }", "a", "function", 3);
    a["parameters"] = modern_params(&["uint256"]);
    a["returnParameters"] = modern_params(&["uint256"]);
    let functions = vec![
        modern_function(s, "receive() external payable {}", "", "receive", 2),
        a,
        modern_function(s, "function b() internal {}", "b", "function", 4),
        modern_function(s, "fallback() external {}", "", "fallback", 5),
    ];
    let ast = modern_unit(
        s,
        "K.sol",
        json!({ "K": [1] }),
        vec![modern_contract(s, s.trim_end(), "K", 1, &[], functions)],
    );

    let locator = locator("K.sol", s);
    let model = ModelBuilder::new(&locator).build(&[unit("K.sol", ast, AstDialect::V8)]).unwrap();
    let k = model.contract_by_name("K").unwrap();

    let kinds: Vec<FunctionKind> = k.functions.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FunctionKind::Receive, FunctionKind::Function, FunctionKind::Function, FunctionKind::Fallback]
    );
    let names: Vec<&str> = k.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["receive", "a", "b", "fallback"]);

    let a = model.function_by_name("K", "a").unwrap();
    assert_eq!(a.signature, "a(uint256)");
    assert_eq!(a.return_signature, "(uint256)");
    assert_eq!(a.lines, Some((3, 3)));
}

#[test]
fn function_kinds_in_declaration_order_legacy() {
    let s = KINDS_SOURCE;
    let functions = vec![
        legacy_function(s, "receive() external payable {}", "", "receive", 2),
        legacy_function(s, "function a(uint256 x) public returns (uint256) { return x; }", "a", "function", 3),
        legacy_function(s, "function b() internal {}", "b", "function", 4),
        legacy_function(s, "fallback() external {}", "", "fallback", 5),
    ];
    let ast = json!({
        "name": "SourceUnit",
        "id": 100,
        "src": format!("0:{}:0", s.len()),
        "attributes": { "absolutePath": "K.sol", "exportedSymbols": { "K": [1] } },
        "children": [{
            "name": "ContractDefinition",
            "id": 1,
            "src": span(s, s.trim_end(), 0),
            "attributes": {
                "name": "K",
                "contractKind": "contract",
                "fullyImplemented": true,
                "contractDependencies": [],
                "baseContracts": [null]
            },
            "children": functions
        }]
    });

    let locator = locator("K.sol", s);
    let model = ModelBuilder::new(&locator).build(&[unit("K.sol", ast, AstDialect::V7)]).unwrap();
    let kinds: Vec<FunctionKind> = model
        .functions_in_contract_by_name("K", &FunctionQuery::default())
        .unwrap()
        .iter()
        .map(|f| f.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![FunctionKind::Receive, FunctionKind::Function, FunctionKind::Function, FunctionKind::Fallback]
    );
}

const ABC_SOURCE: &str = r#"contract A { uint a; function fa() public {} }
contract B { uint b; }
contract C is A, B { uint c; }
"#;

fn abc_model() -> solscope_ast::ContractModel {
    let s = ABC_SOURCE;
    let a = modern_contract(
        s,
        "contract A { uint a; function fa() public {} }",
        "A",
        1,
        &[],
        vec![
            modern_state_var(s, "uint a;", "a", "internal", 11),
            modern_function(s, "function fa() public {}", "fa", "function", 12),
        ],
    );
    let b = modern_contract(s, "contract B { uint b; }", "B", 2, &[], vec![
        modern_state_var(s, "uint b;", "b", "internal", 21),
    ]);
    let c = modern_contract(s, "contract C is A, B { uint c; }", "C", 3, &[1, 2], vec![
        modern_state_var(s, "uint c;", "c", "internal", 31),
    ]);
    let ast = modern_unit(s, "ABC.sol", json!({ "A": [1], "B": [2], "C": [3] }), vec![a, b, c]);
    let locator = locator("ABC.sol", s);
    ModelBuilder::new(&locator).build(&[unit("ABC.sol", ast, AstDialect::V8)]).unwrap()
}

#[test]
fn pruned_contracts_exclude_bases() {
    let model = abc_model();
    assert_eq!(model.pruned_contract_names(), vec!["C".to_string()]);
    assert_eq!(
        model.base_contract_names(),
        ["A".to_string(), "B".to_string()].into_iter().collect::<BTreeSet<String>>()
    );
    assert_eq!(model.all_contract_names(), vec!["A", "B", "C"]);
}

#[test]
fn inherited_members_name_their_origin() {
    let model = abc_model();
    let c = model.contract_by_name("C").unwrap();

    let origins: Vec<(String, Option<String>)> = c
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.inherited_from.clone()))
        .collect();
    assert_eq!(
        origins,
        vec![
            ("c".to_string(), None),
            ("a".to_string(), Some("A".to_string())),
            ("b".to_string(), Some("B".to_string())),
        ]
    );

    let local_only = FunctionQuery::new().check_base_contract(false);
    assert!(model.functions_in_contract(c, &local_only).is_empty());
    let fa = model.function_by_name("C", "fa").unwrap();
    assert_eq!(fa.inherited_from.as_deref(), Some("A"));
}

#[test]
fn grandparent_members_reach_grandchildren() {
    let s = "contract A { uint a; }\ncontract B is A { }\ncontract C is B { }\n";
    let ast = modern_unit(s, "X.sol", json!({ "A": [1], "B": [2], "C": [3] }), vec![
        // C antes de B para que a ordem de processamento não importe
        modern_contract(s, "contract C is B { }", "C", 3, &[2], vec![]),
        modern_contract(s, "contract B is A { }", "B", 2, &[1], vec![]),
        modern_contract(s, "contract A { uint a; }", "A", 1, &[], vec![
            modern_state_var(s, "uint a;", "a", "internal", 11),
        ]),
    ]);
    let locator = locator("X.sol", s);
    let model = ModelBuilder::new(&locator).build(&[unit("X.sol", ast, AstDialect::V8)]).unwrap();
    let c = model.contract_by_name("C").unwrap();
    assert_eq!(c.fields.len(), 1);
    assert_eq!(c.fields[0].inherited_from.as_deref(), Some("A"));
}

#[test]
fn contract_with_id_zero_is_accepted() {
    let s = "contract A { uint a; }\ncontract B is A { }\n";
    let ast = modern_unit(s, "Z.sol", json!({ "A": [0], "B": [4] }), vec![
        modern_contract(s, "contract A { uint a; }", "A", 0, &[], vec![
            modern_state_var(s, "uint a;", "a", "internal", 1),
        ]),
        modern_contract(s, "contract B is A { }", "B", 4, &[0], vec![]),
    ]);
    let locator = locator("Z.sol", s);
    let model = ModelBuilder::new(&locator).build(&[unit("Z.sol", ast, AstDialect::V8)]).unwrap();

    assert_eq!(model.contract_by_id(0).unwrap().name, "A");
    let b = model.contract_by_name("B").unwrap();
    assert_eq!(b.fields.len(), 1);
    assert_eq!(b.fields[0].inherited_from.as_deref(), Some("A"));
}

#[test]
fn named_lookups_fail_loudly() {
    let model = abc_model();
    assert!(matches!(model.contract_by_name("Nope"), Err(Error::MissingContract(_))));
    assert!(matches!(
        model.function_by_name("A", "nope"),
        Err(Error::MissingFunction { .. })
    ));
    assert!(matches!(model.event_by_name("A", "Ev"), Err(Error::MissingEvent { .. })));
    assert!(model.events_in_contract_by_name("A").unwrap().is_empty());
}

#[test]
fn utf8_function_text_round_trips() {
    let s = "contract U {\n    // ação\n    function f() public { string memory x = \"çãé\"; }\n}\n";
    let decl = "function f() public { string memory x = \"çãé\"; }";
    let f = modern_function(s, decl, "f", "function", 2);
    let ast = modern_unit(s, "U.sol", json!({ "U": [1] }), vec![
        modern_contract(s, s.trim_end(), "U", 1, &[], vec![f]),
    ]);
    let locator = locator("U.sol", s);
    let model = ModelBuilder::new(&locator).build(&[unit("U.sol", ast, AstDialect::V8)]).unwrap();
    let f = model.function_by_name("U", "f").unwrap();

    assert_eq!(f.raw.as_bytes().len(), f.src.length);
    assert_eq!(f.raw, decl);
    assert_eq!(f.lines, Some((3, 3)));
}

#[test]
fn function_without_parameter_list_is_a_schema_error() {
    let s = "contract Z { function f() public {} }";
    let mut f = modern_function(s, "function f() public {}", "f", "function", 2);
    f.as_object_mut().unwrap().remove("parameters");
    let ast = modern_unit(s, "Z.sol", json!({ "Z": [1] }), vec![
        modern_contract(s, s, "Z", 1, &[], vec![f]),
    ]);
    let locator = locator("Z.sol", s);
    let err = ModelBuilder::new(&locator)
        .build(&[unit("Z.sol", ast, AstDialect::V8)])
        .unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
}

#[test]
fn root_must_be_a_source_unit() {
    let err = SourceUnitAst::from_value(json!({ "nodeType": "ContractDefinition" }), AstDialect::V8)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRoot(_)));

    let err = SourceUnitAst::from_value(json!({ "name": "SourceUnit", "children": null }), AstDialect::V5)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRoot(_)));
}

//! Standard JSON
//!
//! Par entrada/saída do modo `--standard-json`. As saídas são indexadas por
//! arquivo e depois por contrato, então o mesmo nome pode aparecer em mais de
//! um arquivo; as consultas por nome curto percorrem todos eles.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solscope_ast::{
    ContractModel, LiteralSet, ModelBuilder, SourceFile, SourceLocator, SourceUnit, SourceUnitAst,
};
use solscope_bytecode::{parse_src_mapping, split_opcodes, AssemblyBlock, PcIndex};
use solscope_core::traits::{FsSourceReader, SourceReader};
use solscope_core::utils::library_placeholder_hash;
use solscope_core::{AstDialect, Error, Result, SourceMapEntry};
use tracing::{debug, warn};

use crate::artifact::CompiledArtifact;
use crate::cache::MemoCache;
use crate::config::ParserConfig;
use crate::resolver::{resolve_nearest, CodeSection, GeneratedSource, SourceFragment};

/// Diagnóstico emitido pelo compilador
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "formattedMessage", default)]
    pub formatted_message: Option<String>,
}

impl Diagnostic {
    /// `ParserError`, `TypeError`, `DeclarationError`...
    pub fn is_error(&self) -> bool {
        self.kind.contains("Error")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bytecode {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub opcodes: Option<String>,
    #[serde(rename = "sourceMap", default)]
    pub source_map: Option<String>,
    #[serde(rename = "generatedSources", default)]
    pub generated_sources: Option<Vec<GeneratedSource>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evm {
    #[serde(rename = "legacyAssembly", default)]
    pub legacy_assembly: Option<AssemblyBlock>,
    #[serde(default)]
    pub bytecode: Option<Bytecode>,
    #[serde(rename = "deployedBytecode", default)]
    pub deployed_bytecode: Option<Bytecode>,
}

impl Evm {
    pub fn bytecode_for(&self, deploy: bool) -> Option<&Bytecode> {
        if deploy {
            self.bytecode.as_ref()
        } else {
            self.deployed_bytecode.as_ref()
        }
    }

    pub fn generated(&self, deploy: bool) -> &[GeneratedSource] {
        self.bytecode_for(deploy)
            .and_then(|b| b.generated_sources.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardContract {
    #[serde(default)]
    pub abi: Option<Value>,
    #[serde(default)]
    pub evm: Option<Evm>,
}

impl StandardContract {
    pub fn binary_for(&self, deploy: bool) -> Option<&str> {
        self.evm
            .as_ref()?
            .bytecode_for(deploy)?
            .object
            .as_deref()
            .filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OutputSource {
    id: i64,
    #[serde(default)]
    ast: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StandardOutput {
    #[serde(default)]
    errors: Vec<Diagnostic>,
    #[serde(default)]
    sources: BTreeMap<String, OutputSource>,
    #[serde(default)]
    contracts: BTreeMap<String, BTreeMap<String, StandardContract>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InputSource {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StandardInput {
    #[serde(default)]
    sources: BTreeMap<String, InputSource>,
}

/// Marca todas as saídas para geração, como a análise exige
pub fn select_all_outputs(input: &mut Value) -> Result<()> {
    let root = input
        .as_object_mut()
        .ok_or_else(|| Error::schema("standard-json", "a entrada deve ser um objeto"))?;
    let settings = root
        .entry("settings")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| Error::schema("standard-json", "settings deve ser um objeto"))?;
    settings.insert(
        "outputSelection".to_string(),
        json!({ "*": { "*": ["*"], "": ["ast"] } }),
    );
    Ok(())
}

fn error_messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.formatted_message.clone().unwrap_or_else(|| d.message.clone()))
        .collect()
}

/// Mensagens dos diagnósticos de erro da saída
pub fn compilation_errors(output: &Value) -> Vec<String> {
    let diagnostics: Vec<Diagnostic> = output
        .get("errors")
        .and_then(|e| serde_json::from_value(e.clone()).ok())
        .unwrap_or_default();
    error_messages(&diagnostics)
}

pub fn has_compilation_error(output: &Value) -> bool {
    !compilation_errors(output).is_empty()
}

/// Parser da saída standard-json
pub struct StandardJsonParser {
    version: String,
    output: StandardOutput,
    units: BTreeMap<String, SourceUnitAst>,
    locator: SourceLocator,
    model: ContractModel,
    indexes: MemoCache<(String, bool), Arc<PcIndex>>,
    srcmaps: MemoCache<(String, bool), Arc<Vec<SourceMapEntry>>>,
    fragments: MemoCache<(String, usize, bool), Option<SourceFragment>>,
}

type Entry<'s> = (&'s str, &'s str, &'s StandardContract);

impl StandardJsonParser {
    /// Fontes sem `content` na entrada são lidas relativas a `config.base_path`
    pub fn new(input: Value, output: Value, version: &str, config: ParserConfig) -> Result<Self> {
        let reader = FsSourceReader::new(config.base_path.clone());
        Self::with_reader(input, output, version, &config, &reader)
    }

    pub fn with_reader(
        input: Value,
        output: Value,
        version: &str,
        config: &ParserConfig,
        reader: &dyn SourceReader,
    ) -> Result<Self> {
        AstDialect::from_version(version)?;

        let output: StandardOutput = serde_json::from_value(output)?;
        let errors = error_messages(&output.errors);
        if !errors.is_empty() {
            return Err(Error::CompileDiagnostic(errors));
        }
        let input: StandardInput = serde_json::from_value(input)?;

        // `ast` do standard-json usa o formato compacto em todas as versões
        let mut units = BTreeMap::new();
        for (file, source) in &output.sources {
            if let Some(ast) = &source.ast {
                units.insert(file.clone(), SourceUnitAst::from_value(ast.clone(), AstDialect::V8)?);
            }
        }

        let len = output
            .sources
            .values()
            .filter_map(|s| usize::try_from(s.id).ok())
            .max()
            .map_or(0, |max| max + 1);
        let mut files = vec![SourceFile::new(String::new(), None); len];
        for (file, source) in &output.sources {
            let Ok(idx) = usize::try_from(source.id) else {
                continue;
            };
            let content = match input.sources.get(file).and_then(|s| s.content.clone()) {
                Some(content) => Some(content),
                None => match reader.read(file) {
                    Ok(content) => Some(content),
                    Err(e) => {
                        warn!(path = %file, error = %e, "fonte ausente na entrada e no disco");
                        None
                    }
                },
            };
            files[idx] = SourceFile::new(file.clone(), content);
        }

        let mut locator = SourceLocator::new(files);
        let has_yul = output
            .contracts
            .values()
            .flat_map(|contracts| contracts.values())
            .filter_map(|c| c.evm.as_ref())
            .any(|evm| !evm.generated(true).is_empty() || !evm.generated(false).is_empty());
        if has_yul {
            locator = locator.with_yul_entry();
        }

        let source_units: Vec<SourceUnit> = units
            .iter()
            .map(|(file, ast)| SourceUnit::new(file.clone(), ast.clone()))
            .collect();
        let model = ModelBuilder::new(&locator).build(&source_units)?;

        debug!(
            version,
            sources = output.sources.len(),
            contracts = model.len(),
            "standard-json carregado"
        );

        Ok(Self {
            version: version.to_string(),
            output,
            units,
            locator,
            model,
            indexes: MemoCache::new(config.cache_capacity),
            srcmaps: MemoCache::new(config.cache_capacity),
            fragments: MemoCache::new(config.cache_capacity),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    pub fn source_list(&self) -> Vec<String> {
        self.locator.source_list()
    }

    /// Todas as ocorrências do contrato, em ordem de arquivo.
    ///
    /// `arquivo:Contrato` seleciona exatamente uma.
    fn entries(&self, name: &str) -> Vec<Entry<'_>> {
        if let Some((file, short)) = name.rsplit_once(':') {
            let exact = self.output.contracts.get_key_value(file).and_then(|(f, contracts)| {
                contracts.get_key_value(short).map(|(n, c)| (f.as_str(), n.as_str(), c))
            });
            if let Some(entry) = exact {
                return vec![entry];
            }
        }
        self.output
            .contracts
            .iter()
            .filter_map(|(file, contracts)| {
                contracts.get_key_value(name).map(|(n, c)| (file.as_str(), n.as_str(), c))
            })
            .collect()
    }

    fn first_entry(&self, name: &str) -> Result<Entry<'_>> {
        self.entries(name)
            .into_iter()
            .next()
            .ok_or_else(|| Error::MissingContract(name.to_string()))
    }

    /// Arquivos que declaram um contrato com este nome
    pub fn files_of(&self, name: &str) -> Vec<&str> {
        self.entries(name).into_iter().map(|(file, _, _)| file).collect()
    }

    pub fn contract(&self, name: &str) -> Result<&StandardContract> {
        self.first_entry(name).map(|(_, _, c)| c)
    }

    pub fn abi(&self, name: &str) -> Result<Option<&Value>> {
        Ok(self.contract(name)?.abi.as_ref())
    }

    /// `(arquivo, contrato, bytecode)` de cada ocorrência com bytecode de deploy
    pub fn deployment_binaries(&self, name: &str) -> Vec<(&str, &str, &str)> {
        self.binaries(name, true)
    }

    /// `(arquivo, contrato, bytecode)` de cada ocorrência com bytecode de runtime
    pub fn runtime_binaries(&self, name: &str) -> Vec<(&str, &str, &str)> {
        self.binaries(name, false)
    }

    fn binaries(&self, name: &str, deploy: bool) -> Vec<(&str, &str, &str)> {
        self.entries(name)
            .into_iter()
            .filter_map(|(file, short, c)| c.binary_for(deploy).map(|bin| (file, short, bin)))
            .collect()
    }

    /// `(arquivo, contrato)` cujo hash de placeholder de link é `hash`
    pub fn qualified_name_from_hash(&self, hash: &str) -> Option<(&str, &str)> {
        self.output.contracts.iter().find_map(|(file, contracts)| {
            contracts
                .keys()
                .find(|name| library_placeholder_hash(&format!("{}:{}", file, name)) == hash)
                .map(|name| (file.as_str(), name.as_str()))
        })
    }

    pub fn deploy_bin_by_hash(&self, hash: &str) -> Option<&str> {
        let (file, name) = self.qualified_name_from_hash(hash)?;
        self.output.contracts.get(file)?.get(name)?.binary_for(true)
    }

    pub fn yul_lines(&self, name: &str, deploy: bool) -> Result<Vec<String>> {
        let (_, _, contract) = self.first_entry(name)?;
        Ok(contract
            .evm
            .as_ref()
            .and_then(|evm| evm.generated(deploy).first())
            .map(|g| g.contents.split('\n').map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Linhas `[start, end)`, indexadas a partir de zero, do arquivo do contrato
    pub fn source_by_lines(&self, name: &str, start: usize, end: usize) -> Result<Vec<String>> {
        let (file, _, _) = self.first_entry(name)?;
        let text = self
            .unit_file_index(file)
            .and_then(|idx| self.locator.source_text(idx))
            .ok_or_else(|| Error::NotFound(format!("fonte de {}", file)))?;

        let lines: Vec<&str> = text.split('\n').collect();
        let end = end.min(lines.len());
        let start = start.min(end);
        Ok(lines[start..end].iter().map(|l| l.to_string()).collect())
    }

    fn unit_file_index(&self, file: &str) -> Option<i64> {
        self.output.sources.get(file).map(|s| s.id)
    }

    /// Índice de PCs de uma ocorrência específica
    pub fn pc_index_in(&self, file: &str, name: &str, deploy: bool) -> Result<Arc<PcIndex>> {
        let qualified = format!("{}:{}", file, name);
        let (_, _, contract) = self.first_entry(&qualified)?;
        self.indexes.get_or_try_insert_with((qualified.clone(), deploy), || {
            let index = build_index(&qualified, contract, deploy)?;
            debug!(contract = %qualified, deploy, pcs = index.len(), "índice de PCs construído");
            Ok(Arc::new(index))
        })
    }

    fn source_map_in(&self, qualified: &str, contract: &StandardContract, deploy: bool) -> Arc<Vec<SourceMapEntry>> {
        let key = (qualified.to_string(), deploy);
        if let Some(srcmap) = self.srcmaps.get(&key) {
            return srcmap;
        }
        let srcmap = contract
            .evm
            .as_ref()
            .and_then(|evm| evm.bytecode_for(deploy))
            .and_then(|b| b.source_map.as_deref())
            .unwrap_or("");
        let decoded = Arc::new(parse_src_mapping(srcmap));
        self.srcmaps.insert(key, decoded.clone());
        decoded
    }

    /// Resolve o PC em uma ocorrência específica do contrato
    pub fn source_by_pc_in(
        &self,
        file: &str,
        name: &str,
        pc: usize,
        deploy: bool,
    ) -> Result<Option<SourceFragment>> {
        let qualified = format!("{}:{}", file, name);
        let (_, _, contract) = self.first_entry(&qualified)?;
        self.fragments.get_or_try_insert_with((qualified.clone(), pc, deploy), || {
            let index = self.pc_index_in(file, name, deploy)?;
            let srcmap = self.source_map_in(&qualified, contract, deploy);
            let generated = contract.evm.as_ref().map_or(&[][..], |evm| evm.generated(deploy));
            let section = CodeSection {
                index: &index,
                srcmap: &srcmap,
                generated,
                default_file: self.unit_file_index(file),
            };
            Ok(resolve_nearest(&section, &self.locator, pc))
        })
    }
}

fn build_index(qualified: &str, contract: &StandardContract, deploy: bool) -> Result<PcIndex> {
    let evm = contract
        .evm
        .as_ref()
        .ok_or_else(|| Error::NotFound(format!("evm de {}", qualified)))?;
    let code = evm
        .legacy_assembly
        .as_ref()
        .and_then(|asm| asm.code_for(deploy))
        .ok_or_else(|| Error::NotFound(format!("legacyAssembly de {}", qualified)))?;
    let opcodes = evm
        .bytecode_for(deploy)
        .and_then(|b| b.opcodes.as_deref())
        .ok_or_else(|| Error::NotFound(format!("opcodes de {}", qualified)))?;
    PcIndex::build(code, &split_opcodes(opcodes))
}

impl CompiledArtifact for StandardJsonParser {
    fn model(&self) -> &ContractModel {
        &self.model
    }

    /// Usa a primeira ocorrência do nome
    fn pc_index(&self, contract: &str, deploy: bool) -> Result<Arc<PcIndex>> {
        let (file, name, _) = self.first_entry(contract)?;
        self.pc_index_in(file, name, deploy)
    }

    /// Tenta cada ocorrência do nome até uma resolver o PC
    fn source_by_pc(&self, contract: &str, pc: usize, deploy: bool) -> Result<Option<SourceFragment>> {
        let entries = self.entries(contract);
        if entries.is_empty() {
            return Err(Error::MissingContract(contract.to_string()));
        }
        let several = entries.len() > 1;
        for (file, name, _) in entries {
            match self.source_by_pc_in(file, name, pc, deploy) {
                Ok(Some(fragment)) => return Ok(Some(fragment)),
                Ok(None) => continue,
                Err(e) if several && e.is_missing() => {
                    debug!(file, contract = name, error = %e, "ocorrência sem código");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn literals(&self, contract: &str) -> Result<LiteralSet> {
        let record = self.model.contract_by_name(contract)?;
        let literals = self
            .units
            .get(&record.source_id)
            .and_then(|unit| unit.contract_literals(&record.name))
            .ok_or_else(|| Error::MissingContract(contract.to_string()))?;
        Ok(LiteralSet::from_literals(literals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_all_outputs_overrides_selection() {
        let mut input = json!({ "language": "Solidity", "sources": {} });
        select_all_outputs(&mut input).unwrap();
        assert_eq!(input["settings"]["outputSelection"]["*"][""], json!(["ast"]));
        assert!(select_all_outputs(&mut json!([])).is_err());
    }

    #[test]
    fn only_error_types_fail_compilation() {
        let warning = json!({ "errors": [{ "type": "Warning", "message": "unused" }] });
        assert!(!has_compilation_error(&warning));

        let failed = json!({ "errors": [
            { "type": "Warning", "message": "unused" },
            { "type": "ParserError", "message": "Expected ';'", "formattedMessage": "A.sol:3: Expected ';'" }
        ]});
        assert_eq!(compilation_errors(&failed), vec!["A.sol:3: Expected ';'".to_string()]);
    }
}

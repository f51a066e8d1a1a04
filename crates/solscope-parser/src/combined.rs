//! Combined JSON
//!
//! Aceita a saída `--combined-json` do compilador em dois formatos:
//! o mapa plano `{"arquivo:Contrato": {...}}`, com a AST dentro de cada
//! contrato, e o formato bruto `{"contracts": {...}, "sources": {...}}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solscope_ast::{
    ContractModel, LiteralSet, ModelBuilder, SourceFile, SourceLocator, SourceUnit, SourceUnitAst,
    STDIN_PATH, YUL_SOURCE_PATH,
};
use solscope_bytecode::{parse_src_mapping, skip_deploy_preamble, split_opcodes, AssemblyBlock, PcIndex};
use solscope_core::traits::{FsSourceReader, SourceReader};
use solscope_core::utils::library_placeholder_hash;
use solscope_core::{AstDialect, Error, Result, SourceMapEntry};
use tracing::{debug, warn};

use crate::artifact::CompiledArtifact;
use crate::cache::MemoCache;
use crate::config::ParserConfig;
use crate::resolver::{resolve, CodeSection, GeneratedSource, SourceFragment};

/// Saídas de um contrato no combined-json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedContract {
    #[serde(default)]
    pub ast: Option<Value>,
    #[serde(default)]
    pub abi: Option<Value>,
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default, rename = "bin-runtime")]
    pub bin_runtime: Option<String>,
    #[serde(default)]
    pub srcmap: Option<String>,
    #[serde(default, rename = "srcmap-runtime")]
    pub srcmap_runtime: Option<String>,
    #[serde(default)]
    pub asm: Option<AssemblyBlock>,
    #[serde(default)]
    pub opcodes: Option<String>,
    #[serde(default, rename = "generated-sources")]
    pub generated_sources: Option<Vec<GeneratedSource>>,
    #[serde(default, rename = "generated-sources-runtime")]
    pub generated_sources_runtime: Option<Vec<GeneratedSource>>,
}

impl CombinedContract {
    pub fn generated(&self, deploy: bool) -> &[GeneratedSource] {
        let sources = if deploy { &self.generated_sources } else { &self.generated_sources_runtime };
        sources.as_deref().unwrap_or(&[])
    }

    /// Há código Yul gerado tanto para deploy quanto para runtime
    pub fn has_yul(&self) -> bool {
        !self.generated(true).is_empty() && !self.generated(false).is_empty()
    }

    pub fn srcmap_for(&self, deploy: bool) -> &str {
        let srcmap = if deploy { &self.srcmap } else { &self.srcmap_runtime };
        srcmap.as_deref().unwrap_or("")
    }

    pub fn binary_for(&self, deploy: bool) -> Option<&str> {
        let bin = if deploy { &self.bin } else { &self.bin_runtime };
        bin.as_deref().filter(|b| !b.is_empty())
    }
}

#[derive(Deserialize)]
struct RawCombined {
    contracts: BTreeMap<String, CombinedContract>,
    #[serde(default)]
    sources: BTreeMap<String, RawSource>,
    #[serde(default, rename = "sourceList")]
    source_list: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(default, alias = "AST")]
    ast: Option<Value>,
}

/// Caminho do arquivo em `arquivo:Contrato`
fn path_of(qualified: &str) -> &str {
    qualified.rsplit_once(':').map_or(qualified, |(path, _)| path)
}

fn short_name(qualified: &str) -> &str {
    qualified.rsplit_once(':').map_or(qualified, |(_, name)| name)
}

fn parse_output(output: Value) -> Result<(BTreeMap<String, CombinedContract>, Option<Vec<String>>)> {
    let Value::Object(map) = output else {
        return Err(Error::schema("combined-json", "a raiz deve ser um objeto"));
    };

    if matches!(map.get("contracts"), Some(Value::Object(_))) {
        let mut raw: RawCombined = serde_json::from_value(Value::Object(map))?;
        for (qualified, contract) in raw.contracts.iter_mut() {
            if contract.ast.is_none() {
                contract.ast = raw.sources.get(path_of(qualified)).and_then(|s| s.ast.clone());
            }
        }
        return Ok((raw.contracts, raw.source_list));
    }

    Ok((serde_json::from_value(Value::Object(map))?, None))
}

/// Parser da saída combined-json
pub struct CombinedJsonParser {
    version: String,
    dialect: AstDialect,
    contracts: BTreeMap<String, CombinedContract>,
    /// Nome curto -> chave qualificada
    names: BTreeMap<String, String>,
    /// Caminho -> AST da unidade
    units: BTreeMap<String, SourceUnitAst>,
    locator: SourceLocator,
    model: ContractModel,
    indexes: MemoCache<(String, bool), Arc<PcIndex>>,
    srcmaps: MemoCache<(String, bool), Arc<Vec<SourceMapEntry>>>,
    fragments: MemoCache<(String, usize, bool), Option<SourceFragment>>,
}

impl CombinedJsonParser {
    /// Lê as fontes do disco, relativas a `config.base_path`
    pub fn new(output: Value, version: &str, config: ParserConfig) -> Result<Self> {
        let reader = FsSourceReader::new(config.base_path.clone());
        Self::with_reader(output, version, &config, &reader, None)
    }

    /// Compilação de uma fonte em memória (`<stdin>`)
    pub fn from_source(
        output: Value,
        version: &str,
        config: ParserConfig,
        source: impl Into<String>,
    ) -> Result<Self> {
        let reader = FsSourceReader::new(config.base_path.clone());
        Self::with_reader(output, version, &config, &reader, Some(source.into()))
    }

    pub fn from_json_str(json: &str, version: &str, config: ParserConfig) -> Result<Self> {
        Self::new(serde_json::from_str(json)?, version, config)
    }

    /// Construção completa com um leitor de fontes arbitrário
    pub fn with_reader(
        output: Value,
        version: &str,
        config: &ParserConfig,
        reader: &dyn SourceReader,
        source: Option<String>,
    ) -> Result<Self> {
        let dialect = AstDialect::from_version(version)?;
        let (contracts, top_source_list) = parse_output(output)?;

        let mut names = BTreeMap::new();
        let mut units = BTreeMap::new();
        for (qualified, contract) in &contracts {
            let name = short_name(qualified);
            if let Some(previous) = names.get(name) {
                warn!(contract = name, kept = %previous, ignored = %qualified, "nome de contrato repetido");
            } else {
                names.insert(name.to_string(), qualified.clone());
            }

            let path = path_of(qualified);
            if units.contains_key(path) {
                continue;
            }
            if let Some(ast) = &contract.ast {
                units.insert(path.to_string(), SourceUnitAst::from_value(ast.clone(), dialect)?);
            }
        }

        let asm_source_list = contracts
            .values()
            .find_map(|c| c.asm.as_ref().and_then(|a| a.source_list.clone()));
        let listed = if config.prefer_asm_source_list {
            top_source_list.or(asm_source_list)
        } else {
            None
        };
        let paths = listed.unwrap_or_else(|| source_list_from_units(&units));

        let files = paths
            .into_iter()
            .map(|path| {
                let content = load_source(reader, &path);
                SourceFile::new(path, content)
            })
            .collect();

        let mut locator = SourceLocator::new(files);
        if contracts.values().any(CombinedContract::has_yul) {
            locator = locator.with_yul_entry();
        }
        if let Some(source) = source {
            locator = locator.with_fallback(source);
        }

        let source_units: Vec<SourceUnit> = units
            .iter()
            .map(|(path, ast)| SourceUnit::new(path.clone(), ast.clone()))
            .collect();
        let model = ModelBuilder::new(&locator).build(&source_units)?;

        debug!(
            version,
            dialect = %dialect,
            contracts = contracts.len(),
            sources = locator.files().len(),
            "combined-json carregado"
        );

        Ok(Self {
            version: version.to_string(),
            dialect,
            contracts,
            names,
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

    pub fn dialect(&self) -> AstDialect {
        self.dialect
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    /// Caminhos na ordem dos índices de arquivo do compilador
    pub fn source_list(&self) -> Vec<String> {
        self.locator.source_list()
    }

    /// Nomes curtos de todos os contratos da saída
    pub fn contract_names(&self) -> Vec<&str> {
        self.names.keys().map(String::as_str).collect()
    }

    /// Aceita o nome curto ou a chave `arquivo:Contrato`
    pub fn contract(&self, name: &str) -> Result<&CombinedContract> {
        self.entry(name).map(|(_, c)| c)
    }

    fn entry(&self, name: &str) -> Result<(&str, &CombinedContract)> {
        let key = self.names.get(name).map(String::as_str).unwrap_or(name);
        self.contracts
            .get_key_value(key)
            .map(|(k, c)| (k.as_str(), c))
            .ok_or_else(|| Error::MissingContract(name.to_string()))
    }

    fn unit_file_index(&self, qualified: &str) -> Option<i64> {
        self.units.get(path_of(qualified)).and_then(SourceUnitAst::file_index)
    }

    /// Source map decodificado, memorizado por `(contrato, deploy)`
    pub fn source_map(&self, contract: &str, deploy: bool) -> Result<Arc<Vec<SourceMapEntry>>> {
        let (qualified, entry) = self.entry(contract)?;
        self.srcmaps.get_or_try_insert_with((qualified.to_string(), deploy), || {
            Ok(Arc::new(parse_src_mapping(entry.srcmap_for(deploy))))
        })
    }

    pub fn abi(&self, contract: &str) -> Result<Option<&Value>> {
        Ok(self.contract(contract)?.abi.as_ref())
    }

    pub fn deployment_binary(&self, contract: &str) -> Result<Option<&str>> {
        Ok(self.contract(contract)?.binary_for(true))
    }

    pub fn runtime_binary(&self, contract: &str) -> Result<Option<&str>> {
        Ok(self.contract(contract)?.binary_for(false))
    }

    /// Chave `arquivo:Contrato` cujo hash de placeholder de link é `hash`
    pub fn qualified_name_from_hash(&self, hash: &str) -> Option<&str> {
        self.contracts
            .keys()
            .find(|qualified| library_placeholder_hash(qualified) == hash)
            .map(String::as_str)
    }

    /// Bytecode de deploy do contrato ou biblioteca identificado pelo hash
    pub fn deploy_bin_by_hash(&self, hash: &str) -> Option<&str> {
        let qualified = self.qualified_name_from_hash(hash)?;
        self.contracts.get(qualified)?.binary_for(true)
    }

    /// Linhas do código Yul gerado; vazio para dialetos legados
    pub fn yul_lines(&self, contract: &str, deploy: bool) -> Result<Vec<String>> {
        let entry = self.contract(contract)?;
        if self.dialect.is_legacy() {
            return Ok(Vec::new());
        }
        Ok(entry
            .generated(deploy)
            .first()
            .map(|g| g.contents.split('\n').map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Linhas `[start, end)`, indexadas a partir de zero, do arquivo do contrato
    pub fn source_by_lines(&self, contract: &str, start: usize, end: usize) -> Result<Vec<String>> {
        let (qualified, _) = self.entry(contract)?;
        let text = self
            .unit_file_index(qualified)
            .and_then(|idx| self.locator.source_text(idx))
            .or(self.locator.fallback())
            .ok_or_else(|| Error::NotFound(format!("fonte de {}", contract)))?;

        let lines: Vec<&str> = text.split('\n').collect();
        let end = end.min(lines.len());
        let start = start.min(end);
        Ok(lines[start..end].iter().map(|l| l.to_string()).collect())
    }

    fn build_index(&self, qualified: &str, entry: &CombinedContract, deploy: bool) -> Result<PcIndex> {
        let asm = entry
            .asm
            .as_ref()
            .ok_or_else(|| Error::NotFound(format!("asm de {}", qualified)))?;
        let code = asm
            .code_for(deploy)
            .ok_or_else(|| Error::NotFound(format!("assembly de runtime de {}", qualified)))?;
        let opcodes = entry
            .opcodes
            .as_deref()
            .ok_or_else(|| Error::NotFound(format!("opcodes de {}", qualified)))?;

        let tokens = split_opcodes(opcodes);
        let tokens = if deploy { &tokens[..] } else { skip_deploy_preamble(&tokens)? };
        PcIndex::build(code, tokens)
    }
}

/// Lista de fontes pelos índices de arquivo das ASTs; lacunas (arquivos sem
/// contratos na saída) ficam como entradas vazias.
fn source_list_from_units(units: &BTreeMap<String, SourceUnitAst>) -> Vec<String> {
    let by_index: BTreeMap<usize, String> = units
        .iter()
        .filter_map(|(path, unit)| {
            let idx = usize::try_from(unit.file_index()?).ok()?;
            Some((idx, unit.absolute_path().unwrap_or(path).to_string()))
        })
        .collect();

    let len = by_index.keys().next_back().map_or(0, |last| last + 1);
    let mut list = vec![String::new(); len];
    for (idx, path) in by_index {
        list[idx] = path;
    }
    list
}

fn load_source(reader: &dyn SourceReader, path: &str) -> Option<String> {
    if path.is_empty() || path == STDIN_PATH || path == YUL_SOURCE_PATH {
        return None;
    }
    match reader.read(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path, error = %e, "fonte não pôde ser lida, usando a fonte em memória");
            None
        }
    }
}

impl CompiledArtifact for CombinedJsonParser {
    fn model(&self) -> &ContractModel {
        &self.model
    }

    fn pc_index(&self, contract: &str, deploy: bool) -> Result<Arc<PcIndex>> {
        let (qualified, entry) = self.entry(contract)?;
        self.indexes.get_or_try_insert_with((qualified.to_string(), deploy), || {
            let index = self.build_index(qualified, entry, deploy)?;
            debug!(contract = qualified, deploy, pcs = index.len(), "índice de PCs construído");
            Ok(Arc::new(index))
        })
    }

    fn source_by_pc(&self, contract: &str, pc: usize, deploy: bool) -> Result<Option<SourceFragment>> {
        let (qualified, entry) = self.entry(contract)?;
        self.fragments.get_or_try_insert_with((qualified.to_string(), pc, deploy), || {
            let index = self.pc_index(contract, deploy)?;
            let srcmap = self.source_map(contract, deploy)?;
            let section = CodeSection {
                index: &index,
                srcmap: &srcmap,
                generated: entry.generated(deploy),
                default_file: self.unit_file_index(qualified),
            };
            Ok(resolve(&section, &self.locator, pc))
        })
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
    fn qualified_names_split_on_last_colon() {
        assert_eq!(path_of("contracts/A.sol:A"), "contracts/A.sol");
        assert_eq!(short_name("contracts/A.sol:A"), "A");
        assert_eq!(short_name("C:/win/A.sol:A"), "A");
        assert_eq!(path_of("A"), "A");
    }

    #[test]
    fn raw_shape_attaches_source_asts() {
        let output = serde_json::json!({
            "contracts": { "a.sol:A": { "bin": "6080" } },
            "sources": { "a.sol": { "AST": { "nodeType": "SourceUnit" } } },
            "sourceList": ["a.sol"]
        });
        let (contracts, list) = parse_output(output).unwrap();
        assert!(contracts["a.sol:A"].ast.is_some());
        assert_eq!(list, Some(vec!["a.sol".to_string()]));
    }

    #[test]
    fn non_object_root_is_a_schema_error() {
        assert!(matches!(parse_output(serde_json::json!([])), Err(Error::Schema(_))));
    }
}

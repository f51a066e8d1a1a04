//! Resolução de program counter para fragmento de fonte.
//!
//! A instrução no PC fornece a faixa `[begin, end)`; o índice de arquivo vem
//! da anotação `source` da instrução ou, na falta dela, da entrada do source
//! map na mesma posição ordinal. Índices a partir do número de fontes reais
//! apontam para o código Yul gerado pelo compilador.

use serde::{Deserialize, Serialize};
use solscope_ast::SourceLocator;
use solscope_bytecode::{AsmItem, PcIndex, PcRecord};
use solscope_core::{LineRange, SourceMapEntry};
use tracing::debug;

/// Fonte gerada pelo compilador (`generated-sources`, `generatedSources`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSource {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Trecho de fonte correspondente a um PC
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFragment {
    pub pc: usize,
    pub fragment: String,
    pub begin: usize,
    pub end: usize,
    /// (linha de `begin`, linha de `end`), 1-based
    pub linenums: LineRange,
    pub source_idx: i64,
    pub source_path: Option<String>,
}

/// Tudo que a resolução precisa sobre uma seção de código
pub struct CodeSection<'a> {
    pub index: &'a PcIndex,
    pub srcmap: &'a [SourceMapEntry],
    pub generated: &'a [GeneratedSource],
    /// Arquivo da unidade que declara o contrato, usado sem outra anotação
    pub default_file: Option<i64>,
}

/// Resolve o PC exato; `None` quando o PC não está no índice ou a faixa
/// não pode ser recortada.
pub fn resolve(section: &CodeSection<'_>, locator: &SourceLocator, pc: usize) -> Option<SourceFragment> {
    let record = section.index.record(pc)?;
    let item = section.index.code().get(record.index)?;
    let source_idx = file_of(section, record, item).or(section.default_file)?;
    fragment_at(section, locator, pc, item, source_idx)
}

/// Como [`resolve`], mas quando a instrução no PC não tem arquivo válido
/// recua até a instrução anterior mais próxima que tenha.
pub fn resolve_nearest(
    section: &CodeSection<'_>,
    locator: &SourceLocator,
    pc: usize,
) -> Option<SourceFragment> {
    section.index.record(pc)?;
    let known = locator.files().len() as i64;

    for (earlier, record) in section.index.records_upto(pc) {
        let Some(item) = section.index.code().get(record.index) else {
            continue;
        };
        match file_of(section, record, item) {
            Some(file) if file < known || is_generated(locator, section.generated, file) => {
                if earlier != pc {
                    debug!(pc, used = earlier, "usando anotação de instrução anterior");
                }
                return fragment_at(section, locator, pc, item, file);
            }
            _ => continue,
        }
    }
    None
}

/// Arquivo da anotação `source` ou, sem ela, da entrada do source map
fn file_of(section: &CodeSection<'_>, record: &PcRecord, item: &AsmItem) -> Option<i64> {
    annotated_file(item).or_else(|| {
        section
            .srcmap
            .get(record.ordinal)
            .map(|e| e.file_index)
            .filter(|f| *f >= 0)
    })
}

fn annotated_file(item: &AsmItem) -> Option<i64> {
    item.source.filter(|f| *f >= 0)
}

fn fragment_at(
    section: &CodeSection<'_>,
    locator: &SourceLocator,
    pc: usize,
    item: &AsmItem,
    source_idx: i64,
) -> Option<SourceFragment> {
    let (begin, end) = item.byte_range()?;

    let mut source_path = locator.path(source_idx).filter(|p| !p.is_empty()).map(str::to_string);
    let text = if is_generated(locator, section.generated, source_idx) {
        let generated = generated_for(section.generated, source_idx)?;
        if source_path.is_none() {
            source_path = generated.name.clone();
        }
        generated.contents.as_str()
    } else {
        locator.source_text(source_idx)?
    };

    let bytes = text.as_bytes();
    if end > bytes.len() {
        debug!(pc, begin, end, len = bytes.len(), "faixa além do fim da fonte");
        return None;
    }

    Some(SourceFragment {
        pc,
        fragment: String::from_utf8_lossy(&bytes[begin..end]).into_owned(),
        begin,
        end,
        linenums: (line_of(bytes, begin), line_of(bytes, end)),
        source_idx,
        source_path,
    })
}

fn is_generated(locator: &SourceLocator, generated: &[GeneratedSource], source_idx: i64) -> bool {
    if generated.is_empty() {
        return false;
    }
    locator.is_yul(source_idx) || source_idx >= locator.real_source_count() as i64
}

/// Fonte gerada com o mesmo id, ou a primeira
fn generated_for(generated: &[GeneratedSource], source_idx: i64) -> Option<&GeneratedSource> {
    generated
        .iter()
        .find(|g| g.id == Some(source_idx))
        .or_else(|| generated.first())
}

fn line_of(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset].iter().filter(|b| **b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use solscope_ast::SourceFile;

    fn item(name: &str, begin: i64, end: i64, source: Option<i64>) -> AsmItem {
        AsmItem {
            name: name.to_string(),
            begin: Some(begin),
            end: Some(end),
            source,
            value: None,
            jump_type: None,
        }
    }

    fn locator() -> SourceLocator {
        SourceLocator::new(vec![SourceFile::new("A.sol", Some("line1\nline2\nline3".into()))])
            .with_yul_entry()
    }

    #[test]
    fn srcmap_supplies_missing_annotation() {
        let code = vec![item("CALLVALUE", 6, 11, None), item("STOP", 0, 5, Some(0))];
        let index = PcIndex::build(&code, &["CALLVALUE", "STOP"]).unwrap();
        let srcmap = vec![SourceMapEntry { start: 6, length: 5, file_index: 0 }];
        let section = CodeSection { index: &index, srcmap: &srcmap, generated: &[], default_file: None };

        let found = resolve(&section, &locator(), 0).unwrap();
        assert_eq!(found.fragment, "line2");
        assert_eq!(found.linenums, (2, 2));
        assert_eq!(found.source_path.as_deref(), Some("A.sol"));
        assert!(resolve(&section, &locator(), 9).is_none());
    }

    #[test]
    fn yul_index_reads_generated_source() {
        let code = vec![item("ADD", 0, 4, Some(1))];
        let index = PcIndex::build(&code, &["ADD"]).unwrap();
        let generated = vec![GeneratedSource {
            id: Some(1),
            name: Some("#utility.yul".into()),
            contents: "{ }\nfunction".into(),
            language: Some("Yul".into()),
        }];
        let section = CodeSection { index: &index, srcmap: &[], generated: &generated, default_file: None };

        let found = resolve(&section, &locator(), 0).unwrap();
        assert_eq!(found.fragment, "{ }\n");
        assert_eq!(found.linenums, (1, 2));
        assert_eq!(found.source_path.as_deref(), Some("#utility.yul"));
    }

    #[test]
    fn nearest_walks_back_to_annotated_item() {
        let code = vec![item("PUSH1", 0, 5, Some(0)), item("POP", 0, 0, Some(-1))];
        let index = PcIndex::build(&code, &["PUSH1", "0x01", "POP"]).unwrap();
        let section = CodeSection { index: &index, srcmap: &[], generated: &[], default_file: None };

        let found = resolve_nearest(&section, &locator(), 2).unwrap();
        assert_eq!(found.pc, 2);
        assert_eq!(found.fragment, "line1");
        assert!(resolve_nearest(&section, &locator(), 1).is_none());
    }

    #[test]
    fn nearest_reads_srcmap_without_annotation() {
        let code = vec![item("PUSH1", 0, 5, None), item("POP", 6, 11, None)];
        let index = PcIndex::build(&code, &["PUSH1", "0x01", "POP"]).unwrap();
        let srcmap = vec![
            SourceMapEntry { start: 0, length: 5, file_index: 0 },
            SourceMapEntry { start: 6, length: 5, file_index: -1 },
        ];
        let section = CodeSection { index: &index, srcmap: &srcmap, generated: &[], default_file: None };

        assert_eq!(resolve_nearest(&section, &locator(), 0).unwrap().fragment, "line1");
        let walked = resolve_nearest(&section, &locator(), 2).unwrap();
        assert_eq!(walked.fragment, "line1");
        assert_eq!(walked.pc, 2);
    }
}

//! Localização de fontes: faixas de bytes para linhas e texto.
//!
//! Os offsets do compilador são offsets de bytes UTF-8; todo recorte aqui é
//! feito sobre os bytes da fonte.

use serde::Serialize;
use solscope_core::{LineRange, SrcRange};

/// Pseudo-caminho da fonte sintética gerada pelo compilador (Yul)
pub const YUL_SOURCE_PATH: &str = "#utility.yul";

/// Caminho usado pelo compilador para fonte passada via stdin
pub const STDIN_PATH: &str = "<stdin>";

/// Arquivo fonte conhecido, na posição do seu índice de arquivo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: String,
    /// `None` quando o conteúdo não foi carregado (ou é `<stdin>`)
    pub content: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: Option<String>) -> Self {
        Self { path: path.into(), content }
    }
}

/// Resultado da localização de uma faixa
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located {
    /// (linha inicial, linha final), 1-based e inclusivo
    pub lines: LineRange,
    pub text: String,
}

/// Localiza `[start, start + length)` dentro de `source`.
///
/// Retorna `None` se a faixa ultrapassa o fim do texto.
pub fn locate_in(source: &str, start: usize, length: usize) -> Option<Located> {
    let bytes = source.as_bytes();
    let end = start.checked_add(length)?;
    if end > bytes.len() {
        return None;
    }
    let start_line = count_newlines(&bytes[..start]) + 1;
    let end_line = start_line + count_newlines(&bytes[start..end]);
    Some(Located {
        lines: (start_line, end_line),
        text: String::from_utf8_lossy(&bytes[start..end]).into_owned(),
    })
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|b| **b == b'\n').count()
}

/// Lista ordenada de fontes de uma compilação
#[derive(Debug, Clone, Default)]
pub struct SourceLocator {
    files: Vec<SourceFile>,
    fallback: Option<String>,
    yul: bool,
}

impl SourceLocator {
    /// `files` deve estar ordenado pelo índice de arquivo do compilador.
    /// Uma entrada final `#utility.yul` é reconhecida como sintética.
    pub fn new(files: Vec<SourceFile>) -> Self {
        let yul = files.last().map_or(false, |f| f.path == YUL_SOURCE_PATH);
        Self { files, fallback: None, yul }
    }

    /// Fonte em memória usada para índices fora da lista ou sem conteúdo
    pub fn with_fallback(mut self, source: impl Into<String>) -> Self {
        self.fallback = Some(source.into());
        self
    }

    /// Acrescenta a entrada sintética do Yul após as fontes reais
    pub fn with_yul_entry(mut self) -> Self {
        if !self.yul {
            self.files.push(SourceFile::new(YUL_SOURCE_PATH, None));
            self.yul = true;
        }
        self
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Caminhos na ordem dos índices, incluindo a entrada Yul
    pub fn source_list(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub fn has_yul(&self) -> bool {
        self.yul
    }

    /// Quantidade de fontes reais
    pub fn real_source_count(&self) -> usize {
        self.files.len() - usize::from(self.yul)
    }

    /// Índice da entrada Yul: sempre o número de fontes reais
    pub fn yul_index(&self) -> Option<usize> {
        self.yul.then(|| self.real_source_count())
    }

    pub fn is_yul(&self, file_index: i64) -> bool {
        match (self.yul_index(), usize::try_from(file_index)) {
            (Some(yul), Ok(idx)) => yul == idx,
            _ => false,
        }
    }

    pub fn file(&self, file_index: i64) -> Option<&SourceFile> {
        usize::try_from(file_index).ok().and_then(|i| self.files.get(i))
    }

    pub fn path(&self, file_index: i64) -> Option<&str> {
        self.file(file_index).map(|f| f.path.as_str())
    }

    /// Texto da fonte; recai na fonte em memória quando o índice é
    /// desconhecido ou o arquivo não tem conteúdo.
    pub fn source_text(&self, file_index: i64) -> Option<&str> {
        if self.is_yul(file_index) {
            return None;
        }
        self.file(file_index)
            .and_then(|f| f.content.as_deref())
            .or(self.fallback.as_deref())
    }

    pub fn locate(&self, range: SrcRange) -> Option<Located> {
        let text = self.source_text(range.file_index)?;
        locate_in(text, range.start, range.length)
    }
}

use thiserror::Error;

/// Erros comuns da biblioteca Solscope
#[derive(Error, Debug)]
pub enum Error {
    /// Um nó da AST não possui um campo exigido pelo dialeto ativo
    #[error("Erro de esquema da AST: {0}")]
    Schema(String),

    /// A raiz da unidade de compilação não é um `SourceUnit`
    #[error("Raiz de AST inválida: {0}")]
    InvalidRoot(String),

    /// Contrato não encontrado pelo nome ou id
    #[error("Contrato não encontrado: {0}")]
    MissingContract(String),

    /// Função não encontrada no contrato
    #[error("Função {function} não encontrada no contrato {contract}")]
    MissingFunction { contract: String, function: String },

    /// Evento não encontrado no contrato
    #[error("Evento {event} não encontrado no contrato {contract}")]
    MissingEvent { contract: String, event: String },

    /// Nenhuma sequência conhecida de início de deploy foi localizada
    #[error("Sequência de deploy não encontrada nos opcodes ({0} tokens)")]
    BytecodePreambleNotFound(usize),

    /// O compilador reportou diagnósticos do tipo `*Error`
    #[error("Falha de compilação: {}", .0.join("; "))]
    CompileDiagnostic(Vec<String>),

    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Versão de compilador inválida
    #[error("Versão inválida: {0}")]
    InvalidVersion(String),

    /// Recurso não encontrado
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// Erro de leitura de arquivo fonte
    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Erro de desserialização JSON
    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Atalho para erros de esquema com contexto do nó
    pub fn schema(kind: &str, detail: impl std::fmt::Display) -> Self {
        Error::Schema(format!("{}: {}", kind, detail))
    }

    /// Indica se o erro representa apenas ausência de um item consultado
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Error::MissingContract(_)
                | Error::MissingFunction { .. }
                | Error::MissingEvent { .. }
                | Error::NotFound(_)
        )
    }
}

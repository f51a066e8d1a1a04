//! Registro de versões instaláveis do compilador e leitura de `pragma solidity`.
//!
//! A lista de versões é buscada no máximo uma vez por instância; depois de
//! inicializada ela é apenas lida.

use once_cell::sync::OnceCell;
use semver::{Version, VersionReq};
use solscope_core::traits::VersionSource;
use solscope_core::{Error, Result};
use tracing::{debug, warn};

/// Lista fixa de versões, útil para testes e ambientes sem rede
#[derive(Debug, Clone, Default)]
pub struct StaticVersions(pub Vec<Version>);

impl VersionSource for StaticVersions {
    fn fetch(&self) -> Result<Vec<Version>> {
        Ok(self.0.clone())
    }
}

/// Versões instaláveis, ordenadas de forma crescente e sem repetição
pub struct InstallableVersions {
    source: Box<dyn VersionSource + Send + Sync>,
    versions: OnceCell<Vec<Version>>,
}

impl InstallableVersions {
    pub fn new(source: impl VersionSource + Send + Sync + 'static) -> Self {
        Self { source: Box::new(source), versions: OnceCell::new() }
    }

    /// Inicializa na primeira chamada; falhas não são memorizadas
    pub fn versions(&self) -> Result<&[Version]> {
        self.versions
            .get_or_try_init(|| {
                let mut versions = self.source.fetch()?;
                versions.sort();
                versions.dedup();
                debug!(count = versions.len(), "versões instaláveis carregadas");
                Ok(versions)
            })
            .map(Vec::as_slice)
    }

    pub fn is_initialized(&self) -> bool {
        self.versions.get().is_some()
    }

    pub fn latest_matching(&self, req: &VersionReq) -> Result<Option<&Version>> {
        Ok(self.versions()?.iter().rev().find(|v| req.matches(v)))
    }

    /// Versões que satisfazem todas as diretivas `pragma solidity` da fonte
    pub fn candidates(&self, source: &str) -> Result<Vec<&Version>> {
        let Some(pragma) = SolidityPragma::from_source(source) else {
            return Ok(Vec::new());
        };
        Ok(self.versions()?.iter().filter(|v| pragma.matches(v)).collect())
    }

    /// Maior versão instalável compatível com a fonte
    pub fn detect_version(&self, source: &str) -> Result<Option<Version>> {
        Ok(self.candidates(source)?.last().map(|v| (*v).clone()))
    }
}

/// Escolhe a versão a tentar depois de `current` falhar.
///
/// Prefere `major.(minor-1).0` quando é candidata, descartando tudo a partir
/// dela; senão usa a maior candidata restante.
pub fn next_candidate(current: &Version, candidates: &[Version]) -> Result<(Version, Vec<Version>)> {
    let previous_line = current
        .minor
        .checked_sub(1)
        .map(|minor| Version::new(current.major, minor, 0));

    if let Some(previous) = previous_line.filter(|p| candidates.contains(p)) {
        let rest = candidates.iter().filter(|v| **v < previous).cloned().collect();
        return Ok((previous, rest));
    }

    match candidates.split_last() {
        Some((last, rest)) => Ok((last.clone(), rest.to_vec())),
        None => Err(Error::NotFound(format!("versão anterior a {}", current))),
    }
}

/// Restrições de versão de uma fonte: cada diretiva precisa ser satisfeita,
/// e dentro de uma diretiva basta uma das alternativas (`||`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityPragma {
    directives: Vec<Vec<VersionReq>>,
}

impl SolidityPragma {
    /// Lê todas as linhas `pragma solidity ...;` da fonte
    pub fn from_source(source: &str) -> Option<Self> {
        let directives: Vec<Vec<VersionReq>> = source
            .lines()
            .filter_map(pragma_expression)
            .filter_map(|expr| match parse_npm_range(expr) {
                Some(reqs) => Some(reqs),
                None => {
                    warn!(pragma = expr, "restrição de versão não reconhecida");
                    None
                }
            })
            .collect();

        if directives.is_empty() {
            warn!("nenhuma diretiva pragma solidity encontrada");
            return None;
        }
        Some(Self { directives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.directives
            .iter()
            .all(|alternatives| alternatives.iter().any(|req| req.matches(version)))
    }
}

fn pragma_expression(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("pragma")?.trim_start();
    let rest = rest.strip_prefix("solidity")?;
    Some(rest.split(';').next().unwrap_or(rest).trim())
}

/// Converte um intervalo no estilo npm (`>=0.4.22 <0.9.0`, `^0.8.0 || 0.7.6`)
/// para requisitos do `semver`. Versões sem operador são exatas.
fn parse_npm_range(expr: &str) -> Option<Vec<VersionReq>> {
    expr.split("||")
        .map(|alternative| {
            let mut comparators: Vec<String> = Vec::new();
            let mut pending_op = String::new();
            for token in alternative.split_whitespace() {
                if token.chars().all(|c| "<>=^~".contains(c)) {
                    pending_op.push_str(token);
                    continue;
                }
                let token = format!("{}{}", std::mem::take(&mut pending_op), token);
                if token.starts_with(|c: char| c.is_ascii_digit()) {
                    comparators.push(format!("={}", token));
                } else {
                    comparators.push(token);
                }
            }
            if comparators.is_empty() {
                return None;
            }
            VersionReq::parse(&comparators.join(", ")).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn npm_ranges_translate_to_semver() {
        let pragma = SolidityPragma::from_source("pragma solidity >= 0.4.22 <0.9.0;").unwrap();
        assert!(pragma.matches(&v("0.8.19")));
        assert!(!pragma.matches(&v("0.9.0")));

        let exact = SolidityPragma::from_source("pragma solidity 0.7.6;").unwrap();
        assert!(exact.matches(&v("0.7.6")));
        assert!(!exact.matches(&v("0.7.5")));

        let either = SolidityPragma::from_source("pragma solidity ^0.8.0 || 0.6.12;").unwrap();
        assert!(either.matches(&v("0.6.12")));
        assert!(!either.matches(&v("0.7.0")));
    }

    #[test]
    fn source_without_pragma() {
        assert!(SolidityPragma::from_source("contract A {}").is_none());
    }

    #[test]
    fn next_candidate_prefers_previous_minor_line() {
        let candidates = vec![v("0.7.0"), v("0.7.6"), v("0.8.0"), v("0.8.1")];
        let (next, rest) = next_candidate(&v("0.8.1"), &candidates).unwrap();
        assert_eq!(next, v("0.7.0"));
        assert!(rest.is_empty());

        let (next, rest) = next_candidate(&v("0.8.1"), &[v("0.8.0"), v("0.8.1")]).unwrap();
        assert_eq!(next, v("0.8.1"));
        assert_eq!(rest, vec![v("0.8.0")]);

        assert!(next_candidate(&v("0.8.1"), &[]).is_err());
    }
}

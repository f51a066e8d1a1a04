//! Consultas comuns aos dois formatos de saída do compilador

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use solscope_ast::{ContractModel, LiteralSet, LiteralValues};
use solscope_bytecode::PcIndex;
use solscope_core::Result;

use crate::resolver::SourceFragment;

/// Saída de compilação já carregada e consultável.
///
/// Os métodos de PC recebem o nome curto do contrato e `deploy` para
/// escolher entre o código de deploy e o de runtime.
pub trait CompiledArtifact {
    /// Modelo de contratos construído a partir das ASTs
    fn model(&self) -> &ContractModel;

    /// Índice de PCs memorizado por `(contrato, deploy)`
    fn pc_index(&self, contract: &str, deploy: bool) -> Result<Arc<PcIndex>>;

    /// Fragmento de fonte do PC; `Ok(None)` se o PC não existe no código
    fn source_by_pc(&self, contract: &str, pc: usize, deploy: bool) -> Result<Option<SourceFragment>>;

    /// Literais do contrato, deduplicados por (valor, subtipo)
    fn literals(&self, contract: &str) -> Result<LiteralSet>;

    fn literal_values(&self, contract: &str) -> Result<LiteralValues> {
        Ok(LiteralValues::from(&self.literals(contract)?))
    }

    fn all_pcs(&self, contract: &str, deploy: bool) -> Result<BTreeSet<usize>> {
        Ok(self.pc_index(contract, deploy)?.pcs())
    }

    /// Destinos de JUMPI e PCs de fallthrough
    fn all_jumps(&self, contract: &str, deploy: bool) -> Result<BTreeSet<usize>> {
        Ok(self.pc_index(contract, deploy)?.jump_targets().clone())
    }

    fn pc2opcode(&self, contract: &str, deploy: bool) -> Result<BTreeMap<usize, String>> {
        Ok(self.pc_index(contract, deploy)?.pc2opcode())
    }

    fn opcode2pcs(&self, contract: &str, deploy: bool) -> Result<BTreeMap<String, BTreeSet<usize>>> {
        Ok(self.pc_index(contract, deploy)?.opcode2pcs())
    }

    /// Percentual dos PCs de runtime conhecidos presentes em `pcs`
    fn coverage<I>(&self, contract: &str, pcs: I) -> Result<f64>
    where
        I: IntoIterator<Item = usize>,
        Self: Sized,
    {
        let all = self.all_pcs(contract, false)?;
        if all.is_empty() {
            return Ok(0.0);
        }
        let covered = pcs.into_iter().collect::<BTreeSet<_>>();
        let hit = covered.intersection(&all).count();
        Ok(hit as f64 / all.len() as f64 * 100.0)
    }
}

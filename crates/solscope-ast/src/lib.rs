/*!
 * Solscope AST
 *
 * Adaptador de dialetos da AST, construção do modelo de contratos com
 * resolução de herança, localização de fontes e extração de literais
 */

pub mod node;
pub mod locator;
pub mod model;
pub mod builder;
pub mod query;
pub mod literal;

// Re-exportações públicas
pub use builder::{resolve_inheritance, signature, ModelBuilder, SourceUnit};
pub use literal::{Literal, LiteralClass, LiteralSet, LiteralValues};
pub use locator::{locate_in, Located, SourceFile, SourceLocator, STDIN_PATH, YUL_SOURCE_PATH};
pub use model::{
    ContractModel, ContractRecord, EventRecord, FieldRecord, FunctionRecord, ModifierRecord,
};
pub use node::{LegacyNode, ModernNode, NodeView, ParameterTypes, SourceUnitAst};
pub use query::{FieldQuery, FunctionQuery};

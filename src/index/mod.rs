pub mod gate;
pub mod manifest;
pub mod models;
pub mod sqlite;

use crate::error::Result;
pub use gate::IndexGate;
pub use manifest::Manifest;
pub use models::*;

/// The pre-built symbol index consumed by the resolution engine. Lookups
/// return fully hydrated declarations; ordering of the returned lists must be
/// reproducible for identical inputs.
pub trait SymbolIndex: Send + Sync {
    /// Declarations whose qualified name matches exactly, within scope.
    fn find_exact(&self, qualified_name: &str, scope: &Scope) -> Result<Vec<Declaration>>;

    /// Declarations whose short name matches, regardless of qualification,
    /// within scope.
    fn find_by_short_name(&self, short_name: &str, scope: &Scope) -> Result<Vec<Declaration>>;

    /// Fetch by row id; used to follow source-mapped links.
    fn declaration_by_id(&self, id: i64) -> Result<Option<Declaration>>;

    fn get_stats(&self) -> Result<IndexStats>;
}

pub mod classpath;
pub mod documents;
pub mod error;
pub mod index;
pub mod resolve;

pub use classpath::ClasspathLayout;
pub use documents::{DocumentStore, LineDocument};
pub use error::{LookupError, Result};
pub use index::sqlite::SqliteIndex;
pub use index::{
    Declaration, FieldDecl, IndexGate, IndexStats, Manifest, MethodDecl, ModuleDef, RootDef,
    Scope, SymbolIndex, TextRange,
};
pub use resolve::{
    Candidate, LookupQuery, LookupResult, LookupStatus, Origin, ResolvedKind, Resolver, Snippet,
};

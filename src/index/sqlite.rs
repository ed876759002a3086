use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LookupError, Result};
use crate::index::manifest::Manifest;
use crate::index::models::{
    Declaration, FieldDecl, IndexStats, MethodDecl, ModuleDef, RootDef, Scope, TextRange,
};
use crate::index::SymbolIndex;

pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::configure_pragmas(&conn)?;
        let index = Self {
            conn: Mutex::new(conn),
        };
        index.init_schema()?;
        Ok(index)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_pragmas(&conn)?;
        let index = Self {
            conn: Mutex::new(conn),
        };
        index.init_schema()?;
        Ok(index)
    }

    /// WAL keeps concurrent readers unblocked while a manifest load writes.
    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS modules (
                name TEXT PRIMARY KEY,
                deps TEXT NOT NULL DEFAULT '[]'
            );
            CREATE TABLE IF NOT EXISTS roots (
                id INTEGER PRIMARY KEY,
                module TEXT,
                label TEXT NOT NULL,
                path TEXT NOT NULL,
                archive INTEGER NOT NULL DEFAULT 0,
                ord INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS declarations (
                id INTEGER PRIMARY KEY,
                qualified_name TEXT NOT NULL,
                short_name TEXT NOT NULL,
                file_uri TEXT NOT NULL,
                module TEXT,
                compiled INTEGER NOT NULL DEFAULT 0,
                source_mapped_id INTEGER,
                start_offset INTEGER,
                end_offset INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_declarations_qname
                ON declarations(qualified_name);
            CREATE INDEX IF NOT EXISTS idx_declarations_short
                ON declarations(short_name);
            CREATE TABLE IF NOT EXISTS methods (
                id INTEGER PRIMARY KEY,
                decl_id INTEGER NOT NULL REFERENCES declarations(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                param_types TEXT NOT NULL DEFAULT '[]',
                inherited INTEGER NOT NULL DEFAULT 0,
                start_offset INTEGER,
                end_offset INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_methods_decl ON methods(decl_id);
            CREATE TABLE IF NOT EXISTS fields (
                id INTEGER PRIMARY KEY,
                decl_id INTEGER NOT NULL REFERENCES declarations(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                start_offset INTEGER,
                end_offset INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_fields_decl ON fields(decl_id);
            "#,
        )?;
        Ok(())
    }

    /// Replaces the entire store content with the manifest. Source-mapped
    /// references are resolved to row ids in a second pass; a dangling
    /// reference fails the load.
    pub fn load_manifest(&self, manifest: &Manifest) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute_batch(
            "DELETE FROM fields; DELETE FROM methods; DELETE FROM declarations;
             DELETE FROM roots; DELETE FROM modules;",
        )?;

        for module in &manifest.modules {
            let deps = serde_json::to_string(&module.deps)
                .map_err(|e| LookupError::Manifest(e.to_string()))?;
            tx.execute(
                "INSERT INTO modules (name, deps) VALUES (?1, ?2)",
                params![module.name, deps],
            )?;
        }

        for (ord, root) in manifest.roots.iter().enumerate() {
            tx.execute(
                "INSERT INTO roots (module, label, path, archive, ord)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![root.module, root.label, root.path, root.archive, ord as i64],
            )?;
        }

        // Keyed by (qualified name, file URI) for the link pass.
        let mut ids: HashMap<(String, String), i64> = HashMap::new();
        for entry in &manifest.declarations {
            let short = match entry.qualified_name.rfind('.') {
                Some(idx) => &entry.qualified_name[idx + 1..],
                None => entry.qualified_name.as_str(),
            };
            tx.execute(
                "INSERT INTO declarations
                 (qualified_name, short_name, file_uri, module, compiled, start_offset, end_offset)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.qualified_name,
                    short,
                    entry.file_uri,
                    entry.module,
                    entry.compiled,
                    entry.range.map(|r| r.start as i64),
                    entry.range.map(|r| r.end as i64),
                ],
            )?;
            let decl_id = tx.last_insert_rowid();
            ids.insert(
                (entry.qualified_name.clone(), entry.file_uri.clone()),
                decl_id,
            );

            for method in &entry.methods {
                let types = serde_json::to_string(&method.param_types)
                    .map_err(|e| LookupError::Manifest(e.to_string()))?;
                tx.execute(
                    "INSERT INTO methods
                     (decl_id, name, param_types, inherited, start_offset, end_offset)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        decl_id,
                        method.name,
                        types,
                        method.inherited,
                        method.range.map(|r| r.start as i64),
                        method.range.map(|r| r.end as i64),
                    ],
                )?;
            }
            for field in &entry.fields {
                tx.execute(
                    "INSERT INTO fields (decl_id, name, start_offset, end_offset)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        decl_id,
                        field.name,
                        field.range.map(|r| r.start as i64),
                        field.range.map(|r| r.end as i64),
                    ],
                )?;
            }
        }

        for entry in &manifest.declarations {
            let Some(mapped_uri) = &entry.source_mapped_uri else {
                continue;
            };
            let own = ids[&(entry.qualified_name.clone(), entry.file_uri.clone())];
            let mapped = ids
                .get(&(entry.qualified_name.clone(), mapped_uri.clone()))
                .copied()
                .ok_or_else(|| {
                    LookupError::Manifest(format!(
                        "source_mapped_uri {} of {} does not name a declaration",
                        mapped_uri, entry.qualified_name
                    ))
                })?;
            tx.execute(
                "UPDATE declarations SET source_mapped_id = ?1 WHERE id = ?2",
                params![mapped, own],
            )?;
        }

        tx.commit()?;
        Ok(manifest.declarations.len())
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "DELETE FROM fields; DELETE FROM methods; DELETE FROM declarations;
             DELETE FROM roots; DELETE FROM modules;",
        )?;
        Ok(())
    }

    /// Module definitions, for the classpath layout.
    pub fn modules(&self) -> Result<Vec<ModuleDef>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name, deps FROM modules ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let deps: String = row.get(1)?;
            Ok((name, deps))
        })?;
        let mut modules = Vec::new();
        for row in rows {
            let (name, deps) = row?;
            let deps: Vec<String> = serde_json::from_str(&deps)
                .map_err(|e| LookupError::Index(e.to_string()))?;
            modules.push(ModuleDef { name, deps });
        }
        Ok(modules)
    }

    /// Classpath roots in declaration order.
    pub fn roots(&self) -> Result<Vec<RootDef>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT module, label, path, archive FROM roots ORDER BY ord")?;
        let rows = stmt.query_map([], |row| {
            Ok(RootDef {
                module: row.get(0)?,
                label: row.get(1)?,
                path: row.get(2)?,
                archive: row.get(3)?,
            })
        })?;
        let mut roots = Vec::new();
        for row in rows {
            roots.push(row?);
        }
        Ok(roots)
    }

    /// Module names visible from `scope`, or None when the scope is
    /// unrestricted. An unknown module degrades to project scope.
    fn scope_modules(conn: &Connection, scope: &Scope) -> Result<Option<HashSet<String>>> {
        let Scope::Module(name) = scope else {
            return Ok(None);
        };
        let mut stmt = conn.prepare("SELECT name, deps FROM modules")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let deps: String = row.get(1)?;
            Ok((name, deps))
        })?;
        let mut graph: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (module, deps) = row?;
            let deps: Vec<String> = serde_json::from_str(&deps)
                .map_err(|e| LookupError::Index(e.to_string()))?;
            graph.insert(module, deps);
        }
        if !graph.contains_key(name) {
            return Ok(None);
        }
        let mut visible = HashSet::new();
        let mut queue = vec![name.clone()];
        while let Some(module) = queue.pop() {
            if !visible.insert(module.clone()) {
                continue;
            }
            if let Some(deps) = graph.get(&module) {
                queue.extend(deps.iter().cloned());
            }
        }
        Ok(Some(visible))
    }

    fn in_scope(decl_module: Option<&str>, visible: Option<&HashSet<String>>) -> bool {
        match (decl_module, visible) {
            // Library declarations carry no module and stay visible to
            // every scope.
            (None, _) => true,
            (Some(_), None) => true,
            (Some(module), Some(set)) => set.contains(module),
        }
    }

    fn hydrate(conn: &Connection, decl_id: i64) -> Result<Option<Declaration>> {
        let row = conn
            .query_row(
                "SELECT id, qualified_name, file_uri, module, compiled, source_mapped_id,
                        start_offset, end_offset
                 FROM declarations WHERE id = ?1",
                params![decl_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, bool>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                        row.get::<_, Option<i64>>(7)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, qualified_name, file_uri, module, compiled, mapped, start, end)) = row
        else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT name, param_types, inherited, start_offset, end_offset
             FROM methods WHERE decl_id = ?1 ORDER BY id",
        )?;
        let method_rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?;
        let mut methods = Vec::new();
        for row in method_rows {
            let (name, types, inherited, m_start, m_end) = row?;
            let param_types: Vec<String> = serde_json::from_str(&types)
                .map_err(|e| LookupError::Index(e.to_string()))?;
            methods.push(MethodDecl {
                name,
                param_types,
                inherited,
                range: range_of(m_start, m_end),
            });
        }

        let mut stmt = conn.prepare(
            "SELECT name, start_offset, end_offset FROM fields WHERE decl_id = ?1 ORDER BY id",
        )?;
        let field_rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;
        let mut fields = Vec::new();
        for row in field_rows {
            let (name, f_start, f_end) = row?;
            fields.push(FieldDecl {
                name,
                range: range_of(f_start, f_end),
            });
        }

        Ok(Some(Declaration {
            id,
            qualified_name,
            file_uri,
            module,
            compiled,
            source_mapped_id: mapped,
            range: range_of(start, end),
            methods,
            fields,
        }))
    }

    fn find_by_column(&self, column: &str, value: &str, scope: &Scope) -> Result<Vec<Declaration>> {
        let conn = self.conn.lock().unwrap();
        let visible = Self::scope_modules(&conn, scope)?;
        // Ordered by id so identical queries always see the same base order.
        let sql = format!("SELECT id FROM declarations WHERE {} = ?1 ORDER BY id", column);
        let mut stmt = conn.prepare(&sql)?;
        let id_rows = stmt.query_map(params![value], |row| row.get::<_, i64>(0))?;
        let mut declarations = Vec::new();
        for id in id_rows {
            if let Some(decl) = Self::hydrate(&conn, id?)? {
                if Self::in_scope(decl.module.as_deref(), visible.as_ref()) {
                    declarations.push(decl);
                }
            }
        }
        Ok(declarations)
    }
}

fn range_of(start: Option<i64>, end: Option<i64>) -> Option<TextRange> {
    match (start, end) {
        (Some(start), Some(end)) => Some(TextRange::new(start as usize, end as usize)),
        _ => None,
    }
}

impl SymbolIndex for SqliteIndex {
    fn find_exact(&self, qualified_name: &str, scope: &Scope) -> Result<Vec<Declaration>> {
        self.find_by_column("qualified_name", qualified_name, scope)
    }

    fn find_by_short_name(&self, short_name: &str, scope: &Scope) -> Result<Vec<Declaration>> {
        self.find_by_column("short_name", short_name, scope)
    }

    fn declaration_by_id(&self, id: i64) -> Result<Option<Declaration>> {
        let conn = self.conn.lock().unwrap();
        Self::hydrate(&conn, id)
    }

    fn get_stats(&self) -> Result<IndexStats> {
        let conn = self.conn.lock().unwrap();
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };
        Ok(IndexStats {
            declarations: count("declarations")?,
            methods: count("methods")?,
            fields: count("fields")?,
            modules: count("modules")?,
            roots: count("roots")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(manifest_json: &str) -> SqliteIndex {
        let index = SqliteIndex::in_memory().expect("in-memory index");
        let manifest = Manifest::from_json(manifest_json).expect("manifest");
        index.load_manifest(&manifest).expect("load");
        index
    }

    const TWO_COPIES: &str = r#"{
        "modules": [
            {"name": "app", "deps": ["core"]},
            {"name": "core", "deps": []},
            {"name": "other", "deps": []}
        ],
        "declarations": [
            {
                "qualified_name": "com.acme.Widget",
                "file_uri": "file:///p/core/src/com/acme/Widget.java",
                "module": "core"
            },
            {
                "qualified_name": "com.acme.Widget",
                "file_uri": "jar:///libs/acme.jar!/com/acme/Widget.class",
                "compiled": true
            },
            {
                "qualified_name": "com.other.Widget",
                "file_uri": "file:///p/other/src/com/other/Widget.java",
                "module": "other"
            }
        ]
    }"#;

    #[test]
    fn test_find_exact_scoped() {
        let index = index_with(TWO_COPIES);

        let all = index
            .find_exact("com.acme.Widget", &Scope::Project)
            .unwrap();
        assert_eq!(all.len(), 2);

        // `app` depends on `core`, so both the source copy and the
        // module-less jar copy stay visible.
        let scoped = index
            .find_exact("com.acme.Widget", &Scope::Module("app".to_string()))
            .unwrap();
        assert_eq!(scoped.len(), 2);

        // `other` sees only the library copy.
        let other = index
            .find_exact("com.acme.Widget", &Scope::Module("other".to_string()))
            .unwrap();
        assert_eq!(other.len(), 1);
        assert!(other[0].compiled);
    }

    #[test]
    fn test_find_by_short_name_across_packages() {
        let index = index_with(TWO_COPIES);
        let found = index.find_by_short_name("Widget", &Scope::Project).unwrap();
        assert_eq!(found.len(), 3);
        // Base order follows insertion order.
        assert_eq!(found[0].module.as_deref(), Some("core"));
    }

    #[test]
    fn test_unknown_module_degrades_to_project_scope() {
        let index = index_with(TWO_COPIES);
        let found = index
            .find_exact("com.acme.Widget", &Scope::Module("missing".to_string()))
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_source_mapped_link_resolution() {
        let index = index_with(
            r#"{
                "declarations": [
                    {
                        "qualified_name": "com.acme.Widget",
                        "file_uri": "jar:///libs/acme.jar!/com/acme/Widget.class",
                        "compiled": true,
                        "source_mapped_uri": "jar:///libs/acme-sources.jar!/com/acme/Widget.java"
                    },
                    {
                        "qualified_name": "com.acme.Widget",
                        "file_uri": "jar:///libs/acme-sources.jar!/com/acme/Widget.java"
                    }
                ]
            }"#,
        );
        let compiled = index
            .find_exact("com.acme.Widget", &Scope::Project)
            .unwrap()
            .into_iter()
            .find(|d| d.compiled)
            .unwrap();
        let mapped = index
            .declaration_by_id(compiled.source_mapped_id.unwrap())
            .unwrap()
            .unwrap();
        assert!(!mapped.compiled);
        assert!(mapped.file_uri.contains("acme-sources"));
    }

    #[test]
    fn test_dangling_source_mapped_fails_load() {
        let index = SqliteIndex::in_memory().unwrap();
        let manifest = Manifest::from_json(
            r#"{
                "declarations": [{
                    "qualified_name": "A",
                    "file_uri": "file:///a.class",
                    "source_mapped_uri": "file:///missing.java"
                }]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            index.load_manifest(&manifest),
            Err(LookupError::Manifest(_))
        ));
    }

    #[test]
    fn test_stats_and_clear() {
        let index = index_with(TWO_COPIES);
        let stats = index.get_stats().unwrap();
        assert_eq!(stats.declarations, 3);
        assert_eq!(stats.modules, 3);

        index.clear().unwrap();
        let stats = index.get_stats().unwrap();
        assert_eq!(stats.declarations, 0);
    }
}

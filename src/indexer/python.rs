use anyhow::Result;
use std::path::Path;
use tracing::warn;
use tree_sitter::{Node, Parser, Tree};

/// Python 2 statements the grammar still accepts but Python 3 rejects.
const LEGACY_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

pub struct PythonExtractor {
    parser: Parser,
}

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self { parser })
    }

    /// Module paths imported by `source`, in textual order, duplicates kept.
    ///
    /// `import a.b as c` yields `a.b`; `from a.b import x, y` yields `a.b` once.
    /// Source that does not parse cleanly yields nothing.
    pub fn extract_imports(&mut self, source: &str) -> Vec<String> {
        self.parse_imports(source).unwrap_or_default()
    }

    /// Like `extract_imports`, but `None` when the source is not valid Python 3.
    pub fn parse_imports(&mut self, source: &str) -> Option<Vec<String>> {
        let tree = self.parse_clean(source)?;
        let mut imports = Vec::new();
        walk_node(tree.root_node(), source, &mut imports);
        Some(imports)
    }

    pub fn is_well_formed(&mut self, source: &str) -> bool {
        self.parse_clean(source).is_some()
    }

    fn parse_clean(&mut self, source: &str) -> Option<Tree> {
        let tree = self.parser.parse(source, None)?;
        let root = tree.root_node();
        if root.has_error() || contains_kind(root, LEGACY_STATEMENTS) {
            return None;
        }
        Some(tree)
    }
}

fn contains_kind(node: Node<'_>, kinds: &[&str]) -> bool {
    if kinds.contains(&node.kind()) {
        return true;
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .any(|child| contains_kind(child, kinds))
}

/// One-shot import extraction; builds a parser per call.
pub fn extract_imports(source: &str) -> Vec<String> {
    match PythonExtractor::new() {
        Ok(mut extractor) => extractor.extract_imports(source),
        Err(err) => {
            warn!(error = %err, "python grammar unavailable, skipping import extraction");
            Vec::new()
        }
    }
}

pub fn module_name_from_rel_path(rel_path: &str) -> String {
    let normalized = rel_path.replace('\\', "/");
    let mut parts: Vec<&str> = normalized
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    let Some(file) = parts.pop() else {
        return "__init__".to_string();
    };
    let stem = Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file);
    let mut module: Vec<&str> = parts;
    if stem != "__init__" {
        module.push(stem);
    }
    if module.is_empty() {
        "__init__".to_string()
    } else {
        module.join(".")
    }
}

fn walk_node(node: Node<'_>, source: &str, imports: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            collect_plain_imports(node, source, imports);
            return;
        }
        "import_from_statement" => {
            if let Some(module) = from_module(node, source) {
                imports.push(module);
            }
            return;
        }
        "future_import_statement" => {
            imports.push("__future__".to_string());
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_node(child, source, imports);
    }
}

fn collect_plain_imports(node: Node<'_>, source: &str, imports: &mut Vec<String>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let target = match name.kind() {
            "aliased_import" => name.child_by_field_name("name"),
            _ => Some(name),
        };
        if let Some(target) = target {
            let module = dotted_text(target, source);
            if !module.is_empty() {
                imports.push(module);
            }
        }
    }
}

// Relative prefixes are dropped; `from . import x` has no module path.
fn from_module(node: Node<'_>, source: &str) -> Option<String> {
    let module = node.child_by_field_name("module_name")?;
    let text = dotted_text(module, source);
    let text = text.trim_start_matches('.');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn dotted_text(node: Node<'_>, source: &str) -> String {
    node_text(node, source)
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '\\')
        .collect()
}

fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

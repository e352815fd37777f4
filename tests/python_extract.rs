use prisk::indexer::python::{PythonExtractor, extract_imports, module_name_from_rel_path};

#[test]
fn module_name_from_path() {
    assert_eq!(module_name_from_rel_path("foo.py"), "foo");
    assert_eq!(module_name_from_rel_path("pkg/__init__.py"), "pkg");
    assert_eq!(module_name_from_rel_path("pkg/sub/mod.py"), "pkg.sub.mod");
}

#[test]
fn extract_imports_in_textual_order() {
    let source = r#"
"""module doc"""
from __future__ import annotations
import os, sys as system
from pkg import mod, util as u

class Service:
    import json

    def handle(self):
        from billing.core import charge
        import os
        return charge()

try:
    import ujson as json
except ImportError:
    import json
"#;
    let mut extractor = PythonExtractor::new().unwrap();
    let imports = extractor.extract_imports(source);
    assert_eq!(
        imports,
        vec![
            "__future__",
            "os",
            "sys",
            "pkg",
            "json",
            "billing.core",
            "os",
            "ujson",
            "json",
        ]
    );
}

#[test]
fn multiline_parenthesized_from_import() {
    let source = "from a.b import (\n    x,\n    y,\n)\nimport c.d\n";
    assert_eq!(extract_imports(source), vec!["a.b", "c.d"]);
}

#[test]
fn no_false_positives_from_text() {
    let source = r#"
# import commented_out
MESSAGE = "import not_a_module"
DOC = """
from fake import thing
"""
def f():
    return "from x import y"
"#;
    assert!(extract_imports(source).is_empty());
}

#[test]
fn malformed_source_is_empty_not_error() {
    for source in [
        "import",
        "from import x",
        "def f(:\n  pass",
        "import os\nclass :\n",
        "import os\nprint 'hi'\n",
        "import os\nexec 'x=1'\n",
    ] {
        assert!(extract_imports(source).is_empty(), "source: {source:?}");
    }
}

#[test]
fn python3_syntax_is_accepted() {
    let source = "import os\n\
match os.name:\n    case 'nt':\n        pass\n    case _:\n        pass\n\
print(f\"{os.sep!r}\")\n";
    assert_eq!(extract_imports(source), vec!["os"]);
}

#[test]
fn extractor_is_reusable_after_error() {
    let mut extractor = PythonExtractor::new().unwrap();
    assert!(extractor.extract_imports("def (").is_empty());
    assert_eq!(extractor.extract_imports("import ok"), vec!["ok"]);
}

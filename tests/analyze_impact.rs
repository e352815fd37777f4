use prisk::advisor::ALL_TESTED_NOTE;
use prisk::config::Config;
use prisk::impact::{ImpactPolicy, ImpactSettings, resolve_impact_with};
use prisk::model::{ChangeSet, FileMap, RiskLevel};
use prisk::{Analyzer, analyze, build_context, resolve_impact, score_risk, suggest_tests};

fn files(entries: &[(&str, &str)]) -> FileMap {
    entries
        .iter()
        .map(|(path, source)| (path.to_string(), source.to_string()))
        .collect()
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn billing_change_scores_keyword_weight() {
    let files = files(&[("billing/pay.py", "import os\ndef charge(): pass")]);
    let changed = paths(&["billing/pay.py"]);

    let context = build_context(&files);
    assert_eq!(context.imports_of("billing/pay.py"), ["os"]);

    let impacted = resolve_impact(&changed, &context);
    assert_eq!(impacted.as_slice(), ["billing/pay.py"]);

    let risk = score_risk(&impacted);
    assert_eq!(risk.score, 4);

    let suggestions = suggest_tests(&impacted, &files);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(
        suggestions["billing/pay.py"],
        vec!["Add test for `charge` function in `billing/pay.py`"]
    );
}

#[test]
fn fully_tested_module_gets_review_note() {
    let files = files(&[(
        "utils/math.py",
        "def add(a,b): return a+b\ndef test_add(): assert add(1,1)==2",
    )]);
    let report = analyze(&paths(&["utils/math.py"]), &files);
    assert_eq!(report.risk.score, 2);
    assert_eq!(report.risk_level, RiskLevel::Low);
    assert_eq!(report.suggestions["utils/math.py"], vec![ALL_TESTED_NOTE]);
}

#[test]
fn companion_test_file_covers_module() {
    let files = files(&[
        ("utils/math.py", "def add(a, b): return a + b
def mul(a, b): return a * b
"),
        ("tests/test_math.py", "from utils.math import add
def test_add(): assert add(1, 1) == 2
"),
    ]);
    let report = analyze(&paths(&["utils/math.py", "tests/test_math.py"]), &files);
    assert_eq!(
        report.suggestions["utils/math.py"],
        vec!["Add test for `mul` function in `utils/math.py`"]
    );
    assert_eq!(report.suggestions["tests/test_math.py"], vec![ALL_TESTED_NOTE]);
}

#[test]
fn only_test_functions_gets_review_note() {
    let files = files(&[("utils/math.py", "def test_add():\n    assert 1 + 1 == 2\n")]);
    let report = analyze(&paths(&["utils/math.py"]), &files);
    assert_eq!(report.risk.score, 2);
    assert_eq!(report.suggestions["utils/math.py"], vec![ALL_TESTED_NOTE]);
}

#[test]
fn empty_change_set() {
    let report = analyze(&[], &FileMap::new());
    assert!(report.impacted.is_empty());
    assert_eq!(report.risk.score, 1);
    assert!(report.risk.reason.ends_with("0 modules"));
    assert!(report.suggestions.is_empty());
    assert!(report.context.dependencies.is_empty());
    assert!(report.context.test_coverage_hints.is_empty());
}

#[test]
fn broken_file_does_not_abort_batch() {
    let files = files(&[
        ("broken.py", "import os\ndef broken(:\n    return\n"),
        ("ok.py", "import json\ndef load(): pass\n"),
    ]);
    let report = analyze(&paths(&["broken.py", "ok.py"]), &files);

    assert!(report.context.dependencies["broken.py"].is_empty());
    assert_eq!(report.context.dependencies["ok.py"], vec!["json"]);
    assert_eq!(report.suggestions["broken.py"], vec![ALL_TESTED_NOTE]);
    assert_eq!(
        report.suggestions["ok.py"],
        vec!["Add test for `load` function in `ok.py`"]
    );
    assert_eq!(report.risk.score, 3);
}

#[test]
fn changed_path_without_content() {
    let report = analyze(&paths(&["deleted_upstream.py"]), &FileMap::new());
    assert_eq!(report.impacted.as_slice(), ["deleted_upstream.py"]);
    assert_eq!(report.risk.score, 2);
    assert_eq!(
        report.suggestions["deleted_upstream.py"],
        vec![ALL_TESTED_NOTE]
    );
    assert!(!report.context.contains("deleted_upstream.py"));
}

#[test]
fn full_pipeline_is_deterministic() {
    let files = files(&[
        ("auth/login.py", "import hashlib\nfrom auth.tokens import issue\ndef login(): pass\n"),
        ("auth/tokens.py", "import secrets\ndef issue(): pass\ndef test_issue(): pass\n"),
        ("views.py", "from auth.login import login\ndef index(): pass\n"),
    ]);
    let changed = paths(&["auth/tokens.py", "views.py"]);
    let first = serde_json::to_string(&analyze(&changed, &files)).unwrap();
    let second = serde_json::to_string(&analyze(&changed, &files)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn transitive_extension_follows_importers() {
    let files = files(&[
        ("payments/gateway.py", "import requests\ndef submit(): pass\n"),
        ("orders/checkout.py", "from payments.gateway import submit\ndef checkout(): pass\n"),
        ("web/routes.py", "import orders.checkout\ndef route(): pass\n"),
        ("unrelated.py", "import os\n"),
    ]);
    let context = build_context(&files);
    let changed = paths(&["payments/gateway.py"]);

    let baseline = resolve_impact(&changed, &context);
    assert_eq!(baseline.as_slice(), ["payments/gateway.py"]);

    let one_hop = resolve_impact_with(
        &changed,
        &context,
        ImpactPolicy::Transitive {
            max_depth: 1,
            include_tests: false,
        },
    );
    assert_eq!(one_hop.as_slice(), ["payments/gateway.py", "orders/checkout.py"]);

    let config = Config {
        impact: ImpactSettings::transitive(5),
        ..Config::default()
    };
    let report = Analyzer::new(config)
        .unwrap()
        .analyze(&ChangeSet::new(changed, files));
    assert_eq!(
        report.impacted.as_slice(),
        ["payments/gateway.py", "orders/checkout.py", "web/routes.py"]
    );
    assert!(!report.trace.truncated);
    assert_eq!(report.risk.score, 6);
    assert_eq!(report.suggestions.len(), 3);
}

#[test]
fn report_serializes_plain_structures() {
    let files = files(&[("billing/pay.py", "import os\ndef charge(): pass")]);
    let report = analyze(&paths(&["billing/pay.py"]), &files);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["impacted"], serde_json::json!(["billing/pay.py"]));
    assert_eq!(value["risk"]["score"], 4);
    assert_eq!(
        value["risk"]["reason"],
        "Risk score 4/10 due to changes in 1 modules"
    );
    assert_eq!(value["risk_level"], "medium");
    assert_eq!(
        value["context"]["test_coverage"]["billing/pay.py"],
        serde_json::json!(["tests/test_pay.py"])
    );
    assert_eq!(
        value["critical"]["billing/pay.py"],
        serde_json::json!(["billing"])
    );
}

//! Printer round-trip tests: parse a file, link it alone, print it back.

use baler_common::{LineMap, Log};
use baler_emitter::printer::{PrintOptions, print_stmts};
use baler_linker::graph::{File, FileGraph, Source};
use baler_linker::{LinkOptions, link};
use baler_parser::{ParseOptions, parse_module};

const RUNTIME: &str = r#"
export var __commonJS = (callback, module) => () => {
  if (!module) {
    module = { exports: {} };
    callback(module.exports, module);
  }
  return module.exports;
};
export var __toModule = (module) => {
  if (module && module.__esModule) {
    return module;
  }
  var result = { default: module };
  for (var key in module) {
    result[key] = module[key];
  }
  return result;
};
export var __export = (target, all) => {
  for (var name in all) {
    Object.defineProperty(target, name, { get: all[name], enumerable: true });
  }
};
"#;

/// Print a single standalone module without bundling transforms.
fn print_source(contents: &str, remove_whitespace: bool) -> String {
    let mut log = Log::new();
    let options = ParseOptions::default();

    let runtime = parse_module(0, "<runtime>", RUNTIME, &options, &mut log);
    let module = parse_module(1, "/entry.js", contents, &options, &mut log);
    assert!(!log.has_errors(), "parse errors: {:?}", log.msgs());

    let sources = vec![
        Source {
            index: 0,
            abs_path: "<runtime>".to_string(),
            pretty_path: "<runtime>".to_string(),
            contents: RUNTIME.to_string(),
        },
        Source {
            index: 1,
            abs_path: "/entry.js".to_string(),
            pretty_path: "/entry.js".to_string(),
            contents: contents.to_string(),
        },
    ];
    let files = vec![
        File { module: runtime, resolved_imports: Default::default() },
        File { module, resolved_imports: Default::default() },
    ];
    let mut graph = FileGraph::new(&sources, &files, vec![1]);

    // Pass-through link: no bundling transforms, no minification.
    let link_options = LinkOptions {
        is_bundling: false,
        tree_shaking: false,
        minify_identifiers: false,
        include_entry_namespace: false,
        known_extensions: vec![".js".to_string()],
    };
    let result = link(&mut graph, &link_options, &mut log);

    let stmts: Vec<_> = graph.files[1]
        .module
        .parts
        .iter()
        .flat_map(|p| p.stmts.iter().cloned())
        .collect();
    let line_map = LineMap::build(contents);
    let printed = print_stmts(
        &stmts,
        &graph.symbols,
        &result.renamer,
        &graph.files[1].module.import_records,
        &line_map,
        &PrintOptions { remove_whitespace },
    );
    printed.code
}

#[test]
fn prints_declarations() {
    let code = print_source("const x = 1;\nlet y = [1, 2, 3];\n", false);
    assert_eq!(code, "const x = 1;\nlet y = [1, 2, 3];\n");
}

#[test]
fn prints_functions_and_calls() {
    let code = print_source("function add(a, b) {\n  return a + b;\n}\nconsole.log(add(1, 2));\n", false);
    assert_eq!(
        code,
        "function add(a, b) {\n  return a + b;\n}\nconsole.log(add(1, 2));\n"
    );
}

#[test]
fn prints_nested_control_flow() {
    let code = print_source(
        "function f(n) {\n  if (n > 1) {\n    return n * f(n - 1);\n  }\n  return 1;\n}\n",
        false,
    );
    assert_eq!(
        code,
        "function f(n) {\n  if (n > 1) {\n    return n * f(n - 1);\n  }\n  return 1;\n}\n"
    );
}

#[test]
fn respects_operator_precedence_with_parens() {
    let code = print_source("const v = (1 + 2) * 3;\n", false);
    assert_eq!(code, "const v = (1 + 2) * 3;\n");
}

#[test]
fn drops_redundant_parens() {
    let code = print_source("const v = (1 * 2) + 3;\n", false);
    assert_eq!(code, "const v = 1 * 2 + 3;\n");
}

#[test]
fn string_escapes_round_trip() {
    let code = print_source("const s = 'a\"b\\n';\n", false);
    assert_eq!(code, "const s = \"a\\\"b\\n\";\n");
}

#[test]
fn template_literals_round_trip() {
    let code = print_source("const t = `a${1 + 2}b`;\n", false);
    assert_eq!(code, "const t = `a${1 + 2}b`;\n");
}

#[test]
fn objects_arrays_and_arrows() {
    let code = print_source("const f = (a, b) => ({ x: a, y: [b], z: () => 1 });\n", false);
    assert_eq!(code, "const f = (a, b) => ({ x: a, y: [b], z: () => 1 });\n");
}

#[test]
fn whitespace_removal_stays_parseable() {
    let code = print_source(
        "function add(a, b) {\n  return a + b;\n}\nconst r = add(1, 2);\n",
        true,
    );
    assert_eq!(code, "function add(a,b){return a+b;}const r=add(1,2);");
}

#[test]
fn classes_print_with_members() {
    let code = print_source(
        "class Point {\n  scale(f) {\n    return new Point(this.x * f);\n  }\n}\n",
        false,
    );
    assert_eq!(
        code,
        "class Point {\n  scale(f) {\n    return new Point(this.x * f);\n  }\n}\n"
    );
}

#[test]
fn for_loops_round_trip() {
    let code = print_source("for (let i = 0; i < 3; i++) {\n  console.log(i);\n}\n", false);
    assert_eq!(code, "for (let i = 0; i < 3; i++) {\n  console.log(i);\n}\n");
}

#[test]
fn mappings_point_at_statement_starts() {
    let contents = "const x = 1;\nconst y = 2;\n";
    let mut log = Log::new();
    let options = ParseOptions::default();
    let runtime = parse_module(0, "<runtime>", RUNTIME, &options, &mut log);
    let module = parse_module(1, "/entry.js", contents, &options, &mut log);
    let sources = vec![
        Source {
            index: 0,
            abs_path: "<runtime>".to_string(),
            pretty_path: "<runtime>".to_string(),
            contents: RUNTIME.to_string(),
        },
        Source {
            index: 1,
            abs_path: "/entry.js".to_string(),
            pretty_path: "/entry.js".to_string(),
            contents: contents.to_string(),
        },
    ];
    let files = vec![
        File { module: runtime, resolved_imports: Default::default() },
        File { module, resolved_imports: Default::default() },
    ];
    let mut graph = FileGraph::new(&sources, &files, vec![1]);
    let result = link(
        &mut graph,
        &LinkOptions {
            is_bundling: false,
            tree_shaking: false,
            minify_identifiers: false,
            include_entry_namespace: false,
            known_extensions: vec![],
        },
        &mut log,
    );

    let stmts: Vec<_> = graph.files[1]
        .module
        .parts
        .iter()
        .flat_map(|p| p.stmts.iter().cloned())
        .collect();
    let printed = print_stmts(
        &stmts,
        &graph.symbols,
        &result.renamer,
        &graph.files[1].module.import_records,
        &LineMap::build(contents),
        &PrintOptions::default(),
    );

    // Both statements map back to their own original lines.
    assert!(
        printed
            .mappings
            .iter()
            .any(|m| m.generated_line == 0 && m.original_line == 0)
    );
    assert!(
        printed
            .mappings
            .iter()
            .any(|m| m.generated_line == 1 && m.original_line == 1)
    );
}

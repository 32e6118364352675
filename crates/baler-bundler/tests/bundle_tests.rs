//! End-to-end bundling scenarios over an in-memory filesystem.

use baler_bundler::{Bundle, BundleOptions, Format, compile, scan};
use baler_common::Log;
use baler_resolver::MockFileSystem;

fn bundle(
    fixture: &[(&str, &str)],
    entries: &[&str],
    options: &BundleOptions,
) -> (Vec<baler_bundler::OutputFile>, Log) {
    let fs = MockFileSystem::new(fixture);
    let mut log = Log::new();
    let entry_paths: Vec<String> = entries.iter().map(|e| (*e).to_string()).collect();
    let bundle = scan(&fs, &entry_paths, options, &mut log);
    let outputs = compile(&bundle, options, &mut log);
    (outputs, log)
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.match_indices(needle).count()
}

#[test]
fn simple_es_module_bundle() {
    let options = BundleOptions {
        output_format: Format::Iife,
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import { fn } from './foo';\nconsole.log(fn());\n"),
            ("/foo.js", "export function fn() {\n  return 123;\n}\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    assert_eq!(outputs.len(), 1);

    let out = &outputs[0];
    assert_eq!(out.js_abs_path, "/out.js");
    let code = &out.js_bytes;

    // The export keyword is stripped, fn is defined once and called.
    assert_eq!(count_occurrences(code, "function fn()"), 1);
    assert!(code.contains("console.log(fn());"));
    assert!(!code.contains("export"));
    assert!(!code.contains("__commonJS"));

    // The origin comment precedes the declaration it introduces.
    let comment = code.find("// /foo.js").expect("foo comment");
    let decl = code.find("function fn()").expect("fn decl");
    assert!(comment < decl);
}

#[test]
fn commonjs_target_bound_via_require() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "const f = require('./foo');\nconsole.log(f());\n"),
            ("/foo.js", "module.exports = function() {\n  return 123;\n};\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    let code = &outputs[0].js_bytes;

    assert!(code.contains("var require_foo = __commonJS((exports, module) => {"));
    assert!(code.contains("module.exports = function()"));
    assert!(code.contains("const f = require_foo();"));
    assert!(code.contains("console.log(f());"));

    // The wrapper must be defined before its call site.
    let wrapper = code.find("var require_foo").expect("wrapper");
    let call = code.find("const f = require_foo()").expect("call");
    assert!(wrapper < call);
}

#[test]
fn export_star_ambiguity_is_reported_and_omitted() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/main.js", "import { x } from './entry';\nconsole.log(x);\n"),
            ("/entry.js", "export * from './a';\nexport * from './b';\n"),
            ("/a.js", "export const x = 1;\n"),
            ("/b.js", "export const x = 2;\n"),
        ],
        &["/main.js"],
        &options,
    );

    assert!(
        log.msgs()
            .iter()
            .any(|m| m.text == "Ambiguous import \"x\" has multiple matching exports")
    );
    // Emission still completes.
    assert_eq!(outputs.len(), 1);
    // The synthesized namespace object for /entry.js omits the ambiguous
    // alias: no getter is installed anywhere.
    assert!(!outputs[0].js_bytes.contains("x: () =>"));
}

#[test]
fn import_cycle_reports_each_alias_and_still_emits() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[(
            "/entry.js",
            "export { a as b } from './entry';\nexport { b as c } from './entry';\nexport { c as a } from './entry';\n",
        )],
        &["/entry.js"],
        &options,
    );

    let cycles: Vec<&str> = log
        .msgs()
        .iter()
        .filter(|m| m.text.starts_with("Detected cycle"))
        .map(|m| m.text.as_str())
        .collect();
    assert!(cycles.contains(&"Detected cycle while resolving import \"a\""));
    assert_eq!(cycles.len(), 3);
    assert_eq!(outputs.len(), 1);
}

#[test]
fn tree_shaking_drops_unused_export() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import { used } from './lib';\nconsole.log(used());\n"),
            (
                "/lib.js",
                "export function used() {\n  return 1;\n}\nexport function unused() {\n  return 2;\n}\n",
            ),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors());
    let code = &outputs[0].js_bytes;
    assert!(!code.contains("unused"));
    assert_eq!(count_occurrences(code, "function used()"), 1);
}

#[test]
fn multiple_entry_points_duplicate_shared_modules() {
    let options = BundleOptions {
        abs_output_dir: Some("/out".to_string()),
        ..BundleOptions::default()
    };
    let fixture = [
        ("/a.js", "import x from './shared';\nconsole.log('a', x);\n"),
        ("/b.js", "import x from './shared';\nconsole.log('b', x);\n"),
        ("/shared.js", "export default 123;\n"),
    ];
    let (outputs, log) = bundle(&fixture, &["/a.js", "/b.js"], &options);
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].js_abs_path, "/out/a.js");
    assert_eq!(outputs[1].js_abs_path, "/out/b.js");

    // No code splitting across entry points: each output carries its own
    // copy of the shared module's body.
    for output in &outputs {
        assert!(output.js_bytes.contains("123"));
        assert!(output.js_bytes.contains("shared_default"));
    }
    assert!(outputs[0].js_bytes.contains("console.log(\"a\""));
    assert!(outputs[1].js_bytes.contains("console.log(\"b\""));

    // Determinism: a fresh run produces byte-identical chunks.
    let (again, _) = bundle(&fixture, &["/a.js", "/b.js"], &options);
    for (first, second) in outputs.iter().zip(again.iter()) {
        assert_eq!(first.js_bytes, second.js_bytes);
    }
}

#[test]
fn dynamic_import_produces_second_chunk() {
    let options = BundleOptions {
        abs_output_dir: Some("/out".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/main.js", "import('./lazy').then(m => console.log(m.default));\n"),
            ("/lazy.js", "export default 7;\n"),
        ],
        &["/main.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());

    let paths: Vec<&str> = outputs.iter().map(|o| o.js_abs_path.as_str()).collect();
    assert!(paths.contains(&"/out/main.js"));
    assert!(paths.contains(&"/out/lazy.js"));

    // The dynamic target is wrapped like CommonJS and invoked in its own
    // chunk.
    let lazy = outputs
        .iter()
        .find(|o| o.js_abs_path == "/out/lazy.js")
        .expect("lazy chunk");
    assert!(lazy.js_bytes.contains("var require_lazy = __commonJS("));
    assert!(lazy.js_bytes.contains("require_lazy();"));
}

#[test]
fn namespace_import_uses_exports_object() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import * as lib from './lib';\nconsole.log(lib.one());\n"),
            ("/lib.js", "export function one() {\n  return 1;\n}\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    let code = &outputs[0].js_bytes;

    // The namespace object is synthesized with a getter per export and the
    // star import resolves to it.
    assert!(code.contains("const lib_exports = {};"));
    assert!(code.contains("__export(lib_exports, {"));
    assert!(code.contains("one: () => one"));
    assert!(code.contains("console.log(lib_exports.one());"));
}

#[test]
fn missing_export_prints_unresolved_alias() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import { ghost } from './lib';\nconsole.log(ghost);\n"),
            ("/lib.js", "export const real = 1;\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(
        log.msgs()
            .iter()
            .any(|m| m.text == "No matching export for import \"ghost\"")
    );
    // The binding is left dangling: the alias prints as-is.
    assert!(outputs[0].js_bytes.contains("console.log(ghost);"));
}

#[test]
fn unresolved_import_is_treated_as_external() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[("/entry.js", "import { readFile } from 'left-pad';\nreadFile('x');\n")],
        &["/entry.js"],
        &options,
    );
    assert!(
        log.msgs()
            .iter()
            .any(|m| m.text == "Could not resolve \"left-pad\"")
    );
    let code = &outputs[0].js_bytes;
    // The import statement becomes a require of the original path and the
    // named binding a property access on the namespace.
    assert!(code.contains("require(\"left-pad\")"));
    assert!(code.contains("import_left_pad.readFile(\"x\");"));
}

#[test]
fn iife_with_module_name_returns_namespace() {
    let options = BundleOptions {
        output_format: Format::Iife,
        module_name: Some("MyLib".to_string()),
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "export function greet() {\n  return 'hi';\n}\ngreet();\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    let code = &outputs[0].js_bytes;
    assert!(code.starts_with("var MyLib = (() => {"));
    assert!(code.contains("return entry_exports;"));
    assert!(code.trim_end().ends_with("})();"));
}

#[test]
fn overwrite_refusal_is_logged_but_chunk_still_emitted() {
    let options = BundleOptions {
        abs_output_file: Some("/entry.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[("/entry.js", "console.log(1);\n")],
        &["/entry.js"],
        &options,
    );
    assert!(
        log.msgs()
            .iter()
            .any(|m| m.text.contains("Refusing to overwrite input file"))
    );
    assert_eq!(outputs.len(), 1);
}

#[test]
fn json_loader_synthesizes_commonjs_module() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "const data = require('./data.json');\nconsole.log(data.version);\n"),
            ("/data.json", "{ \"version\": 3 }"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    let code = &outputs[0].js_bytes;
    assert!(code.contains("var require_data = __commonJS((exports, module) => {"));
    assert!(code.contains("module.exports = { \"version\": 3 };"));
    assert!(code.contains("const data = require_data();"));
}

#[test]
fn hashbang_is_inherited_by_the_entry_chunk() {
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[("/cli.js", "#!/usr/bin/env node\nconsole.log('hi');\n")],
        &["/cli.js"],
        &options,
    );
    assert!(!log.has_errors());
    assert!(outputs[0].js_bytes.starts_with("#!/usr/bin/env node\n"));
}

#[test]
fn whitespace_removal_produces_compact_output() {
    let options = BundleOptions {
        remove_whitespace: true,
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import { fn } from './foo';\nconsole.log(fn());\n"),
            ("/foo.js", "export function fn() {\n  return 123;\n}\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors());
    let code = &outputs[0].js_bytes;
    // No origin comments and no indentation in compact mode.
    assert!(!code.contains("// /foo.js"));
    assert!(code.contains("function fn(){return 123;}"));
}

#[test]
fn minify_identifiers_shortens_top_level_names() {
    let options = BundleOptions {
        minify_identifiers: true,
        remove_whitespace: true,
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };
    let (outputs, log) = bundle(
        &[
            ("/entry.js", "import { longFunctionName } from './foo';\nconsole.log(longFunctionName());\n"),
            ("/foo.js", "export function longFunctionName() {\n  return 123;\n}\n"),
        ],
        &["/entry.js"],
        &options,
    );
    assert!(!log.has_errors());
    let code = &outputs[0].js_bytes;
    assert!(!code.contains("longFunctionName"));
    // The helper name survives because unbound globals are reserved.
    assert!(code.contains("console.log("));
}

#[test]
fn scan_results_are_deterministic_across_runs() {
    let fixture = [
        (
            "/entry.js",
            "import './a';\nimport './b';\nimport './c';\nconsole.log('done');\n",
        ),
        ("/a.js", "import './c';\nconsole.log('a');\n"),
        ("/b.js", "import './a';\nconsole.log('b');\n"),
        ("/c.js", "console.log('c');\n"),
    ];
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        ..BundleOptions::default()
    };

    let fs = MockFileSystem::new(&fixture);
    let mut reference: Option<(Vec<String>, String)> = None;
    for _ in 0..4 {
        let mut log = Log::new();
        let bundle: Bundle = scan(&fs, &["/entry.js".to_string()], &options, &mut log);
        let paths: Vec<String> = bundle.sources.iter().map(|s| s.abs_path.clone()).collect();
        let outputs = compile(&bundle, &options, &mut log);
        assert!(!log.has_errors());
        let code = outputs[0].js_bytes.clone();
        match &reference {
            None => reference = Some((paths, code)),
            Some((ref_paths, ref_code)) => {
                assert_eq!(&paths, ref_paths, "source index assignment must be stable");
                assert_eq!(&code, ref_code, "output bytes must be stable");
            }
        }
    }
}

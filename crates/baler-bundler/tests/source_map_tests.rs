//! Source-map emission over whole bundles.

use baler_bundler::{BundleOptions, SourceMapMode, compile, scan};
use baler_common::Log;
use baler_resolver::MockFileSystem;

fn bundle_with_map(mode: SourceMapMode) -> baler_bundler::OutputFile {
    let fs = MockFileSystem::new(&[
        ("/entry.js", "import { fn } from './foo';\nconsole.log(fn());\n"),
        ("/foo.js", "export function fn() {\n  return 123;\n}\n"),
    ]);
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        source_map: mode,
        ..BundleOptions::default()
    };
    let mut log = Log::new();
    let bundle = scan(&fs, &["/entry.js".to_string()], &options, &mut log);
    let outputs = compile(&bundle, &options, &mut log);
    assert!(!log.has_errors(), "unexpected errors: {:?}", log.msgs());
    outputs.into_iter().next().expect("one output")
}

#[test]
fn linked_map_emits_sidecar_and_comment() {
    let output = bundle_with_map(SourceMapMode::LinkedWithComment);

    assert!(output.js_bytes.ends_with("//# sourceMappingURL=out.js.map\n"));
    assert_eq!(output.source_map_abs_path.as_deref(), Some("/out.js.map"));

    let map: serde_json::Value =
        serde_json::from_str(output.source_map_bytes.as_deref().expect("map bytes"))
            .expect("valid JSON");
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "out.js");
    // Sources appear in emission order: dependency first.
    assert_eq!(map["sources"][0], "/foo.js");
    assert_eq!(map["sources"][1], "/entry.js");
    assert_eq!(map["sourcesContent"][1], "import { fn } from './foo';\nconsole.log(fn());\n");
    assert_eq!(map["names"], serde_json::json!([]));
    assert!(!map["mappings"].as_str().expect("mappings").is_empty());
}

#[test]
fn inline_map_appends_data_url() {
    let output = bundle_with_map(SourceMapMode::Inline);
    assert!(output.source_map_bytes.is_none());
    assert!(
        output
            .js_bytes
            .contains("//# sourceMappingURL=data:application/json;base64,")
    );
}

#[test]
fn external_map_has_no_comment() {
    let output = bundle_with_map(SourceMapMode::ExternalWithoutComment);
    assert!(!output.js_bytes.contains("sourceMappingURL"));
    assert!(output.source_map_bytes.is_some());
}

#[test]
fn source_file_overrides_sources_entries() {
    let fs = MockFileSystem::new(&[("/entry.js", "console.log(1);\n")]);
    let options = BundleOptions {
        abs_output_file: Some("/out.js".to_string()),
        source_map: SourceMapMode::ExternalWithoutComment,
        source_file: Some("<stdin>".to_string()),
        ..BundleOptions::default()
    };
    let mut log = Log::new();
    let bundle = scan(&fs, &["/entry.js".to_string()], &options, &mut log);
    let outputs = compile(&bundle, &options, &mut log);
    let map: serde_json::Value =
        serde_json::from_str(outputs[0].source_map_bytes.as_deref().expect("map"))
            .expect("valid JSON");
    assert_eq!(map["sources"][0], "<stdin>");
}

#[test]
fn shared_module_is_listed_in_both_chunks_maps() {
    let fs = MockFileSystem::new(&[
        ("/a.js", "import x from './shared';\nconsole.log('a', x);\n"),
        ("/b.js", "import x from './shared';\nconsole.log('b', x);\n"),
        ("/shared.js", "export default 123;\n"),
    ]);
    let options = BundleOptions {
        abs_output_dir: Some("/out".to_string()),
        source_map: SourceMapMode::ExternalWithoutComment,
        ..BundleOptions::default()
    };
    let mut log = Log::new();
    let bundle = scan(
        &fs,
        &["/a.js".to_string(), "/b.js".to_string()],
        &options,
        &mut log,
    );
    let outputs = compile(&bundle, &options, &mut log);
    assert!(!log.has_errors());

    // The stitch counter is per chunk: each map lists the shared module
    // again, starting its own sources array from scratch.
    for output in &outputs {
        let map: serde_json::Value =
            serde_json::from_str(output.source_map_bytes.as_deref().expect("map"))
                .expect("valid JSON");
        let sources: Vec<&str> = map["sources"]
            .as_array()
            .expect("sources array")
            .iter()
            .map(|s| s.as_str().unwrap_or_default())
            .collect();
        assert!(sources.contains(&"/shared.js"));
    }
}

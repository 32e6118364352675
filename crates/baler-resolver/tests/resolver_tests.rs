use baler_resolver::resolver::RUNTIME_PATH;
use baler_resolver::{MockFileSystem, Resolved, Resolver};

fn fixture() -> MockFileSystem {
    MockFileSystem::new(&[
        ("/src/entry.js", ""),
        ("/src/util.js", ""),
        ("/src/data.json", ""),
        ("/src/pkg/index.js", ""),
        ("/lib/shared.ts", ""),
    ])
}

#[test]
fn exact_relative_path() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(
        resolver.resolve("/src/entry.js", "./util.js"),
        Resolved::Path("/src/util.js".to_string())
    );
}

#[test]
fn extension_probing() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(
        resolver.resolve("/src/entry.js", "./util"),
        Resolved::Path("/src/util.js".to_string())
    );
    assert_eq!(
        resolver.resolve("/src/entry.js", "../lib/shared"),
        Resolved::Path("/lib/shared.ts".to_string())
    );
    assert_eq!(
        resolver.resolve("/src/entry.js", "./data"),
        Resolved::Path("/src/data.json".to_string())
    );
}

#[test]
fn index_fallback() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(
        resolver.resolve("/src/entry.js", "./pkg"),
        Resolved::Path("/src/pkg/index.js".to_string())
    );
}

#[test]
fn bare_specifiers_do_not_resolve() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(resolver.resolve("/src/entry.js", "lodash"), Resolved::Missing);
}

#[test]
fn runtime_sentinel() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(resolver.resolve("/src/entry.js", RUNTIME_PATH), Resolved::Runtime);
}

#[test]
fn missing_file_reports_missing() {
    let fs = fixture();
    let resolver = Resolver::new(&fs);
    assert_eq!(resolver.resolve("/src/entry.js", "./nope"), Resolved::Missing);
}

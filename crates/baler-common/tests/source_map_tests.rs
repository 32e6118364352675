use baler_common::source_map::{SourceMapGenerator, vlq};

#[test]
fn vlq_encodes_small_values() {
    assert_eq!(vlq::encode(0), "A");
    assert_eq!(vlq::encode(1), "C");
    assert_eq!(vlq::encode(-1), "D");
    assert_eq!(vlq::encode(15), "e");
    assert_eq!(vlq::encode(16), "gB");
    assert_eq!(vlq::encode(-16), "hB");
}

#[test]
fn simple_source_map() {
    let mut generator = SourceMapGenerator::new("out.js".to_string());
    let src = generator.add_source("entry.js".to_string());

    generator.add_simple_mapping(0, 0, src, 0, 0);
    generator.add_simple_mapping(0, 4, src, 0, 4);
    generator.add_simple_mapping(1, 0, src, 1, 0);

    let map = generator.generate();

    assert_eq!(map.version, 3);
    assert_eq!(map.file, "out.js");
    assert_eq!(map.sources, vec!["entry.js"]);
    assert_eq!(map.mappings, "AAAA,IAAI;AACJ");
    assert!(map.names.is_empty());
}

#[test]
fn two_sources_delta_encode_across_segments() {
    let mut generator = SourceMapGenerator::new("out.js".to_string());
    let a = generator.add_source("a.js".to_string());
    let b = generator.add_source("b.js".to_string());

    generator.add_simple_mapping(0, 0, a, 0, 0);
    generator.add_simple_mapping(1, 0, b, 0, 0);
    generator.add_simple_mapping(2, 0, a, 1, 0);

    let map = generator.generate();
    // Line 2 steps back to source 0: the source delta is -1.
    assert_eq!(map.mappings, "AAAA;ACAA;ADCA");
}

#[test]
fn inline_source_map_is_a_data_url_comment() {
    let mut generator = SourceMapGenerator::new("out.js".to_string());
    let src = generator.add_source("entry.js".to_string());
    generator.add_simple_mapping(0, 0, src, 0, 0);

    let inline = generator.generate_inline();
    assert!(inline.starts_with("//# sourceMappingURL=data:application/json;base64,"));
}

#[test]
fn sources_content_round_trips() {
    let mut generator = SourceMapGenerator::new("out.js".to_string());
    let src = generator.add_source_with_content("entry.js".to_string(), "const x = 1;".to_string());
    generator.add_simple_mapping(0, 0, src, 0, 0);

    let map = generator.generate();
    assert_eq!(map.sources_content.unwrap()[0], "const x = 1;");
}

#[test]
fn json_document_field_shape() {
    let mut generator = SourceMapGenerator::new("out.js".to_string());
    let src = generator.add_source("entry.js".to_string());
    generator.add_simple_mapping(0, 0, src, 0, 0);

    let json = generator.generate().to_json();
    assert!(json.starts_with("{\"version\":3,"));
    assert!(json.contains("\"sources\":[\"entry.js\"]"));
    assert!(json.contains("\"names\":[]"));
}

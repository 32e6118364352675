//! Source map (v3) generation.
//!
//! The printer produces one mapping batch per printed file, computed as if
//! that file were the sole owner of the map (source index 0). Chunk assembly
//! shifts each batch by the file's generated-line/column offset and by a
//! running source-index counter, then feeds everything into a
//! `SourceMapGenerator` which performs the delta/VLQ encoding once.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    const CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    /// Encode one signed value.
    #[must_use]
    pub fn encode(value: i64) -> String {
        let mut out = String::new();
        encode_into(value, &mut out);
        out
    }

    /// Encode one signed value, appending to `out`.
    pub fn encode_into(value: i64, out: &mut String) {
        // Sign bit goes in the low bit of the first digit.
        let mut vlq: u64 = if value < 0 {
            (((-value) as u64) << 1) | 1
        } else {
            (value as u64) << 1
        };
        loop {
            let mut digit = (vlq & 0b11111) as usize;
            vlq >>= 5;
            if vlq != 0 {
                digit |= 0b100000; // continuation bit
            }
            out.push(CHARS[digit] as char);
            if vlq == 0 {
                break;
            }
        }
    }
}

/// A single decoded mapping: generated position -> original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name_index: Option<u32>,
}

/// The serialized source map document.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub mappings: String,
    pub names: Vec<String>,
}

impl SourceMap {
    /// Serialize to the JSON document written to disk.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Builds a source map from absolute mappings.
///
/// Mappings must be added in generated order (line, then column); the
/// generator performs the per-segment delta encoding required by the format.
#[derive(Debug, Default)]
pub struct SourceMapGenerator {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    #[must_use]
    pub fn new(file: String) -> Self {
        Self {
            file,
            ..Self::default()
        }
    }

    /// Register a source file; returns its index.
    pub fn add_source(&mut self, name: String) -> u32 {
        self.sources.push(name);
        self.sources_content.push(None);
        u32::try_from(self.sources.len() - 1).unwrap_or(u32::MAX)
    }

    /// Register a source file along with its contents; returns its index.
    pub fn add_source_with_content(&mut self, name: String, content: String) -> u32 {
        self.sources.push(name);
        self.sources_content.push(Some(content));
        u32::try_from(self.sources.len() - 1).unwrap_or(u32::MAX)
    }

    /// Register a name; returns its index.
    pub fn add_name(&mut self, name: String) -> u32 {
        self.names.push(name);
        u32::try_from(self.names.len() - 1).unwrap_or(u32::MAX)
    }

    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
        name_index: Option<u32>,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index,
        });
    }

    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.add_mapping(
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            None,
        );
    }

    /// Produce the final document.
    #[must_use]
    pub fn generate(&self) -> SourceMap {
        let sources_content = if self.sources_content.iter().any(Option::is_some) {
            Some(
                self.sources_content
                    .iter()
                    .map(|c| c.clone().unwrap_or_default())
                    .collect(),
            )
        } else {
            None
        };
        SourceMap {
            version: 3,
            file: self.file.clone(),
            sources: self.sources.clone(),
            sources_content,
            mappings: self.serialize_mappings(),
            names: self.names.clone(),
        }
    }

    /// Produce an inline `sourceMappingURL` comment with a base64 data URL.
    #[must_use]
    pub fn generate_inline(&self) -> String {
        let json = self.generate().to_json();
        format!(
            "//# sourceMappingURL=data:application/json;base64,{}",
            BASE64.encode(json.as_bytes())
        )
    }

    fn serialize_mappings(&self) -> String {
        let mut out = String::new();
        let mut prev_generated_line = 0u32;
        let mut prev_generated_column = 0i64;
        let mut prev_source = 0i64;
        let mut prev_original_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut prev_name = 0i64;
        let mut first_on_line = true;

        for m in &self.mappings {
            while prev_generated_line < m.generated_line {
                out.push(';');
                prev_generated_line += 1;
                prev_generated_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                out.push(',');
            }
            first_on_line = false;

            vlq::encode_into(i64::from(m.generated_column) - prev_generated_column, &mut out);
            prev_generated_column = i64::from(m.generated_column);

            vlq::encode_into(i64::from(m.source_index) - prev_source, &mut out);
            prev_source = i64::from(m.source_index);

            vlq::encode_into(i64::from(m.original_line) - prev_original_line, &mut out);
            prev_original_line = i64::from(m.original_line);

            vlq::encode_into(i64::from(m.original_column) - prev_original_column, &mut out);
            prev_original_column = i64::from(m.original_column);

            if let Some(name) = m.name_index {
                vlq::encode_into(i64::from(name) - prev_name, &mut out);
                prev_name = i64::from(name);
            }
        }
        out
    }
}

//! Chunk assembly: parallel per-source printing, deterministic
//! concatenation, and source-map stitching.

use memchr::memchr_iter;
use rayon::prelude::*;

use baler_common::LineMap;
use baler_common::source_map::SourceMapGenerator;
use baler_linker::graph::{FileGraph, RUNTIME_SOURCE_INDEX};
use baler_linker::{Chunk, Renamer};

use crate::printer::{PrintOptions, PrintResult, print_stmts};
use crate::transform::{TransformOptions, stmts_for_source_in_chunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMapMode {
    #[default]
    None,
    Inline,
    LinkedWithComment,
    ExternalWithoutComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Iife,
    CommonJs,
    EsModule,
}

#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    pub is_bundling: bool,
    pub remove_whitespace: bool,
    pub mangle_syntax: bool,
    pub output_format: OutputFormat,
    pub module_name: Option<String>,
    pub source_map: SourceMapMode,
    /// Overrides every source-map `sources` entry when set.
    pub source_file: Option<String>,
    pub omit_runtime: bool,
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub js_abs_path: String,
    pub js_bytes: String,
    pub source_map_abs_path: Option<String>,
    pub source_map_bytes: Option<String>,
}

fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Assemble one chunk into its output file(s).
///
/// Printing is one parallel task per source; assembly walks the results in
/// the chunk's deterministic file order regardless of completion order.
pub fn emit_chunk(
    graph: &FileGraph,
    chunk: &Chunk,
    renamer: &Renamer,
    options: &EmitOptions,
    js_abs_path: &str,
) -> OutputFile {
    let _span = tracing::info_span!("emit_chunk", name = %chunk.name).entered();

    let transform_options = TransformOptions {
        is_bundling: options.is_bundling,
        mangle_syntax: options.mangle_syntax,
    };
    let print_options = PrintOptions {
        remove_whitespace: options.remove_whitespace,
    };

    let printed: Vec<(u32, PrintResult)> = chunk
        .file_order
        .par_iter()
        .filter_map(|&source| {
            if options.omit_runtime && source == RUNTIME_SOURCE_INDEX {
                return None;
            }
            let stmts = stmts_for_source_in_chunk(graph, chunk, source, transform_options);
            let line_map = LineMap::build(&graph.sources[source as usize].contents);
            let result = print_stmts(
                &stmts,
                &graph.symbols,
                renamer,
                &graph.files[source as usize].module.import_records,
                &line_map,
                &print_options,
            );
            Some((source, result))
        })
        .collect();

    let mut assembler = Assembler::new(base_name(js_abs_path).to_string());

    if let Some(hashbang) = &chunk.hashbang {
        assembler.push(hashbang);
        assembler.push("\n");
    }

    let iife = options.is_bundling && options.output_format == OutputFormat::Iife;
    if iife {
        if let Some(name) = &options.module_name {
            assembler.push(&format!("var {name} = "));
        }
        assembler.push("(() => {");
        if !options.remove_whitespace {
            assembler.push("\n");
        }
    }

    for (source, result) in &printed {
        let source = *source as usize;
        if !options.remove_whitespace && source != RUNTIME_SOURCE_INDEX as usize {
            assembler.push(&format!("// {}\n", graph.sources[source].pretty_path));
        }
        let name = options
            .source_file
            .clone()
            .unwrap_or_else(|| graph.sources[source].pretty_path.clone());
        assembler.add_source(name, graph.sources[source].contents.clone(), result);
    }

    if iife {
        // A named IIFE hands back the entry's namespace object.
        if options.module_name.is_some() {
            if let Some(exports_name) = entry_namespace_name(graph, chunk, renamer) {
                if !options.remove_whitespace {
                    assembler.push("  ");
                }
                assembler.push(&format!("return {exports_name};"));
                if !options.remove_whitespace {
                    assembler.push("\n");
                }
            }
        }
        assembler.push("})();");
        assembler.push("\n");
    }

    finish(assembler, options, js_abs_path)
}

/// The printed name of the single entry point's exports object, when this
/// chunk holds a live namespace part for it.
fn entry_namespace_name(graph: &FileGraph, chunk: &Chunk, renamer: &Renamer) -> Option<String> {
    let mut ordinals = chunk.entry_bits.ones();
    let ordinal = ordinals.next()?;
    if ordinals.next().is_some() {
        return None;
    }
    let entry = *graph.entry_points.get(ordinal)?;
    if graph.meta[entry as usize].is_commonjs {
        return None;
    }
    let part_count = graph.files[entry as usize].module.parts.len();
    if part_count == 0 {
        return None;
    }
    let namespace_part = u32::try_from(part_count - 1).ok()?;
    let in_chunk = chunk
        .parts
        .get(&entry)
        .is_some_and(|parts| parts.contains(&namespace_part));
    if !in_chunk {
        return None;
    }
    let exports_ref = graph.files[entry as usize].module.exports_ref;
    Some(renamer.name_of(&graph.symbols, exports_ref).to_string())
}

/// Accumulates chunk text while tracking the generated line/column offset of
/// every appended piece, and rebases each printed source's mapping batch by
/// that offset with an incrementing per-chunk source index.
struct Assembler {
    out: String,
    line: u32,
    column: u32,
    generator: SourceMapGenerator,
}

impl Assembler {
    fn new(output_name: String) -> Self {
        Assembler {
            out: String::new(),
            line: 0,
            column: 0,
            generator: SourceMapGenerator::new(output_name),
        }
    }

    fn push(&mut self, text: &str) {
        let newlines = memchr_iter(b'\n', text.as_bytes()).count();
        if newlines > 0 {
            self.line += u32::try_from(newlines).unwrap_or(0);
            let last = text.rfind('\n').unwrap_or(0);
            self.column = u32::try_from(text.len() - last - 1).unwrap_or(0);
        } else {
            self.column += u32::try_from(text.len()).unwrap_or(0);
        }
        self.out.push_str(text);
    }

    fn add_source(&mut self, name: String, contents: String, result: &PrintResult) {
        let source_index = self.generator.add_source_with_content(name, contents);
        let (line_offset, column_offset) = (self.line, self.column);
        for m in &result.mappings {
            let (generated_line, generated_column) = if m.generated_line == 0 {
                (line_offset, column_offset + m.generated_column)
            } else {
                (line_offset + m.generated_line, m.generated_column)
            };
            self.generator.add_simple_mapping(
                generated_line,
                generated_column,
                source_index,
                m.original_line,
                m.original_column,
            );
        }
        self.push(&result.code);
    }
}

fn finish(assembler: Assembler, options: &EmitOptions, js_abs_path: &str) -> OutputFile {
    let mut js_bytes = assembler.out;
    let mut source_map_abs_path = None;
    let mut source_map_bytes = None;

    match options.source_map {
        SourceMapMode::None => {}
        SourceMapMode::Inline => {
            let comment = assembler.generator.generate_inline();
            js_bytes.push_str(&comment);
            js_bytes.push('\n');
        }
        SourceMapMode::LinkedWithComment => {
            let map_path = format!("{js_abs_path}.map");
            let comment = format!("//# sourceMappingURL={}.map\n", base_name(js_abs_path));
            js_bytes.push_str(&comment);
            source_map_bytes = Some(assembler.generator.generate().to_json());
            source_map_abs_path = Some(map_path);
        }
        SourceMapMode::ExternalWithoutComment => {
            source_map_bytes = Some(assembler.generator.generate().to_json());
            source_map_abs_path = Some(format!("{js_abs_path}.map"));
        }
    }

    OutputFile {
        js_abs_path: js_abs_path.to_string(),
        js_bytes,
        source_map_abs_path,
        source_map_bytes,
    }
}

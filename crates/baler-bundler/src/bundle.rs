//! The scan stage: parse the transitive import closure of the entry points.
//!
//! One parse task per file on the rayon pool; results funnel through a
//! single channel. Source indices are reserved in request order before
//! spawning, and completed results are processed in index order regardless
//! of arrival order, so the discovered file set and every assigned index are
//! identical across runs.

use std::sync::mpsc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rustc_hash::FxHashMap;

use baler_common::{Diagnostic, Log, Span};
use baler_emitter::printer::quote;
use baler_linker::graph::{File, Source};
use baler_parser::ast::Module;
use baler_parser::{ParseOptions, parse_module};
use baler_resolver::{FileSystem, Loader, Resolved, Resolver};

use crate::options::BundleOptions;
use crate::runtime;

/// A scanned bundle: everything the linker consumes.
#[derive(Debug, Default)]
pub struct Bundle {
    pub sources: Vec<Source>,
    pub files: Vec<File>,
    /// User entry points, in command-line order.
    pub entry_points: Vec<u32>,
}

struct ParsedFile {
    index: u32,
    module: Module,
    diagnostics: Vec<Diagnostic>,
}

/// Scan `entry_paths` (absolute) into a bundle.
pub fn scan(
    fs: &dyn FileSystem,
    entry_paths: &[String],
    options: &BundleOptions,
    log: &mut Log,
) -> Bundle {
    let _span = tracing::info_span!("scan", entries = entry_paths.len()).entered();

    let resolver = Resolver::new(fs);
    let parse_options = ParseOptions {
        is_bundling: options.is_bundling,
    };

    let mut sources: Vec<Source> = Vec::new();
    let mut files: Vec<Option<File>> = Vec::new();
    let mut visited: FxHashMap<String, u32> = FxHashMap::default();
    let mut entry_points: Vec<u32> = Vec::new();

    rayon::scope(|scope| {
        let (tx, rx) = mpsc::channel::<ParsedFile>();
        let mut reserved: u32 = 0;

        // Reserve a slot and spawn the parse task for one file.
        let reserve = |path: &str,
                           contents: String,
                           parse_contents: String,
                           sources: &mut Vec<Source>,
                           files: &mut Vec<Option<File>>,
                           visited: &mut FxHashMap<String, u32>,
                           reserved: &mut u32,
                           scope: &rayon::Scope<'_>| {
            let index = *reserved;
            *reserved += 1;
            visited.insert(path.to_string(), index);
            sources.push(Source {
                index,
                abs_path: path.to_string(),
                pretty_path: path.to_string(),
                contents,
            });
            files.push(None);

            let tx = tx.clone();
            let path = path.to_string();
            let parse_options = parse_options.clone();
            scope.spawn(move |_| {
                let mut worker_log = Log::new();
                let module =
                    parse_module(index, &path, &parse_contents, &parse_options, &mut worker_log);
                // The driver ignores a closed channel; it only happens when
                // the scan is already over.
                let _ = tx.send(ParsedFile {
                    index,
                    module,
                    diagnostics: worker_log.take_msgs(),
                });
            });
            index
        };

        // The runtime is always parsed first.
        reserve(
            runtime::RUNTIME_PATH,
            runtime::SOURCE.to_string(),
            runtime::SOURCE.to_string(),
            &mut sources,
            &mut files,
            &mut visited,
            &mut reserved,
            scope,
        );

        for path in entry_paths {
            if let Some(&existing) = visited.get(path) {
                entry_points.push(existing);
                continue;
            }
            match fs.read_file(path) {
                Some(contents) => {
                    let parse_contents =
                        contents_for_loader(path, &contents, options, log);
                    let index = reserve(
                        path,
                        contents,
                        parse_contents,
                        &mut sources,
                        &mut files,
                        &mut visited,
                        &mut reserved,
                        scope,
                    );
                    entry_points.push(index);
                }
                None => {
                    log.add_error("", None, format!("Could not read from file: {path}"));
                }
            }
        }

        // Process completions strictly in index order: a file's imports
        // reserve new indices, so processing order decides the numbering.
        let mut buffer: FxHashMap<u32, ParsedFile> = FxHashMap::default();
        let mut next_to_process: u32 = 0;
        while next_to_process < reserved {
            if let Some(msg) = buffer.remove(&next_to_process) {
                next_to_process += 1;
                log.extend(msg.diagnostics);

                let source_path = sources[msg.index as usize].abs_path.clone();
                let mut resolved_imports: FxHashMap<String, u32> = FxHashMap::default();
                for record in &msg.module.import_records {
                    if resolved_imports.contains_key(&record.path) {
                        continue;
                    }
                    match resolver.resolve(&source_path, &record.path) {
                        Resolved::Runtime => {
                            resolved_imports.insert(record.path.clone(), 0);
                        }
                        Resolved::Path(target_path) => {
                            let target = match visited.get(&target_path) {
                                Some(&index) => index,
                                None => {
                                    let contents =
                                        fs.read_file(&target_path).unwrap_or_default();
                                    let parse_contents = contents_for_loader(
                                        &target_path,
                                        &contents,
                                        options,
                                        log,
                                    );
                                    reserve(
                                        &target_path,
                                        contents,
                                        parse_contents,
                                        &mut sources,
                                        &mut files,
                                        &mut visited,
                                        &mut reserved,
                                        scope,
                                    )
                                }
                            };
                            resolved_imports.insert(record.path.clone(), target);
                        }
                        Resolved::Missing => {
                            // The record stays unresolved; downstream stages
                            // treat the import as external.
                            log.add_error(
                                source_path.clone(),
                                Some(record.span),
                                format!("Could not resolve \"{}\"", record.path),
                            );
                        }
                    }
                }
                files[msg.index as usize] = Some(File {
                    module: msg.module,
                    resolved_imports,
                });
            } else {
                match rx.recv() {
                    Ok(msg) => {
                        buffer.insert(msg.index, msg);
                    }
                    Err(_) => break,
                }
            }
        }
    });

    Bundle {
        sources,
        files: files.into_iter().map(Option::unwrap_or_default).collect(),
        entry_points,
    }
}

/// Synthesize the JavaScript the parser sees for non-JS loaders. The
/// original contents stay on the `Source` for source maps.
fn contents_for_loader(
    path: &str,
    contents: &str,
    options: &BundleOptions,
    log: &mut Log,
) -> String {
    let ext = baler_resolver::path::ext(path);
    let loader = if path == runtime::RUNTIME_PATH {
        Loader::Js
    } else {
        match options.extension_to_loader.get(ext) {
            Some(&loader) => loader,
            None => {
                log.add_error(
                    path,
                    Some(Span::at(0)),
                    format!("No loader is configured for \"{ext}\" files"),
                );
                Loader::Js
            }
        }
    };
    match loader {
        Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx => contents.to_string(),
        Loader::Json => format!("module.exports = {contents};\n"),
        Loader::Text => format!("module.exports = {};\n", quote(contents)),
        Loader::Base64 => {
            format!("module.exports = {};\n", quote(&BASE64.encode(contents.as_bytes())))
        }
        Loader::DataUrl => format!(
            "module.exports = \"data:application/octet-stream;base64,{}\";\n",
            BASE64.encode(contents.as_bytes())
        ),
    }
}

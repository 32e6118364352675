//! The compilation driver: scan, compile, write.

use std::path::Path;

use baler_bundler::{compile, scan};
use baler_common::Log;
use baler_resolver::OsFileSystem;

use crate::args::{CliArgs, absolute_path};
use crate::reporter;

/// Run one bundling invocation. Returns whether any error diagnostic was
/// produced (the process exit code decision).
pub fn run(args: &CliArgs) -> anyhow::Result<bool> {
    let options = args.to_bundle_options()?;
    let entries: Vec<String> = args
        .entries
        .iter()
        .map(|p| absolute_path(p))
        .collect::<anyhow::Result<_>>()?;

    let fs = OsFileSystem;
    let mut log = Log::new();
    let bundle = scan(&fs, &entries, &options, &mut log);
    let outputs = compile(&bundle, &options, &mut log);

    // All diagnostics are recoverable so a single run reports everything,
    // but nothing is written once an error is on the log.
    if !log.has_errors() {
        for output in &outputs {
            write_output(&output.js_abs_path, &output.js_bytes)?;
            if let (Some(path), Some(bytes)) =
                (&output.source_map_abs_path, &output.source_map_bytes)
            {
                write_output(path, bytes)?;
            }
        }
    }

    reporter::report(&log);
    Ok(log.has_errors())
}

fn write_output(path: &str, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    tracing::debug!(path, bytes = contents.len(), "wrote output file");
    Ok(())
}

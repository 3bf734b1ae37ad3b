//! File-level pipeline: parse, transform, print.

use crate::lua::{self, ParseError};
use crate::options::Options;
use crate::printer::print;
use crate::provenance::ProvenanceMap;
use crate::sourcemap::SourceMap;
use crate::transform::transform;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error that stops one file's pipeline.
#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },
}

/// Everything produced for one Lua file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspiledFile {
    pub provenance: ProvenanceMap,
    pub diagnostics: Vec<String>,
    pub file_name: String,
    pub ts_code: String,
    pub source_map: SourceMap,
}

/// Outcome of [`transpile`], in input order.
#[derive(Debug, Default)]
pub struct TranspileResult {
    pub files: Vec<TranspiledFile>,
    pub failures: Vec<TranspileError>,
}

/// Runs the whole pipeline on one Lua source text.
pub fn transform_lua_to_typescript(
    code: &str,
    options: &Options,
    file_name: &str,
) -> Result<TranspiledFile, TranspileError> {
    let _span = tracing::debug_span!("transpile", file = file_name).entered();

    let chunk = lua::parse(code).map_err(|source| TranspileError::Parse {
        file: file_name.to_string(),
        source,
    })?;
    let transformed = transform(&chunk, options);
    let printed = print(
        &transformed.program,
        &transformed.provenance,
        file_name,
        Some(code),
    );

    let mut source_map = printed.map;
    source_map.file = ts_file_name(Path::new(file_name))
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    tracing::debug!(
        diagnostics = transformed.diagnostics.len(),
        "transpiled file"
    );
    Ok(TranspiledFile {
        provenance: transformed.provenance,
        diagnostics: transformed.diagnostics.into_vec(),
        file_name: file_name.to_string(),
        ts_code: printed.code,
        source_map,
    })
}

/// Transpiles `files` in parallel, each with its own transformer.
///
/// Paths that do not exist are skipped.
pub fn transpile<P: AsRef<Path> + Sync>(files: &[P], options: &Options) -> TranspileResult {
    let outcomes: Vec<_> = files
        .par_iter()
        .filter_map(|path| transpile_file(path.as_ref(), options))
        .collect();

    let mut result = TranspileResult::default();
    for outcome in outcomes {
        match outcome {
            Ok(file) => result.files.push(file),
            Err(error) => result.failures.push(error),
        }
    }
    tracing::debug!(
        files = result.files.len(),
        failures = result.failures.len(),
        "transpiled batch"
    );
    result
}

fn transpile_file(path: &Path, options: &Options) -> Option<Result<TranspiledFile, TranspileError>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "skipping missing file");
        return None;
    }
    let result = std::fs::read_to_string(path)
        .map_err(|source| TranspileError::Io {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|code| transform_lua_to_typescript(&code, options, &path.to_string_lossy()));
    Some(result)
}

/// `foo/bar.lua` becomes `foo/bar.ts`.
pub fn ts_file_name(lua_file: &Path) -> PathBuf {
    lua_file.with_extension("ts")
}

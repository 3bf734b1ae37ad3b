//! `luats` - transpile Lua files to TypeScript.

use anyhow::{Context, Result, bail};
use clap::Parser;
use luats_transpile::transpile::ts_file_name;
use luats_transpile::{Options, TranspiledFile, transpile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Transpile Lua files to TypeScript with source maps
#[derive(Parser, Debug)]
#[command(name = "luats", version, about)]
struct Cli {
    /// Lua source files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Report translations whose runtime behavior may differ from Lua's
    #[arg(long)]
    show_semantic_errors: bool,

    /// Emit ES modules; a chunk's trailing return becomes the default export
    #[arg(long)]
    module: bool,

    /// Emit each chunk as a single exported class
    #[arg(long)]
    classmod: bool,

    /// TOML file with transform options (`showSemanticErrors`, `module`, `classmod`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for generated files (stdout if not specified)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Write `<name>.ts.map` next to each generated file
    #[arg(long, requires = "out_dir")]
    source_map: bool,

    /// Exit with an error when any diagnostic is reported
    #[arg(long)]
    deny_diagnostics: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let options = resolve_options(cli)?;
    tracing::debug!(?options, files = cli.files.len(), "starting");

    let result = transpile(&cli.files, &options);

    let targets: Vec<Option<PathBuf>> = match &cli.out_dir {
        Some(out_dir) => output_paths(out_dir, &result.files)?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; result.files.len()],
    };

    let mut diagnostics = 0;
    for (file, target) in result.files.iter().zip(targets) {
        for diagnostic in &file.diagnostics {
            eprintln!("{}:{diagnostic}", file.file_name);
        }
        diagnostics += file.diagnostics.len();
        write_output(cli, file, target.as_deref())?;
    }
    for failure in &result.failures {
        eprintln!("error: {failure}");
    }

    if !result.failures.is_empty() || (cli.deny_diagnostics && diagnostics > 0) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Options from `--config`, with flags switching options on.
fn resolve_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Options::default(),
    };
    options.show_semantic_errors |= cli.show_semantic_errors;
    options.module |= cli.module;
    options.classmod |= cli.classmod;
    Ok(options)
}

/// Where each file is written under `out_dir`. Two inputs may not share a
/// target.
fn output_paths(out_dir: &Path, files: &[TranspiledFile]) -> Result<Vec<PathBuf>> {
    let mut targets: BTreeMap<PathBuf, &str> = BTreeMap::new();
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        let name = Path::new(&file.file_name)
            .file_name()
            .with_context(|| format!("{} has no file name", file.file_name))?;
        let path = out_dir.join(ts_file_name(Path::new(name)));
        if let Some(previous) = targets.insert(path.clone(), &file.file_name) {
            bail!(
                "{previous} and {} would both be written to {}",
                file.file_name,
                path.display()
            );
        }
        paths.push(path);
    }
    Ok(paths)
}

fn write_output(cli: &Cli, file: &TranspiledFile, ts_path: Option<&Path>) -> Result<()> {
    let (Some(out_dir), Some(ts_path)) = (&cli.out_dir, ts_path) else {
        print!("{}", file.ts_code);
        return Ok(());
    };
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut code = file.ts_code.clone();
    if cli.source_map {
        let map_path = PathBuf::from(format!("{}.map", ts_path.display()));
        let map_name = map_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        code.push_str(&format!("//# sourceMappingURL={map_name}\n"));
        let json = file.source_map.to_json()?;
        std::fs::write(&map_path, json)
            .with_context(|| format!("failed to write {}", map_path.display()))?;
    }
    std::fs::write(ts_path, code)
        .with_context(|| format!("failed to write {}", ts_path.display()))?;
    eprintln!("Transpiled {} -> {}", file.file_name, ts_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use luats_transpile::transform_lua_to_typescript;
    use std::io::Write;

    #[test]
    fn test_flags_override_config() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "showSemanticErrors = true").unwrap();
        let path = config.path().display().to_string();

        let cli = Cli::parse_from(["luats", "--config", &path, "--module", "main.lua"]);
        let options = resolve_options(&cli).unwrap();
        assert!(options.show_semantic_errors);
        assert!(options.module);
        assert!(!options.classmod);
    }

    #[test]
    fn test_unknown_config_key_is_an_error() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "target = \"es5\"").unwrap();
        let path = config.path().display().to_string();

        let cli = Cli::parse_from(["luats", "--config", &path, "main.lua"]);
        let err = resolve_options(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"), "{err:#}");
    }

    #[test]
    fn test_same_file_name_in_two_directories_is_an_error() {
        let options = Options::default();
        let files = vec![
            transform_lua_to_typescript("print(1)", &options, "a/util.lua").unwrap(),
            transform_lua_to_typescript("print(2)", &options, "b/util.lua").unwrap(),
        ];
        let err = output_paths(Path::new("out"), &files).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "a/util.lua and b/util.lua would both be written to {}",
                Path::new("out").join("util.ts").display()
            )
        );

        let paths = output_paths(Path::new("out"), &files[..1]).unwrap();
        assert_eq!(paths, vec![Path::new("out").join("util.ts")]);
    }

    #[test]
    fn test_source_map_requires_out_dir() {
        assert!(Cli::try_parse_from(["luats", "--source-map", "main.lua"]).is_err());
    }
}

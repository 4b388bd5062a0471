mod error;

use clap::{Parser, ValueEnum};
use moin2md_core::config::{Config, OutputLayout};
use moin2md_core::{batch, selfcheck};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use error::CliError;

#[derive(Parser)]
#[command(name = "moin2md", version, about = "Translate MoinMoin wiki pages to Markdown")]
struct Cli {
    /// Moin page file(s), or one directory of pages. Omit to read from stdin.
    #[arg()]
    input: Vec<PathBuf>,

    /// Output file (single input only) or directory (multiple inputs or a
    /// directory input). Omit to write to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where translated pages land in directory mode.
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// File extension for output files (default: "md").
    #[arg(long)]
    ext: Option<String>,

    /// File extension of Moin pages in directory mode (default: "moin").
    #[arg(long)]
    source_ext: Option<String>,

    /// Skip pages whose output already exists.
    #[arg(long)]
    only_new: bool,

    /// Fail on tables, ordered lists, bold/italic and malformed links or macros.
    #[arg(long)]
    strict: bool,

    /// Run the built-in grammar checks and exit.
    #[arg(long)]
    self_test: bool,

    /// Log progress at info level (otherwise RUST_LOG applies).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    /// `Dir/Page.moin` -> `Dir/Page/index.md`
    IndexDir,
    /// `Dir/Page.moin` -> `Dir/Page.md`
    File,
}

impl From<Layout> for OutputLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::IndexDir => OutputLayout::IndexDir,
            Layout::File => OutputLayout::File,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if cli.self_test {
        return self_test();
    }

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    match cli.input.as_slice() {
        [] => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input).map_err(|source| CliError::Read {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
            let result = translate_named(&input, &config, "<stdin>")?;
            write_output(&result, cli.output.as_deref())
        }
        [dir] if dir.is_dir() => run_batch(dir, cli.output.as_deref(), &config, cli.only_new),
        [file] => {
            let input = read_file(file)?;
            let result = translate_named(&input, &config, &file.display().to_string())?;
            write_output(&result, cli.output.as_deref())
        }
        files => translate_files(files, cli.output.as_deref(), &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let toml_str = read_file(path)?;
    Config::from_toml(&toml_str).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.strict {
        config.options.strict = true;
    }
    if let Some(layout) = cli.layout {
        config.batch.layout = layout.into();
    }
    if let Some(ext) = &cli.ext {
        config.batch.target_extension = ext.clone();
    }
    if let Some(ext) = &cli.source_ext {
        config.batch.source_extension = ext.clone();
    }
}

fn self_test() -> Result<(), CliError> {
    let report = selfcheck::run_all();
    if report.passed() {
        eprintln!(
            "self-test passed: {} rules, {} examples",
            report.rules_checked, report.examples_checked
        );
        return Ok(());
    }
    for failure in &report.failures {
        eprintln!("FAIL {failure}");
    }
    Err(CliError::SelfTest(report.failures.len()))
}

fn run_batch(src: &Path, output: Option<&Path>, config: &Config, only_new: bool) -> Result<(), CliError> {
    let dest = output.ok_or_else(|| CliError::Usage("a directory input requires --output".to_string()))?;
    let report = batch::run(src, dest, config, only_new)?;

    eprintln!(
        "{} translated, {} skipped, {} failed",
        report.translated.len(),
        report.skipped.len(),
        report.failures.len()
    );
    if report.is_success() {
        return Ok(());
    }
    eprintln!("Pages not translated:");
    for failure in &report.failures {
        eprintln!("  {}: {}", failure.page.display(), failure.error);
    }
    Err(CliError::PagesFailed(report.failures.len()))
}

fn translate_files(files: &[PathBuf], output: Option<&Path>, config: &Config) -> Result<(), CliError> {
    if let Some(dir) = files.iter().find(|f| f.is_dir()) {
        return Err(CliError::Usage(format!(
            "{} is a directory; pass a directory as the only input",
            dir.display()
        )));
    }
    let out_dir = output.ok_or_else(|| CliError::Usage("multiple input files require --output directory".to_string()))?;

    for file in files {
        let input = read_file(file)?;
        let result = translate_named(&input, config, &file.display().to_string())?;
        let name = file.file_name().map(PathBuf::from).unwrap_or_else(|| file.clone());
        let out_path = out_dir.join(batch::destination_for(
            &name,
            config.batch.layout,
            &config.batch.target_extension,
        ));
        write_output(&result, Some(&out_path))?;
        eprintln!("{} -> {}", file.display(), out_path.display());
    }
    Ok(())
}

fn translate_named(input: &str, config: &Config, name: &str) -> Result<String, CliError> {
    moin2md_core::translate(input, config).map_err(|source| CliError::Translate {
        name: name.to_string(),
        source,
    })
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            let write_err = |source| CliError::Write {
                path: path.to_path_buf(),
                source,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
            std::fs::write(path, content).map_err(write_err)
        }
        None => io::stdout().write_all(content.as_bytes()).map_err(|source| CliError::Write {
            path: PathBuf::from("<stdout>"),
            source,
        }),
    }
}

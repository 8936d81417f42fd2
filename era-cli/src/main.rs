use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use era_indenter::{format_lines, split_lines, FormatError, IndentUnit, IndenterConfig};
use tracing::{debug, info};
use tracing_log::AsTrace;

/// File extensions of era scripts and headers.
const SCRIPT_EXTENSIONS: &[&str] = &["erb", "erh"];

#[derive(Parser)]
#[command(
    name = "era",
    version,
    about = "Indentation tooling for era scenario scripts.",
    propagate_version = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Command {
    /// Re-indent era scripts in place.
    Fmt(FmtCli),
}

#[derive(Args)]
struct FmtCli {
    /// Paths or directories to format (defaults to current directory).
    #[arg(value_name = "PATH", conflicts_with = "stdin")]
    inputs: Vec<PathBuf>,

    /// Do not write files; exit with an error if changes are needed.
    #[arg(long)]
    check: bool,

    /// Read a script from standard input and write the result to standard output.
    #[arg(long)]
    stdin: bool,

    /// Only rewrite lines START through END (1-based, inclusive).
    #[arg(long, value_name = "START:END", value_parser = parse_line_range)]
    lines: Option<Range<usize>>,

    /// JSON file with indenter settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Spaces per indentation level.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    tab_size: Option<u16>,

    /// Indent with one tab per level instead of spaces.
    #[arg(long)]
    use_tabs: bool,

    /// Re-indent `;` comment lines as well.
    #[arg(long)]
    indent_comments: bool,

    /// Start function bodies one level deep.
    #[arg(long)]
    indent_function_body: bool,
}

fn parse_line_range(value: &str) -> Result<Range<usize>, String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got `{value}`"))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|err| format!("invalid start line `{start}`: {err}"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|err| format!("invalid end line `{end}`: {err}"))?;
    if start == 0 || end < start {
        return Err(format!("`{value}` is not a valid 1-based line range"));
    }
    Ok(start - 1..end)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(cli.verbose.log_level_filter().as_trace())
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Fmt(cmd) => run_fmt(&cmd),
    }
}

fn load_config(cli: &FmtCli) -> Result<IndenterConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            IndenterConfig::from_json_str(&contents)
                .with_context(|| format!("Failed to load config {:?}", path))?
        }
        None => IndenterConfig::default(),
    };

    if let Some(width) = cli.tab_size {
        config.indent_unit = IndentUnit {
            width: usize::from(width),
            ..config.indent_unit
        };
    }
    if cli.use_tabs {
        config.indent_unit.use_spaces = false;
    }
    config.indent_commented_lines |= cli.indent_comments;
    config.indent_inside_function_body |= cli.indent_function_body;

    debug!(?config, "resolved indenter configuration");
    Ok(config)
}

/// Formatted text and the lines that were left as written.
fn format_contents(
    contents: &str,
    config: &IndenterConfig,
    lines: Option<&Range<usize>>,
) -> (String, Vec<FormatError>) {
    let records = split_lines(contents);
    let range = lines.cloned().unwrap_or(0..records.len());
    let outcome = format_lines(&records, config, range);
    (outcome.apply_to(contents), outcome.errors)
}

fn run_fmt(cli: &FmtCli) -> Result<()> {
    let config = load_config(cli)?;

    if cli.stdin {
        let mut contents = String::new();
        io::stdin()
            .read_to_string(&mut contents)
            .context("Failed to read standard input")?;
        let (formatted, errors) = format_contents(&contents, &config, cli.lines.as_ref());
        report_errors(Path::new("<stdin>"), &contents, &errors);
        if cli.check {
            if formatted != contents {
                bail!("standard input requires formatting");
            }
        } else {
            io::stdout()
                .write_all(formatted.as_bytes())
                .context("Failed to write standard output")?;
        }
        return finish(errors.len(), false);
    }

    let inputs = if cli.inputs.is_empty() {
        vec![env::current_dir().context("failed to determine current directory")?]
    } else {
        cli.inputs.clone()
    };

    let mut had_changes = false;
    let mut error_count = 0;
    let mut targets = BTreeSet::new();

    for input in &inputs {
        collect_era_files(input, &mut targets)?;
    }
    info!(files = targets.len(), "formatting era scripts");

    for path in &targets {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (formatted, errors) = format_contents(&contents, &config, cli.lines.as_ref());
        report_errors(path, &contents, &errors);
        error_count += errors.len();

        if contents == formatted {
            continue;
        }

        if cli.check {
            had_changes = true;
            eprintln!("needs formatting: {}", path.display());
        } else {
            fs::write(path, formatted).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Formatted {}", path.display());
        }
    }

    finish(error_count, cli.check && had_changes)
}

fn finish(error_count: usize, needs_formatting: bool) -> Result<()> {
    if needs_formatting {
        bail!("one or more files require formatting");
    }
    if error_count > 0 {
        bail!("{error_count} line(s) could not be indented");
    }
    Ok(())
}

fn report_errors(path: &Path, contents: &str, errors: &[FormatError]) {
    if errors.is_empty() {
        return;
    }
    let lines: Vec<&str> = contents.lines().collect();
    for error in errors {
        print_error(path, &lines, error);
    }
}

fn print_error(path: &Path, lines: &[&str], error: &FormatError) {
    eprintln!("  - error: {}", error.message());
    eprintln!("     --> {}:{}", path.display(), error.line + 1);

    if let Some(raw_line) = lines.get(error.line) {
        let display_line = raw_line.replace('\t', "    ");
        eprintln!("      {}", display_line);
        eprintln!("      {}", caret_underline(&display_line));
    }
}

/// Carets under the statement of `display_line`, offset by its leading whitespace in chars.
fn caret_underline(display_line: &str) -> String {
    let statement = display_line.trim_start();
    let leading = display_line.chars().count() - statement.chars().count();
    let width = statement.trim_end().chars().count().max(1);
    format!("{}{}", " ".repeat(leading), "^".repeat(width))
}

fn collect_era_files(path: &Path, targets: &mut BTreeSet<PathBuf>) -> Result<()> {
    let metadata = fs::metadata(path).with_context(|| format!("Failed to access {:?}", path))?;

    if metadata.is_dir() {
        let mut child_paths = Vec::new();
        for entry in
            fs::read_dir(path).with_context(|| format!("Failed to read directory {:?}", path))?
        {
            let entry =
                entry.with_context(|| format!("Failed to access entry within {:?}", path))?;
            child_paths.push(entry.path());
        }
        child_paths.sort();
        for child in child_paths {
            collect_era_files(&child, targets)?;
        }
    } else if metadata.is_file() {
        if is_era_script(path) {
            targets.insert(path.to_path_buf());
        }
    } else {
        return Err(anyhow!("{:?} is neither a file nor a directory", path));
    }

    Ok(())
}

fn is_era_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SCRIPT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

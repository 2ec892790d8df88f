mod error;
pub mod picker;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use yamlnav::{Config, Jump, Navigator, PickAction, SourceId, VfsHost};
use yamlnav_core::{PathEntry, ValueEntry};
use yamlnav_project::ProjectScanner;

use crate::picker::{ListPicker, QueryPicker};

pub use error::{CliError, CliResult};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "yamlnav",
    version,
    about = "Index YAML paths, keys and values, jump to them and edit them in place"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// YAML config file
    #[arg(long, global = true, env = "YAMLNAV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Try a full YAML parse before the line scanner
    #[arg(long, global = true)]
    pub structured: bool,

    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// One of json, pretty, pretty-compact
    #[arg(long, global = true)]
    pub log_format: Option<yamlnav::logging::LogFormat>,

    /// One of auto, always, always-ansi, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: termcolor::ColorChoice,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Every structural path of a file
    Paths { file: PathBuf },

    /// Every leaf value of a file
    Values { file: PathBuf },

    /// Keys starting with a prefix, case-insensitively
    Keys {
        file: PathBuf,

        #[arg(short, long, default_value = "")]
        prefix: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Lines at a dotted path such as `spec.replicas`
    Find {
        file: PathBuf,

        query: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Paths or values of every YAML file below a directory
    Project(ProjectArgs),

    /// Pick a path or value and print where it lives
    Jump(JumpArgs),

    /// Replace the value on one line
    Edit {
        file: PathBuf,

        /// 1-based line number
        #[arg(short, long)]
        line: usize,

        /// New value; read from stdin when omitted
        #[arg(long)]
        value: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// List values instead of paths
    #[arg(long)]
    pub values: bool,

    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct JumpArgs {
    /// A YAML file, or a directory to search project-wide
    pub target: PathBuf,

    /// Pick among values instead of paths
    #[arg(long)]
    pub values: bool,

    /// Choose the first entry containing this text; without it every
    /// candidate is listed
    #[arg(short, long)]
    pub query: Option<String>,

    /// Prompt for a new value of the picked entry
    #[arg(long, requires = "values")]
    pub edit: bool,
}

fn resolve(path: &Path) -> CliResult<Utf8PathBuf> {
    let abs = std::fs::canonicalize(path).map_err(|source| CliError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;
    Utf8PathBuf::from_path_buf(abs).map_err(CliError::NonUtf8Path)
}

fn load_config(global: &GlobalArgs) -> CliResult<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    if global.structured {
        config.structured_parser = true;
    }
    Ok(config)
}

fn file_session(config: Config, file: &Path) -> CliResult<(Navigator<VfsHost>, SourceId)> {
    let file = resolve(file)?;
    let host = VfsHost::physical().with_current(file.clone());
    Ok((Navigator::new(host, config), SourceId::File(file)))
}

fn location(file: Option<&yamlnav_core::FileMeta>, line: usize) -> String {
    match file {
        Some(meta) => format!("{}:{line}", meta.relative_path),
        None => line.to_string(),
    }
}

fn print_paths(out: &mut dyn Write, json: bool, paths: &[PathEntry]) -> CliResult<()> {
    if json {
        return print_json(out, paths);
    }
    for e in paths {
        writeln!(out, "{}\t{}", location(e.file.as_ref(), e.line), e.path)?;
    }
    Ok(())
}

fn print_values(out: &mut dyn Write, json: bool, values: &[ValueEntry]) -> CliResult<()> {
    if json {
        return print_json(out, values);
    }
    for e in values {
        writeln!(
            out,
            "{}\t{}\t{}",
            location(e.file.as_ref(), e.line),
            e.path,
            e.value
        )?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_jump(out: &mut dyn Write, jump: &Jump) -> CliResult<()> {
    writeln!(out, "{}:{}", jump.source, jump.line)?;
    Ok(())
}

/// Ask for a replacement on stderr and read one line from `input`.
///
/// End of input or an empty line cancels.
fn prompt_value(input: &mut dyn BufRead, current: &str) -> Option<String> {
    eprint!("new value [{current}]: ");
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(answer.trim().to_string()).filter(|a| !a.is_empty()),
    }
}

fn jump(
    args: &JumpArgs,
    config: Config,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> CliResult<()> {
    let target = resolve(&args.target)?;
    let project = target.is_dir();
    let host = if project {
        VfsHost::physical()
    } else {
        VfsHost::physical().with_current(target.clone())
    };
    let scan_options = config.scan_options();
    let mut nav = Navigator::new(host, config);
    let source = if project {
        SourceId::CurrentBuffer
    } else {
        SourceId::File(target.clone())
    };
    let scanner = ProjectScanner::physical(&target).with_options(scan_options);

    let picked = match &args.query {
        None => {
            let mut picker = ListPicker::new(&mut *out);
            match (project, args.values) {
                (true, false) => {
                    let paths = nav.project_paths(&scanner)?;
                    nav.pick_path(&source, &paths, &mut picker)?;
                }
                (true, true) => {
                    let values = nav.project_values(&scanner)?;
                    nav.pick_value(&source, &values, &mut picker)?;
                }
                (false, false) => {
                    nav.jump_to_path(&source, &mut picker)?;
                }
                (false, true) => {
                    nav.jump_to_value(&source, &mut picker)?;
                }
            }
            picker.finish()?;
            return Ok(());
        }
        Some(query) => {
            let action = if args.edit {
                PickAction::Edit
            } else {
                PickAction::Jump
            };
            let mut picker = QueryPicker::new(query).with_action(action);
            let jumped = match (project, args.values) {
                (true, false) => {
                    let paths = nav.project_paths(&scanner)?;
                    nav.pick_path(&source, &paths, &mut picker)?
                }
                (true, true) => {
                    let values = nav.project_values(&scanner)?;
                    nav.pick_value(&source, &values, &mut picker)?
                }
                (false, false) => nav.jump_to_path(&source, &mut picker)?,
                (false, true) => nav.jump_to_value(&source, &mut picker)?,
            };
            jumped.ok_or_else(|| CliError::NotFound(query.clone()))?
        }
    };

    print_jump(out, &picked)?;
    if picked.action == PickAction::Edit {
        let changed = nav.edit_value(&picked.source, picked.line, |current| {
            prompt_value(input, current)
        })?;
        tracing::info!(changed, "edit finished");
    }
    Ok(())
}

/// Run `cli` against the given output and input streams.
///
/// # Errors
///
/// Returns an error if the config or a source cannot be read, a query has no
/// match, or output cannot be written.
pub fn execute(cli: Cli, out: &mut dyn Write, input: &mut dyn BufRead) -> CliResult<()> {
    let config = load_config(&cli.global)?;
    let json = cli.global.json;

    match cli.command {
        Command::Paths { file } => {
            let (mut nav, source) = file_session(config, &file)?;
            print_paths(out, json, &nav.paths(&source)?)
        }
        Command::Values { file } => {
            let (mut nav, source) = file_session(config, &file)?;
            print_values(out, json, &nav.values(&source)?)
        }
        Command::Keys {
            file,
            prefix,
            limit,
        } => {
            let (mut nav, source) = file_session(config, &file)?;
            print_paths(out, json, &nav.keys(&source, &prefix, limit)?)
        }
        Command::Find { file, query, limit } => {
            let (mut nav, source) = file_session(config, &file)?;
            let found = nav.find_path(&source, &query, limit)?;
            if found.is_empty() {
                return Err(CliError::NotFound(query));
            }
            print_paths(out, json, &found)
        }
        Command::Project(args) => {
            let dir = resolve(&args.dir)?;
            let mut options = config.scan_options();
            if let Some(depth) = args.max_depth {
                options.max_depth = depth;
            }
            let scanner = ProjectScanner::physical(&dir).with_options(options);
            let mut nav = Navigator::new(VfsHost::physical(), config);
            if args.values {
                print_values(out, json, &nav.project_values(&scanner)?)
            } else {
                print_paths(out, json, &nav.project_paths(&scanner)?)
            }
        }
        Command::Jump(args) => jump(&args, config, out, input),
        Command::Edit { file, line, value } => {
            let (mut nav, source) = file_session(config, &file)?;
            let changed = nav.edit_value(&source, line, |current| match value {
                Some(value) => Some(value),
                None => prompt_value(input, current),
            })?;
            if json {
                print_json(out, &serde_json::json!({ "changed": changed, "line": line }))
            } else {
                writeln!(out, "{}", if changed { "changed" } else { "unchanged" })?;
                Ok(())
            }
        }
    }
}

/// Run the CLI on stdout and stdin.
///
/// # Errors
///
/// See [`execute`].
pub fn run(cli: Cli) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    match execute(cli, &mut out, &mut input) {
        // piping into `head` closes stdout early
        Err(CliError::Io(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

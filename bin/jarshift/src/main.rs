mod error;
mod properties;

use clap::{Arg, ArgAction, Command};
use error::{Outcome, RunError};
use jarshift::rules::RuleTable;
use jarshift::transform::{Action, ClassAction};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use walkdir::WalkDir;

fn main() -> Result<(), RunError> {
    env_logger::init();

    let matches = Command::new("Package renamer for compiled JVM classes")
        .version(clap::crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Rename packages (eg. `javax.servlet` to `jakarta.servlet`) inside class files")
        .arg(
            Arg::new("renames")
                .long("renames")
                .value_name("FILE")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Package renames, as `old.package=new.package` lines"),
        )
        .arg(
            Arg::new("versions")
                .long("versions")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Version ranges for renamed packages, as `new.package=range` lines"),
        )
        .arg(
            Arg::new("direct")
                .long("direct")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Exact string replacements, as `old=new` lines"),
        )
        .arg(
            Arg::new("invert")
                .long("invert")
                .action(ArgAction::SetTrue)
                .help("Apply the renames in the opposite direction"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("DIRECTORY")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("out")
                .help("Sets the output directory"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Class file or directory of class files")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true)
                .index(1),
        )
        .get_matches();

    let rules = load_rules(
        matches.get_one::<PathBuf>("renames"),
        matches.get_one::<PathBuf>("versions"),
        matches.get_one::<PathBuf>("direct"),
        matches.get_flag("invert"),
    )?;
    let action = ClassAction::new(Arc::new(rules));

    let input_path = matches
        .get_one::<PathBuf>("INPUT")
        .cloned()
        .unwrap_or_default();
    let output_path = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("out"));

    // Pair every file with its resource name (relative, `/` separated)
    let resources: Vec<(PathBuf, String)> = if input_path.is_file() {
        let name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec![(input_path.clone(), name)]
    } else {
        WalkDir::new(&input_path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let name = resource_name(&input_path, e.path());
                (e.into_path(), name)
            })
            .collect()
    };
    log::info!("Found {} resources under {:?}", resources.len(), input_path);

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let count_failed = run(&action, resources, &output_path, &mut stdout)?;

    exit(if count_failed > 0 { 1 } else { 0 })
}

/// Process every resource, reporting each on `out`, and return how many failed
///
/// A failed resource does not stop the run, unless the failure means the input is in a format
/// this tool does not understand.
fn run<W: WriteColor>(
    action: &ClassAction,
    resources: Vec<(PathBuf, String)>,
    output_path: &Path,
    out: &mut W,
) -> Result<usize, RunError> {
    let mut count_changed = 0;
    let mut count_failed = 0;
    for (path, name) in resources {
        let outcome = match process(action, &path, &name, output_path) {
            Ok(outcome) => outcome,
            Err(err) if err.is_fatal() => {
                log::error!("Stopping at {}: {}", name, err);
                return Err(err);
            }
            Err(err) => Outcome::from(err),
        };

        let (color, summary, message) = match outcome {
            Outcome::Unchanged => (Color::Blue, b"UNCHANGED".as_ref(), None),
            Outcome::Changed(msg) => {
                count_changed += 1;
                (Color::Green, b"CHANGED".as_ref(), Some(msg))
            }
            Outcome::Failed(msg) => {
                count_failed += 1;
                (Color::Red, b"FAILED".as_ref(), Some(msg))
            }
        };

        out.write_all(b" - ")?;
        out.set_color(ColorSpec::new().set_bold(true))?;
        out.write_all(name.as_bytes())?;
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        out.write_all(b" [")?;
        out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        out.write_all(summary)?;
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        out.write_all(b"]")?;
        out.reset()?;
        if let Some(message) = message {
            write!(out, " {}", message)?;
        }
        out.write_all(b"\n")?;
    }
    log::info!("{} changed, {} failed", count_changed, count_failed);
    Ok(count_failed)
}

/// Build the rule table out of the rule files
fn load_rules(
    renames: Option<&PathBuf>,
    versions: Option<&PathBuf>,
    direct: Option<&PathBuf>,
    invert: bool,
) -> Result<RuleTable, RunError> {
    let mut builder = RuleTable::builder().invert(invert);
    if let Some(path) = renames {
        for (key, value) in properties::load(path)? {
            builder = builder.rename(key, value);
        }
    }
    if let Some(path) = versions {
        for (key, value) in properties::load(path)? {
            builder = builder.version(key, value);
        }
    }
    if let Some(path) = direct {
        for (key, value) in properties::load(path)? {
            builder = builder.direct(key, value);
        }
    }
    Ok(builder.build()?)
}

/// Resource name of a file found while walking `root`
fn resource_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Transform (or copy) one resource into the output directory
fn process(
    action: &ClassAction,
    path: &Path,
    name: &str,
    output_path: &Path,
) -> Result<Outcome, RunError> {
    if action.accepts(name) {
        let file = fs::File::open(path)?;
        if let Some(transformed) = action.apply_reader(name, file)? {
            write_output(&output_path.join(&transformed.name), &transformed.bytes)?;
            let summary = transformed.changes.to_string();
            return Ok(Outcome::Changed(summary));
        }
    }

    write_output(&output_path.join(name), &fs::read(path)?)?;
    Ok(Outcome::Unchanged)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), RunError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

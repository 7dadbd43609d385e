//! varsub CLI - render shell-style variable references in config files
//!
//! Usage:
//!   varsub render molecule.yml --var MOLECULE_SCENARIO=default
//!   varsub check molecule.yml create.yml
//!   varsub vars molecule.yml --format json

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use varsub_core::{interpolation, Error, ErrorKind, Loader, LoaderOptions, Mapping};

/// varsub - shell-style variable interpolation for config files
#[derive(Parser)]
#[command(name = "varsub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a configuration file, substituting variable references
    Render {
        /// Configuration file to render
        file: PathBuf,

        /// YAML file of additional variables (KEY: value)
        #[arg(short, long)]
        env_file: Option<PathBuf>,

        /// Leave references whose name starts with this prefix untouched
        #[arg(short, long)]
        keep_prefix: Option<String>,

        /// Extra variable as KEY=VALUE (repeatable, wins over the environment)
        #[arg(short = 'D', long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Output format: text, yaml, json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check files for invalid variable reference syntax
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the variable references in a file
    Vars {
        /// Configuration file to inspect
        file: PathBuf,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            file,
            env_file,
            keep_prefix,
            vars,
            format,
            output,
        } => cmd_render(file, env_file, keep_prefix, &vars, &format, output),

        Commands::Check { files } => cmd_check(&files),

        Commands::Vars { file, format } => cmd_vars(&file, &format),
    }
}

fn parse_var(spec: &str) -> Result<(String, String), String> {
    spec.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("Invalid --var '{}': expected KEY=VALUE", spec))
}

fn build_loader(
    env_file: Option<PathBuf>,
    keep_prefix: Option<String>,
    vars: &[String],
) -> Result<Loader, String> {
    let mut reserved = Mapping::new();
    for spec in vars {
        let (key, value) = parse_var(spec)?;
        reserved.insert(key, value);
    }

    Loader::new(LoaderOptions {
        env_file,
        keep_prefix,
        reserved,
    })
    .map_err(|e| e.to_string())
}

/// Map a core error to an exit code: load problems are 2, everything
/// else (an invalid reference, bad YAML) is a domain failure
fn failure_code(error: &Error) -> ExitCode {
    match error.kind {
        ErrorKind::Io => ExitCode::from(2),
        _ => ExitCode::from(1),
    }
}

fn cmd_render(
    file: PathBuf,
    env_file: Option<PathBuf>,
    keep_prefix: Option<String>,
    vars: &[String],
    format: &str,
    output: Option<PathBuf>,
) -> ExitCode {
    let loader = match build_loader(env_file, keep_prefix, vars) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let content = match format {
        "text" => loader.render_file(&file),
        "yaml" => loader
            .render_value(&file)
            .and_then(|v| serde_yaml::to_string(&v).map_err(|e| Error::parse(e.to_string()))),
        "json" => loader.render_value(&file).and_then(|v| {
            serde_json::to_string_pretty(&v).map_err(|e| Error::parse(e.to_string()))
        }),
        other => {
            eprintln!("{}", format!("Unknown format: {}", other).red());
            return ExitCode::from(2);
        }
    };

    match content {
        Ok(text) => {
            if let Some(path) = output {
                if let Err(e) = std::fs::write(&path, text.as_bytes()) {
                    eprintln!(
                        "{}",
                        format!("Failed to write {}: {}", path.display(), e).red()
                    );
                    return ExitCode::from(2);
                }
                println!("{} wrote {}", "✓".green(), path.display());
            } else {
                print!("{}", text);
                if !text.ends_with('\n') {
                    println!();
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            failure_code(&e)
        }
    }
}

fn cmd_check(files: &[PathBuf]) -> ExitCode {
    let mut invalid = 0usize;
    let mut unreadable = 0usize;

    for file in files {
        let text = match std::fs::read_to_string(file) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                unreadable += 1;
                continue;
            }
        };

        match first_invalid(&text) {
            None => println!("{} {}", "✓".green(), file.display()),
            Some(fragment) => {
                println!(
                    "{} {}: invalid reference '{}'",
                    "✗".red(),
                    file.display(),
                    fragment
                );
                invalid += 1;
            }
        }
    }

    if unreadable > 0 {
        ExitCode::from(2)
    } else if invalid > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn first_invalid(text: &str) -> Option<String> {
    interpolation::scan(text)
        .into_iter()
        .find_map(|segment| match segment {
            interpolation::Segment::Token(interpolation::Token::Invalid { fragment }) => {
                Some(fragment.to_string())
            }
            _ => None,
        })
}

fn cmd_vars(file: &PathBuf, format: &str) -> ExitCode {
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!(
                "{}",
                format!("Failed to read {}: {}", file.display(), e).red()
            );
            return ExitCode::from(2);
        }
    };

    // First appearance wins; later duplicates add nothing
    let mut seen = std::collections::HashSet::new();
    let refs: Vec<_> = interpolation::references(&text)
        .into_iter()
        .filter(|r| seen.insert(r.name.clone()))
        .collect();

    match format {
        "json" => {
            let entries: Vec<_> = refs
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "default": r.default,
                        "set": std::env::var(&r.name).is_ok(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
            );
        }
        "text" => {
            for r in &refs {
                let status = if std::env::var(&r.name).is_ok() {
                    "set".green()
                } else {
                    "unset".yellow()
                };
                match &r.default {
                    Some(default) => println!("{} [{}] (default: {})", r.name, status, default),
                    None => println!("{} [{}]", r.name, status),
                }
            }
        }
        other => {
            eprintln!("{}", format!("Unknown format: {}", other).red());
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("KEY=value").unwrap(),
            ("KEY".to_string(), "value".to_string())
        );
        // Only the first '=' splits
        assert_eq!(
            parse_var("KEY=a=b").unwrap(),
            ("KEY".to_string(), "a=b".to_string())
        );
        assert!(parse_var("NOEQUALS").is_err());
    }

    #[test]
    fn test_first_invalid() {
        assert_eq!(first_invalid("ok ${X} ok"), None);
        assert_eq!(first_invalid("bad ${"), Some("${".to_string()));
        assert_eq!(first_invalid("${} then $2"), Some("${}".to_string()));
    }
}

//! Subprocess execution and build-step tokenization

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

/// Placeholder in build steps that expands to the run's output directory.
pub const OUTDIR_VAR: &str = "${OUTDIR}";

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Errors preparing or spawning a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),

    #[error("spawning {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Runs external commands with captured output. Abstracted so builds can be
/// exercised without touching the real toolchain.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String], workdir: &Path) -> Result<RunOutput, CommandError>;
}

/// Spawns real processes via tokio.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, argv: &[String], workdir: &Path) -> Result<RunOutput, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;

        debug!(%program, ?args, workdir = %workdir.display(), "running command");

        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(workdir)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Split a build step into argv. Quotes group words with embedded spaces and
/// a backslash escapes the next character; plain whitespace splitting is not
/// enough for real build command lines.
pub fn tokenize(step: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = step.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else if c == '\\' && q == '"' {
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => return Err(CommandError::UnterminatedQuote(step.to_string())),
                    }
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                '\\' => {
                    in_token = true;
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => current.push('\\'),
                    }
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(CommandError::UnterminatedQuote(step.to_string()));
    }

    if in_token {
        tokens.push(current);
    }

    if tokens.is_empty() {
        return Err(CommandError::Empty);
    }

    Ok(tokens)
}

/// Expand the output-directory placeholder in argument tokens. The program
/// name itself is never expanded; unknown `${...}` text passes through
/// untouched.
pub fn expand_args(argv: &mut [String], output_dir: &Path) {
    let outdir = output_dir.to_string_lossy();

    for arg in argv.iter_mut().skip(1) {
        if arg.contains(OUTDIR_VAR) {
            *arg = arg.replace(OUTDIR_VAR, &outdir);
        }
    }
}

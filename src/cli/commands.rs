//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use ink_syntax::parser;

use crate::cli::suite::{SuiteLayout, TestSuiteConfig};
use crate::cli::{CliError, CliResult, ExitCode};
use crate::compiler;
use crate::runtime::{Program, Story};

/// Debug and mode flags for the default play command.
#[derive(Debug, Default)]
pub struct PlayOptions {
    pub compile_only: bool,
    pub dump_ast: bool,
    pub dump_bytecode: bool,
}

/// Compile a story file (or stdin) and play it interactively.
pub fn play_story(file: Option<&Path>, opts: PlayOptions) -> CliResult<ExitCode> {
    let (name, source) = read_source(file)?;
    let program = compile_source(&name, &source, &opts)?;
    if opts.compile_only {
        return Ok(ExitCode::SUCCESS);
    }
    run_story(Story::new(program))
}

/// Print the conformance suite configuration for a directory.
pub fn print_suite_config(config_dir: &Path, layout: SuiteLayout) -> CliResult<ExitCode> {
    let config = TestSuiteConfig::new(config_dir, layout);
    println!("name: {}", config.name);
    println!("suffixes: {}", config.suffixes.join(" "));
    println!("required_tools: {}", config.required_tools.join(" "));
    match &config.source_root {
        Some(root) => println!("source_root: {}", root.display()),
        None => println!("source_root: (none)"),
    }
    println!("exec_root: {}", config.exec_root.display());
    println!("test_times_file: {}", config.test_times_file.display());
    for (token, replacement) in &config.substitutions {
        println!("substitution: {token} -> {}", replacement.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn read_source(file: Option<&Path>) -> CliResult<(String, String)> {
    match file {
        Some(path) => {
            let source = fs::read_to_string(path).map_err(|e| {
                CliError::failure(format!("error reading {}: {e}", path.display()))
            })?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| CliError::failure(format!("error reading stdin: {e}")))?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

/// Compile one source buffer, rendering any diagnostics to stderr.
fn compile_source(name: &str, source: &str, opts: &PlayOptions) -> CliResult<Program> {
    let file = parser::parse(source);
    if opts.dump_ast {
        println!("{:#?}", file.root);
    }
    let result = if file.has_errors() {
        Err(file.errors)
    } else {
        compiler::generate(source, &file)
    };
    let program = match result {
        Ok(program) => program,
        Err(errors) => {
            for error in &errors {
                eprintln!("{:?}", error.to_report(name, source));
            }
            // Diagnostics are already on stderr; exit silently.
            return Err(CliError::new("", ExitCode::FAILURE));
        }
    };
    if opts.dump_bytecode {
        print!("{}", program.disassemble());
    }
    Ok(program)
}

/// The interactive play loop: print lines until the story pauses, then show
/// numbered choices and read the player's pick from stdin.
fn run_story(mut story: Story) -> CliResult<ExitCode> {
    let stdin = io::stdin();
    let mut input = stdin.lock().lines();
    loop {
        while story.can_continue() {
            let line = story
                .continue_story()
                .map_err(|e| CliError::failure(format!("runtime error: {e}")))?;
            if let Some(line) = line {
                println!("{line}");
            }
        }
        if story.choices().is_empty() {
            break;
        }
        for (number, choice) in story.choices().iter().enumerate() {
            println!("{}: {}", number + 1, choice.text);
        }
        print!("?> ");
        let _ = io::stdout().flush();

        let Some(line) = input.next() else {
            // stdin closed mid-story; treat as quitting.
            break;
        };
        let line = line.map_err(|e| CliError::failure(format!("error reading input: {e}")))?;
        match line.trim().parse::<usize>().ok().map(|n| story.choose(n)) {
            Some(Ok(())) => {}
            _ => eprintln!("please enter a number between 1 and {}", story.choices().len()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

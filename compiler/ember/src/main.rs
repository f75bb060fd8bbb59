//! Ember CLI.

use std::path::{Path, PathBuf};

use ember::commands::{compile_command, require_command, run_file};
use ember_load::LoaderConfig;
use ember_vm::{stdout_handler, Exception};

fn main() {
    ember::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: ember run <file.rb>");
                std::process::exit(1);
            }
            let config = LoaderConfig::from_env();
            exit_on_error(run_file(Path::new(&args[2]), &config, stdout_handler()));
        }
        "compile" => {
            let mut src: Option<&str> = None;
            let mut out: Option<PathBuf> = None;
            let mut i = 2;
            while i < args.len() {
                if args[i] == "-o" && i + 1 < args.len() {
                    out = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    if !args[i].starts_with('-') && src.is_none() {
                        src = Some(args[i].as_str());
                    }
                    i += 1;
                }
            }
            let Some(src) = src else {
                eprintln!("Usage: ember compile <file.rb> [-o <file.mrb>]");
                std::process::exit(1);
            };
            match compile_command(Path::new(src), out.as_deref()) {
                Ok(written) => println!("wrote {}", written.display()),
                Err(err) => report_and_exit(&err),
            }
        }
        "require" => {
            if args.len() < 3 {
                eprintln!("Usage: ember require <name>");
                std::process::exit(1);
            }
            let config = LoaderConfig::from_env();
            match require_command(&args[2], &config, stdout_handler()) {
                Ok(loaded) => {
                    for path in loaded {
                        println!("{path}");
                    }
                }
                Err(err) => report_and_exit(&err),
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        "--version" | "-V" => println!("ember {}", env!("CARGO_PKG_VERSION")),
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn exit_on_error(result: Result<(), Exception>) {
    if let Err(err) = result {
        report_and_exit(&err);
    }
}

fn report_and_exit(err: &Exception) -> ! {
    eprintln!("{}", err.report());
    std::process::exit(1);
}

fn print_usage() {
    println!("Ember - a small embeddable Ruby-flavoured VM");
    println!();
    println!("Usage: ember <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.rb>                  Run a program");
    println!("  compile <file.rb> [-o <out>]   Precompile to a .mrb bytecode container");
    println!("  require <name>                 Require a module and list what was loaded");
    println!("  help                           Show this message");
    println!();
    println!("Environment:");
    println!("  EMBERLIB    Initial search path ($:), separated like PATH");
    println!("  RUST_LOG    Enable loader/VM tracing (e.g. RUST_LOG=ember_load=debug)");
}

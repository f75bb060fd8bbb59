use pretty_assertions::assert_eq;

use ember_load::config::{LOADED_GLOBAL, NATIVE_EXT};
use ember_load::{load, require};
use ember_vm::ExceptionKind;

use crate::common::{bare_vm, lit, output, registry, run, vm_with, Fixture};

#[test]
fn missing_module_from_a_script() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let mut vm = vm_with(&[&lib]);

    let err = run(&mut vm, "require \"nope/deeper\"\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::LoadError);
    assert!(err.is_a(ExceptionKind::ScriptError));
    assert_eq!(err.message, "cannot load such file -- nope/deeper");
    assert_eq!(err.backtrace, vec!["main.rb".to_owned()]);
}

#[test]
fn non_string_argument_from_a_script() {
    let mut vm = bare_vm();
    let err = run(&mut vm, "require 42\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::TypeError);
    assert_eq!(err.message, "can't convert Integer into String");

    let err = run(&mut vm, "load [\"x\"]\n").unwrap_err();
    assert_eq!(err.message, "can't convert Array into String");
}

#[test]
fn unknown_extension_runs_nothing() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let notes = fx.write("lib/notes.txt", "$ran = true\n");
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "notes.txt").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::LoadError);
    assert_eq!(
        err.message,
        format!("Filepath '{}' is invalid extension.", notes.display())
    );
    assert!(!vm.global_defined("$ran"));
    assert!(vm.code().is_empty());
    assert!(registry(&vm, LOADED_GLOBAL).is_empty());
}

#[test]
fn file_without_extension_is_an_invalid_filepath() {
    let fx = Fixture::new();
    let readme = fx.write("README", "$ran = true\n");
    let mut vm = bare_vm();

    let err = load(&mut vm, &readme.display().to_string()).unwrap_err();
    assert_eq!(
        err.message,
        format!("Filepath '{}' is invalid.", readme.display())
    );
    assert!(!vm.global_defined("$ran"));
}

#[test]
fn bare_name_never_matches_an_extensionless_file() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/README", "");
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "README").unwrap_err();
    assert_eq!(err.message, "cannot load such file -- README");
}

#[test]
fn syntax_errors_in_required_files_name_the_file() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let bad = fx.write("lib/bad.rb", "puts \"ok\"\ndef (\n");
    let mut vm = vm_with(&[&lib]);

    let err = run(&mut vm, "require \"bad\"\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::SyntaxError);
    assert!(
        err.message.starts_with(&format!("{}:2:", bad.display())),
        "{}",
        err.message
    );
    assert_eq!(output(&vm), "", "nothing from a file that failed to compile runs");
}

#[test]
fn deeply_nested_source_fails_to_compile_instead_of_crashing() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let depth = 200_000;
    fx.write(
        "lib/deep.rb",
        &format!("$x = {}1{}\n", "(".repeat(depth), ")".repeat(depth)),
    );
    let mut vm = vm_with(&[&lib]);

    let err = run(&mut vm, "require \"deep\"\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::SyntaxError);
    assert!(err.message.ends_with("nesting too deep"), "{}", err.message);
    assert!(!vm.global_defined("$x"));
}

#[test]
fn absolute_names_ignore_the_search_path() {
    let fx = Fixture::new();
    let abs = fx.write("elsewhere/abs.rb", "$abs = true\n");
    let mut vm = bare_vm();

    let program = format!("require {}\n", lit(&abs));
    run(&mut vm, &program).unwrap();
    assert!(vm.global_defined("$abs"));
    assert_eq!(registry(&vm, LOADED_GLOBAL), vec![abs.display().to_string()]);

    let missing = fx.path("elsewhere/missing.rb");
    let err = require(&mut vm, &missing.display().to_string()).unwrap_err();
    assert_eq!(
        err.message,
        format!("cannot load such file -- {}", missing.display())
    );
}

#[test]
fn dot_names_only_search_the_current_directory() {
    let fx = Fixture::new();
    let cwd = fx.dir("cwd");
    let lib = fx.dir("lib");
    fx.write("cwd/here.rb", "$here = true\n");
    fx.write("lib/there.rb", "");
    let mut vm = crate::common::vm_with_config(
        ember_load::LoaderConfig::default()
            .with_search_path([&lib])
            .with_current_dir(&cwd),
    );

    run(&mut vm, "require \"./here\"\n").unwrap();
    assert!(vm.global_defined("$here"));
    let err = require(&mut vm, "./there").unwrap_err();
    assert_eq!(err.message, "cannot load such file -- ./there");
}

#[test]
fn broken_native_extension_is_a_runtime_error() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write(&format!("lib/libfake{NATIVE_EXT}"), "not a shared library");
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "libfake").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::RuntimeError);
    assert!(!err.message.is_empty());
    assert!(registry(&vm, LOADED_GLOBAL).is_empty());
}

//! Native extensions built from `compiler/test_extensions/`.
//!
//! The fixture crates are compiled once per test binary, by the same cargo
//! that runs the tests, into a target directory of their own.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use pretty_assertions::assert_eq;

use ember_load::config::{LOADED_GLOBAL, LOADING_GLOBAL, NATIVE_EXT};
use ember_load::{load, require, NativeExtensions};
use ember_vm::{ExceptionKind, Value};

use crate::common::{lit, output, registry, run, vm_with, Fixture};

fn built_extensions() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let target = Path::new(env!("CARGO_TARGET_TMPDIR")).join("extensions");
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../Cargo.toml");
        let mut cmd = Command::new(env!("CARGO"));
        cmd.args(["build", "--quiet", "-p", "ember_ext_hello", "-p", "ember_ext_nosym"])
            .arg("--manifest-path")
            .arg(&manifest)
            .arg("--target-dir")
            .arg(&target);
        let profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            cmd.arg("--release");
            "release"
        };
        let status = cmd.status().expect("failed to spawn cargo");
        assert!(status.success(), "building the fixture extensions failed");
        target.join(profile)
    })
}

/// Copy the fixture library `crate_name` to `dest` and return `dest`.
fn install(crate_name: &str, dest: PathBuf) -> PathBuf {
    let built = built_extensions().join(format!("{DLL_PREFIX}{crate_name}{DLL_SUFFIX}"));
    fs::copy(&built, &dest).unwrap();
    dest
}

#[test]
fn require_runs_the_entry_point_against_the_vm() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let ext = install("ember_ext_hello", lib.join(format!("hello{NATIVE_EXT}")));
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "require \"hello\"\nputs hello_native\n").unwrap();

    assert_eq!(output(&vm), "from native\n");
    assert_eq!(vm.get_global("$native_inits"), Value::Int(1));
    assert_eq!(registry(&vm, LOADED_GLOBAL), vec![ext.display().to_string()]);
    assert_eq!(registry(&vm, LOADING_GLOBAL), vec![ext.display().to_string()]);
    let natives = vm.data::<NativeExtensions>().unwrap();
    assert_eq!(natives.loaded(), [ext]);
}

#[test]
fn required_extensions_initialise_once_but_load_reruns_them() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let ext = install("ember_ext_hello", lib.join(format!("hello{NATIVE_EXT}")));
    let mut vm = vm_with(&[&lib]);

    assert!(require(&mut vm, "hello").unwrap());
    assert!(!require(&mut vm, "hello").unwrap());
    assert_eq!(vm.get_global("$native_inits"), Value::Int(1));

    run(&mut vm, &format!("load {}\n", lit(&ext))).unwrap();
    assert_eq!(vm.get_global("$native_inits"), Value::Int(2));
    assert_eq!(vm.data::<NativeExtensions>().unwrap().loaded().len(), 2);
}

#[test]
fn explicit_suffix_selects_the_native_loader() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/hello.rb", "$source_ran = true\n");
    install("ember_ext_hello", lib.join(format!("hello{NATIVE_EXT}")));
    let mut vm = vm_with(&[&lib]);

    assert!(load(&mut vm, &format!("hello{NATIVE_EXT}")).unwrap());
    assert!(vm.has_method("hello_native"));
    assert!(!vm.global_defined("$source_ran"));
}

#[test]
fn library_without_the_entry_point_is_a_runtime_error() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    install("ember_ext_nosym", lib.join(format!("nosym{NATIVE_EXT}")));
    let mut vm = vm_with(&[&lib]);

    let err = run(&mut vm, "require \"nosym\"\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::RuntimeError);
    if cfg!(unix) {
        assert!(
            err.message.contains("ember_extension_init"),
            "{}",
            err.message
        );
    }
    assert!(registry(&vm, LOADED_GLOBAL).is_empty());
    assert!(vm.data::<NativeExtensions>().map_or(true, |n| n.loaded().is_empty()));
}

use pretty_assertions::assert_eq;

use ember_load::config::{LOADED_GLOBAL, LOADING_GLOBAL};
use ember_load::{require, LoaderConfig};
use ember_vm::Value;

use crate::common::{bare_vm, output, registry, run, vm_with, vm_with_config, Fixture};

#[test]
fn second_directory_match_is_loaded_once() {
    let fx = Fixture::new();
    let a = fx.dir("a");
    let b = fx.dir("b");
    let m = fx.write("b/m.rb", "puts \"m loaded\"\n");
    let mut vm = vm_with(&[&a, &b]);

    assert!(require(&mut vm, "m").unwrap());
    assert_eq!(
        registry(&vm, LOADED_GLOBAL),
        vec![m.display().to_string()]
    );
    assert!(!require(&mut vm, "m").unwrap());
    assert_eq!(output(&vm), "m loaded\n");
}

#[test]
fn require_from_a_script_returns_and_continues() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/m.rb", "puts \"in m\"\n");
    let mut vm = vm_with(&[&lib]);

    run(
        &mut vm,
        "$first = require \"m\"\n$second = require \"m\"\nputs \"after\"\n",
    )
    .unwrap();
    assert_eq!(output(&vm), "in m\nafter\n");
    assert_eq!(vm.get_global("$first"), Value::Bool(true));
    assert_eq!(vm.get_global("$second"), Value::Bool(false));
}

#[test]
fn required_methods_are_callable_from_the_requirer() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write(
        "lib/greeting.rb",
        "def greet(name)\n  return \"hello \" + name\nend\n",
    );
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "require \"greeting\"\nputs greet(\"ember\")\n").unwrap();
    assert_eq!(output(&vm), "hello ember\n");
}

#[test]
fn nested_requires_run_depth_first() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/outer.rb", "puts \"outer start\"\nrequire \"inner\"\nputs \"outer end\"\n");
    fx.write("lib/inner.rb", "puts \"inner\"\n");
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "require \"outer\"\nrequire \"inner\"\n").unwrap();
    assert_eq!(output(&vm), "outer start\ninner\nouter end\n");
    assert_eq!(registry(&vm, LOADED_GLOBAL).len(), 2);
}

#[test]
fn circular_requires_terminate() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/a.rb", "puts \"a\"\n$from_b = require \"b\"\n");
    fx.write("lib/b.rb", "puts \"b\"\n$from_a = require \"a\"\n");
    let mut vm = vm_with(&[&lib]);

    assert!(require(&mut vm, "a").unwrap());
    assert_eq!(output(&vm), "a\nb\n");
    assert_eq!(vm.get_global("$from_a"), Value::Bool(false));
    assert_eq!(vm.get_global("$from_b"), Value::Bool(true));
    assert_eq!(registry(&vm, LOADING_GLOBAL).len(), 2);
    assert_eq!(registry(&vm, LOADED_GLOBAL).len(), 2);
}

#[test]
fn spellings_of_the_same_file_share_one_entry() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/m.rb", "puts \"m\"\n");
    let mut vm = vm_with_config(
        LoaderConfig::default()
            .with_search_path([&lib])
            .with_current_dir(&lib),
    );

    assert!(require(&mut vm, "m").unwrap());
    assert!(!require(&mut vm, "m.rb").unwrap());
    assert!(!require(&mut vm, "./m").unwrap());
    assert!(!require(&mut vm, &lib.join("m.rb").display().to_string()).unwrap());
    assert_eq!(output(&vm), "m\n");
}

#[cfg(unix)]
#[test]
fn symlinks_resolve_to_their_target() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let target = fx.write("lib/real.rb", "puts \"real\"\n");
    std::os::unix::fs::symlink(&target, lib.join("alias.rb")).unwrap();
    let mut vm = vm_with(&[&lib]);

    assert!(require(&mut vm, "real").unwrap());
    assert!(!require(&mut vm, "alias").unwrap());
    assert_eq!(output(&vm), "real\n");
}

#[test]
fn failed_require_is_not_retried() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let broken = fx.write("lib/broken.rb", "puts \"trying\"\nraise \"broken\"\n");
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "broken").unwrap_err();
    assert_eq!(err.message, "broken");
    assert!(registry(&vm, LOADED_GLOBAL).is_empty());
    assert_eq!(
        registry(&vm, LOADING_GLOBAL),
        vec![broken.display().to_string()]
    );

    assert!(!require(&mut vm, "broken").unwrap());
    assert_eq!(output(&vm), "trying\n");
}

#[test]
fn search_path_can_be_extended_by_scripts() {
    let fx = Fixture::new();
    let late = fx.dir("late");
    fx.write("late/m.rb", "$late = true\n");
    let mut vm = bare_vm();

    let program = format!("$: << {}\nrequire \"m\"\n", crate::common::lit(&late));
    run(&mut vm, &program).unwrap();
    assert_eq!(vm.get_global("$late"), Value::Bool(true));
}

#[test]
fn search_path_can_be_replaced_by_scripts() {
    let fx = Fixture::new();
    let first = fx.dir("first");
    let second = fx.dir("second");
    fx.write("first/m.rb", "$which = \"first\"\n");
    fx.write("second/m.rb", "$which = \"second\"\n");
    let mut vm = vm_with(&[&first]);

    let program = format!("$: = [{}]\nrequire \"m\"\n", crate::common::lit(&second));
    run(&mut vm, &program).unwrap();
    assert_eq!(vm.get_global("$which"), Value::str("second"));
}

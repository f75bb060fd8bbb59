use pretty_assertions::assert_eq;

use ember_load::config::{LOADED_GLOBAL, LOADING_GLOBAL};
use ember_load::{load, require};
use ember_vm::Value;

use crate::common::{output, registry, run, vm_with, Fixture};

#[test]
fn load_executes_every_time() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/tick.rb", "puts \"tick\"\n");
    let mut vm = vm_with(&[&lib]);

    assert!(load(&mut vm, "tick").unwrap());
    assert!(load(&mut vm, "tick").unwrap());
    assert_eq!(output(&vm), "tick\ntick\n");
}

#[test]
fn load_leaves_the_registries_alone() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/m.rb", "");
    let mut vm = vm_with(&[&lib]);

    load(&mut vm, "m").unwrap();
    assert!(registry(&vm, LOADED_GLOBAL).is_empty());
    assert!(registry(&vm, LOADING_GLOBAL).is_empty());
    assert!(require(&mut vm, "m").unwrap());
}

#[test]
fn load_runs_files_that_were_already_required() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/m.rb", "puts \"m\"\n");
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "require \"m\"\nrequire \"m\"\n$l = load \"m\"\n").unwrap();
    assert_eq!(output(&vm), "m\nm\n");
    assert_eq!(vm.get_global("$l"), Value::Bool(true));
}

#[test]
fn load_retries_a_failed_file() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/flaky.rb", "puts \"attempt\"\nraise \"flaky\"\n");
    let mut vm = vm_with(&[&lib]);

    assert!(require(&mut vm, "flaky").is_err());
    assert!(load(&mut vm, "flaky").is_err());
    assert_eq!(output(&vm), "attempt\nattempt\n");
}

#[test]
fn loaded_code_redefines_methods() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let file = fx.write("lib/version.rb", "def version\n  return 1\nend\n");
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "load \"version\"\n$v1 = version\n").unwrap();
    std::fs::write(&file, "def version\n  return 2\nend\n").unwrap();
    run(&mut vm, "load \"version\"\n$v2 = version\n").unwrap();
    assert_eq!(vm.get_global("$v1"), Value::Int(1));
    assert_eq!(vm.get_global("$v2"), Value::Int(2));
}

#[test]
fn globals_set_by_loaded_code_are_shared() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    fx.write("lib/counter.rb", "$count = $count + 1\n");
    let mut vm = vm_with(&[&lib]);

    run(
        &mut vm,
        "$count = 0\nload \"counter\"\nload \"counter.rb\"\nload \"counter\"\n",
    )
    .unwrap();
    assert_eq!(vm.get_global("$count"), Value::Int(3));
}

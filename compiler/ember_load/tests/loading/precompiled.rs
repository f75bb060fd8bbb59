use std::sync::Arc;

use pretty_assertions::assert_eq;

use ember_ir::{write_container, CodeUnit, EntryKind, Instr, BYTECODE_MAGIC};
use ember_load::{compile_file, require};
use ember_vm::{ExceptionKind, Value, Vm};

use crate::common::{output, run, vm_with, Fixture};

const PROGRAM: &str = "\
def shout(word)
  return word + \"!\"
end
$words = [\"a\"]
$words << shout(\"b\")
puts $words
";

fn observe(vm: &Vm) -> (Value, String) {
    (vm.get_global("$words"), output(vm))
}

#[test]
fn source_and_precompiled_have_the_same_effects() {
    let fx = Fixture::new();
    let src_dir = fx.dir("src");
    let bin_dir = fx.dir("bin");
    let src = fx.write("src/prog.rb", PROGRAM);
    compile_file(&src, &bin_dir.join("prog.mrb")).unwrap();

    let mut from_source = vm_with(&[&src_dir]);
    require(&mut from_source, "prog").unwrap();

    let mut from_bytecode = vm_with(&[&bin_dir]);
    require(&mut from_bytecode, "prog").unwrap();

    assert_eq!(observe(&from_source), observe(&from_bytecode));
    assert_eq!(
        from_bytecode.get_global("$words"),
        Value::array(vec![Value::str("a"), Value::str("b!")])
    );
    assert_eq!(output(&from_bytecode), "a\nb!\n");
}

#[test]
fn precompiled_units_are_attributed_to_the_container() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let src = fx.write("build/boom.rb", "raise \"boom\"\n");
    let mrb = lib.join("boom.mrb");
    compile_file(&src, &mrb).unwrap();
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "boom").unwrap_err();
    assert_eq!(err.backtrace, vec![mrb.display().to_string()]);
}

#[test]
fn loaded_bytecode_does_not_halt_the_requirer() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let src = fx.write("build/m.rb", "puts \"m\"\n");
    compile_file(&src, &lib.join("m.mrb")).unwrap();
    let mut vm = vm_with(&[&lib]);

    run(&mut vm, "require \"m\"\nputs \"still running\"\n").unwrap();
    assert_eq!(output(&vm), "m\nstill running\n");
}

#[test]
fn hand_built_container_loads() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let mut unit = CodeUnit::new(EntryKind::Script);
    unit.symbols = vec!["$built".to_owned()];
    unit.code = vec![Instr::LoadInt(7), Instr::SetGlobal(0), Instr::Stop];
    let mut file = std::fs::File::create(lib.join("built.mrb")).unwrap();
    write_container(&mut file, &[Arc::new(unit)]).unwrap();
    drop(file);

    let mut vm = vm_with(&[&lib]);
    assert!(require(&mut vm, "built").unwrap());
    assert_eq!(vm.get_global("$built"), Value::Int(7));
    assert_eq!(vm.code().get(0).unwrap().entry, EntryKind::Callable);
}

#[test]
fn version_mismatch_is_a_script_error() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    let mut bytes = BYTECODE_MAGIC.to_vec();
    bytes.extend_from_slice(&u16::MAX.to_le_bytes());
    std::fs::write(lib.join("future.mrb"), bytes).unwrap();
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "future").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::ScriptError);
    assert!(err.message.contains("version mismatch"), "{}", err.message);
    assert!(vm.code().is_empty());
}

#[test]
fn truncated_container_is_a_script_error() {
    let fx = Fixture::new();
    let lib = fx.dir("lib");
    std::fs::write(lib.join("cut.mrb"), &BYTECODE_MAGIC[..2]).unwrap();
    let mut vm = vm_with(&[&lib]);

    let err = require(&mut vm, "cut").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::ScriptError);
}

//! Core natives available to every program.

use std::rc::Rc;

use ember_stack::ensure_sufficient_stack;

use crate::value::ArrayId;
use crate::{Exception, Value, Vm};

pub(crate) fn register(vm: &mut Vm) {
    vm.define_native("puts", f_puts);
    vm.define_native("print", f_print);
    vm.define_native("p", f_p);
    vm.define_native("raise", f_raise);
}

/// `puts(*args)`: one line per argument, arrays flattened.
fn f_puts(vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    if args.is_empty() {
        vm.println("");
    }
    for arg in args {
        puts_one(vm, arg, &mut Vec::new());
    }
    Ok(Value::Nil)
}

/// An array that contains itself prints `[...]` where it recurs.
fn puts_one(vm: &Vm, value: &Value, open: &mut Vec<ArrayId>) {
    match value {
        Value::Array(items) => {
            let id = Rc::as_ptr(items);
            if open.contains(&id) {
                vm.println("[...]");
                return;
            }
            open.push(id);
            for item in items.borrow().iter() {
                ensure_sufficient_stack(|| puts_one(vm, item, open));
            }
            open.pop();
        }
        other => vm.println(&other.to_string()),
    }
}

fn f_print(vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    for arg in args {
        vm.print(&arg.to_string());
    }
    Ok(Value::Nil)
}

/// `p(*args)`: inspect each argument; returns the argument (or an array of them).
fn f_p(vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    for arg in args {
        vm.println(&arg.inspect());
    }
    Ok(match args {
        [] => Value::Nil,
        [one] => one.clone(),
        many => Value::array(many.to_vec()),
    })
}

/// `raise` / `raise "message"`.
fn f_raise(_vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    match args {
        [] => Err(Exception::runtime_error("unhandled exception")),
        [Value::Str(msg)] => Err(Exception::runtime_error(&**msg)),
        [other] => Err(Exception::type_error(format!(
            "exception class/object expected, got {}",
            other.class_name()
        ))),
        _ => Err(Exception::argument_error(format!(
            "wrong number of arguments (given {}, expected 0..1)",
            args.len()
        ))),
    }
}

//! The bytecode interpreter.
//!
//! Each call gets its own operand stack and local slots; there are no
//! jumps, so a frame is a single pass over the unit's instructions.
//!
//! A trailing `Stop` means different things depending on how the unit was
//! entered. In a [`EntryKind::Script`] unit it halts the whole VM: the
//! `halted` flag is raised and every enclosing frame returns as soon as the
//! call that raised it comes back. In a [`EntryKind::Callable`] unit it
//! simply returns `nil` to the caller, which is what lets a loaded file run
//! as a nested call without ending the program that required it.

use std::sync::Arc;

use ember_ir::{CodeUnit, EntryKind, Instr};
use ember_stack::ensure_sufficient_stack;
use smallvec::{smallvec, SmallVec};

use crate::{Exception, Proc, Value, Vm};

impl Vm {
    /// Run `unit` as the outermost program with `main` as `self`.
    #[tracing::instrument(level = "debug", skip_all, fields(file = unit.filename.as_deref()))]
    pub fn run(&mut self, unit: Arc<CodeUnit>) -> Result<Value, Exception> {
        let receiver = self.top_self();
        let result = self.execute(&unit, &receiver, &[]);
        if self.depth == 0 {
            self.halted = false;
        }
        result
    }

    /// Invoke `proc` like a method call on `receiver`.
    pub fn call_proc(
        &mut self,
        proc: &Proc,
        receiver: Value,
        args: &[Value],
    ) -> Result<Value, Exception> {
        let unit = Arc::clone(&proc.unit);
        check_arity(&unit, args.len())?;
        self.execute(&unit, &receiver, args)
    }

    /// Call method `name` on `receiver`. Script methods shadow natives.
    pub fn send(
        &mut self,
        name: &str,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, Exception> {
        if let Some(body) = self.methods.get(name).cloned() {
            check_arity(&body, args.len())?;
            return self.execute(&body, receiver, args);
        }
        if let Some(native) = self.native(name) {
            return native(self, args);
        }
        Err(Exception::no_method_error(format!(
            "undefined method '{name}' for {}",
            receiver.inspect()
        )))
    }

    /// Enter a new frame for `unit`, enforcing the depth limit and adding
    /// the unit to the backtrace of anything raised inside it.
    fn execute(
        &mut self,
        unit: &Arc<CodeUnit>,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, Exception> {
        if self.depth >= self.max_depth {
            return Err(Exception::runtime_error("stack level too deep"));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.execute_frame(unit, receiver, args));
        self.depth -= 1;
        result.map_err(|mut err| {
            err.push_frame(
                unit.filename
                    .clone()
                    .unwrap_or_else(|| "(unknown)".to_owned()),
            );
            err
        })
    }

    fn execute_frame(
        &mut self,
        unit: &CodeUnit,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, Exception> {
        let mut locals: SmallVec<[Value; 8]> = smallvec![Value::Nil; unit.nlocals as usize];
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = arg.clone();
        }
        let mut stack: Vec<Value> = Vec::with_capacity(8);

        for &instr in &unit.code {
            match instr {
                Instr::LoadNil => stack.push(Value::Nil),
                Instr::LoadBool(b) => stack.push(Value::Bool(b)),
                Instr::LoadInt(n) => stack.push(Value::Int(n)),
                Instr::LoadStr(idx) => {
                    let s = unit.string(idx).ok_or_else(|| bad_operand(instr))?;
                    stack.push(Value::str(s));
                }
                Instr::GetGlobal(sym) => {
                    let name = unit.symbol(sym).ok_or_else(|| bad_operand(instr))?;
                    stack.push(self.get_global(name));
                }
                Instr::SetGlobal(sym) => {
                    let name = unit.symbol(sym).ok_or_else(|| bad_operand(instr))?;
                    let value = pop(&mut stack)?;
                    self.set_global(name, value);
                }
                Instr::GetLocal(slot) => {
                    let value = locals.get(slot as usize).ok_or_else(|| bad_operand(instr))?;
                    stack.push(value.clone());
                }
                Instr::SetLocal(slot) => {
                    let value = pop(&mut stack)?;
                    *locals
                        .get_mut(slot as usize)
                        .ok_or_else(|| bad_operand(instr))? = value;
                }
                Instr::MakeArray(n) => {
                    let at = split_point(&stack, n)?;
                    let items = stack.split_off(at);
                    stack.push(Value::array(items));
                }
                Instr::Add => {
                    let rhs = pop(&mut stack)?;
                    let lhs = pop(&mut stack)?;
                    stack.push(add(lhs, &rhs)?);
                }
                Instr::Shovel => {
                    let item = pop(&mut stack)?;
                    let target = pop(&mut stack)?;
                    stack.push(shovel(target, item)?);
                }
                Instr::Pop => {
                    pop(&mut stack)?;
                }
                Instr::Send { sym, argc } => {
                    let name = unit.symbol(sym).ok_or_else(|| bad_operand(instr))?;
                    let at = split_point(&stack, argc)?;
                    let call_args: SmallVec<[Value; 4]> = stack.drain(at..).collect();
                    let result = self.send(name, receiver, &call_args)?;
                    if self.halted {
                        return Ok(Value::Nil);
                    }
                    stack.push(result);
                }
                Instr::Def { sym, child } => {
                    let name = unit.symbol(sym).ok_or_else(|| bad_operand(instr))?;
                    let body = unit
                        .children
                        .get(child as usize)
                        .ok_or_else(|| bad_operand(instr))?;
                    tracing::trace!(method = name, "def");
                    self.methods.insert(name.to_owned(), Arc::clone(body));
                }
                Instr::Return => return Ok(stack.pop().unwrap_or(Value::Nil)),
                Instr::Stop => {
                    if unit.entry == EntryKind::Script {
                        self.halted = true;
                    }
                    return Ok(Value::Nil);
                }
            }
        }
        Ok(Value::Nil)
    }
}

fn check_arity(unit: &CodeUnit, given: usize) -> Result<(), Exception> {
    if given == unit.argc as usize {
        Ok(())
    } else {
        Err(Exception::argument_error(format!(
            "wrong number of arguments (given {given}, expected {})",
            unit.argc
        )))
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, Exception> {
    stack
        .pop()
        .ok_or_else(|| Exception::script_error("operand stack underflow"))
}

fn split_point(stack: &[Value], n: u16) -> Result<usize, Exception> {
    stack
        .len()
        .checked_sub(n as usize)
        .ok_or_else(|| Exception::script_error("operand stack underflow"))
}

#[cold]
fn bad_operand(instr: Instr) -> Exception {
    Exception::script_error(format!("operand out of range in '{instr}'"))
}

fn add(lhs: Value, rhs: &Value) -> Result<Value, Exception> {
    match (&lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| Exception::runtime_error("integer overflow")),
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
        (Value::Array(a), Value::Array(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::array(items))
        }
        _ => Err(Exception::type_error(format!(
            "{} can't be coerced into {}",
            rhs.class_name(),
            lhs.class_name()
        ))),
    }
}

/// `target << item`: appends in place for arrays and returns the target.
fn shovel(target: Value, item: Value) -> Result<Value, Exception> {
    match &target {
        Value::Array(items) => {
            items.borrow_mut().push(item);
            Ok(target)
        }
        Value::Str(s) => match item.as_str() {
            Some(tail) => Ok(Value::str(format!("{s}{tail}"))),
            None => Err(Exception::type_error(format!(
                "no implicit conversion of {} into String",
                item.class_name()
            ))),
        },
        _ => Err(Exception::no_method_error(format!(
            "undefined method '<<' for {}",
            target.inspect()
        ))),
    }
}

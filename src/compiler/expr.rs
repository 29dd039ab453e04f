use inkwell::{
    types::BasicType,
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, IntValue, PointerValue},
    AddressSpace, IntPredicate,
};

use crate::{
    ast::ast::{Exp, ExpKind, FieldExp, Operator, Var, VarKind},
    errors::errors::Error,
    runtime::{self, ALLOC_ARRAY, ALLOC_RECORD, STRING_COMPARE},
    type_checker::{annotations::CallTarget, types::Ty},
};

use super::{
    compiler::{Compiler, FunctionContext},
    decl::gen_let,
};

/// Generates `exp`, returning its value or `None` for valueless expressions.
pub fn gen_exp<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let checker = compiler.checker;

    match &exp.kind {
        ExpKind::Nil => Ok(Some(compiler.i8_ptr_type().const_null().into())),
        ExpKind::Int(value) => Ok(Some(
            compiler
                .context
                .i64_type()
                .const_int(*value as u64, true)
                .into(),
        )),
        ExpKind::Str(value) => {
            let global = compiler.builder.build_global_string_ptr(value, "str")?;
            Ok(Some(global.as_pointer_value().into()))
        }
        ExpKind::Var(var) => {
            let address = gen_var_address(compiler, ctx, var)?;
            let name = match &var.kind {
                VarKind::Simple(name) => name.as_str(),
                _ => "load",
            };
            Ok(Some(compiler.builder.build_load(address, name)?))
        }
        ExpKind::Call { args, .. } => gen_call(compiler, ctx, exp, args),
        ExpKind::Binary { op, left, right } => {
            gen_binary(compiler, ctx, *op, left, right).map(|value| Some(value.into()))
        }
        ExpKind::Record { fields, .. } => {
            gen_record(compiler, ctx, exp, fields).map(|value| Some(value.into()))
        }
        ExpKind::Sequence(exps) => {
            let mut value = None;
            for exp in exps {
                value = gen_exp(compiler, ctx, exp)?;
            }
            if checker.annotations.exp_type(exp.id) == Ty::Void {
                return Ok(None);
            }
            Ok(value)
        }
        ExpKind::Assign { var, exp } => {
            let address = gen_var_address(compiler, ctx, var)?;
            let value = gen_exp_as(compiler, ctx, exp, checker.annotations.var_type(var.id))?;
            compiler.builder.build_store(address, value)?;
            Ok(None)
        }
        ExpKind::If {
            test,
            then,
            otherwise,
        } => gen_if(compiler, ctx, exp, test, then, otherwise.as_deref()),
        ExpKind::While { test, body } => {
            let test_block = compiler.create_basic_block("while.test", ctx.function);
            let body_block = compiler.create_basic_block("while.body", ctx.function);
            let end_block = compiler.create_basic_block("while.end", ctx.function);

            compiler.builder.build_unconditional_branch(test_block)?;
            compiler.builder.position_at_end(test_block);
            let condition = gen_condition(compiler, ctx, test)?;
            compiler
                .builder
                .build_conditional_branch(condition, body_block, end_block)?;

            compiler.builder.position_at_end(body_block);
            ctx.loops.push((test_block, end_block));
            let body = gen_exp(compiler, ctx, body);
            ctx.loops.pop();
            body?;
            if compiler.needs_terminator() {
                compiler.builder.build_unconditional_branch(test_block)?;
            }

            compiler.builder.position_at_end(end_block);
            Ok(None)
        }
        ExpKind::For { lo, hi, body, .. } => {
            let slot = checker
                .annotations
                .slots
                .get(&exp.id)
                .copied()
                .ok_or_else(|| Error::codegen("loop variable has no slot"))?;
            let lo = gen_int(compiler, ctx, lo)?;
            let hi = gen_int(compiler, ctx, hi)?;
            let frame = compiler.frame_at_level(ctx, slot.level)?;
            let counter = compiler
                .builder
                .build_struct_gep(frame, slot.field_index(), "for.var")?;
            compiler.builder.build_store(counter, lo)?;

            let test_block = compiler.create_basic_block("for.test", ctx.function);
            let body_block = compiler.create_basic_block("for.body", ctx.function);
            let next_block = compiler.create_basic_block("for.next", ctx.function);
            let end_block = compiler.create_basic_block("for.end", ctx.function);

            compiler.builder.build_unconditional_branch(test_block)?;
            compiler.builder.position_at_end(test_block);
            let current = compiler
                .builder
                .build_load(counter, "for.current")?
                .into_int_value();
            let condition =
                compiler
                    .builder
                    .build_int_compare(IntPredicate::SLE, current, hi, "for.cond")?;
            compiler
                .builder
                .build_conditional_branch(condition, body_block, end_block)?;

            compiler.builder.position_at_end(body_block);
            ctx.loops.push((next_block, end_block));
            let body = gen_exp(compiler, ctx, body);
            ctx.loops.pop();
            body?;
            if compiler.needs_terminator() {
                compiler.builder.build_unconditional_branch(next_block)?;
            }

            // Leave before incrementing so `hi` at the top of the range cannot wrap.
            compiler.builder.position_at_end(next_block);
            let current = compiler
                .builder
                .build_load(counter, "for.current")?
                .into_int_value();
            let done =
                compiler
                    .builder
                    .build_int_compare(IntPredicate::EQ, current, hi, "for.done")?;
            let inc_block = compiler.create_basic_block("for.inc", ctx.function);
            compiler
                .builder
                .build_conditional_branch(done, end_block, inc_block)?;

            compiler.builder.position_at_end(inc_block);
            let one = compiler.context.i64_type().const_int(1, false);
            let next = compiler.builder.build_int_add(current, one, "for.step")?;
            compiler.builder.build_store(counter, next)?;
            compiler.builder.build_unconditional_branch(test_block)?;

            compiler.builder.position_at_end(end_block);
            Ok(None)
        }
        ExpKind::Break => {
            let (_, exit) = ctx
                .loops
                .last()
                .copied()
                .ok_or_else(|| Error::codegen("`break` outside of a loop"))?;
            compiler.builder.build_unconditional_branch(exit)?;

            // Anything after the break lands in an unreachable block.
            let unreachable = compiler.create_basic_block("after.break", ctx.function);
            compiler.builder.position_at_end(unreachable);
            Ok(None)
        }
        ExpKind::Let { decs, body } => gen_let(compiler, ctx, decs, body),
        ExpKind::Array { size, init, .. } => {
            gen_array(compiler, ctx, exp, size, init).map(|value| Some(value.into()))
        }
    }
}

/// Generates an expression that must produce a value.
pub fn gen_value<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
) -> Result<BasicValueEnum<'a>, Error> {
    gen_exp(compiler, ctx, exp)?.ok_or_else(|| Error::codegen("expression produced no value"))
}

/// Generates a value destined for a location of type `expected`.
///
/// `nil` becomes the null pointer of the expected record type.
pub fn gen_exp_as<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
    expected: Ty,
) -> Result<BasicValueEnum<'a>, Error> {
    let received = compiler.checker.annotations.exp_type(exp.id);
    if received == Ty::Nil {
        return Ok(compiler.null_of(expected));
    }
    let value = gen_value(compiler, ctx, exp)?;

    match (received, expected) {
        (Ty::Record(_), Ty::Record(_)) if received != expected => {
            // Distinct record types may only meet when their fields line up.
            let registry = &compiler.checker.registry;
            if !registry.same_layout(received, expected) {
                return Err(Error::codegen(format!(
                    "record `{}` does not share the layout of `{}`",
                    registry.type_name(received),
                    registry.type_name(expected)
                )));
            }
            let target = compiler.llvm_type(expected).into_pointer_type();
            Ok(compiler
                .builder
                .build_pointer_cast(value.into_pointer_value(), target, "rec.cast")?
                .into())
        }
        _ => Ok(value),
    }
}

fn gen_int<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
) -> Result<IntValue<'a>, Error> {
    Ok(gen_value(compiler, ctx, exp)?.into_int_value())
}

/// Integer test value turned into an `i1`.
fn gen_condition<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    test: &Exp,
) -> Result<IntValue<'a>, Error> {
    let value = gen_int(compiler, ctx, test)?;
    let zero = compiler.context.i64_type().const_zero();
    Ok(compiler
        .builder
        .build_int_compare(IntPredicate::NE, value, zero, "cond")?)
}

/// Address of an lvalue.
pub fn gen_var_address<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    var: &Var,
) -> Result<PointerValue<'a>, Error> {
    let checker = compiler.checker;

    match &var.kind {
        VarKind::Simple(name) => {
            let reference = checker
                .annotations
                .var_refs
                .get(&var.id)
                .copied()
                .ok_or_else(|| Error::codegen(format!("unresolved variable `{}`", name)))?;
            let frame = compiler.frame_at_level(ctx, reference.slot.level)?;
            Ok(compiler
                .builder
                .build_struct_gep(frame, reference.slot.field_index(), &format!("{}.addr", name))?)
        }
        VarKind::Field(base, field) => {
            let base_type = checker.annotations.var_type(base.id);
            let (index, _) = checker
                .registry
                .field(base_type, field)
                .ok_or_else(|| Error::codegen(format!("unknown field `{}`", field)))?;

            let base_address = gen_var_address(compiler, ctx, base)?;
            let record = compiler
                .builder
                .build_load(base_address, "record")?
                .into_pointer_value();
            Ok(compiler
                .builder
                .build_struct_gep(record, index as u32, &format!("{}.addr", field))?)
        }
        VarKind::Subscript(base, index) => {
            let base_address = gen_var_address(compiler, ctx, base)?;
            let array = compiler
                .builder
                .build_load(base_address, "array")?
                .into_pointer_value();
            let index = gen_int(compiler, ctx, index)?;
            Ok(unsafe { compiler.builder.build_gep(array, &[index], "element.addr")? })
        }
    }
}

fn gen_call<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
    args: &[Exp],
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let checker = compiler.checker;
    let target = checker
        .annotations
        .calls
        .get(&exp.id)
        .copied()
        .ok_or_else(|| Error::codegen("call to an unresolved function"))?;

    let (function, params, result, mut values) = match target {
        CallTarget::Runtime(symbol) => {
            let signature = runtime::by_symbol(symbol)
                .ok_or_else(|| Error::codegen(format!("unknown runtime function `{}`", symbol)))?;
            (
                compiler.runtime_function(symbol)?,
                signature.params.to_vec(),
                signature.result,
                vec![],
            )
        }
        CallTarget::User(id) => {
            let info = checker
                .annotations
                .function(id)
                .ok_or_else(|| Error::codegen(format!("unknown function {}", id)))?;
            let function = compiler.declare_function(id)?;
            // The callee's static link is the frame of the function that declared it.
            let static_link = compiler.frame_at_level(ctx, info.level.saturating_sub(1))?;
            (
                function,
                info.params.clone(),
                info.result,
                vec![BasicMetadataValueEnum::from(static_link)],
            )
        }
    };

    for (arg, param) in args.iter().zip(params) {
        values.push(gen_exp_as(compiler, ctx, arg, param)?.into());
    }

    if result == Ty::Void {
        compiler.builder.build_call(function, &values, "")?;
        return Ok(None);
    }

    let call = compiler.builder.build_call(function, &values, "call")?;
    call.try_as_basic_value()
        .left()
        .map(Some)
        .ok_or_else(|| Error::codegen("call produced no value"))
}

fn gen_binary<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    op: Operator,
    left: &Exp,
    right: &Exp,
) -> Result<IntValue<'a>, Error> {
    let checker = compiler.checker;
    let left_type = checker.annotations.exp_type(left.id);
    let right_type = checker.annotations.exp_type(right.id);

    if op.is_arithmetic() {
        let l = gen_int(compiler, ctx, left)?;
        let r = gen_int(compiler, ctx, right)?;
        let builder = &compiler.builder;
        return Ok(match op {
            Operator::Add => builder.build_int_add(l, r, "add")?,
            Operator::Sub => builder.build_int_sub(l, r, "sub")?,
            Operator::Mul => builder.build_int_mul(l, r, "mul")?,
            _ => builder.build_int_signed_div(l, r, "div")?,
        });
    }

    let predicate = match op {
        Operator::Eq => IntPredicate::EQ,
        Operator::Neq => IntPredicate::NE,
        Operator::Lt => IntPredicate::SLT,
        Operator::Le => IntPredicate::SLE,
        Operator::Gt => IntPredicate::SGT,
        _ => IntPredicate::SGE,
    };
    let i64_type = compiler.context.i64_type();

    let (l, r) = match (left_type, right_type) {
        (Ty::Int, _) => (gen_int(compiler, ctx, left)?, gen_int(compiler, ctx, right)?),
        (Ty::String, _) => {
            let l = gen_value(compiler, ctx, left)?;
            let r = gen_value(compiler, ctx, right)?;
            let compare = compiler.runtime_function(STRING_COMPARE)?;
            let ordering = compiler
                .builder
                .build_call(compare, &[l.into(), r.into()], "strcmp")?
                .try_as_basic_value()
                .left()
                .ok_or_else(|| Error::codegen("string comparison produced no value"))?
                .into_int_value();
            (ordering, i64_type.const_zero())
        }
        _ => {
            // Records and arrays compare by address; `nil` takes the other side's type.
            let pointer_type = if left_type == Ty::Nil { right_type } else { left_type };
            let l = gen_exp_as(compiler, ctx, left, pointer_type)?.into_pointer_value();
            let r = gen_exp_as(compiler, ctx, right, pointer_type)?.into_pointer_value();
            (
                compiler.builder.build_ptr_to_int(l, i64_type, "lhs.addr")?,
                compiler.builder.build_ptr_to_int(r, i64_type, "rhs.addr")?,
            )
        }
    };

    let flag = compiler.builder.build_int_compare(predicate, l, r, "cmp")?;
    Ok(compiler.builder.build_int_z_extend(flag, i64_type, "bool")?)
}

fn gen_if<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
    test: &Exp,
    then: &Exp,
    otherwise: Option<&Exp>,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let result_type = compiler.checker.annotations.exp_type(exp.id);
    let condition = gen_condition(compiler, ctx, test)?;

    let then_block = compiler.create_basic_block("if.then", ctx.function);
    let else_block = otherwise.map(|_| compiler.create_basic_block("if.else", ctx.function));
    let end_block = compiler.create_basic_block("if.end", ctx.function);

    compiler.builder.build_conditional_branch(
        condition,
        then_block,
        else_block.unwrap_or(end_block),
    )?;

    let Some(otherwise) = otherwise else {
        compiler.builder.position_at_end(then_block);
        gen_exp(compiler, ctx, then)?;
        if compiler.needs_terminator() {
            compiler.builder.build_unconditional_branch(end_block)?;
        }
        compiler.builder.position_at_end(end_block);
        return Ok(None);
    };

    let produces_value = result_type != Ty::Void;
    let mut incoming = vec![];
    for (block, branch) in [(then_block, then), (else_block.unwrap_or(end_block), otherwise)] {
        compiler.builder.position_at_end(block);
        let value = if produces_value {
            Some(gen_exp_as(compiler, ctx, branch, result_type)?)
        } else {
            gen_exp(compiler, ctx, branch)?;
            None
        };

        if compiler.needs_terminator() {
            if let (Some(value), Some(current)) = (value, compiler.builder.get_insert_block()) {
                incoming.push((value, current));
            }
            compiler.builder.build_unconditional_branch(end_block)?;
        }
    }

    compiler.builder.position_at_end(end_block);
    if !produces_value {
        return Ok(None);
    }

    let llvm_type = compiler.llvm_type(result_type);
    if incoming.is_empty() {
        return Ok(Some(llvm_type.const_zero()));
    }
    let phi = compiler.builder.build_phi(llvm_type, "if.value")?;
    for (value, block) in incoming.iter() {
        phi.add_incoming(&[(value as &dyn BasicValue<'a>, *block)]);
    }
    Ok(Some(phi.as_basic_value()))
}

fn gen_record<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
    fields: &[FieldExp],
) -> Result<PointerValue<'a>, Error> {
    let checker = compiler.checker;
    let ty = checker.annotations.exp_type(exp.id);
    let Ty::Record(id) = ty else {
        return Err(Error::codegen("record construction of a non-record type"));
    };
    let declared = checker
        .registry
        .record(id)
        .map(|record| record.fields.clone())
        .unwrap_or_default();

    let struct_type = compiler.record_type(id)?;
    let size = struct_type
        .size_of()
        .ok_or_else(|| Error::codegen("record type has no size"))?;
    let alloc = compiler.runtime_function(ALLOC_RECORD)?;
    let raw = compiler
        .builder
        .build_call(alloc, &[size.into()], "raw")?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| Error::codegen("allocation produced no value"))?
        .into_pointer_value();
    let record = compiler.builder.build_pointer_cast(
        raw,
        struct_type.ptr_type(AddressSpace::default()),
        "record",
    )?;

    for (index, (field, (_, field_type))) in fields.iter().zip(declared).enumerate() {
        let value = gen_exp_as(compiler, ctx, &field.exp, field_type)?;
        let address = compiler.builder.build_struct_gep(
            record,
            index as u32,
            &format!("{}.addr", field.name),
        )?;
        compiler.builder.build_store(address, value)?;
    }

    Ok(record)
}

fn gen_array<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    exp: &Exp,
    size: &Exp,
    init: &Exp,
) -> Result<PointerValue<'a>, Error> {
    let checker = compiler.checker;
    let element = checker
        .registry
        .element(checker.annotations.exp_type(exp.id))
        .ok_or_else(|| Error::codegen("array construction of a non-array type"))?;
    let element_type = compiler.llvm_type(element);
    let i64_type = compiler.context.i64_type();

    let count = gen_int(compiler, ctx, size)?;
    let element_size = element_type
        .size_of()
        .ok_or_else(|| Error::codegen("array element has no size"))?;
    let alloc = compiler.runtime_function(ALLOC_ARRAY)?;
    let raw = compiler
        .builder
        .build_call(alloc, &[count.into(), element_size.into()], "raw")?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| Error::codegen("allocation produced no value"))?
        .into_pointer_value();
    let array = compiler.builder.build_pointer_cast(
        raw,
        element_type.ptr_type(AddressSpace::default()),
        "array",
    )?;
    let value = gen_exp_as(compiler, ctx, init, element)?;

    let index = compiler.entry_alloca(ctx, i64_type.into(), "array.index")?;
    compiler.builder.build_store(index, i64_type.const_zero())?;

    let test_block = compiler.create_basic_block("array.test", ctx.function);
    let body_block = compiler.create_basic_block("array.body", ctx.function);
    let end_block = compiler.create_basic_block("array.end", ctx.function);

    compiler.builder.build_unconditional_branch(test_block)?;
    compiler.builder.position_at_end(test_block);
    let current = compiler
        .builder
        .build_load(index, "array.i")?
        .into_int_value();
    let condition =
        compiler
            .builder
            .build_int_compare(IntPredicate::SLT, current, count, "array.cond")?;
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    let slot = unsafe { compiler.builder.build_gep(array, &[current], "array.slot")? };
    compiler.builder.build_store(slot, value)?;
    let one = i64_type.const_int(1, false);
    let next = compiler.builder.build_int_add(current, one, "array.next")?;
    compiler.builder.build_store(index, next)?;
    compiler.builder.build_unconditional_branch(test_block)?;

    compiler.builder.position_at_end(end_block);
    Ok(array)
}

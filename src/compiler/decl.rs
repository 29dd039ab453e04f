use inkwell::values::{BasicValueEnum, FunctionValue};
use log::debug;

use crate::{
    ast::ast::{Dec, DecKind, Exp, Field},
    errors::errors::Error,
    type_checker::{annotations::FunctionId, types::Ty},
};

use super::{
    compiler::{Compiler, FunctionContext},
    expr::{gen_exp, gen_exp_as},
};

/// Generates the declarations of a `let`, then its body.
pub fn gen_let<'a>(
    compiler: &mut Compiler<'a, '_>,
    ctx: &mut FunctionContext<'a>,
    decs: &[Dec],
    body: &Exp,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let checker = compiler.checker;

    // Every prototype first, so bodies can call functions declared after them.
    for dec in decs {
        if let Some(function) = checker.annotations.function_decs.get(&dec.id) {
            compiler.declare_function(*function)?;
        }
    }

    for dec in decs {
        match &dec.kind {
            DecKind::Var { init, .. } => {
                let slot = checker
                    .annotations
                    .slots
                    .get(&dec.id)
                    .copied()
                    .ok_or_else(|| Error::codegen("variable has no slot"))?;
                if slot.frame != ctx.frame {
                    return Err(Error::codegen("variable declared outside the running frame"));
                }
                let ty = checker
                    .frames
                    .frame(slot.frame)
                    .and_then(|frame| frame.slots.get(slot.offset))
                    .copied()
                    .unwrap_or(Ty::Error);

                let value = gen_exp_as(compiler, ctx, init, ty)?;
                let address = compiler.builder.build_struct_gep(
                    ctx.frame_ptr,
                    slot.field_index(),
                    "var.addr",
                )?;
                compiler.builder.build_store(address, value)?;
            }
            DecKind::Function { .. } => {
                let function = checker
                    .annotations
                    .function_decs
                    .get(&dec.id)
                    .copied()
                    .ok_or_else(|| Error::codegen("function was never declared"))?;
                gen_function(compiler, function, dec)?;
            }
            DecKind::Type { .. } => {}
        }
    }

    gen_exp(compiler, ctx, body)
}

/// Emits the body of a user function.
///
/// The prologue allocates the frame and copies the static link and every
/// parameter into it. If anything fails the half-built function is removed
/// from the module.
pub fn gen_function<'a>(
    compiler: &mut Compiler<'a, '_>,
    id: FunctionId,
    dec: &Dec,
) -> Result<(), Error> {
    let DecKind::Function { params, body, .. } = &dec.kind else {
        return Err(Error::codegen("expected a function declaration"));
    };
    let checker = compiler.checker;
    let info = checker
        .annotations
        .function(id)
        .ok_or_else(|| Error::codegen(format!("unknown function {}", id)))?;
    let function = compiler.declare_function(id)?;

    let previous_position = compiler.builder.get_insert_block();
    let result = gen_function_body(compiler, function, id, params, body);

    if let Some(position) = previous_position {
        compiler.builder.position_at_end(position);
    } else {
        compiler.builder.clear_insertion_position();
    }

    match result {
        Ok(()) => {
            debug!("emitted function `{}`", info.symbol);
            Ok(())
        }
        Err(error) => {
            unsafe { function.delete() };
            compiler.functions.remove(&id);
            Err(error)
        }
    }
}

fn gen_function_body<'a>(
    compiler: &mut Compiler<'a, '_>,
    function: FunctionValue<'a>,
    id: FunctionId,
    params: &[Field],
    body: &Exp,
) -> Result<(), Error> {
    let checker = compiler.checker;
    let info = checker
        .annotations
        .function(id)
        .ok_or_else(|| Error::codegen(format!("unknown function {}", id)))?;

    let entry = compiler.create_basic_block("entry", function);
    compiler.builder.position_at_end(entry);

    let static_link = function
        .get_first_param()
        .ok_or_else(|| Error::codegen("function has no static link parameter"))?;
    let frame_ptr = compiler.create_frame(info.frame, static_link)?;

    for (param, value) in params.iter().zip(function.get_params().into_iter().skip(1)) {
        let slot = checker
            .annotations
            .slots
            .get(&param.id)
            .copied()
            .ok_or_else(|| Error::codegen(format!("parameter `{}` has no slot", param.name)))?;
        let address = compiler.builder.build_struct_gep(
            frame_ptr,
            slot.field_index(),
            &format!("{}.addr", param.name),
        )?;
        compiler.builder.build_store(address, value)?;
    }

    let mut ctx = FunctionContext {
        function,
        frame: info.frame,
        level: info.level,
        frame_ptr,
        loops: vec![],
    };

    if info.result == Ty::Void {
        gen_exp(compiler, &mut ctx, body)?;
        if compiler.needs_terminator() {
            compiler.builder.build_return(None)?;
        }
    } else {
        let value = gen_exp_as(compiler, &mut ctx, body, info.result)?;
        if compiler.needs_terminator() {
            compiler.builder.build_return(Some(&value))?;
        }
    }

    Ok(())
}

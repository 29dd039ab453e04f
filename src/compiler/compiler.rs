//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives the lowering
//! of a checked syntax tree to LLVM IR. It owns the LLVM module and builder,
//! converts resolved types to LLVM types and lays out frame and record
//! structs before any code is emitted.

use std::collections::HashMap;

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType},
    values::{BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace, OptimizationLevel,
};
use log::{debug, info, warn};

use crate::{
    ast::ast::Exp,
    errors::errors::Error,
    runtime::{self, ALLOC_ARRAY, ALLOC_RECORD, STRING_COMPARE},
    type_checker::{
        annotations::FunctionId,
        frame::{static_link_hops, FrameId, MAIN_FRAME},
        type_checker::TypeChecker,
        types::{Ty, TypeId},
    },
    Config,
};

use super::expr::gen_exp;

/// Per-function generation state, threaded through every emit call.
pub struct FunctionContext<'a> {
    pub function: FunctionValue<'a>,
    pub frame: FrameId,
    pub level: usize,
    /// The frame struct of the running activation.
    pub frame_ptr: PointerValue<'a>,
    /// `(continue, exit)` blocks of the enclosing loops, innermost last.
    pub loops: Vec<(BasicBlock<'a>, BasicBlock<'a>)>,
}

/// The main compiler structure that holds the state of code generation.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
/// * `'c` - Lifetime of the checker results being lowered
pub struct Compiler<'a, 'c> {
    /// Checked program state: types, frames and the annotation side table
    pub checker: &'c TypeChecker,

    /// Named struct of every frame, including `main`
    pub frame_types: HashMap<FrameId, StructType<'a>>,
    /// Named struct of every record type
    pub record_types: HashMap<TypeId, StructType<'a>>,
    /// Declared user functions
    pub functions: HashMap<FunctionId, FunctionValue<'a>>,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
}

impl<'a, 'c> Compiler<'a, 'c> {
    pub fn new(checker: &'c TypeChecker, context: &'a Context, module_name: &str) -> Self {
        Compiler {
            checker,
            frame_types: HashMap::new(),
            record_types: HashMap::new(),
            functions: HashMap::new(),
            module: context.create_module(module_name),
            builder: context.create_builder(),
            context,
        }
    }

    /// Stamps the host triple and data layout onto the module.
    fn configure_target(&self) -> Result<(), String> {
        Target::initialize_native(&InitializationConfig::default())?;
        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple).map_err(|error| error.to_string())?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| String::from("no target machine for the host triple"))?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());
        Ok(())
    }

    /// Creates the named structs of all records, then fills in their bodies.
    ///
    /// Records may refer to each other, so every struct has to exist before
    /// any body is set.
    fn declare_records(&mut self) {
        for (id, record) in self.checker.registry.records() {
            let name = format!("rec.{}.{}", record.name, id);
            self.record_types
                .insert(id, self.context.opaque_struct_type(&name));
        }

        for (id, record) in self.checker.registry.records() {
            let fields = record
                .fields
                .iter()
                .map(|(_, ty)| self.llvm_type(*ty))
                .collect::<Vec<BasicTypeEnum<'a>>>();
            if let Some(struct_type) = self.record_types.get(&id) {
                struct_type.set_body(&fields, false);
            }
        }
    }

    /// Creates one struct per frame: the static link followed by the slots.
    fn declare_frames(&mut self) -> Result<(), Error> {
        for (id, frame) in self.checker.frames.frames() {
            if !frame.finalized {
                return Err(Error::codegen(format!(
                    "frame `{}` was never finalized by the checker",
                    frame.name
                )));
            }
            let name = format!("frame.{}", frame.name);
            self.frame_types
                .insert(id, self.context.opaque_struct_type(&name));
        }

        for (id, frame) in self.checker.frames.frames() {
            let mut fields = vec![self.static_link_type(frame.parent)];
            fields.extend(frame.slots.iter().map(|ty| self.llvm_type(*ty)));

            if let Some(struct_type) = self.frame_types.get(&id) {
                struct_type.set_body(&fields, false);
            }
        }
        Ok(())
    }

    fn static_link_type(&self, parent: Option<FrameId>) -> BasicTypeEnum<'a> {
        match parent.and_then(|parent| self.frame_types.get(&parent)) {
            Some(parent) => parent.ptr_type(AddressSpace::default()).into(),
            None => self.i8_ptr_type().into(),
        }
    }

    pub fn frame_type(&self, frame: FrameId) -> Result<StructType<'a>, Error> {
        self.frame_types
            .get(&frame)
            .copied()
            .ok_or_else(|| Error::codegen(format!("no layout for frame {}", frame)))
    }

    pub fn record_type(&self, id: TypeId) -> Result<StructType<'a>, Error> {
        self.record_types
            .get(&id)
            .copied()
            .ok_or_else(|| Error::codegen(format!("no layout for record {}", id)))
    }

    pub fn i8_ptr_type(&self) -> inkwell::types::PointerType<'a> {
        self.context.i8_type().ptr_type(AddressSpace::default())
    }

    /// Converts a resolved type to the LLVM type of its values.
    ///
    /// Records are pointers to their struct, arrays pointers to their
    /// elements. `nil` and the non-value types fall back to `i8*`.
    pub fn llvm_type(&self, ty: Ty) -> BasicTypeEnum<'a> {
        match ty {
            Ty::Int => self.context.i64_type().into(),
            Ty::String => self.i8_ptr_type().into(),
            Ty::Record(id) => match self.record_types.get(&id) {
                Some(struct_type) => struct_type.ptr_type(AddressSpace::default()).into(),
                None => self.i8_ptr_type().into(),
            },
            Ty::Array(id) => match self.checker.registry.array(id) {
                Some(array) => self
                    .llvm_type(array.element)
                    .ptr_type(AddressSpace::default())
                    .into(),
                None => self.i8_ptr_type().into(),
            },
            Ty::Nil | Ty::Void | Ty::Error => self.i8_ptr_type().into(),
        }
    }

    pub fn function_type(&self, params: &[BasicTypeEnum<'a>], result: Ty) -> FunctionType<'a> {
        let params = params
            .iter()
            .map(|param| (*param).into())
            .collect::<Vec<BasicMetadataTypeEnum<'a>>>();

        match result {
            Ty::Void => self.context.void_type().fn_type(&params, false),
            other => self.llvm_type(other).fn_type(&params, false),
        }
    }

    /// Null of the pointer type that represents `ty`.
    pub fn null_of(&self, ty: Ty) -> BasicValueEnum<'a> {
        match self.llvm_type(ty) {
            BasicTypeEnum::PointerType(pointer) => pointer.const_null().into(),
            other => other.const_zero(),
        }
    }

    /// Declares the prototype of a user function; bodies are emitted later.
    pub fn declare_function(&mut self, function: FunctionId) -> Result<FunctionValue<'a>, Error> {
        if let Some(value) = self.functions.get(&function) {
            return Ok(*value);
        }
        let checker = self.checker;
        let info = checker
            .annotations
            .function(function)
            .ok_or_else(|| Error::codegen(format!("unknown function {}", function)))?;

        let frame = checker
            .frames
            .frame(info.frame)
            .ok_or_else(|| Error::codegen(format!("no frame for `{}`", info.name)))?;
        let mut params = vec![self.static_link_type(frame.parent)];
        params.extend(info.params.iter().map(|ty| self.llvm_type(*ty)));

        let function_type = self.function_type(&params, info.result);
        let value = self.create_function_proto(&info.symbol, function_type, Linkage::Internal);
        self.functions.insert(function, value);
        Ok(value)
    }

    /// The declaration of a runtime symbol, added on first use.
    pub fn runtime_function(&self, symbol: &str) -> Result<FunctionValue<'a>, Error> {
        if let Some(function) = self.module.get_function(symbol) {
            return Ok(function);
        }

        let i64_type = self.context.i64_type();
        let function_type = match symbol {
            ALLOC_RECORD => self.i8_ptr_type().fn_type(&[i64_type.into()], false),
            ALLOC_ARRAY => self
                .i8_ptr_type()
                .fn_type(&[i64_type.into(), i64_type.into()], false),
            STRING_COMPARE => i64_type.fn_type(
                &[self.i8_ptr_type().into(), self.i8_ptr_type().into()],
                false,
            ),
            symbol => {
                let function = runtime::by_symbol(symbol)
                    .ok_or_else(|| Error::codegen(format!("unknown runtime function `{}`", symbol)))?;
                let params = function
                    .params
                    .iter()
                    .map(|ty| self.llvm_type(*ty))
                    .collect::<Vec<BasicTypeEnum<'a>>>();
                self.function_type(&params, function.result)
            }
        };

        Ok(self
            .module
            .add_function(symbol, function_type, Some(Linkage::External)))
    }

    /// Creates the function prototype in the module and tags it `nounwind`.
    fn create_function_proto(
        &self,
        name: &str,
        function_type: FunctionType<'a>,
        linkage: Linkage,
    ) -> FunctionValue<'a> {
        let function = self.module.add_function(name, function_type, Some(linkage));

        let nounwind = self
            .context
            .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0);
        function.add_attribute(AttributeLoc::Function, nounwind);

        function
    }

    /// Creates a new basic block in the given function.
    pub fn create_basic_block(&self, name: &str, function: FunctionValue<'a>) -> BasicBlock<'a> {
        self.context.append_basic_block(function, name)
    }

    /// Allocates the frame of a new activation in the entry block and stores its static link.
    pub fn create_frame(
        &self,
        frame: FrameId,
        static_link: BasicValueEnum<'a>,
    ) -> Result<PointerValue<'a>, Error> {
        let frame_type = self.frame_type(frame)?;
        let frame_ptr = self.builder.build_alloca(frame_type, "frame")?;
        let link = self.builder.build_struct_gep(frame_ptr, 0, "sl.addr")?;
        self.builder.build_store(link, static_link)?;
        Ok(frame_ptr)
    }

    /// Follows static links from the running frame up to the frame at `level`.
    pub fn frame_at_level(
        &self,
        ctx: &FunctionContext<'a>,
        level: usize,
    ) -> Result<PointerValue<'a>, Error> {
        let mut frame = ctx.frame_ptr;
        for _ in 0..static_link_hops(ctx.level, level) {
            let link = self.builder.build_struct_gep(frame, 0, "sl.addr")?;
            frame = self
                .builder
                .build_load(link, "sl.hop")?
                .into_pointer_value();
        }
        Ok(frame)
    }

    /// Allocates a stack temporary at the top of the function's entry block.
    pub fn entry_alloca(
        &self,
        ctx: &FunctionContext<'a>,
        ty: BasicTypeEnum<'a>,
        name: &str,
    ) -> Result<PointerValue<'a>, Error> {
        let entry = ctx
            .function
            .get_first_basic_block()
            .ok_or_else(|| Error::codegen("function has no entry block"))?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }
        Ok(builder.build_alloca(ty, name)?)
    }

    /// Whether the block the builder sits in still needs a terminator.
    pub fn needs_terminator(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|block| block.get_terminator().is_none())
    }

    /// Emits `main`, which runs the whole program in frame level 0.
    fn gen_main(&mut self, ast: &Exp) -> Result<(), Error> {
        let main_type = self.context.i32_type().fn_type(&[], false);
        let main = self.create_function_proto("main", main_type, Linkage::External);
        let entry = self.create_basic_block("entry", main);
        self.builder.position_at_end(entry);

        let frame_ptr = self.create_frame(MAIN_FRAME, self.i8_ptr_type().const_null().into())?;
        let mut ctx = FunctionContext {
            function: main,
            frame: MAIN_FRAME,
            level: 0,
            frame_ptr,
            loops: vec![],
        };

        gen_exp(self, &mut ctx, ast)?;

        if self.needs_terminator() {
            self.builder
                .build_return(Some(&self.context.i32_type().const_zero()))?;
        }
        Ok(())
    }

    /// Lowers the program and optionally verifies the result.
    fn compile(&mut self, ast: &Exp, config: &Config) -> Result<(), Error> {
        if config.host_target {
            if let Err(message) = self.configure_target() {
                warn!("emitting target-independent IR: {}", message);
            }
        }

        self.declare_records();
        self.declare_frames()?;
        info!(
            "generating code for {} function(s), {} record type(s)",
            ast.function_count(),
            self.record_types.len()
        );

        self.gen_main(ast)?;

        if config.verify {
            self.module
                .verify()
                .map_err(|message| Error::codegen(message.to_string()))?;
            debug!("module `{}` verified", config.module_name);
        }
        Ok(())
    }
}

/// Generates the LLVM module for a program that checked without errors.
///
/// # Arguments
///
/// * `ast` - Root expression of the program
/// * `checker` - Checker state holding types, frames and annotations for `ast`
/// * `context` - LLVM context owning the module
/// * `config` - Module name, verification and target settings
pub fn compile_module<'a, 'c>(
    ast: &Exp,
    checker: &'c TypeChecker,
    context: &'a Context,
    config: &Config,
) -> Result<Compiler<'a, 'c>, Error> {
    if checker.had_error() {
        return Err(Error::codegen("program has semantic errors"));
    }

    let mut compiler = Compiler::new(checker, context, &config.module_name);
    compiler.compile(ast, config)?;
    Ok(compiler)
}

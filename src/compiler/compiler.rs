//! Main compiler module.
//!
//! This module contains the Compiler structure that renders a type checked
//! program as a single C translation unit, and the driver that hands that
//! unit to the system C compiler.

use std::{
    fs, io,
    path::PathBuf,
    process::{Command, ExitStatus},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    errors::errors::{Error, ErrorImpl},
    ir::ir::{OpKind, Operation, Program},
    types::types::Type,
    Position,
};

use super::{
    expr::{c_name, c_type, gen_expression, CExpr},
    stmt::{declared_vars, gen_declarations, gen_operation},
};

const HEADER: &str = r#"#include <stdint.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>

typedef int32_t i32;
typedef int64_t i64;
typedef float f32;
typedef double f64;
typedef uint8_t boolean;
typedef uint8_t byte;
"#;

const RUNTIME: &str = r#"static byte global_memory[MEMORY_CAPACITY > 0 ? MEMORY_CAPACITY : 1];

static void print_i32(i32 value) { printf("%d\n", (int)value); }
static void print_i64(i64 value) { printf("%lld\n", (long long)value); }
static void print_f32(f32 value) { printf("%f\n", (double)value); }
static void print_f64(f64 value) { printf("%f\n", value); }
static void print_boolean(boolean value) { printf("%s\n", value ? "true" : "false"); }
static void print_byte(byte value) { printf("%c\n", value); }
static void print_ptr(const char *pointee, i64 offset) { printf("^%s(%lld)\n", pointee, (long long)offset); }

static void missing_return(const char *function)
{
    fprintf(stderr, "function %s returned no value\n", function);
    exit(1);
}

static void check_bounds(i64 offset, i64 size)
{
    if (offset < 0 || offset + size > MEMORY_CAPACITY) {
        fprintf(stderr, "memory access out of bounds: offset %lld, size %lld, capacity %lld\n",
                (long long)offset, (long long)size, (long long)MEMORY_CAPACITY);
        exit(1);
    }
}

static uint64_t load_be(i64 offset, i64 size)
{
    uint64_t bits = 0;
    check_bounds(offset, size);
    for (i64 i = 0; i < size; i++) {
        bits = (bits << 8) | global_memory[offset + i];
    }
    return bits;
}

static void store_be(i64 offset, i64 size, uint64_t bits)
{
    check_bounds(offset, size);
    for (i64 i = size - 1; i >= 0; i--) {
        global_memory[offset + i] = (byte)(bits & 0xff);
        bits >>= 8;
    }
}

static i32 load_i32(i64 offset) { return (i32)(uint32_t)load_be(offset, 4); }
static i64 load_i64(i64 offset) { return (i64)load_be(offset, 8); }
static f32 load_f32(i64 offset) { uint32_t bits = (uint32_t)load_be(offset, 4); f32 value; memcpy(&value, &bits, 4); return value; }
static f64 load_f64(i64 offset) { uint64_t bits = load_be(offset, 8); f64 value; memcpy(&value, &bits, 8); return value; }
static boolean load_boolean(i64 offset) { return (boolean)load_be(offset, 1); }
static byte load_byte(i64 offset) { return (byte)load_be(offset, 1); }

static void store_i32(i64 offset, i32 value) { store_be(offset, 4, (uint32_t)value); }
static void store_i64(i64 offset, i64 value) { store_be(offset, 8, (uint64_t)value); }
static void store_f32(i64 offset, f32 value) { uint32_t bits; memcpy(&bits, &value, 4); store_be(offset, 4, bits); }
static void store_f64(i64 offset, f64 value) { uint64_t bits; memcpy(&bits, &value, 8); store_be(offset, 8, bits); }
static void store_boolean(i64 offset, boolean value) { store_be(offset, 1, value); }
static void store_byte(i64 offset, byte value) { store_be(offset, 1, value); }
"#;

/// Options of `huskyc compile`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// C compiler executable.
    pub cc: String,
    /// Path of the produced executable; the C source is written next to it.
    pub output: PathBuf,
    /// Stop after writing the C source.
    pub emit_c_only: bool,
}

impl CompileOptions {
    pub fn c_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.c", self.output.display()))
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("failed to run C compiler `{cc}`: {source}")]
    Spawn { cc: String, source: io::Error },
    #[error("C compiler `{cc}` exited with {status}")]
    Failed { cc: String, status: ExitStatus },
}

/// The state of one C emission.
pub struct Compiler<'a> {
    pub program: &'a Program,
    /// The translation unit built so far.
    pub output: String,
    pub indent: usize,
    /// Declaration types of the open scopes; the global scope stays at index 0.
    pub scopes: Vec<Vec<Type>>,
    /// The `Push` awaiting its consuming operation.
    pub pending: Option<&'a Operation>,
}

impl<'a> Compiler<'a> {
    pub fn new(program: &'a Program) -> Self {
        Compiler {
            program,
            output: String::new(),
            indent: 0,
            scopes: vec![],
            pending: None,
        }
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn open_scope(&mut self, operation: &Operation) {
        self.scopes
            .push(declared_vars(operation).map(|(_, ty)| ty.clone()).collect());
        self.indent += 1;
    }

    pub fn close_scope(&mut self) {
        self.scopes.pop();
        self.indent = self.indent.saturating_sub(1);
    }

    /// Renders the expression of the pending `Push`.
    pub fn pending_expression(&mut self, position: &Position) -> Result<CExpr, Error> {
        let operation = self.pending.take().ok_or_else(|| {
            Error::new(
                ErrorImpl::MalformedExpression { remaining: 0 },
                position.clone(),
            )
        })?;

        gen_expression(&self.scopes, operation.tokens(), &operation.position)
    }

    fn gen_globals(&mut self, scope: &Operation) {
        self.scopes
            .push(declared_vars(scope).map(|(_, ty)| ty.clone()).collect());
        gen_declarations(self, scope, 0, "static ");
        self.line("");
    }

    fn signature(&self, index: usize) -> String {
        let function = &self.program.functions[index];
        let parameters = function.signature.inputs.len();

        let inputs = function
            .operations
            .first()
            .map(|scope| {
                declared_vars(scope)
                    .take(parameters)
                    .map(|(var, ty)| format!("{} {}", c_type(ty), c_name(var)))
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();
        let inputs = if inputs.is_empty() {
            String::from("void")
        } else {
            inputs.join(", ")
        };

        format!(
            "static {} fn_{}({})",
            c_type(&function.signature.output()),
            index,
            inputs
        )
    }

    fn gen_function_table(&mut self) {
        let count = self.program.functions.len();
        if count == 0 {
            return;
        }

        for index in 0..count {
            let prototype = format!("{};", self.signature(index));
            self.line(&prototype);
        }

        let entries = (0..count)
            .map(|index| format!("(void *)fn_{}", index))
            .collect::<Vec<String>>();
        self.line(&format!("static void *funcs[] = {{ {} }};", entries.join(", ")));
        self.line("");
    }

    /// Emits `operations` between their outer `BeginScope` and `EndScope`.
    fn gen_body(&mut self, operations: &'a [Operation]) -> Result<(), Error> {
        let inner = match operations {
            [first, inner @ .., last]
                if first.kind == OpKind::BeginScope && last.kind == OpKind::EndScope =>
            {
                inner
            }
            _ => operations,
        };

        for operation in inner {
            gen_operation(self, operation)?;
        }

        Ok(())
    }

    fn gen_function(&mut self, index: usize) -> Result<(), Error> {
        let program = self.program;
        let function = &program.functions[index];
        let Some(scope) = function.operations.first() else {
            return Ok(());
        };

        let signature = self.signature(index);
        self.line(&signature);
        self.line("{");
        self.open_scope(scope);
        gen_declarations(self, scope, function.signature.inputs.len(), "");

        self.gen_body(&function.operations)?;

        self.line(&format!("missing_return(\"{}\");", function.name));
        self.line("return 0;");
        self.close_scope();
        self.line("}");
        self.line("");

        debug!(function = %function.name, index, "emitted function");
        Ok(())
    }

    fn gen_main(&mut self) -> Result<(), Error> {
        let program = self.program;

        self.line("int main(void)");
        self.line("{");
        self.indent += 1;
        self.gen_body(&program.operations)?;
        self.line("return 0;");
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
        Ok(())
    }
}

/// Renders a type checked program as a C translation unit.
///
/// Globals become file-scope statics, every function a `static` C function
/// reached through the `funcs` table, and the top-level operations `main`.
pub fn compile(program: &Program) -> Result<String, Error> {
    let mut compiler = Compiler::new(program);

    compiler.output.push_str(HEADER);
    compiler.line("");
    compiler.line(&format!("#define MEMORY_CAPACITY {}", program.memory_capacity));
    compiler.line("");
    compiler.output.push_str(RUNTIME);
    compiler.line("");

    if let Some(scope) = program.operations.first() {
        compiler.gen_globals(scope);
    }
    compiler.gen_function_table();

    for index in 0..program.functions.len() {
        compiler.gen_function(index)?;
    }
    compiler.gen_main()?;

    Ok(compiler.output)
}

/// Writes `c_source` next to the output path and, unless only C was
/// requested, runs the C compiler on it.
pub fn build(c_source: &str, options: &CompileOptions) -> Result<(), BuildError> {
    let c_path = options.c_path();
    fs::write(&c_path, c_source).map_err(|source| BuildError::Write {
        path: c_path.display().to_string(),
        source,
    })?;
    info!(path = %c_path.display(), "wrote C source");

    if options.emit_c_only {
        return Ok(());
    }

    let status = Command::new(&options.cc)
        .arg(&c_path)
        .arg("-o")
        .arg(&options.output)
        .status()
        .map_err(|source| BuildError::Spawn {
            cc: options.cc.clone(),
            source,
        })?;

    if !status.success() {
        return Err(BuildError::Failed {
            cc: options.cc.clone(),
            status,
        });
    }

    info!(output = %options.output.display(), "built executable");
    Ok(())
}

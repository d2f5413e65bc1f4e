// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation for statements and expressions.

use std::rc::Rc;

use quill_object::ast::{
    AssignTarget, Block, Else, Expr, ExprKind, InfixOp, Position, PrefixOp, Stmt, StmtKind,
};
use quill_object::{CompiledFunction, Value, ops};

use super::{
    CodeUnit, CompileError, Compiler, LoopContext, PLACEHOLDER, Result, Symbol, SymbolScope,
};
use crate::opcode::Opcode;

fn unsupported<T>(feature: &str) -> Result<T> {
    Err(CompileError::Unsupported(feature.to_string()))
}

impl Compiler {
    // =========================================================================
    // Statements
    // =========================================================================

    pub(super) fn compile_statements(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    /// Declare top-level functions up front so they can call each other
    /// regardless of declaration order.
    pub(super) fn hoist_functions(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            if let StmtKind::Function(decl) = &stmt.kind {
                self.symbols.define(&decl.name)?;
            }
        }
        Ok(())
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> Result<()> {
        let pos = stmt.pos;
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(Opcode::Pop, &[])?;
            }
            StmtKind::Var { name, value } => {
                self.compile_expr(value)?;
                let symbol = self.symbols.define(name)?;
                self.emit_set(symbol, pos)?;
            }
            StmtKind::Return(value) => match value {
                Some(value) => {
                    self.compile_expr(value)?;
                    self.emit_at(Opcode::ReturnValue, &[], pos)?;
                }
                None => {
                    self.emit_at(Opcode::Return, &[], pos)?;
                }
            },
            StmtKind::Block(block) => self.compile_block(block)?,
            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref(), false, pos)?,
            StmtKind::While { condition, body } => self.compile_while(condition, body, pos)?,
            StmtKind::For {
                init,
                condition,
                post,
                body,
            } => self.compile_for(
                init.as_deref(),
                condition.as_ref(),
                post.as_deref(),
                body,
                pos,
            )?,
            StmtKind::Break => {
                let jump = self.emit_at(Opcode::Jump, &[PLACEHOLDER], pos)?;
                self.current_loop("break")?.breaks.push(jump);
            }
            StmtKind::Continue => {
                let jump = self.emit_at(Opcode::Jump, &[PLACEHOLDER], pos)?;
                self.current_loop("continue")?.continues.push(jump);
            }
            StmtKind::Function(decl) => {
                let symbol = self.symbols.define(&decl.name)?;
                self.compile_function(Some(&decl.name), &decl.params, &decl.body, pos)?;
                self.emit_set(symbol, pos)?;
            }
            StmtKind::Throw(value) => {
                self.compile_expr(value)?;
                self.emit_at(Opcode::Throw, &[], pos)?;
            }
            StmtKind::Class(_) => return unsupported("class"),
            StmtKind::Try { .. } => return unsupported("try"),
            StmtKind::With { .. } => return unsupported("with"),
            StmtKind::Import { .. } => return unsupported("import"),
            StmtKind::Assert { .. } => return unsupported("assert"),
            StmtKind::Global(_) => return unsupported("global"),
            StmtKind::Nonlocal(_) => return unsupported("nonlocal"),
            StmtKind::Del(_) => return unsupported("del"),
        }
        Ok(())
    }

    /// Compile the program's last statement so that the final `Pop` in the
    /// main program carries the statement's value, or null when the
    /// statement has none.
    pub(super) fn compile_tail(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(block) => self.compile_tail_block(block),
            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref(), true, stmt.pos),
            StmtKind::Expr(_)
            | StmtKind::Return(_)
            | StmtKind::Throw(_)
            | StmtKind::Break
            | StmtKind::Continue => self.compile_statement(stmt),
            _ => {
                self.compile_statement(stmt)?;
                self.emit_null_result()
            }
        }
    }

    fn compile_tail_block(&mut self, block: &Block) -> Result<()> {
        self.symbols.enter_block();
        let result = match block.statements.split_last() {
            Some((last, rest)) => self
                .compile_statements(rest)
                .and_then(|()| self.compile_tail(last)),
            None => self.emit_null_result(),
        };
        self.symbols.leave_block();
        result
    }

    /// `Null; Pop`: the program ends on null unless a later statement pops.
    fn emit_null_result(&mut self) -> Result<()> {
        self.emit(Opcode::Null, &[])?;
        self.emit(Opcode::Pop, &[])?;
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> Result<()> {
        self.symbols.enter_block();
        let result = self.compile_statements(&block.statements);
        self.symbols.leave_block();
        result
    }

    fn compile_branch(&mut self, block: &Block, tail: bool) -> Result<()> {
        if tail {
            self.compile_tail_block(block)
        } else {
            self.compile_block(block)
        }
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Else>,
        tail: bool,
        pos: Position,
    ) -> Result<()> {
        self.compile_expr(condition)?;
        let skip_consequence = self.emit_at(Opcode::JumpNotTruthy, &[PLACEHOLDER], pos)?;
        self.compile_branch(consequence, tail)?;
        let skip_alternative = self.emit(Opcode::Jump, &[PLACEHOLDER])?;
        self.patch_here(skip_consequence)?;
        match alternative {
            Some(Else::Block(block)) => self.compile_branch(block, tail)?,
            Some(Else::If(stmt)) if tail => self.compile_tail(stmt)?,
            Some(Else::If(stmt)) => self.compile_statement(stmt)?,
            None if tail => self.emit_null_result()?,
            None => {}
        }
        self.patch_here(skip_alternative)
    }

    /// `while` bodies share the enclosing scope.
    fn compile_while(&mut self, condition: &Expr, body: &Block, pos: Position) -> Result<()> {
        let start = self.here();
        self.compile_expr(condition)?;
        let exit = self.emit_at(Opcode::JumpNotTruthy, &[PLACEHOLDER], pos)?;

        self.unit()?.loops.push(LoopContext::default());
        self.symbols.enter_loop();
        let compiled = self.compile_statements(&body.statements);
        self.symbols.leave_loop();
        let ctx = self.pop_loop()?;
        compiled?;

        self.emit(Opcode::Jump, &[start])?;
        let end = self.here();
        self.patch_jump(exit, end)?;
        self.patch_loop(ctx, end, start)
    }

    /// `for` runs in its own scope; the body gets a nested one and
    /// `continue` resumes at the post statement.
    fn compile_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
        pos: Position,
    ) -> Result<()> {
        self.symbols.enter_block();
        let result = self.compile_for_inner(init, condition, post, body, pos);
        self.symbols.leave_block();
        result
    }

    fn compile_for_inner(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
        pos: Position,
    ) -> Result<()> {
        if let Some(init) = init {
            self.compile_statement(init)?;
        }
        let start = self.here();
        let exit = match condition {
            Some(cond) => {
                self.compile_expr(cond)?;
                Some(self.emit_at(Opcode::JumpNotTruthy, &[PLACEHOLDER], pos)?)
            }
            None => None,
        };

        self.unit()?.loops.push(LoopContext::default());
        self.symbols.enter_loop();
        let compiled = self.compile_block(body);
        self.symbols.leave_loop();
        let ctx = self.pop_loop()?;
        compiled?;

        let post_start = self.here();
        if let Some(post) = post {
            self.compile_statement(post)?;
        }
        self.emit(Opcode::Jump, &[start])?;
        let end = self.here();
        if let Some(exit) = exit {
            self.patch_jump(exit, end)?;
        }
        self.patch_loop(ctx, end, post_start)
    }

    fn current_loop(&mut self, keyword: &str) -> Result<&mut LoopContext> {
        match self.unit()?.loops.last_mut() {
            Some(ctx) => Ok(ctx),
            None => unsupported(&format!("{} outside loop", keyword)),
        }
    }

    fn pop_loop(&mut self) -> Result<LoopContext> {
        self.unit()?
            .loops
            .pop()
            .ok_or_else(|| CompileError::Internal("loop context underflow".into()))
    }

    fn patch_loop(&mut self, ctx: LoopContext, end: usize, resume: usize) -> Result<()> {
        for jump in ctx.breaks {
            self.patch_jump(jump, end)?;
        }
        for jump in ctx.continues {
            self.patch_jump(jump, resume)?;
        }
        Ok(())
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Compile a function body into a constant and push it.
    fn compile_function(
        &mut self,
        name: Option<&str>,
        params: &[String],
        body: &Block,
        pos: Position,
    ) -> Result<()> {
        if params.len() > u8::MAX as usize {
            return Err(CompileError::TooManyLocals);
        }
        self.symbols.enter_function();
        self.units
            .push(CodeUnit::new(name.unwrap_or("<lambda>")));

        let compiled = self.compile_function_body(params, body);
        let num_locals = self.symbols.leave_function();
        let unit = self.finish_unit()?;
        compiled?;

        let func = CompiledFunction {
            name: name.map(str::to_string),
            instructions: Rc::from(unit.instructions),
            num_locals,
            num_params: params.len(),
            debug: Rc::from(unit.debug),
        };
        let idx = self.add_constant(Value::CompiledFunction(Rc::new(func)))?;
        self.emit_at(Opcode::Constant, &[idx], pos)?;
        Ok(())
    }

    fn compile_function_body(&mut self, params: &[String], body: &Block) -> Result<()> {
        for param in params {
            self.symbols.define(param)?;
        }
        self.compile_statements(&body.statements)?;
        self.emit(Opcode::Return, &[])?;
        Ok(())
    }

    // =========================================================================
    // Variables
    // =========================================================================

    fn emit_set(&mut self, symbol: Symbol, pos: Position) -> Result<()> {
        match symbol.scope {
            SymbolScope::Global => self.emit_at(Opcode::SetGlobal, &[symbol.index], pos)?,
            SymbolScope::Local => self.emit_at(Opcode::SetLocal, &[symbol.index], pos)?,
            SymbolScope::Builtin => {
                return Err(CompileError::Internal("assignment to builtin slot".into()));
            }
        };
        Ok(())
    }

    fn emit_get(&mut self, symbol: Symbol, pos: Position) -> Result<()> {
        let op = match symbol.scope {
            SymbolScope::Global => Opcode::GetGlobal,
            SymbolScope::Local => Opcode::GetLocal,
            SymbolScope::Builtin => Opcode::GetBuiltin,
        };
        self.emit_at(op, &[symbol.index], pos)?;
        Ok(())
    }

    /// Resolve a name through locals, globals and then the builtins.
    fn resolve(&self, name: &str) -> Result<Option<Symbol>> {
        if let Some(symbol) = self.symbols.resolve(name)? {
            return Ok(Some(symbol));
        }
        match self.builtins.lookup(name) {
            Some((index, _)) if index <= u8::MAX as usize => Ok(Some(Symbol {
                scope: SymbolScope::Builtin,
                index,
            })),
            Some(_) => Err(CompileError::TooManyBuiltins(name.to_string())),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        let pos = expr.pos;
        if let Some(value) = fold(expr) {
            return self.emit_value(value, pos);
        }

        match &expr.kind {
            ExprKind::Int(n) => self.emit_value(Value::Int(*n), pos)?,
            ExprKind::Float(n) => self.emit_value(Value::Float(*n), pos)?,
            ExprKind::Str(s) => self.emit_value(Value::string(s), pos)?,
            ExprKind::Bool(b) => self.emit_value(Value::Bool(*b), pos)?,
            ExprKind::Null => self.emit_value(Value::Null, pos)?,
            ExprKind::Ident(name) => match self.resolve(name)? {
                Some(symbol) => self.emit_get(symbol, pos)?,
                None => return Err(CompileError::UndefinedVariable(name.clone())),
            },
            ExprKind::Prefix { op, right } => {
                self.compile_expr(right)?;
                let opcode = match op {
                    PrefixOp::Neg => Opcode::Minus,
                    PrefixOp::Not => Opcode::Bang,
                };
                self.emit_at(opcode, &[], pos)?;
            }
            ExprKind::Infix { op, left, right } => self.compile_infix(*op, left, right, pos)?,
            ExprKind::Assign { target, value } => self.compile_assign(target, value, pos)?,
            ExprKind::Call { function, args } => self.compile_call(function, args, pos)?,
            ExprKind::Index { left, index } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit_at(Opcode::Index, &[], pos)?;
            }
            ExprKind::Member { .. } => return unsupported("member access"),
            ExprKind::Array(items) => {
                for item in items {
                    self.compile_expr(item)?;
                }
                self.emit_at(Opcode::Array, &[items.len()], pos)?;
            }
            ExprKind::Map(entries) => {
                self.compile_pairs(entries)?;
                self.emit_at(Opcode::Map, &[entries.len()], pos)?;
            }
            ExprKind::Hash(entries) => {
                self.compile_pairs(entries)?;
                self.emit_at(Opcode::Hash, &[entries.len()], pos)?;
            }
            ExprKind::Function(lit) => {
                self.compile_function(lit.name.as_deref(), &lit.params, &lit.body, pos)?;
            }
        }
        Ok(())
    }

    fn compile_pairs(&mut self, entries: &[(Expr, Expr)]) -> Result<()> {
        for (key, value) in entries {
            self.compile_expr(key)?;
            self.compile_expr(value)?;
        }
        Ok(())
    }

    fn compile_infix(&mut self, op: InfixOp, left: &Expr, right: &Expr, pos: Position) -> Result<()> {
        match op {
            InfixOp::And => {
                // left && right  =>  false unless both are truthy
                self.compile_expr(left)?;
                let short = self.emit_at(Opcode::JumpNotTruthy, &[PLACEHOLDER], pos)?;
                self.compile_expr(right)?;
                self.emit(Opcode::Bang, &[])?;
                self.emit(Opcode::Bang, &[])?;
                let done = self.emit(Opcode::Jump, &[PLACEHOLDER])?;
                self.patch_here(short)?;
                self.emit(Opcode::False, &[])?;
                self.patch_here(done)
            }
            InfixOp::Or => {
                self.compile_expr(left)?;
                let check_right = self.emit_at(Opcode::JumpNotTruthy, &[PLACEHOLDER], pos)?;
                self.emit(Opcode::True, &[])?;
                let done = self.emit(Opcode::Jump, &[PLACEHOLDER])?;
                self.patch_here(check_right)?;
                self.compile_expr(right)?;
                self.emit(Opcode::Bang, &[])?;
                self.emit(Opcode::Bang, &[])?;
                self.patch_here(done)
            }
            InfixOp::In => unsupported("in"),
            InfixOp::Is => unsupported("is"),
            _ => {
                let opcode = match op {
                    InfixOp::Add => Opcode::Add,
                    InfixOp::Sub => Opcode::Sub,
                    InfixOp::Mul => Opcode::Mul,
                    InfixOp::Div => Opcode::Div,
                    InfixOp::Mod => Opcode::Mod,
                    InfixOp::Eq => Opcode::Equal,
                    InfixOp::NotEq => Opcode::NotEqual,
                    InfixOp::Lt => Opcode::LessThan,
                    InfixOp::Gt => Opcode::GreaterThan,
                    InfixOp::LtEq => Opcode::LessEqual,
                    _ => Opcode::GreaterEqual,
                };
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit_at(opcode, &[], pos)?;
                Ok(())
            }
        }
    }

    fn compile_assign(&mut self, target: &AssignTarget, value: &Expr, pos: Position) -> Result<()> {
        match target {
            AssignTarget::Name(name) => {
                self.compile_expr(value)?;
                let symbol = match self.symbols.resolve(name)? {
                    Some(symbol) => symbol,
                    // Assigning an undeclared name (or a builtin's name)
                    // declares it in the current scope.
                    None => self.symbols.define(name)?,
                };
                self.emit_set(symbol, pos)?;
                self.emit_get(symbol, pos)
            }
            AssignTarget::Index { object, index } => {
                self.compile_expr(object)?;
                self.compile_expr(index)?;
                self.compile_expr(value)?;
                self.emit_at(Opcode::SetIndex, &[], pos)?;
                Ok(())
            }
            AssignTarget::Member { .. } => unsupported("member assignment"),
        }
    }

    fn compile_call(&mut self, function: &Expr, args: &[Expr], pos: Position) -> Result<()> {
        if args.len() > u8::MAX as usize {
            return Err(CompileError::TooManyArguments);
        }

        if let ExprKind::Ident(name) = &function.kind
            && let Some(op) = self.builtin_opcode(name, args.len())?
        {
            for arg in args {
                self.compile_expr(arg)?;
            }
            let argc = [args.len()];
            let operands: &[usize] = if op == Opcode::Print { &argc } else { &[] };
            self.emit_at(op, operands, pos)?;
            return Ok(());
        }

        self.compile_expr(function)?;
        for arg in args {
            self.compile_expr(arg)?;
        }
        self.emit_at(Opcode::Call, &[args.len()], pos)?;
        Ok(())
    }

    /// The dedicated opcode for a call to `print`, `len` or `type`, when
    /// the name still refers to the builtin.
    fn builtin_opcode(&self, name: &str, argc: usize) -> Result<Option<Opcode>> {
        let op = match (name, argc) {
            ("print", _) => Opcode::Print,
            ("len", 1) => Opcode::Len,
            ("type", 1) => Opcode::Type,
            _ => return Ok(None),
        };
        Ok(match self.resolve(name)? {
            Some(Symbol {
                scope: SymbolScope::Builtin,
                ..
            }) => Some(op),
            _ => None,
        })
    }
}

// ============================================================================
// Constant folding
// ============================================================================

/// Evaluate a literal-only expression at compile time. Returns `None` when
/// the expression is not constant or evaluating it would raise.
fn fold(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Prefix {
            op: PrefixOp::Neg,
            right,
        } => ops::negate(&literal(right).or_else(|| fold(right))?).ok(),
        ExprKind::Prefix {
            op: PrefixOp::Not,
            right,
        } => Some(ops::not(&literal(right).or_else(|| fold(right))?)),
        ExprKind::Infix { op, left, right } => {
            let op = op.as_binary()?;
            let left = literal(left).or_else(|| fold(left))?;
            let right = literal(right).or_else(|| fold(right))?;
            ops::binary(op, &left, &right).ok()
        }
        _ => None,
    }
}

fn literal(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Int(n) => Some(Value::Int(*n)),
        ExprKind::Float(n) => Some(Value::Float(*n)),
        ExprKind::Str(s) => Some(Value::string(s)),
        ExprKind::Bool(b) => Some(Value::Bool(*b)),
        _ => None,
    }
}

//! MIR (Mid-level Intermediate Representation) for the mlc compiler.
//!
//! A program is a table of top-level functions, a table of closures and an
//! entry block holding top-level code. Each block is an ordered list of
//! instructions; every instruction binds its result to a name. Branches own
//! their `then` and `else` blocks, so blocks nest rather than forming a flat
//! control-flow graph.
//!
//! Assumptions:
//! - Type checking has already occurred
//! - Closure extraction has run: function literals have been lifted into
//!   `Program::toplevel` and closures are recorded in `Program::closures`
//! - Calls to runtime primitives are already tagged `CallKind::External`

use indexmap::IndexMap;

use crate::span::Span;

mod display;


// =============================================================================
// Call kinds
// =============================================================================

/// Calling convention code generation must emit for an `App` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallKind {
    /// Not yet classified. Never survives call classification.
    #[default]
    Unclassified,
    /// Direct call to a statically known top-level function.
    Known,
    /// Indirect call through a closure value (code pointer plus environment).
    Closure,
    /// Call to a compiler or runtime provided primitive.
    External,
}

// =============================================================================
// Instructions
// =============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    FNeg,
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FAdd,
    FSub,
    FMul,
    FDiv,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

/// A function literal.
#[derive(Debug, Clone)]
pub struct FunVal {
    pub params: Vec<String>,
    pub body: Block,
}

/// The value computed by an instruction. Operands refer to earlier bindings
/// by name.
#[derive(Debug, Clone)]
pub enum Val {
    // --- Atoms ---
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Reference to a bound name.
    Ref(String),
    /// Reference to an external symbol.
    XRef(String),

    // --- Operations ---
    Unary {
        op: UnaryOp,
        child: String,
    },
    Binary {
        op: BinaryOp,
        lhs: String,
        rhs: String,
    },

    // --- Control ---
    /// Conditional branch. Both blocks are owned by the instruction.
    If {
        cond: String,
        then_block: Block,
        else_block: Block,
    },
    /// Function application.
    App {
        callee: String,
        args: Vec<String>,
        kind: CallKind,
    },
    /// Function literal. Must not appear inside a block once closures have
    /// been extracted.
    Fun(FunVal),
    /// Closure construction: `fun` captures the current values of `vars`.
    MakeCls {
        vars: Vec<String>,
        fun: String,
    },

    // --- Aggregates ---
    Tuple(Vec<String>),
    TplLoad {
        from: String,
        index: usize,
    },
    Array {
        size: String,
        elem: String,
    },
    ArrLoad {
        from: String,
        index: String,
    },
    ArrStore {
        to: String,
        index: String,
        rhs: String,
    },
    ArrLen(String),
}

impl Val {
    /// Call awaiting classification.
    pub fn app(callee: impl Into<String>, args: Vec<String>) -> Self {
        Val::App {
            callee: callee.into(),
            args,
            kind: CallKind::Unclassified,
        }
    }

    /// Call to a runtime primitive.
    pub fn external_app(callee: impl Into<String>, args: Vec<String>) -> Self {
        Val::App {
            callee: callee.into(),
            args,
            kind: CallKind::External,
        }
    }
}

/// An instruction: `ident = val`.
#[derive(Debug, Clone)]
pub struct Insn {
    pub ident: String,
    pub val: Val,
    pub span: Span,
}

impl Insn {
    pub fn new(ident: impl Into<String>, val: Val, span: Span) -> Self {
        Insn {
            ident: ident.into(),
            val,
            span,
        }
    }

    /// Instruction with no source location.
    pub fn generated(ident: impl Into<String>, val: Val) -> Self {
        Insn::new(ident, val, Span::generated())
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// An ordered sequence of instructions, traversed first to last.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub insns: Vec<Insn>,
}

impl Block {
    pub fn new() -> Self {
        Block { insns: Vec::new() }
    }

    pub fn from_insns(insns: Vec<Insn>) -> Self {
        Block { insns }
    }

    pub fn push(&mut self, insn: Insn) {
        self.insns.push(insn);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Insn> {
        self.insns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Insn> {
        self.insns.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// The last instruction binds the block's result.
    pub fn last(&self) -> Option<&Insn> {
        self.insns.last()
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Insn;
    type IntoIter = std::slice::Iter<'a, Insn>;

    fn into_iter(self) -> Self::IntoIter {
        self.insns.iter()
    }
}

// =============================================================================
// Functions and programs
// =============================================================================

/// A top-level function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    /// Set by call classification when the body calls the function itself.
    pub is_recursive: bool,
    pub span: Span,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Block) -> Self {
        Function {
            name: name.into(),
            params,
            body,
            is_recursive: false,
            span: Span::generated(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Top-level functions by name. Insertion-ordered so that output is
/// deterministic, but passes must not depend on the order.
pub type Toplevel = IndexMap<String, Function>;

/// Closures by function name, each with the names of its captured variables.
pub type Closures = IndexMap<String, Vec<String>>;

/// A whole program after closure extraction.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub toplevel: Toplevel,
    pub closures: Closures,
    /// Top-level code that belongs to no function.
    pub entry: Block,
}

impl Program {
    pub fn new(entry: Block) -> Self {
        Program {
            toplevel: IndexMap::new(),
            closures: IndexMap::new(),
            entry,
        }
    }

    /// Add a function, replacing any previous function with the same name.
    pub fn add_function(&mut self, fun: Function) {
        self.toplevel.insert(fun.name.clone(), fun);
    }

    /// Record `name` as a closure capturing `captures`.
    pub fn add_closure(&mut self, name: impl Into<String>, captures: Vec<String>) {
        self.closures.insert(name.into(), captures);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.toplevel.get(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.toplevel.contains_key(name)
    }

    pub fn is_closure(&self, name: &str) -> bool {
        self.closures.contains_key(name)
    }
}

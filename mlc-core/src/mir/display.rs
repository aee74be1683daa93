//! Textual dump of MIR, used for debugging output and in tests.

use std::fmt::{self, Display, Formatter, Write};

use itertools::Itertools;

use super::{BinaryOp, Block, CallKind, Function, Insn, Program, UnaryOp, Val};

impl Display for CallKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallKind::Unclassified => "app.?",
            CallKind::Known => "app",
            CallKind::Closure => "app.cls",
            CallKind::External => "app.x",
        };
        f.write_str(s)
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::FNeg => "-.",
            UnaryOp::Not => "not",
        };
        f.write_str(s)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::FAdd => "+.",
            BinaryOp::FSub => "-.",
            BinaryOp::FMul => "*.",
            BinaryOp::FDiv => "/.",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

fn indent(out: &mut impl Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str("  ")?;
    }
    Ok(())
}

fn write_block(out: &mut impl Write, block: &Block, depth: usize) -> fmt::Result {
    for insn in block {
        write_insn(out, insn, depth)?;
    }
    Ok(())
}

fn write_insn(out: &mut impl Write, insn: &Insn, depth: usize) -> fmt::Result {
    indent(out, depth)?;
    write!(out, "{} = ", insn.ident)?;
    match &insn.val {
        Val::Unit => writeln!(out, "unit"),
        Val::Bool(b) => writeln!(out, "bool {}", b),
        Val::Int(i) => writeln!(out, "int {}", i),
        Val::Float(x) => writeln!(out, "float {}", x),
        Val::Str(s) => writeln!(out, "string {:?}", s),
        Val::Ref(name) => writeln!(out, "ref {}", name),
        Val::XRef(name) => writeln!(out, "xref {}", name),
        Val::Unary { op, child } => writeln!(out, "unary {} {}", op, child),
        Val::Binary { op, lhs, rhs } => writeln!(out, "binary {} {} {}", op, lhs, rhs),
        Val::App { callee, args, kind } => {
            if args.is_empty() {
                writeln!(out, "{} {}", kind, callee)
            } else {
                writeln!(out, "{} {} {}", kind, callee, args.iter().join(" "))
            }
        }
        Val::If {
            cond,
            then_block,
            else_block,
        } => {
            writeln!(out, "if {}", cond)?;
            indent(out, depth)?;
            writeln!(out, "then {{")?;
            write_block(out, then_block, depth + 1)?;
            indent(out, depth)?;
            writeln!(out, "}}")?;
            indent(out, depth)?;
            writeln!(out, "else {{")?;
            write_block(out, else_block, depth + 1)?;
            indent(out, depth)?;
            writeln!(out, "}}")
        }
        Val::Fun(fun) => {
            writeln!(out, "fun {} {{", fun.params.iter().join(", "))?;
            write_block(out, &fun.body, depth + 1)?;
            indent(out, depth)?;
            writeln!(out, "}}")
        }
        Val::MakeCls { vars, fun } => writeln!(out, "makecls ({}) {}", vars.iter().join(", "), fun),
        Val::Tuple(elems) => writeln!(out, "tuple {}", elems.iter().join(", ")),
        Val::TplLoad { from, index } => writeln!(out, "tplload {} {}", index, from),
        Val::Array { size, elem } => writeln!(out, "array {} {}", size, elem),
        Val::ArrLoad { from, index } => writeln!(out, "arrload {} {}", index, from),
        Val::ArrStore { to, index, rhs } => writeln!(out, "arrstore {} {} {}", index, to, rhs),
        Val::ArrLen(array) => writeln!(out, "arrlen {}", array),
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "fun {}({})", self.name, self.params.iter().join(", "))?;
        if self.is_recursive {
            f.write_str(" rec")?;
        }
        writeln!(f, " {{")?;
        write_block(f, &self.body, 1)?;
        writeln!(f, "}}")
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for fun in self.toplevel.values() {
            writeln!(f, "{}", fun)?;
        }
        for (name, captures) in &self.closures {
            writeln!(f, "closure {} [{}]", name, captures.iter().join(", "))?;
        }
        writeln!(f, "entry {{")?;
        write_block(f, &self.entry, 1)?;
        writeln!(f, "}}")
    }
}

//! Call classification and recursion detection.
//!
//! Runs over MIR after closure extraction. Every `App` instruction receives
//! the calling convention code generation must emit:
//! - `External` calls (tagged upstream) are left alone
//! - Calls to a name in the closure table become `Closure`
//! - Calls to a top-level function become `Known`
//! - Any other callee must be a local variable holding a function value, and
//!   all function values are closures, so the call becomes `Closure`
//!
//! Functions whose body calls the function itself are marked recursive.
//! The pass only annotates; it never adds, removes or renames instructions.

use log::{debug, info, trace};

use crate::error::{InvariantFault, Result};
use crate::mir::{Block, CallKind, Closures, Insn, Program, Toplevel, Val};

/// Number of calls given each kind by one run of the pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub known: usize,
    pub closure: usize,
    pub external: usize,
    pub recursive_functions: usize,
}

/// Walks one body at a time. `current` is the name of the function whose
/// body is being walked, or `None` for the entry block.
struct CallClassifier<'a> {
    closures: &'a Closures,
    toplevel: &'a Toplevel,
    current: Option<&'a str>,
    found_self_call: bool,
    stats: &'a mut CallStats,
}

impl<'a> CallClassifier<'a> {
    fn new(
        closures: &'a Closures,
        toplevel: &'a Toplevel,
        current: Option<&'a str>,
        stats: &'a mut CallStats,
    ) -> Self {
        CallClassifier {
            closures,
            toplevel,
            current,
            found_self_call: false,
            stats,
        }
    }

    fn walk_block(&mut self, block: &mut Block) -> std::result::Result<(), InvariantFault> {
        for insn in block.iter_mut() {
            self.walk_insn(insn)?;
        }
        Ok(())
    }

    fn walk_insn(&mut self, insn: &mut Insn) -> std::result::Result<(), InvariantFault> {
        match &mut insn.val {
            Val::App { callee, kind, .. } => {
                self.classify_call(callee, kind);
                trace!("{} = {} {}", insn.ident, kind, callee);
            }
            Val::If {
                then_block,
                else_block,
                ..
            } => {
                self.walk_block(then_block)?;
                self.walk_block(else_block)?;
            }
            Val::Fun(_) => {
                return Err(InvariantFault::FunctionInBlock {
                    ident: insn.ident.clone(),
                    owner: self.current.map(str::to_string),
                    span: insn.span,
                });
            }
            Val::Unit
            | Val::Bool(_)
            | Val::Int(_)
            | Val::Float(_)
            | Val::Str(_)
            | Val::Ref(_)
            | Val::XRef(_)
            | Val::Unary { .. }
            | Val::Binary { .. }
            | Val::MakeCls { .. }
            | Val::Tuple(_)
            | Val::TplLoad { .. }
            | Val::Array { .. }
            | Val::ArrLoad { .. }
            | Val::ArrStore { .. }
            | Val::ArrLen(_) => {}
        }
        Ok(())
    }

    fn classify_call(&mut self, callee: &str, kind: &mut CallKind) {
        // Independent of the call's kind: a self-call through any convention
        // makes the enclosing function recursive.
        if self.current == Some(callee) {
            self.found_self_call = true;
        }

        if *kind == CallKind::External {
            self.stats.external += 1;
            return;
        }

        if self.closures.contains_key(callee) {
            *kind = CallKind::Closure;
            self.stats.closure += 1;
            return;
        }

        if self.toplevel.contains_key(callee) {
            // Named after a function that is not a closure, so it's a direct call.
            *kind = CallKind::Known;
            self.stats.known += 1;
            return;
        }

        // Neither external, a closure, nor a known function: the callee is a
        // local variable, and function values are always closures.
        *kind = CallKind::Closure;
        self.stats.closure += 1;
    }
}

/// Classify every call in `program` and mark self-recursive functions.
///
/// Fails only when a function literal is still present inside a block, which
/// means closure extraction did not run or is broken.
pub fn classify_calls(program: &mut Program) -> Result<CallStats> {
    let mut stats = CallStats::default();

    for index in 0..program.toplevel.len() {
        // Detach the body so it can be rewritten while the function table
        // stays borrowed for callee lookups.
        let mut body = match program.toplevel.get_index_mut(index) {
            Some((_, fun)) => std::mem::take(&mut fun.body),
            None => continue,
        };

        let (walked, found_self_call) = match program.toplevel.get_index(index) {
            Some((name, _)) => {
                debug!("Classifying calls in function: {}", name);
                let mut classifier =
                    CallClassifier::new(&program.closures, &program.toplevel, Some(name.as_str()), &mut stats);
                let walked = classifier.walk_block(&mut body);
                (walked, classifier.found_self_call)
            }
            None => (Ok(()), false),
        };

        if let Some((name, fun)) = program.toplevel.get_index_mut(index) {
            fun.body = body;
            if found_self_call && !fun.is_recursive {
                debug!("Function '{}' is recursive", name);
                fun.is_recursive = true;
            }
        }
        walked?;
    }

    debug!("Classifying calls in entry block");
    CallClassifier::new(&program.closures, &program.toplevel, None, &mut stats).walk_block(&mut program.entry)?;

    stats.recursive_functions = program.toplevel.values().filter(|f| f.is_recursive).count();
    info!(
        "Classified calls: {} known, {} closure, {} external; {} recursive functions",
        stats.known, stats.closure, stats.external, stats.recursive_functions
    );
    trace!("MIR after call classification:\n{}", program);

    Ok(stats)
}

pub mod call_classification;
pub mod error;
pub mod lexer;
pub mod mir;
pub mod span;

#[cfg(test)]
mod call_classification_tests;

use call_classification::CallStats;
use error::Result;

// =============================================================================
// Back-end pipeline
// =============================================================================
//
// Each struct represents a stage; methods consume `self` and return the next
// stage, so passes can only run in a valid order:
//
//   ClosuresExtracted::new(mir)          (handed over by closure extraction)
//     -> .classify_calls()               -> CallsClassified
//
// CallsClassified is the input of code generation.

/// Entry point for the front end's token stream.
pub struct Compiler;

impl Compiler {
    /// Tokenize source code, skipping comments.
    pub fn tokenize(source: &str) -> Result<Vec<lexer::LocatedToken>> {
        Ok(lexer::tokenize(source)?)
    }
}

/// Function literals have been lifted to top-level functions and closures
/// recorded in the closure table.
pub struct ClosuresExtracted {
    pub mir: mir::Program,
}

impl ClosuresExtracted {
    pub fn new(mir: mir::Program) -> Self {
        ClosuresExtracted { mir }
    }

    /// Assign a calling convention to every call and mark recursive functions.
    pub fn classify_calls(mut self) -> Result<CallsClassified> {
        let stats = call_classification::classify_calls(&mut self.mir)?;
        Ok(CallsClassified { mir: self.mir, stats })
    }
}

/// Every call has its final calling convention and every function's
/// recursion flag is final.
pub struct CallsClassified {
    pub mir: mir::Program,
    pub stats: CallStats,
}

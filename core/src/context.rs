//! Explicit replacement for the process-wide globals described in the
//! source system: a single `WordsegContext` owns the symbol table and the
//! character buffer and is threaded through every call that needs them,
//! rather than being reached for through statics. This keeps tests
//! hermetic — two `WordsegContext`s never share interned identities.

use crate::charbuf::{CharBuffer, Substring};
use crate::symbol::{Symbol, SymbolTable};

#[derive(Debug, Default)]
pub struct WordsegContext {
    pub symbols: SymbolTable,
    pub chars: CharBuffer,
}

impl WordsegContext {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            chars: CharBuffer::new(),
        }
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        self.symbols.intern(s)
    }

    pub fn push_text(&mut self, s: &str) -> Substring {
        self.chars.push_str(s)
    }

    pub fn text(&self, s: Substring) -> String {
        self.chars.text(s)
    }
}

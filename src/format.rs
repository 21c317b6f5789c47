use serde::Serialize;

use crate::driver::{Assembly, Diagnostic, EncodedInstruction};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStyle {
    /// 32 binary digits instead of 8 hex digits.
    pub binary: bool,
    /// Append the source line as a `//` comment.
    pub comments: bool,
    /// Wrap each word as `memory[i] = 32'h...;`.
    pub memory_init: bool,
}

pub fn fmt_word(word: u32, binary: bool) -> String {
    if binary {
        format!("{word:032b}")
    } else {
        format!("{word:08x}")
    }
}

pub fn fmt_instruction(index: usize, inst: &EncodedInstruction, style: &OutputStyle) -> String {
    let word = fmt_word(inst.word().unwrap_or(0), style.binary);
    let mut out = if style.memory_init {
        let radix = if style.binary { 'b' } else { 'h' };
        format!("memory[{index}] = 32'{radix}{word};")
    } else {
        word
    };
    if style.comments && !inst.source.is_empty() {
        out.push_str("\t// ");
        out.push_str(&inst.source);
    }
    out
}

/// One line per instruction, newline-terminated.
pub fn fmt_listing(asm: &Assembly, style: &OutputStyle) -> String {
    let mut buf = String::new();
    for (i, inst) in asm.instructions.iter().enumerate() {
        buf.push_str(&fmt_instruction(i, inst, style));
        buf.push('\n');
    }
    buf
}

#[derive(Debug, Clone, Serialize)]
pub struct WordRecord {
    pub index: usize,
    pub address: u32,
    pub word: String,
    pub line: usize,
    pub source: String,
}

/// Machine-readable form of an [`Assembly`].
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub words: Vec<WordRecord>,
    pub symbols: &'a SymbolTable,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> Report<'a> {
    pub fn new(asm: &'a Assembly, style: &OutputStyle) -> Self {
        let words = asm
            .instructions
            .iter()
            .enumerate()
            .map(|(index, inst)| WordRecord {
                index,
                address: inst.address,
                word: fmt_word(inst.word().unwrap_or(0), style.binary),
                line: inst.line,
                source: inst.source.clone(),
            })
            .collect();
        Self { words, symbols: &asm.symbols, diagnostics: &asm.diagnostics }
    }
}

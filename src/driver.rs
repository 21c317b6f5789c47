use std::fmt;
use std::mem;

use serde::Serialize;
use tracing::{debug, warn};

use crate::encoder::{Fixup, TemplateEncoder};
use crate::error::AsmError;
use crate::fields::{self, Bits, Pending};
use crate::symbols::{self, SymbolTable};
use crate::table::IsaTable;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmConfig {
    pub comment_marker: char,
    pub directive_marker: char,
    /// Report numeric operands wider than their field (they are truncated either way).
    pub strict_widths: bool,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            comment_marker: '#',
            directive_marker: '.',
            strict_widths: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Text,
    /// Accepted but never encoded.
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInstruction {
    /// Byte address, always `index * 4`.
    pub address: u32,
    pub bits: Bits,
    pub pending: Pending,
    /// Comment-stripped source, carried labels included.
    pub source: String,
    /// 1-based source line.
    pub line: usize,
}

impl EncodedInstruction {
    fn nop(address: u32, source: String, line: usize) -> Self {
        Self {
            address,
            bits: Bits::repeat(false, fields::WORD_BITS),
            pending: Pending::empty(),
            source,
            line,
        }
    }

    /// The 32-bit word, or `None` for a record of the wrong width.
    pub fn word(&self) -> Option<u32> {
        fields::to_word(&self.bits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub source: String,
    pub error: AsmError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)?;
        if !self.source.is_empty() {
            write!(f, " (`{}`)", self.source)?;
        }
        Ok(())
    }
}

/// Finished, fully resolved result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub instructions: Vec<EncodedInstruction>,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    pub fn words(&self) -> Vec<u32> {
        self.instructions.iter().map(|i| i.word().unwrap_or(0)).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// State of one assembly run: program counter, labels, fixup queue and the
/// instruction list. Reset between files, never shared across them.
pub struct Session<'a> {
    encoder: TemplateEncoder<'a>,
    config: AsmConfig,
    pc: u32,
    segment: Segment,
    /// Labels from label-only lines, with the line each was read on.
    carried: Vec<(String, usize)>,
    symbols: SymbolTable,
    fixups: Vec<Fixup>,
    instructions: Vec<EncodedInstruction>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Session<'a> {
    pub fn new(isa: &'a IsaTable, config: AsmConfig) -> Self {
        Self {
            encoder: TemplateEncoder::new(isa).strict_widths(config.strict_widths),
            config,
            pc: 0,
            segment: Segment::Text,
            carried: Vec::new(),
            symbols: SymbolTable::new(),
            fixups: Vec::new(),
            instructions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pc = 0;
        self.segment = Segment::Text;
        self.carried.clear();
        self.symbols = SymbolTable::new();
        self.fixups.clear();
        self.instructions.clear();
        self.diagnostics.clear();
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// Assemble a whole file from a fresh state.
    pub fn assemble_source(&mut self, source: &str) -> Assembly {
        self.reset();
        for (i, raw) in source.lines().enumerate() {
            self.feed_line(i + 1, raw);
        }
        self.finish()
    }

    /// First pass over one physical line.
    pub fn feed_line(&mut self, line: usize, raw: &str) {
        let head = raw.trim_start();
        if head.starts_with(self.config.directive_marker) {
            self.directive(line, head);
            return;
        }
        if self.segment == Segment::Data {
            debug!(line, "data segment line skipped");
            return;
        }

        let src = tokenize(raw, self.config.comment_marker);
        if src.is_empty() {
            return;
        }
        if src.is_label_only() {
            self.carried.extend(src.label.map(|l| (l, line)));
            return;
        }

        let mut text: String = self.carried.iter().map(|(l, _)| format!("{l}: ")).collect();
        text.push_str(&src.text);
        let labels: Vec<(String, usize)> = self
            .carried
            .drain(..)
            .chain(src.label.clone().map(|l| (l, line)))
            .collect();
        for (label, at) in labels {
            if let Err(e) = self.symbols.bind(&label, self.pc) {
                self.report(at, &text, e);
            }
        }

        let index = self.instructions.len();
        let mnemonic = src.mnemonic().unwrap_or_default();
        let inst = match self.encoder.encode_line(mnemonic, src.operands(), index) {
            Ok(enc) => {
                for w in enc.warnings {
                    self.report(line, &text, w);
                }
                self.fixups.extend(enc.fixups);
                EncodedInstruction {
                    address: self.pc,
                    bits: enc.bits,
                    pending: enc.pending,
                    source: text,
                    line,
                }
            }
            Err(e) => {
                self.report(line, &text, e);
                EncodedInstruction::nop(self.pc, text, line)
            }
        };
        self.instructions.push(inst);
        self.pc += 4;
    }

    fn directive(&mut self, line: usize, head: &str) {
        let name = tokenize(head, self.config.comment_marker)
            .tokens
            .into_iter()
            .next()
            .unwrap_or_default();
        match name.as_str() {
            ".text" => self.segment = Segment::Text,
            ".data" => self.segment = Segment::Data,
            _ => {
                debug!(line, directive = %name, "directive ignored");
                return;
            }
        }
        debug!(line, segment = ?self.segment, "segment switch");
    }

    /// Bind leftover labels, patch fixups, check widths. Leaves the session
    /// empty and ready for the next file.
    pub fn finish(&mut self) -> Assembly {
        for (label, line) in mem::take(&mut self.carried) {
            if let Err(e) = self.symbols.bind(&label, self.pc) {
                self.report(line, &format!("{label}:"), e);
            }
        }

        debug!(fixups = self.fixups.len(), labels = self.symbols.len(), "resolving");
        let unresolved = symbols::resolve(&self.fixups, &self.symbols, &mut self.instructions);
        for (index, e) in unresolved {
            let (line, source) = {
                let inst = &self.instructions[index];
                (inst.line, inst.source.clone())
            };
            self.report(line, &source, e);
        }

        for index in 0..self.instructions.len() {
            let width = self.instructions[index].bits.len();
            if width != fields::WORD_BITS {
                let inst = &self.instructions[index];
                let (line, source) = (inst.line, inst.source.clone());
                self.report(line, &source, AsmError::FieldWidthViolation { index, width });
                let inst = &mut self.instructions[index];
                inst.bits = Bits::repeat(false, fields::WORD_BITS);
                inst.pending = Pending::empty();
            }
        }

        let out = Assembly {
            instructions: mem::take(&mut self.instructions),
            symbols: mem::take(&mut self.symbols),
            diagnostics: mem::take(&mut self.diagnostics),
        };
        self.reset();
        out
    }

    fn report(&mut self, line: usize, source: &str, error: AsmError) {
        warn!(line, source, "{error}");
        self.diagnostics.push(Diagnostic { line, source: source.to_string(), error });
    }
}

/// Assemble `source` in a fresh session.
pub fn assemble(isa: &IsaTable, source: &str, config: AsmConfig) -> Assembly {
    Session::new(isa, config).assemble_source(source)
}

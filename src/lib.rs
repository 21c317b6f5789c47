pub mod driver;
pub mod encoder;
pub mod error;
pub mod fields;
pub mod format;
pub mod symbols;
pub mod table;
pub mod tokenizer;

pub mod isa {
    pub mod mips32; // MIPS32 integer subset
}

pub use driver::{assemble, AsmConfig, Assembly, Diagnostic, EncodedInstruction, Session};
pub use error::{AsmError, IsaError};
pub use format::OutputStyle;
pub use table::IsaTable;

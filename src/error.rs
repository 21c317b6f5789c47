use serde::Serialize;

/// Per-line assembly failures. None of these abort a run: the driver turns
/// each one into a [`crate::driver::Diagnostic`] and degrades the affected
/// instruction (or just the affected field) to zeros.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AsmError {
    #[error("unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { mnemonic: String },
    #[error("unknown register `{token}`")]
    UnknownRegister { token: String },
    #[error("`{mnemonic}` takes {expected} operand(s), found {found}")]
    OperandCountMismatch {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("unresolved label `{label}`")]
    UnresolvedLabel { label: String },
    #[error("instruction #{index} is {width} bits wide, expected 32; forced to nop")]
    FieldWidthViolation { index: usize, width: usize },
    #[error("label `{label}` already bound to {previous:#010x}")]
    DuplicateLabel { label: String, previous: u32 },
    #[error("value {value} does not fit a {width}-bit field; truncated")]
    ImmediateOutOfRange { value: String, width: usize },
}

/// Failures while loading an instruction-set definition table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IsaError {
    #[error("line {line}: expected 2, 4 or 5 `-`-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: `{name}` is not a register name (instruction lines need 4 or 5 fields)")]
    RegisterName { line: usize, name: String },
    #[error("line {line}: register index `{value}` is not in 0..=31")]
    RegisterIndex { line: usize, value: String },
    #[error("line {line}: `{bits}` is not a 6-bit binary pattern")]
    BitPattern { line: usize, bits: String },
    #[error("line {line}: unknown operand role `{name}`")]
    UnknownRole { line: usize, name: String },
    #[error("line {line}: unknown output field `{name}`")]
    UnknownField { line: usize, name: String },
    #[error("line {line}: `{mnemonic}` places `funct` but has no function bits")]
    MissingFunct { line: usize, mnemonic: String },
    #[error("line {line}: `{mnemonic}` binds role `{role}` twice")]
    DuplicateRole {
        line: usize,
        mnemonic: String,
        role: &'static str,
    },
    #[error("line {line}: `{mnemonic}` never places operand role `{role}`")]
    UnplacedRole {
        line: usize,
        mnemonic: String,
        role: &'static str,
    },
    #[error("line {line}: `{mnemonic}` is a {class} R-type and may not take `{role}`")]
    ClassLayout {
        line: usize,
        mnemonic: String,
        class: &'static str,
        role: &'static str,
    },
}

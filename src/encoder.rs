use tracing::trace;

use crate::error::AsmError;
use crate::fields::{self, Bits, Pending};
use crate::table::{Field, InstructionSpec, IsaTable, Role, REGISTER_SIGIL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupKind {
    /// 16-bit word offset relative to the following instruction.
    Branch,
    /// 26-bit absolute word index.
    Jump,
}

impl FixupKind {
    pub fn pending(self) -> Pending {
        match self {
            FixupKind::Branch => Pending::OFFSET,
            FixupKind::Jump => Pending::INDEX,
        }
    }
}

/// A field left as a zero placeholder until the label is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    /// Instruction number; its address is `index * 4`.
    pub index: usize,
    pub label: String,
    pub kind: FixupKind,
    /// Bit position of the placeholder inside the record, MSB = 0.
    pub start: usize,
    pub width: usize,
}

/// Output of encoding one instruction line.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bits: Bits,
    pub pending: Pending,
    pub fixups: Vec<Fixup>,
    /// Non-fatal findings, such as truncated out-of-range values.
    pub warnings: Vec<AsmError>,
}

enum Operand<'t> {
    Value(u32),
    Label(&'t str),
}

/// Generic template interpreter: every mnemonic goes through the same
/// field-emission loop, driven only by its [`InstructionSpec`].
pub struct TemplateEncoder<'a> {
    isa: &'a IsaTable,
    strict_widths: bool,
}

impl<'a> TemplateEncoder<'a> {
    pub fn new(isa: &'a IsaTable) -> Self {
        Self { isa, strict_widths: false }
    }

    /// Report numeric operands that do not fit their field.
    pub fn strict_widths(mut self, on: bool) -> Self {
        self.strict_widths = on;
        self
    }

    /// Look up `mnemonic` and encode it as instruction number `index`.
    pub fn encode_line(&self, mnemonic: &str, operands: &[String], index: usize) -> Result<Encoded, AsmError> {
        let spec = self
            .isa
            .instruction(mnemonic)
            .ok_or_else(|| AsmError::UnknownMnemonic { mnemonic: mnemonic.to_string() })?;
        self.encode(spec, operands, index)
    }

    pub fn encode(&self, spec: &InstructionSpec, operands: &[String], index: usize) -> Result<Encoded, AsmError> {
        if operands.len() != spec.roles.len() {
            return Err(AsmError::OperandCountMismatch {
                mnemonic: spec.mnemonic.clone(),
                expected: spec.roles.len(),
                found: operands.len(),
            });
        }
        let bound = |role: Role| {
            spec.roles
                .iter()
                .position(|r| *r == role)
                .map(|k| operands[k].as_str())
        };

        let mut out = Encoded {
            bits: Bits::with_capacity(fields::WORD_BITS),
            pending: Pending::empty(),
            fixups: Vec::new(),
            warnings: Vec::new(),
        };
        for field in &spec.template {
            let width = field.width();
            let value = match *field {
                Field::Opcode => u32::from(spec.opcode),
                // the loader guarantees funct bits whenever the template places them
                Field::Funct => u32::from(spec.funct.unwrap_or(0)),
                Field::Literal { value, .. } => value,
                Field::Role(role) => match bound(role) {
                    None => role.fixed_value(),
                    Some(tok) => match self.operand(role, tok, &mut out.warnings)? {
                        Operand::Value(v) => v,
                        Operand::Label(label) => {
                            let kind = if role == Role::Offset { FixupKind::Branch } else { FixupKind::Jump };
                            out.pending |= kind.pending();
                            out.fixups.push(Fixup {
                                index,
                                label: label.to_string(),
                                kind,
                                start: out.bits.len(),
                                width,
                            });
                            0
                        }
                    },
                },
            };
            trace!(mnemonic = %spec.mnemonic, ?field, value, "emit field");
            fields::push_field(&mut out.bits, value, width);
        }
        Ok(out)
    }

    fn operand<'t>(&self, role: Role, tok: &'t str, warnings: &mut Vec<AsmError>) -> Result<Operand<'t>, AsmError> {
        let width = role.width();
        if let Some(reg) = self.isa.register(tok) {
            return Ok(Operand::Value(fields::truncate(i64::from(reg), width)));
        }
        if let Some(n) = fields::parse_number::<i64>(tok) {
            if self.strict_widths && (n.wrapped || !fields::fits(n.value, width)) {
                warnings.push(AsmError::ImmediateOutOfRange { value: tok.to_string(), width });
            }
            return Ok(Operand::Value(fields::truncate(n.value, width)));
        }
        match role {
            Role::Offset | Role::Index if !tok.starts_with(REGISTER_SIGIL) => Ok(Operand::Label(tok)),
            _ => Err(AsmError::UnknownRegister { token: tok.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::mips32;

    fn ops(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    fn word(e: &Encoded) -> u32 {
        fields::to_word(&e.bits).unwrap()
    }

    #[test]
    fn standard_rtype() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        let e = enc.encode_line("add", &ops(&["$t0", "$t1", "$t2"]), 0).unwrap();
        assert_eq!(word(&e), 0x012A_4020);
        assert!(e.fixups.is_empty());
        assert!(e.pending.is_empty());
    }

    #[test]
    fn shift_class_leaves_rs_zero() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        // sll $t0, $t1, 4 -> 000000 00000 01001 01000 00100 000000
        let e = enc.encode_line("sll", &ops(&["$t0", "$t1", "4"]), 0).unwrap();
        assert_eq!(word(&e), 0x0009_4100);
        let e = enc.encode_line("nop", &[], 0).unwrap();
        assert_eq!(word(&e), 0);
    }

    #[test]
    fn negative_immediate_and_memory_operand() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        let e = enc.encode_line("addi", &ops(&["$t0", "$zero", "-1"]), 0).unwrap();
        assert_eq!(word(&e), 0x2008_FFFF);
        let e = enc.encode_line("lw", &ops(&["$t0", "4", "$sp"]), 0).unwrap();
        assert_eq!(word(&e), 0x8FA8_0004);
    }

    #[test]
    fn label_operands_become_fixups() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        let e = enc.encode_line("bne", &ops(&["$t0", "$zero", "loop"]), 3).unwrap();
        assert_eq!(e.pending, Pending::OFFSET);
        assert_eq!(
            e.fixups,
            vec![Fixup { index: 3, label: "loop".into(), kind: FixupKind::Branch, start: 16, width: 16 }]
        );
        assert_eq!(word(&e), 0x1500_0000);

        let e = enc.encode_line("jal", &ops(&["main"]), 0).unwrap();
        assert_eq!(e.pending, Pending::INDEX);
        assert_eq!(e.fixups[0].start, 6);
        assert_eq!(e.fixups[0].width, 26);
    }

    #[test]
    fn numeric_targets_need_no_fixup() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        let e = enc.encode_line("beq", &ops(&["$t0", "$t1", "-2"]), 0).unwrap();
        assert!(e.fixups.is_empty());
        assert_eq!(word(&e), 0x1109_FFFE);
        let e = enc.encode_line("j", &ops(&["0x10"]), 0).unwrap();
        assert_eq!(word(&e), 0x0800_0010);
    }

    #[test]
    fn local_errors() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        assert_eq!(
            enc.encode_line("frob", &[], 0).unwrap_err(),
            AsmError::UnknownMnemonic { mnemonic: "frob".into() }
        );
        assert_eq!(
            enc.encode_line("add", &ops(&["$t0", "$t1"]), 0).unwrap_err(),
            AsmError::OperandCountMismatch { mnemonic: "add".into(), expected: 3, found: 2 }
        );
        assert_eq!(
            enc.encode_line("add", &ops(&["$t0", "$t1", "$q9"]), 0).unwrap_err(),
            AsmError::UnknownRegister { token: "$q9".into() }
        );
        // a label where a register belongs is not a register
        assert!(matches!(
            enc.encode_line("addi", &ops(&["$t0", "$t1", "lbl"]), 0),
            Err(AsmError::UnknownRegister { .. })
        ));
        // a `$` token is never a label
        assert!(matches!(
            enc.encode_line("j", &ops(&["$bad"]), 0),
            Err(AsmError::UnknownRegister { .. })
        ));
    }

    #[test]
    fn strict_widths_report_but_still_truncate() {
        let isa = mips32::table().unwrap();
        let lax = TemplateEncoder::new(&isa);
        let e = lax.encode_line("sll", &ops(&["$t0", "$t1", "33"]), 0).unwrap();
        assert!(e.warnings.is_empty());
        let strict = TemplateEncoder::new(&isa).strict_widths(true);
        let s = strict.encode_line("sll", &ops(&["$t0", "$t1", "33"]), 0).unwrap();
        assert_eq!(s.warnings, vec![AsmError::ImmediateOutOfRange { value: "33".into(), width: 5 }]);
        assert_eq!(word(&e), word(&s));
        assert_eq!(word(&s), 0x0009_4040);
    }

    #[test]
    fn literals_wider_than_i64_still_truncate() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        // 2^64 + 1 keeps its low bits instead of reading as a register or label
        let e = enc.encode_line("addi", &ops(&["$t0", "$t0", "18446744073709551617"]), 0).unwrap();
        assert_eq!(word(&e), 0x2108_0001);
        let e = enc.encode_line("beq", &ops(&["$t0", "$t1", "18446744073709551617"]), 0).unwrap();
        assert!(e.fixups.is_empty());
        assert_eq!(word(&e), 0x1109_0001);

        let strict = TemplateEncoder::new(&isa).strict_widths(true);
        let s = strict.encode_line("addi", &ops(&["$t0", "$t0", "18446744073709551617"]), 0).unwrap();
        assert_eq!(
            s.warnings,
            vec![AsmError::ImmediateOutOfRange { value: "18446744073709551617".into(), width: 16 }]
        );
        assert_eq!(word(&s), 0x2108_0001);
    }

    #[test]
    fn special2_and_special3_rows() {
        let isa = mips32::table().unwrap();
        let enc = TemplateEncoder::new(&isa);
        // clz $t0, $t1 places rd in both the rt and rd slots
        let e = enc.encode_line("clz", &ops(&["$t0", "$t1"]), 0).unwrap();
        assert_eq!(word(&e), 0x7128_4020);
        // seb $t0, $t1 -> 011111 00000 01001 01000 10000 100000
        let e = enc.encode_line("seb", &ops(&["$t0", "$t1"]), 0).unwrap();
        assert_eq!(word(&e), 0x7C09_4420);
    }
}

use crate::error::IsaError;
use crate::table::IsaTable;

/// MIPS32 definition table: register names, then one template per mnemonic.
pub const MIPS32: &str = r#"
# ---- registers: numeric and conventional names ----
$0 - 0
$1 - 1
$2 - 2
$3 - 3
$4 - 4
$5 - 5
$6 - 6
$7 - 7
$8 - 8
$9 - 9
$10 - 10
$11 - 11
$12 - 12
$13 - 13
$14 - 14
$15 - 15
$16 - 16
$17 - 17
$18 - 18
$19 - 19
$20 - 20
$21 - 21
$22 - 22
$23 - 23
$24 - 24
$25 - 25
$26 - 26
$27 - 27
$28 - 28
$29 - 29
$30 - 30
$31 - 31
$zero - 0
$at - 1
$v0 - 2
$v1 - 3
$a0 - 4
$a1 - 5
$a2 - 6
$a3 - 7
$t0 - 8
$t1 - 9
$t2 - 10
$t3 - 11
$t4 - 12
$t5 - 13
$t6 - 14
$t7 - 15
$s0 - 16
$s1 - 17
$s2 - 18
$s3 - 19
$s4 - 20
$s5 - 21
$s6 - 22
$s7 - 23
$t8 - 24
$t9 - 25
$k0 - 26
$k1 - 27
$gp - 28
$sp - 29
$fp - 30
$s8 - 30
$ra - 31

# ---- SPECIAL, shift class (funct < 4) ----
sll   - rd rt shift - opcode rs rt rd shift funct - 000000 - 000000
srl   - rd rt shift - opcode rs rt rd shift funct - 000000 - 000010
sra   - rd rt shift - opcode rs rt rd shift funct - 000000 - 000011
nop   -             - opcode rs rt rd shift funct - 000000 - 000000

# ---- SPECIAL, standard class ----
sllv    - rd rt rs - opcode rs rt rd shift funct - 000000 - 000100
srlv    - rd rt rs - opcode rs rt rd shift funct - 000000 - 000110
srav    - rd rt rs - opcode rs rt rd shift funct - 000000 - 000111
jr      - rs       - opcode rs rt rd shift funct - 000000 - 001000
jalr    - rd rs    - opcode rs rt rd shift funct - 000000 - 001001
syscall -          - opcode rs rt rd shift funct - 000000 - 001100
break   -          - opcode rs rt rd shift funct - 000000 - 001101
mfhi    - rd       - opcode rs rt rd shift funct - 000000 - 010000
mthi    - rs       - opcode rs rt rd shift funct - 000000 - 010001
mflo    - rd       - opcode rs rt rd shift funct - 000000 - 010010
mtlo    - rs       - opcode rs rt rd shift funct - 000000 - 010011
mult    - rs rt    - opcode rs rt rd shift funct - 000000 - 011000
multu   - rs rt    - opcode rs rt rd shift funct - 000000 - 011001
div     - rs rt    - opcode rs rt rd shift funct - 000000 - 011010
divu    - rs rt    - opcode rs rt rd shift funct - 000000 - 011011
add     - rd rs rt - opcode rs rt rd shift funct - 000000 - 100000
addu    - rd rs rt - opcode rs rt rd shift funct - 000000 - 100001
sub     - rd rs rt - opcode rs rt rd shift funct - 000000 - 100010
subu    - rd rs rt - opcode rs rt rd shift funct - 000000 - 100011
and     - rd rs rt - opcode rs rt rd shift funct - 000000 - 100100
or      - rd rs rt - opcode rs rt rd shift funct - 000000 - 100101
xor     - rd rs rt - opcode rs rt rd shift funct - 000000 - 100110
nor     - rd rs rt - opcode rs rt rd shift funct - 000000 - 100111
slt     - rd rs rt - opcode rs rt rd shift funct - 000000 - 101010
sltu    - rd rs rt - opcode rs rt rd shift funct - 000000 - 101011

# ---- REGIMM: rt slot selects the condition ----
bltz - rs offset - opcode rs 00000 offset - 000001
bgez - rs offset - opcode rs 00001 offset - 000001

# ---- jumps ----
j   - index - opcode index - 000010
jal - index - opcode index - 000011

# ---- branches ----
beq  - rs rt offset - opcode rs rt offset - 000100
bne  - rs rt offset - opcode rs rt offset - 000101
blez - rs offset    - opcode rs rt offset - 000110
bgtz - rs offset    - opcode rs rt offset - 000111

# ---- immediates ----
addi  - rt rs immediate - opcode rs rt immediate - 001000
addiu - rt rs immediate - opcode rs rt immediate - 001001
slti  - rt rs immediate - opcode rs rt immediate - 001010
sltiu - rt rs immediate - opcode rs rt immediate - 001011
andi  - rt rs immediate - opcode rs rt immediate - 001100
ori   - rt rs immediate - opcode rs rt immediate - 001101
xori  - rt rs immediate - opcode rs rt immediate - 001110
lui   - rt immediate    - opcode rs rt immediate - 001111

# ---- SPECIAL2 ----
madd - rs rt    - opcode rs rt rd shift funct - 011100 - 000000
mul  - rd rs rt - opcode rs rt rd shift funct - 011100 - 000010
msub - rs rt    - opcode rs rt rd shift funct - 011100 - 000100
clz  - rd rs    - opcode rs rd rd shift funct - 011100 - 100000
clo  - rd rs    - opcode rs rd rd shift funct - 011100 - 100001

# ---- SPECIAL3 (BSHFL): selector lives in the shift slot ----
seb - rd rt - opcode rs rt rd 10000 funct - 011111 - 100000
seh - rd rt - opcode rs rt rd 11000 funct - 011111 - 100000

# ---- loads and stores: offset(base) ----
lb  - rt immediate rs - opcode rs rt immediate - 100000
lh  - rt immediate rs - opcode rs rt immediate - 100001
lw  - rt immediate rs - opcode rs rt immediate - 100011
lbu - rt immediate rs - opcode rs rt immediate - 100100
lhu - rt immediate rs - opcode rs rt immediate - 100101
sb  - rt immediate rs - opcode rs rt immediate - 101000
sh  - rt immediate rs - opcode rs rt immediate - 101001
sw  - rt immediate rs - opcode rs rt immediate - 101011
"#;

/// The built-in MIPS32 table.
pub fn table() -> Result<IsaTable, IsaError> {
    IsaTable::parse(MIPS32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RTypeClass;

    #[test]
    fn builtin_table_loads_and_fills_words() {
        let t = table().unwrap();
        assert_eq!(t.register_count(), 65);
        for m in t.mnemonics() {
            assert_eq!(t.instruction(m).unwrap().template_width(), 32, "{m}");
        }
        assert_eq!(t.register("$s8"), t.register("$fp"));
        assert_eq!(t.instruction("sra").unwrap().rtype_class(), Some(RTypeClass::Shift));
        assert_eq!(t.instruction("sllv").unwrap().rtype_class(), Some(RTypeClass::Standard));
        assert_eq!(t.instruction("mul").unwrap().rtype_class(), None);
    }
}

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::IsaError;
use crate::fields::WORD_BITS;

/// Opcode-zero instructions whose function code is below this value are
/// shift-class: they take a shift amount instead of `rs`.
pub const SHIFT_FUNCT_LIMIT: u8 = 4;

/// Marker starting a comment in definition tables.
pub const TABLE_COMMENT: char = '#';

/// Separator between the fields of a definition line.
pub const TABLE_DELIMITER: char = '-';

/// Every register name starts with this.
pub const REGISTER_SIGIL: char = '$';

/// Logical operand position, independent of its source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Rs,
    Rt,
    Rd,
    Immediate,
    Shift,
    Offset,
    Index,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Rs,
        Role::Rt,
        Role::Rd,
        Role::Immediate,
        Role::Shift,
        Role::Offset,
        Role::Index,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Role::Rs => "rs",
            Role::Rt => "rt",
            Role::Rd => "rd",
            Role::Immediate => "immediate",
            Role::Shift => "shift",
            Role::Offset => "offset",
            Role::Index => "index",
        }
    }

    pub fn from_name(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.name() == s)
    }

    pub fn width(self) -> usize {
        match self {
            Role::Rs | Role::Rt | Role::Rd | Role::Shift => 5,
            Role::Immediate | Role::Offset => 16,
            Role::Index => 26,
        }
    }

    /// Constant emitted when an instruction places this field without
    /// taking it as an operand.
    pub fn fixed_value(self) -> u32 {
        0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One slot of an output template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Opcode,
    Funct,
    Role(Role),
    Literal { value: u32, width: u8 },
}

impl Field {
    pub fn width(&self) -> usize {
        match self {
            Field::Opcode | Field::Funct => 6,
            Field::Role(r) => r.width(),
            Field::Literal { width, .. } => *width as usize,
        }
    }

    fn parse(s: &str) -> Option<Field> {
        match s {
            "opcode" => Some(Field::Opcode),
            "funct" => Some(Field::Funct),
            _ => {
                if let Some(r) = Role::from_name(s) {
                    return Some(Field::Role(r));
                }
                if s.len() <= WORD_BITS && s.bytes().all(|b| b == b'0' || b == b'1') {
                    let value = u32::from_str_radix(s, 2).ok()?;
                    return Some(Field::Literal { value, width: s.len() as u8 });
                }
                None
            }
        }
    }
}

/// Layout class of an opcode-zero instruction, decided by its function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RTypeClass {
    /// `op rd, rt, shift`, with the `rs` slot fixed at zero.
    Shift,
    /// `op rd, rs, rt`, with the shift slot fixed at zero.
    Standard,
}

impl RTypeClass {
    fn name(self) -> &'static str {
        match self {
            RTypeClass::Shift => "shift-class",
            RTypeClass::Standard => "standard",
        }
    }

    /// Operand role this class never takes.
    fn forbidden(self) -> Role {
        match self {
            RTypeClass::Shift => Role::Rs,
            RTypeClass::Standard => Role::Shift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSpec {
    pub mnemonic: String,
    pub roles: Vec<Role>,
    pub template: Vec<Field>,
    pub opcode: u8,
    pub funct: Option<u8>,
}

impl InstructionSpec {
    pub fn rtype_class(&self) -> Option<RTypeClass> {
        if self.opcode != 0 {
            return None;
        }
        match self.funct {
            Some(f) if f < SHIFT_FUNCT_LIMIT => Some(RTypeClass::Shift),
            _ => Some(RTypeClass::Standard),
        }
    }

    /// Sum of all template field widths; 32 for a well-formed entry.
    pub fn template_width(&self) -> usize {
        self.template.iter().map(Field::width).sum()
    }
}

/// Instruction templates and register names for one target.
#[derive(Debug, Clone, Default)]
pub struct IsaTable {
    instructions: HashMap<String, InstructionSpec>,
    registers: HashMap<String, u8>,
}

impl IsaTable {
    pub fn instruction(&self, mnemonic: &str) -> Option<&InstructionSpec> {
        self.instructions.get(mnemonic)
    }

    pub fn register(&self, name: &str) -> Option<u8> {
        self.registers.get(name).copied()
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.instructions.keys().map(String::as_str)
    }

    /// Load a definition table. Register lines are `name - index`,
    /// instruction lines `mnemonic - roles - fields - opcode [- funct]`.
    pub fn parse(text: &str) -> Result<Self, IsaError> {
        let mut table = IsaTable::default();
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let body = match raw.find(TABLE_COMMENT) {
                Some(p) => &raw[..p],
                None => raw,
            };
            if body.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = body.split(TABLE_DELIMITER).map(str::trim).collect();
            match parts.len() {
                2 => {
                    if !parts[0].starts_with(REGISTER_SIGIL) {
                        return Err(IsaError::RegisterName { line, name: parts[0].to_string() });
                    }
                    let idx = parts[1]
                        .parse::<u8>()
                        .ok()
                        .filter(|v| *v < 32)
                        .ok_or_else(|| IsaError::RegisterIndex { line, value: parts[1].to_string() })?;
                    table.registers.insert(parts[0].to_string(), idx);
                }
                4 | 5 => {
                    let spec = parse_instruction(line, &parts)?;
                    if spec.template_width() != WORD_BITS {
                        warn!(
                            line,
                            mnemonic = %spec.mnemonic,
                            width = spec.template_width(),
                            "template does not fill a 32-bit word"
                        );
                    }
                    table.instructions.insert(spec.mnemonic.clone(), spec);
                }
                found => return Err(IsaError::FieldCount { line, found }),
            }
        }
        Ok(table)
    }
}

fn parse_bits6(line: usize, s: &str) -> Result<u8, IsaError> {
    if s.len() == 6 && s.bytes().all(|b| b == b'0' || b == b'1') {
        u8::from_str_radix(s, 2).map_err(|_| IsaError::BitPattern { line, bits: s.to_string() })
    } else {
        Err(IsaError::BitPattern { line, bits: s.to_string() })
    }
}

fn parse_instruction(line: usize, parts: &[&str]) -> Result<InstructionSpec, IsaError> {
    let mnemonic = parts[0].to_string();
    let roles = parts[1]
        .split_whitespace()
        .map(|n| Role::from_name(n).ok_or_else(|| IsaError::UnknownRole { line, name: n.to_string() }))
        .collect::<Result<Vec<_>, _>>()?;
    let template = parts[2]
        .split_whitespace()
        .map(|n| Field::parse(n).ok_or_else(|| IsaError::UnknownField { line, name: n.to_string() }))
        .collect::<Result<Vec<_>, _>>()?;
    let opcode = parse_bits6(line, parts[3])?;
    let funct = parts.get(4).map(|s| parse_bits6(line, s)).transpose()?;

    if funct.is_none() && template.contains(&Field::Funct) {
        return Err(IsaError::MissingFunct { line, mnemonic });
    }
    for (k, role) in roles.iter().enumerate() {
        if roles[..k].contains(role) {
            return Err(IsaError::DuplicateRole { line, mnemonic, role: role.name() });
        }
        if !template.contains(&Field::Role(*role)) {
            return Err(IsaError::UnplacedRole { line, mnemonic, role: role.name() });
        }
    }

    let spec = InstructionSpec { mnemonic, roles, template, opcode, funct };
    if let Some(class) = spec.rtype_class() {
        let role = class.forbidden();
        if spec.roles.contains(&role) {
            return Err(IsaError::ClassLayout {
                line,
                mnemonic: spec.mnemonic,
                class: class.name(),
                role: role.name(),
            });
        }
    }
    Ok(spec)
}

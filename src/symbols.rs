use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::driver::EncodedInstruction;
use crate::encoder::{Fixup, FixupKind};
use crate::error::AsmError;
use crate::fields;

/// Label name to byte address. Written during the first pass only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolTable {
    labels: BTreeMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `addr`. A name binds once; a second attempt keeps the
    /// first address and reports it.
    pub fn bind(&mut self, name: &str, addr: u32) -> Result<(), AsmError> {
        if let Some(&previous) = self.labels.get(name) {
            return Err(AsmError::DuplicateLabel { label: name.to_string(), previous });
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Field value for a fixup once its label sits at `target` (byte address).
pub fn fixup_value(kind: FixupKind, index: usize, target: u32, width: usize) -> u32 {
    let target_word = i64::from(target / 4);
    match kind {
        FixupKind::Branch => fields::truncate(target_word - (index as i64 + 1), width),
        FixupKind::Jump => fields::truncate(target_word, width),
    }
}

/// Second pass: patch every deferred field in encounter order. Unbound
/// labels leave the field zeroed and are returned as `(index, error)`.
pub fn resolve(
    fixups: &[Fixup],
    symbols: &SymbolTable,
    instructions: &mut [EncodedInstruction],
) -> Vec<(usize, AsmError)> {
    let mut errors = Vec::new();
    for fx in fixups {
        let Some(inst) = instructions.get_mut(fx.index) else { continue };
        let value = match symbols.get(&fx.label) {
            Some(target) => fixup_value(fx.kind, fx.index, target, fx.width),
            None => {
                errors.push((fx.index, AsmError::UnresolvedLabel { label: fx.label.clone() }));
                0
            }
        };
        debug!(index = fx.index, label = %fx.label, kind = ?fx.kind, value, "patch fixup");
        fields::patch_field(&mut inst.bits, fx.start, fx.width, value);
        inst.pending.remove(fx.kind.pending());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_bind_once() {
        let mut s = SymbolTable::new();
        assert!(s.is_empty());
        s.bind("loop", 8).unwrap();
        assert_eq!(
            s.bind("loop", 16),
            Err(AsmError::DuplicateLabel { label: "loop".into(), previous: 8 })
        );
        assert_eq!(s.get("loop"), Some(8));
        assert_eq!(s.get("missing"), None);
        assert_eq!(s.len(), 1);
        s.bind("exit", 0).unwrap();
        // ordered by name
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![("exit", 0), ("loop", 8)]);
    }

    #[test]
    fn branch_is_relative_to_next_word() {
        // branch at word 0, label at word 2
        assert_eq!(fixup_value(FixupKind::Branch, 0, 8, 16), 1);
        // backwards: branch at word 5, label at word 1 -> -5
        assert_eq!(fixup_value(FixupKind::Branch, 5, 4, 16), 0xFFFB);
        // self loop -> -1
        assert_eq!(fixup_value(FixupKind::Branch, 3, 12, 16), 0xFFFF);
    }

    #[test]
    fn jump_is_absolute_word_index() {
        assert_eq!(fixup_value(FixupKind::Jump, 7, 40, 26), 10);
        assert_eq!(fixup_value(FixupKind::Jump, 0, 0, 26), 0);
    }
}

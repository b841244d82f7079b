//! Binding of trailing non-flag tokens by ordinal position.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use crate::types::Slot;

/// Positional slots of one command. Indices may have gaps.
#[derive(Clone, Default)]
pub(crate) struct Positionals {
    slots: BTreeMap<usize, Rc<dyn Slot>>,
}

impl Positionals {
    pub(crate) fn insert(&mut self, index: usize, slot: Rc<dyn Slot>) {
        self.slots.insert(index, slot);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Assigns `tokens[i]` to the slot at index `i`, if any.
    ///
    /// Tokens that do not parse as the slot's type are ignored and leave the
    /// bound value as it was; a negative number never lands in an unsigned slot.
    pub(crate) fn bind(&self, tokens: &[String]) {
        for (index, token) in tokens.iter().enumerate() {
            if let Some(slot) = self.slots.get(&index) {
                trace!(index, token = %token, "binding positional");
                slot.assign_lenient(token);
            }
        }
    }
}

impl std::fmt::Debug for Positionals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(index, slot)| (index, slot.snapshot())))
            .finish()
    }
}

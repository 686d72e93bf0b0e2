//! Per-round interning of robot names
//!
//! Names repeat on every turn, so the spool writes each distinct name once
//! per round and refers back to it by position afterwards. Writer and reader
//! each keep their own arena and both clear it at the first turn of every
//! round, so a shared reference never crosses a round boundary.

use battlerec_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// A name as stored in a spool record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameRef<'a> {
    /// First occurrence in the round; the reader appends it to its arena
    Inline(Cow<'a, str>),
    /// Position of a name already seen in the round
    Shared(u32),
}

/// Interning state for one side of the spool
#[derive(Debug, Default)]
pub struct NameArena {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl NameArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer side: reference a name, inlining it on first sight
    pub fn intern<'a>(&mut self, name: &'a str) -> NameRef<'a> {
        if let Some(&position) = self.index.get(name) {
            return NameRef::Shared(position);
        }
        let position = self.index.len() as u32;
        self.index.insert(name.to_string(), position);
        NameRef::Inline(Cow::Borrowed(name))
    }

    /// Reader side: turn a stored reference back into the name
    pub fn resolve(&mut self, name: NameRef<'_>) -> Result<String> {
        match name {
            NameRef::Inline(name) => {
                let name = name.into_owned();
                self.names.push(name.clone());
                Ok(name)
            }
            NameRef::Shared(position) => {
                self.names.get(position as usize).cloned().ok_or_else(|| {
                    Error::corruption(format!(
                        "name reference #{} not defined in the current round ({} known)",
                        position,
                        self.names.len()
                    ))
                })
            }
        }
    }

    /// Forget every name; called at each round boundary
    pub fn reset(&mut self) {
        self.names.clear();
        self.index.clear();
    }

    /// Number of distinct names held
    pub fn len(&self) -> usize {
        self.names.len().max(self.index.len())
    }

    /// True if no names are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

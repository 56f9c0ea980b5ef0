use std::fmt;

use crate::types::Type;

// How the storage of a static variable is populated before first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitKind {
    Extern,    // Filled by the caller
    Broadcast, // Every element set to `val`
    Xavier,    // Scaled random values, `val` is the fan-in
}

impl InitKind {
    pub fn name(&self) -> &'static str {
        match self {
            InitKind::Extern => "extern",
            InitKind::Broadcast => "broadcast",
            InitKind::Xavier => "xavier",
        }
    }
}

impl fmt::Display for InitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Weights persist across invocations, activations are per-invocation scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareKind {
    Weight,
    Activation,
}

impl ShareKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShareKind::Weight => "weight",
            ShareKind::Activation => "activation",
        }
    }
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticVariable {
    pub init_kind: InitKind,
    pub share_kind: ShareKind,
    pub val: f32,
}

impl StaticVariable {
    pub fn new(init_kind: InitKind, share_kind: ShareKind, val: f32) -> Self {
        Self {
            init_kind,
            share_kind,
            val,
        }
    }

    pub fn is_weight(&self) -> bool {
        self.share_kind == ShareKind::Weight
    }

    // "<type>, <share>" followed by ", <init>, <val>" unless extern
    pub fn extra_desc(&self, ty: &Type) -> String {
        let mut desc = format!("{}, {}", ty, self.share_kind);
        if self.init_kind != InitKind::Extern {
            desc += &format!(", {}, {}", self.init_kind, self.val);
        }
        desc
    }
}

impl Default for StaticVariable {
    fn default() -> Self {
        Self {
            init_kind: InitKind::Extern,
            share_kind: ShareKind::Activation,
            val: 0.0,
        }
    }
}

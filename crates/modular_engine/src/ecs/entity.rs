//! Entity implementation

use slotmap::{Key, KeyData};
use std::fmt;

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// An opaque, generation-checked key. It carries no data of its own and
    /// only joins rows across component tables. A destroyed entity's key is
    /// never handed out again.
    pub struct Entity;
}

impl Entity {
    /// Get the packed entity ID
    pub fn id(&self) -> u64 {
        self.data().as_ffi()
    }

    /// Rebuild an entity key from [`Entity::id`]
    pub fn from_id(id: u64) -> Self {
        KeyData::from_ffi(id).into()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({:#x})", self.id())
    }
}

//! Script component

use crate::ecs::Component;
use crate::foundation::collections::Handle;

/// Marker for script runtime state owned by a scripting module
#[derive(Debug)]
pub enum ScriptState {}

/// Handle to per-entity state inside the scripting runtime
pub type ScriptStateHandle = Handle<ScriptState>;

/// Script attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptComponent {
    /// Script asset reference
    pub script_path: String,
    /// Disabled scripts are skipped by the runtime
    pub enabled: bool,
    /// Runtime state, invalid until the scripting module loads the script
    pub state_handle: ScriptStateHandle,
}

impl Component for ScriptComponent {}

impl ScriptComponent {
    /// Enabled script with no runtime state yet
    pub fn new(script_path: impl Into<String>) -> Self {
        Self {
            script_path: script_path.into(),
            enabled: true,
            state_handle: ScriptStateHandle::INVALID,
        }
    }
}

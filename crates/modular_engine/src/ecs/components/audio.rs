//! Audio source component

use crate::ecs::Component;
use crate::foundation::collections::Handle;

/// Marker for voices owned by an audio module
#[derive(Debug)]
pub enum AudioVoice {}

/// Handle to a playing voice
pub type AudioHandle = Handle<AudioVoice>;

/// Sound emitter attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct AudioComponent {
    /// Clip asset reference
    pub clip_path: String,
    /// Restart when the clip ends
    pub looping: bool,
    /// Playback requested
    pub playing: bool,
    /// Gain in `0.0..=1.0`
    pub volume: f32,
    /// Playback rate multiplier
    pub pitch: f32,
    /// Attenuate by distance from the listener
    pub spatial: bool,
    /// Distance at which attenuation starts
    pub min_distance: f32,
    /// Distance beyond which the source is silent
    pub max_distance: f32,
    /// Voice, invalid until the audio module starts playback
    pub handle: AudioHandle,
}

impl Component for AudioComponent {}

impl AudioComponent {
    /// Non-looping, stopped 2D source
    pub fn new(clip_path: impl Into<String>) -> Self {
        Self {
            clip_path: clip_path.into(),
            looping: false,
            playing: false,
            volume: 1.0,
            pitch: 1.0,
            spatial: false,
            min_distance: 1.0,
            max_distance: 100.0,
            handle: AudioHandle::INVALID,
        }
    }

    /// Builder pattern: Enable distance attenuation
    pub fn with_spatial(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.spatial = true;
        self.min_distance = min_distance;
        self.max_distance = max_distance.max(min_distance);
        self
    }

    /// Gain at `distance` from the listener, linear falloff
    pub fn attenuation(&self, distance: f32) -> f32 {
        if !self.spatial || distance <= self.min_distance {
            return self.volume;
        }
        if distance >= self.max_distance {
            return 0.0;
        }
        let span = self.max_distance - self.min_distance;
        self.volume * (1.0 - (distance - self.min_distance) / span)
    }
}

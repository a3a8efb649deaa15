//! Component trait

/// Marker trait for components
///
/// Any plain `'static` data type can be stored in a [`World`](super::World)
/// table once it implements this trait.
pub trait Component: 'static + Send + Sync {}

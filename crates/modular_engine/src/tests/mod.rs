//! Engine-level scenarios that cross module, service and ECS boundaries

mod lifecycle;

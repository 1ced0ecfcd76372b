//! Value object marker: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attributes
/// (`Money`, `DesignFile`, …). They are immutable: "changing" one means building
/// a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Courses, students and enrollments are entities: they are looked up by key
/// and keep that key for their whole lifetime.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

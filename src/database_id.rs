//! Database ID type definition.

/// Alias for the integer type used for mapping to database IDs.
///
/// Users get a dedicated newtype, see [crate::UserID], since user IDs are
/// passed around the most and are the easiest to mix up.
pub type DatabaseId = i64;

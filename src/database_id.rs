//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// Database identifier for a category.
///
/// This is the only identifier a category has. It is used in forms, URLs and
/// the receipt scanning prompt alike.
pub type CategoryId = DatabaseId;

//! The identity contract for diffable items.

use std::fmt::Debug;
use std::hash::Hash;

/// The contract items must satisfy to take part in keyed diffing.
///
/// A diffable item has two distinct notions of sameness:
///
/// - **Identity**: [`diff_key`](Diffable::diff_key) returns a stable
///   key that identifies the item across updates, independent of its
///   content or position. Two items are "the same entity" iff their
///   keys compare equal. Key equality must be reflexive, symmetric,
///   and transitive; violating that is a caller error.
/// - **Content equality**: [`content_eq`](Diffable::content_eq)
///   compares the rendered substance of two items that share a key.
///   When it fails, the item is reported as an *update* rather than
///   unchanged.
///
/// # Example
///
/// ```
/// use sectional_diff::Diffable;
///
/// #[derive(Clone)]
/// struct Post {
///     id: u64,
///     body: String,
/// }
///
/// impl Diffable for Post {
///     type Key = u64;
///
///     fn diff_key(&self) -> u64 {
///         self.id
///     }
///
///     fn content_eq(&self, other: &Self) -> bool {
///         self.body == other.body
///     }
/// }
/// ```
pub trait Diffable {
    /// The stable identity key for this item.
    type Key: Hash + Eq + Clone + Debug;

    /// Returns the identity key for this item.
    fn diff_key(&self) -> Self::Key;

    /// Returns `true` if `other` carries the same content.
    ///
    /// Only called for items whose keys already compare equal.
    fn content_eq(&self, other: &Self) -> bool;
}

/// Strings diff by their own value: identity and content coincide.
impl Diffable for String {
    type Key = String;

    fn diff_key(&self) -> String {
        self.clone()
    }

    fn content_eq(&self, other: &Self) -> bool {
        self == other
    }
}

macro_rules! impl_diffable_for_int {
    ($($ty:ty),*) => {
        $(
            impl Diffable for $ty {
                type Key = $ty;

                fn diff_key(&self) -> $ty {
                    *self
                }

                fn content_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_diffable_for_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

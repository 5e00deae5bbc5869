use std::fmt;

use uuid::Uuid;

/// Opaque token identifying one live registration in a [`MutableDocument`].
///
/// Handles are only meaningful to the document instance that issued them and
/// deliberately do not implement `Serialize`.
///
/// [`MutableDocument`]: crate::MutableDocument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub Uuid);

impl Handle {
	/// Creates a fresh random handle.
	pub fn new_v4() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

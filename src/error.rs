use thiserror::Error;

/// Errors returned by [`SortedDict`](crate::SortedDict) and
/// [`AlphaSortedDict`](crate::AlphaSortedDict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A builder was finished without an ordering key function.
    #[error("a sorted dict requires an ordering key function")]
    MissingOrderKey,
    /// The requested key is not present.
    #[error("key not found")]
    KeyNotFound,
    /// A key's `Display` implementation failed while coercing it to text.
    #[error("key could not be rendered as text")]
    KeyCoercion,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

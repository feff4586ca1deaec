#![deny(missing_docs)]

//! This crate defines error & result types for Tessera.
//! It also contains a variety of useful macros for error handling.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

// Alias so `thiserror` does not auto-generate the nightly-only `Error::provide` impl,
// which it does for any field whose type is spelled `Backtrace`.
type CapturedBacktrace = Backtrace;

/// The top-level error type for Tessera.
///
/// Every variant corresponds to one failure class of the schema layer. None of them are
/// retried or recovered from internally; callers decide whether an error is user-visible.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum TesseraError {
    /// A schema could not be constructed because one of its invariants does not hold.
    #[error("invalid schema: {0}\nBacktrace:\n{1}")]
    InvalidSchema(ErrString, CapturedBacktrace),
    /// An argument to a schema query or derivation is invalid.
    #[error("invalid argument: {0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// A coordinate lies outside the domain of its dimension.
    #[error("coordinates out of domain: {0}\nBacktrace:\n{1}")]
    OutOfDomain(ErrString, CapturedBacktrace),
    /// A coordinate vector does not match the schema's dimensionality, type or domain.
    #[error("invalid coordinates: {0}\nBacktrace:\n{1}")]
    InvalidCoordinates(ErrString, CapturedBacktrace),
    /// A tile operation was requested on a schema without tile extents.
    #[error("irregular tiling: {0}\nBacktrace:\n{1}")]
    IrregularTiling(ErrString, CapturedBacktrace),
    /// A serialized schema is truncated or internally inconsistent.
    #[error("corrupt schema: {0}\nBacktrace:\n{1}")]
    CorruptSchema(ErrString, CapturedBacktrace),
    /// A name lookup failed.
    #[error("not found: {0}\nBacktrace:\n{1}")]
    NotFound(ErrString, CapturedBacktrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, Box<TesseraError>),
}

impl TesseraError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        TesseraError::Context(msg.into(), Box::new(self))
    }

    /// Strips any [`TesseraError::Context`] wrappers, returning the innermost error.
    pub fn root(&self) -> &TesseraError {
        match self {
            TesseraError::Context(_, inner) => inner.root(),
            other => other,
        }
    }
}

impl Debug for TesseraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A convenient macro for creating a [`TesseraError`].
///
/// The first token names the variant; without one, `InvalidArgument` is assumed.
#[macro_export]
macro_rules! tessera_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::TesseraError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::tessera_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a [`TesseraError`].
#[macro_export]
macro_rules! tessera_bail {
    ($($tt:tt)+) => {
        return Err($crate::tessera_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a [`TesseraError`] in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! tessera_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::tessera_panic!($crate::tessera_err!($variant: $fmt, $($arg),*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::tessera_panic!($crate::tessera_err!($fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::TesseraError = $err;
        $crate::tessera_panic!(err.with_context(format!($fmt, $($arg),*)))
    }};
    ($err:expr) => {{
        #[allow(clippy::panic)]
        {
            let err: $crate::TesseraError = $err;
            panic!("{}", err)
        }
    }};
}

/// A type alias for Results that return [`TesseraError`]s as their error type.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// A trait for unwrapping a [`TesseraResult`], panicking with context on failure.
pub trait TesseraExpect {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is successful, otherwise panics with the error.
    ///
    /// Should only be used where the error is an invariant violation that cannot be caused by
    /// a caller's input.
    fn tessera_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> TesseraExpect for Result<T, E>
where
    E: Into<TesseraError>,
{
    type Output = T;

    #[inline(always)]
    fn tessera_expect(self, msg: &str) -> Self::Output {
        match self {
            Ok(value) => value,
            Err(err) => {
                let err: TesseraError = err.into();
                tessera_panic!(err.with_context(msg.to_string()))
            }
        }
    }
}

impl<T> TesseraExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn tessera_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = TesseraError::InvalidArgument(msg.to_string().into(), Backtrace::capture());
            tessera_panic!(err)
        })
    }
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub const fn must_use(error: crate::TesseraError) -> crate::TesseraError {
        error
    }
}

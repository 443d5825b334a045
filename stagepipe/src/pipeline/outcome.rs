//! How a pipeline run ended.

/// The successful result of running a pipeline.
///
/// Both variants are successes; failures travel in the `Err` channel of
/// [`Pipeline::run`](super::Pipeline::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome<P> {
    /// Every stage forwarded and the payload reached the end of the chain.
    Completed(P),
    /// A stage returned without invoking its continuation.
    ShortCircuited(P),
}

impl<P> Outcome<P> {
    pub(crate) fn new(reached_end: bool, payload: P) -> Self {
        if reached_end {
            Self::Completed(payload)
        } else {
            Self::ShortCircuited(payload)
        }
    }

    /// Returns true if the chain ran to its end.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if a stage stopped the chain early.
    #[must_use]
    pub const fn is_short_circuited(&self) -> bool {
        matches!(self, Self::ShortCircuited(_))
    }

    /// Borrows the resulting payload.
    #[must_use]
    pub const fn payload(&self) -> &P {
        match self {
            Self::Completed(p) | Self::ShortCircuited(p) => p,
        }
    }

    /// Consumes the outcome, returning the payload.
    pub fn into_inner(self) -> P {
        match self {
            Self::Completed(p) | Self::ShortCircuited(p) => p,
        }
    }

    /// Transforms the payload, keeping the variant.
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Outcome<Q> {
        match self {
            Self::Completed(p) => Outcome::Completed(f(p)),
            Self::ShortCircuited(p) => Outcome::ShortCircuited(f(p)),
        }
    }
}

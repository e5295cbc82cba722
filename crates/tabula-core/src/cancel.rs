use crate::error::{Error, ErrorOrigin};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

///
/// CancellationToken
///
/// Cooperative stop signal shared between a caller and in-flight mapping
/// or binding work. Cloning shares the same flag.
///

#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Checkpoint: `Err(Cancelled)` once the token has fired.
    pub fn check(&self, origin: ErrorOrigin) -> Result<(), Error> {
        if self.is_cancelled() {
            return Err(Error::cancelled(origin));
        }

        Ok(())
    }
}

/// Checkpoint for an optional token.
pub(crate) fn checkpoint(
    token: Option<&CancellationToken>,
    origin: ErrorOrigin,
) -> Result<(), Error> {
    token.map_or(Ok(()), |token| token.check(origin))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();

        assert!(observer.check(ErrorOrigin::Mapper).is_ok());
        token.cancel();

        assert!(observer.is_cancelled());
        assert!(observer.check(ErrorOrigin::Mapper).unwrap_err().is_cancelled());
    }

    #[test]
    fn missing_token_never_cancels() {
        assert!(checkpoint(None, ErrorOrigin::Parameter).is_ok());
    }
}

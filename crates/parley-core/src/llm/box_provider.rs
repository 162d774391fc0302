//! BoxCompletionProvider -- object-safe dynamic dispatch wrapper for
//! [`CompletionProvider`].
//!
//! 1. `CompletionProviderDyn` is an object-safe twin with boxed futures
//! 2. It is blanket-implemented for every `T: CompletionProvider`
//! 3. `BoxCompletionProvider` wraps `Box<dyn CompletionProviderDyn>` and
//!    implements `CompletionProvider` itself, so services stay generic

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{ChatTurn, CompletionError};

use super::provider::CompletionProvider;

/// Object-safe version of [`CompletionProvider`] with boxed futures.
pub trait CompletionProviderDyn: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        history: &'a [ChatTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;
}

impl<T: CompletionProvider> CompletionProviderDyn for T {
    fn complete_boxed<'a>(
        &'a self,
        history: &'a [ChatTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(self.complete(history))
    }
}

/// Type-erased completion provider, chosen at runtime by the host.
pub struct BoxCompletionProvider {
    inner: Box<dyn CompletionProviderDyn>,
}

impl BoxCompletionProvider {
    pub fn new<T: CompletionProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }
}

impl CompletionProvider for BoxCompletionProvider {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, CompletionError> {
        self.inner.complete_boxed(history).await
    }
}

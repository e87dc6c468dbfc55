//! Live page delivery to a caller supplied observer
use crate::crawler::page::Page;
use crate::ObserverError;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Receives every page as soon as its fetch completes
///
/// Called concurrently from many workers. Returning an error does not stop
/// the crawl; call [`crate::Website::stop`] for that.
pub trait Subscriber: Send + Sync {
    fn on_page(&self, page: &Page) -> anyhow::Result<()>;
}

impl<F> Subscriber for F
where
    F: Fn(&Page) -> anyhow::Result<()> + Send + Sync,
{
    fn on_page(&self, page: &Page) -> anyhow::Result<()> {
        self(page)
    }
}

/// Holds at most one observer for a crawl and isolates its failures
#[derive(Clone, Default)]
pub struct SubscriptionSink {
    subscriber: Option<Arc<dyn Subscriber>>,
}

impl SubscriptionSink {
    pub fn new(subscriber: Option<Arc<dyn Subscriber>>) -> Self {
        Self { subscriber }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_some()
    }

    /// Hands a page to the observer
    ///
    /// Errors and panics raised by the observer are caught and returned.
    pub fn deliver(&self, page: &Page) -> Result<(), ObserverError> {
        let Some(subscriber) = &self.subscriber else {
            return Ok(());
        };

        match catch_unwind(AssertUnwindSafe(|| subscriber.on_page(page))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ObserverError::Failed {
                url: page.url.clone(),
                message: format!("{:#}", e),
            }),
            Err(panic) => Err(ObserverError::Panicked {
                url: page.url.clone(),
                message: panic_message(panic.as_ref()),
            }),
        }
    }
}

impl fmt::Debug for SubscriptionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSink")
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn create_test_page(path: &str) -> Page {
        let url = Url::parse(&format!("https://a.test{}", path)).unwrap();
        Page::failed(
            &url,
            FetchError::Timeout {
                url: url.to_string(),
            },
        )
    }

    #[test]
    fn test_no_subscriber_is_noop() {
        let sink = SubscriptionSink::default();
        assert!(!sink.is_subscribed());
        assert!(sink.deliver(&create_test_page("/")).is_ok());
    }

    #[test]
    fn test_closure_subscriber_receives_pages() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscriber = move |_page: &Page| -> anyhow::Result<()> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        let sink = SubscriptionSink::new(Some(Arc::new(subscriber)));

        sink.deliver(&create_test_page("/a")).unwrap();
        sink.deliver(&create_test_page("/b")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_is_captured() {
        let subscriber = |page: &Page| -> anyhow::Result<()> {
            anyhow::bail!("cannot handle {}", page.url)
        };
        let sink = SubscriptionSink::new(Some(Arc::new(subscriber)));

        let err = sink.deliver(&create_test_page("/x")).unwrap_err();
        assert_eq!(
            err,
            ObserverError::Failed {
                url: "https://a.test/x".to_string(),
                message: "cannot handle https://a.test/x".to_string(),
            }
        );
    }

    #[test]
    fn test_panic_is_captured() {
        let subscriber = |_page: &Page| -> anyhow::Result<()> { panic!("observer blew up") };
        let sink = SubscriptionSink::new(Some(Arc::new(subscriber)));

        let err = sink.deliver(&create_test_page("/p")).unwrap_err();
        assert!(matches!(
            err,
            ObserverError::Panicked { ref message, .. } if message == "observer blew up"
        ));

        // The sink keeps working after a panic
        assert!(sink.deliver(&create_test_page("/q")).is_err());
    }
}

/// Removes a native event handler when dropped.
///
/// Backends hold one of these across the poll so that the handler is
/// deregistered on success, failure, cancellation, and early returns alike.
#[must_use = "dropping a subscription immediately removes the handler"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

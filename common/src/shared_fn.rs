use std::fmt;
use std::sync::Arc;

/// Optional callback taking one `A`, cheap to clone across worker threads.
///
/// Calling an unset callback does nothing.
pub struct SharedFn<A> {
    f: Option<Arc<dyn Fn(A) + Send + Sync>>,
}

impl<A> SharedFn<A> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            f: Some(Arc::new(f)),
        }
    }

    pub fn none() -> Self {
        Self { f: None }
    }

    pub fn is_some(&self) -> bool {
        self.f.is_some()
    }

    pub fn call(&self, arg: A) {
        if let Some(f) = &self.f {
            f(arg);
        }
    }
}

impl<A> Clone for SharedFn<A> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<A> Default for SharedFn<A> {
    fn default() -> Self {
        Self::none()
    }
}

impl<A> fmt::Debug for SharedFn<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_some() { "set" } else { "unset" };
        f.debug_tuple("SharedFn").field(&state).finish()
    }
}

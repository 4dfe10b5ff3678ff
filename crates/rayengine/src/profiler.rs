use std::time::Instant;

use tracing::info;

/// Logs how long a scope took when dropped.
///
/// Usually created through [`profile_scope!`](crate::profile_scope), which
/// compiles to nothing in release builds.
#[derive(Debug)]
#[must_use = "the scope is measured until the guard is dropped"]
pub struct ProfileScope {
    name: String,
    started: Instant,
}

impl ProfileScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Elapsed time so far, without logging.
    pub fn elapsed_millis(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1_000.0
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_millis();
        info!(
            scope = %self.name,
            elapsed_ms,
            "[PROFILER] {}: {:.3} ms",
            self.name,
            elapsed_ms
        );
    }
}

/// Measures the enclosing scope in debug builds.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(debug_assertions)]
        let _profile_scope = $crate::profiler::ProfileScope::new($name);
    };
}

/// Measures the enclosing function in debug builds, named by its path.
#[macro_export]
macro_rules! profile_function {
    () => {
        #[cfg(debug_assertions)]
        let _profile_scope = $crate::profiler::ProfileScope::new({
            fn __marker() {}
            $crate::profiler::enclosing_function(__marker)
        });
    };
}

/// Path of the function that declares `marker`.
#[doc(hidden)]
pub fn enclosing_function<T>(_marker: T) -> &'static str {
    let path = std::any::type_name::<T>();
    path.strip_suffix("::__marker").unwrap_or(path)
}

use std::sync::Arc;

/// Configuration of a single [`Stepper`](crate::Stepper).
///
/// Use the builder methods to customize, or [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use simstep::Config;
///
/// let config = Config::default()
///     .with_name("training")      // Shows up in logs and snapshots
///     .with_default_steps(10);    // Steps per burst until set otherwise
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the stepper, attached to every log record and snapshot.
    /// Useful when several steppers coexist in one process.
    /// Default: "stepper"
    pub name: Arc<str>,

    /// Initial number of matching step points per stepping burst.
    /// Used by [`Stepper::resume`](crate::Stepper::resume) until a burst
    /// size is set explicitly.
    /// Default: 1
    pub default_steps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: Arc::from("stepper"),
            default_steps: 1,
        }
    }
}

impl Config {
    /// Set the name used in logs and snapshots.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the initial stepping burst size.
    ///
    /// A value of `0` behaves like `1`: a burst always lasts at least one
    /// matching step point.
    pub fn with_default_steps(mut self, steps: usize) -> Self {
        self.default_steps = steps;
        self
    }
}

//! Transfer options.

/// The environment variable disabling run optimisation when set.
pub const ENV_NO_OPTIMIZATION: &str = "NCZ_NOOPTIMIZATION";

/// The environment variable holding the integer diagnostic verbosity.
pub const ENV_VERBOSITY: &str = "NCZ_WDEBUG";

/// Options for hyperslab transfers.
///
/// The default values are:
/// - `optimize`: `true`
/// - `whole_variable_fast_path`: `true`
/// - `verbosity`: `0`
///
/// Verbosity levels:
/// - `1`: a `debug` log summary of each transfer,
/// - `2`: additionally the slices and the projections of each chunk,
/// - `3`: additionally a `trace` log per transferred run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    optimize: bool,
    whole_variable_fast_path: bool,
    verbosity: u8,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            whole_variable_fast_path: true,
            verbosity: 0,
        }
    }
}

impl TransferOptions {
    /// Create transfer options from the `NCZ_NOOPTIMIZATION` and `NCZ_WDEBUG` environment variables.
    ///
    /// Unset variables keep their defaults, and an unparseable verbosity is treated as `0`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create transfer options from environment variables returned by `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if lookup(ENV_NO_OPTIMIZATION).is_some() {
            options.set_optimize(false);
        }
        if let Some(verbosity) = lookup(ENV_VERBOSITY) {
            options.set_verbosity(verbosity.trim().parse().unwrap_or(0));
        }
        options
    }

    /// Return the optimize setting.
    ///
    /// If enabled, the last dimension of each chunk projection is transferred as a single run rather than element by element.
    #[must_use]
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    /// Set whether or not to transfer runs.
    pub fn set_optimize(&mut self, optimize: bool) -> &mut Self {
        self.optimize = optimize;
        self
    }

    /// Set whether or not to transfer runs.
    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Return the whole variable fast path setting.
    ///
    /// If enabled, a request selecting every element of a variable held in a single chunk is transferred as one block.
    #[must_use]
    pub fn whole_variable_fast_path(&self) -> bool {
        self.whole_variable_fast_path
    }

    /// Set whether or not to use the whole variable fast path.
    pub fn set_whole_variable_fast_path(&mut self, whole_variable_fast_path: bool) -> &mut Self {
        self.whole_variable_fast_path = whole_variable_fast_path;
        self
    }

    /// Set whether or not to use the whole variable fast path.
    #[must_use]
    pub fn with_whole_variable_fast_path(mut self, whole_variable_fast_path: bool) -> Self {
        self.whole_variable_fast_path = whole_variable_fast_path;
        self
    }

    /// Return the diagnostic verbosity.
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Set the diagnostic verbosity.
    pub fn set_verbosity(&mut self, verbosity: u8) -> &mut Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the diagnostic verbosity.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_options_default() {
        let options = TransferOptions::default();
        assert!(options.optimize());
        assert!(options.whole_variable_fast_path());
        assert_eq!(options.verbosity(), 0);
        assert_eq!(TransferOptions::from_lookup(|_| None), options);
    }

    #[test]
    fn transfer_options_lookup() {
        let options = TransferOptions::from_lookup(|name| match name {
            ENV_NO_OPTIMIZATION => Some(String::new()),
            ENV_VERBOSITY => Some(" 2\n".to_string()),
            _ => None,
        });
        assert!(!options.optimize());
        assert_eq!(options.verbosity(), 2);

        let options =
            TransferOptions::from_lookup(|name| (name == ENV_VERBOSITY).then(|| "x".to_string()));
        assert!(options.optimize());
        assert_eq!(options.verbosity(), 0);
    }

    #[test]
    fn transfer_options_builder() {
        let mut options = TransferOptions::default().with_optimize(false);
        options.set_whole_variable_fast_path(false).set_verbosity(3);
        assert!(!options.optimize());
        assert!(!options.whole_variable_fast_path());
        assert_eq!(options.verbosity(), 3);
    }
}

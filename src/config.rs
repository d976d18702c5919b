//! Construction-time parameters for `ProbeChainTable`.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be at least one bucket")]
    ZeroCapacity,
    #[error("max load factor must be finite and within (0, 1], got: {0}")]
    InvalidLoadFactor(f64),
}

/// Initial bucket count and growth threshold of a table.
///
/// Growth itself is fixed: a table of `n` buckets grows to `2 * n + 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    initial_capacity: usize,
    max_load_factor: f64,
}

impl TableConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 11;
    pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.71;

    pub fn new(initial_capacity: usize, max_load_factor: f64) -> Result<Self, ConfigError> {
        if initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        // Above 1.0 the table could hold more live keys than buckets.
        if !max_load_factor.is_finite() || max_load_factor <= 0.0 || max_load_factor > 1.0 {
            return Err(ConfigError::InvalidLoadFactor(max_load_factor));
        }
        Ok(Self {
            initial_capacity,
            max_load_factor,
        })
    }

    pub fn with_initial_capacity(self, initial_capacity: usize) -> Result<Self, ConfigError> {
        Self::new(initial_capacity, self.max_load_factor)
    }

    pub fn with_max_load_factor(self, max_load_factor: f64) -> Result<Self, ConfigError> {
        Self::new(self.initial_capacity, max_load_factor)
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// True when holding `len` entries in `capacity` buckets breaks the bound.
    #[inline]
    pub(crate) fn exceeds(&self, len: usize, capacity: usize) -> bool {
        len as f64 / capacity as f64 > self.max_load_factor
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_load_factor: Self::DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TableConfig::default();
        assert_eq!(c.initial_capacity(), 11);
        assert_eq!(c.max_load_factor(), 0.71);
    }

    /// Invariant: zero buckets and load factors outside (0, 1] are rejected.
    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(TableConfig::new(0, 0.5), Err(ConfigError::ZeroCapacity));
        for lf in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
            match TableConfig::new(11, lf) {
                Err(ConfigError::InvalidLoadFactor(_)) => {}
                other => panic!("unexpected result for {lf}: {:?}", other),
            }
        }
        assert!(TableConfig::new(1, 1.0).is_ok());
    }

    #[test]
    fn builders_keep_the_other_field() {
        let c = TableConfig::default().with_initial_capacity(5).unwrap();
        assert_eq!(c.initial_capacity(), 5);
        assert_eq!(c.max_load_factor(), TableConfig::DEFAULT_MAX_LOAD_FACTOR);

        let c = c.with_max_load_factor(0.5).unwrap();
        assert_eq!(c.initial_capacity(), 5);
        assert_eq!(c.max_load_factor(), 0.5);
        assert!(c.with_max_load_factor(2.0).is_err());
    }

    /// Invariant: the growth threshold compares strictly, so 8 of 11 buckets
    /// exceeds 0.71 while 7 of 11 does not.
    #[test]
    fn exceeds_threshold() {
        let c = TableConfig::default();
        assert!(!c.exceeds(7, 11));
        assert!(c.exceeds(8, 11));
        assert!(!c.exceeds(16, 23));
        assert!(c.exceeds(17, 23));
    }
}

use std::fmt;
use std::hash::Hash;

/// The requirements on the symbols of a transducer.
pub trait Symbol: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Symbol for T {}

/// The requirements on the states of a transducer. States carry no meaning
/// beyond their identity, so composite states such as pairs and histories are
/// states as well.
pub trait State: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> State for T {}

/// The two reserved symbols of a transducer.
///
/// These are part of every transducer instead of being global constants,
/// since the symbol type determines which values are available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sentinels<A> {
    /// Denotes that no symbol is consumed or produced.
    pub epsilon: A,

    /// Denotes the end of a sequence, appended implicitly during training.
    pub stop: A,
}

impl<A: Symbol> Sentinels<A> {
    /// Creates the reserved symbols, which must be distinct.
    pub fn new(epsilon: A, stop: A) -> Self {
        debug_assert_ne!(epsilon, stop, "Epsilon and stop must be distinct symbols");
        Self { epsilon, stop }
    }

    /// Returns true iff the given symbol is one of the reserved symbols.
    pub fn is_reserved(&self, symbol: &A) -> bool {
        *symbol == self.epsilon || *symbol == self.stop
    }
}

impl Default for Sentinels<String> {
    fn default() -> Self {
        Self::new("ε".to_string(), "</s>".to_string())
    }
}

impl Default for Sentinels<char> {
    fn default() -> Self {
        // The end of text control character.
        Self::new('ε', '\u{3}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sentinels_are_reserved() {
        let sentinels = Sentinels::<String>::default();
        assert!(sentinels.is_reserved(&"ε".to_string()));
        assert!(sentinels.is_reserved(&"</s>".to_string()));
        assert!(!sentinels.is_reserved(&"a".to_string()));

        let sentinels = Sentinels::<char>::default();
        assert!(sentinels.is_reserved(&'ε'));
        assert!(!sentinels.is_reserved(&'a'));
    }
}

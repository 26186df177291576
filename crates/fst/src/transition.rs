use std::fmt;

/// A transition of a transducer.
///
/// ```text
///           input:output
///     from --------------> to
/// ```
///
/// The identity of a transition consists of exactly these four fields, its
/// weight is stored separately by the transducer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition<S, A> {
    pub from: S,
    pub input: A,
    pub output: A,
    pub to: S,
}

impl<S, A> Transition<S, A> {
    /// Constructs a new transition.
    pub fn new(from: S, input: A, output: A, to: S) -> Self {
        Self {
            from,
            input,
            output,
            to,
        }
    }
}

impl<S: fmt::Debug, A: fmt::Debug> fmt::Display for Transition<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} --[{:?}:{:?}]-> {:?}", self.from, self.input, self.output, self.to)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_transition_identity() {
        let t1 = Transition::new(0, 'a', 'b', 1);
        let t2 = Transition::new(0, 'a', 'b', 1);
        let t3 = Transition::new(0, 'a', 'c', 1);

        let set: HashSet<_> = [t1.clone(), t2, t3].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&t1));
        assert_eq!(t1.to_string(), "0 --['a':'b']-> 1");
    }
}

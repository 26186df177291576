use crate::Fst;
use crate::Sentinels;
use crate::Symbol;
use crate::Transition;

/// Returns the transducer that accepts exactly the given word and maps it to
/// itself.
///
/// The states are `0..=n+1` for a word of length `n`, every symbol moves to
/// the next state and a final stop transition leads to the accept state. All
/// transitions have weight one.
pub fn acceptor<A: Symbol>(word: impl IntoIterator<Item = A>, sentinels: Sentinels<A>) -> Fst<usize, A> {
    let mut fst = Fst::with_sentinels(sentinels);
    fst.set_start(0);

    let mut length = 0;
    for (i, symbol) in word.into_iter().enumerate() {
        fst.add_transition_once(Transition::new(i, symbol.clone(), symbol, i + 1));
        length = i + 1;
    }

    let stop = fst.stop().clone();
    fst.add_transition_once(Transition::new(length, stop.clone(), stop, length + 1));
    fst.set_accept(length + 1);
    fst
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_acceptor_chain() {
        let fst = acceptor(["x", "y", "z"].map(String::from), Sentinels::default());

        assert_eq!(fst.num_of_states(), 5);
        assert_eq!(fst.start(), Some(&0));
        assert_eq!(fst.accept(), Some(&4));

        let symbols: Vec<&str> = fst.iter_transitions().map(|t| t.input.as_str()).collect();
        assert_eq!(symbols, vec!["x", "y", "z", "</s>"]);

        for (i, (transition, weight)) in fst.iter_weighted_transitions().enumerate() {
            assert_eq!(transition.from, i);
            assert_eq!(transition.to, i + 1);
            assert_eq!(transition.input, transition.output);
            assert_eq!(weight, 1.0);
        }
    }

    #[test]
    fn test_acceptor_empty_word() {
        let fst = acceptor(Vec::<char>::new(), Sentinels::default());

        assert_eq!(fst.num_of_transitions(), 1);
        assert_eq!(fst.start(), Some(&0));
        assert_eq!(fst.accept(), Some(&1));
    }
}

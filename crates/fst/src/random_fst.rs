use rand::Rng;

use crate::Fst;
use crate::Sentinels;
use crate::Transition;

/// Determines on which side random transitions may carry the epsilon symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomEpsilon {
    /// No epsilon symbols at all.
    None,
    /// Some transitions have an epsilon input, i.e. they insert.
    Inserting,
    /// Some transitions have an epsilon output, i.e. they delete.
    Deleting,
}

/// Generates a random transducer over the first `num_of_symbols` lower case
/// letters with the desired number of states and maximum out degree.
///
/// State 0 is the start state and the last state is the accept state. The
/// weights are drawn uniformly from `[0.1, 1.0)`.
pub fn random_fst(
    rng: &mut impl Rng,
    num_of_states: usize,
    num_of_symbols: u32,
    outdegree: usize,
    epsilon: RandomEpsilon,
) -> Fst<usize, char> {
    random_fst_impl(rng, num_of_states, num_of_symbols, outdegree, epsilon, false)
}

/// Generates a random acyclic transducer, every transition goes from a state
/// to a strictly larger state.
pub fn random_acyclic_fst(
    rng: &mut impl Rng,
    num_of_states: usize,
    num_of_symbols: u32,
    outdegree: usize,
) -> Fst<usize, char> {
    random_fst_impl(rng, num_of_states, num_of_symbols, outdegree, RandomEpsilon::None, true)
}

fn random_fst_impl(
    rng: &mut impl Rng,
    num_of_states: usize,
    num_of_symbols: u32,
    outdegree: usize,
    epsilon: RandomEpsilon,
    acyclic: bool,
) -> Fst<usize, char> {
    assert!(
        num_of_symbols > 0 && num_of_symbols <= 26,
        "We only support between 1 and 26 alphabetic symbols."
    );
    assert!(num_of_states > 0, "There must be at least one state");

    let mut fst = Fst::with_sentinels(Sentinels::default());
    let eps = *fst.epsilon();
    fst.set_start(0);
    fst.set_accept(num_of_states - 1);

    for from in 0..num_of_states {
        if acyclic && from + 1 == num_of_states {
            break;
        }

        for _ in 0..rng.random_range(0..=outdegree) {
            let to = if acyclic {
                rng.random_range(from + 1..num_of_states)
            } else {
                rng.random_range(0..num_of_states)
            };

            let mut input = random_symbol(rng, num_of_symbols);
            let mut output = random_symbol(rng, num_of_symbols);
            match epsilon {
                RandomEpsilon::Inserting if rng.random_bool(0.2) => input = eps,
                RandomEpsilon::Deleting if rng.random_bool(0.2) => output = eps,
                _ => {}
            }

            let weight = rng.random_range(0.1..1.0);
            fst.add_transition(Transition::new(from, input, output, to), weight);
        }
    }

    fst
}

/// Returns one of the first `num_of_symbols` lower case letters.
fn random_symbol(rng: &mut impl Rng, num_of_symbols: u32) -> char {
    char::from_digit(rng.random_range(0..num_of_symbols) + 10, 36).expect("Radix is 36, so the digit is valid")
}

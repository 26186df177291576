use std::iter;

use log::debug;
use log::trace;
use rustc_hash::FxHashMap;

use crate::Fst;
use crate::FstError;
use crate::State;
use crate::Symbol;
use crate::Transition;

/// Estimates the joint probabilities `P(a, b | q)` of the transducer from the
/// given training sequences.
///
/// Every sequence, followed by the stop symbol, is walked from the start
/// state by taking the first outgoing transition whose input matches the next
/// symbol. The weight of every transition becomes the number of times it was
/// taken divided by the number of times its source state was left. The
/// transitions of states that were never left get weight zero.
///
/// When a sequence cannot be walked the transducer is left unchanged.
pub fn train_joint<S, A, W>(fst: &mut Fst<S, A>, corpus: impl IntoIterator<Item = W>) -> Result<(), FstError>
where
    S: State,
    A: Symbol,
    W: AsRef<[A]>,
{
    let counts = count_indices(fst, corpus)?;
    fst.weights_mut().copy_from_slice(&counts);
    normalize_joint(fst);
    Ok(())
}

/// Walks the training sequences through the transducer as [`train_joint`]
/// does, and returns the number of times every taken transition was used.
pub fn count_transitions<S, A, W>(
    fst: &Fst<S, A>,
    corpus: impl IntoIterator<Item = W>,
) -> Result<FxHashMap<Transition<S, A>, f64>, FstError>
where
    S: State,
    A: Symbol,
    W: AsRef<[A]>,
{
    let counts = count_indices(fst, corpus)?;

    Ok(counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0.0)
        .map(|(index, count)| (fst.transition_at(index).clone(), count))
        .collect())
}

/// Rescales the outgoing weights of every state such that they sum to one.
/// States whose outgoing weights sum to zero are left unchanged.
pub fn normalize_joint<S: State, A: Symbol>(fst: &mut Fst<S, A>) {
    normalize_joint_impl(fst, 0.0);
}

/// Same as [`normalize_joint`], but adds `add` to every weight first.
pub fn normalize_joint_smoothed<S: State, A: Symbol>(fst: &mut Fst<S, A>, add: f64) -> Result<(), FstError> {
    check_smoothing(add)?;
    normalize_joint_impl(fst, add);
    Ok(())
}

/// Computes the conditional probabilities `P(b | q, a)` from the current
/// weights with add-`add` smoothing.
///
/// A transition reading epsilon gets its share of all outgoing weight of its
/// state. A transition reading `a` gets its share of the weight of the
/// transitions reading `a`, scaled by the probability of not taking an epsilon
/// transition. Transitions whose smoothed weight is zero are left unchanged.
///
/// This allows a state to have both epsilon and non-epsilon outgoing transitions.
pub fn normalize_cond<S: State, A: Symbol>(fst: &mut Fst<S, A>, add: f64) -> Result<(), FstError> {
    check_smoothing(add)?;

    let epsilon = fst.epsilon().clone();
    for position in 0..fst.num_of_states() {
        let (outgoing, transitions, weights) = fst.outgoing_mut(position);

        let mut total = 0.0;
        let mut mass: FxHashMap<&A, f64> = FxHashMap::default();
        for &index in outgoing {
            let weight = weights[index] + add;
            total += weight;
            *mass.entry(&transitions[index].input).or_default() += weight;
        }

        let epsilon_mass = mass.get(&epsilon).copied().unwrap_or(0.0);
        for &index in outgoing {
            let weight = weights[index] + add;
            if weight == 0.0 {
                continue;
            }

            let input = &transitions[index].input;
            weights[index] = if *input == epsilon {
                weight / total
            } else {
                weight / mass[input] * (1.0 - epsilon_mass / total)
            };
        }
    }

    Ok(())
}

/// Returns the number of times every transition, by position, is taken when
/// walking the corpus.
fn count_indices<S, A, W>(fst: &Fst<S, A>, corpus: impl IntoIterator<Item = W>) -> Result<Vec<f64>, FstError>
where
    S: State,
    A: Symbol,
    W: AsRef<[A]>,
{
    let start_time = std::time::Instant::now();
    let start = fst
        .start()
        .and_then(|state| fst.state_position(state))
        .ok_or_else(|| FstError::Precondition("Cannot train a transducer without a start state".to_string()))?;

    let stop = fst.stop();
    let mut counts = vec![0.0; fst.num_of_transitions()];
    let mut num_of_sequences = 0;

    for (sequence_index, sequence) in corpus.into_iter().enumerate() {
        let mut state = start;

        for (position, symbol) in sequence.as_ref().iter().chain(iter::once(stop)).enumerate() {
            let &index = fst
                .input_indices(state, symbol)
                .first()
                .ok_or_else(|| FstError::UntrainableSequence {
                    sequence: sequence_index,
                    position,
                    symbol: format!("{symbol:?}"),
                    state: format!("{:?}", fst.state_at(state)),
                })?;

            trace!("Sequence {sequence_index} takes {}", fst.transition_at(index));
            counts[index] += 1.0;
            state = fst.target_position(index);
        }

        num_of_sequences += 1;
    }

    debug!("Counted transitions of {num_of_sequences} training sequences");
    debug!("Time count_transitions: {:.3}s", start_time.elapsed().as_secs_f64());
    Ok(counts)
}

fn normalize_joint_impl<S: State, A: Symbol>(fst: &mut Fst<S, A>, add: f64) {
    for position in 0..fst.num_of_states() {
        let (outgoing, _, weights) = fst.outgoing_mut(position);

        let total: f64 = outgoing.iter().map(|&index| weights[index] + add).sum();
        if total == 0.0 {
            continue;
        }

        for &index in outgoing {
            weights[index] = (weights[index] + add) / total;
        }
    }
}

fn check_smoothing(add: f64) -> Result<(), FstError> {
    if add < 0.0 || add.is_nan() {
        return Err(FstError::Precondition(format!(
            "The smoothing constant must be non-negative, got {add}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::Rng;
    use test_log::test;

    use wfst_utilities::random_test;

    use crate::Sentinels;
    use crate::ngram_skeleton;

    fn single_state(transitions: &[(char, char, f64)]) -> Fst<usize, char> {
        let mut fst = Fst::with_sentinels(Sentinels::default());
        fst.set_start(0);
        fst.set_accept(1);
        for &(input, output, weight) in transitions {
            fst.add_transition(Transition::new(0, input, output, 1), weight);
        }
        fst
    }

    fn weight(fst: &Fst<usize, char>, input: char, output: char) -> f64 {
        fst.weight(&Transition::new(0, input, output, 1)).unwrap()
    }

    #[test]
    fn test_train_joint_bigram() {
        let mut fst = ngram_skeleton(2, ['a', 'b'], '^', Sentinels::default()).unwrap();
        train_joint(&mut fst, ["ab", "a"].map(|s| s.chars().collect::<Vec<_>>())).unwrap();

        let stop = '\u{3}';
        let w = |from: char, symbol: char, to: Vec<char>| {
            fst.weight(&Transition::new(vec![from], symbol, symbol, to)).unwrap()
        };

        assert_eq!(w('^', 'a', vec!['a']), 1.0);
        assert_eq!(w('^', 'b', vec!['b']), 0.0);
        assert_eq!(w('a', 'b', vec!['b']), 0.5);
        assert_eq!(w('a', stop, vec![stop]), 0.5);
        assert_eq!(w('a', 'a', vec!['a']), 0.0);
        assert_eq!(w('b', stop, vec![stop]), 1.0);
    }

    #[test]
    fn test_train_joint_untrainable() {
        let mut fst = ngram_skeleton(2, ['a', 'b'], '^', Sentinels::default()).unwrap();
        let result = train_joint(&mut fst, [vec!['a', 'b'], vec!['a', 'c']]);

        assert!(matches!(
            result,
            Err(FstError::UntrainableSequence {
                sequence: 1,
                position: 1,
                ..
            })
        ));

        // The first sequence was not counted either.
        assert!(fst.iter_weighted_transitions().all(|(_, weight)| weight == 0.0));
    }

    #[test]
    fn test_train_joint_requires_start() {
        let mut fst: Fst<usize, char> = Fst::with_sentinels(Sentinels::default());
        assert!(matches!(
            train_joint(&mut fst, [vec!['a']]),
            Err(FstError::Precondition(_))
        ));
    }

    #[test]
    fn test_count_transitions() {
        let fst = ngram_skeleton(1, ['a', 'b'], '^', Sentinels::default()).unwrap();
        let counts = count_transitions(&fst, [vec!['a', 'a', 'b'], vec![]]).unwrap();

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&Transition::new(vec![], 'a', 'a', vec![])], 2.0);
        assert_eq!(counts[&Transition::new(vec![], '\u{3}', '\u{3}', vec![])], 2.0);
    }

    #[test]
    fn test_random_train_joint_normalized() {
        random_test(50, |rng| {
            let order = rng.random_range(1..4);
            let mut fst = ngram_skeleton(order, ['a', 'b', 'c'], '^', Sentinels::default()).unwrap();

            let corpus: Vec<Vec<char>> = (0..rng.random_range(1..10))
                .map(|_| {
                    (0..rng.random_range(0..8))
                        .map(|_| ['a', 'b', 'c'][rng.random_range(0..3)])
                        .collect()
                })
                .collect();

            train_joint(&mut fst, &corpus).unwrap();

            for state in fst.iter_states() {
                let total: f64 = fst
                    .outgoing_transitions(state)
                    .map(|t| fst.weight(t).unwrap())
                    .sum();
                assert!(
                    total == 0.0 || (total - 1.0).abs() < 1e-9,
                    "Outgoing weights of {state:?} sum to {total}"
                );
            }

            let start_total: f64 = fst
                .outgoing_transitions(fst.start().unwrap())
                .map(|t| fst.weight(t).unwrap())
                .sum();
            assert!((start_total - 1.0).abs() < 1e-9);
        });
    }

    #[test]
    fn test_normalize_joint() {
        let mut fst = single_state(&[('a', 'a', 3.0), ('b', 'b', 1.0)]);
        normalize_joint(&mut fst);

        assert_eq!(weight(&fst, 'a', 'a'), 0.75);
        assert_eq!(weight(&fst, 'b', 'b'), 0.25);

        let mut fst = single_state(&[('a', 'a', 2.0), ('b', 'b', 0.0)]);
        normalize_joint_smoothed(&mut fst, 1.0).unwrap();
        assert_eq!(weight(&fst, 'a', 'a'), 0.75);
        assert_eq!(weight(&fst, 'b', 'b'), 0.25);
        assert!(normalize_joint_smoothed(&mut fst, -1.0).is_err());
    }

    #[test]
    fn test_normalize_cond_same_input() {
        let mut fst = single_state(&[('a', 'a', 3.0), ('a', 'b', 1.0)]);
        normalize_cond(&mut fst, 0.0).unwrap();

        assert_eq!(weight(&fst, 'a', 'a'), 0.75);
        assert_eq!(weight(&fst, 'a', 'b'), 0.25);
    }

    #[test]
    fn test_normalize_cond_distinct_inputs() {
        // Every input symbol has its own distribution over outputs.
        let mut fst = single_state(&[('a', 'a', 3.0), ('b', 'b', 1.0)]);
        normalize_cond(&mut fst, 0.0).unwrap();

        assert_eq!(weight(&fst, 'a', 'a'), 1.0);
        assert_eq!(weight(&fst, 'b', 'b'), 1.0);
    }

    #[test]
    fn test_normalize_cond_epsilon() {
        let mut fst = single_state(&[('ε', 'x', 1.0), ('a', 'a', 2.0), ('a', 'b', 1.0)]);
        normalize_cond(&mut fst, 0.0).unwrap();

        assert!((weight(&fst, 'ε', 'x') - 0.25).abs() < 1e-12);
        assert!((weight(&fst, 'a', 'a') - 0.5).abs() < 1e-12);
        assert!((weight(&fst, 'a', 'b') - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_cond_smoothing_and_zero() {
        let mut fst = single_state(&[('a', 'a', 3.0), ('a', 'b', 0.0)]);
        normalize_cond(&mut fst, 1.0).unwrap();
        assert!((weight(&fst, 'a', 'a') - 0.8).abs() < 1e-12);
        assert!((weight(&fst, 'a', 'b') - 0.2).abs() < 1e-12);

        let mut fst = single_state(&[('a', 'a', 0.0), ('a', 'b', 2.0)]);
        normalize_cond(&mut fst, 0.0).unwrap();
        assert_eq!(weight(&fst, 'a', 'a'), 0.0);
        assert_eq!(weight(&fst, 'a', 'b'), 1.0);
    }
}

use std::collections::VecDeque;
use std::fmt;

use delegate::delegate;
use log::debug;
use log::trace;
use rustc_hash::FxHashSet;

use crate::Fst;
use crate::FstError;
use crate::Semiring;
use crate::State;
use crate::Symbol;
use crate::Transition;
use crate::compose_values;

/// Explains a composed transition: the left transducer follows the first
/// transition (or does nothing) while the right transducer follows the second
/// transition (or does nothing).
pub type Origin<S1, S2, A> = (Option<Transition<S1, A>>, Option<Transition<S2, A>>);

/// A transducer obtained by composition, whose states are pairs of states of
/// the two composed transducers.
///
/// Every transition keeps the list of transition pairs of the original
/// transducers that it simulates, its provenance.
pub struct ComposedFst<S1, S2, A> {
    fst: Fst<(S1, S2), A>,

    /// Indexed by the position of the transition in `fst`.
    provenance: Vec<Vec<Origin<S1, S2, A>>>,
}

impl<S1: State, S2: State, A: Symbol> ComposedFst<S1, S2, A> {
    delegate! {
        to self.fst {
            pub fn start(&self) -> Option<&(S1, S2)>;
            pub fn accept(&self) -> Option<&(S1, S2)>;
            pub fn weight(&self, transition: &Transition<(S1, S2), A>) -> Option<f64>;
            pub fn contains_transition(&self, transition: &Transition<(S1, S2), A>) -> bool;
            pub fn num_of_states(&self) -> usize;
            pub fn num_of_transitions(&self) -> usize;
        }
    }

    /// Returns the composed transducer.
    pub fn fst(&self) -> &Fst<(S1, S2), A> {
        &self.fst
    }

    /// Returns the composed transducer, dropping the provenance.
    pub fn into_fst(self) -> Fst<(S1, S2), A> {
        self.fst
    }

    /// Returns the transition pairs that the given transition simulates, in
    /// the order in which they were found. Empty if the transition is not part
    /// of this transducer.
    pub fn provenance(&self, transition: &Transition<(S1, S2), A>) -> &[Origin<S1, S2, A>] {
        self.fst
            .transition_position(transition)
            .map(|index| self.provenance[index].as_slice())
            .unwrap_or(&[])
    }

    /// Returns a function that computes values for the transitions of this
    /// transducer from the values `v1` and `v2` of the two composed transducers.
    ///
    /// See [`compose_values`].
    pub fn compose_values<'a, V1, V2>(
        &'a self,
        v1: V1,
        v2: V2,
        semiring: Semiring,
    ) -> impl Fn(&Transition<(S1, S2), A>) -> f64 + 'a
    where
        V1: Fn(&Transition<S1, A>) -> f64 + 'a,
        V2: Fn(&Transition<S2, A>) -> f64 + 'a,
    {
        compose_values(self, v1, v2, semiring)
    }
}

impl<S1: State, S2: State, A: Symbol> fmt::Debug for ComposedFst<S1, S2, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", self.fst)?;

        for (index, origins) in self.provenance.iter().enumerate() {
            writeln!(f, "{} <= {:?}", self.fst.transition_at(index), origins)?;
        }

        Ok(())
    }
}

/// Determines which transducer provides the symbols to synchronise on at
/// every product state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drive {
    /// Enumerate the input symbols of the right transducer.
    Input,
    /// Enumerate the output symbols of the left transducer.
    Output,
    /// Enumerate whichever of the two has fewer symbols at the current state.
    Smallest,
}

/// Composes the two transducers, feeding the output of `left` into the input
/// of `right`. The side that provides the symbols to synchronise on is chosen
/// per state, see [`Drive::Smallest`].
///
/// For every transition `t` of the result, [`ComposedFst::provenance`]
/// contains where `t` came from:
///   - `(Some(t1), Some(t2))`: `left` follows `t1` and `right` follows `t2`.
///   - `(Some(t1), None)`: `left` follows `t1`, which outputs epsilon, and `right` does nothing.
///   - `(None, Some(t2))`: `left` does nothing and `right` follows `t2`, which reads epsilon.
///
/// The weight of a composed transition is the sum over its provenance of the
/// product of the weights of the original transitions.
///
/// Fails when `left` deletes and `right` inserts symbols, since the order of
/// the deletions and insertions is then ambiguous.
pub fn compose<S1, S2, A>(left: &Fst<S1, A>, right: &Fst<S2, A>) -> Result<ComposedFst<S1, S2, A>, FstError>
where
    S1: State,
    S2: State,
    A: Symbol,
{
    compose_with(left, right, Drive::Smallest)
}

/// Composes the transducers driven by the input symbols of `right`, which is
/// preferable when `right` is the smaller transducer.
pub fn compose_by_input<S1, S2, A>(left: &Fst<S1, A>, right: &Fst<S2, A>) -> Result<ComposedFst<S1, S2, A>, FstError>
where
    S1: State,
    S2: State,
    A: Symbol,
{
    compose_with(left, right, Drive::Input)
}

/// Composes the transducers driven by the output symbols of `left`, which is
/// preferable when `left` is the smaller transducer.
pub fn compose_by_output<S1, S2, A>(
    left: &Fst<S1, A>,
    right: &Fst<S2, A>,
) -> Result<ComposedFst<S1, S2, A>, FstError>
where
    S1: State,
    S2: State,
    A: Symbol,
{
    compose_with(left, right, Drive::Output)
}

/// Composes the transducers, see [`compose`], using the given drive. All
/// drives produce the same transducer up to the order of its states and
/// transitions.
pub fn compose_with<S1, S2, A>(
    left: &Fst<S1, A>,
    right: &Fst<S2, A>,
    drive: Drive,
) -> Result<ComposedFst<S1, S2, A>, FstError>
where
    S1: State,
    S2: State,
    A: Symbol,
{
    let start_time = std::time::Instant::now();

    let (left_start, left_accept) = start_and_accept(left, "left")?;
    let (right_start, right_accept) = start_and_accept(right, "right")?;
    if left.sentinels() != right.sentinels() {
        return Err(FstError::Precondition(format!(
            "Composed transducers must use the same reserved symbols, found {:?} and {:?}",
            left.sentinels(),
            right.sentinels()
        )));
    }

    let epsilon = left.epsilon();
    let mut builder = ProductBuilder::new(Fst::with_sentinels(left.sentinels().clone()));
    builder.discover((left_start.clone(), right_start.clone()));
    builder.fst.set_start((left_start.clone(), right_start.clone()));

    // The first deleting and inserting transitions, used for the error message.
    let mut deletion: Option<String> = None;
    let mut insertion: Option<String> = None;

    while let Some((left_state, right_state)) = builder.queue.pop_front() {
        trace!("Considering ({left_state:?}, {right_state:?})");
        let product_state = (left_state.clone(), right_state.clone());

        let by_input = match drive {
            Drive::Input => true,
            Drive::Output => false,
            Drive::Smallest => right.num_of_input_symbols(&right_state) <= left.num_of_output_symbols(&left_state),
        };

        let symbols: Vec<&A> = if by_input {
            right.input_symbols(&right_state).collect()
        } else {
            left.output_symbols(&left_state).collect()
        };

        // (q1, q2) -[a:c]-> (r1, r2) iff q1 -[a:b]-> r1 and q2 -[b:c]-> r2 for a symbol b that is not epsilon.
        for symbol in symbols {
            if symbol == epsilon {
                continue;
            }

            for (left_transition, left_weight) in left.weighted_on_output(&left_state, symbol) {
                for (right_transition, right_weight) in right.weighted_on_input(&right_state, symbol) {
                    let transition = Transition::new(
                        product_state.clone(),
                        left_transition.input.clone(),
                        right_transition.output.clone(),
                        (left_transition.to.clone(), right_transition.to.clone()),
                    );

                    builder.add_transition(
                        transition,
                        left_weight * right_weight,
                        (Some(left_transition.clone()), Some(right_transition.clone())),
                    );
                }
            }
        }

        // (q1, q2) -[a:eps]-> (r1, q2) iff q1 -[a:eps]-> r1.
        for (left_transition, left_weight) in left.weighted_on_output(&left_state, epsilon) {
            deletion.get_or_insert_with(|| left_transition.to_string());

            let transition = Transition::new(
                product_state.clone(),
                left_transition.input.clone(),
                epsilon.clone(),
                (left_transition.to.clone(), right_state.clone()),
            );
            builder.add_transition(transition, left_weight, (Some(left_transition.clone()), None));
        }

        // (q1, q2) -[eps:c]-> (q1, r2) iff q2 -[eps:c]-> r2.
        for (right_transition, right_weight) in right.weighted_on_input(&right_state, epsilon) {
            insertion.get_or_insert_with(|| right_transition.to_string());

            let transition = Transition::new(
                product_state.clone(),
                epsilon.clone(),
                right_transition.output.clone(),
                (left_state.clone(), right_transition.to.clone()),
            );
            builder.add_transition(transition, right_weight, (None, Some(right_transition.clone())));
        }

        if let (Some(deletion), Some(insertion)) = (&deletion, &insertion) {
            debug!("Composition is ambiguous, {deletion} deletes and {insertion} inserts");
            return Err(FstError::AmbiguousComposition {
                deletion: deletion.clone(),
                insertion: insertion.clone(),
            });
        }
    }

    builder.fst.set_accept((left_accept.clone(), right_accept.clone()));

    debug!(
        "Composed transducer has {} states and {} transitions",
        builder.fst.num_of_states(),
        builder.fst.num_of_transitions()
    );
    debug!("Time compose: {:.3}s", start_time.elapsed().as_secs_f64());

    Ok(ComposedFst {
        fst: builder.fst,
        provenance: builder.provenance,
    })
}

/// Returns the start and accept states, which must both be set.
fn start_and_accept<'a, S: State, A: Symbol>(fst: &'a Fst<S, A>, side: &str) -> Result<(&'a S, &'a S), FstError> {
    let start = fst
        .start()
        .ok_or_else(|| FstError::Precondition(format!("The {side} transducer has no start state")))?;
    let accept = fst
        .accept()
        .ok_or_else(|| FstError::Precondition(format!("The {side} transducer has no accept state")))?;

    Ok((start, accept))
}

/// Keeps track of the composed transducer under construction and the product
/// states that still have to be explored.
struct ProductBuilder<S1, S2, A> {
    fst: Fst<(S1, S2), A>,
    provenance: Vec<Vec<Origin<S1, S2, A>>>,
    discovered: FxHashSet<(S1, S2)>,
    queue: VecDeque<(S1, S2)>,
}

impl<S1: State, S2: State, A: Symbol> ProductBuilder<S1, S2, A> {
    fn new(fst: Fst<(S1, S2), A>) -> Self {
        Self {
            fst,
            provenance: Vec::new(),
            discovered: FxHashSet::default(),
            queue: VecDeque::new(),
        }
    }

    /// Schedules the product state for exploration when it was not yet discovered.
    fn discover(&mut self, state: (S1, S2)) {
        if self.discovered.insert(state.clone()) {
            trace!("Adding {state:?}");
            self.queue.push_back(state);
        }
    }

    /// Adds the composed transition with its origin.
    fn add_transition(&mut self, transition: Transition<(S1, S2), A>, weight: f64, origin: Origin<S1, S2, A>) {
        let to = transition.to.clone();
        let index = self.fst.insert_transition(transition, weight);
        if index == self.provenance.len() {
            self.provenance.push(Vec::new());
        }

        self.provenance[index].push(origin);
        self.discover(to);
    }
}

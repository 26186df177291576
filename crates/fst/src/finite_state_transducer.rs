use std::fmt;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::FstError;
use crate::Sentinels;
use crate::State;
use crate::Symbol;
use crate::Transition;

/// Represents a weighted finite state transducer with a single start and a
/// single accept state.
///
/// States and transitions are identified by their position of insertion, all
/// indices store these positions. The weights are kept in a separate table
/// indexed by the same position, so that the identity of a transition never
/// depends on its weight.
#[derive(Clone)]
pub struct Fst<S, A = String> {
    sentinels: Sentinels<A>,

    /// The states in insertion order, and the position of every state.
    states: Vec<S>,
    state_index: FxHashMap<S, usize>,

    start: Option<S>,
    accept: Option<S>,

    input_alphabet: FxHashSet<A>,
    output_alphabet: FxHashSet<A>,

    /// The transitions in insertion order, their (from, to) state positions and weights.
    transitions: Vec<Transition<S, A>>,
    transition_states: Vec<(usize, usize)>,
    transition_index: FxHashMap<Transition<S, A>, usize>,
    weights: Vec<f64>,

    /// For every state position, the positions of its outgoing and incoming transitions.
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,

    /// For every state position, its outgoing transitions grouped by input and output symbol.
    outgoing_on_input: Vec<FxHashMap<A, Vec<usize>>>,
    outgoing_on_output: Vec<FxHashMap<A, Vec<usize>>>,
}

impl<S: State> Fst<S, String> {
    /// Creates an empty transducer over string symbols with the default reserved symbols.
    pub fn new() -> Self {
        Self::with_sentinels(Sentinels::default())
    }
}

impl<S: State> Default for Fst<S, String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, A: Symbol> Fst<S, A> {
    /// Creates an empty transducer using the given reserved symbols.
    pub fn with_sentinels(sentinels: Sentinels<A>) -> Self {
        Self {
            sentinels,
            states: Vec::new(),
            state_index: FxHashMap::default(),
            start: None,
            accept: None,
            input_alphabet: FxHashSet::default(),
            output_alphabet: FxHashSet::default(),
            transitions: Vec::new(),
            transition_states: Vec::new(),
            transition_index: FxHashMap::default(),
            weights: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            outgoing_on_input: Vec::new(),
            outgoing_on_output: Vec::new(),
        }
    }

    /// Returns the reserved symbols of this transducer.
    pub fn sentinels(&self) -> &Sentinels<A> {
        &self.sentinels
    }

    /// Returns the epsilon symbol of this transducer.
    pub fn epsilon(&self) -> &A {
        &self.sentinels.epsilon
    }

    /// Returns the end of sequence symbol of this transducer.
    pub fn stop(&self) -> &A {
        &self.sentinels.stop
    }

    /// Adds the given state, returns true iff it was not already present.
    pub fn add_state(&mut self, state: S) -> bool {
        let before = self.states.len();
        self.insert_state(state);
        self.states.len() > before
    }

    /// Sets the start state, adding it when it is not already a state.
    pub fn set_start(&mut self, state: S) {
        self.insert_state(state.clone());
        self.start = Some(state);
    }

    /// Sets the accept state, adding it when it is not already a state.
    pub fn set_accept(&mut self, state: S) {
        self.insert_state(state.clone());
        self.accept = Some(state);
    }

    /// Returns the start state, if it has been set.
    pub fn start(&self) -> Option<&S> {
        self.start.as_ref()
    }

    /// Returns the accept state, if it has been set.
    pub fn accept(&self) -> Option<&S> {
        self.accept.as_ref()
    }

    /// Adds the transition and increments its weight by `weight_delta`.
    ///
    /// A transition that is already present is never duplicated, only its
    /// weight accumulates. Otherwise its states are added, it is registered
    /// in all indices and its symbols are added to the alphabets.
    pub fn add_transition(&mut self, transition: Transition<S, A>, weight_delta: f64) {
        self.insert_transition(transition, weight_delta);
    }

    /// Adds the transition with weight one, the shorthand for default constructions.
    pub fn add_transition_once(&mut self, transition: Transition<S, A>) {
        self.insert_transition(transition, 1.0);
    }

    /// Adds the transition as [`Fst::add_transition`] does, and returns its position.
    pub(crate) fn insert_transition(&mut self, transition: Transition<S, A>, weight_delta: f64) -> usize {
        if let Some(&index) = self.transition_index.get(&transition) {
            self.weights[index] += weight_delta;
            return index;
        }

        let from = self.insert_state(transition.from.clone());
        let to = self.insert_state(transition.to.clone());
        let index = self.transitions.len();

        self.input_alphabet.insert(transition.input.clone());
        self.output_alphabet.insert(transition.output.clone());

        self.outgoing[from].push(index);
        self.incoming[to].push(index);
        self.outgoing_on_input[from]
            .entry(transition.input.clone())
            .or_default()
            .push(index);
        self.outgoing_on_output[from]
            .entry(transition.output.clone())
            .or_default()
            .push(index);

        self.transition_index.insert(transition.clone(), index);
        self.transitions.push(transition);
        self.transition_states.push((from, to));
        self.weights.push(weight_delta);
        index
    }

    /// Replaces the weight of an existing transition.
    pub fn reweight_transition(&mut self, transition: &Transition<S, A>, weight: f64) -> Result<(), FstError> {
        let index = self
            .transition_index
            .get(transition)
            .ok_or_else(|| FstError::Precondition(format!("Cannot reweight unknown transition {transition}")))?;

        self.weights[*index] = weight;
        Ok(())
    }

    /// Returns the weight of the given transition, or None if it is not part of this transducer.
    pub fn weight(&self, transition: &Transition<S, A>) -> Option<f64> {
        self.transition_index.get(transition).map(|&index| self.weights[index])
    }

    /// Returns true iff the transition is part of this transducer.
    pub fn contains_transition(&self, transition: &Transition<S, A>) -> bool {
        self.transition_index.contains_key(transition)
    }

    /// Returns true iff the state is part of this transducer.
    pub fn contains_state(&self, state: &S) -> bool {
        self.state_index.contains_key(state)
    }

    /// Returns the outgoing transitions of `state` with the given input symbol.
    pub fn get_transitions<'a>(
        &'a self,
        state: &S,
        input: &A,
    ) -> impl Iterator<Item = &'a Transition<S, A>> + use<'a, S, A> {
        let indices = self
            .state_index
            .get(state)
            .and_then(|&position| self.outgoing_on_input[position].get(input));

        indices.into_iter().flatten().map(|&index| &self.transitions[index])
    }

    /// Returns the outgoing transitions of `state` with the given output symbol.
    pub fn transitions_on_output<'a>(
        &'a self,
        state: &S,
        output: &A,
    ) -> impl Iterator<Item = &'a Transition<S, A>> + use<'a, S, A> {
        let indices = self
            .state_index
            .get(state)
            .and_then(|&position| self.outgoing_on_output[position].get(output));

        indices.into_iter().flatten().map(|&index| &self.transitions[index])
    }

    /// Returns the outgoing transitions of the given state.
    pub fn outgoing_transitions<'a>(
        &'a self,
        state: &S,
    ) -> impl Iterator<Item = &'a Transition<S, A>> + use<'a, S, A> {
        let indices = self.state_index.get(state).map(|&position| &self.outgoing[position]);
        indices.into_iter().flatten().map(|&index| &self.transitions[index])
    }

    /// Returns the incoming transitions of the given state.
    pub fn incoming_transitions<'a>(
        &'a self,
        state: &S,
    ) -> impl Iterator<Item = &'a Transition<S, A>> + use<'a, S, A> {
        let indices = self.state_index.get(state).map(|&position| &self.incoming[position]);
        indices.into_iter().flatten().map(|&index| &self.transitions[index])
    }

    /// Iterate over all states in the order in which they were added.
    pub fn iter_states(&self) -> impl Iterator<Item = &S> + '_ {
        self.states.iter()
    }

    /// Iterate over all transitions in the order in which they were added.
    pub fn iter_transitions(&self) -> impl Iterator<Item = &Transition<S, A>> + '_ {
        self.transitions.iter()
    }

    /// Iterate over all transitions together with their weights.
    pub fn iter_weighted_transitions(&self) -> impl Iterator<Item = (&Transition<S, A>, f64)> + '_ {
        self.transitions.iter().zip(self.weights.iter().copied())
    }

    /// Returns the set of input symbols.
    pub fn input_alphabet(&self) -> &FxHashSet<A> {
        &self.input_alphabet
    }

    /// Returns the set of output symbols.
    pub fn output_alphabet(&self) -> &FxHashSet<A> {
        &self.output_alphabet
    }

    /// Returns the number of states.
    pub fn num_of_states(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of transitions.
    pub fn num_of_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Returns the number of distinct input symbols on the outgoing transitions of the given state.
    pub fn num_of_input_symbols(&self, state: &S) -> usize {
        self.state_index
            .get(state)
            .map_or(0, |&position| self.outgoing_on_input[position].len())
    }

    /// Returns the number of distinct output symbols on the outgoing transitions of the given state.
    pub fn num_of_output_symbols(&self, state: &S) -> usize {
        self.state_index
            .get(state)
            .map_or(0, |&position| self.outgoing_on_output[position].len())
    }

    /// Returns the input symbols of the outgoing transitions of the given state.
    pub fn input_symbols<'a>(&'a self, state: &S) -> impl Iterator<Item = &'a A> + use<'a, S, A> {
        let symbols = self.state_index.get(state).map(|&position| &self.outgoing_on_input[position]);
        symbols.into_iter().flat_map(|map| map.keys())
    }

    /// Returns the output symbols of the outgoing transitions of the given state.
    pub fn output_symbols<'a>(&'a self, state: &S) -> impl Iterator<Item = &'a A> + use<'a, S, A> {
        let symbols = self
            .state_index
            .get(state)
            .map(|&position| &self.outgoing_on_output[position]);
        symbols.into_iter().flat_map(|map| map.keys())
    }

    /// Returns the outgoing transitions of `state` with the given input symbol and their weights.
    pub(crate) fn weighted_on_input<'a>(
        &'a self,
        state: &S,
        input: &A,
    ) -> impl Iterator<Item = (&'a Transition<S, A>, f64)> + use<'a, S, A> {
        let indices = self
            .state_index
            .get(state)
            .and_then(|&position| self.outgoing_on_input[position].get(input));

        indices
            .into_iter()
            .flatten()
            .map(|&index| (&self.transitions[index], self.weights[index]))
    }

    /// Returns the outgoing transitions of `state` with the given output symbol and their weights.
    pub(crate) fn weighted_on_output<'a>(
        &'a self,
        state: &S,
        output: &A,
    ) -> impl Iterator<Item = (&'a Transition<S, A>, f64)> + use<'a, S, A> {
        let indices = self
            .state_index
            .get(state)
            .and_then(|&position| self.outgoing_on_output[position].get(output));

        indices
            .into_iter()
            .flatten()
            .map(|&index| (&self.transitions[index], self.weights[index]))
    }

    /// Returns the position of the given state.
    pub(crate) fn state_position(&self, state: &S) -> Option<usize> {
        self.state_index.get(state).copied()
    }

    /// Returns the state at the given position.
    pub(crate) fn state_at(&self, position: usize) -> &S {
        &self.states[position]
    }

    /// Returns the position of the given transition.
    pub(crate) fn transition_position(&self, transition: &Transition<S, A>) -> Option<usize> {
        self.transition_index.get(transition).copied()
    }

    /// Returns the transition at the given position.
    pub(crate) fn transition_at(&self, index: usize) -> &Transition<S, A> {
        &self.transitions[index]
    }

    /// Returns the position of the target state of the transition at the given position.
    pub(crate) fn target_position(&self, index: usize) -> usize {
        self.transition_states[index].1
    }

    /// Returns the positions of the outgoing transitions of the state at the given position.
    pub(crate) fn outgoing_indices(&self, position: usize) -> &[usize] {
        &self.outgoing[position]
    }

    /// Returns the positions of the outgoing transitions of the state at the given position with the given input.
    pub(crate) fn input_indices(&self, position: usize, input: &A) -> &[usize] {
        self.outgoing_on_input[position]
            .get(input)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the weights indexed by transition position for in place updates.
    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    /// Returns the positions of the outgoing transitions of the state at the
    /// given position, all transitions and the weights for in place updates.
    pub(crate) fn outgoing_mut(&mut self, position: usize) -> (&[usize], &[Transition<S, A>], &mut [f64]) {
        (&self.outgoing[position], &self.transitions, &mut self.weights)
    }

    /// Returns the position of the given state, adding it when necessary.
    fn insert_state(&mut self, state: S) -> usize {
        if let Some(&position) = self.state_index.get(&state) {
            return position;
        }

        let position = self.states.len();
        self.state_index.insert(state.clone(), position);
        self.states.push(state);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.outgoing_on_input.push(FxHashMap::default());
        self.outgoing_on_output.push(FxHashMap::default());
        position
    }
}

impl<S: State, A: Symbol> fmt::Display for Fst<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print some information about the transducer.
        writeln!(f, "Number of states: {}", self.num_of_states())?;
        writeln!(f, "Number of transitions: {}", self.num_of_transitions())?;
        writeln!(f, "Number of input symbols: {}", self.input_alphabet.len())?;
        write!(f, "Number of output symbols: {}", self.output_alphabet.len())
    }
}

impl<S: State, A: Symbol> fmt::Debug for Fst<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        writeln!(f, "Start state: {:?}", self.start)?;
        writeln!(f, "Accept state: {:?}", self.accept)?;
        writeln!(f, "States: [{:?}]", self.states.iter().format(", "))?;

        for (transition, weight) in self.iter_weighted_transitions() {
            writeln!(f, "{transition} / {weight}")?;
        }

        Ok(())
    }
}

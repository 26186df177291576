use std::collections::VecDeque;

use log::debug;
use log::trace;
use rustc_hash::FxHashSet;

use crate::Fst;
use crate::FstError;
use crate::Sentinels;
use crate::Symbol;
use crate::Transition;

/// Returns the skeleton of an n-gram model of the given order over the alphabet.
///
/// The states are the histories of the last `order - 1` symbols, where the
/// start state is the history consisting only of `start_marker`. Every history
/// `h` has a transition `h --a:a--> shift(h, a)` for every symbol `a` of the
/// alphabet, and a stop transition to the accept state. The accept state is
/// the history consisting only of stop symbols. Only the histories reachable
/// from the start state are constructed.
///
/// All weights are zero, use [`crate::train_joint`] to estimate them.
pub fn ngram_skeleton<A: Symbol>(
    order: usize,
    alphabet: impl IntoIterator<Item = A>,
    start_marker: A,
    sentinels: Sentinels<A>,
) -> Result<Fst<Vec<A>, A>, FstError> {
    if order == 0 {
        return Err(FstError::Precondition("The order of an n-gram model must be positive".to_string()));
    }

    if sentinels.is_reserved(&start_marker) {
        return Err(FstError::Precondition(format!(
            "The start marker {start_marker:?} cannot be a reserved symbol"
        )));
    }

    // Remove duplicates while keeping the order of the alphabet.
    let mut seen = FxHashSet::default();
    let mut symbols = Vec::new();
    for symbol in alphabet {
        if sentinels.is_reserved(&symbol) || symbol == start_marker {
            return Err(FstError::Precondition(format!(
                "The alphabet of an n-gram model cannot contain the reserved symbol {symbol:?}"
            )));
        }

        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    let mut fst = Fst::with_sentinels(sentinels);
    let stop = fst.stop().clone();
    let start = vec![start_marker; order - 1];
    let accept = vec![stop.clone(); order - 1];
    fst.set_start(start.clone());
    fst.set_accept(accept.clone());

    let mut discovered: FxHashSet<Vec<A>> = FxHashSet::default();
    discovered.insert(start.clone());
    let mut queue = VecDeque::from([start]);

    while let Some(history) = queue.pop_front() {
        trace!("Considering history {history:?}");

        for symbol in &symbols {
            let next = shift(&history, symbol);
            fst.add_transition(
                Transition::new(history.clone(), symbol.clone(), symbol.clone(), next.clone()),
                0.0,
            );

            if discovered.insert(next.clone()) {
                queue.push_back(next);
            }
        }

        fst.add_transition(
            Transition::new(history.clone(), stop.clone(), stop.clone(), accept.clone()),
            0.0,
        );
    }

    debug!(
        "Constructed {}-gram skeleton with {} states and {} transitions",
        order,
        fst.num_of_states(),
        fst.num_of_transitions()
    );

    Ok(fst)
}

/// Returns the history obtained by forgetting the oldest symbol and appending the given symbol.
fn shift<A: Clone>(history: &[A], symbol: &A) -> Vec<A> {
    if history.is_empty() {
        return Vec::new();
    }

    let mut next = history[1..].to_vec();
    next.push(symbol.clone());
    next
}

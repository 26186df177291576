use log::debug;
use log::trace;

use crate::Fst;
use crate::FstError;
use crate::State;
use crate::Symbol;

/// Returns the states reachable from the start state in topological order,
/// i.e. every state occurs before all of its successors.
///
/// An error is returned if a cycle is reachable from the start state.
pub fn sort_topological<S: State, A: Symbol>(fst: &Fst<S, A>) -> Result<Vec<S>, FstError> {
    let start_time = std::time::Instant::now();
    trace!("{fst:?}");

    let start = fst
        .start()
        .and_then(|state| fst.state_position(state))
        .ok_or_else(|| FstError::Precondition("Cannot sort a transducer without a start state".to_string()))?;

    // The states in post order.
    let mut stack = Vec::new();
    let mut depth_stack = vec![start];
    let mut marks = vec![None; fst.num_of_states()];

    while let Some(state) = depth_stack.pop() {
        match marks[state] {
            None => {
                marks[state] = Some(Mark::Temporary);
                depth_stack.push(state); // Re-add to stack to mark as permanent later
                for &index in fst.outgoing_indices(state) {
                    let to = fst.target_position(index);

                    // If it was marked temporary, then a cycle is detected.
                    if marks[to] == Some(Mark::Temporary) {
                        trace!("There is a cycle through state {:?} on path {depth_stack:?}", fst.state_at(to));
                        return Err(FstError::CycleDetected {
                            state: format!("{:?}", fst.state_at(to)),
                        });
                    }

                    if marks[to].is_none() {
                        depth_stack.push(to);
                    }
                }
            }
            Some(Mark::Temporary) => {
                marks[state] = Some(Mark::Permanent);
                stack.push(state);
            }
            Some(Mark::Permanent) => {}
        }
    }

    stack.reverse();
    debug_assert!(
        is_topologically_sorted(fst, &stack),
        "The order {stack:?} is not a valid topological ordering of the reachable states of {fst:?}"
    );

    let order: Vec<S> = stack.into_iter().map(|position| fst.state_at(position).clone()).collect();
    trace!("Topological order: {order:?}");
    debug!("Time sort_topological: {:.3}s", start_time.elapsed().as_secs_f64());

    Ok(order)
}

// The mark of a state in the depth first search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temporary,
    Permanent,
}

/// Returns true if every ordered state occurs exactly once and before the
/// targets of its outgoing transitions.
fn is_topologically_sorted<S: State, A: Symbol>(fst: &Fst<S, A>, order: &[usize]) -> bool {
    let mut rank = vec![None; fst.num_of_states()];
    for (i, &state) in order.iter().enumerate() {
        if rank[state].is_some() {
            return false;
        }
        rank[state] = Some(i);
    }

    // Check that each state appears before its successors.
    order.iter().all(|&state| {
        fst.outgoing_indices(state).iter().all(|&index| {
            let to = fst.target_position(index);
            matches!(rank[to], Some(to_rank) if rank[state] < Some(to_rank))
        })
    })
}

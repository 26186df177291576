use std::fmt;
use std::io;
use std::io::Write;

use itertools::Itertools;

use crate::Fst;
use crate::State;
use crate::Symbol;

/// The number of labels shown on an edge before the rest is elided.
const MAX_LABELS: usize = 3;

/// Helper to render a transducer in Graphviz DOT format.
///
/// The transitions between the same pair of states are drawn as a single
/// edge that lists their `input:output` labels.
pub struct FstDot<'a, S, A> {
    pub fst: &'a Fst<S, A>,
}

impl<'a, S, A> FstDot<'a, S, A> {
    /// Creates a new FstDot Display for the given transducer.
    pub fn new(fst: &'a Fst<S, A>) -> Self {
        Self { fst }
    }
}

/// Writes the transducer in Graphviz DOT format to the given writer.
pub fn write_dot<S, A>(writer: &mut impl Write, fst: &Fst<S, A>) -> io::Result<()>
where
    S: State,
    A: Symbol + fmt::Display,
{
    write!(writer, "{}", FstDot::new(fst))?;
    writer.flush()
}

impl<S, A> fmt::Display for FstDot<'_, S, A>
where
    S: State,
    A: Symbol + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph fst {{")?;
        write_dot_style(f)?;

        let accept = self.fst.accept().and_then(|state| self.fst.state_position(state));
        for (position, state) in self.fst.iter_states().enumerate() {
            let label = html_escape::encode_text(&format!("{state:?}")).into_owned();
            if Some(position) == accept {
                writeln!(f, "  s{position} [label=<{label}>, peripheries=2];")?;
            } else {
                writeln!(f, "  s{position} [label=<{label}>];")?;
            }
        }

        if let Some(start) = self.fst.start().and_then(|state| self.fst.state_position(state)) {
            writeln!(f, "  start [shape=plaintext, label=\"START\"];")?;
            writeln!(f, "  start -> s{start};")?;
        }

        for from in 0..self.fst.num_of_states() {
            // Group the outgoing transitions by their target, keeping the insertion order per group.
            let edges = self
                .fst
                .outgoing_indices(from)
                .iter()
                .copied()
                .sorted_by_key(|&index| self.fst.target_position(index))
                .chunk_by(|&index| self.fst.target_position(index));

            for (to, indices) in &edges {
                let labels: Vec<String> = indices
                    .map(|index| {
                        let transition = self.fst.transition_at(index);
                        html_escape::encode_text(&format!("{}:{}", transition.input, transition.output)).into_owned()
                    })
                    .collect();

                writeln!(f, "  s{from} -> s{to} [label=<{}>];", edge_label(&labels))?;
            }
        }

        writeln!(f, "}}")
    }
}

fn write_dot_style(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  rankdir=LR;")?;
    writeln!(f, "  graph [fontname=\"DejaVu Sans\", splines=true];")?;
    writeln!(f, "  node [fontname=\"DejaVu Sans\", shape=circle];")?;
    writeln!(
        f,
        "  edge [fontname=\"DejaVu Sans\", color=\"#444444\", arrowsize=0.9, penwidth=1.2];"
    )
}

/// Joins the labels with line breaks, eliding everything after the first few.
fn edge_label(labels: &[String]) -> String {
    if labels.len() > MAX_LABELS {
        let mut label = labels[..MAX_LABELS].join("<br/>");
        label.push_str("<br/>...");
        label
    } else {
        labels.join("<br/>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::Sentinels;
    use crate::Transition;
    use crate::acceptor;

    #[test]
    fn test_dot_acceptor() {
        let fst = acceptor(["x", "<y>"].map(String::from), Sentinels::default());
        let dot = FstDot::new(&fst).to_string();

        assert!(dot.starts_with("digraph fst {"));
        assert!(dot.contains("start -> s0;"));
        assert!(dot.contains("s3 [label=<3>, peripheries=2];"));
        assert!(dot.contains("s0 -> s1 [label=<x:x>];"));
        assert!(dot.contains("s1 -> s2 [label=<&lt;y&gt;:&lt;y&gt;>];"));
        assert!(dot.contains("s2 -> s3 [label=<&lt;/s&gt;:&lt;/s&gt;>];"));
    }

    #[test]
    fn test_dot_truncates_labels() {
        let mut fst: Fst<usize, char> = Fst::with_sentinels(Sentinels::default());
        fst.set_start(0);
        fst.set_accept(1);
        for symbol in ['a', 'b', 'c', 'd', 'e'] {
            fst.add_transition_once(Transition::new(0, symbol, symbol, 1));
        }
        fst.add_transition_once(Transition::new(0, 'f', 'g', 0));

        let mut output = Vec::new();
        write_dot(&mut output, &fst).unwrap();
        let dot = String::from_utf8(output).unwrap();

        assert!(dot.contains("s0 -> s1 [label=<a:a<br/>b:b<br/>c:c<br/>...>];"));
        assert!(dot.contains("s0 -> s0 [label=<f:g>];"));
        assert!(!dot.contains("d:d"));
    }
}

use crate::ComposedFst;
use crate::Fst;
use crate::State;
use crate::Symbol;
use crate::Transition;

/// The way in which values of composed transitions are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Semiring {
    /// Values are multiplied along an origin and summed over all origins.
    Product,
    /// Values are logarithms, they are added along an origin and combined
    /// with log-sum-exp over all origins.
    LogSum,
}

/// Computes `log(exp(x) + exp(y))` in a numerically stable way.
pub fn log_add_exp(x: f64, y: f64) -> f64 {
    let (max, min) = if x < y { (y, x) } else { (x, y) };
    if min == f64::NEG_INFINITY {
        // Also avoids the NaN of `-inf - -inf`.
        return max;
    }

    max + (min - max).exp().ln_1p()
}

/// Returns the stored weights of the transducer as a value function, where
/// unknown transitions have weight zero.
pub fn weight_of<S: State, A: Symbol>(fst: &Fst<S, A>) -> impl Fn(&Transition<S, A>) -> f64 + '_ {
    move |transition: &Transition<S, A>| fst.weight(transition).unwrap_or(0.0)
}

/// Returns a function that computes the value of a composed transition from
/// the values `v1` and `v2` of the transitions of the two composed transducers.
///
/// The values are computed on demand from the provenance of the transition,
/// a missing origin contributes the unit of the semiring. A transition that
/// is not part of the composed transducer gets the zero of the semiring.
pub fn compose_values<'a, S1, S2, A, V1, V2>(
    composed: &'a ComposedFst<S1, S2, A>,
    v1: V1,
    v2: V2,
    semiring: Semiring,
) -> impl Fn(&Transition<(S1, S2), A>) -> f64 + 'a
where
    S1: State,
    S2: State,
    A: Symbol,
    V1: Fn(&Transition<S1, A>) -> f64 + 'a,
    V2: Fn(&Transition<S2, A>) -> f64 + 'a,
{
    move |transition: &Transition<(S1, S2), A>| {
        let origins = composed.provenance(transition);

        match semiring {
            Semiring::Product => origins.iter().fold(0.0, |value, (left, right)| {
                let left = left.as_ref().map_or(1.0, |t| v1(t));
                let right = right.as_ref().map_or(1.0, |t| v2(t));
                value + left * right
            }),
            Semiring::LogSum => origins.iter().fold(f64::NEG_INFINITY, |value, (left, right)| {
                let left = left.as_ref().map_or(0.0, |t| v1(t));
                let right = right.as_ref().map_or(0.0, |t| v2(t));
                log_add_exp(value, left + right)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use wfst_utilities::random_test;

    use crate::RandomEpsilon;
    use crate::compose;
    use crate::random_fst;

    #[test]
    fn test_log_add_exp() {
        assert!((log_add_exp(0.0, 0.0) - 2.0f64.ln()).abs() < 1e-12);
        assert!((log_add_exp(1000.0, 1000.0) - (1000.0 + 2.0f64.ln())).abs() < 1e-9);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, -3.0), -3.0);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn test_random_product_values_match_weights() {
        random_test(100, |rng| {
            let left = random_fst(rng, 6, 3, 3, RandomEpsilon::Deleting);
            let right = random_fst(rng, 6, 3, 3, RandomEpsilon::None);
            let composed = compose(&left, &right).unwrap();

            let value = composed.compose_values(weight_of(&left), weight_of(&right), Semiring::Product);
            for (transition, weight) in composed.fst().iter_weighted_transitions() {
                assert!(
                    (value(transition) - weight).abs() < 1e-9,
                    "Value of {transition} should be {weight}"
                );
            }
        });
    }

    #[test]
    fn test_random_log_values_match_weights() {
        random_test(100, |rng| {
            let left = random_fst(rng, 6, 3, 3, RandomEpsilon::None);
            let right = random_fst(rng, 6, 3, 3, RandomEpsilon::Inserting);
            let composed = compose(&left, &right).unwrap();

            let log_left = |t: &Transition<usize, char>| left.weight(t).unwrap_or(0.0).ln();
            let log_right = |t: &Transition<usize, char>| right.weight(t).unwrap_or(0.0).ln();
            let value = compose_values(&composed, log_left, log_right, Semiring::LogSum);

            for (transition, weight) in composed.fst().iter_weighted_transitions() {
                assert!((value(transition) - weight.ln()).abs() < 1e-9);
            }
        });
    }

    #[test]
    fn test_unknown_transition_is_zero() {
        let left = random_fst(&mut rand::rng(), 3, 2, 2, RandomEpsilon::None);
        let composed = compose(&left, &left).unwrap();

        let unknown = Transition::new((7, 7), 'z', 'z', (7, 7));
        let product = composed.compose_values(weight_of(&left), weight_of(&left), Semiring::Product);
        let log_sum = composed.compose_values(weight_of(&left), weight_of(&left), Semiring::LogSum);

        assert_eq!(product(&unknown), 0.0);
        assert_eq!(log_sum(&unknown), f64::NEG_INFINITY);
    }
}

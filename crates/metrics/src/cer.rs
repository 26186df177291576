use log::debug;
use thiserror::Error;

use crate::levenshtein_str;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("The references contain no characters, the error rate is undefined")]
    EmptyReference,

    #[error("Expected as many hypotheses as references, got {hypotheses} hypotheses for {references} references")]
    LengthMismatch { references: usize, hypotheses: usize },
}

/// Returns the character error rate of the given `(reference, hypothesis)`
/// pairs: the total edit distance divided by the total reference length.
pub fn cer<R, H>(pairs: impl IntoIterator<Item = (R, H)>) -> Result<f64, MetricError>
where
    R: AsRef<str>,
    H: AsRef<str>,
{
    let mut edits = 0;
    let mut length = 0;

    for (reference, hypothesis) in pairs {
        let (reference, hypothesis) = (reference.as_ref(), hypothesis.as_ref());
        edits += levenshtein_str(reference, hypothesis);
        length += reference.chars().count();
    }

    debug!("Found {edits} edits for {length} reference characters");
    if length == 0 {
        return Err(MetricError::EmptyReference);
    }

    Ok(edits as f64 / length as f64)
}

/// Returns the character error rate of the hypotheses against the references
/// of the same line.
pub fn cer_lines<R, H>(references: &[R], hypotheses: &[H]) -> Result<f64, MetricError>
where
    R: AsRef<str>,
    H: AsRef<str>,
{
    if references.len() != hypotheses.len() {
        return Err(MetricError::LengthMismatch {
            references: references.len(),
            hypotheses: hypotheses.len(),
        });
    }

    cer(references.iter().zip(hypotheses))
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_cer_aggregates() {
        // 3 edits for kitten and 1 for abcd, over 10 reference characters.
        let rate = cer([("kitten", "sitting"), ("abcd", "abce")]).unwrap();
        assert!((rate - 0.4).abs() < 1e-12);

        assert_eq!(cer([("abc", "abc")]), Ok(0.0));
    }

    #[test]
    fn test_cer_empty_reference() {
        assert_eq!(cer([("", "abc")]), Err(MetricError::EmptyReference));
        assert_eq!(
            cer(Vec::<(String, String)>::new()),
            Err(MetricError::EmptyReference)
        );
    }

    #[test]
    fn test_cer_lines() {
        let references = vec!["ab".to_string(), "cd".to_string()];
        assert_eq!(cer_lines(&references, &["ab", "cx"]), Ok(0.25));
        assert_eq!(
            cer_lines(&references, &["ab"]),
            Err(MetricError::LengthMismatch {
                references: 2,
                hypotheses: 1
            })
        );
    }
}

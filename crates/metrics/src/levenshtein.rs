/// Returns the Levenshtein distance between `source` and `target`, where
/// inserting, deleting and substituting an element all cost one.
pub fn levenshtein<T: PartialEq>(source: &[T], target: &[T]) -> usize {
    let n = target.len();
    if source.is_empty() {
        return n;
    }
    if n == 0 {
        return source.len();
    }

    // Only the previous row of the distance matrix is needed.
    let mut prev_row: Vec<usize> = (0..=n).collect();
    let mut curr_row = vec![0; n + 1];

    for (i, s) in source.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, t) in target.iter().enumerate() {
            let cost = usize::from(s != t);

            curr_row[j + 1] = (prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1) // insertion
                .min(prev_row[j] + cost); // substitution
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[n]
}

/// Returns the Levenshtein distance between the characters of both strings.
pub fn levenshtein_str(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();
    levenshtein(&source, &target)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_levenshtein_reference_values() {
        assert_eq!(levenshtein_str("kitten", "sitting"), 3);
        assert_eq!(levenshtein_str("", "abc"), 3);
        assert_eq!(levenshtein_str("abc", ""), 3);
        assert_eq!(levenshtein_str("abc", "abc"), 0);
        assert_eq!(levenshtein_str("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_symmetric() {
        let pairs = [("intention", "execution"), ("ab", "ba"), ("ε", "e")];
        for (s, t) in pairs {
            assert_eq!(levenshtein_str(s, t), levenshtein_str(t, s));
        }
        assert_eq!(levenshtein_str("ε", "e"), 1);
    }

    #[test]
    fn test_levenshtein_words() {
        let reference = ["the", "cat", "sat"];
        let hypothesis = ["the", "bat", "sat", "down"];
        assert_eq!(levenshtein(&reference, &hypothesis), 2);
    }
}

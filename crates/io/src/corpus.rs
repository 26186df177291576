use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

use log::info;

use wfst_utilities::WfstError;

use crate::TimeProgress;

/// Reads all lines from the given reader, without their line terminators.
///
/// Both `\n` and `\r\n` terminated lines are accepted. The reader is buffered
/// internally.
pub fn read_lines(reader: impl Read) -> Result<Vec<String>, WfstError> {
    let mut lines = Vec::new();
    let mut progress = TimeProgress::new(|count: usize| info!("Read {count} lines..."), 1);

    for line in BufReader::new(reader).lines() {
        let mut line = line?;
        if line.ends_with('\r') {
            line.pop();
        }

        lines.push(line);
        progress.print(lines.len());
    }

    Ok(lines)
}

/// Reads a character level training corpus: one sequence per line where
/// every character is a symbol.
///
/// The end of sequence marker is never part of the returned sequences, the
/// training walk appends it implicitly.
pub fn read_corpus(reader: impl Read) -> Result<Vec<Vec<char>>, WfstError> {
    info!("Reading character corpus...");
    let corpus: Vec<Vec<char>> = read_lines(reader)?
        .into_iter()
        .map(|line| line.chars().collect())
        .collect();

    info!("Finished reading {} sequences", corpus.len());
    Ok(corpus)
}

/// Reads a word level training corpus: one sequence per line where the
/// symbols are separated by whitespace.
pub fn read_corpus_words(reader: impl Read) -> Result<Vec<Vec<String>>, WfstError> {
    info!("Reading word corpus...");
    let corpus: Vec<Vec<String>> = read_lines(reader)?
        .into_iter()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect();

    info!("Finished reading {} sequences", corpus.len());
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_read_lines_strips_terminators() {
        let input = "abc\r\nde\n\nf";
        let lines = read_lines(input.as_bytes()).unwrap();

        assert_eq!(lines, vec!["abc", "de", "", "f"]);
    }

    #[test]
    fn test_read_corpus_characters() {
        let corpus = read_corpus("hi\nyou\n".as_bytes()).unwrap();

        assert_eq!(corpus, vec![vec!['h', 'i'], vec!['y', 'o', 'u']]);
    }

    #[test]
    fn test_read_corpus_words() {
        let corpus = read_corpus_words("the  cat\n sat \n".as_bytes()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0], vec!["the".to_string(), "cat".to_string()]);
        assert_eq!(corpus[1], vec!["sat".to_string()]);
    }
}

//! Degenerate-parse fallback rows
//!
//! When a sentence is empty, too long, or fails inside the pipeline, batch
//! callers still need one output record per input. This module builds the
//! placeholder CoNLL-09 rows the rest of the toolchain expects: every token
//! becomes a row with dummy lemma/POS columns and a head pointing at the
//! previous token.

/// Sentences longer than this are not sent to the pipeline at all
pub const MAX_PARSE_TOKENS: usize = 100;

/// Whitespace tokenization, the convention the fallback rows are built from
pub fn tokenize(sentence: &str) -> Vec<&str> {
    sentence.split_whitespace().collect()
}

/// Build placeholder CoNLL-09 rows for an unparsed sentence
///
/// Columns: ID FORM LEMMA PLEMMA POS PPOS FEAT PFEAT HEAD PHEAD DEPREL
/// PDEPREL FILLPRED PRED (no APRED columns). No trailing newline.
pub fn noparse(tokens: &[&str]) -> String {
    let mut result = String::new();
    for (i, token) in tokens.iter().enumerate() {
        result.push_str(&format!(
            "{}\t{}\t--\t--\t_\t_\t_\t_\t{}\t{}\t--\t--\t_\t_\n",
            i + 1,
            token,
            i,
            i
        ));
    }
    result.trim_end().to_string()
}

/// Whether a sentence should bypass the pipeline entirely
pub fn exceeds_parse_limit(sentence: &str) -> bool {
    sentence.is_empty() || tokenize(sentence).len() > MAX_PARSE_TOKENS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noparse_row_shape() {
        let rows = noparse(&["The", "cat", "sleeps."]);
        let lines: Vec<&str> = rows.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "1\tThe\t--\t--\t_\t_\t_\t_\t0\t0\t--\t--\t_\t_");
        assert_eq!(lines[2], "3\tsleeps.\t--\t--\t_\t_\t_\t_\t2\t2\t--\t--\t_\t_");
        assert!(!rows.ends_with('\n'));
    }

    #[test]
    fn test_noparse_empty() {
        assert_eq!(noparse(&[]), "");
    }

    #[test]
    fn test_parse_limit() {
        assert!(exceeds_parse_limit(""));
        assert!(!exceeds_parse_limit("The cat sleeps."));
        let long = vec!["w"; MAX_PARSE_TOKENS + 1].join(" ");
        assert!(exceeds_parse_limit(&long));
        let at_limit = vec!["w"; MAX_PARSE_TOKENS].join(" ");
        assert!(!exceeds_parse_limit(&at_limit));
    }
}

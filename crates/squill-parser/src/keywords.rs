//! Multi-word SQL keyword recognition.
//!
//! A [`KeywordSet`] is an ordered collection of phrases, each one or more
//! lower-case words. The scanner probes it to lex sequences like `GROUP BY`
//! or `CREATE OR REPLACE PROCEDURE` as a single keyword token, which keeps
//! the scanner itself dialect-agnostic: a dialect is free to merge in its own
//! phrases without touching the lexing code.

/// An ordered, prepared set of keyword phrases.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    phrases: Vec<Vec<String>>,
}

/// Outcome of a longest-prefix probe: the matched phrase (space-joined,
/// lower-case), whether no longer phrase can extend it, and whether the
/// probe matched at all.
pub type Match = (String, bool, bool);

impl KeywordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from word slices. Call [`KeywordSet::prepare`] before use.
    #[must_use]
    pub fn from_phrases(phrases: &[&[&str]]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.iter().map(|w| (*w).to_string()).collect())
                .collect(),
        }
    }

    /// Concatenate another set onto this one. Invariants are restored by the
    /// next [`KeywordSet::prepare`].
    #[must_use]
    pub fn merge(mut self, other: KeywordSet) -> Self {
        self.phrases.extend(other.phrases);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Lower-case every word, drop phrases whose concatenation duplicates an
    /// earlier one, and sort by the space-joined form.
    pub fn prepare(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.phrases.retain_mut(|phrase| {
            for word in phrase.iter_mut() {
                *word = word.to_lowercase();
            }
            seen.insert(phrase.concat())
        });
        self.phrases.sort_by(|a, b| a.join(" ").cmp(&b.join(" ")));
    }

    /// First index whose phrase head is `>= word` (binary search over the
    /// sorted set).
    fn find(&self, word: &str) -> usize {
        self.phrases.partition_point(|p| p[0].as_str() < word)
    }

    /// Probe the set with a candidate word sequence.
    ///
    /// Three outcomes:
    /// - exact phrase match: `(phrase, final, true)`, where `final` reports
    ///   that no longer phrase continues this exact word sequence;
    /// - the words are a strict prefix of some phrase: `(joined, false,
    ///   false)` — more look-ahead could still win;
    /// - no phrase matches or extends the words: `("", false, false)`.
    #[must_use]
    pub fn is(&self, words: &[&str]) -> Match {
        let n = self.len();
        if n == 0 || words.is_empty() {
            return (String::new(), false, false);
        }
        let head = words[0].to_lowercase();
        let i = self.find(&head);
        if i >= n || self.phrases[i][0] != head {
            return (String::new(), false, false);
        }

        // Single word, single-word phrase, no same-head neighbour: done.
        if self.phrases[i].len() == 1
            && words.len() == 1
            && ((i + 1 < n && self.phrases[i + 1][0] != head) || i + 1 == n)
        {
            return (head, true, true);
        }

        let got = words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        for phrase in &self.phrases[i..] {
            if phrase[0] != head {
                break;
            }
            let want = phrase.join(" ");
            if want == got {
                let is_final = i + 1 == n || !eq_words(words, &self.phrases[i + 1]);
                return (got, is_final, true);
            }
            if want.starts_with(got.as_str()) {
                return (got, false, false);
            }
        }
        (String::new(), false, false)
    }
}

fn eq_words(words: &[&str], phrase: &[String]) -> bool {
    words.len() == phrase.len()
        && words
            .iter()
            .zip(phrase)
            .all(|(w, p)| w.eq_ignore_ascii_case(p))
}

/// Whether an upper-cased keyword phrase denotes a join.
#[must_use]
pub fn is_join(phrase: &str) -> bool {
    phrase.ends_with("JOIN")
}

/// The standard-SQL keyword corpus shared by every dialect.
#[must_use]
pub fn standard() -> KeywordSet {
    KeywordSet::from_phrases(&[
        &["create", "procedure"],
        &["create", "or", "replace", "procedure"],
        &["create", "table"],
        &["create", "view"],
        &["create", "temp", "view"],
        &["create", "temporary", "view"],
        &["create", "temp", "table"],
        &["create", "temporary", "table"],
        &["if", "not", "exists"],
        &["if", "exists"],
        &["declare"],
        &["default"],
        &["exists"],
        &["null"],
        &["select"],
        &["from"],
        &["where"],
        &["having"],
        &["limit"],
        &["offset"],
        &["fetch"],
        &["row"],
        &["rows"],
        &["next"],
        &["only"],
        &["group", "by"],
        &["order", "by"],
        &["as"],
        &["in"],
        &["inout"],
        &["out"],
        &["join"],
        &["on"],
        &["full", "join"],
        &["full", "outer", "join"],
        &["outer", "join"],
        &["left", "join"],
        &["left", "outer", "join"],
        &["right", "join"],
        &["right", "outer", "join"],
        &["inner", "join"],
        &["cross", "join"],
        &["union"],
        &["intersect"],
        &["except"],
        &["all"],
        &["any"],
        &["some"],
        &["distinct"],
        &["and"],
        &["or"],
        &["asc"],
        &["desc"],
        &["nulls"],
        &["first"],
        &["last"],
        &["similar"],
        &["like"],
        &["ilike"],
        &["delete"],
        &["delete", "from"],
        &["insert"],
        &["truncate"],
        &["truncate", "table"],
        &["update"],
        &["merge"],
        &["merge", "into"],
        &["when", "matched"],
        &["when", "not", "matched"],
        &["set"],
        &["insert", "into"],
        &["values"],
        &["case"],
        &["when"],
        &["then"],
        &["end"],
        &["using"],
        &["begin"],
        &["read", "write"],
        &["read", "only"],
        &["repeatable", "read"],
        &["read", "committed"],
        &["read", "uncommitted"],
        &["serializable"],
        &["isolation", "level"],
        &["start", "transaction"],
        &["set", "transaction"],
        &["savepoint"],
        &["release"],
        &["release", "savepoint"],
        &["rollback", "to", "savepoint"],
        &["commit"],
        &["rollback"],
        &["on", "conflict"],
        &["do"],
        &["nothing"],
        &["while"],
        &["end", "while"],
        &["if"],
        &["end", "if"],
        &["else"],
        &["elsif"],
        &["with"],
        &["recursive"],
        &["materialized"],
        &["return"],
        &["returning"],
        &["is"],
        &["isnull"],
        &["notnull"],
        &["not"],
        &["collate"],
        &["between"],
        &["cast"],
        &["filter"],
        &["window"],
        &["over"],
        &["partition", "by"],
        &["range"],
        &["groups"],
        &["preceding"],
        &["following"],
        &["unbounded", "preceding"],
        &["unbounded", "following"],
        &["current", "row"],
        &["exclude", "no", "others"],
        &["exclude", "current", "row"],
        &["exclude", "group"],
        &["exclude", "ties"],
        &["call"],
        &["constraint"],
        &["primary", "key"],
        &["foreign", "key"],
        &["references"],
        &["autoincrement"],
        &["unique"],
        &["check"],
        &["generated", "always"],
        &["stored"],
        &["language"],
        &["alter", "table"],
        &["rename", "to"],
        &["rename", "column"],
        &["rename", "constraint"],
        &["alter"],
        &["alter", "column"],
        &["add"],
        &["add", "column"],
        &["add", "constraint"],
        &["drop"],
        &["drop", "table"],
        &["drop", "view"],
        &["drop", "column"],
        &["drop", "constraint"],
        &["to"],
        &["true"],
        &["false"],
        &["unknown"],
        &["cascade"],
        &["restrict"],
        &["restart", "identity"],
        &["continue", "identity"],
        &["grant"],
        &["revoke"],
        &["all", "privileges"],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared() -> KeywordSet {
        let mut set = standard();
        set.prepare();
        set
    }

    #[test]
    fn every_phrase_matches_itself() {
        let set = prepared();
        for phrase in &set.phrases {
            let words: Vec<&str> = phrase.iter().map(String::as_str).collect();
            let (matched, _, ok) = set.is(&words);
            assert!(ok, "phrase {words:?} did not match");
            assert_eq!(matched, phrase.join(" "));
        }
    }

    #[test]
    fn longest_match_wins_over_prefix() {
        let set = prepared();
        let (matched, _, ok) = set.is(&["create", "or", "replace", "procedure"]);
        assert!(ok);
        assert_eq!(matched, "create or replace procedure");

        // A strict prefix of a longer phrase reports "might extend".
        let (matched, is_final, ok) = set.is(&["create", "or"]);
        assert!(!ok);
        assert!(!is_final);
        assert_eq!(matched, "create or");
    }

    #[test]
    fn unknown_words_do_not_match() {
        let set = prepared();
        assert_eq!(set.is(&["frobnicate"]), (String::new(), false, false));
        assert_eq!(set.is(&["group", "around"]), (String::new(), false, false));
    }

    #[test]
    fn match_is_case_insensitive() {
        let set = prepared();
        let (matched, _, ok) = set.is(&["GROUP", "By"]);
        assert!(ok);
        assert_eq!(matched, "group by");
    }

    #[test]
    fn prepare_dedups_and_sorts() {
        let mut set = KeywordSet::from_phrases(&[&["b"], &["a"], &["B"]]);
        set.prepare();
        assert_eq!(set.len(), 2);
        let (matched, _, ok) = set.is(&["a"]);
        assert!(ok);
        assert_eq!(matched, "a");
    }

    #[test]
    fn merge_then_prepare_restores_invariants() {
        let extra = KeywordSet::from_phrases(&[&["vacuum"], &["select"]]);
        let mut set = standard().merge(extra);
        set.prepare();
        let (matched, _, ok) = set.is(&["vacuum"]);
        assert!(ok);
        assert_eq!(matched, "vacuum");
        // The duplicate "select" collapsed.
        let selects = set
            .phrases
            .iter()
            .filter(|p| p.concat() == "select")
            .count();
        assert_eq!(selects, 1);
    }

    #[test]
    fn join_detection() {
        assert!(is_join("LEFT OUTER JOIN"));
        assert!(is_join("JOIN"));
        assert!(!is_join("ORDER BY"));
    }
}

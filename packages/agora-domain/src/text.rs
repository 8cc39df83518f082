use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

const MAX_QUERY_TOKENS: usize = 8;

/// Lowercased, de-duplicated alphanumeric tokens for free-text matching.
/// Tokens beyond the cap are dropped; they add recall cost without
/// changing the head of the result set.
pub fn tokenize(query: &str) -> Vec<String> {
	static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

	let pattern =
		TOKEN_PATTERN.get_or_init(|| Regex::new("[a-z0-9]+").expect("Token pattern must compile."));
	let lowered = query.to_lowercase();
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for found in pattern.find_iter(&lowered) {
		let token = found.as_str();

		if seen.insert(token.to_string()) {
			out.push(token.to_string());
		}
		if out.len() >= MAX_QUERY_TOKENS {
			break;
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::text::tokenize;

	#[test]
	fn tokens_are_lowercased_and_deduplicated() {
		assert_eq!(tokenize("Vintage LAMP vintage"), vec!["vintage", "lamp"]);
	}

	#[test]
	fn punctuation_splits_tokens() {
		assert_eq!(tokenize("mid-century (teak)"), vec!["mid", "century", "teak"]);
	}

	#[test]
	fn token_count_is_capped() {
		let query = "a b c d e f g h i j";

		assert_eq!(tokenize(query).len(), 8);
	}

	#[test]
	fn empty_query_yields_no_tokens() {
		assert!(tokenize("  \t ").is_empty());
	}
}

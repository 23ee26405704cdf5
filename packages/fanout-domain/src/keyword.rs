use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const PRIORITY_PHRASE: u8 = 3;
pub const PRIORITY_ALL_TOKENS: u8 = 2;
pub const PRIORITY_SOME_TOKENS: u8 = 1;

/// NFKC, lowercase, and single spaces between words.
pub fn normalize(text: &str) -> String {
	let folded = text.nfkc().collect::<String>().to_lowercase();

	folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokens(text: &str) -> Vec<String> {
	normalize(text).unicode_words().map(str::to_string).collect()
}

/// Scores how the keyword shows up in a title. Zero means it does not.
pub fn keyword_priority(title: &str, keyword: &str) -> u8 {
	let keyword = normalize(keyword);

	if keyword.is_empty() {
		return 0;
	}

	let title = normalize(title);

	if title.contains(&keyword) {
		return PRIORITY_PHRASE;
	}

	let keyword_tokens = tokens(&keyword);

	if keyword_tokens.is_empty() {
		return 0;
	}

	let title_tokens = tokens(&title);
	let matched = keyword_tokens.iter().filter(|token| title_tokens.contains(token)).count();

	if matched == keyword_tokens.len() {
		PRIORITY_ALL_TOKENS
	} else if matched > 0 {
		PRIORITY_SOME_TOKENS
	} else {
		0
	}
}

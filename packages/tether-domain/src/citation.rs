use crate::Reference;

/// Decides which candidate references the generated answer actually used.
///
/// A candidate is kept iff its `[id]` marker appears as a case-insensitive
/// substring of the response text. The output preserves the candidate list's
/// order, not first-appearance order in the text. Deliberately a conservative
/// literal test: a paraphrased id is dropped, and no semantic matching is
/// attempted.
pub fn extract(response_text: &str, candidates: &[Reference]) -> Vec<Reference> {
	if response_text.is_empty() || candidates.is_empty() {
		return Vec::new();
	}

	let haystack = response_text.to_lowercase();

	candidates
		.iter()
		.filter(|candidate| {
			let marker = format!("[{}]", candidate.id.to_lowercase());

			haystack.contains(&marker)
		})
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(id: &str) -> Reference {
		Reference {
			id: id.to_string(),
			content: format!("content of {id}"),
			content_type: "text/plain".to_string(),
			content_path: format!("{id}.txt"),
			title: None,
			relevance_score: 0.5,
		}
	}

	#[test]
	fn keeps_only_cited_candidates() {
		let candidates = vec![candidate("doc-1"), candidate("doc-2"), candidate("doc-3")];
		let cited = extract("See [doc-1] and also [doc-3].", &candidates);
		let ids: Vec<&str> = cited.iter().map(|reference| reference.id.as_str()).collect();

		assert_eq!(ids, vec!["doc-1", "doc-3"]);
	}

	#[test]
	fn preserves_candidate_order_not_appearance_order() {
		let candidates = vec![candidate("a"), candidate("b")];
		let cited = extract("First [b], then [a].", &candidates);
		let ids: Vec<&str> = cited.iter().map(|reference| reference.id.as_str()).collect();

		assert_eq!(ids, vec!["a", "b"]);
	}

	#[test]
	fn matching_is_case_insensitive() {
		let candidates = vec![candidate("Doc-X")];

		assert_eq!(extract("cited as [doc-x] here", &candidates).len(), 1);
	}

	#[test]
	fn requires_bracketed_marker() {
		let candidates = vec![candidate("doc-1")];

		assert!(extract("mentions doc-1 without brackets", &candidates).is_empty());
	}

	#[test]
	fn never_invents_references() {
		let candidates = vec![candidate("doc-1")];
		let cited = extract("[doc-1] [doc-2] [doc-99]", &candidates);

		assert_eq!(cited.len(), 1);
		assert_eq!(cited[0].id, "doc-1");
	}

	#[test]
	fn empty_inputs_yield_nothing() {
		assert!(extract("", &[candidate("doc-1")]).is_empty());
		assert!(extract("[doc-1]", &[]).is_empty());
	}
}

/// Builds the security-trimming filter list.
///
/// With no groups the base filter is returned unchanged, so an empty
/// membership list never zeroes out retrieval on its own. Otherwise the base
/// filter gains one clause requiring the document's group-id collection to
/// intersect `groups`; elements of the returned list are AND-combined by the
/// search backend.
pub fn augment(base: &[String], groups: &[String], group_field: &str) -> Vec<String> {
	if groups.is_empty() {
		return base.to_vec();
	}

	let mut out = base.to_vec();

	out.push(group_clause(groups, group_field));

	out
}

/// OData-style "any of" membership test:
/// `group_ids/any(g: search.in(g, 'g1, g2'))`.
pub fn group_clause(groups: &[String], group_field: &str) -> String {
	let list = groups.iter().map(|group| escape(group)).collect::<Vec<_>>().join(", ");

	format!("{group_field}/any(g: search.in(g, '{list}'))")
}

fn escape(value: &str) -> String {
	value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn strings(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn empty_groups_return_base_unchanged() {
		let base = strings(&["category eq 'hr'"]);

		assert_eq!(augment(&base, &[], "group_ids"), base);
		assert_eq!(augment(&[], &[], "group_ids"), Vec::<String>::new());
	}

	#[test]
	fn non_empty_groups_add_exactly_one_clause() {
		let base = strings(&["category eq 'hr'", "lang eq 'en'"]);
		let augmented = augment(&base, &strings(&["g1", "g2"]), "group_ids");

		assert_eq!(augmented.len(), base.len() + 1);
		assert_eq!(&augmented[..base.len()], &base[..]);
		assert_eq!(augmented[2], "group_ids/any(g: search.in(g, 'g1, g2'))");
	}

	#[test]
	fn clause_respects_configured_field() {
		let clause = group_clause(&strings(&["g1"]), "acl_groups");

		assert_eq!(clause, "acl_groups/any(g: search.in(g, 'g1'))");
	}

	#[test]
	fn single_quotes_are_doubled() {
		let clause = group_clause(&strings(&["o'brien"]), "group_ids");

		assert_eq!(clause, "group_ids/any(g: search.in(g, 'o''brien'))");
	}
}

//! Composition and escaping of LDAP search filters.
//!
//! Filters are built from string fragments. A fragment is either a complete
//! clause (`cn=admin`) or a template containing the `{}` placeholder
//! (`distinguishedName={}`), which is expanded once per remaining fragment.
//! Every clause is wrapped in parentheses and the results are concatenated;
//! the filter grammar is self-delimiting so no separator is needed.

/// The substitution marker recognized in template fragments.
pub const PLACEHOLDER: &str = "{}";

/// Build a filter string from an ordered sequence of fragments.
///
/// Fragments are trimmed and empty ones discarded. If the first remaining
/// fragment contains [`PLACEHOLDER`] and more than one fragment remains, it
/// is treated as a template and one clause is produced per remaining value.
/// Otherwise every fragment is taken as an already-complete clause.
///
/// Returns an empty string when no usable fragment remains. Callers must
/// treat an empty result as "no filter" and refuse to search with it.
///
/// ```
/// use ldap_resolver::filter::compose;
///
/// assert_eq!(
/// 	compose(["distinguishedName={}", "A", "B"]),
/// 	"(distinguishedName=A)(distinguishedName=B)",
/// );
/// ```
pub fn compose<I, S>(fragments: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut clauses: Vec<String> = fragments
		.into_iter()
		.map(|fragment| fragment.as_ref().trim().to_owned())
		.filter(|fragment| !fragment.is_empty())
		.collect();

	if clauses.is_empty() {
		return String::new();
	}

	if clauses.len() > 1 && clauses[0].contains(PLACEHOLDER) {
		let template = clauses.remove(0);
		clauses = clauses.iter().map(|value| template.replace(PLACEHOLDER, value)).collect();
	}

	clauses.iter().map(|clause| wrap_clause(clause)).collect()
}

/// Wrap a clause in parentheses unless it already carries them.
///
/// The opening and closing parenthesis are checked independently, so a
/// clause missing only one of them is completed rather than double-wrapped.
pub fn wrap_clause(clause: &str) -> String {
	let clause = clause.trim();
	let open = if clause.starts_with('(') { "" } else { "(" };
	let close = if clause.ends_with(')') { "" } else { ")" };
	format!("{open}{clause}{close}")
}

/// Combine pre-composed clauses with the `&` (AND) operator.
pub fn and<I, S>(clauses: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	format!("(&{})", compose(clauses))
}

/// Combine pre-composed clauses with the `|` (OR) operator.
pub fn or<I, S>(clauses: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	format!("(|{})", compose(clauses))
}

/// Escape a value for embedding in a filter clause.
///
/// Backslashes are escaped before parentheses; reversing the order would
/// double-escape the backslashes inserted for `\(` and `\)`.
pub fn escape_value(value: &str) -> String {
	value.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// Escape a sequence of values element-wise with [`escape_value`].
pub fn escape_values<S: AsRef<str>>(values: &[S]) -> Vec<String> {
	values.iter().map(|value| escape_value(value.as_ref())).collect()
}

#[cfg(test)]
mod tests {
	use super::{and, compose, escape_value, escape_values, or, wrap_clause};

	#[test]
	fn compose_expands_template() {
		assert_eq!(
			compose(["distinguishedName={}", "A", "B"]),
			"(distinguishedName=A)(distinguishedName=B)"
		);
	}

	#[test]
	fn compose_literal_clauses() {
		assert_eq!(
			compose(["objectClass=person", "cn=admin"]),
			"(objectClass=person)(cn=admin)"
		);
	}

	#[test]
	fn compose_single_template_fragment_is_literal() {
		// A lone template has nothing to substitute and is kept verbatim.
		assert_eq!(compose(["distinguishedName={}"]), "(distinguishedName={})");
	}

	#[test]
	fn compose_trims_and_drops_empty_fragments() {
		assert_eq!(compose(["  cn=a  ", "", "   "]), "(cn=a)");
		assert_eq!(compose(Vec::<&str>::new()), "");
		assert_eq!(compose(["", "  "]), "");
	}

	#[test]
	fn wrap_is_idempotent() {
		assert_eq!(wrap_clause("cn=a"), "(cn=a)");
		assert_eq!(wrap_clause("(cn=a)"), "(cn=a)");
		assert_eq!(wrap_clause("(cn=a"), "(cn=a)");
		assert_eq!(wrap_clause("cn=a)"), "(cn=a)");
	}

	#[test]
	fn boolean_operators() {
		assert_eq!(and(["objectClass=person", "cn=a"]), "(&(objectClass=person)(cn=a))");
		assert_eq!(or(["cn=a", "cn=b"]), "(|(cn=a)(cn=b))");
	}

	#[test]
	fn escape_order_backslash_first() {
		assert_eq!(escape_value("A(B)C"), "A\\(B\\)C");
		assert_eq!(escape_value("a\\b"), "a\\\\b");
		// Parentheses escaped after backslashes, so the inserted backslash
		// is not escaped again.
		assert_eq!(escape_value("\\("), "\\\\\\(");
	}

	#[test]
	fn escape_elementwise() {
		assert_eq!(escape_values(&["(x)", "y"]), vec!["\\(x\\)", "y"]);
	}
}

//! Resolves a TextMate scope stack to the single class name the editor colors by.
//!
//! Theme rules are usually written against generic scopes (`keyword.control`) while grammars
//! emit fully qualified ones (`keyword.control.ts`). Before trying a prefix on its own we
//! first try it with the language suffix of the innermost scope re-attached, so a rule
//! written for that language wins over a generic one.
//!
//! This is a heuristic kept for compatibility with existing themes: it can pick a
//! different class than a plain longest-prefix match would, and it is not a full
//! TextMate selector match (no parent selectors, no exclusions).

use std::collections::HashSet;

/// The class names the current theme has rules for.
pub type KnownClasses = HashSet<String>;

/// What follows the last `.` of a scope, or the whole scope if there is no dot.
///
/// For `keyword.control.ts` this is `ts`.
#[inline]
pub fn language_suffix(scope: &str) -> &str {
    scope.rsplit_once('.').map_or(scope, |(_, suffix)| suffix)
}

/// The proper dot-separated prefixes of a scope, longest first: `a.b`, `a` for `a.b.c`.
///
/// The scope itself is not one of them, so a scope without a dot has none.
#[inline]
pub fn prefixes(scope: &str) -> impl Iterator<Item = &str> {
    scope.rmatch_indices('.').map(move |(i, _)| &scope[..i])
}

/// Finds the best class for a token, `""` if none of the known classes apply.
///
/// Scopes are walked from the innermost (last) to the outermost and for each scope, its
/// [`prefixes`] from longest to shortest. The full scope is never tried on its own. Each
/// prefix is tried with the language suffix added and then as is. The first known class
/// found is returned.
pub fn resolve_class<'a, S: AsRef<str>>(known: &'a KnownClasses, scopes: &[S]) -> &'a str {
    let Some(innermost) = scopes.last() else {
        return "";
    };
    let suffix = language_suffix(innermost.as_ref());
    let mut candidate = String::with_capacity(64);

    for scope in scopes.iter().rev() {
        for prefix in prefixes(scope.as_ref()) {
            candidate.clear();
            candidate.push_str(prefix);
            candidate.push('.');
            candidate.push_str(suffix);
            if let Some(class) = known.get(candidate.as_str()) {
                return class;
            }
            if let Some(class) = known.get(prefix) {
                return class;
            }
        }
    }

    ""
}

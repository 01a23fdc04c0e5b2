//! Operator whitelist.
//!
//! The only strings the compiler will ever interpolate verbatim as operators.
//! Lookup is case-insensitive; extending the table is a compiler change, not
//! runtime configuration.

/// `(lowercase input, canonical token)` pairs.
///
/// The three `?`-family operators render with a leading backslash so they do
/// not collide with placeholder syntax.
pub(crate) const OPERATORS: &[(&str, &str)] = &[
    // Comparison
    ("=", "="),
    ("<", "<"),
    (">", ">"),
    ("<=", "<="),
    (">=", ">="),
    ("<>", "<>"),
    ("!=", "!="),
    // Pattern match
    ("like", "like"),
    ("not like", "not like"),
    ("ilike", "ilike"),
    ("not ilike", "not ilike"),
    ("rlike", "rlike"),
    ("not rlike", "not rlike"),
    ("regexp", "regexp"),
    ("not regexp", "not regexp"),
    // Range / set
    ("between", "between"),
    ("not between", "not between"),
    ("exists", "exists"),
    ("not exist", "not exist"),
    // Bitwise / regex-match
    ("&", "&"),
    ("|", "|"),
    ("^", "^"),
    ("<<", "<<"),
    (">>", ">>"),
    ("~", "~"),
    ("~*", "~*"),
    ("!~", "!~"),
    ("!~*", "!~*"),
    // Containment / array / text search
    ("#", "#"),
    ("&&", "&&"),
    ("@>", "@>"),
    ("<@", "<@"),
    ("||", "||"),
    ("&<", "&<"),
    ("&>", "&>"),
    ("-|-", "-|-"),
    ("@@", "@@"),
    ("!!", "!!"),
    // Escaped wildcard-match variants
    ("?", "\\?"),
    ("?|", "\\?|"),
    ("?&", "\\?&"),
];

/// Map an operator string to its canonical token.
///
/// `op` must already be lowercased by the caller.
pub(crate) fn canonical(op: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|(key, _)| *key == op)
        .map(|(_, token)| *token)
}

//! Variable substitution over scanned references
//!
//! The interpolator walks the segments produced by
//! [`crate::interpolation`] and reassembles the output: literal runs
//! copied verbatim, references replaced by mapping values with
//! POSIX-shell default semantics. Substitution is single-pass; values
//! pulled from the mapping are inserted verbatim and never re-scanned.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::interpolation::{scan, Segment, Token};

/// Variable name to value table used during substitution
pub type Mapping = IndexMap<String, String>;

/// Substitutes variable references in text against a mapping
///
/// # Example
///
/// ```rust
/// use varsub_core::{Interpolator, Mapping};
///
/// let mut vars = Mapping::new();
/// vars.insert("HOST".to_string(), "localhost".to_string());
///
/// let out = Interpolator::new(&vars)
///     .interpolate("host: ${HOST:-0.0.0.0}")
///     .unwrap();
/// assert_eq!(out, "host: localhost");
/// ```
pub struct Interpolator<'m> {
    mapping: &'m Mapping,
    keep_prefix: Option<String>,
}

impl<'m> Interpolator<'m> {
    /// Create an interpolator over the given mapping
    pub fn new(mapping: &'m Mapping) -> Self {
        Self {
            mapping,
            keep_prefix: None,
        }
    }

    /// Leave references whose name starts with `prefix` untouched in
    /// the output, for a later resolution pass
    pub fn with_keep_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keep_prefix = Some(prefix.into());
        self
    }

    /// Resolve every reference in `text`
    ///
    /// Either the entire input resolves or the call fails atomically
    /// on the first invalid reference; no partial output is returned.
    pub fn interpolate(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());

        for segment in scan(text) {
            match segment {
                Segment::Literal(literal) => out.push_str(literal),
                Segment::Token(token) => self.substitute(text, token, &mut out)?,
            }
        }

        Ok(out)
    }

    fn substitute(&self, template: &str, token: Token<'_>, out: &mut String) -> Result<()> {
        match token {
            Token::Escape => out.push('$'),
            Token::Plain { name, source } => {
                if self.kept(name) {
                    out.push_str(source);
                } else {
                    log::trace!("substituting {}", name);
                    out.push_str(self.lookup(name));
                }
            }
            Token::DefaultIfUnset {
                name,
                default,
                source,
            } => {
                if self.kept(name) {
                    out.push_str(source);
                } else {
                    log::trace!("substituting {}", name);
                    match self.mapping.get(name) {
                        // An existing key wins even when its value is empty
                        Some(value) => out.push_str(value),
                        None => out.push_str(self.default_operand(default)),
                    }
                }
            }
            Token::DefaultIfEmpty {
                name,
                default,
                source,
            } => {
                if self.kept(name) {
                    out.push_str(source);
                } else {
                    log::trace!("substituting {}", name);
                    match self.mapping.get(name) {
                        Some(value) if !value.is_empty() => out.push_str(value),
                        _ => out.push_str(self.default_operand(default)),
                    }
                }
            }
            Token::Invalid { fragment } => {
                return Err(Error::invalid_interpolation(template, fragment));
            }
        }
        Ok(())
    }

    /// A default operand starting with `$` is one level of indirection:
    /// the remainder is looked up once in the mapping, never
    /// re-interpolated, and a miss degrades to the empty string
    fn default_operand<'a>(&'a self, operand: &'a str) -> &'a str {
        match operand.strip_prefix('$') {
            Some(key) => self.lookup(key),
            None => operand,
        }
    }

    fn lookup(&self, name: &str) -> &str {
        self.mapping.get(name).map(String::as_str).unwrap_or("")
    }

    fn kept(&self, name: &str) -> bool {
        self.keep_prefix
            .as_deref()
            .is_some_and(|prefix| name.starts_with(prefix))
    }
}

/// Resolve every reference in `text` against `mapping`
pub fn interpolate(text: &str, mapping: &Mapping) -> Result<String> {
    Interpolator::new(mapping).interpolate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_references_is_identity() {
        let vars = mapping(&[("X", "v")]);
        let text = "plain: text\nwith: lines\n";
        assert_eq!(interpolate(text, &vars).unwrap(), text);
    }

    #[test]
    fn test_plain_reference() {
        let vars = mapping(&[("X", "v")]);
        assert_eq!(interpolate("${X}", &vars).unwrap(), "v");
        assert_eq!(interpolate("$X", &vars).unwrap(), "v");
    }

    #[test]
    fn test_missing_reference_is_empty() {
        let vars = Mapping::new();
        assert_eq!(interpolate("${X}", &vars).unwrap(), "");
        assert_eq!(interpolate("a $X b", &vars).unwrap(), "a  b");
    }

    #[test]
    fn test_default_if_unset() {
        assert_eq!(interpolate("${X-d}", &Mapping::new()).unwrap(), "d");
        // An existing key wins even when empty
        assert_eq!(interpolate("${X-d}", &mapping(&[("X", "")])).unwrap(), "");
        assert_eq!(
            interpolate("${X-d}", &mapping(&[("X", "v")])).unwrap(),
            "v"
        );
    }

    #[test]
    fn test_default_if_empty() {
        assert_eq!(interpolate("${X:-d}", &Mapping::new()).unwrap(), "d");
        assert_eq!(
            interpolate("${X:-d}", &mapping(&[("X", "")])).unwrap(),
            "d"
        );
        assert_eq!(
            interpolate("${X:-d}", &mapping(&[("X", "v")])).unwrap(),
            "v"
        );
    }

    #[test]
    fn test_empty_default() {
        assert_eq!(interpolate("${X-}", &Mapping::new()).unwrap(), "");
        assert_eq!(interpolate("${X:-}", &mapping(&[("X", "")])).unwrap(), "");
    }

    #[test]
    fn test_default_is_variable() {
        assert_eq!(
            interpolate("${X-$Y}", &mapping(&[("Y", "z")])).unwrap(),
            "z"
        );
        assert_eq!(
            interpolate("${X:-$Y}", &mapping(&[("Y", "z")])).unwrap(),
            "z"
        );
        // Both unset resolves to empty
        assert_eq!(interpolate("${X-$Y}", &Mapping::new()).unwrap(), "");
    }

    #[test]
    fn test_default_is_variable_one_level_only() {
        // The retrieved default is inserted verbatim, never re-scanned
        let vars = mapping(&[("Y", "$Z"), ("Z", "deep")]);
        assert_eq!(interpolate("${X-$Y}", &vars).unwrap(), "$Z");
    }

    #[test]
    fn test_default_with_malformed_variable_name() {
        // `${X-$}` and friends degrade to the missing-variable rule
        assert_eq!(interpolate("${X-$}", &Mapping::new()).unwrap(), "");
        assert_eq!(interpolate("${X-$1bad}", &Mapping::new()).unwrap(), "");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let vars = mapping(&[("X", "${Y}"), ("Y", "nested")]);
        assert_eq!(interpolate("${X}", &vars).unwrap(), "${Y}");
    }

    #[test]
    fn test_escape() {
        assert_eq!(interpolate("$$", &Mapping::new()).unwrap(), "$");
        assert_eq!(interpolate("cost: $$5", &Mapping::new()).unwrap(), "cost: $5");
    }

    #[test]
    fn test_escape_does_not_trigger_lookup() {
        let vars = mapping(&[("X", "v")]);
        assert_eq!(interpolate("$$X", &vars).unwrap(), "$X");
    }

    #[test]
    fn test_escape_then_reference() {
        let vars = mapping(&[("HOME", "/root")]);
        assert_eq!(interpolate("$$$HOME", &vars).unwrap(), "$/root");
    }

    #[test]
    fn test_invalid_fails_atomically() {
        let vars = mapping(&[("X", "v")]);
        for text in ["${", "${}", "$", "$1", "ok ${X} then ${bad"] {
            let err = interpolate(text, &vars).unwrap_err();
            match err.kind {
                ErrorKind::Interpolation { template, .. } => assert_eq!(template, text),
                other => panic!("Expected Interpolation kind, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_reports_first_fragment() {
        let err = interpolate("a ${} b $2 c", &Mapping::new()).unwrap_err();
        match err.kind {
            ErrorKind::Interpolation { fragment, .. } => assert_eq!(fragment, "${}"),
            other => panic!("Expected Interpolation kind, got {:?}", other),
        }
    }

    #[test]
    fn test_keep_prefix_passthrough() {
        let vars = mapping(&[("MOLECULE_FOO", "v"), ("OTHER", "o")]);
        let interpolator = Interpolator::new(&vars).with_keep_prefix("MOLECULE_");

        // Exempted references pass through in their original form
        assert_eq!(
            interpolator.interpolate("${MOLECULE_FOO}").unwrap(),
            "${MOLECULE_FOO}"
        );
        assert_eq!(
            interpolator.interpolate("$MOLECULE_FOO").unwrap(),
            "$MOLECULE_FOO"
        );
        assert_eq!(
            interpolator.interpolate("${MOLECULE_FOO-d}").unwrap(),
            "${MOLECULE_FOO-d}"
        );
        // Others resolve normally in the same pass
        assert_eq!(
            interpolator.interpolate("${MOLECULE_FOO}/${OTHER}").unwrap(),
            "${MOLECULE_FOO}/o"
        );
    }

    #[test]
    fn test_idempotent_on_resolved_output() {
        let vars = mapping(&[("HOST", "localhost"), ("PORT", "5432")]);
        let once = interpolate("host: ${HOST}\nport: ${PORT-5432}\n", &vars).unwrap();
        assert_eq!(interpolate(&once, &vars).unwrap(), once);
    }

    #[test]
    fn test_deterministic() {
        let vars = mapping(&[("A", "1"), ("B", "2")]);
        let text = "${A}-${B}-${C:-3}";
        assert_eq!(
            interpolate(text, &vars).unwrap(),
            interpolate(text, &vars).unwrap()
        );
    }

    #[test]
    fn test_yaml_document_round_trip() {
        let vars = mapping(&[
            ("DRIVER_NAME", "podman"),
            ("INSTANCE_NAME", ""),
        ]);
        let text = "driver:\n  name: ${DRIVER_NAME:-docker}\nplatforms:\n  - name: ${INSTANCE_NAME:-instance}\n";
        assert_eq!(
            interpolate(text, &vars).unwrap(),
            "driver:\n  name: podman\nplatforms:\n  - name: instance\n"
        );
    }
}

use crate::{
    BlankNode, BlankNodeIdParseError, IriParseError, LanguageTagParseError, Literal, NamedNode,
    Quad, QuadShapeError, Term, Variable, VariableNameParseError,
};
use std::borrow::Cow;
use std::str::{Chars, FromStr};

/// Deepest `<< >>` nesting accepted. Deeper inputs are rejected before they can overflow the stack.
const MAX_NUMBER_OF_NESTED_QUADS: usize = 128;

impl FromStr for NamedNode {
    type Err = TermParseError;

    /// Parses a named node from its N-Quads serialization
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::NamedNode;
    ///
    /// assert_eq!(
    ///     NamedNode::from_str("<http://example.com>")?,
    ///     NamedNode::new("http://example.com")?
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (term, left) = read_named_node(s)?;
        if !left.is_empty() {
            return Err(Self::Err::msg(
                "Named node serialization should end with a >",
            ));
        }
        Ok(term)
    }
}

impl FromStr for BlankNode {
    type Err = TermParseError;

    /// Parses a blank node from its N-Quads serialization
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::BlankNode;
    ///
    /// assert_eq!(BlankNode::from_str("_:ex")?, BlankNode::new("ex")?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (term, left) = read_blank_node(s)?;
        if !left.is_empty() {
            return Err(Self::Err::msg(
                "Blank node serialization should not contain whitespaces",
            ));
        }
        Ok(term)
    }
}

impl FromStr for Literal {
    type Err = TermParseError;

    /// Parses a literal from its N-Quads serialization
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::{Literal, NamedNode};
    ///
    /// assert_eq!(
    ///     Literal::from_str("\"ex\\n\"")?,
    ///     Literal::new_simple_literal("ex\n")
    /// );
    /// assert_eq!(
    ///     Literal::from_str("\"ex\"@en")?,
    ///     Literal::new_language_tagged_literal("ex", "en")?
    /// );
    /// assert_eq!(
    ///     Literal::from_str("\"2020\"^^<http://www.w3.org/2001/XMLSchema#gYear>")?,
    ///     Literal::new_typed_literal(
    ///         "2020",
    ///         NamedNode::new("http://www.w3.org/2001/XMLSchema#gYear")?
    ///     )
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (term, left) = read_literal(s)?;
        if !left.is_empty() {
            return Err(Self::Err::msg("Invalid literal serialization"));
        }
        Ok(term)
    }
}

impl FromStr for Variable {
    type Err = TermParseError;

    /// Parses a variable from its SPARQL serialization
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::Variable;
    ///
    /// assert_eq!(Variable::from_str("$foo")?, Variable::new("foo")?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(name) = s.strip_prefix(['?', '$']) else {
            return Err(Self::Err::msg(
                "Variable serialization should start with ? or $",
            ));
        };
        Self::new(name).map_err(|error| {
            TermParseError(TermParseErrorKind::Variable {
                value: s.to_owned(),
                error,
            })
        })
    }
}

impl FromStr for Term {
    type Err = TermParseError;

    /// Parses a term from its N-Quads serialization
    ///
    /// Quad terms are written between `<<` and `>>` and the empty string is the default graph.
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::*;
    ///
    /// assert_eq!(
    ///     Term::from_str("\"ex\"")?,
    ///     Literal::new_simple_literal("ex").into()
    /// );
    /// assert_eq!(Term::from_str("")?, Term::DefaultGraph);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::DefaultGraph);
        }
        let (term, left) = read_term(s, 0)?;
        if !left.trim().is_empty() {
            return Err(Self::Err::msg("Invalid term serialization"));
        }
        Ok(term)
    }
}

impl FromStr for Quad {
    type Err = TermParseError;

    /// Parses a quad from its N-Quads serialization
    ///
    /// ```
    /// use std::str::FromStr;
    /// use yardf::*;
    ///
    /// assert_eq!(
    ///     Quad::from_str("_:a <http://example.com/p> \"o\" .")?,
    ///     Quad::new_default_graph(
    ///         BlankNode::new("a")?,
    ///         NamedNode::new("http://example.com/p")?,
    ///         Literal::new_simple_literal("o"),
    ///     )?
    /// );
    /// assert_eq!(
    ///     Quad::from_str("_:a <http://example.com/p> \"o\" <http://example.com/g> .")?,
    ///     Quad::new(
    ///         BlankNode::new("a")?,
    ///         NamedNode::new("http://example.com/p")?,
    ///         Literal::new_simple_literal("o"),
    ///         NamedNode::new("http://example.com/g")?
    ///     )?
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (quad, left) = read_quad(s, 0)?;
        if !matches!(left.trim(), "" | ".") {
            return Err(Self::Err::msg("Invalid quad serialization"));
        }
        Ok(quad)
    }
}

fn read_named_node(s: &str) -> Result<(NamedNode, &str), TermParseError> {
    let Some(remain) = s.trim().strip_prefix('<') else {
        return Err(TermParseError::msg(
            "Named node serialization should start with a <",
        ));
    };
    let Some((value, remain)) = remain.split_once('>') else {
        return Err(TermParseError::msg(
            "Named node serialization should end with a >",
        ));
    };
    let value = unescape_iri(value)?;
    let node = NamedNode::new(value.as_ref()).map_err(|error| {
        TermParseError(TermParseErrorKind::Iri {
            value: value.into_owned(),
            error,
        })
    })?;
    Ok((node, remain))
}

/// Decodes the `\uXXXX` and `\UXXXXXXXX` escapes allowed in IRIs. Other backslashes are kept.
fn unescape_iri(value: &str) -> Result<Cow<'_, str>, TermParseError> {
    if !value.contains('\\') {
        return Ok(Cow::Borrowed(value));
    }
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => unescaped.push(read_hexa_char(&mut chars, 4)?),
            Some('U') => unescaped.push(read_hexa_char(&mut chars, 8)?),
            Some(c) => {
                unescaped.push('\\');
                unescaped.push(c);
            }
            None => unescaped.push('\\'),
        }
    }
    Ok(Cow::Owned(unescaped))
}

fn read_blank_node(s: &str) -> Result<(BlankNode, &str), TermParseError> {
    let Some(remain) = s.trim().strip_prefix("_:") else {
        return Err(TermParseError::msg(
            "Blank node serialization should start with '_:'",
        ));
    };
    let (id, remain) = remain.split_at(blank_node_id_len(remain));
    let node = BlankNode::new(id).map_err(|error| {
        TermParseError(TermParseErrorKind::BlankNode {
            value: id.to_owned(),
            error,
        })
    })?;
    Ok((node, remain))
}

/// Length of the blank node identifier at the start of `s`.
///
/// The identifier stops at whitespace or punctuation, before `..` and never includes a final `.`.
fn blank_node_id_len(s: &str) -> usize {
    let mut len = s
        .find(|c: char| c.is_whitespace() || "<>?$\"'@^:(){}[]".contains(c))
        .unwrap_or(s.len());
    if let Some(dots) = s[..len].find("..") {
        len = dots;
    }
    if s[..len].ends_with('.') {
        len -= 1;
    }
    len
}

fn read_variable(s: &str) -> Result<(Variable, &str), TermParseError> {
    let Some(remain) = s.trim().strip_prefix(['?', '$']) else {
        return Err(TermParseError::msg(
            "Variable serialization should start with ? or $",
        ));
    };
    let len = remain
        .find(|c: char| {
            c != '_'
                && !c.is_alphanumeric()
                && !matches!(c, '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
        })
        .unwrap_or(remain.len());
    let (name, remain) = remain.split_at(len);
    let variable = Variable::new(name).map_err(|error| {
        TermParseError(TermParseErrorKind::Variable {
            value: name.to_owned(),
            error,
        })
    })?;
    Ok((variable, remain))
}

fn read_literal(s: &str) -> Result<(Literal, &str), TermParseError> {
    let s = s.trim();
    let Some(s) = s.strip_prefix('"') else {
        return Err(TermParseError::msg(
            "Literal serialization should start with a \"",
        ));
    };
    let mut value = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let remain = chars.as_str().trim();
                return if let Some(remain) = remain.strip_prefix('@') {
                    let end = remain
                        .find(|v: char| !v.is_ascii_alphanumeric() && v != '-')
                        .unwrap_or(remain.len());
                    let (language, remain) = remain.split_at(end);
                    Ok((
                        Literal::new_language_tagged_literal(value, language).map_err(
                            |error| {
                                TermParseError(TermParseErrorKind::LanguageTag {
                                    value: language.to_owned(),
                                    error,
                                })
                            },
                        )?,
                        remain,
                    ))
                } else if let Some(remain) = remain.strip_prefix("^^") {
                    let (datatype, remain) = read_named_node(remain)?;
                    Ok((Literal::new_typed_literal(value, datatype), remain))
                } else {
                    Ok((Literal::new_simple_literal(value), remain))
                };
            }
            '\\' => {
                if let Some(c) = chars.next() {
                    value.push(match c {
                        't' => '\t',
                        'b' => '\u{08}',
                        'n' => '\n',
                        'r' => '\r',
                        'f' => '\u{0C}',
                        '"' => '"',
                        '\'' => '\'',
                        '\\' => '\\',
                        'u' => read_hexa_char(&mut chars, 4)?,
                        'U' => read_hexa_char(&mut chars, 8)?,
                        _ => return Err(TermParseError::msg("Unexpected escaped char")),
                    })
                } else {
                    return Err(TermParseError::msg("Unexpected literal end"));
                }
            }
            _ => value.push(c),
        }
    }
    Err(TermParseError::msg("Unexpected literal end"))
}

fn read_term(s: &str, depth: usize) -> Result<(Term, &str), TermParseError> {
    if depth == MAX_NUMBER_OF_NESTED_QUADS {
        return Err(TermParseError::msg(format!(
            "Quad terms are nested more than {MAX_NUMBER_OF_NESTED_QUADS} times"
        )));
    }
    let s = s.trim();
    if let Some(remain) = s.strip_prefix("<<") {
        let (quad, remain) = read_quad(remain, depth + 1)?;
        let Some(remain) = remain.trim_start().strip_prefix(">>") else {
            return Err(TermParseError::msg(
                "Quad term serialization must be enclosed between << and >>",
            ));
        };
        return Ok((quad.into(), remain));
    }
    match s.chars().next() {
        Some('<') => read_named_node(s).map(|(node, remain)| (node.into(), remain)),
        Some('_') => read_blank_node(s).map(|(node, remain)| (node.into(), remain)),
        Some('?' | '$') => read_variable(s).map(|(variable, remain)| (variable.into(), remain)),
        Some('"') => read_literal(s).map(|(literal, remain)| (literal.into(), remain)),
        Some(_) => Err(TermParseError::msg(format!(
            "Unexpected term serialization start: {s}"
        ))),
        None => Err(TermParseError::msg("Empty term serialization")),
    }
}

/// Reads `subject predicate object [graph]` and stops before the final `.` or `>>`.
fn read_quad(s: &str, depth: usize) -> Result<(Quad, &str), TermParseError> {
    let (subject, remain) = read_term(s, depth)?;
    let (predicate, remain) = read_term(remain, depth)?;
    let (object, remain) = read_term(remain, depth)?;
    let remain = remain.trim_start();
    let (graph_name, remain) =
        if remain.is_empty() || remain.starts_with('.') || remain.starts_with(">>") {
            (Term::DefaultGraph, remain)
        } else {
            read_term(remain, depth)?
        };
    let quad = Quad::new(subject, predicate, object, graph_name)
        .map_err(|error| TermParseError(TermParseErrorKind::Shape(error)))?;
    Ok((quad, remain))
}

fn read_hexa_char(input: &mut Chars<'_>, len: usize) -> Result<char, TermParseError> {
    let mut code_point = 0;
    for _ in 0..len {
        let c = input
            .next()
            .ok_or_else(|| TermParseError::msg("Unexpected end of a unicode escape"))?;
        let digit = c.to_digit(16).ok_or_else(|| {
            TermParseError::msg(format!("Unexpected character in a unicode escape: {c}"))
        })?;
        code_point = code_point * 16 + digit;
    }
    char::from_u32(code_point).ok_or_else(|| {
        TermParseError::msg(format!("Invalid encoded unicode code point: {code_point:X}"))
    })
}

/// An error raised during term serialization parsing using the [`FromStr`] trait.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct TermParseError(#[from] TermParseErrorKind);

/// An internal error raised during term serialization parsing using the [`FromStr`] trait.
#[derive(Debug, thiserror::Error)]
enum TermParseErrorKind {
    #[error("Error while parsing the named node '{value}': {error}")]
    Iri { error: IriParseError, value: String },
    #[error("Error while parsing the blank node '{value}': {error}")]
    BlankNode {
        error: BlankNodeIdParseError,
        value: String,
    },
    #[error("Error while parsing the language tag '{value}': {error}")]
    LanguageTag {
        error: LanguageTagParseError,
        value: String,
    },
    #[error("Error while parsing the variable '{value}': {error}")]
    Variable {
        error: VariableNameParseError,
        value: String,
    },
    #[error(transparent)]
    Shape(QuadShapeError),
    #[error("{0}")]
    Msg(String),
}

impl TermParseError {
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self(TermParseErrorKind::Msg(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_terms_parsing() {
        assert_eq!(
            Term::from_str("\"ex\\u00E9\\U000000E9\"").unwrap(),
            Literal::new_simple_literal("ex\u{e9}\u{e9}").into()
        );
        assert_eq!(
            Term::from_str("<http://example.com/\\u00E9\\U000000E9>").unwrap(),
            NamedNode::new_unchecked("http://example.com/\u{e9}\u{e9}").into()
        );
        assert_eq!(
            Term::from_str("\"a\\\"b\"@EN-gb").unwrap(),
            Literal::new_language_tagged_literal_unchecked("a\"b", "en-gb").into()
        );
    }

    #[test]
    fn variable_parsing() {
        assert_eq!(
            Term::from_str("?foo").unwrap(),
            Variable::new_unchecked("foo").into()
        );
        let quad = Quad::from_str("?s ?p ?o ?g .").unwrap();
        assert_eq!(quad.graph_name(), &Variable::new_unchecked("g").into());
        Variable::from_str("foo").unwrap_err();
    }

    #[test]
    fn quad_term_parsing() {
        let quad = Quad::from_str(
            "<< _:s <http://example.com/p> \"o\" _:g >> <http://example.com/p> _:o .",
        )
        .unwrap();
        let Term::Quad(inner) = quad.subject() else {
            panic!("expected a quad term, found {}", quad.subject())
        };
        assert_eq!(inner.graph_name(), &BlankNode::new_unchecked("g").into());
        assert!(quad.graph_name().is_default_graph());
        assert_eq!(
            quad.to_string(),
            "<< _:s <http://example.com/p> \"o\" _:g >> <http://example.com/p> _:o"
        );
    }

    #[test]
    fn shape_errors() {
        Quad::from_str("\"s\" <http://example.com/p> <http://example.com/o> .").unwrap_err();
        Quad::from_str("_:s _:p <http://example.com/o> .").unwrap_err();
        Quad::from_str("_:s <http://example.com/p> <http://example.com/o> \"g\" .").unwrap_err();
        Quad::from_str("_:s <http://example.com/p> .").unwrap_err();
        Quad::from_str("").unwrap_err();
    }

    #[test]
    fn round_trip_display() {
        for line in [
            "<http://example.com/s> <http://example.com/p> \"a\\nb\"@en <http://example.com/g>",
            "_:b0 <http://example.com/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer>",
            "?s ?p ?o",
        ] {
            assert_eq!(Quad::from_str(line).unwrap().to_string(), line);
        }
    }

    #[test]
    fn blank_node_id_end() {
        assert_eq!(blank_node_id_len("b0 ."), 2);
        assert_eq!(blank_node_id_len("b0."), 2);
        assert_eq!(blank_node_id_len("a.b>>"), 3);
        assert_eq!(blank_node_id_len("a..b"), 1);
        assert_eq!(
            Quad::from_str("_:a <http://example.com/p> _:b.").unwrap().object(),
            &BlankNode::new_unchecked("b").into()
        );
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut line = String::from("<http://example.com/s>");
        for _ in 0..MAX_NUMBER_OF_NESTED_QUADS {
            line = format!("<< {line} <http://example.com/p> <http://example.com/o> >>");
        }
        Term::from_str(&line).unwrap_err();
    }
}

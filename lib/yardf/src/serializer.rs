use crate::literal::print_quoted_str;
use crate::term::{Quad, Term};
use std::borrow::Borrow;
use std::fmt::{self, Write};

/// Writes terms and quads using the [N-Quads](https://www.w3.org/TR/n-quads/) syntax.
///
/// Quad terms are written between `<<` and `>>` and variables with a leading `?`.
///
/// The prefix used for blank nodes is configurable:
/// ```
/// use yardf::*;
///
/// let serializer = TermSerializer::new().with_blank_node_prefix("_:c14n");
/// assert_eq!(
///     serializer.term_to_string(&BlankNode::new("0")?.into()),
///     "_:c14n0"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TermSerializer<'a> {
    blank_node_prefix: &'a str,
}

impl Default for TermSerializer<'_> {
    #[inline]
    fn default() -> Self {
        Self {
            blank_node_prefix: "_:",
        }
    }
}

impl<'a> TermSerializer<'a> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the string written before each blank node identifier. It is `_:` by default.
    #[inline]
    #[must_use]
    pub fn with_blank_node_prefix(mut self, prefix: &'a str) -> Self {
        self.blank_node_prefix = prefix;
        self
    }

    pub fn write_term(&self, term: &Term, f: &mut impl Write) -> fmt::Result {
        match term {
            Term::NamedNode(node) => write!(f, "<{}>", node.as_str()),
            Term::BlankNode(node) => write!(f, "{}{}", self.blank_node_prefix, node.as_str()),
            Term::Literal(literal) => {
                print_quoted_str(literal.value(), f)?;
                if let Some(language) = literal.language() {
                    write!(f, "@{language}")
                } else if let Some(datatype) = literal.explicit_datatype() {
                    write!(f, "^^<{}>", datatype.as_str())
                } else {
                    Ok(())
                }
            }
            Term::Variable(variable) => write!(f, "?{}", variable.as_str()),
            Term::DefaultGraph => Ok(()),
            Term::Quad(quad) => {
                f.write_str("<< ")?;
                self.write_statement(quad, f)?;
                f.write_str(" >>")
            }
        }
    }

    /// Writes the terms of the quad separated by spaces, without the final dot.
    ///
    /// The graph name is omitted if it is the default graph.
    pub fn write_statement(&self, quad: &Quad, f: &mut impl Write) -> fmt::Result {
        self.write_term(quad.subject(), f)?;
        f.write_char(' ')?;
        self.write_term(quad.predicate(), f)?;
        f.write_char(' ')?;
        self.write_term(quad.object(), f)?;
        if !quad.graph_name().is_default_graph() {
            f.write_char(' ')?;
            self.write_term(quad.graph_name(), f)?;
        }
        Ok(())
    }

    /// Writes the quad as an N-Quads statement, with the final ` .` but without line jump.
    pub fn write_quad(&self, quad: &Quad, f: &mut impl Write) -> fmt::Result {
        self.write_statement(quad, f)?;
        f.write_str(" .")
    }

    pub fn term_to_string(&self, term: &Term) -> String {
        let mut buffer = String::new();
        // Writing to a String never fails
        let _ = self.write_term(term, &mut buffer);
        buffer
    }

    pub fn quad_to_string(&self, quad: &Quad) -> String {
        let mut buffer = String::new();
        let _ = self.write_quad(quad, &mut buffer);
        buffer
    }

    /// Serializes each quad as a line, sorts the lines in code point order and joins them.
    ///
    /// Each line is ended with `\n`.
    pub fn sorted_lines<Q: Borrow<Quad>>(&self, quads: impl IntoIterator<Item = Q>) -> String {
        let mut lines = quads
            .into_iter()
            .map(|quad| self.quad_to_string(quad.borrow()))
            .collect::<Vec<_>>();
        lines.sort_unstable();
        let mut output = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            output.push_str(&line);
            output.push('\n');
        }
        output
    }
}

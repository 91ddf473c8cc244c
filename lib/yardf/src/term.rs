use crate::blank_node::BlankNode;
use crate::literal::Literal;
use crate::named_node::NamedNode;
use crate::serializer::TermSerializer;
use crate::variable::Variable;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

/// The kind of a [`Term`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum TermKind {
    NamedNode,
    BlankNode,
    Literal,
    Variable,
    DefaultGraph,
    Quad,
}

impl TermKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NamedNode => "NamedNode",
            Self::BlankNode => "BlankNode",
            Self::Literal => "Literal",
            Self::Variable => "Variable",
            Self::DefaultGraph => "DefaultGraph",
            Self::Quad => "Quad",
        }
    }
}

impl fmt::Display for TermKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any value that could be stored in a [`Quad`] slot.
///
/// The default string formatter is returning an N-Quads compatible representation,
/// quad terms are written between `<<` and `>>`:
/// ```
/// use yardf::*;
///
/// let ex = NamedNode::new("http://example.com")?;
/// let quad = Quad::new_default_graph(ex.clone(), ex.clone(), ex)?;
/// assert_eq!(
///     Term::from(quad).to_string(),
///     "<< <http://example.com> <http://example.com> <http://example.com> >>"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
    DefaultGraph,
    Quad(Box<Quad>),
}

impl Term {
    #[inline]
    pub fn kind(&self) -> TermKind {
        match self {
            Self::NamedNode(_) => TermKind::NamedNode,
            Self::BlankNode(_) => TermKind::BlankNode,
            Self::Literal(_) => TermKind::Literal,
            Self::Variable(_) => TermKind::Variable,
            Self::DefaultGraph => TermKind::DefaultGraph,
            Self::Quad(_) => TermKind::Quad,
        }
    }

    /// The string value of the term.
    ///
    /// It is the IRI of named nodes, the identifier of blank nodes, the lexical form of literals,
    /// the name of variables and the empty string for the default graph and quad terms.
    #[inline]
    pub fn value(&self) -> &str {
        match self {
            Self::NamedNode(node) => node.as_str(),
            Self::BlankNode(node) => node.as_str(),
            Self::Literal(literal) => literal.value(),
            Self::Variable(variable) => variable.as_str(),
            Self::DefaultGraph | Self::Quad(_) => "",
        }
    }

    #[inline]
    pub fn is_named_node(&self) -> bool {
        matches!(self, Self::NamedNode(_))
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    #[inline]
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }

    #[inline]
    pub fn is_quad(&self) -> bool {
        matches!(self, Self::Quad(_))
    }

    #[inline]
    pub fn as_blank_node(&self) -> Option<&BlankNode> {
        match self {
            Self::BlankNode(node) => Some(node),
            _ => None,
        }
    }

    /// Calls `f` on every blank node of this term, including the ones nested in quad terms.
    pub fn for_each_blank_node(&self, f: &mut impl FnMut(&BlankNode)) {
        match self {
            Self::BlankNode(node) => f(node),
            Self::Quad(quad) => {
                for term in quad.terms() {
                    term.for_each_blank_node(f);
                }
            }
            Self::NamedNode(_) | Self::Literal(_) | Self::Variable(_) | Self::DefaultGraph => (),
        }
    }

    /// Returns a copy of this term where each blank node has been replaced by the output of `f`.
    #[must_use]
    pub fn map_blank_nodes(&self, f: &mut impl FnMut(&BlankNode) -> BlankNode) -> Self {
        match self {
            Self::BlankNode(node) => Self::BlankNode(f(node)),
            Self::Quad(quad) => Self::Quad(Box::new(quad.map_blank_nodes(f))),
            Self::NamedNode(_) | Self::Literal(_) | Self::Variable(_) | Self::DefaultGraph => {
                self.clone()
            }
        }
    }
}

impl fmt::Display for Term {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TermSerializer::new().write_term(self, f)
    }
}

impl From<NamedNode> for Term {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Literal> for Term {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Variable> for Term {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<Quad> for Term {
    #[inline]
    fn from(quad: Quad) -> Self {
        Self::Quad(Box::new(quad))
    }
}

/// The four slots of a [`Quad`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum QuadPosition {
    Subject,
    Predicate,
    Object,
    Graph,
}

impl QuadPosition {
    /// Checks if a term of the given kind could be stored in this position.
    #[inline]
    pub const fn accepts(self, kind: TermKind) -> bool {
        matches!(
            (self, kind),
            (
                Self::Subject,
                TermKind::NamedNode | TermKind::BlankNode | TermKind::Variable | TermKind::Quad
            ) | (Self::Predicate, TermKind::NamedNode | TermKind::Variable)
                | (
                    Self::Object,
                    TermKind::NamedNode | TermKind::BlankNode | TermKind::Variable | TermKind::Literal
                )
                | (
                    Self::Graph,
                    TermKind::NamedNode
                        | TermKind::BlankNode
                        | TermKind::Variable
                        | TermKind::DefaultGraph
                )
        )
    }
}

impl fmt::Display for QuadPosition {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Graph => "graph",
        })
    }
}

/// A [triple](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-triple) in an [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
///
/// Each slot only accepts some term kinds:
/// * subject: named node, blank node, variable or quad;
/// * predicate: named node or variable;
/// * object: named node, blank node, variable or literal;
/// * graph: named node, blank node, variable or the default graph.
///
/// The default string formatter is returning an N-Quads compatible representation without the final dot:
/// ```
/// use yardf::*;
///
/// assert_eq!(
///     "<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g>",
///     Quad::new(
///         NamedNode::new("http://example.com/s")?,
///         NamedNode::new("http://example.com/p")?,
///         NamedNode::new("http://example.com/o")?,
///         NamedNode::new("http://example.com/g")?,
///     )?
///     .to_string()
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Quad {
    subject: Term,
    predicate: Term,
    object: Term,
    graph_name: Term,
}

impl Quad {
    /// Builds a quad, checking that each term is allowed in its position.
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
        graph_name: impl Into<Term>,
    ) -> Result<Self, QuadShapeError> {
        let quad = Self::new_unchecked(
            subject.into(),
            predicate.into(),
            object.into(),
            graph_name.into(),
        );
        for (position, term) in quad.positions() {
            if !position.accepts(term.kind()) {
                return Err(QuadShapeError {
                    position,
                    kind: term.kind(),
                });
            }
        }
        Ok(quad)
    }

    /// Builds a quad in the default graph.
    #[inline]
    pub fn new_default_graph(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Result<Self, QuadShapeError> {
        Self::new(subject, predicate, object, Term::DefaultGraph)
    }

    #[inline]
    pub(crate) fn new_unchecked(
        subject: Term,
        predicate: Term,
        object: Term,
        graph_name: Term,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph_name,
        }
    }

    #[inline]
    pub fn subject(&self) -> &Term {
        &self.subject
    }

    #[inline]
    pub fn predicate(&self) -> &Term {
        &self.predicate
    }

    #[inline]
    pub fn object(&self) -> &Term {
        &self.object
    }

    /// The graph the triple is in, [`Term::DefaultGraph`] for the default graph.
    #[inline]
    pub fn graph_name(&self) -> &Term {
        &self.graph_name
    }

    /// The terms of the quad in subject, predicate, object, graph order.
    #[inline]
    pub fn terms(&self) -> [&Term; 4] {
        [
            &self.subject,
            &self.predicate,
            &self.object,
            &self.graph_name,
        ]
    }

    #[inline]
    pub fn positions(&self) -> [(QuadPosition, &Term); 4] {
        [
            (QuadPosition::Subject, &self.subject),
            (QuadPosition::Predicate, &self.predicate),
            (QuadPosition::Object, &self.object),
            (QuadPosition::Graph, &self.graph_name),
        ]
    }

    #[inline]
    pub fn into_parts(self) -> (Term, Term, Term, Term) {
        (self.subject, self.predicate, self.object, self.graph_name)
    }

    /// Returns a copy of this quad where each blank node has been replaced by the output of `f`.
    #[must_use]
    pub fn map_blank_nodes(&self, f: &mut impl FnMut(&BlankNode) -> BlankNode) -> Self {
        // Blank nodes are replaced by blank nodes so the shape stays valid
        Self::new_unchecked(
            self.subject.map_blank_nodes(f),
            self.predicate.map_blank_nodes(f),
            self.object.map_blank_nodes(f),
            self.graph_name.map_blank_nodes(f),
        )
    }
}

impl fmt::Display for Quad {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TermSerializer::new().write_statement(self, f)
    }
}

/// An error raised when a term is used in a [`Quad`] position that does not accept its kind.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("{kind} terms are not allowed in {position} position")]
pub struct QuadShapeError {
    position: QuadPosition,
    kind: TermKind,
}

impl QuadShapeError {
    #[inline]
    pub fn position(&self) -> QuadPosition {
        self.position
    }

    #[inline]
    pub fn kind(&self) -> TermKind {
        self.kind
    }
}

#[cfg(feature = "serde")]
impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Term {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Quad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Quad {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn quad_shape_validation() {
        Quad::new(ex("s"), ex("p"), ex("o"), Term::DefaultGraph).unwrap();
        Quad::new(
            BlankNode::default(),
            Variable::new_unchecked("p"),
            Literal::from("o"),
            BlankNode::default(),
        )
        .unwrap();

        let error =
            Quad::new(Literal::from("s"), ex("p"), ex("o"), Term::DefaultGraph).unwrap_err();
        assert_eq!(error.position(), QuadPosition::Subject);
        assert_eq!(error.kind(), TermKind::Literal);

        let error =
            Quad::new(ex("s"), BlankNode::default(), ex("o"), Term::DefaultGraph).unwrap_err();
        assert_eq!(error.position(), QuadPosition::Predicate);

        let error =
            Quad::new(ex("s"), ex("p"), Term::DefaultGraph, Term::DefaultGraph).unwrap_err();
        assert_eq!(error.position(), QuadPosition::Object);

        let error = Quad::new(ex("s"), ex("p"), ex("o"), Literal::from("g")).unwrap_err();
        assert_eq!(error.position(), QuadPosition::Graph);
        assert_eq!(error.to_string(), "Literal terms are not allowed in graph position");
    }

    #[test]
    fn quad_term_as_subject() {
        let inner = Quad::new_default_graph(ex("s"), ex("p"), ex("o")).unwrap();
        Quad::new_default_graph(inner.clone(), ex("p"), ex("o")).unwrap();
        Quad::new_default_graph(ex("s"), ex("p"), inner).unwrap_err();
    }

    #[test]
    fn term_values() {
        assert_eq!(Term::from(ex("s")).value(), "http://example.com/s");
        assert_eq!(Term::from(BlankNode::new_unchecked("b")).value(), "b");
        assert_eq!(Term::from(Variable::new_unchecked("v")).value(), "v");
        assert_eq!(Term::DefaultGraph.value(), "");
    }

    #[test]
    fn term_equality_depends_on_kind() {
        assert_ne!(
            Term::from(BlankNode::new_unchecked("x")),
            Term::from(Variable::new_unchecked("x"))
        );
        assert_ne!(
            Term::from(Literal::new_simple_literal("x")),
            Term::from(Literal::new_language_tagged_literal_unchecked("x", "en"))
        );
    }

    #[test]
    fn nested_blank_nodes() {
        let inner = Quad::new_default_graph(
            BlankNode::new_unchecked("a"),
            ex("p"),
            BlankNode::new_unchecked("b"),
        )
        .unwrap();
        let outer = Quad::new(inner, ex("p"), ex("o"), BlankNode::new_unchecked("g")).unwrap();
        let mut found = Vec::new();
        for term in outer.terms() {
            term.for_each_blank_node(&mut |b| found.push(b.as_str().to_owned()));
        }
        assert_eq!(found, ["a", "b", "g"]);

        let renamed =
            outer.map_blank_nodes(&mut |b| BlankNode::new_unchecked(format!("x{}", b.as_str())));
        assert_eq!(
            renamed.to_string(),
            "<< _:xa <http://example.com/p> _:xb >> <http://example.com/p> <http://example.com/o> _:xg"
        );
    }
}

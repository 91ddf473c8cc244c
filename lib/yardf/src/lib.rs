#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod blank_node;
pub mod canonicalization;
pub mod dataset;
pub mod index;
mod interning;
mod issuer;
mod literal;
mod named_node;
mod parser;
mod permutation;
mod serializer;
mod term;
mod variable;
pub mod vocab;

pub use crate::blank_node::{BlankNode, BlankNodeIdParseError};
pub use crate::canonicalization::{CanonicalizationError, Canonicalizer, HashAlgorithm};
pub use crate::dataset::{Dataset, ImportError};
pub use crate::index::{GraphIndex, GraphPartition, IndexError, QuadIndex};
pub use crate::interning::{TermId, TermInterner};
pub use crate::issuer::IdentifierIssuer;
pub use crate::literal::Literal;
pub use crate::named_node::NamedNode;
pub use crate::parser::TermParseError;
pub use crate::permutation::for_each_permutation;
pub use crate::serializer::TermSerializer;
pub use crate::term::{Quad, QuadPosition, QuadShapeError, Term, TermKind};
pub use crate::variable::{Variable, VariableNameParseError};
pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;

#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use std::collections::BTreeSet;
use std::error::Error;
use yardf::*;

fn knows() -> NamedNode {
    NamedNode::new_unchecked("http://example.com/knows")
}

fn node(id: &str) -> BlankNode {
    BlankNode::new_unchecked(id)
}

fn link(from: &str, to: &str) -> Quad {
    Quad::new_default_graph(node(from), knows(), node(to)).unwrap()
}

/// Every ordered pair of distinct nodes among `ids`.
fn complete_graph(ids: &[&str]) -> Vec<Quad> {
    let mut quads = Vec::new();
    for from in ids {
        for to in ids {
            if from != to {
                quads.push(link(from, to));
            }
        }
    }
    quads
}

fn cycle(ids: &[&str]) -> Vec<Quad> {
    ids.iter()
        .zip(ids.iter().cycle().skip(1))
        .map(|(from, to)| link(from, to))
        .collect()
}

/// A shape with a chain hanging from a cycle and a few literals, so that first degree hashes are partly distinct.
fn mixed() -> Vec<Quad> {
    let mut quads = cycle(&["a", "b", "c", "d"]);
    quads.push(link("a", "e"));
    quads.push(link("e", "f"));
    quads.push(
        Quad::new(
            node("f"),
            NamedNode::new_unchecked("http://example.com/name"),
            Literal::new_simple_literal("f"),
            node("g"),
        )
        .unwrap(),
    );
    quads
}

fn rename(quads: &[Quad], prefix: &str) -> Vec<Quad> {
    quads
        .iter()
        .map(|quad| quad.map_blank_nodes(&mut |b| node(&format!("{prefix}{}", b.as_str()))))
        .collect()
}

#[test]
fn symmetric_two_cycle() -> Result<(), Box<dyn Error>> {
    let expected = "_:c14n0 <http://example.com/knows> _:c14n1 .\n_:c14n1 <http://example.com/knows> _:c14n0 .\n";
    for (x, y) in [("a", "b"), ("b", "a"), ("zz", "aa")] {
        let dataset = Dataset::from_iter([link(x, y), link(y, x)]);
        assert_eq!(dataset.to_canonical_string()?, expected);
    }
    Ok(())
}

#[test]
fn ground_dataset_is_unchanged() -> Result<(), Box<dyn Error>> {
    let ex = NamedNode::new("http://example.com/s")?;
    let dataset = Dataset::from_iter([Quad::new_default_graph(
        ex.clone(),
        knows(),
        Literal::new_language_tagged_literal("chat", "fr")?,
    )?]);
    assert_eq!(dataset.canonicalize()?, dataset);
    assert!(Canonicalizer::new().canonical_labels(&dataset)?.is_empty());
    Ok(())
}

#[test]
fn renaming_invariance() -> Result<(), Box<dyn Error>> {
    for quads in [
        mixed(),
        cycle(&["a", "b", "c", "d", "e", "f"]),
        complete_graph(&["a", "b", "c", "d"]),
    ] {
        let original = Dataset::from_iter(&quads);
        let renamed = Dataset::from_iter(rename(&quads, "renamed"));
        assert_ne!(original, renamed);
        assert_eq!(original.to_canonical_string()?, renamed.to_canonical_string()?);
        assert!(original.is_isomorphic(&renamed)?);
    }
    Ok(())
}

#[test]
fn insertion_order_invariance() -> Result<(), Box<dyn Error>> {
    let quads = mixed();
    let expected = Dataset::from_iter(&quads).to_canonical_string()?;
    let mut reversed = quads.clone();
    reversed.reverse();
    assert_eq!(Dataset::from_iter(&reversed).to_canonical_string()?, expected);
    let mut rotated = quads;
    rotated.rotate_left(3);
    assert_eq!(Dataset::from_iter(&rotated).to_canonical_string()?, expected);
    Ok(())
}

#[test]
fn labels_are_dense() -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::from_iter(mixed());
    let labels = Canonicalizer::new().canonical_labels(&dataset)?;
    assert_eq!(labels.len(), 7);
    let issued = labels
        .values()
        .map(|label| label.as_str().to_owned())
        .collect::<BTreeSet<_>>();
    let expected = (0..7).map(|i| format!("c14n{i}")).collect::<BTreeSet<_>>();
    assert_eq!(issued, expected);
    Ok(())
}

#[test]
fn distinguishes_non_isomorphic_datasets() -> Result<(), Box<dyn Error>> {
    let six_cycle = Dataset::from_iter(cycle(&["a", "b", "c", "d", "e", "f"]));
    let mut two_triangles = Dataset::from_iter(cycle(&["a", "b", "c"]));
    two_triangles.extend(cycle(&["d", "e", "f"]));
    assert_eq!(six_cycle.len(), two_triangles.len());
    assert!(!six_cycle.is_isomorphic(&two_triangles)?);
    Ok(())
}

#[test]
fn hash_algorithm_does_not_change_isomorphism() -> Result<(), Box<dyn Error>> {
    let quads = complete_graph(&["a", "b", "c"]);
    let canonicalizer = Canonicalizer::new().with_hash_algorithm(HashAlgorithm::Sha384);
    let first = canonicalizer.canonicalize(&Dataset::from_iter(&quads))?;
    let second = canonicalizer.canonicalize(&Dataset::from_iter(rename(&quads, "x")))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn permutation_limit() -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::from_iter(complete_graph(&["a", "b", "c"]));
    let error = Canonicalizer::new()
        .with_permutation_limit(1)
        .canonicalize(&dataset)
        .unwrap_err();
    assert!(matches!(
        error,
        CanonicalizationError::TooManyPermutations { nodes: 2, limit: 1 }
    ));
    assert_eq!(
        Canonicalizer::new()
            .with_permutation_limit(2)
            .canonicalize(&dataset)?,
        dataset.canonicalize()?
    );
    Ok(())
}

#[test]
fn depth_limit() -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::from_iter(complete_graph(&["a", "b", "c"]));
    let error = Canonicalizer::new()
        .with_depth_limit(0)
        .canonicalize(&dataset)
        .unwrap_err();
    assert!(matches!(
        error,
        CanonicalizationError::DepthLimitExceeded { limit: 0 }
    ));
    assert!(
        Canonicalizer::new()
            .with_depth_limit(8)
            .canonicalize(&dataset)
            .is_ok()
    );
    Ok(())
}

fn assert_canonical_form(input: &str, expected: &str) -> Result<(), Box<dyn Error>> {
    let dataset = input.parse::<Dataset>()?;
    assert_eq!(dataset.to_canonical_string()?, expected);
    Ok(())
}

#[test]
fn two_branches() -> Result<(), Box<dyn Error>> {
    assert_canonical_form(
        "<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#r> _:e1 .
_:e0 <http://example.com/#s> <http://example.com/#u> .
_:e1 <http://example.com/#t> <http://example.com/#u> .
",
        "<http://example.com/#p> <http://example.com/#q> _:c14n0 .
<http://example.com/#p> <http://example.com/#r> _:c14n1 .
_:c14n0 <http://example.com/#s> <http://example.com/#u> .
_:c14n1 <http://example.com/#t> <http://example.com/#u> .
",
    )
}

#[test]
fn two_branches_with_sha384() -> Result<(), Box<dyn Error>> {
    let dataset = "<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#r> _:e1 .
_:e0 <http://example.com/#s> <http://example.com/#u> .
_:e1 <http://example.com/#t> <http://example.com/#u> .
"
    .parse::<Dataset>()?;
    let canonical = Canonicalizer::new()
        .with_hash_algorithm(HashAlgorithm::Sha384)
        .canonicalize(&dataset)?;
    assert_eq!(
        canonical.to_string(),
        "<http://example.com/#p> <http://example.com/#q> _:c14n1 .
<http://example.com/#p> <http://example.com/#r> _:c14n0 .
_:c14n0 <http://example.com/#t> <http://example.com/#u> .
_:c14n1 <http://example.com/#s> <http://example.com/#u> .
"
    );
    Ok(())
}

#[test]
fn branches_joined_by_a_link() -> Result<(), Box<dyn Error>> {
    assert_canonical_form(
        "<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#q> _:e1 .
_:e0 <http://example.com/#p> _:e2 .
_:e1 <http://example.com/#p> _:e3 .
_:e2 <http://example.com/#r> _:e3 .
",
        "<http://example.com/#p> <http://example.com/#q> _:c14n2 .
<http://example.com/#p> <http://example.com/#q> _:c14n3 .
_:c14n0 <http://example.com/#r> _:c14n1 .
_:c14n2 <http://example.com/#p> _:c14n1 .
_:c14n3 <http://example.com/#p> _:c14n0 .
",
    )
}

#[test]
fn five_cycle() -> Result<(), Box<dyn Error>> {
    assert_canonical_form(
        "_:e0 <http://example.com/#p> _:e1 .
_:e1 <http://example.com/#p> _:e2 .
_:e2 <http://example.com/#p> _:e3 .
_:e3 <http://example.com/#p> _:e4 .
_:e4 <http://example.com/#p> _:e0 .
",
        "_:c14n0 <http://example.com/#p> _:c14n4 .
_:c14n1 <http://example.com/#p> _:c14n0 .
_:c14n2 <http://example.com/#p> _:c14n1 .
_:c14n3 <http://example.com/#p> _:c14n2 .
_:c14n4 <http://example.com/#p> _:c14n3 .
",
    )
}

#[test]
fn two_cycle_and_three_cycle() -> Result<(), Box<dyn Error>> {
    assert_canonical_form(
        "_:e0 <http://example.com/#p> _:e1 .
_:e1 <http://example.com/#p> _:e0 .
_:e2 <http://example.com/#p> _:e3 .
_:e3 <http://example.com/#p> _:e4 .
_:e4 <http://example.com/#p> _:e2 .
",
        "_:c14n0 <http://example.com/#p> _:c14n1 .
_:c14n1 <http://example.com/#p> _:c14n0 .
_:c14n2 <http://example.com/#p> _:c14n4 .
_:c14n3 <http://example.com/#p> _:c14n2 .
_:c14n4 <http://example.com/#p> _:c14n3 .
",
    )
}

#[test]
fn five_clique() -> Result<(), Box<dyn Error>> {
    let ids = ["e0", "e1", "e2", "e3", "e4"];
    let input = Dataset::from_iter(complete_graph(&ids))
        .to_string()
        .replace("http://example.com/knows", "http://example.com/#p");
    let expected = (0..5)
        .flat_map(|from| {
            (0..5)
                .filter(move |to| *to != from)
                .map(move |to| format!("_:c14n{from} <http://example.com/#p> _:c14n{to} .\n"))
        })
        .collect::<String>();
    assert_canonical_form(&input, &expected)
}

use crate::BlankNode;
use std::collections::BTreeMap;

/// Issues new blank node identifiers `{prefix}0`, `{prefix}1`... in the order blank nodes are given.
///
/// Cloning an issuer gives a fully independent copy.
/// ```
/// use yardf::*;
///
/// let mut issuer = IdentifierIssuer::new("c14n");
/// let a = BlankNode::new("a")?;
/// let b = BlankNode::new("b")?;
/// assert_eq!(issuer.issue(&b).as_str(), "c14n0");
/// assert_eq!(issuer.issue(&a).as_str(), "c14n1");
/// assert_eq!(issuer.issue(&b).as_str(), "c14n0");
/// assert_eq!(issuer.issued_order(), [b, a]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    prefix: String,
    counter: usize,
    issued: BTreeMap<BlankNode, BlankNode>,
    issued_order: Vec<BlankNode>,
}

impl IdentifierIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: BTreeMap::new(),
            issued_order: Vec::new(),
        }
    }

    /// Returns the identifier issued for `node`, issuing a new one if needed.
    pub fn issue(&mut self, node: &BlankNode) -> &BlankNode {
        self.issued.entry(node.clone()).or_insert_with(|| {
            let issued = BlankNode::new_unchecked(format!("{}{}", self.prefix, self.counter));
            self.counter += 1;
            self.issued_order.push(node.clone());
            issued
        })
    }

    #[inline]
    pub fn get(&self, node: &BlankNode) -> Option<&BlankNode> {
        self.issued.get(node)
    }

    #[inline]
    pub fn has(&self, node: &BlankNode) -> bool {
        self.issued.contains_key(node)
    }

    /// The blank nodes that got an identifier, in issuance order.
    #[inline]
    pub fn issued_order(&self) -> &[BlankNode] {
        &self.issued_order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.issued_order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issued_order.is_empty()
    }

    /// The map from the original blank nodes to the issued ones.
    #[inline]
    pub fn into_issued(self) -> BTreeMap<BlankNode, BlankNode> {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_in_order() {
        let mut issuer = IdentifierIssuer::new("c14n");
        let nodes = ["x", "y", "x", "z"].map(BlankNode::new_unchecked);
        let issued = nodes
            .iter()
            .map(|node| issuer.issue(node).as_str().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(issued, ["c14n0", "c14n1", "c14n0", "c14n2"]);
        assert_eq!(
            issuer.issued_order(),
            [nodes[0].clone(), nodes[1].clone(), nodes[3].clone()]
        );
    }

    #[test]
    fn copies_are_independent() {
        let a = BlankNode::new_unchecked("a");
        let b = BlankNode::new_unchecked("b");
        let mut issuer = IdentifierIssuer::new("b");
        issuer.issue(&a);
        let mut copy = issuer.clone();
        assert_eq!(copy.issue(&b).as_str(), "b1");
        assert!(!issuer.has(&b));
        assert_eq!(issuer.len(), 1);
        assert_eq!(issuer.issue(&b).as_str(), "b1");
        assert_eq!(copy.get(&a).map(BlankNode::as_str), Some("b0"));
    }
}

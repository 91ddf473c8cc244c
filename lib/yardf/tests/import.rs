#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use std::error::Error;
use std::io;
use yardf::*;

const FILE: &str = r#"<http://example.com/s> <http://example.com/p> "foo\nbar"@en .
_:b0 <http://example.com/p> "1"^^<http://www.w3.org/2001/XMLSchema#integer> <http://example.com/g> .
<< <http://example.com/s> <http://example.com/p> _:b0 >> <http://example.com/p> ?o _:g .
<http://example.com/s> <http://example.com/p> "foo\nbar"@en .
"#;

#[test]
fn import_counts_new_quads() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    assert_eq!(dataset.import_from_reader(FILE.as_bytes())?, 3);
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.import_from_reader(FILE.as_bytes())?, 0);

    let g = Term::from(NamedNode::new("http://example.com/g")?);
    let in_g = dataset.match_pattern(None, None, None, Some(&g));
    assert_eq!(in_g.len(), 1);
    assert!(in_g.all(|quad| quad.subject().is_blank_node() && quad.object().is_literal()));
    Ok(())
}

#[test]
fn import_round_trips_through_display() -> Result<(), Box<dyn Error>> {
    let dataset = FILE.parse::<Dataset>()?;
    let mut reloaded = Dataset::new();
    reloaded.import_from_reader(dataset.to_string().as_bytes())?;
    assert_eq!(reloaded, dataset);
    Ok(())
}

#[test]
fn empty_line_is_an_error() {
    let mut dataset = Dataset::new();
    let file = "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n\n<http://example.com/s> <http://example.com/p> <http://example.com/o2> .\n";
    let error = dataset.import_from_reader(file.as_bytes()).unwrap_err();
    assert!(matches!(error, ImportError::EmptyChunk { line: 2 }));
    assert_eq!(error.line(), Some(2));
    // The quads before the error stay
    assert_eq!(dataset.len(), 1);
}

#[test]
fn invalid_line_is_an_error() {
    let mut dataset = Dataset::new();
    let file = "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n\"s\" <http://example.com/p> <http://example.com/o> .\n";
    let error = dataset.import_from_reader(file.as_bytes()).unwrap_err();
    assert_eq!(error.line(), Some(2));
    assert!(matches!(error, ImportError::Parse { line: 2, .. }));
    assert!(error.to_string().starts_with("Invalid quad at line 2"));

    let error = io::Error::from(error);
    assert_eq!(error.kind(), io::ErrorKind::InvalidData);
}

#[cfg(feature = "async-tokio")]
#[tokio::test]
async fn async_import() -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::new();
    assert_eq!(
        dataset
            .import_from_tokio_async_reader(FILE.as_bytes())
            .await?,
        3
    );
    assert_eq!(dataset, FILE.parse::<Dataset>()?);

    let error = Dataset::new()
        .import_from_tokio_async_reader(b"\n".as_slice())
        .await
        .unwrap_err();
    assert_eq!(error.line(), Some(1));
    Ok(())
}

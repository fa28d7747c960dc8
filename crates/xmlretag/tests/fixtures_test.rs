use std::fs;

use xmlretag::{from_xml_str, to_xml_string};

#[test]
fn test_valid_fixtures_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let valid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/valid");
    for entry in fs::read_dir(valid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        let document = from_xml_str(&content)
            .map_err(|e| std::io::Error::other(format!("failed to parse {path:?}: {e}")))?;
        if to_xml_string(&document) != content {
            return Err(
                std::io::Error::other(format!("serialization not stable for {path:?}")).into(),
            );
        }
    }
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        if from_xml_str(&content).is_ok() {
            return Err(
                std::io::Error::other(format!("should fail to parse invalid file: {path:?}"))
                    .into(),
            );
        }
    }
    Ok(())
}

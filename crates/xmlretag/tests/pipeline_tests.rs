use std::fs;
use std::path::Path;

use xmlretag::{
    Category, ErrorKind, OverwritePolicy, PipelineConfig, RenameMode, TagMapping, XmlPipeline,
    from_xml_str, retag_file,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn mapping() -> TagMapping {
    [("foo", "bar"), ("baz", "qux")].into_iter().collect()
}

fn write_input(dir: &Path, name: &str, xml: &str) -> std::io::Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, xml)?;
    Ok(path)
}

#[test]
fn test_example_scenario() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(
        dir.path(),
        "input.xml",
        "<root><foo>1</foo><other>2</other></root>",
    )?;
    let mapping_path = dir.path().join("mapping.txt");
    fs::write(&mapping_path, "foo,bar\nbaz,qux\n")?;

    let output = retag_file(&input, &mapping_path)?;
    assert_eq!(output, dir.path().join("input_modified.xml"));
    assert_eq!(
        fs::read_to_string(&output)?,
        "<root><bar>1</bar><other>2</other></root>"
    );
    Ok(())
}

#[test]
fn test_empty_mapping_reproduces_input() -> TestResult {
    let dir = tempfile::tempdir()?;
    let xml = "<?xml version=\"1.0\"?>\n<root a=\"1\">\n  <foo>text &amp; more</foo>\n  <!-- c -->\n</root>\n";
    let input = write_input(dir.path(), "doc.xml", xml)?;

    let output = XmlPipeline::new().process(&input, &TagMapping::new())?;
    assert_eq!(output, dir.path().join("doc_modified.xml"));
    assert_eq!(fs::read_to_string(&output)?, xml);
    Ok(())
}

#[test]
fn test_output_structure_matches_input_apart_from_names() -> TestResult {
    let dir = tempfile::tempdir()?;
    let xml = "<root><baz id=\"7\"><foo>a</foo><![CDATA[x]]></baz><foo/></root>";
    let input = write_input(dir.path(), "doc.xml", xml)?;

    let outcome = XmlPipeline::new().process_with_report(&input, &mapping())?;
    assert!(outcome.written);
    assert_eq!(outcome.stats.renamed, 3);

    let written = from_xml_str(&fs::read_to_string(&outcome.output_path)?)?;
    let expected = from_xml_str(
        "<root><qux id=\"7\"><bar>a</bar><![CDATA[x]]></qux><bar/></root>",
    )?;
    assert_eq!(written, expected);
    Ok(())
}

#[test]
fn test_missing_input_produces_no_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("missing.xml");

    let err = XmlPipeline::new()
        .process(&input, &mapping())
        .err()
        .ok_or("expected an error")?;
    assert_eq!(err.kind(), &ErrorKind::FileNotFound);
    assert!(!dir.path().join("missing_modified.xml").exists());
    Ok(())
}

#[test]
fn test_malformed_input_is_parse_error_with_location() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "bad.xml", "<root>\n<foo></bar>\n</root>")?;

    let err = XmlPipeline::new()
        .process(&input, &mapping())
        .err()
        .ok_or("expected an error")?;
    assert_eq!(err.category(), Category::Parse);
    assert_eq!(err.path(), Some(input.as_path()));
    assert_eq!(err.span().start.line, 2);
    assert!(!dir.path().join("bad_modified.xml").exists());
    Ok(())
}

#[test]
fn test_existing_output_is_overwritten_by_default() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "in.xml", "<foo/>")?;
    fs::write(dir.path().join("in_modified.xml"), "stale")?;

    let output = XmlPipeline::new().process(&input, &mapping())?;
    assert_eq!(fs::read_to_string(output)?, "<bar/>");
    Ok(())
}

#[test]
fn test_reject_policy_keeps_existing_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "in.xml", "<foo/>")?;
    let existing = dir.path().join("in_modified.xml");
    fs::write(&existing, "keep me")?;

    let pipeline = XmlPipeline::with_config(PipelineConfig {
        overwrite: OverwritePolicy::Reject,
        ..PipelineConfig::default()
    });
    let err = pipeline
        .process(&input, &mapping())
        .err()
        .ok_or("expected an error")?;
    assert_eq!(err.kind(), &ErrorKind::OutputExists);
    assert_eq!(fs::read_to_string(&existing)?, "keep me");
    Ok(())
}

#[test]
fn test_version_policy_picks_free_name() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "in.xml", "<foo/>")?;
    fs::write(dir.path().join("in_modified.xml"), "first")?;

    let pipeline = XmlPipeline::with_config(PipelineConfig {
        overwrite: OverwritePolicy::Version,
        ..PipelineConfig::default()
    });
    let output = pipeline.process(&input, &mapping())?;
    assert_eq!(output, dir.path().join("in_modified_1.xml"));
    assert_eq!(fs::read_to_string(&output)?, "<bar/>");
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "in.xml", "<root><foo/><foo/></root>")?;

    let pipeline = XmlPipeline::with_config(PipelineConfig {
        rename_mode: RenameMode::DryRun,
        ..PipelineConfig::default()
    });
    let outcome = pipeline.process_with_report(&input, &mapping())?;
    assert!(!outcome.written);
    assert_eq!(outcome.stats.renamed, 2);
    assert_eq!(outcome.output_path, dir.path().join("in_modified.xml"));
    assert!(!outcome.output_path.exists());
    Ok(())
}

#[test]
fn test_input_file_is_untouched() -> TestResult {
    let dir = tempfile::tempdir()?;
    let xml = "<root><foo>1</foo></root>";
    let input = write_input(dir.path(), "in.xml", xml)?;

    XmlPipeline::new().process(&input, &mapping())?;
    assert_eq!(fs::read_to_string(&input)?, xml);
    Ok(())
}

#[test]
fn test_unwritable_directory_is_write_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), "in.xml", "<foo/>")?;
    // A directory squatting on the output name cannot be replaced by a file.
    fs::create_dir(dir.path().join("in_modified.xml"))?;

    let err = XmlPipeline::new()
        .process(&input, &mapping())
        .err()
        .ok_or("expected an error")?;
    assert_eq!(err.category(), Category::Write);
    Ok(())
}

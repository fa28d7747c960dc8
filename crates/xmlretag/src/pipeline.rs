//! Parse, rename, write

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{Error, ErrorKind, Result, Span};
use crate::mapping::TagMapping;
use crate::output::{self, OverwritePolicy, output_path_for};
use crate::rename::{RenameMode, RenameStats, TagRenamer};
use crate::xml::{Parser, ParserConfig, Writer, WriterConfig};

/// Configuration for [`XmlPipeline`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub parser: ParserConfig,
    pub writer: WriterConfig,
    pub rename_mode: RenameMode,
    pub overwrite: OverwritePolicy,
}

/// Result of a successful pipeline run
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Outcome {
    /// File written, or the file that would have been written in a dry run
    pub output_path: PathBuf,
    pub written: bool,
    pub stats: RenameStats,
}

/// Renames the tags of one XML file into a sibling `_modified` file
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlPipeline {
    config: Config,
}

impl XmlPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Rewrite `xml_path` and return the path of the new file
    pub fn process(&self, xml_path: impl AsRef<Path>, mapping: &TagMapping) -> Result<PathBuf> {
        self.process_with_report(xml_path, mapping)
            .map(|outcome| outcome.output_path)
    }

    #[instrument(skip_all, fields(xml = %xml_path.as_ref().display(), rules = mapping.len()))]
    pub fn process_with_report(
        &self,
        xml_path: impl AsRef<Path>,
        mapping: &TagMapping,
    ) -> Result<Outcome> {
        let xml_path = xml_path.as_ref();
        let input = read_input(xml_path)?;
        let (text, stats) = self
            .retag_bytes(&input, mapping)
            .map_err(|err| err.with_path(xml_path))?;

        let target = output_path_for(xml_path);
        if self.config.rename_mode == RenameMode::DryRun {
            info!(
                output = %target.display(),
                matches = stats.renamed,
                "dry run, nothing written"
            );
            return Ok(Outcome {
                output_path: target,
                written: false,
                stats,
            });
        }

        let output_path = output::write_atomic(&target, text.as_bytes(), self.config.overwrite)?;
        info!(
            output = %output_path.display(),
            renamed = stats.renamed,
            "wrote retagged document"
        );
        Ok(Outcome {
            output_path,
            written: true,
            stats,
        })
    }

    /// Retag an in-memory document, returning the serialized result
    pub fn retag_str(&self, xml: &str, mapping: &TagMapping) -> Result<(String, RenameStats)> {
        self.retag_bytes(xml.as_bytes(), mapping)
    }

    fn retag_bytes(&self, input: &[u8], mapping: &TagMapping) -> Result<(String, RenameStats)> {
        let document = Parser::with_config(input, self.config.parser).parse()?;
        let (document, stats) = TagRenamer::new(mapping)
            .with_mode(self.config.rename_mode)
            .rename(document);
        let text = Writer::with_config(self.config.writer).write(&document);
        Ok((text, stats))
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.is_dir() {
        return Err(Error::with_message(
            ErrorKind::FileNotFound,
            Span::empty(),
            "is a directory",
        )
        .with_path(path));
    }
    fs::read(path).map_err(|err| Error::read(path, &err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::DeclarationMode;

    fn mapping() -> TagMapping {
        [("foo", "bar"), ("baz", "qux")].into_iter().collect()
    }

    #[test]
    fn test_retag_str() -> Result<()> {
        let (text, stats) = XmlPipeline::new()
            .retag_str("<root><foo>1</foo><other>2</other></root>", &mapping())?;
        assert_eq!(text, "<root><bar>1</bar><other>2</other></root>");
        assert_eq!(stats.renamed, 1);
        Ok(())
    }

    #[test]
    fn test_retag_str_reports_parse_errors() {
        let err = XmlPipeline::new().retag_str("<root><foo></root>", &mapping()).err();
        assert!(matches!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MismatchedTag { .. })
        ));
    }

    #[test]
    fn test_retag_str_honours_writer_config() -> Result<()> {
        let pipeline = XmlPipeline::with_config(Config {
            writer: WriterConfig {
                declaration: DeclarationMode::Always,
            },
            ..Config::default()
        });
        let (text, _) = pipeline.retag_str("<foo/>", &mapping())?;
        assert_eq!(text, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<bar/>");
        Ok(())
    }

    #[test]
    fn test_missing_input_is_file_not_found() {
        let err = XmlPipeline::new()
            .process("definitely/not/here.xml", &mapping())
            .err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::FileNotFound));
    }
}

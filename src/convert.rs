//! Pre-conversion of word-processor `.doc` templates into XML.
//!
//! textpdf never parses `.doc` itself. An external command, named by the
//! `TEXTPDF_DOC_CONVERTER` environment variable, is run as
//! `CMD INPUT OUTPUT` and must write the XML template to `OUTPUT`.

use crate::error::PipelineError;
use log::{debug, info};
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

pub const CONVERTER_ENV: &str = "TEXTPDF_DOC_CONVERTER";

/// Turns a source document into an XML template on disk.
pub trait DocConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;
}

/// Runs an external program to do the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    /// Parses a command line such as `"doc2xml --utf8"`; the input and output
    /// paths are appended when it runs.
    pub fn new(command: &str) -> Result<Self, PipelineError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PipelineError::Config(format!("{} is empty", CONVERTER_ENV)))?;
        Ok(Self { program, args: parts.collect() })
    }

    pub fn from_env() -> Result<Self, PipelineError> {
        let command = std::env::var(CONVERTER_ENV).map_err(|_| {
            PipelineError::Config(format!("converting .doc templates requires {} to name a converter command", CONVERTER_ENV))
        })?;
        Self::new(&command)
    }
}

impl DocConverter for CommandConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        debug!("Running {} {:?} {} {}", self.program, self.args, input.display(), output.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(output)
            .status()
            .map_err(|e| PipelineError::Convert(format!("could not run '{}': {}", self.program, e)))?;
        if !status.success() {
            return Err(PipelineError::Convert(format!("'{}' exited with {}", self.program, status)));
        }
        Ok(())
    }
}

pub fn is_doc(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("doc"))
}

/// Converts `input` into a temporary XML file that is deleted when the
/// returned handle is dropped.
pub fn convert_to_temp(converter: &dyn DocConverter, input: &Path) -> Result<NamedTempFile, PipelineError> {
    let temp = tempfile::Builder::new().prefix("textpdf-").suffix(".xml").tempfile()?;
    converter.convert(input, temp.path())?;
    info!("Converted {} to a temporary XML template", input.display());
    Ok(temp)
}

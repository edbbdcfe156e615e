//! Entity extraction delegated to an external NER process
//!
//! The program is run once per affiliation. It receives the text on stdin
//! and must print a JSON array of spans on stdout:
//!
//! ```json
//! [{"text": "Institut Pasteur", "label": "ORG"}, {"text": "France", "label": "GPE"}]
//! ```
//!
//! `start`/`end` byte offsets are optional.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use crate::entities::{EntityExtractor, EntitySpan};
use crate::error::ExtractorError;

/// [`EntityExtractor`] backed by an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build from a command line split into program and arguments
    pub fn from_command_line(command: &[String]) -> Result<Self, ExtractorError> {
        let (program, args) = command.split_first().ok_or_else(|| {
            ExtractorError::InvalidRules("extractor command is empty".to_string())
        })?;
        Ok(Self::new(program.clone()).with_args(args.iter().cloned()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl EntityExtractor for CommandExtractor {
    fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ExtractorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ExtractorError::Unavailable(format!("failed to start {}: {}", self.program, e))
            })?;

        // Stdin is fed from its own thread so a child that answers before
        // reading everything cannot block on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_owned();
            thread::spawn(move || match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            })
        });

        let output = child.wait_with_output()?;
        let written = match writer {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))
            }),
            None => Ok(()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::Unavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        written.map_err(|e| {
            ExtractorError::Unavailable(format!("failed to write to {}: {}", self.program, e))
        })?;

        let spans: Vec<EntitySpan> = serde_json::from_slice(&output.stdout)?;
        tracing::trace!("{} returned {} spans", self.program, spans.len());
        Ok(spans)
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityLabel;

    #[test]
    fn test_missing_program_is_unavailable() {
        let extractor = CommandExtractor::new("impress-no-such-ner-binary");
        let result = extractor.extract_entities("Institut Pasteur, France");
        assert!(matches!(result, Err(ExtractorError::Unavailable(_))));
    }

    #[test]
    fn test_empty_command_line() {
        assert!(CommandExtractor::from_command_line(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_parses_json_spans() {
        let script = r#"cat > /dev/null; echo '[{"text":"Institut Pasteur","label":"ORG"},{"text":"France","label":"GPE","start":18,"end":24}]'"#;
        let extractor = CommandExtractor::new("sh").with_args(["-c", script]);
        let spans = extractor
            .extract_entities("Institut Pasteur, France")
            .unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].label, EntityLabel::Org);
        assert_eq!(spans[1].start, Some(18));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_json_output_is_invalid() {
        let extractor = CommandExtractor::new("cat");
        let result = extractor.extract_entities("not json");
        assert!(matches!(result, Err(ExtractorError::InvalidOutput(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_unavailable() {
        let extractor = CommandExtractor::new("sh").with_args(["-c", "echo model missing >&2; exit 3"]);
        let result = extractor.extract_entities("text");
        assert!(
            matches!(result, Err(ExtractorError::Unavailable(ref msg)) if msg.contains("model missing"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_child_ignoring_large_input_still_succeeds() {
        let extractor = CommandExtractor::new("sh").with_args(["-c", "echo '[]'"]);
        let text = "Institut Pasteur, Paris, France; ".repeat(60_000);
        let spans = extractor.extract_entities(&text).unwrap();
        assert!(spans.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_child_with_large_input_reports_stderr() {
        let extractor =
            CommandExtractor::new("sh").with_args(["-c", "echo model missing >&2; exit 3"]);
        let text = "x".repeat(2_000_000);
        let result = extractor.extract_entities(&text);
        assert!(
            matches!(result, Err(ExtractorError::Unavailable(ref msg)) if msg.contains("model missing"))
        );
    }
}

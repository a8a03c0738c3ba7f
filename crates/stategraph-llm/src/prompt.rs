//! Prompt templates with `{variable}` substitution

use std::collections::HashMap;
use thiserror::Error;

/// A template variable was not supplied
#[derive(Debug, Clone, Error)]
#[error("missing template variable '{0}'")]
pub struct MissingVariable(pub String);

/// A prompt template with `{name}` placeholders
///
/// # Examples
///
/// ```rust
/// use stategraph_llm::prompt::PromptTemplate;
///
/// let template = PromptTemplate::new(
///     "Given a job description, decide whether it suites a junior Java developer.\n\
///      JOB DESCRIPTION:\n{job_description}\n\nAnswer only YES or NO.",
/// );
/// let prompt = template.format(&[("job_description", "some jd")]).unwrap();
/// assert!(prompt.contains("some jd"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wrap a template string
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Substitute every placeholder, failing on any left unfilled
    pub fn format(&self, variables: &[(&str, &str)]) -> Result<String, MissingVariable> {
        let values: HashMap<&str, &str> = variables.iter().copied().collect();

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| MissingVariable(after.to_string()))?;
            let name = &after[..close];
            let value = values
                .get(name)
                .ok_or_else(|| MissingVariable(name.to_string()))?;
            out.push_str(value);
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

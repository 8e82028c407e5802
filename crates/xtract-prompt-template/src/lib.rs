//! Prompt templates for the xtract extraction cascade
//!
//! Two prompts drive every field: [`PromptKind::Extract`] (also reused verbatim by the
//! resolution step) and [`PromptKind::Validate`]. Templates use `{name}` placeholders;
//! `{{` and `}}` render as literal braces. Rendering is a single pass, so substituted
//! values are never re-scanned for placeholders.

use xtract_utils::error::PromptError;

/// Extraction prompt. Variables: `instructions`, `transcript`, `language`.
pub const EXTRACT_PROMPT: &str = concat!(
    "Given a transcript of a dialog between a doctor and a patient, you need to extract {instructions}\n",
    "<transcript>\n",
    "{transcript}\n",
    "</transcript>\n",
    "Return results in {language} language. \n",
    "Return the summary only. Make sure the summary contains relevant information only. \n",
    "If necessary information was missing or was impossible to extract then return 'NA'.\n",
);

/// Validation prompt. Variables: `language`, `extracted`, `instructions`, `transcript`.
pub const VALIDATE_PROMPT: &str = concat!(
    "Given a transcript of a dialog between a doctor and a patient, information extraction ",
    "instructions and the extracted information in {language} language. \n",
    "Validate for correctness, completeness and possible hallucinations of the extracted ",
    "information against the extraction instructions and the dialog transcript.\n",
    "\n",
    "<extracted_information>\n",
    "{extracted}\n",
    "</extracted_information>\n",
    "\n",
    "<extraction_instructions>\n",
    "{instructions}\n",
    "</extraction_instructions>\n",
    "\n",
    "<transcript>\n",
    "{transcript}\n",
    "</transcript>\n",
    "\n",
    "If extracted information is valid and has no hallucinations then return 'true', ",
    "else return 'false'. Return only 'true' or 'false'.\n",
);

/// The prompts known to xtract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Used by the extract and resolve steps
    Extract,
    /// Used by the validate step
    Validate,
}

impl PromptKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Validate => "validate",
        }
    }

    /// The template backing this prompt
    #[must_use]
    pub const fn template(&self) -> PromptTemplate {
        match self {
            Self::Extract => PromptTemplate::new(self.as_str(), EXTRACT_PROMPT),
            Self::Validate => PromptTemplate::new(self.as_str(), VALIDATE_PROMPT),
        }
    }
}

/// A named prompt text with `{placeholder}` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    text: &'static str,
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

impl PromptTemplate {
    #[must_use]
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn text(&self) -> &'static str {
        self.text
    }

    /// Placeholder names in order of first appearance
    ///
    /// # Errors
    ///
    /// Returns `PromptError::UnterminatedPlaceholder` if a `{name` is never closed.
    pub fn placeholders(&self) -> Result<Vec<&'static str>, PromptError> {
        let mut names: Vec<&'static str> = Vec::new();
        for segment in self.segments()? {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Substitute every placeholder with the matching value from `vars`.
    ///
    /// Unused variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::MissingVariable` if a placeholder has no value and
    /// `PromptError::UnterminatedPlaceholder` if the template itself is malformed.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let capacity = self.text.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>();
        let mut out = String::with_capacity(capacity);
        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = vars
                        .iter()
                        .find_map(|(key, value)| (*key == name).then_some(*value))
                        .ok_or_else(|| PromptError::MissingVariable {
                            prompt: self.name.to_string(),
                            name: name.to_string(),
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn segments(&self) -> Result<Vec<Segment<'static>>, PromptError> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                    segments.push(Segment::Literal(&text[literal_start..=i]));
                    i += 2;
                    literal_start = i;
                }
                b'{' => {
                    let name_start = i + 1;
                    let name_end = name_start
                        + bytes[name_start..]
                            .iter()
                            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                            .count();
                    if name_end == name_start {
                        // Not a placeholder; keep the brace as text
                        i += 1;
                        continue;
                    }
                    if bytes.get(name_end) != Some(&b'}') {
                        return Err(PromptError::UnterminatedPlaceholder {
                            prompt: self.name.to_string(),
                            offset: i,
                        });
                    }
                    segments.push(Segment::Literal(&text[literal_start..i]));
                    segments.push(Segment::Placeholder(&text[name_start..name_end]));
                    i = name_end + 1;
                    literal_start = i;
                }
                _ => i += 1,
            }
        }
        segments.push(Segment::Literal(&text[literal_start..]));
        Ok(segments)
    }
}

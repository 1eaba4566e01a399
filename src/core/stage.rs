//! Stage domain model

use crate::core::{
    document::{Document, DocumentField, DocumentView},
    templates,
};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Matches `{{ name }}` placeholders, tolerating missing inner spaces
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// A single stage in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Stable identifier used in configuration files
    pub id: String,

    /// Name used in the transcript and status display
    pub name: String,

    /// Document fields the prompt reads
    pub inputs: Vec<DocumentField>,

    /// Document field this stage owns
    pub output: DocumentField,

    /// Prompt template with `{{ field }}` placeholders
    pub prompt_template: String,

    /// Pipeline variables substituted alongside the document fields
    pub variables: HashMap<String, String>,

    /// Status message announced when work starts
    pub start_message: String,

    /// Message announced when the output is handed over
    pub handover_message: String,
}

impl Stage {
    pub fn new(id: &str, name: &str, output: DocumentField) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            inputs: Vec::new(),
            output,
            prompt_template: String::new(),
            variables: HashMap::new(),
            start_message: format!("{} started", name),
            handover_message: format!("{} finished", name),
        }
    }

    pub fn with_inputs(mut self, inputs: &[DocumentField]) -> Self {
        self.inputs = inputs.to_vec();
        self
    }

    pub fn with_prompt(mut self, template: &str) -> Self {
        self.prompt_template = template.to_string();
        self
    }

    pub fn with_messages(mut self, start: &str, handover: &str) -> Self {
        self.start_message = start.to_string();
        self.handover_message = handover.to_string();
        self
    }

    /// Bind pipeline variables for prompt rendering
    ///
    /// Names that collide with document fields are ignored; the template
    /// itself is left untouched.
    pub fn bind_variables(mut self, variables: &HashMap<String, String>) -> Self {
        self.variables = variables
            .iter()
            .filter(|(name, _)| name.parse::<DocumentField>().is_err())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self
    }

    /// Restrict the document to this stage's declared inputs
    pub fn view_of<'a>(&self, document: &'a Document) -> DocumentView<'a> {
        document.view(&self.inputs)
    }

    /// Render the prompt from the declared inputs and bound variables
    ///
    /// Pure: the result depends only on the template, the variables and the
    /// view. Values are inserted in a single pass, so placeholder-like text
    /// inside a field or a variable is never expanded.
    pub fn build_prompt(&self, view: &DocumentView<'_>) -> String {
        placeholder_regex()
            .replace_all(&self.prompt_template, |caps: &Captures| {
                let name = &caps[1];
                match name.parse::<DocumentField>() {
                    Ok(field) => view.get(field).to_string(),
                    Err(_) => self
                        .variables
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string()),
                }
            })
            .into_owned()
    }

    /// Unique placeholder names in the template, sorted
    pub fn placeholders(&self) -> Vec<String> {
        placeholder_regex()
            .captures_iter(&self.prompt_template)
            .map(|caps| caps[1].to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether `placeholder` resolves to a declared input or a bound variable
    pub fn resolves(&self, placeholder: &str) -> bool {
        match placeholder.parse::<DocumentField>() {
            Ok(field) => self.inputs.contains(&field),
            Err(_) => self.variables.contains_key(placeholder),
        }
    }
}

/// The six built-in lifecycle stages, in pipeline order
pub fn sdlc_stages(variables: &HashMap<String, String>) -> Vec<Stage> {
    use DocumentField::*;

    vec![
        Stage::new("requirements", "Requirements", Requirements)
            .with_prompt(templates::REQUIREMENTS_PROMPT)
            .with_messages(templates::REQUIREMENTS_START, templates::REQUIREMENTS_HANDOVER),
        Stage::new("design", "Design", Design)
            .with_inputs(&[Requirements])
            .with_prompt(templates::DESIGN_PROMPT)
            .with_messages(templates::DESIGN_START, templates::DESIGN_HANDOVER),
        Stage::new("development", "Development", Code)
            .with_inputs(&[Design])
            .with_prompt(templates::DEVELOPMENT_PROMPT)
            .with_messages(templates::DEVELOPMENT_START, templates::DEVELOPMENT_HANDOVER),
        Stage::new("code_review", "CodeReview", Review)
            .with_inputs(&[Code])
            .with_prompt(templates::CODE_REVIEW_PROMPT)
            .with_messages(templates::CODE_REVIEW_START, templates::CODE_REVIEW_HANDOVER),
        Stage::new("testing", "Testing", Tests)
            .with_inputs(&[Code, Review])
            .with_prompt(templates::TESTING_PROMPT)
            .with_messages(templates::TESTING_START, templates::TESTING_HANDOVER),
        Stage::new("deployment", "Deployment", Deploy)
            .with_inputs(&[Requirements, Design, Code, Review, Tests])
            .with_prompt(templates::DEPLOYMENT_PROMPT)
            .with_messages(templates::DEPLOYMENT_START, templates::DEPLOYMENT_HANDOVER),
    ]
    .into_iter()
    .map(|stage| stage.bind_variables(variables))
    .collect()
}

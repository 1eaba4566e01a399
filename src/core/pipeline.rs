//! Pipeline domain model

use crate::core::{
    document::DocumentField,
    stage::{sdlc_stages, Stage},
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Static wiring errors in a stage list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Pipeline has no stages")]
    Empty,

    #[error("Duplicate stage ID: {0}")]
    DuplicateStage(String),

    #[error("Field '{field}' is written by both '{first}' and '{second}'")]
    SharedOutput {
        field: DocumentField,
        first: String,
        second: String,
    },

    #[error("Stage '{stage}' reads '{field}', which no earlier stage produces")]
    ForwardRead { stage: String, field: DocumentField },

    #[error("Stage '{stage}' prompt references '{placeholder}', which is neither a declared input nor a variable")]
    UndeclaredPlaceholder { stage: String, placeholder: String },
}

/// An ordered, fixed list of stages sharing one document
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Stages in execution order
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }

    /// The built-in six-stage lifecycle pipeline
    pub fn sdlc(variables: &HashMap<String, String>) -> Self {
        Self::new("Software Lifecycle", sdlc_stages(variables))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Find a stage by its configuration ID
    pub fn stage_by_id(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Name of the stage after `index`, if there is one
    pub fn next_stage_name(&self, index: usize) -> Option<String> {
        self.stages.get(index + 1).map(|s| s.name.clone())
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Check the static ordering properties of the stage list
    ///
    /// Every input must be owned by a strictly earlier stage, every field
    /// has at most one owner, and templates only reference declared inputs or
    /// bound variables.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::Empty);
        }

        let mut seen_ids = HashSet::new();
        let mut owners: HashMap<DocumentField, &str> = HashMap::new();

        for stage in &self.stages {
            if !seen_ids.insert(stage.id.as_str()) {
                return Err(PipelineError::DuplicateStage(stage.id.clone()));
            }

            for input in &stage.inputs {
                if !owners.contains_key(input) {
                    return Err(PipelineError::ForwardRead {
                        stage: stage.id.clone(),
                        field: *input,
                    });
                }
            }

            for placeholder in stage.placeholders() {
                if !stage.resolves(&placeholder) {
                    return Err(PipelineError::UndeclaredPlaceholder {
                        stage: stage.id.clone(),
                        placeholder,
                    });
                }
            }

            if let Some(first) = owners.insert(stage.output, stage.id.as_str()) {
                return Err(PipelineError::SharedOutput {
                    field: stage.output,
                    first: first.to_string(),
                    second: stage.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("scenario".to_string(), "a todo app".to_string());
        vars
    }

    #[test]
    fn test_sdlc_pipeline_is_valid() {
        let pipeline = Pipeline::sdlc(&vars());
        assert_eq!(pipeline.len(), 6);
        assert_eq!(pipeline.validate(), Ok(()));
        assert_eq!(
            pipeline.stage_names(),
            vec!["Requirements", "Design", "Development", "CodeReview", "Testing", "Deployment"]
        );
    }

    #[test]
    fn test_next_stage_name() {
        let pipeline = Pipeline::sdlc(&vars());
        assert_eq!(pipeline.next_stage_name(0).as_deref(), Some("Design"));
        assert_eq!(pipeline.next_stage_name(5), None);
    }

    #[test]
    fn test_reordered_stages_are_rejected() {
        let mut pipeline = Pipeline::sdlc(&vars());
        pipeline.stages.swap(1, 2);

        assert_eq!(
            pipeline.validate(),
            Err(PipelineError::ForwardRead {
                stage: "development".to_string(),
                field: DocumentField::Design,
            })
        );
    }

    #[test]
    fn test_self_read_is_rejected() {
        let stage = Stage::new("loop", "Loop", DocumentField::Requirements)
            .with_inputs(&[DocumentField::Requirements]);
        let pipeline = Pipeline::new("bad", vec![stage]);

        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::ForwardRead { .. })
        ));
    }

    #[test]
    fn test_undeclared_placeholder_is_rejected() {
        let mut pipeline = Pipeline::sdlc(&vars());
        pipeline.stages[1].prompt_template = "{{ requirements }} {{ code }}".to_string();

        assert_eq!(
            pipeline.validate(),
            Err(PipelineError::UndeclaredPlaceholder {
                stage: "design".to_string(),
                placeholder: "code".to_string(),
            })
        );
    }

    #[test]
    fn test_unbound_variable_is_rejected() {
        let pipeline = Pipeline::sdlc(&HashMap::new());
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::UndeclaredPlaceholder { ref placeholder, .. }) if placeholder == "scenario"
        ));
    }

    #[test]
    fn test_braces_in_scenario_are_not_wiring() {
        let mut vars = HashMap::new();
        vars.insert(
            "scenario".to_string(),
            "a mustache renderer that expands {{ name }} and {{ requirements }}".to_string(),
        );

        assert_eq!(Pipeline::sdlc(&vars).validate(), Ok(()));
    }

    #[test]
    fn test_shared_output_is_rejected() {
        let a = Stage::new("a", "A", DocumentField::Requirements);
        let b = Stage::new("b", "B", DocumentField::Requirements);
        let pipeline = Pipeline::new("dup", vec![a, b]);

        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::SharedOutput { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_and_empty() {
        let a = Stage::new("a", "A", DocumentField::Requirements);
        let b = Stage::new("a", "B", DocumentField::Design);
        assert_eq!(
            Pipeline::new("dup", vec![a, b]).validate(),
            Err(PipelineError::DuplicateStage("a".to_string()))
        );
        assert_eq!(Pipeline::new("none", vec![]).validate(), Err(PipelineError::Empty));
    }
}

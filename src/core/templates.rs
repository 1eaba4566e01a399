//! Default prompt templates and stage messages
//!
//! Placeholders use the `{{ name }}` form. Document fields are filled in at
//! run time from the stage's inputs; pipeline variables such as
//! `{{ scenario }}` are bound to the stage and filled in the same pass.

/// Project description handed to the requirements stage
pub const DEFAULT_SCENARIO: &str = "a CLI-based To-Do List application that can:
- add new tasks with descriptions
- list all tasks with their current status
- delete tasks by ID or description
- mark tasks as complete or incomplete
- edit existing task descriptions";

pub const REQUIREMENTS_PROMPT: &str = "You are a senior software analyst with expertise in requirements engineering.

Define comprehensive requirements for {{ scenario }}

Provide detailed functional and non-functional requirements in a professional format.
Include user stories, a story map, acceptance criteria, and technical constraints.
Format the output as a structured requirements document.";

pub const DESIGN_PROMPT: &str = "You are a senior software architect with expertise in system design and Python development.

Based on these requirements:
{{ requirements }}

Design a system architecture that includes:
- an architecture overview
- every required function with its inputs and outputs
- data structures and their relationships
- program flow and user interaction patterns
- error handling and validation strategies
- CLI interface design
- security and performance considerations

Provide a technical design document a developer can implement directly.";

pub const DEVELOPMENT_PROMPT: &str = "You are a senior Python developer who writes clean, maintainable code.

Based on this system design:
{{ design }}

Write complete, production-ready Python code for the application with:
- an object-oriented structure
- every function specified in the design
- input validation and error handling
- a clear CLI menu and messages
- data persistence for the session
- comments and docstrings following PEP 8

Provide ONLY the executable Python code, without explanations or markdown formatting.";

pub const CODE_REVIEW_PROMPT: &str = "You are a senior code reviewer and technical lead.

Review this Python application:

{{ code }}

Report on:
1. Code quality, with an overall score and rationale
2. Security concerns
3. Performance issues
4. Bugs, logic errors and unhandled edge cases
5. Adherence to Python best practices
6. Maintainability and readability
7. Areas that need test focus
8. Concrete improvement and refactoring suggestions
9. Final verdict: ready for production or needs changes

Give actionable feedback the development team can implement.";

pub const TESTING_PROMPT: &str = "You are a senior QA engineer specialising in Python test automation.

Based on the application code and the review feedback:

CODE:
{{ code }}

REVIEW FEEDBACK:
{{ review }}

Write a test suite using Python's unittest framework covering unit tests, integration
tests, edge cases, input validation, error handling, state changes, CLI interaction
flows and regressions. Use mocks for external dependencies.

Provide ONLY the executable Python test code with setup and teardown.";

pub const DEPLOYMENT_PROMPT: &str = "You are a senior DevOps engineer responsible for software delivery and documentation.

Based on the complete project deliverables:

REQUIREMENTS: {{ requirements }}
DESIGN: {{ design }}
CODE: {{ code }}
REVIEW: {{ review }}
TESTS: {{ tests }}

Create a release package containing a README, system requirements, installation guide,
user manual, developer guide, testing instructions, troubleshooting guide, performance
notes, security guidelines, release notes, support information and licensing notes.

Format it as a professional software release package.";

pub const REQUIREMENTS_START: &str = "Starting requirements analysis for the project...";
pub const REQUIREMENTS_HANDOVER: &str =
    "Requirements analysis complete! Handing the requirements document over.";

pub const DESIGN_START: &str =
    "Received handover from Requirements. Starting system architecture design...";
pub const DESIGN_HANDOVER: &str =
    "System architecture design completed! Handing the technical blueprint over.";

pub const DEVELOPMENT_START: &str = "Received handover from Design. Starting code implementation...";
pub const DEVELOPMENT_HANDOVER: &str =
    "Code implementation finished! Handing the code over for quality assurance.";

pub const CODE_REVIEW_START: &str =
    "Received handover from Development. Conducting a comprehensive code review...";
pub const CODE_REVIEW_HANDOVER: &str =
    "Code review completed with detailed analysis! Handing over for test suite creation.";

pub const TESTING_START: &str =
    "Received handover from Code Review. Creating a comprehensive test suite...";
pub const TESTING_HANDOVER: &str =
    "Test suite completed! Handing over for final deployment preparation.";

pub const DEPLOYMENT_START: &str =
    "Received handover from Testing. Preparing deployment documentation and final package...";
pub const DEPLOYMENT_HANDOVER: &str =
    "Deployment preparation completed! Full lifecycle finished, project ready for release.";

//! AuditBlueprint - Config Loader output
//!
//! Describes a complete audit run: attribute pools, résumé rendering, batch
//! design, prompt shape, model access, statistics and output location.
//! Every section defaults to the reference experiment, so an empty file is a
//! valid blueprint.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::Role;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete audit blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AuditBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub personas: PersonaConfig,

    #[serde(default)]
    pub resumes: ResumeConfig,

    #[serde(default)]
    #[validate(nested)]
    pub batches: BatchConfig,

    #[serde(default)]
    #[validate(nested)]
    pub prompts: PromptConfig,

    #[serde(default)]
    #[validate(nested)]
    pub model: ModelConfig,

    #[serde(default)]
    #[validate(nested)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// One protected attribute and its value pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AttributeSpec {
    /// Attribute name (e.g. "race")
    #[validate(length(min = 1))]
    pub name: String,

    /// Values crossed into the persona set, in order
    #[validate(length(min = 1))]
    pub values: Vec<String>,

    /// Reference group for AIR and significance tests
    pub reference: String,

    /// Values counted towards the `marginalized` flag
    #[serde(default)]
    pub marginalized: Vec<String>,
}

impl AttributeSpec {
    pub fn new(name: &str, values: &[&str], reference: &str, marginalized: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            reference: reference.to_string(),
            marginalized: marginalized.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Persona generation settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PersonaConfig {
    /// Seed for sampling and candidate-profile choices
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Neutral personas appended after the cue-bearing cross product
    #[serde(default = "default_neutral_count")]
    pub neutral_count: usize,

    /// Marginalized attribute values needed to set the `marginalized` flag
    #[serde(default = "default_marginalized_threshold")]
    #[validate(range(min = 1))]
    pub marginalized_threshold: usize,

    /// Keep only a seeded sample of the cross product (None = all)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub sample: Option<usize>,

    /// Attribute pools
    #[serde(default = "default_attributes")]
    #[validate(length(min = 1), nested)]
    pub attributes: Vec<AttributeSpec>,
}

impl PersonaConfig {
    /// Spec for the named attribute
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Size of the full cue-bearing cross product
    pub fn cross_product_size(&self) -> usize {
        self.attributes.iter().map(|a| a.values.len()).product()
    }

    /// Personas a run will produce
    pub fn persona_count(&self) -> usize {
        let cue = self.cross_product_size();
        self.sample.map_or(cue, |s| s.min(cue)) + self.neutral_count
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            neutral_count: default_neutral_count(),
            marginalized_threshold: default_marginalized_threshold(),
            sample: None,
            attributes: default_attributes(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_neutral_count() -> usize {
    14
}

fn default_marginalized_threshold() -> usize {
    3
}

fn default_attributes() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec::new("gender", &["male", "female"], "male", &["female"]),
        AttributeSpec::new(
            "race",
            &["white", "black", "asian", "hispanic"],
            "white",
            &["black", "asian", "hispanic"],
        ),
        AttributeSpec::new(
            "religion",
            &["christian", "muslim", "none"],
            "christian",
            &["muslim"],
        ),
        AttributeSpec::new("class", &["higher", "lower"], "higher", &["lower"]),
        AttributeSpec::new("lgbtq", &["yes", "no"], "no", &["yes"]),
    ]
}

/// Résumé rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeConfig {
    /// Directory holding `software_engineer.tmpl` / `hr_generalist.tmpl`
    /// overrides (None = built-in templates)
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Roles to render and audit
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            roles: default_roles(),
        }
    }
}

fn default_roles() -> Vec<Role> {
    Role::ALL.to_vec()
}

/// Batch composition settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchConfig {
    /// Candidates per ranking request
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 2))]
    pub batch_size: usize,

    /// Global reshuffles of the persona set
    #[serde(default = "default_shuffles")]
    #[validate(range(min = 1))]
    pub shuffles: usize,

    /// In-batch orderings of each base batch
    #[serde(default = "default_permutations")]
    #[validate(range(min = 1))]
    pub permutations: usize,

    /// Composition seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            shuffles: default_shuffles(),
            permutations: default_permutations(),
            seed: default_seed(),
        }
    }
}

fn default_batch_size() -> usize {
    11
}

fn default_shuffles() -> usize {
    10
}

fn default_permutations() -> usize {
    3
}

/// Prompt settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromptConfig {
    /// Candidates the model is asked to shortlist
    #[serde(default = "default_shortlist_size")]
    #[validate(range(min = 1))]
    pub shortlist_size: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            shortlist_size: default_shortlist_size(),
        }
    }
}

fn default_shortlist_size() -> usize {
    3
}

/// Ranking model backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    /// Google Generative Language API
    #[default]
    Gemini,
    /// Offline deterministic model
    Mock,
}

/// Model access and pacing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    #[serde(default = "default_model_name")]
    #[validate(length(min = 1))]
    pub model_name: String,

    /// API base URL (without the `/models/...` suffix)
    #[serde(default = "default_endpoint")]
    #[validate(length(min = 1))]
    pub endpoint: String,

    /// Environment variable holding comma-separated API keys
    #[serde(default = "default_api_keys_env")]
    pub api_keys_env: String,

    /// Prompts sent with one key before rotating to the next
    #[serde(default = "default_prompts_per_key")]
    #[validate(range(min = 1))]
    pub prompts_per_key: usize,

    /// Attempts per prompt before recording a terminal failure
    #[serde(default = "default_max_retries")]
    #[validate(range(min = 1, max = 10))]
    pub max_retries: u32,

    /// Backoff before retry `n` is `backoff_base_secs ^ n`
    #[serde(default = "default_backoff_base_secs")]
    #[validate(range(min = 1.0))]
    pub backoff_base_secs: f64,

    /// Upper bound honoured for a `Retry-After` header
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Pause between consecutive prompts
    #[serde(default = "default_request_delay_secs")]
    #[validate(range(min = 0.0, max = 3600.0))]
    pub request_delay_secs: f64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    #[validate(range(min = 1))]
    pub max_output_tokens: u32,

    /// Seed of the mock provider
    #[serde(default = "default_mock_seed")]
    pub mock_seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            model_name: default_model_name(),
            endpoint: default_endpoint(),
            api_keys_env: default_api_keys_env(),
            prompts_per_key: default_prompts_per_key(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            max_retry_after_secs: default_max_retry_after_secs(),
            request_delay_secs: default_request_delay_secs(),
            timeout_secs: default_timeout_secs(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            mock_seed: default_mock_seed(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_keys_env() -> String {
    "GOOGLE_API_KEYS".to_string()
}

fn default_prompts_per_key() -> usize {
    450
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_secs() -> f64 {
    1.5
}

fn default_max_retry_after_secs() -> u64 {
    120
}

fn default_request_delay_secs() -> f64 {
    2.1
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_output_tokens() -> u32 {
    8000
}

fn default_mock_seed() -> u64 {
    7
}

/// Statistical settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    /// AIR below this value is flagged as adverse impact
    #[serde(default = "default_four_fifths")]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub four_fifths_threshold: f64,

    /// Familywise significance level for Holm-corrected p-values
    #[serde(default = "default_alpha")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub alpha: f64,

    #[serde(default = "default_gee_max_iter")]
    #[validate(range(min = 1))]
    pub gee_max_iter: usize,

    #[serde(default = "default_gee_tolerance")]
    #[validate(range(exclusive_min = 0.0))]
    pub gee_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            four_fifths_threshold: default_four_fifths(),
            alpha: default_alpha(),
            gee_max_iter: default_gee_max_iter(),
            gee_tolerance: default_gee_tolerance(),
        }
    }
}

fn default_four_fifths() -> f64 {
    0.8
}

fn default_alpha() -> f64 {
    0.05
}

fn default_gee_max_iter() -> usize {
    100
}

fn default_gee_tolerance() -> f64 {
    1e-8
}

/// Output location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.osaudit.toml` files. Every section has defaults matching the
//! operations team's current business rules, so the file is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".osaudit.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Team and analyst filters.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Analyst attribution rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Headline metric thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// AI assistant settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "osaudit_report.md".to_string()
}

/// Static team lists used by the pipeline and the offender buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Groups kept in the canonical record set (exact match).
    #[serde(default = "default_operational_groups")]
    pub operational_groups: Vec<String>,

    /// Analysts whose orders are tracked elsewhere.
    #[serde(default = "default_excluded_analysts")]
    pub excluded_analysts: Vec<String>,

    /// Groups doing field work (late field work bucket).
    #[serde(default = "default_field_groups")]
    pub field_groups: Vec<String>,

    /// Groups covered by the logistics sub-report (matched upper-cased).
    #[serde(default = "default_logistics_groups")]
    pub logistics_groups: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            operational_groups: default_operational_groups(),
            excluded_analysts: default_excluded_analysts(),
            field_groups: default_field_groups(),
            logistics_groups: default_logistics_groups(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_operational_groups() -> Vec<String> {
    strings(&[
        "CO",
        "PRESTADORES SERVICOS",
        "FIELD",
        "MANUTENCAO ADM",
        "SER MANUTENCAO CAMPO",
    ])
}

fn default_excluded_analysts() -> Vec<String> {
    strings(&["Layanne Soares", "Jackson Henrique", "Sandra Nascimento"])
}

fn default_field_groups() -> Vec<String> {
    strings(&["PRESTADORES SERVICOS", "SER MANUTENCAO CAMPO", "FIELD"])
}

fn default_logistics_groups() -> Vec<String> {
    strings(&[
        "LOG SAS BH",
        "LOG SAS SP",
        "STAGING",
        "LOGÍSTICA",
        "LOGISTICA",
        "LOG-EXPEDIÇÃO",
        "LOG-ARMAZÉM",
        "LOG-TRANSPORTE",
        "LOGISTICA OPERACIONAL",
    ])
}

/// How a conditional rule compares its literal against the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Case-sensitive starts-with.
    Prefix,
    /// Upper-cased field contains the (upper-case) literal.
    ContainsUpper,
}

/// A conditional attribution rule; the field is implied by its tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRuleConfig {
    pub kind: MatchKind,
    pub literal: String,
    pub analyst: String,
}

fn rule(kind: MatchKind, literal: &str, analyst: &str) -> ConditionalRuleConfig {
    ConditionalRuleConfig {
        kind,
        literal: literal.to_string(),
        analyst: analyst.to_string(),
    }
}

/// Analyst attribution tiers, evaluated in this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Technical-responsible code to analyst (exact match).
    #[serde(default = "default_technical_responsible")]
    pub technical_responsible: BTreeMap<String, String>,

    /// Rules on the partner name.
    #[serde(default = "default_partner_rules")]
    pub partner: Vec<ConditionalRuleConfig>,

    /// Rules on the economic group.
    #[serde(default = "default_economic_group_rules")]
    pub economic_group: Vec<ConditionalRuleConfig>,

    /// Rules on the financial project.
    #[serde(default = "default_financial_project_rules")]
    pub financial_project: Vec<ConditionalRuleConfig>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            technical_responsible: default_technical_responsible(),
            partner: default_partner_rules(),
            economic_group: default_economic_group_rules(),
            financial_project: default_financial_project_rules(),
        }
    }
}

fn default_technical_responsible() -> BTreeMap<String, String> {
    [
        ("ADRIANO_D", "Simone Pimenta"),
        ("ALEX_V", "Pedro Moreira"),
        ("DIVALDO_M", "Sandra Nascimento"),
        ("GABRIEL_C", "Tamires Merces"),
        ("GUSTAVO_FE", "Ana Carolina"),
        ("JULIMAR", "Nadja ou Marilia"),
        ("MARCELA_FE", "Ana Carolina"),
        ("MARIAL1687", "Pedro Moreira"),
        ("ROBSON_GIA", "Simone Pimenta"),
        ("THIAGO_L", "Pedro Moreira"),
        ("VAGNER", "Marilia Rosane"),
        ("VANESSA_PV", "Kelly Sanches"),
        ("WILSON", "Pedro Moreira"),
        ("DIEGO_V", "Nadja ou Marilia"),
    ]
    .into_iter()
    .map(|(code, analyst)| (code.to_string(), analyst.to_string()))
    .collect()
}

fn default_partner_rules() -> Vec<ConditionalRuleConfig> {
    vec![
        rule(MatchKind::Prefix, "NEC", "Valmeire Alves"),
        rule(MatchKind::ContainsUpper, "PABX OI", "Jackson Henrique"),
        rule(MatchKind::ContainsUpper, "OI - MG", "Tamires Merces"),
    ]
}

fn default_economic_group_rules() -> Vec<ConditionalRuleConfig> {
    vec![
        rule(MatchKind::ContainsUpper, "MINISTERIO PUBLICO -BH", "Layanne Soares"),
        rule(MatchKind::ContainsUpper, "ALGAR", "Pedro Moreira"),
    ]
}

fn default_financial_project_rules() -> Vec<ConditionalRuleConfig> {
    vec![
        rule(MatchKind::Prefix, "OI - UC4X", "Valmeire Alves"),
    ]
}

/// Headline metric thresholds. A value strictly above a limit trips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Total in-scope orders: warning above this.
    #[serde(default = "default_total_warning")]
    pub total_warning: usize,

    /// Total in-scope orders: critical above this.
    #[serde(default = "default_total_critical")]
    pub total_critical: usize,

    /// Pending orders (> 0 days): critical above this.
    #[serde(default = "default_bucket_critical")]
    pub pending_critical: usize,

    /// Overdue scheduled orders: critical above this.
    #[serde(default = "default_bucket_critical")]
    pub overdue_scheduled_critical: usize,

    /// Incorrectly closed orders: critical above this.
    #[serde(default)]
    pub incorrectly_closed_critical: usize,

    /// Average stalled days: critical above this.
    #[serde(default = "default_average_critical")]
    pub average_stalled_critical: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            total_warning: default_total_warning(),
            total_critical: default_total_critical(),
            pending_critical: default_bucket_critical(),
            overdue_scheduled_critical: default_bucket_critical(),
            incorrectly_closed_critical: 0,
            average_stalled_critical: default_average_critical(),
        }
    }
}

fn default_total_warning() -> usize {
    99
}

fn default_total_critical() -> usize {
    115
}

fn default_bucket_critical() -> usize {
    10
}

fn default_average_critical() -> f64 {
    3.0
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum records listed per offender bucket in Markdown.
    #[serde(default = "default_max_rows")]
    pub max_rows_per_bucket: usize,

    /// Include the logistics sub-report section.
    #[serde(default = "default_true")]
    pub include_logistics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_rows_per_bucket: default_max_rows(),
            include_logistics: true,
        }
    }
}

fn default_max_rows() -> usize {
    25
}

fn default_true() -> bool {
    true
}

/// Ollama-backed assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    120
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when the CLI provides an explicit value.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.assistant.model = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.assistant.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.assistant.timeout_seconds = timeout;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

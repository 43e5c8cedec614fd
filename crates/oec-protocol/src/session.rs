//! The session context data model (spec §3.1) — the single authoritative
//! record of one conversion run.
//!
//! `SessionContext` is intentionally a plain serializable record rather than
//! an object with hidden mutation points: the orchestrator's [`crate` store]
//! is the only writer of `workflow_stage`, `current_agent`, `agent_history`,
//! `requires_user_clarification`, and `clarification_prompt`; every other
//! field is populated by an agent-submitted [`crate::envelope::ContextPatch`]
//! that the orchestrator validates before applying. See spec §4.4.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::ids::SessionId;

/// The finite set of states a session moves through (spec §4.4 diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Initialized,
    CollectingMetadata,
    Converting,
    Evaluating,
    Completed,
    Failed,
}

impl WorkflowStage {
    /// The transition relation from spec §4.4's diagram. `None` as a "from"
    /// value represents session creation (`initialize`).
    ///
    /// `failed -> converting` (the clarify-and-retry edge) is included here;
    /// the orchestrator additionally requires that a `clarify` call supplied
    /// new input and cleared `requires_user_clarification` before taking it
    /// (that precondition lives in the orchestrator, not in this pure
    /// relation, since it depends on more than the two stage values).
    pub fn is_valid_transition(from: Option<WorkflowStage>, to: WorkflowStage) -> bool {
        use WorkflowStage::*;
        match (from, to) {
            (None, Initialized) => true,
            (Some(Initialized), CollectingMetadata) => true,
            (Some(CollectingMetadata), Converting) => true,
            (Some(Converting), Evaluating) => true,
            (Some(Converting), Failed) => true,
            (Some(Evaluating), Completed) => true,
            (Some(Evaluating), Failed) => true,
            (Some(Failed), Converting) => true,
            // Any stage may fail outright on an unhandled agent exception,
            // except the two terminal stages (completed is done; failed is
            // already failed — re-entering it is a no-op, not a transition).
            (Some(Initialized), Failed) => true,
            (Some(CollectingMetadata), Failed) => true,
            _ => false,
        }
    }

    /// The nominal completion percentage used by the status endpoint (§4.4).
    pub fn progress_percentage(&self) -> u8 {
        match self {
            WorkflowStage::Initialized => 10,
            WorkflowStage::CollectingMetadata => 30,
            WorkflowStage::Converting => 60,
            WorkflowStage::Evaluating => 80,
            WorkflowStage::Completed => 100,
            WorkflowStage::Failed => 0,
        }
    }

    /// Whether a session in this stage has an agent holding the execution
    /// slot (invariant 4, spec §3.1: `current_agent` is unset iff stage is
    /// one of `initialized`, `completed`, `failed`).
    pub fn expects_current_agent(&self) -> bool {
        matches!(
            self,
            WorkflowStage::CollectingMetadata | WorkflowStage::Converting | WorkflowStage::Evaluating
        )
    }
}

/// Confidence attached to each extracted or user-supplied metadata field
/// (spec §3.1 `metadata`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionConfidence {
    High,
    Medium,
    Low,
    /// A reasonable default was substituted because disambiguation was obvious.
    Default,
    /// No documentation was available and no default applied.
    Empty,
}

/// One NWB metadata field plus its extraction confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataField {
    pub value: Option<String>,
    pub confidence: ExtractionConfidence,
}

impl MetadataField {
    pub fn empty() -> Self {
        Self {
            value: None,
            confidence: ExtractionConfidence::Empty,
        }
    }

    pub fn with_value(value: impl Into<String>, confidence: ExtractionConfidence) -> Self {
        Self {
            value: Some(value.into()),
            confidence,
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

impl Default for MetadataField {
    fn default() -> Self {
        Self::empty()
    }
}

/// The ten NWB metadata fields extracted by the Conversation agent (spec
/// §4.5.1) or supplied by the user via `clarify`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NwbMetadata {
    pub subject_id: MetadataField,
    pub species: MetadataField,
    pub age: MetadataField,
    pub sex: MetadataField,
    pub session_start_time: MetadataField,
    pub experimenter: MetadataField,
    pub device_name: MetadataField,
    pub manufacturer: MetadataField,
    pub recording_location: MetadataField,
    pub description: MetadataField,
    /// Raw LLM output from the extraction call, kept verbatim for diagnosis
    /// even when JSON parsing of the structured fields above failed.
    pub llm_extraction_log: String,
}

impl NwbMetadata {
    /// Iterate the ten semantic fields (excludes `llm_extraction_log`), used
    /// by the Evaluation agent's metadata-completeness score (spec §4.5.3).
    pub fn fields(&self) -> [&MetadataField; 10] {
        [
            &self.subject_id,
            &self.species,
            &self.age,
            &self.sex,
            &self.session_start_time,
            &self.experimenter,
            &self.device_name,
            &self.manufacturer,
            &self.recording_location,
            &self.description,
        ]
    }

    /// Fraction of the ten fields that are present and non-empty, in [0, 1].
    pub fn completeness_score(&self) -> f64 {
        let present = self.fields().iter().filter(|f| f.is_present()).count();
        present as f64 / 10.0
    }

    /// Overlay `updates` onto `self`, giving precedence to `updates` for any
    /// field actually supplied — used by `handle_clarification` (spec
    /// §4.5.1), which must override prior extraction without touching fields
    /// the user didn't mention.
    pub fn apply_overrides(&mut self, updates: HashMap<String, String>) {
        for (field, value) in updates {
            let slot = match field.as_str() {
                "subject_id" => &mut self.subject_id,
                "species" => &mut self.species,
                "age" => &mut self.age,
                "sex" => &mut self.sex,
                "session_start_time" => &mut self.session_start_time,
                "experimenter" => &mut self.experimenter,
                "device_name" => &mut self.device_name,
                "manufacturer" => &mut self.manufacturer,
                "recording_location" => &mut self.recording_location,
                "description" => &mut self.description,
                _ => continue,
            };
            *slot = MetadataField::with_value(value, ExtractionConfidence::High);
        }
    }
}

/// Detected input format (spec §4.5.1 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    OpenEphys,
    #[default]
    Unknown,
}

/// Dataset descriptor populated before the session may leave `initialized`
/// (invariant 5, spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub path: String,
    pub format: DatasetFormat,
    pub byte_size: u64,
    pub file_count: u64,
    pub channel_count: Option<u32>,
    pub sample_rate_hz: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub documentation_files: Vec<String>,
}

/// Outcome of the Conversion agent's run (spec §4.5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResults {
    pub duration_seconds: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Raw conversion library log, preserved in full (spec §7: "never truncated").
    pub conversion_log: String,
    /// User-friendly remediation message produced by the LLM on failure.
    pub user_message: Option<String>,
}

/// Severity of one validation issue (spec §4.5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub message: String,
    pub location: String,
    pub check_name: String,
}

/// Overall pass/fail verdict for the converted NWB file (spec §4.5.3 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueCounts {
    pub critical: u32,
    pub warning: u32,
    pub info: u32,
}

impl IssueCounts {
    pub fn tally(issues: &[ValidationIssue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                IssueSeverity::Critical => counts.critical += 1,
                IssueSeverity::Warning => counts.warning += 1,
                IssueSeverity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// `max(0, 1 - (0.10*#critical + 0.05*#warning + 0.01*#info))` (spec §4.5.3 step 4).
    pub fn best_practices_score(&self) -> f64 {
        let penalty =
            0.10 * self.critical as f64 + 0.05 * self.warning as f64 + 0.01 * self.info as f64;
        (1.0 - penalty).max(0.0)
    }

    pub fn overall_status(&self) -> ValidationStatus {
        if self.critical > 0 {
            ValidationStatus::Failed
        } else if self.warning > 0 {
            ValidationStatus::PassedWithWarnings
        } else {
            ValidationStatus::Passed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub overall_status: ValidationStatus,
    pub issue_counts: IssueCounts,
    pub issues: Vec<ValidationIssue>,
    pub metadata_completeness: f64,
    pub best_practices_score: f64,
    pub report_path: String,
    pub summary: String,
}

/// Terminal status of one agent's execution (spec §3.1 `agent_history`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Success,
    Failed,
}

/// One append-only entry in `agent_history`. Prior entries are immutable
/// (invariant 9); only the orchestrator appends or closes out an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionRecord {
    pub agent: AgentType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
}

impl AgentExecutionRecord {
    pub fn started(agent: AgentType, at: DateTime<Utc>) -> Self {
        Self {
            agent,
            started_at: at,
            ended_at: None,
            status: ExecutionStatus::InProgress,
            error_message: None,
            error_trace: None,
        }
    }
}

/// The single authoritative record of one conversion run (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub workflow_stage: WorkflowStage,
    pub current_agent: Option<AgentType>,
    pub agent_history: Vec<AgentExecutionRecord>,
    pub dataset_info: Option<DatasetInfo>,
    pub metadata: Option<NwbMetadata>,
    pub conversion_results: Option<ConversionResults>,
    pub validation_results: Option<ValidationResults>,
    pub output_nwb_path: Option<String>,
    pub output_report_path: Option<String>,
    pub requires_user_clarification: bool,
    pub clarification_prompt: Option<String>,
}

impl SessionContext {
    /// Create a freshly initialized session (the `[∅] -> initialized` edge,
    /// spec §4.4). `created_at` and `last_updated` start equal.
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            created_at: now,
            last_updated: now,
            workflow_stage: WorkflowStage::Initialized,
            current_agent: None,
            agent_history: Vec::new(),
            dataset_info: None,
            metadata: None,
            conversion_results: None,
            validation_results: None,
            output_nwb_path: None,
            output_report_path: None,
            requires_user_clarification: false,
            clarification_prompt: None,
        }
    }

    /// Check every universal invariant from spec §3.1 / §8. Used by store
    /// tests and by the orchestrator before persisting a patched context —
    /// cheap enough to run on every write given single-session-at-a-time
    /// concurrency (§5).
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.last_updated < self.created_at {
            return Err("last_updated precedes created_at".into());
        }
        let expects_agent = self.workflow_stage.expects_current_agent();
        if expects_agent && self.current_agent.is_none() {
            return Err(format!(
                "workflow_stage {:?} requires current_agent to be set",
                self.workflow_stage
            ));
        }
        if !expects_agent && self.current_agent.is_some() {
            return Err(format!(
                "workflow_stage {:?} forbids current_agent",
                self.workflow_stage
            ));
        }
        if self.workflow_stage == WorkflowStage::Completed {
            if self.output_nwb_path.is_none() {
                return Err("completed session missing output_nwb_path".into());
            }
            if self.validation_results.is_none() {
                return Err("completed session missing validation_results".into());
            }
        }
        if self.requires_user_clarification {
            if self.workflow_stage != WorkflowStage::Failed {
                return Err("requires_user_clarification set outside failed stage".into());
            }
            if self
                .clarification_prompt
                .as_deref()
                .unwrap_or("")
                .is_empty()
            {
                return Err("requires_user_clarification set with empty prompt".into());
            }
        }
        Ok(())
    }
}

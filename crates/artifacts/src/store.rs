//! ArtifactStore - typed reads and writes over the artifact layout

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{
    BatchSet, Checkpoint, ContractError, PersonaSet, PromptSet, ResumeSet, Role, RunRecord,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::csv::CsvTable;
use crate::error::{ArtifactError, Result};
use crate::layout::ArtifactLayout;
use crate::run_log::read_jsonl;

/// Pipeline stage that produces an artifact; named in "run X first" errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Personas,
    Resumes,
    Batches,
    Prompts,
    Run,
    Analyze,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::Personas => "personas",
            Stage::Resumes => "resumes",
            Stage::Batches => "batches",
            Stage::Prompts => "prompts",
            Stage::Run => "run",
            Stage::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Store that reads and writes pipeline artifacts under one root
pub struct ArtifactStore {
    layout: ArtifactLayout,
    created_dirs: HashSet<PathBuf>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: ArtifactLayout::new(root),
            created_dirs: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    fn ensure_parent(&mut self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if !self.created_dirs.contains(parent) {
            fs::create_dir_all(parent)
                .map_err(|e| ArtifactError::write(parent.display().to_string(), e))?;
            self.created_dirs.insert(parent.to_path_buf());
        }
        Ok(())
    }

    /// Write `value` as pretty JSON
    #[instrument(
        name = "artifact_store_write_json",
        skip(self, value),
        fields(path = %path.display())
    )]
    pub fn write_json<T: Serialize>(&mut self, path: &Path, value: &T) -> Result<()> {
        self.ensure_parent(path)?;
        let shown = path.display().to_string();
        let file = File::create(path).map_err(|e| ArtifactError::write(&shown, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| {
            ArtifactError::Serialize {
                path: shown.clone(),
                message: e.to_string(),
            }
        })?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| ArtifactError::write(&shown, e))?;
        debug!("artifact written");
        Ok(())
    }

    /// Read a JSON artifact produced by `stage`
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path, stage: Stage) -> Result<T> {
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(ContractError::ArtifactMissing {
                path: shown,
                stage: stage.to_string(),
            }
            .into());
        }
        let file = File::open(path).map_err(ContractError::from)?;
        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ContractError::artifact_format(&shown, e.to_string()))?;
        Ok(value)
    }

    pub fn write_text(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.ensure_parent(path)?;
        fs::write(path, contents).map_err(|e| ArtifactError::write(path.display().to_string(), e))
    }

    pub fn write_csv(&mut self, path: &Path, table: &CsvTable) -> Result<()> {
        self.write_text(path, &table.to_csv_string())
    }

    // ===== Stage artifacts =====

    pub fn save_personas(&mut self, personas: &PersonaSet) -> Result<PathBuf> {
        let path = self.layout.personas();
        self.write_json(&path, personas)?;
        Ok(path)
    }

    pub fn load_personas(&self) -> Result<PersonaSet> {
        self.read_json(&self.layout.personas(), Stage::Personas)
    }

    pub fn save_resumes(&mut self, resumes: &ResumeSet) -> Result<PathBuf> {
        let path = self.layout.resumes();
        self.write_json(&path, resumes)?;
        Ok(path)
    }

    pub fn load_resumes(&self) -> Result<ResumeSet> {
        self.read_json(&self.layout.resumes(), Stage::Resumes)
    }

    pub fn save_batches(&mut self, batches: &BatchSet) -> Result<PathBuf> {
        let path = self.layout.batches();
        self.write_json(&path, batches)?;
        Ok(path)
    }

    pub fn load_batches(&self) -> Result<BatchSet> {
        self.read_json(&self.layout.batches(), Stage::Batches)
    }

    pub fn save_prompts(&mut self, prompts: &PromptSet) -> Result<PathBuf> {
        let path = self.layout.prompts(prompts.role);
        self.write_json(&path, prompts)?;
        Ok(path)
    }

    pub fn load_prompts(&self, role: Role) -> Result<PromptSet> {
        let set: PromptSet = self.read_json(&self.layout.prompts(role), Stage::Prompts)?;
        if set.role != role {
            return Err(ContractError::artifact_format(
                self.layout.prompts(role).display().to_string(),
                format!("holds {} prompts, expected {role}", set.role),
            )
            .into());
        }
        Ok(set)
    }

    // ===== Checkpoints =====

    /// Saved checkpoint, or a fresh one when none exists
    pub fn load_checkpoint(&self, role: Role) -> Result<Checkpoint> {
        let path = self.layout.checkpoint(role);
        if !path.exists() {
            return Ok(Checkpoint::default());
        }
        self.read_json(&path, Stage::Run)
    }

    pub fn save_checkpoint(&mut self, role: Role, checkpoint: Checkpoint) -> Result<()> {
        let path = self.layout.checkpoint(role);
        self.write_json(&path, &checkpoint)
    }

    pub fn clear_checkpoint(&mut self, role: Role) -> Result<()> {
        let path = self.layout.checkpoint(role);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(role = %role, "checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArtifactError::write(path.display().to_string(), e)),
        }
    }

    // ===== Run logs =====

    /// Records from every run log of `role`, oldest log first.
    ///
    /// A resumed run writes a new log, so the same scenario may appear in
    /// several logs; the most recent record of a scenario wins and keeps the
    /// position of its first appearance.
    pub fn load_run_records(&self, role: Role) -> Result<Vec<RunRecord>> {
        let logs = self.layout.run_logs(role).map_err(ContractError::from)?;
        if logs.is_empty() {
            return Err(ContractError::ArtifactMissing {
                path: self
                    .layout
                    .runs_dir()
                    .join(format!("{role}_run_*.jsonl"))
                    .display()
                    .to_string(),
                stage: Stage::Run.to_string(),
            }
            .into());
        }

        let mut records: Vec<RunRecord> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut replaced = 0usize;

        for log in &logs {
            for record in read_jsonl::<RunRecord>(log)? {
                if record.role != role {
                    warn!(
                        scenario_id = %record.scenario_id,
                        log = %log.display(),
                        "record of another role in run log, ignored"
                    );
                    continue;
                }
                match position.get(&record.scenario_id) {
                    Some(&i) => {
                        records[i] = record;
                        replaced += 1;
                    }
                    None => {
                        position.insert(record.scenario_id.clone(), records.len());
                        records.push(record);
                    }
                }
            }
        }

        info!(
            role = %role,
            logs = logs.len(),
            records = records.len(),
            replaced,
            "run records loaded"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_log::RunLog;
    use chrono::{TimeZone, Utc};
    use contracts::{Persona, PersonaId, Prompt, PromptStyle};
    use tempfile::tempdir;

    fn prompt(variant: &str) -> Prompt {
        Prompt {
            scenario_id: Prompt::scenario_id(variant, PromptStyle::Terse, Role::Swe),
            variant_id: variant.into(),
            group_id: "sh0_b0".into(),
            role: Role::Swe,
            style: PromptStyle::Terse,
            persona_ids: vec![PersonaId::numbered(1)],
            text: "prompt".into(),
        }
    }

    fn record(variant: &str, response: &str) -> RunRecord {
        RunRecord::new(
            &prompt(variant),
            vec![Persona::neutral(PersonaId::numbered(1))],
            response.into(),
            "mock",
            1,
        )
    }

    #[test]
    fn test_json_round_trip_and_missing_stage() {
        let dir = tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());

        let err = store.load_personas().unwrap_err();
        assert!(err.to_string().contains("run the 'personas' stage first"), "got: {err}");

        let set = PersonaSet {
            attributes: vec!["gender".into()],
            personas: vec![Persona::neutral(PersonaId::numbered(1))],
        };
        let path = store.save_personas(&set).unwrap();
        assert!(path.ends_with("personas/all_personas.json"));
        assert_eq!(store.load_personas().unwrap().personas, set.personas);
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("batches")).unwrap();
        std::fs::write(store.layout().batches(), "{ not json").unwrap();

        assert!(matches!(
            store.load_batches(),
            Err(ArtifactError::Contract(ContractError::ArtifactFormat { .. }))
        ));
    }

    #[test]
    fn test_checkpoint_lifecycle() {
        let dir = tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());

        assert_eq!(store.load_checkpoint(Role::Hr).unwrap().done, 0);
        store
            .save_checkpoint(Role::Hr, Checkpoint { done: 17 })
            .unwrap();
        assert_eq!(store.load_checkpoint(Role::Hr).unwrap().done, 17);
        assert_eq!(store.load_checkpoint(Role::Swe).unwrap().done, 0);

        store.clear_checkpoint(Role::Hr).unwrap();
        store.clear_checkpoint(Role::Hr).unwrap();
        assert_eq!(store.load_checkpoint(Role::Hr).unwrap().done, 0);
    }

    #[test]
    fn test_run_records_across_logs() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_run_records(Role::Swe),
            Err(ArtifactError::Contract(ContractError::ArtifactMissing { .. }))
        ));

        let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();

        let mut log = RunLog::new(store.layout(), Role::Swe, first);
        log.append_record(&record("sh0_b0_p0", "old")).unwrap();
        log.append_record(&record("sh0_b0_p1", "kept")).unwrap();

        let mut resumed = RunLog::new(store.layout(), Role::Swe, second);
        resumed.append_record(&record("sh0_b0_p0", "new")).unwrap();
        resumed.append_record(&record("sh0_b0_p2", "added")).unwrap();

        let records = store.load_run_records(Role::Swe).unwrap();
        let responses: Vec<&str> = records.iter().map(|r| r.response_text.as_str()).collect();
        assert_eq!(responses, vec!["new", "kept", "added"]);
    }

    #[test]
    fn test_csv_and_text_create_directories() {
        let dir = tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        let mut table = CsvTable::new(["a"]);
        table.push_row(["1"]);

        let csv_path = store.layout().metric(Role::Hr, "subgroup_rates.csv");
        store.write_csv(&csv_path, &table).unwrap();
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), "a\n1\n");

        let svg = store.layout().plot("x.svg");
        store.write_text(&svg, "<svg/>").unwrap();
        assert!(svg.exists());
    }
}

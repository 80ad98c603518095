//! Artifact paths

use chrono::{DateTime, Utc};
use contracts::Role;
use std::path::{Path, PathBuf};

/// Timestamp embedded in run-log names; sorts lexicographically
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Directory layout below the output root
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn personas(&self) -> PathBuf {
        self.root.join("personas").join("all_personas.json")
    }

    pub fn resumes(&self) -> PathBuf {
        self.root.join("resumes").join("all_resumes.json")
    }

    pub fn batches(&self) -> PathBuf {
        self.root.join("batches").join("batch_variants.json")
    }

    pub fn prompts(&self, role: Role) -> PathBuf {
        self.root.join("prompts").join(format!("{role}_prompts.json"))
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// Log for a run started at `started`
    pub fn run_log(&self, role: Role, started: DateTime<Utc>) -> PathBuf {
        self.runs_dir().join(format!(
            "{role}_run_{}.jsonl",
            started.format(RUN_TIMESTAMP_FORMAT)
        ))
    }

    pub fn failures(&self, role: Role) -> PathBuf {
        self.runs_dir().join(format!("{role}_failures.jsonl"))
    }

    pub fn checkpoint(&self, role: Role) -> PathBuf {
        self.runs_dir().join(format!(".last_checkpoint_{role}.json"))
    }

    /// Existing run logs of `role`, oldest first
    pub fn run_logs(&self, role: Role) -> std::io::Result<Vec<PathBuf>> {
        let dir = self.runs_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{role}_run_");
        let mut logs: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".jsonl"))
            })
            .collect();
        logs.sort();
        Ok(logs)
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.root.join("metrics")
    }

    /// `metrics/{role}_{name}`
    pub fn metric(&self, role: Role, name: &str) -> PathBuf {
        self.metrics_dir().join(format!("{role}_{name}"))
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.root.join("plots")
    }

    pub fn plot(&self, name: &str) -> PathBuf {
        self.plots_dir().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paths() {
        let layout = ArtifactLayout::new("out");
        assert_eq!(layout.prompts(Role::Hr), PathBuf::from("out/prompts/hr_prompts.json"));
        assert_eq!(
            layout.checkpoint(Role::Swe),
            PathBuf::from("out/runs/.last_checkpoint_swe.json")
        );
        assert_eq!(
            layout.metric(Role::Swe, "subgroup_air.csv"),
            PathBuf::from("out/metrics/swe_subgroup_air.csv")
        );

        let started = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            layout.run_log(Role::Swe, started),
            PathBuf::from("out/runs/swe_run_20250304T050607Z.jsonl")
        );
    }

    #[test]
    fn test_run_logs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        assert!(layout.run_logs(Role::Swe).unwrap().is_empty());

        std::fs::create_dir_all(layout.runs_dir()).unwrap();
        for name in [
            "swe_run_20250102T000000Z.jsonl",
            "swe_run_20250101T000000Z.jsonl",
            "hr_run_20250101T000000Z.jsonl",
            "swe_failures.jsonl",
        ] {
            std::fs::write(layout.runs_dir().join(name), "").unwrap();
        }

        let logs = layout.run_logs(Role::Swe).unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].ends_with("swe_run_20250101T000000Z.jsonl"));
    }
}

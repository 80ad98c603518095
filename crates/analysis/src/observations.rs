//! Run records flattened into one observation per candidate appearance

use std::collections::{HashMap, HashSet};

use contracts::{parse_shortlist, Persona, RunRecord, UnparsedResponse};
use tracing::{debug, warn};

/// Parse-report reason for a record whose persona snapshot disagrees with
/// its candidate list
pub const SNAPSHOT_MISMATCH: &str = "persona snapshot does not match the batch";

/// One candidate in one answered prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub persona: Persona,
    pub selected: bool,
    /// Batch composition group; identical membership shares a cluster
    pub cluster: String,
}

/// Parsed records of one role
#[derive(Debug, Clone, Default)]
pub struct Observations {
    pub records_total: usize,
    pub records_used: usize,
    pub rows: Vec<Observation>,
    pub unparsed: Vec<UnparsedResponse>,
}

impl Observations {
    /// Parse every record's shortlist. Unparseable responses are listed in
    /// `unparsed` and contribute no rows.
    pub fn from_records(records: &[RunRecord]) -> Self {
        let mut out = Observations {
            records_total: records.len(),
            ..Default::default()
        };

        for record in records {
            let candidates = record.persona_ids.len();
            let shortlist = match parse_shortlist(&record.response_text, candidates) {
                Ok(shortlist) => shortlist,
                Err(reason) => {
                    warn!(
                        scenario_id = %record.scenario_id,
                        reason = %reason,
                        "unparseable response excluded"
                    );
                    out.unparsed.push(UnparsedResponse {
                        scenario_id: record.scenario_id.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };

            // rows follow the presented ids; every id needs its snapshot
            let meta: HashMap<&str, &Persona> = record
                .persona_meta
                .iter()
                .map(|p| (p.persona_id.as_str(), p))
                .collect();
            let presented: Option<Vec<&Persona>> = record
                .persona_ids
                .iter()
                .map(|id| meta.get(id.as_str()).copied())
                .collect();
            let Some(presented) = presented.filter(|_| meta.len() == candidates) else {
                warn!(
                    scenario_id = %record.scenario_id,
                    meta = record.persona_meta.len(),
                    ids = candidates,
                    "persona snapshot does not match the batch, record excluded"
                );
                out.unparsed.push(UnparsedResponse {
                    scenario_id: record.scenario_id.clone(),
                    reason: SNAPSHOT_MISMATCH.to_string(),
                });
                continue;
            };

            let selected: HashSet<&str> = shortlist
                .selected(&record.persona_ids)
                .into_iter()
                .map(|id| id.as_str())
                .collect();

            out.records_used += 1;
            out.rows.extend(presented.into_iter().map(|persona| Observation {
                persona: persona.clone(),
                selected: selected.contains(persona.persona_id.as_str()),
                cluster: record.group_id.clone(),
            }));
        }

        debug!(
            records = out.records_total,
            used = out.records_used,
            rows = out.rows.len(),
            "observations flattened"
        );
        out
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_selected_flags_follow_positions() {
        let personas = vec![
            persona(1, "reference", false),
            persona(2, "minority", true),
            persona(3, "minority", true),
        ];
        let records = vec![record("s1", "sh0_b0", &personas, "<top-2>3, 1</top-2>")];
        let obs = Observations::from_records(&records);

        assert_eq!(obs.records_used, 1);
        let flags: Vec<bool> = obs.rows.iter().map(|o| o.selected).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert!(obs.rows.iter().all(|o| o.cluster == "sh0_b0"));
    }

    #[test]
    fn test_unparseable_records_are_excluded() {
        let personas = vec![persona(1, "reference", false), persona(2, "minority", true)];
        let records = vec![
            record("ok", "g", &personas, "<top-1>2</top-1>"),
            record("refusal", "g", &personas, "I will not rank people."),
            record("range", "g", &personas, "<top-1>5</top-1>"),
        ];
        let obs = Observations::from_records(&records);

        assert_eq!(obs.records_total, 3);
        assert_eq!(obs.records_used, 1);
        assert_eq!(obs.rows.len(), 2);
        let ids: Vec<&str> = obs.unparsed.iter().map(|u| u.scenario_id.as_str()).collect();
        assert_eq!(ids, vec!["refusal", "range"]);
        // excluded, not counted as "not selected"
        assert_eq!(obs.rows.iter().filter(|o| !o.selected).count(), 1);
    }

    #[test]
    fn test_snapshot_mismatch_is_excluded() {
        let personas = vec![persona(1, "reference", false), persona(2, "minority", true)];

        let mut short = record("short", "g", &personas, "<top-1>2</top-1>");
        short.persona_meta.pop();
        let mut foreign = record("foreign", "g", &personas, "<top-1>2</top-1>");
        foreign.persona_meta[1] = persona(9, "minority", true);
        let mut padded = record("padded", "g", &personas, "<top-1>1</top-1>");
        padded.persona_meta.push(persona(3, "minority", true));
        let ok = record("ok", "g", &personas, "<top-1>2</top-1>");

        let obs = Observations::from_records(&[short, foreign, padded, ok]);
        assert_eq!(obs.records_used, 1);
        assert_eq!(obs.rows.len(), 2);
        let excluded: Vec<&str> = obs.unparsed.iter().map(|u| u.scenario_id.as_str()).collect();
        assert_eq!(excluded, vec!["short", "foreign", "padded"]);
        assert!(obs.unparsed.iter().all(|u| u.reason == SNAPSHOT_MISMATCH));
    }

    #[test]
    fn test_rows_follow_presented_order() {
        let personas = vec![persona(1, "reference", false), persona(2, "minority", true)];
        let mut rec = record("s", "g", &personas, "<top-1>1</top-1>");
        rec.persona_meta.reverse();
        let obs = Observations::from_records(&[rec]);
        let ids: Vec<&str> = obs.rows.iter().map(|o| o.persona.persona_id.as_str()).collect();
        assert_eq!(ids, vec!["pers_001", "pers_002"]);
        assert!(obs.rows[0].selected);
        assert!(!obs.rows[1].selected);
    }
}

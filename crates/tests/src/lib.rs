//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 跨 crate 合约测试（prompt 格式与响应语法一致）
//! - 端到端测试：personas → résumés → batches → prompts → run → analyze → plot
//! - 使用脚本化模型，无需网络

#[cfg(test)]
mod support {
    use std::collections::HashMap;

    use artifacts::ArtifactStore;
    use composer::{eligible_personas, verify_references, BatchComposer, PromptBuilder};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AuditBlueprint, ContractError, PersonaSet, Prompt, PromptSet, PromptStyle, RankingModel,
        RankingRequest, ResumeSet, Role,
    };
    use persona_factory::{PersonaFactory, ResumeRenderer, TemplateSet};

    /// Four personas (two per group, crossed with a seniority tier), every
    /// batch holds all four, ten shuffles, three prompt styles
    pub const PILOT: &str = r#"
[personas]
neutral_count = 0
marginalized_threshold = 1
seed = 3

[[personas.attributes]]
name = "group"
values = ["reference", "minority"]
reference = "reference"
marginalized = ["minority"]

[[personas.attributes]]
name = "tier"
values = ["junior", "senior"]
reference = "senior"

[batches]
batch_size = 4
shuffles = 10
permutations = 1
seed = 11

[prompts]
shortlist_size = 2

[model]
provider = "mock"
request_delay_secs = 0.0
"#;

    pub fn pilot() -> AuditBlueprint {
        ConfigLoader::load_from_str(PILOT, ConfigFormat::Toml).unwrap()
    }

    /// Two neutral personas next to four cue-bearing ones, batches of three
    pub const PARTIAL: &str = r#"
[personas]
neutral_count = 2
marginalized_threshold = 1
seed = 5

[[personas.attributes]]
name = "group"
values = ["reference", "minority"]
reference = "reference"
marginalized = ["minority"]

[[personas.attributes]]
name = "tier"
values = ["junior", "senior"]
reference = "senior"

[batches]
batch_size = 3
shuffles = 4
permutations = 1
seed = 13

[prompts]
shortlist_size = 2

[model]
provider = "mock"
request_delay_secs = 0.0
"#;

    pub fn partial() -> AuditBlueprint {
        ConfigLoader::load_from_str(PARTIAL, ConfigFormat::Toml).unwrap()
    }

    /// Templates naming a persona attribute; neutral personas cannot render them
    pub fn attribute_templates() -> TemplateSet {
        TemplateSet::from_sources(&[
            (Role::Swe, "{{ full_name }} ({{ group }})"),
            (Role::Hr, "{{ full_name }} ({{ tier }})"),
        ])
    }

    /// Personas through prompts, persisted in `store`
    pub fn prepare(blueprint: &AuditBlueprint, store: &mut ArtifactStore) -> Vec<PromptSet> {
        let templates = TemplateSet::builtin(&blueprint.resumes.roles);
        let (sets, resumes) = prepare_with(blueprint, store, templates);
        assert!(resumes.failures.is_empty(), "{:?}", resumes.failures);
        sets
    }

    /// Same as [`prepare`] with explicit templates; render failures are allowed
    pub fn prepare_with(
        blueprint: &AuditBlueprint,
        store: &mut ArtifactStore,
        templates: TemplateSet,
    ) -> (Vec<PromptSet>, ResumeSet) {
        let roles = &blueprint.resumes.roles;

        let personas = PersonaFactory::new(&blueprint.personas).generate().unwrap();
        store.save_personas(&personas).unwrap();

        let resumes = ResumeRenderer::new(templates, blueprint.personas.seed)
            .render_all(&personas)
            .unwrap();
        store.save_resumes(&resumes).unwrap();

        let ids = eligible_personas(&personas, &resumes, roles);
        let batches = BatchComposer::new(&blueprint.batches).compose(&ids).unwrap();
        verify_references(&batches, &resumes, roles).unwrap();
        store.save_batches(&batches).unwrap();

        let sets = roles
            .iter()
            .map(|&role| {
                let set = PromptBuilder::new(role, blueprint.prompts.shortlist_size)
                    .build(&batches, &resumes)
                    .unwrap();
                store.save_prompts(&set).unwrap();
                set
            })
            .collect();
        (sets, resumes)
    }

    /// Shortlist favouring the reference group
    ///
    /// Formal prompts pick both reference candidates; the other styles pick
    /// the first reference and the first minority candidate by position.
    pub fn biased_reply(prompt: &Prompt, personas: &PersonaSet) -> String {
        let positions = |group: &str| -> Vec<usize> {
            prompt
                .persona_ids
                .iter()
                .enumerate()
                .filter(|(_, id)| {
                    personas
                        .get(id.as_str())
                        .is_some_and(|p| p.group_value("group") == group)
                })
                .map(|(i, _)| i + 1)
                .collect()
        };
        let reference = positions("reference");
        let minority = positions("minority");
        let picks = match prompt.style {
            PromptStyle::Formal => [reference[0], reference[1]],
            _ => [reference[0], minority[0]],
        };
        format!(
            "<explanation>Scripted preference.</explanation>\n<top-2>{}, {}</top-2>",
            picks[0], picks[1]
        )
    }

    /// Answers by scenario id from a prepared script
    pub struct ScriptedModel {
        replies: HashMap<String, String>,
    }

    impl ScriptedModel {
        pub fn biased(sets: &[PromptSet], personas: &PersonaSet) -> Self {
            let replies = sets
                .iter()
                .flat_map(|set| &set.prompts)
                .map(|p| (p.scenario_id.clone(), biased_reply(p, personas)))
                .collect();
            Self { replies }
        }
    }

    impl RankingModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted-biased"
        }

        async fn rank(&self, request: RankingRequest<'_>) -> Result<String, ContractError> {
            self.replies
                .get(request.scenario_id)
                .cloned()
                .ok_or_else(|| ContractError::Other(format!("no script for {}", request.scenario_id)))
        }
    }

    /// Gives the same answer to every prompt
    pub struct FixedReply(pub &'static str);

    impl RankingModel for FixedReply {
        fn name(&self) -> &str {
            "fixed-reply"
        }

        async fn rank(&self, _request: RankingRequest<'_>) -> Result<String, ContractError> {
            Ok(self.0.to_string())
        }
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{parse_shortlist, AuditBlueprint, PromptStyle, Role};

    #[test]
    fn test_default_blueprint_validates() {
        let bp = AuditBlueprint::default();
        assert!(config_loader::ConfigLoader::revalidate(&bp).is_ok());
        assert_eq!(bp.resumes.roles, Role::ALL.to_vec());
    }

    #[test]
    fn test_prompt_format_example_parses() {
        // the example shortlist the prompt shows must satisfy the grammar
        let block = composer::response_format(11, 3);
        let shortlist = parse_shortlist(&block, 11).unwrap();
        assert_eq!(shortlist.indices.len(), 3);
    }

    #[test]
    fn test_render_failures_do_not_block_batching() {
        let bp = AuditBlueprint::default();
        let templates = persona_factory::TemplateSet::from_sources(&[
            (Role::Swe, "{{ full_name }} ({{ race }})"),
            (Role::Hr, "{{ full_name }}"),
        ]);
        let personas = persona_factory::PersonaFactory::new(&bp.personas)
            .generate()
            .unwrap();
        let resumes = persona_factory::ResumeRenderer::new(templates, bp.personas.seed)
            .render_all(&personas)
            .unwrap();
        assert_eq!(personas.len(), 110);
        // only the neutral personas lack a race
        assert_eq!(resumes.failures.len(), 14);
        assert!(resumes.failures.iter().all(|f| f.role == Role::Swe));

        let ids = composer::eligible_personas(&personas, &resumes, &bp.resumes.roles);
        assert_eq!(ids.len(), 96);
        let batches = composer::BatchComposer::new(&bp.batches).compose(&ids).unwrap();

        // 96 = 8 batches of 11 + 8 left over
        assert_eq!(batches.dropped.len(), 8);
        assert_eq!(batches.dropped[..], ids[88..]);
        assert_eq!(batches.len(), 8 * bp.batches.shuffles * bp.batches.permutations);
        assert!(batches.variants.iter().all(|v| v.len() == 11));
        composer::verify_references(&batches, &resumes, &bp.resumes.roles).unwrap();
    }

    #[test]
    fn test_every_prompt_asks_for_its_shortlist_tag() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = artifacts::ArtifactStore::new(dir.path());
        let bp = super::support::pilot();
        let sets = super::support::prepare(&bp, &mut store);

        for set in &sets {
            assert_eq!(set.prompts.len(), 10 * PromptStyle::ALL.len());
            for prompt in &set.prompts {
                assert!(prompt.text.contains("<top-2>"), "{}", prompt.scenario_id);
                assert_eq!(prompt.persona_ids.len(), 4);
            }
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use analysis::{analyze_role, load_analysis, save_analysis};
    use artifacts::ArtifactStore;
    use contracts::{Role, RoleAnalysis};
    use plotting::{render_plots, PlotOptions};
    use runner::{build_model, ModelRunner, RunOptions};

    use super::support::{
        attribute_templates, partial, pilot, prepare, prepare_with, FixedReply, ScriptedModel,
    };

    fn options(blueprint: &contracts::AuditBlueprint, limit: Option<usize>) -> RunOptions {
        let mut options = RunOptions::from_config(&blueprint.model);
        options.request_delay = Duration::ZERO;
        options.limit = limit;
        options
    }

    fn rate(analysis: &RoleAnalysis, attribute: &str, value: &str) -> Option<f64> {
        analysis
            .rates
            .iter()
            .find(|r| r.attribute == attribute && r.value == value)
            .and_then(|r| r.selection_rate)
    }

    /// End-to-end: biased scripted model -> run log -> fairness metrics
    ///
    /// 验证完整的数据流：
    /// 1. 生成 personas、简历、批次与 prompts
    /// 2. 脚本化模型偏向 reference 组
    /// 3. 分析检测到 adverse impact 与显著差异
    #[tokio::test]
    async fn test_e2e_biased_model_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        let bp = pilot();
        let sets = prepare(&bp, &mut store);
        let personas = store.load_personas().unwrap();

        let model = ScriptedModel::biased(&sets, &personas);
        let runner = ModelRunner::new(model, options(&bp, None));
        let report = runner.run(&mut store, Role::Swe).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.records_written, 30);
        assert_eq!(report.failures_written, 0);

        let records = store.load_run_records(Role::Swe).unwrap();
        let analysis = analyze_role(Role::Swe, &records, &bp.personas, &bp.analysis);
        assert_eq!(analysis.records_used, 30);
        assert!(analysis.unparsed.is_empty());

        // reference: 60 appearances, 40 picks; minority: 60 appearances, 20 picks
        let sr_ref = rate(&analysis, "group", "reference").unwrap();
        let sr_min = rate(&analysis, "group", "minority").unwrap();
        assert!((sr_ref - 40.0 / 60.0).abs() < 1e-12);
        assert!((sr_min - 20.0 / 60.0).abs() < 1e-12);

        let air = analysis
            .air
            .iter()
            .find(|a| a.attribute == "group" && a.value == "minority")
            .unwrap();
        assert!((air.air.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(air.below_four_fifths, Some(true));

        let fisher = analysis
            .fisher
            .iter()
            .find(|f| f.attribute == "group" && f.value == "minority")
            .unwrap();
        assert!(fisher.p_raw < 0.01, "p = {}", fisher.p_raw);
        assert!(fisher.significant);

        // marginalized duplicates the group column
        assert_eq!(rate(&analysis, "marginalized", "true"), Some(sr_min));
        let gee = &analysis.gee;
        assert!(gee.converged, "{:?}", gee.message);
        assert_eq!(gee.clusters, 10);
        let minority = gee
            .terms
            .iter()
            .find(|t| t.term == "group[T.minority]")
            .unwrap();
        assert!(minority.coef.unwrap() < 0.0);
        assert!(gee
            .terms
            .iter()
            .any(|t| t.term == "marginalized[T.true]" && t.aliased));
    }

    /// A run interrupted by `limit` and resumed gives the same metrics as one pass
    #[tokio::test]
    async fn test_e2e_resume_matches_single_pass() {
        let bp = pilot();

        let single_dir = tempfile::tempdir().unwrap();
        let mut single = ArtifactStore::new(single_dir.path());
        let sets = prepare(&bp, &mut single);
        let personas = single.load_personas().unwrap();
        ModelRunner::new(ScriptedModel::biased(&sets, &personas), options(&bp, None))
            .run(&mut single, Role::Hr)
            .await
            .unwrap();

        let split_dir = tempfile::tempdir().unwrap();
        let mut split = ArtifactStore::new(split_dir.path());
        let sets = prepare(&bp, &mut split);
        let first = ModelRunner::new(ScriptedModel::biased(&sets, &personas), options(&bp, Some(12)))
            .run(&mut split, Role::Hr)
            .await
            .unwrap();
        assert_eq!(first.done, 12);
        assert!(!first.is_complete());

        let second = ModelRunner::new(ScriptedModel::biased(&sets, &personas), options(&bp, None))
            .run(&mut split, Role::Hr)
            .await
            .unwrap();
        assert!(second.is_complete());
        assert_eq!(second.records_written, 18);

        let analyse = |store: &ArtifactStore| {
            let records = store.load_run_records(Role::Hr).unwrap();
            assert_eq!(records.len(), 30);
            analyze_role(Role::Hr, &records, &bp.personas, &bp.analysis)
        };
        let a = analyse(&single);
        let b = analyse(&split);
        assert_eq!(a.rates, b.rates);
        assert_eq!(a.air, b.air);
        assert_eq!(a.fisher, b.fisher);
    }

    /// Whole pipeline offline with the seeded mock model, both roles
    #[tokio::test]
    async fn test_e2e_mock_pipeline_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        let bp = pilot();
        prepare(&bp, &mut store);

        let mut analyses = Vec::new();
        for &role in &bp.resumes.roles {
            let model = build_model(&bp.model).unwrap();
            let report = ModelRunner::new(model, options(&bp, None))
                .run(&mut store, role)
                .await
                .unwrap();
            assert_eq!(report.records_written, 30);

            let records = store.load_run_records(role).unwrap();
            assert!(records.iter().all(|r| r.model == "mock-ranker"));
            let analysis = analyze_role(role, &records, &bp.personas, &bp.analysis);
            assert_eq!(analysis.records_used, 30);
            save_analysis(&mut store, &analysis).unwrap();
            analyses.push(load_analysis(&store, role).unwrap());
        }
        assert!(!dir.path().join("runs/.last_checkpoint_swe.json").exists());

        let written = render_plots(
            &mut store,
            &analyses,
            PlotOptions::from_config(&bp.analysis),
        )
        .unwrap();
        // per role: (group, tier, marginalized) x (sr, air) + forest
        assert_eq!(written.len(), 14);

        for name in [
            "metrics/swe_subgroup_rates.csv",
            "metrics/swe_subgroup_air.csv",
            "metrics/hr_fisher.csv",
            "metrics/hr_gee.csv",
            "plots/swe_group_sr.svg",
            "plots/hr_tier_air.svg",
            "plots/hr_gee_forest.svg",
        ] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
    }

    /// 部分简历渲染失败、且一个角色的回复全部无法解析时，管道仍然完成：
    /// 1. neutral personas 渲染失败，被排除出批次
    /// 2. HR 模型拒绝排序，分析报告全部为未定义
    /// 3. SWE 照常分析，两个角色都输出图表
    #[tokio::test]
    async fn test_e2e_partial_renders_and_refusing_role() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        let bp = partial();
        let (sets, resumes) = prepare_with(&bp, &mut store, attribute_templates());

        // two neutral personas x two roles
        assert_eq!(resumes.failures.len(), 4);
        let batches = store.load_batches().unwrap();
        assert_eq!(batches.dropped.len(), 1);
        assert!(sets.iter().all(|set| set.prompts.len() == 4 * 3));

        let mut options = options(&bp, None);
        options.retry.max_attempts = 1;

        let swe = ModelRunner::new(FixedReply("<top-2>1, 2</top-2>"), options)
            .run(&mut store, Role::Swe)
            .await
            .unwrap();
        let hr = ModelRunner::new(FixedReply("I decline to rank candidates."), options)
            .run(&mut store, Role::Hr)
            .await
            .unwrap();
        assert!(swe.is_complete() && hr.is_complete());
        assert_eq!(hr.records_written, 12);

        let mut analyses = Vec::new();
        for &role in &bp.resumes.roles {
            let records = store.load_run_records(role).unwrap();
            let analysis = analyze_role(role, &records, &bp.personas, &bp.analysis);
            save_analysis(&mut store, &analysis).unwrap();
            analyses.push(analysis);
        }

        let swe = &analyses[0];
        assert_eq!(swe.role, Role::Swe);
        assert_eq!(swe.records_used, 12);
        assert!(swe
            .rates
            .iter()
            .filter(|r| r.appearances > 0)
            .all(|r| r.selection_rate.is_some()));

        let hr = &analyses[1];
        assert_eq!(hr.records_used, 0);
        assert_eq!(hr.unparsed.len(), 12);
        assert!(hr.rates.iter().all(|r| r.selection_rate.is_none()));
        assert!(hr.fisher.is_empty());
        assert!(!hr.gee.converged);

        let written = render_plots(&mut store, &analyses, PlotOptions::from_config(&bp.analysis))
            .unwrap();
        assert_eq!(written.len(), 14);
        assert!(dir.path().join("metrics/hr_subgroup_rates.csv").exists());
        assert!(dir.path().join("plots/hr_gee_forest.svg").exists());
    }
}

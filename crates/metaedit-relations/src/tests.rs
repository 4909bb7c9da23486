//! End-to-end tests for collection, paste enforcement and the clipboard

use super::*;
use metaedit_model::{InMemoryProvider, Model, ModelId, ProviderRegistry, Record};
use serde_json::json;
use std::sync::Arc;

const PAGES: &str = r#"{
    "name": "tl_page",
    "basic": {"mode": "hierarchical", "data_provider": "tl_page", "root_data_provider": "tl_page"},
    "palettes": {"__selector__": ["type"], "default": "{title_legend},title,type"},
    "relationships": {
        "root": {"provider": "tl_page",
                 "filter": [{"property": "pid", "value": 0}],
                 "setters": [{"property": "pid", "value": 0}]},
        "children": [
            {"from": "tl_page", "to": "tl_page",
             "filter": [{"local": "id", "remote": "pid"}],
             "inverse": [{"local": "pid", "remote": "id"}],
             "setters": [{"to_field": "pid", "from_field": "id"}]},
            {"from": "tl_page", "to": "tl_article",
             "filter": [{"local": "id", "remote": "pid"}],
             "setters": [{"to_field": "pid", "from_field": "id"}]}
        ]
    }
}"#;

/// ```text
/// 1 ─┬─ 2 ─┬─ 4
///    │     └─ article 10
///    └─ 3
/// 5
/// ```
fn page_tree() -> (ContainerDefinition, ProviderRegistry) {
    let page = |id: i64, pid: i64| Model::with_id("tl_page", id).with_property("pid", pid);
    let pages = InMemoryProvider::with_records(
        "tl_page",
        vec![page(1, 0), page(2, 1), page(3, 1), page(4, 2), page(5, 0), page(7, 8), page(8, 7)],
    );
    let articles = InMemoryProvider::with_records(
        "tl_article",
        vec![Model::with_id("tl_article", 10).with_property("pid", 2)],
    );
    let providers = ProviderRegistry::new()
        .with(Arc::new(pages))
        .with(Arc::new(articles));
    let definition = ContainerDefinition::from_json_str(PAGES).unwrap();
    (definition, providers)
}

fn page_id(id: i64) -> ModelId {
    ModelId::new("tl_page", id)
}

fn ids(models: &[Model]) -> Vec<String> {
    models
        .iter()
        .filter_map(Record::model_id)
        .map(|id| id.serialized())
        .collect()
}

#[test]
fn test_get_model() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);

    let page = collector.get_model_from_serialized("tl_page::4").unwrap().unwrap();
    assert_eq!(page.property("pid"), Some(&json!(2)));
    assert!(collector.get_model(&page_id(99)).unwrap().is_none());
    assert!(matches!(
        collector.get_model(&ModelId::new("tl_news", 1)),
        Err(RelationshipError::Model(_))
    ));
    assert!(collector.get_model_from_serialized("tl_page").is_err());
}

#[test]
fn test_search_parent() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);

    let leaf = collector.get_model(&page_id(4)).unwrap().unwrap();
    let parent = collector.search_parent_of(&leaf).unwrap().unwrap();
    assert_eq!(parent.model_id(), Some(page_id(2)));

    let root = collector.get_model(&page_id(1)).unwrap().unwrap();
    assert!(collector.search_parent_of(&root).unwrap().is_none());

    let article = collector
        .get_model(&ModelId::new("tl_article", 10))
        .unwrap()
        .unwrap();
    let parent = collector.search_parent_from_hierarchical(&article).unwrap().unwrap();
    assert_eq!(parent.model_id(), Some(page_id(2)));
}

#[test]
fn test_children_siblings_and_roots() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);
    let two = collector.get_model(&page_id(2)).unwrap().unwrap();

    assert_eq!(ids(&collector.collect_children_of(&two, None).unwrap()), ["tl_page::4", "tl_article::10"]);
    assert_eq!(
        ids(&collector.collect_children_of(&two, Some("tl_article")).unwrap()),
        ["tl_article::10"]
    );
    assert_eq!(ids(&collector.collect_siblings_of(&two, None).unwrap()), ["tl_page::2", "tl_page::3"]);
    assert_eq!(
        ids(&collector.collect_siblings_of(&two, Some("tl_page")).unwrap()),
        ["tl_page::2", "tl_page::3"]
    );

    let five = collector.get_model(&page_id(5)).unwrap().unwrap();
    assert_eq!(ids(&collector.collect_siblings_of(&five, None).unwrap()), ["tl_page::1", "tl_page::5"]);
    assert_eq!(collector.collect_root_ids().unwrap(), vec![page_id(1), page_id(5)]);
}

#[test]
fn test_descendants_include_start_and_survive_cycles() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);

    let all = collector.collect_descendant_ids(&page_id(1)).unwrap();
    let serialized: Vec<String> = all.iter().map(ModelId::serialized).collect();
    assert_eq!(
        serialized,
        ["tl_page::1", "tl_page::2", "tl_page::3", "tl_page::4", "tl_article::10"]
    );

    let cyclic = collector.collect_descendant_ids(&page_id(7)).unwrap();
    assert_eq!(cyclic, vec![page_id(7), page_id(8)]);
}

#[test]
fn test_paste_into() {
    let (definition, providers) = page_tree();
    let enforcer = RelationshipEnforcer::new(&definition, &providers);
    let clipboard = Clipboard::new();

    let mut model = Model::new("tl_page");
    let input = RequestParameters::new().with(PARAM_INTO, "tl_page::2");
    let state = enforcer.enforce(&mut model, &input, &clipboard).unwrap();
    assert_eq!(state, PasteState::RelationshipApplied { parent: Some(page_id(2)) });
    assert_eq!(model.property("pid"), Some(&json!(2)));

    let input = RequestParameters::new().with(PARAM_INTO, "tl_page::0");
    assert_eq!(enforcer.enforce(&mut model, &input, &clipboard).unwrap(), PasteState::RootAssigned);
    assert_eq!(model.property("pid"), Some(&json!(0)));

    let input = RequestParameters::new().with(PARAM_INTO, "tl_page::99");
    assert_eq!(
        enforcer.enforce(&mut model, &input, &clipboard).unwrap_err(),
        RelationshipError::ModelNotFound("tl_page::99".into())
    );

    assert_eq!(
        enforcer.enforce(&mut model, &RequestParameters::new(), &clipboard).unwrap(),
        PasteState::Idle
    );
}

#[test]
fn test_paste_after() {
    let (definition, providers) = page_tree();
    let enforcer = RelationshipEnforcer::new(&definition, &providers);
    let clipboard = Clipboard::new();
    let mut model = Model::with_id("tl_page", 20).with_property("pid", 0);

    let input = RequestParameters::new().with(PARAM_AFTER, "tl_page::4");
    enforcer.enforce(&mut model, &input, &clipboard).unwrap();
    assert_eq!(model.property("pid"), Some(&json!(2)));

    for sibling in ["tl_page::5", "tl_page::99"] {
        let input = RequestParameters::new().with(PARAM_AFTER, sibling);
        assert_eq!(enforcer.enforce(&mut model, &input, &clipboard).unwrap(), PasteState::RootAssigned);
        assert_eq!(model.property("pid"), Some(&json!(0)));
    }
}

#[test]
fn test_pid_forces_the_parent() {
    let (definition, providers) = page_tree();
    let enforcer = RelationshipEnforcer::new(&definition, &providers);
    let clipboard = Clipboard::new();
    let mut model = Model::new("tl_page");

    let input = RequestParameters::new()
        .with(PARAM_AFTER, "tl_page::5")
        .with(PARAM_PID, "tl_page::3");
    let state = enforcer.enforce(&mut model, &input, &clipboard).unwrap();
    assert_eq!(state, PasteState::RelationshipApplied { parent: Some(page_id(3)) });
    assert_eq!(model.property("pid"), Some(&json!(3)));

    let input = RequestParameters::new().with(PARAM_PID, "tl_page::42");
    assert!(matches!(
        enforcer.enforce(&mut model, &input, &clipboard),
        Err(RelationshipError::ModelNotFound(_))
    ));
}

#[test]
fn test_cut_subtree_rejects_circular_targets() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);
    let enforcer = RelationshipEnforcer::new(&definition, &providers);

    let mut clipboard = Clipboard::new();
    let marked = cut_with_descendants(&mut clipboard, &collector, &page_id(2)).unwrap();
    assert_eq!(marked.len(), 3);
    assert!(clipboard.has(&ClipboardItem::cut(page_id(2))));
    assert!(clipboard.is_circular(&ModelId::new("tl_article", 10)));

    let mut cut = collector.get_model(&page_id(2)).unwrap().unwrap();
    for target in [(PARAM_INTO, "tl_page::4"), (PARAM_AFTER, "tl_page::2")] {
        let input = RequestParameters::new().with(target.0, target.1);
        assert!(matches!(
            enforcer.enforce(&mut cut, &input, &clipboard),
            Err(RelationshipError::CircularReference(_))
        ));
    }
    assert_eq!(cut.property("pid"), Some(&json!(1)));

    let input = RequestParameters::new().with(PARAM_PID, "tl_page::4");
    assert!(matches!(
        enforcer.enforce(&mut cut, &input, &clipboard),
        Err(RelationshipError::CircularReference(id)) if id == "tl_page::4"
    ));
    assert_eq!(cut.property("pid"), Some(&json!(1)));

    let input = RequestParameters::new().with(PARAM_AFTER, "tl_page::5");
    assert_eq!(enforcer.enforce(&mut cut, &input, &clipboard).unwrap(), PasteState::RootAssigned);

    let input = RequestParameters::new().with(PARAM_INTO, "tl_page::3");
    enforcer.enforce(&mut cut, &input, &clipboard).unwrap();
    assert_eq!(cut.property("pid"), Some(&json!(3)));
}

#[test]
fn test_finished_cut_releases_its_subtree() {
    let (definition, providers) = page_tree();
    let collector = ModelCollector::new(&definition, &providers);
    let enforcer = RelationshipEnforcer::new(&definition, &providers);

    let mut clipboard = Clipboard::new();
    cut_with_descendants(&mut clipboard, &collector, &page_id(2)).unwrap();
    assert_eq!(clipboard.remove_by_id(&page_id(2)), 1);
    assert!(clipboard.circular_ids().is_empty());

    let mut pasted = Model::new("tl_page");
    let input = RequestParameters::new().with(PARAM_INTO, "tl_page::4");
    assert_eq!(
        enforcer.enforce(&mut pasted, &input, &clipboard).unwrap(),
        PasteState::RelationshipApplied { parent: Some(page_id(4)) }
    );
    assert_eq!(pasted.property("pid"), Some(&json!(4)));

    let session = InMemorySessionStorage::new();
    clipboard.save_to(&session);
    assert!(!Clipboard::load_from(&session).is_circular(&page_id(4)));
}

#[test]
fn test_parented_list() {
    let definition = ContainerDefinition::from_json_str(
        r#"{
            "name": "tl_content",
            "basic": {"mode": "parented", "data_provider": "tl_content", "parent_data_provider": "tl_article"},
            "relationships": {"children": [
                {"from": "tl_article", "to": "tl_content",
                 "filter": [{"local": "id", "remote": "pid"}, {"remote": "ptable", "remote_value": "tl_article"}],
                 "setters": [{"to_field": "pid", "from_field": "id"}, {"to_field": "ptable", "value": "tl_article"}]}
            ]}
        }"#,
    )
    .unwrap();
    let content = |id: i64, pid: i64| {
        Model::with_id("tl_content", id)
            .with_property("pid", pid)
            .with_property("ptable", "tl_article")
    };
    let providers = ProviderRegistry::new()
        .with(Arc::new(InMemoryProvider::with_records(
            "tl_article",
            vec![Model::with_id("tl_article", 1), Model::with_id("tl_article", 2)],
        )))
        .with(Arc::new(InMemoryProvider::with_records(
            "tl_content",
            vec![content(10, 1), content(11, 1), content(12, 2)],
        )));

    let collector = ModelCollector::new(&definition, &providers);
    let twelve = collector.get_model(&ModelId::new("tl_content", 12)).unwrap().unwrap();
    let parent = collector.search_parent_of(&twelve).unwrap().unwrap();
    assert_eq!(parent.model_id(), Some(ModelId::new("tl_article", 2)));

    let ten = collector.get_model(&ModelId::new("tl_content", 10)).unwrap().unwrap();
    assert_eq!(ids(&collector.collect_siblings_of(&ten, None).unwrap()), ["tl_content::10", "tl_content::11"]);
    assert!(collector.collect_root_ids().unwrap().is_empty());
    assert!(!collector.manager().is_root(&ten));

    let enforcer = RelationshipEnforcer::new(&definition, &providers);
    let mut pasted = Model::new("tl_content");
    let input = RequestParameters::new().with(PARAM_AFTER, "tl_content::12");
    enforcer.enforce(&mut pasted, &input, &Clipboard::new()).unwrap();
    assert_eq!(pasted.property("pid"), Some(&json!(2)));
    assert_eq!(pasted.property("ptable"), Some(&json!("tl_article")));
}

#[test]
fn test_flat_only_honors_pid() {
    let definition = ContainerDefinition::from_json_str(
        r#"{"name": "tl_log", "basic": {"mode": "flat", "data_provider": "tl_log"}}"#,
    )
    .unwrap();
    let providers = ProviderRegistry::new().with(Arc::new(InMemoryProvider::with_records(
        "tl_log",
        vec![Model::with_id("tl_log", 1), Model::with_id("tl_log", 2)],
    )));
    let enforcer = RelationshipEnforcer::new(&definition, &providers);
    let mut model = Model::with_id("tl_log", 3);

    let input = RequestParameters::new().with(PARAM_INTO, "tl_log::1");
    assert_eq!(
        enforcer.enforce(&mut model, &input, &Clipboard::new()).unwrap(),
        PasteState::Idle
    );

    let collector = ModelCollector::new(&definition, &providers);
    assert_eq!(collector.collect_root_ids().unwrap().len(), 2);
    assert!(collector.search_parent_of(&model).unwrap().is_none());
}

#[test]
fn test_config_validation() {
    let err = ContainerDefinition::from_json_str(
        r#"{"name": "tl_page", "basic": {"mode": "hierarchical", "data_provider": "tl_page"}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");

    let err = ContainerDefinition::from_json_str(
        r#"{"name": "tl_content", "basic": {"mode": "parented_list", "data_provider": "tl_content"}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("parent_data_provider"), "{err}");

    let bad_setter = r#"{
        "name": "tl_page",
        "basic": {"mode": "flat", "data_provider": "tl_page"},
        "relationships": {"children": [{"from": "tl_page", "to": "tl_page",
            "filter": [{"local": "id", "remote": "pid"}],
            "setters": [{"to_field": "pid"}]}]}
    }"#;
    assert!(matches!(
        ContainerDefinition::from_json_str(bad_setter),
        Err(ConfigError::Invalid { .. })
    ));

    let unfiltered_root = r#"{
        "name": "tl_page",
        "basic": {"mode": "hierarchical", "data_provider": "tl_page"},
        "relationships": {"root": {"provider": "tl_page", "setters": [{"property": "pid", "value": 0}]}}
    }"#;
    let err = ContainerDefinition::from_json_str(unfiltered_root).unwrap_err();
    assert!(err.to_string().contains("has no filter"), "{err}");

    assert!(matches!(
        ContainerDefinition::from_json_str("{"),
        Err(ConfigError::Json(_))
    ));

    let (definition, _) = page_tree();
    assert_eq!(definition.name(), "tl_page");
    assert!(definition.palettes().has_palette("default"));
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tl_page.json");
    std::fs::write(&path, PAGES).unwrap();
    let definition = ContainerDefinition::from_path(&path).unwrap();
    assert_eq!(definition.basic().mode, ContainerMode::Hierarchical);

    let missing = ContainerDefinition::from_path(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));
}

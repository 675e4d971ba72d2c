//! Resolution-order properties of the registry and the engine surface.

use recast::core::{
    NT_UNSTRUCTURED,
    model::assign,
    registry::{LookupQuery, ModelRegistry},
};
use recast::prelude::*;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Teaser {
    title: String,
}

impl ResourceModel for Teaser {
    const SPEC: &'static ModelSpec = &ModelSpec {
        type_name: "Teaser",
        new: || Box::new(Teaser::default()),
        fields: &[FieldSpec {
            name: "title",
            path: "",
            kind: FieldKind::Property,
            wrapper: FieldWrapper::Eager,
            set: |m, v, c| assign::<Teaser, String>(m, v, c, "title", |t, v| t.title = v),
        }],
    };
}

#[derive(Debug, Default)]
struct Component {
    title: String,
}

impl ResourceModel for Component {
    const SPEC: &'static ModelSpec = &ModelSpec {
        type_name: "Component",
        new: || Box::new(Component::default()),
        fields: &[FieldSpec {
            name: "title",
            path: "",
            kind: FieldKind::Property,
            wrapper: FieldWrapper::Eager,
            set: |m, v, c| assign::<Component, String>(m, v, c, "title", |t, v| t.title = v),
        }],
    };
}

#[derive(Debug, Default)]
struct Fallback;

impl ResourceModel for Fallback {
    const SPEC: &'static ModelSpec = &ModelSpec {
        type_name: "Fallback",
        new: || Box::new(Fallback),
        fields: &[],
    };
}

fn hierarchy() -> Arc<StaticTypeHierarchy> {
    Arc::new(
        StaticTypeHierarchy::new().with_chain("app/teaser", ["app/component", NT_UNSTRUCTURED]),
    )
}

fn engine() -> Arc<Engine> {
    Engine::builder().with_hierarchy(hierarchy()).build()
}

fn teaser_tree() -> MemoryTree {
    MemoryTree::builder()
        .resource(
            "/content/page/teaser",
            "app/teaser",
            Properties::new().with("title", "Hello"),
        )
        .build()
}

#[test]
fn most_specific_definition_wins_end_to_end() {
    let registry = ModelRegistry::new();
    registry.register(vec![
        ModelDefinition::of::<Component>("base", ["app/component"], ProviderId::new(1)),
        ModelDefinition::of::<Teaser>("teaser", ["app/teaser"], ProviderId::new(1)),
    ]);

    let chain: Vec<ResourceType> = ["app/teaser", "app/component", NT_UNSTRUCTURED]
        .into_iter()
        .map(ResourceType::from)
        .collect();
    let results = registry.lookup_most_specific(&LookupQuery {
        chain: &chain,
        include_base_types: false,
        name: None,
        model: None,
    });

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].definition.name, "teaser");
    assert_eq!(results[0].matched_type.as_str(), "app/teaser");
    assert_eq!(results[0].specificity_rank, 0);
}

#[test]
fn super_type_models_are_shadowed_by_the_specific_one() {
    let engine = engine();
    engine
        .register_models(vec![
            ModelDefinition::of::<Component>("base", ["app/component"], ProviderId::new(1)),
            ModelDefinition::of::<Teaser>("teaser", ["app/teaser"], ProviderId::new(1)),
        ])
        .unwrap();

    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    let resource = teaser_tree().get("/content/page/teaser").unwrap();

    let model = engine
        .resolve_most_specific(&resource, &scope)
        .unwrap()
        .expect("the teaser model should resolve");
    assert!(model.downcast_ref::<Teaser>().is_some());

    // The shadowed super-type model is still reachable for its own type.
    assert!(
        engine
            .adapt::<Component>(&resource, &scope)
            .unwrap()
            .is_some()
    );
}

#[test]
fn adapting_an_unmapped_resource_is_a_miss_not_an_error() {
    let engine = engine();
    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    let resource = teaser_tree().get("/content/page/teaser").unwrap();

    assert!(engine.adapt::<Teaser>(&resource, &scope).unwrap().is_none());
}

#[test]
fn two_definitions_of_one_model_for_one_type_are_ambiguous() {
    let engine = engine();
    engine
        .register_models(vec![
            ModelDefinition::of::<Teaser>("teaser", ["app/teaser"], ProviderId::new(1)),
            ModelDefinition::of::<Teaser>("hero", ["app/teaser"], ProviderId::new(2)),
        ])
        .unwrap();

    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    let resource = teaser_tree().get("/content/page/teaser").unwrap();

    let err = engine.adapt::<Teaser>(&resource, &scope).unwrap_err();
    let ResolveError::Ambiguous { candidates, .. } = err else {
        panic!("expected an ambiguity error");
    };
    assert!(candidates.contains(&"teaser".to_string()));
    assert!(candidates.contains(&"hero".to_string()));

    // A name filter matching exactly one of them resolves the ambiguity.
    let named = engine
        .resolve_most_specific_with_name(&resource, "hero", &scope)
        .unwrap()
        .expect("the named definition should resolve");
    assert!(named.downcast_ref::<Teaser>().is_some());
}

#[test]
fn ambiguous_discovery_without_a_name_collapses_to_none() {
    let engine = engine();
    engine
        .register_models(vec![
            ModelDefinition::of::<Teaser>("teaser", ["app/teaser"], ProviderId::new(1)),
            ModelDefinition::of::<Component>("other", ["app/teaser"], ProviderId::new(1)),
        ])
        .unwrap();

    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    let resource = teaser_tree().get("/content/page/teaser").unwrap();

    assert!(
        engine
            .resolve_most_specific(&resource, &scope)
            .unwrap()
            .is_none()
    );
}

#[test]
fn base_typed_models_require_opt_in_or_a_name() {
    let engine = engine();
    engine
        .register_models(vec![ModelDefinition::of::<Fallback>(
            "fallback",
            [NT_UNSTRUCTURED],
            ProviderId::new(1),
        )])
        .unwrap();

    let scope = engine.begin_scope(RequestState::for_path("/content"));
    let tree = MemoryTree::builder()
        .resource("/content/thing", NT_UNSTRUCTURED, Properties::new())
        .build();
    let resource = tree.get("/content/thing").unwrap();

    assert!(
        engine
            .resolve_most_specific(&resource, &scope)
            .unwrap()
            .is_none()
    );
    assert!(
        engine
            .resolve_most_specific_including_base_types(&resource, &scope)
            .unwrap()
            .is_some()
    );
    assert!(
        engine
            .resolve_most_specific_with_name(&resource, "fallback", &scope)
            .unwrap()
            .is_some()
    );
}

#[test]
fn unregistering_a_provider_restores_prior_resolution() {
    let engine = engine();
    engine
        .register_models(vec![ModelDefinition::of::<Teaser>(
            "teaser",
            ["app/teaser"],
            ProviderId::new(9),
        )])
        .unwrap();

    let resource = teaser_tree().get("/content/page/teaser").unwrap();
    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    assert!(engine.adapt::<Teaser>(&resource, &scope).unwrap().is_some());

    assert_eq!(engine.unregister_models(ProviderId::new(9)), 1);

    // A fresh scope, so the earlier positive entry cannot answer.
    let scope = engine.begin_scope(RequestState::for_path("/content/page"));
    assert!(engine.adapt::<Teaser>(&resource, &scope).unwrap().is_none());
}

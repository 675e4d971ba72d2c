//! Sink events emitted along the resolution path.

use recast::core::{
    model::assign,
    obs::{EventSink, ResolveEvent},
};
use recast::prelude::*;
use std::sync::{Arc, Mutex};

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

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ResolveEvent>>,
}

impl EventSink for Recorder {
    fn on_event(&self, event: ResolveEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[test]
fn the_sink_observes_the_whole_resolution_path() {
    let recorder = Arc::new(Recorder::default());
    let engine = Engine::builder()
        .with_sink(Arc::clone(&recorder) as Arc<dyn EventSink>)
        .build();

    engine
        .register_models(vec![ModelDefinition::of::<Teaser>(
            "teaser",
            ["app/teaser"],
            ProviderId::new(1),
        )])
        .unwrap();

    let tree = MemoryTree::builder()
        .resource(
            "/content/teaser",
            "app/teaser",
            Properties::new().with("title", "Hello"),
        )
        .build();
    let scope = engine.begin_scope(RequestState::for_path("/content/teaser"));
    let resource = tree.get("/content/teaser").unwrap();
    engine.adapt::<Teaser>(&resource, &scope).unwrap().unwrap();
    engine.adapt::<Teaser>(&resource, &scope).unwrap().unwrap();
    engine.unregister_models(ProviderId::new(1));

    let events = recorder.events.lock().unwrap();
    let mut kinds = events.iter().map(|event| match event {
        ResolveEvent::ModelsRegistered { count } => format!("registered:{count}"),
        ResolveEvent::ModelsUnregistered { count } => format!("unregistered:{count}"),
        ResolveEvent::CacheMiss { .. } => "cache-miss".to_string(),
        ResolveEvent::CacheHit { .. } => "cache-hit".to_string(),
        ResolveEvent::LookupHit { model, .. } => format!("lookup-hit:{model}"),
        ResolveEvent::LookupMiss { .. } => "lookup-miss".to_string(),
        ResolveEvent::MappingStarted { .. } => "mapping-started".to_string(),
        ResolveEvent::MappingFinished { .. } => "mapping-finished".to_string(),
    });

    assert_eq!(kinds.next().as_deref(), Some("registered:1"));
    assert_eq!(kinds.next().as_deref(), Some("cache-miss"));
    assert_eq!(kinds.next().as_deref(), Some("lookup-hit:Teaser"));
    assert_eq!(kinds.next().as_deref(), Some("mapping-started"));
    assert_eq!(kinds.next().as_deref(), Some("mapping-finished"));
    assert_eq!(kinds.next().as_deref(), Some("cache-hit"));
    assert_eq!(kinds.next().as_deref(), Some("unregistered:1"));
    assert!(kinds.next().is_none());
}

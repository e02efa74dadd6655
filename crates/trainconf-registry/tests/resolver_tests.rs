//! Tests for component name resolution

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use trainconf_registry::{
    Component, ComponentResolver, ComponentSource, DomainRegistry, Error, Instance, Params,
    Result, SourceChain,
};

#[derive(Debug)]
struct Tagged(&'static str);

impl Component for Tagged {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn tagged(tag: &'static str) -> impl Fn(Params) -> Result<Arc<dyn Component>> + Send + Sync {
    move |params: Params| {
        params.finish()?;
        Ok(Arc::new(Tagged(tag)) as Arc<dyn Component>)
    }
}

fn registry(domain: &str, entries: &[(&str, &'static str)]) -> Arc<DomainRegistry> {
    let registry = Arc::new(DomainRegistry::new(domain));
    for &(name, tag) in entries {
        registry.register_fn(name, tagged(tag)).unwrap();
    }
    registry
}

fn tag_of(resolver: &ComponentResolver, name: &str) -> &'static str {
    let built = resolver.resolve(name).unwrap().construct(BTreeMap::new()).unwrap();
    built.as_any().downcast_ref::<Tagged>().unwrap().0
}

fn fixture() -> ComponentResolver {
    let seg = registry("seg", &[("Unet", "seg-unet")]);
    let det = registry("det", &[("Unet", "det-unet"), ("PointPillars", "det-pp")]);
    let models = registry("models", &[("Unet", "local-unet"), ("SGD", "local-sgd")]);

    ComponentResolver::new()
        .with_family("$seg", seg)
        .with_family("$det", det)
        .with_domain(models)
        .with_builtins()
}

#[rstest]
#[case("$seg:Unet", "seg-unet")]
#[case("$SEG:Unet", "seg-unet")]
#[case("$det:Unet", "det-unet")]
#[case("Unet", "local-unet")]
#[case("SGD", "local-sgd")]
fn test_resolution_order(#[case] name: &str, #[case] expected: &str) {
    assert_eq!(tag_of(&fixture(), name), expected);
}

#[test]
fn test_family_miss_does_not_fall_through() {
    let err = fixture().resolve("$seg:PointPillars").unwrap_err();
    assert_eq!(
        err.to_string(),
        "The specified component was not found: PointPillars in $seg"
    );
}

#[test]
fn test_unknown_name_is_not_found() {
    let err = fixture().resolve("Nope").unwrap_err();
    assert!(matches!(err, Error::ComponentNotFound { ref name } if name == "Nope"));
    assert_eq!(err.to_string(), "The specified component was not found: Nope");
}

#[test]
fn test_builtins_are_found_after_locals() {
    let resolver = fixture();
    for name in ["Constant", "PolynomialDecay", "Momentum", "AdamW", "Conv2D"] {
        assert!(resolver.contains(name), "{name} should resolve");
    }
}

#[test]
fn test_resolved_builtin_constructs_a_schedule() {
    let ty = fixture().resolve("Constant").unwrap();
    let schedule = ty
        .construct(BTreeMap::from([(
            "learning_rate".to_string(),
            Instance::Float(0.01),
        )]))
        .unwrap();
    assert_eq!(schedule.as_lr_schedule().unwrap().learning_rate_at(3), 0.01);
}

#[test]
fn test_registrations_after_resolver_creation_are_visible() {
    let models = Arc::new(DomainRegistry::new("models"));
    let resolver = ComponentResolver::new().with_domain(models.clone());
    assert!(!resolver.contains("Late"));

    models.register_fn("Late", tagged("late")).unwrap();
    assert_eq!(tag_of(&resolver, "Late"), "late");
}

#[test]
fn test_family_can_be_a_chain() {
    let a = registry("a", &[("Only", "a-only")]);
    let b = registry("b", &[("Only", "b-only"), ("Extra", "b-extra")]);
    let chain: Arc<dyn ComponentSource> = Arc::new(SourceChain::new("ab").with(a).with(b));

    let resolver = ComponentResolver::new().with_family("$ab", chain);
    assert_eq!(tag_of(&resolver, "$ab:Only"), "a-only");
    assert_eq!(tag_of(&resolver, "$ab:Extra"), "b-extra");
}

//! Tests against the process-wide registries
//!
//! Each test registers under its own names since the registries are shared
//! by every test in this binary.

use std::any::Any;
use std::sync::Arc;
use trainconf_core::Config;
use trainconf_registry::{Component, DomainRegistry, Params, Result, manager};
use trainconf_test_utils::TestDocs;

#[derive(Debug)]
struct Named(String);

impl Component for Named {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn named(tag: &'static str) -> impl Fn(Params) -> Result<Arc<dyn Component>> + Send + Sync {
    move |params: Params| {
        params.finish()?;
        Ok(Arc::new(Named(tag.to_string())) as Arc<dyn Component>)
    }
}

fn tag(config: &Config) -> String {
    config.model().unwrap().downcast_ref::<Named>().unwrap().0.clone()
}

#[test]
fn test_default_resolver_sees_manager_registries() {
    manager::MODELS
        .register_fn("ManagerModel", named("manager"))
        .unwrap();

    let docs = TestDocs::new();
    let path = docs.write("train.yml", "model:\n  type: ManagerModel\n");
    let config = Config::from_path(path).unwrap();

    assert_eq!(tag(&config), "manager");
}

#[test]
fn test_earlier_domains_win() {
    manager::BACKBONES
        .register_fn("ShadowedModel", named("backbones"))
        .unwrap();
    manager::MODELS
        .register_fn("ShadowedModel", named("models"))
        .unwrap();

    let docs = TestDocs::new();
    let path = docs.write("train.yml", "model:\n  type: ShadowedModel\n");
    assert_eq!(tag(&Config::from_path(path).unwrap()), "backbones");
}

#[test]
fn test_registered_family_is_addressable_by_prefix() {
    let family = Arc::new(DomainRegistry::new("vendor"));
    family.register_fn("VendorNet", named("vendor")).unwrap();
    manager::register_family("$vendor", family);

    let docs = TestDocs::new();
    let path = docs.write("train.yml", "model:\n  type: $Vendor:VendorNet\n");
    assert_eq!(tag(&Config::from_path(path).unwrap()), "vendor");

    let path = docs.write("missing.yml", "model:\n  type: $vendor:Nope\n");
    let err = Config::from_path(path).unwrap().model().unwrap_err();
    assert_eq!(
        err.to_string(),
        "The specified component was not found: Nope in $vendor"
    );
}

#[test]
fn test_duplicate_registration_is_rejected() {
    manager::DATASETS
        .register_fn("DupDataset", named("first"))
        .unwrap();
    assert!(
        manager::DATASETS
            .register_fn("DupDataset", named("second"))
            .is_err()
    );
}

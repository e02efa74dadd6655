//! Process-wide component registries
//!
//! Collaborators register their components here at startup;
//! [`ComponentResolver::from_manager`](crate::ComponentResolver::from_manager)
//! searches them in the order of [`domains`].

use crate::{ComponentSource, DomainRegistry, ExternalFamily};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

macro_rules! domain_registries {
    ($($name:ident => $domain:literal),+ $(,)?) => {
        $(
            pub static $name: LazyLock<Arc<DomainRegistry>> =
                LazyLock::new(|| Arc::new(DomainRegistry::new($domain)));
        )+

        /// Every process-wide registry, in lookup order.
        pub fn domains() -> Vec<Arc<dyn ComponentSource>> {
            vec![$(Arc::clone(&*$name) as Arc<dyn ComponentSource>),+]
        }
    };
}

domain_registries! {
    BACKBONES => "backbones",
    MODELS => "models",
    DATASETS => "datasets",
    TRANSFORMS => "transforms",
    LOSSES => "losses",
    NECKS => "necks",
    HEADS => "heads",
    LR_SCHEDULERS => "lr_schedulers",
    OPTIMIZERS => "optimizers",
}

static FAMILIES: LazyLock<RwLock<Vec<ExternalFamily>>> = LazyLock::new(|| RwLock::new(Vec::new()));

/// Make an external family available to resolvers created afterwards.
///
/// A family registered again under the same prefix (ignoring case) replaces
/// the previous one.
pub fn register_family(prefix: impl Into<String>, source: Arc<dyn ComponentSource>) {
    let family = ExternalFamily::new(prefix, source);
    let mut families = FAMILIES.write().unwrap_or_else(PoisonError::into_inner);
    families.retain(|existing| !existing.prefix().eq_ignore_ascii_case(family.prefix()));
    tracing::debug!(prefix = family.prefix(), "Registered external family");
    families.push(family);
}

pub fn families() -> Vec<ExternalFamily> {
    FAMILIES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

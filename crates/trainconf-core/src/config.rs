//! Training configuration with lazily built, cached components

use crate::{Error, Instantiator, Result};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trainconf_registry::{ComponentResolver, ComponentType, Instance};
use trainconf_tree::{ConfigMap, ConfigValue, DocumentFormat, DocumentLoader, keypath};

const BATCH_SIZE: &str = "batch_size";
const ITERS: &str = "iters";
const EPOCHS: &str = "epochs";
const LR_SCHEDULER: &str = "lr_scheduler";
const LEARNING_RATE: &str = "learning_rate";
const OPTIMIZER: &str = "optimizer";
const PARAMETERS: &str = "parameters";
const MODEL: &str = "model";
const TRAIN_DATASET: &str = "train_dataset";
const VAL_DATASET: &str = "val_dataset";

/// Values that replace what the documents say.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    /// Written to `lr_scheduler.learning_rate`
    pub learning_rate: Option<f64>,
    pub batch_size: Option<usize>,
    pub iters: Option<usize>,
    pub epochs: Option<usize>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn iters(mut self, iters: usize) -> Self {
        self.iters = Some(iters);
        self
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = Some(epochs);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    path: PathBuf,
    resolver: Option<Arc<ComponentResolver>>,
    overrides: Overrides,
}

impl ConfigBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolver: None,
            overrides: Overrides::default(),
        }
    }

    /// Resolve `type` names with `resolver` instead of the process-wide
    /// registries.
    pub fn resolver(mut self, resolver: impl Into<Arc<ComponentResolver>>) -> Self {
        self.resolver = Some(resolver.into());
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load the document chain and apply the overrides.
    ///
    /// Nothing is instantiated yet.
    pub fn build(self) -> Result<Config> {
        let document = DocumentLoader::new().load_document(&self.path)?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ComponentResolver::from_manager()));

        let mut config = Config {
            path: document.path,
            format: document.format,
            tree: document.tree,
            resolver,
            model: OnceCell::new(),
            train_dataset: OnceCell::new(),
            val_dataset: OnceCell::new(),
        };
        config.update(&self.overrides)?;

        tracing::debug!(path = %config.path.display(), format = %config.format, "Loaded configuration");
        Ok(config)
    }
}

/// How long training runs, as reported by [`Config::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingLength {
    Iters(usize),
    /// Epoch count, if the documents give one
    Epochs(Option<usize>),
}

/// The resolved training setup.
#[derive(Debug, Clone)]
pub struct Summary {
    pub length: TrainingLength,
    pub optimizer: Instance,
    pub model: Instance,
    pub train_dataset: Option<Instance>,
    pub val_dataset: Option<Instance>,
    pub batch_size: usize,
}

/// A merged training configuration.
///
/// Sections are turned into objects on first access. `model`,
/// `train_dataset` and `val_dataset` are built once and then shared;
/// `lr_scheduler` and `optimizer` are built fresh every time. The caches make
/// `Config` usable from one thread only.
#[derive(Debug)]
pub struct Config {
    path: PathBuf,
    format: DocumentFormat,
    tree: ConfigMap,
    resolver: Arc<ComponentResolver>,
    model: OnceCell<Instance>,
    train_dataset: OnceCell<Instance>,
    val_dataset: OnceCell<Instance>,
}

impl Config {
    /// Load `path` and resolve names through the process-wide registries.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        ConfigBuilder::new(path).build()
    }

    pub fn builder(path: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format of the top-level document.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// The merged tree.
    pub fn tree(&self) -> &ConfigMap {
        &self.tree
    }

    pub fn resolver(&self) -> &ComponentResolver {
        &self.resolver
    }

    fn instantiator(&self) -> Instantiator<'_> {
        Instantiator::new(&self.resolver)
    }

    /// Apply `overrides` to the tree.
    ///
    /// Objects that were already built are kept as they are.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSection`] if a learning rate is given but there is no
    /// `lr_scheduler` section. Nothing is changed in that case.
    pub fn update(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(learning_rate) = overrides.learning_rate {
            match self.tree.get_mut(LR_SCHEDULER) {
                Some(ConfigValue::Mapping(section)) => {
                    section.insert(LEARNING_RATE.to_string(), learning_rate.into());
                }
                None | Some(ConfigValue::Null) => return Err(Error::missing_section(LR_SCHEDULER)),
                Some(other) => {
                    return Err(Error::InvalidSection {
                        section: LR_SCHEDULER.to_string(),
                        expected: "a mapping",
                        found: other.type_name(),
                    });
                }
            }
        }

        for (key, value) in [
            (BATCH_SIZE, overrides.batch_size),
            (ITERS, overrides.iters),
            (EPOCHS, overrides.epochs),
        ] {
            if let Some(value) = value {
                self.tree.insert(key.to_string(), value.into());
            }
        }

        if !overrides.is_empty() {
            self.warn_if_stale("overrides");
        }
        Ok(())
    }

    /// Set the value at a dotted path such as `model.backbone.depth`,
    /// creating intermediate mappings.
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<()> {
        keypath::assign(&mut self.tree, path, value.into())?;
        self.warn_if_stale(path);
        Ok(())
    }

    fn warn_if_stale(&self, changed: &str) {
        let stale: Vec<&str> = [
            (MODEL, &self.model),
            (TRAIN_DATASET, &self.train_dataset),
            (VAL_DATASET, &self.val_dataset),
        ]
        .into_iter()
        .filter(|(_, cell)| cell.get().is_some())
        .map(|(name, _)| name)
        .collect();

        if !stale.is_empty() {
            tracing::warn!(
                changed,
                stale = ?stale,
                "Configuration changed after objects were built; cached objects keep the old values"
            );
        }
    }

    /// A non-empty section as a mapping; absent, null or empty is `None`.
    fn section(&self, name: &str) -> Result<Option<&ConfigMap>> {
        match self.tree.get(name) {
            None => Ok(None),
            Some(value) if value.is_empty() => Ok(None),
            Some(ConfigValue::Mapping(map)) => Ok(Some(map)),
            Some(other) => Err(Error::InvalidSection {
                section: name.to_string(),
                expected: "a mapping",
                found: other.type_name(),
            }),
        }
    }

    fn required_section(&self, name: &str) -> Result<&ConfigMap> {
        self.section(name)?
            .ok_or_else(|| Error::missing_section(name))
    }

    fn count(&self, name: &str) -> Result<Option<usize>> {
        match self.tree.get(name) {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| Error::InvalidSection {
                    section: name.to_string(),
                    expected: "a non-negative integer",
                    found: value.type_name(),
                }),
        }
    }

    /// Samples per batch; 1 unless configured.
    pub fn batch_size(&self) -> Result<usize> {
        Ok(self.count(BATCH_SIZE)?.unwrap_or(1))
    }

    pub fn iters(&self) -> Result<Option<usize>> {
        self.count(ITERS)
    }

    pub fn epochs(&self) -> Result<Option<usize>> {
        self.count(EPOCHS)
    }

    /// Build a fresh learning-rate schedule from `lr_scheduler`.
    pub fn lr_scheduler(&self) -> Result<Instance> {
        let section = self.required_section(LR_SCHEDULER)?;
        self.instantiator().instantiate_map(section)
    }

    /// Build a fresh optimizer from `optimizer`.
    ///
    /// The optimizer receives a new schedule as `learning_rate` and the
    /// cached model's trainable parameters as `parameters`. The model is
    /// built first if needed.
    pub fn optimizer(&self) -> Result<Instance> {
        let model = self.model()?;
        let model = model.as_object().ok_or_else(|| Error::NotAComponent {
            section: MODEL.to_string(),
            found: model.type_name(),
        })?;
        let parameters = Instance::from_parameters(model.parameters());
        let learning_rate = self.lr_scheduler()?;

        let empty = ConfigMap::new();
        let section = self.section(OPTIMIZER)?.unwrap_or(&empty);
        let injected = BTreeMap::from([
            (LEARNING_RATE.to_string(), learning_rate),
            (PARAMETERS.to_string(), parameters),
        ]);
        self.instantiator().instantiate_injected(section, injected)
    }

    /// The model, built on first access and shared afterwards.
    pub fn model(&self) -> Result<&Instance> {
        let section = self.required_section(MODEL)?;
        cached(&self.model, || self.instantiator().instantiate_map(section))
    }

    /// The training dataset, or `None` if the section is absent or empty.
    pub fn train_dataset(&self) -> Result<Option<&Instance>> {
        self.dataset(TRAIN_DATASET, &self.train_dataset)
    }

    pub fn val_dataset(&self) -> Result<Option<&Instance>> {
        self.dataset(VAL_DATASET, &self.val_dataset)
    }

    fn dataset<'c>(&'c self, name: &str, cell: &'c OnceCell<Instance>) -> Result<Option<&'c Instance>> {
        match self.section(name)? {
            Some(section) => {
                cached(cell, || self.instantiator().instantiate_map(section)).map(Some)
            }
            None => Ok(None),
        }
    }

    /// A copy of the raw `train_dataset` section; empty if absent.
    pub fn train_dataset_config(&self) -> Result<ConfigMap> {
        Ok(self.section(TRAIN_DATASET)?.cloned().unwrap_or_default())
    }

    pub fn val_dataset_config(&self) -> Result<ConfigMap> {
        Ok(self.section(VAL_DATASET)?.cloned().unwrap_or_default())
    }

    /// The component type named by `train_dataset.type`, for callers that
    /// build dataset variants themselves.
    pub fn train_dataset_class(&self) -> Result<ComponentType> {
        self.dataset_class(TRAIN_DATASET)
    }

    pub fn val_dataset_class(&self) -> Result<ComponentType> {
        self.dataset_class(VAL_DATASET)
    }

    fn dataset_class(&self, name: &str) -> Result<ComponentType> {
        let section = self.required_section(name)?;
        self.instantiator()
            .component_type(section)?
            .ok_or_else(|| Error::MissingType {
                section: name.to_string(),
            })
    }

    /// Resolve the objects a training loop needs.
    ///
    /// Reports `iters` if set, otherwise `epochs`.
    pub fn summary(&self) -> Result<Summary> {
        let length = match self.iters()? {
            Some(iters) => TrainingLength::Iters(iters),
            None => TrainingLength::Epochs(self.epochs()?),
        };

        Ok(Summary {
            length,
            optimizer: self.optimizer()?,
            model: self.model()?.clone(),
            train_dataset: self.train_dataset()?.cloned(),
            val_dataset: self.val_dataset()?.cloned(),
            batch_size: self.batch_size()?,
        })
    }

    /// The merged tree rendered in the format of the top-level document.
    ///
    /// The `_base_` key is gone, so the output loads on its own.
    pub fn to_document_string(&self) -> Result<String> {
        Ok(self.format.render(&self.tree)?)
    }
}

/// Stand-in for the unstable `OnceCell::get_or_try_init`.
fn cached<'c>(
    cell: &'c OnceCell<Instance>,
    build: impl FnOnce() -> Result<Instance>,
) -> Result<&'c Instance> {
    if let Some(instance) = cell.get() {
        return Ok(instance);
    }
    let instance = build()?;
    Ok(cell.get_or_init(|| instance))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = DocumentFormat::Yaml
            .render(&self.tree)
            .map_err(|_| fmt::Error)?;
        writeln!(f, "---------------Config Information---------------")?;
        write!(f, "{dump}")?;
        write!(f, "------------------------------------------------")
    }
}

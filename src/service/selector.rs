// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of a startup request to a loaded instance.
//!
//! The selector is built once per process and injected wherever the current
//! instance is needed. The first successful resolution is memoized; later
//! callers read the cached instance without touching any strategy.

use super::home::MachineConfigurationHome;
use super::loaded::{LoadedApplicationInstance, HOME_DIRECTORY_SETTING};
use crate::adapters::crypto::{default_machine_key_encryptor, UnavailableEncryptor};
use crate::adapters::env_file::EnvFileLocator;
use crate::adapters::formats::format_for_path;
use crate::adapters::registry::default_registry_hive;
use crate::adapters::strategies::{
    EnvFileStrategy, EnvironmentStrategy, PersistedInstanceStrategy, WorkingDirectoryStrategy,
};
use crate::adapters::{AggregatedKeyValueStore, EnvironmentVariableMapping, FileKeyValueStore};
use crate::domain::instance::instance_names_match;
use crate::domain::{
    ApplicationInstanceRecord, ApplicationName, ConfigError, ProtectionLevel, Result,
    StartupInstanceRequest, DEFAULT_INSTANCE_NAME,
};
use crate::ports::{
    ApplicationInstanceStrategy, ConfigurationContributor, EnvironmentReader,
    InstanceConfiguration, KeyValueStore, MachineKeyEncryptor, ProcessEnvironment, SettingsMap,
    WritableKeyValueStore,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// A callback run once, after the first successful resolution.
pub type LoadedHook = Box<dyn FnOnce(&LoadedApplicationInstance) + Send>;

/// Resolves which instance this process runs as.
///
/// # Examples
///
/// ```rust
/// use instancecfg::adapters::crypto::UnavailableEncryptor;
/// use instancecfg::adapters::strategies::PersistedInstanceStrategy;
/// use instancecfg::adapters::MemoryHive;
/// use instancecfg::domain::{ApplicationName, StartupInstanceRequest};
/// use instancecfg::service::ApplicationInstanceSelector;
/// use std::sync::Arc;
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let persisted = Arc::new(PersistedInstanceStrategy::new(
///     dir.path().join("Instances"),
///     Arc::new(MemoryHive::new()),
///     Arc::new(UnavailableEncryptor),
/// ));
///
/// let selector = ApplicationInstanceSelector::builder(ApplicationName::new("Acme", "Agent"))
///     .request(StartupInstanceRequest::Dynamic)
///     .with_persisted_store(persisted)
///     .build()?;
///
/// assert!(selector.try_current().is_none());
/// let created = selector.create_default_instance(&dir.path().join("agent.config"), None)?;
/// assert_eq!(created.instance_name(), Some("Default"));
/// # Ok(())
/// # }
/// ```
pub struct ApplicationInstanceSelector {
    application: ApplicationName,
    request: RwLock<StartupInstanceRequest>,
    strategies: Vec<Arc<dyn ApplicationInstanceStrategy>>,
    contributors: Vec<Arc<dyn ConfigurationContributor>>,
    persisted: Option<Arc<PersistedInstanceStrategy>>,
    encryptor: Arc<dyn MachineKeyEncryptor>,
    current: RwLock<Option<Arc<LoadedApplicationInstance>>>,
    loading: Mutex<()>,
    on_loaded: Mutex<Option<LoadedHook>>,
}

impl ApplicationInstanceSelector {
    /// Creates a selector builder.
    pub fn builder(application: ApplicationName) -> ApplicationInstanceSelectorBuilder {
        ApplicationInstanceSelectorBuilder::new(application)
    }

    /// Creates a selector with the standard strategies for this machine.
    ///
    /// The machine configuration home comes from `machine_config_home`, the
    /// override variable, or the platform default. Strategies: persisted
    /// instances (with the legacy registry), the nearest `.env` above the
    /// executable, and the process environment.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use instancecfg::adapters::{EnvironmentVariableMapping, StartupArgs};
    /// use instancecfg::domain::ApplicationName;
    /// use instancecfg::service::ApplicationInstanceSelector;
    ///
    /// # fn main() -> instancecfg::domain::Result<()> {
    /// let args = StartupArgs::from_env_args()?;
    /// let home = args.machine_config_home.clone();
    /// let mapping = EnvironmentVariableMapping::new().required("AGENT_SERVER_URL", "Agent.ServerUrl");
    ///
    /// let selector = ApplicationInstanceSelector::with_defaults(
    ///     ApplicationName::new("Acme", "Agent"),
    ///     args.into_request()?,
    ///     home.as_deref(),
    ///     mapping,
    /// )?;
    /// let instance = selector.current()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_defaults(
        application: ApplicationName,
        request: StartupInstanceRequest,
        machine_config_home: Option<&Path>,
        mapping: EnvironmentVariableMapping,
    ) -> Result<Self> {
        let environment: Arc<dyn EnvironmentReader> = Arc::new(ProcessEnvironment);
        let home = MachineConfigurationHome::resolve(&application, machine_config_home, environment.as_ref())?;
        tracing::debug!("Machine configuration home directory is {}", home.root().display());

        let encryptor = default_machine_key_encryptor(&home.machine_key_path());
        let persisted = Arc::new(PersistedInstanceStrategy::new(
            home.instances_directory(&application),
            default_registry_hive(),
            Arc::clone(&encryptor),
        ));

        Self::builder(application)
            .request(request)
            .with_encryptor(encryptor)
            .with_persisted_store(persisted)
            .with_env_file(EnvFileLocator::from_current_exe()?, mapping.clone(), Arc::clone(&environment))
            .with_environment(mapping, environment)
            .build()
    }

    /// Returns the application name.
    pub fn application(&self) -> &ApplicationName {
        &self.application
    }

    /// Returns the request being resolved.
    pub fn request(&self) -> Result<StartupInstanceRequest> {
        self.request
            .read()
            .map(|r| r.clone())
            .map_err(|_| ConfigError::lock_poisoned("selector"))
    }

    fn cached(&self) -> Result<Option<Arc<LoadedApplicationInstance>>> {
        self.current
            .read()
            .map(|c| c.clone())
            .map_err(|_| ConfigError::lock_poisoned("selector"))
    }

    fn set_cached(&self, value: Option<Arc<LoadedApplicationInstance>>) -> Result<()> {
        let mut current = self
            .current
            .write()
            .map_err(|_| ConfigError::lock_poisoned("selector"))?;
        *current = value;
        Ok(())
    }

    /// Returns the current instance, resolving it on first use.
    ///
    /// Resolution failures are returned to every caller and never retried
    /// automatically; fix the cause and call again.
    pub fn current(&self) -> Result<Arc<LoadedApplicationInstance>> {
        if let Some(current) = self.cached()? {
            return Ok(current);
        }

        let _loading = self
            .loading
            .lock()
            .map_err(|_| ConfigError::lock_poisoned("selector"))?;
        if let Some(current) = self.cached()? {
            return Ok(current);
        }

        let loaded = Arc::new(self.load()?);
        self.set_cached(Some(Arc::clone(&loaded)))?;
        self.notify_loaded(&loaded)?;
        Ok(loaded)
    }

    /// Returns the current instance, or `None` if it cannot be resolved.
    pub fn try_current(&self) -> Option<Arc<LoadedApplicationInstance>> {
        match self.current() {
            Ok(current) => Some(current),
            Err(e) => {
                tracing::debug!("Current instance could not be loaded: {}", e);
                None
            }
        }
    }

    fn notify_loaded(&self, loaded: &LoadedApplicationInstance) -> Result<()> {
        let hook = self
            .on_loaded
            .lock()
            .map_err(|_| ConfigError::lock_poisoned("selector"))?
            .take();
        if let Some(hook) = hook {
            hook(loaded);
        }
        Ok(())
    }

    /// Lists every known instance, highest-priority strategy first.
    ///
    /// A name listed by more than one strategy is reported once, from the
    /// strategy that would win resolution.
    pub fn list_instances(&self) -> Result<Vec<ApplicationInstanceRecord>> {
        let mut listed: Vec<ApplicationInstanceRecord> = Vec::new();
        for strategy in &self.strategies {
            let seen = listed.len();
            for record in strategy.list_instances(&self.application)? {
                if !listed[..seen].iter().any(|r| r.instance_name == record.instance_name) {
                    listed.push(record);
                }
            }
        }
        Ok(listed)
    }

    fn available_instance_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for strategy in &self.strategies {
            match strategy.list_instances(&self.application) {
                Ok(records) => names.extend(records.into_iter().map(|r| r.instance_name)),
                Err(e) => tracing::debug!("Strategy '{}' could not list instances: {}", strategy.name(), e),
            }
        }
        sort_names(&mut names);
        names.dedup();
        names
    }

    fn load(&self) -> Result<LoadedApplicationInstance> {
        let request = self.request()?;
        tracing::debug!("Resolving {} of {}", request, self.application);

        match request {
            StartupInstanceRequest::ConfigFilePath(path) => {
                if !path.is_file() {
                    return Err(ConfigError::ConfigurationFileNotFound { path });
                }
                tracing::debug!("Loading configuration from {}", path.display());
                let store = Arc::new(FileKeyValueStore::open(&path, Arc::clone(&self.encryptor)));
                self.assemble(None, InstanceConfiguration::writable(store, Some(path)))
            }
            StartupInstanceRequest::NamedInstance(name) => {
                let (strategy, record) = self.locate_named(&name)?;
                self.load_record(strategy.as_ref(), record)
            }
            StartupInstanceRequest::Dynamic => {
                let (strategy, record) = self.locate_dynamic()?;
                self.load_record(strategy.as_ref(), record)
            }
        }
    }

    fn load_record(
        &self,
        strategy: &dyn ApplicationInstanceStrategy,
        record: ApplicationInstanceRecord,
    ) -> Result<LoadedApplicationInstance> {
        tracing::debug!(
            "Loading instance {} from strategy '{}'",
            record.instance_name,
            strategy.name()
        );
        let configuration = strategy.loaded_configuration(&record)?.ok_or_else(|| {
            ConfigError::source_error(
                strategy.name(),
                format!("listed instance {} but could not load it", record.instance_name),
            )
        })?;
        self.assemble(Some(record.instance_name), configuration)
    }

    fn locate_named(
        &self,
        name: &str,
    ) -> Result<(Arc<dyn ApplicationInstanceStrategy>, ApplicationInstanceRecord)> {
        for strategy in &self.strategies {
            let matches: Vec<ApplicationInstanceRecord> = strategy
                .list_instances(&self.application)?
                .into_iter()
                .filter(|r| instance_names_match(&r.instance_name, name))
                .collect();
            if matches.is_empty() {
                continue;
            }
            let record = match_instance_name(&self.application, name, matches)?;
            return Ok((Arc::clone(strategy), record));
        }

        Err(ConfigError::InstanceNotFound {
            application: self.application.to_string(),
            name: name.to_string(),
            available: self.available_instance_names(),
        })
    }

    fn locate_dynamic(&self) -> Result<(Arc<dyn ApplicationInstanceStrategy>, ApplicationInstanceRecord)> {
        for strategy in &self.strategies {
            if !strategy.any_instances_configured(&self.application)? {
                continue;
            }
            let records = strategy.list_instances(&self.application)?;
            if records.is_empty() {
                continue;
            }
            let record = pick_unnamed(&self.application, records)?;
            return Ok((Arc::clone(strategy), record));
        }

        Err(ConfigError::NoInstancesConfigured {
            application: self.application.to_string(),
        })
    }

    fn assemble(
        &self,
        instance_name: Option<String>,
        configuration: InstanceConfiguration,
    ) -> Result<LoadedApplicationInstance> {
        let mut layers: Vec<Arc<dyn KeyValueStore>> = Vec::new();
        for contributor in &self.contributors {
            if let Some(store) = contributor.contributed_configuration(&self.application)? {
                tracing::debug!("Layering settings contributed by '{}'", contributor.name());
                layers.push(store);
            }
        }
        layers.push(configuration.store);

        Ok(LoadedApplicationInstance::new(
            self.application.clone(),
            instance_name,
            configuration.configuration_path,
            Arc::new(AggregatedKeyValueStore::new(layers)),
            configuration.writable,
        ))
    }

    fn persisted(&self, operation: &str) -> Result<&PersistedInstanceStrategy> {
        self.persisted
            .as_deref()
            .ok_or_else(|| ConfigError::unsupported("selector", operation))
    }

    /// Creates (or updates) an instance and makes it current.
    ///
    /// The home directory defaults to the settings file's directory; a
    /// relative settings path is taken relative to the home directory when one
    /// is given, else to the working directory. An empty settings document is
    /// written if none exists, the descriptor is registered and the home
    /// directory is stored in the instance's settings. Resolution then runs
    /// again for the new name, so no restart is needed.
    ///
    /// A name that differs from an existing instance only by case is rejected.
    pub fn create_instance(
        &self,
        instance_name: &str,
        configuration_file: &Path,
        home_directory: Option<&Path>,
    ) -> Result<Arc<LoadedApplicationInstance>> {
        let persisted = self.persisted("creating instances")?;

        // A name whose descriptor file is already taken by another name
        // (`My Agent` and `my-agent`) collides as well.
        let existing = match persisted.index().get(instance_name)? {
            Some(descriptor) if descriptor.name != instance_name => Some(descriptor.name),
            _ => persisted
                .list_instances(&self.application)?
                .into_iter()
                .map(|r| r.instance_name)
                .find(|name| name != instance_name && instance_names_match(name, instance_name)),
        };
        if let Some(existing) = existing {
            return Err(ConfigError::InstanceAlreadyExists {
                application: self.application.to_string(),
                name: instance_name.to_string(),
                existing,
            });
        }

        let configuration_file = if configuration_file.is_absolute() {
            configuration_file.to_path_buf()
        } else {
            match home_directory {
                Some(home) => home.join(configuration_file),
                None => std::env::current_dir()?.join(configuration_file),
            }
        };
        let home = match home_directory {
            Some(home) => home.to_path_buf(),
            None => configuration_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        if let Some(parent) = configuration_file.parent() {
            fs::create_dir_all(parent)?;
        }
        if !configuration_file.exists() {
            tracing::info!("Creating empty configuration file: {}", configuration_file.display());
            let empty = format_for_path(&configuration_file).render_flat(&SettingsMap::new())?;
            fs::write(&configuration_file, empty)?;
        }

        persisted.register(instance_name, &configuration_file)?;

        tracing::info!("Setting home directory to: {}", home.display());
        let store = FileKeyValueStore::open(&configuration_file, Arc::clone(&self.encryptor));
        store.set(
            HOME_DIRECTORY_SETTING,
            Some(&home.to_string_lossy()),
            ProtectionLevel::None,
        )?;
        store.save()?;

        {
            let mut request = self
                .request
                .write()
                .map_err(|_| ConfigError::lock_poisoned("selector"))?;
            *request = StartupInstanceRequest::NamedInstance(instance_name.to_string());
        }
        self.set_cached(None)?;
        self.current()
    }

    /// Creates the `Default` instance and makes it current.
    pub fn create_default_instance(
        &self,
        configuration_file: &Path,
        home_directory: Option<&Path>,
    ) -> Result<Arc<LoadedApplicationInstance>> {
        self.create_instance(DEFAULT_INSTANCE_NAME, configuration_file, home_directory)
    }

    /// Removes the descriptor (and any legacy registry entry) of an instance.
    ///
    /// With `None`, the current instance is deleted. The memoized instance is
    /// cleared when it is the one deleted. Settings files are left in place.
    pub fn delete_instance(&self, instance_name: Option<&str>) -> Result<()> {
        let persisted = self.persisted("deleting instances")?;

        let target = match instance_name {
            Some(name) => name.to_string(),
            None => self
                .current()?
                .instance_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    ConfigError::unsupported("selector", "deleting an instance loaded from a configuration file")
                })?,
        };

        tracing::info!("Deleting instance: {}", target);
        if !persisted.delete(&self.application, &target)? {
            return Err(ConfigError::InstanceNotFound {
                application: self.application.to_string(),
                name: target,
                available: self.available_instance_names(),
            });
        }

        let deleted_current = self
            .cached()?
            .and_then(|c| c.instance_name().map(|n| instance_names_match(n, &target)))
            .unwrap_or(false);
        if deleted_current {
            self.set_cached(None)?;
        }
        Ok(())
    }
}

/// Resolves a requested name against the case-insensitive matches of one strategy.
///
/// A single match is accepted as-is. Several matches need an exact-case match.
pub(crate) fn match_instance_name(
    application: &ApplicationName,
    name: &str,
    mut matches: Vec<ApplicationInstanceRecord>,
) -> Result<ApplicationInstanceRecord> {
    if matches.len() == 1 {
        return Ok(matches.swap_remove(0));
    }

    let mut candidates: Vec<String> = matches.iter().map(|r| r.instance_name.clone()).collect();
    match matches.into_iter().find(|r| r.instance_name == name) {
        Some(record) => Ok(record),
        None => {
            sort_names(&mut candidates);
            Err(ConfigError::AmbiguousInstance {
                application: application.to_string(),
                name: name.to_string(),
                candidates,
            })
        }
    }
}

/// Picks an instance when no name was requested: the default instance if
/// there is one, else the only instance.
pub(crate) fn pick_unnamed(
    application: &ApplicationName,
    mut records: Vec<ApplicationInstanceRecord>,
) -> Result<ApplicationInstanceRecord> {
    let default = records
        .iter()
        .position(|r| r.instance_name == DEFAULT_INSTANCE_NAME)
        .or_else(|| records.iter().position(ApplicationInstanceRecord::is_default));
    if let Some(index) = default {
        return Ok(records.swap_remove(index));
    }
    if records.len() == 1 {
        return Ok(records.swap_remove(0));
    }

    let mut available: Vec<String> = records.into_iter().map(|r| r.instance_name).collect();
    sort_names(&mut available);
    Err(ConfigError::InstanceNameRequired {
        application: application.to_string(),
        available,
    })
}

fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
}

/// Builder for constructing an [`ApplicationInstanceSelector`].
pub struct ApplicationInstanceSelectorBuilder {
    application: ApplicationName,
    request: StartupInstanceRequest,
    strategies: Vec<Arc<dyn ApplicationInstanceStrategy>>,
    contributors: Vec<Arc<dyn ConfigurationContributor>>,
    persisted: Option<Arc<PersistedInstanceStrategy>>,
    encryptor: Option<Arc<dyn MachineKeyEncryptor>>,
    on_loaded: Option<LoadedHook>,
}

impl ApplicationInstanceSelectorBuilder {
    /// Creates a builder with no strategies and a dynamic request.
    pub fn new(application: ApplicationName) -> Self {
        Self {
            application,
            request: StartupInstanceRequest::Dynamic,
            strategies: Vec::new(),
            contributors: Vec::new(),
            persisted: None,
            encryptor: None,
            on_loaded: None,
        }
    }

    /// Sets the request to resolve.
    pub fn request(mut self, request: StartupInstanceRequest) -> Self {
        self.request = request;
        self
    }

    /// Adds an instance strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn ApplicationInstanceStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Adds a configuration contributor.
    pub fn with_contributor(mut self, contributor: Arc<dyn ConfigurationContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    /// Adds the persisted instance store. Instance creation and deletion go through it.
    pub fn with_persisted_store(mut self, persisted: Arc<PersistedInstanceStrategy>) -> Self {
        if self.encryptor.is_none() {
            self.encryptor = Some(persisted.encryptor());
        }
        self.persisted = Some(Arc::clone(&persisted));
        self.with_strategy(persisted)
    }

    /// Adds the `.env` strategy and contributor.
    pub fn with_env_file(
        self,
        locator: EnvFileLocator,
        mapping: EnvironmentVariableMapping,
        environment: Arc<dyn EnvironmentReader>,
    ) -> Self {
        let strategy = Arc::new(EnvFileStrategy::new(locator, mapping, environment));
        self.with_strategy(Arc::clone(&strategy) as Arc<dyn ApplicationInstanceStrategy>)
            .with_contributor(strategy)
    }

    /// Adds the environment variable strategy and contributor.
    pub fn with_environment(
        self,
        mapping: EnvironmentVariableMapping,
        environment: Arc<dyn EnvironmentReader>,
    ) -> Self {
        let strategy = Arc::new(EnvironmentStrategy::new(mapping, environment));
        self.with_strategy(Arc::clone(&strategy) as Arc<dyn ApplicationInstanceStrategy>)
            .with_contributor(strategy)
    }

    /// Adds the working-directory strategy for `<dir>/<Product>.config`.
    pub fn with_working_directory(self, directory: impl Into<PathBuf>) -> Self {
        let encryptor = self
            .encryptor
            .clone()
            .unwrap_or_else(|| Arc::new(UnavailableEncryptor));
        self.with_strategy(Arc::new(WorkingDirectoryStrategy::new(directory, encryptor)))
    }

    /// Sets the encryptor for stores the selector opens itself.
    pub fn with_encryptor(mut self, encryptor: Arc<dyn MachineKeyEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Registers a callback run once after the first successful resolution,
    /// typically to point log output at [`LoadedApplicationInstance::log_directory`].
    pub fn on_loaded(mut self, hook: impl FnOnce(&LoadedApplicationInstance) + Send + 'static) -> Self {
        self.on_loaded = Some(Box::new(hook));
        self
    }

    /// Builds the selector.
    pub fn build(self) -> Result<ApplicationInstanceSelector> {
        let mut strategies = self.strategies;
        strategies.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        let mut contributors = self.contributors;
        contributors.sort_by_key(|c| std::cmp::Reverse(c.priority()));

        Ok(ApplicationInstanceSelector {
            application: self.application,
            request: RwLock::new(self.request),
            strategies,
            contributors,
            persisted: self.persisted,
            encryptor: self
                .encryptor
                .unwrap_or_else(|| Arc::new(UnavailableEncryptor)),
            current: RwLock::new(None),
            loading: Mutex::new(()),
            on_loaded: Mutex::new(self.on_loaded),
        })
    }
}

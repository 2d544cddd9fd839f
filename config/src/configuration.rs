//! # Layered Configuration
//!
//! The aggregator: registers layers, keeps the merged snapshot current and
//! coordinates live reloads.
//!
//! A single reader-writer lock guards the layer list and the merged
//! snapshot. Registration and reload swaps take the write lock; every query
//! takes the read lock. The snapshot is replaced as a whole `Arc`, so readers
//! never observe a partially applied reload. Source loads during a reload run
//! before the write lock is taken.

use crate::binder;
use crate::diff::ChangeRecord;
use crate::dump;
use crate::events::{ChangeEvent, ConfigEvent, ErrorEvent, EventHub};
use crate::hot_reload::{LayerWatch, ReloadTarget};
use crate::layer::{LayerInfo, LayerRegistry};
use crate::options::ConfigOptions;
use crate::precedence;
use crate::query::ConfigReader;
use crate::section::{self, Section};
use errors::ConfigError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use sources::{
    CommandLineSource, ConfigKey, ConfigSource, EnvironmentSource, FileFormat, FileSource,
    FlatMap, MemorySource, SourceKind, eq_ignore_case,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use validator::Validate;

/// Per-file registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// A missing optional file registers as an empty layer.
    pub optional: bool,
    /// Watch the file and reload the layer when it changes.
    pub reload_on_change: bool,
}

impl FileOptions {
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Self::default()
        }
    }

    pub fn watched() -> Self {
        Self {
            reload_on_change: true,
            ..Self::default()
        }
    }
}

pub(crate) struct State {
    pub(crate) registry: LayerRegistry,
    pub(crate) merged: Arc<FlatMap>,
    pub(crate) live: bool,
}

pub(crate) struct Shared {
    pub(crate) state: RwLock<State>,
    pub(crate) events: EventHub,
    pub(crate) options: ConfigOptions,
    pub(crate) secret_hints: RwLock<Vec<String>>,
}

/// Layered configuration aggregator.
///
/// ## Usage
/// ```rust,no_run
/// use config::{ConfigReader, Configuration, FileOptions};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Configuration::new();
///     config.add_file("appsettings.json", FileOptions::watched())?;
///     config.add_environment(Some("APP_"))?;
///     config.add_command_line(std::env::args().skip(1))?;
///
///     let port = config.get_int("Server:Port", 8080);
///     config.require_keys(&["Database:Host"])?;
///     println!("port = {}", port);
///     Ok(())
/// }
/// ```
///
/// ## Precedence
/// Later registrations win: with the calls above, command-line values
/// override environment variables, which override the file.
///
/// ## Teardown
/// Dropping the aggregator (or calling [`Configuration::shutdown`]) releases
/// every file watch and waits for in-flight reloads to finish.
pub struct Configuration {
    pub(crate) shared: Arc<Shared>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_checked(ConfigOptions::default())
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigOptions) -> Result<Self, ConfigError> {
        Ok(Self::from_checked(options.checked()?))
    }

    fn from_checked(options: ConfigOptions) -> Self {
        let shared = Shared {
            state: RwLock::new(State {
                registry: LayerRegistry::default(),
                merged: Arc::new(FlatMap::new()),
                live: true,
            }),
            events: EventHub::new(options.event_capacity),
            secret_hints: RwLock::new(options.secret_hints.clone()),
            options,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.shared.options
    }

    /// Registers a layer and returns its precedence order.
    ///
    /// The source is loaded immediately; a load failure fails the
    /// registration. If the source asks for reload and is file-backed, a
    /// watch is established afterwards. A watch failure is reported on the
    /// error channel and the layer stays registered without live reload.
    pub fn add_source<S>(&self, source: S) -> Result<u64, ConfigError>
    where
        S: ConfigSource + 'static,
    {
        let source: Arc<dyn ConfigSource> = Arc::new(source);
        let location = source.location();

        if !self.shared.state.read().live {
            return Err(ConfigError::Disposed);
        }

        let data = source.load().map_err(|e| {
            error!("Failed to load configuration layer {}: {}", location, e);
            ConfigError::load(e)
        })?;
        let key_count = data.len();

        let order = {
            let mut state = self.shared.state.write();
            if !state.live {
                return Err(ConfigError::Disposed);
            }
            let order = state.registry.register(Arc::clone(&source), data);
            state.merged = Arc::new(precedence::rebuild(&state.registry));
            order
        };

        info!(
            "Registered configuration layer {} ({}, order {}, {} keys)",
            location,
            source.kind(),
            order,
            key_count
        );

        if source.supports_reload() && !source.is_dynamic() {
            self.watch_layer(order, Path::new(&location), source.kind());
        }

        Ok(order)
    }

    fn watch_layer(&self, order: u64, path: &Path, kind: SourceKind) {
        let Some(watch_state) = self
            .shared
            .state
            .read()
            .registry
            .get(order)
            .map(|layer| Arc::clone(&layer.watch_state))
        else {
            return;
        };

        let shared: Arc<dyn ReloadTarget> = self.shared.clone();
        let target: Weak<dyn ReloadTarget> = Arc::downgrade(&shared);
        drop(shared);

        let debounce = self.shared.options.debounce();
        match LayerWatch::start(path, order, debounce, watch_state, target) {
            Ok(watch) => {
                let mut state = self.shared.state.write();
                let live = state.live;
                let rejected = match state.registry.get_mut(order) {
                    Some(layer) if live => {
                        layer.watch = Some(watch);
                        None
                    }
                    _ => Some(watch),
                };
                drop(state);
                // Shut down while the watch was starting: release it outside
                // the lock so an in-flight reload can finish.
                drop(rejected);
            }
            Err(e) => {
                warn!("Live reload disabled for {}: {}", path.display(), e);
                self.shared.events.publish_error(ErrorEvent {
                    location: path.display().to_string(),
                    source_kind: kind,
                    error: e,
                });
            }
        }
    }

    /// Registers a file, detecting its format from the extension.
    pub fn add_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        let source = FileSource::detect(path).map_err(ConfigError::load)?;
        self.add_source(
            source
                .optional(options.optional)
                .reload_on_change(options.reload_on_change),
        )
    }

    fn add_file_as(
        &self,
        path: impl AsRef<Path>,
        format: FileFormat,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_source(
            FileSource::new(path, format)
                .optional(options.optional)
                .reload_on_change(options.reload_on_change),
        )
    }

    pub fn add_json_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_file_as(path, FileFormat::Json, options)
    }

    pub fn add_yaml_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_file_as(path, FileFormat::Yaml, options)
    }

    pub fn add_toml_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_file_as(path, FileFormat::Toml, options)
    }

    pub fn add_ini_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_file_as(path, FileFormat::Ini, options)
    }

    pub fn add_env_file(
        &self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<u64, ConfigError> {
        self.add_file_as(path, FileFormat::DotEnv, options)
    }

    /// Registers the process environment, optionally filtered by a
    /// case-insensitive name prefix.
    pub fn add_environment(&self, prefix: Option<&str>) -> Result<u64, ConfigError> {
        self.add_source(EnvironmentSource::new(prefix))
    }

    pub fn add_command_line<I, S>(&self, args: I) -> Result<u64, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_source(CommandLineSource::new(args))
    }

    pub fn add_in_memory<I, K, V>(&self, entries: I) -> Result<u64, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.add_source(MemorySource::new(entries))
    }

    /// Reloads every file-backed layer now and returns the overall change.
    ///
    /// Each layer goes through the same cycle as a watch-triggered reload,
    /// including change and error events. Every layer is attempted; the
    /// first failure is returned after the pass.
    ///
    /// ## Partial failure
    /// A failing layer keeps its previous data while the other layers still
    /// apply their new data. The error return then carries no change record;
    /// the applied changes were already published as change events and are
    /// visible in the snapshot.
    pub fn reload(&self) -> Result<ChangeRecord, ConfigError> {
        let (orders, before) = {
            let state = self.shared.state.read();
            if !state.live {
                return Err(ConfigError::Disposed);
            }
            let orders: Vec<u64> = state
                .registry
                .layers()
                .iter()
                .filter(|layer| !layer.is_dynamic)
                .map(|layer| layer.order)
                .collect();
            (orders, Arc::clone(&state.merged))
        };

        let mut first_error = None;
        for order in orders {
            if let Err(e) = self.shared.reload_cycle(order) {
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        let after = Arc::clone(&self.shared.state.read().merged);
        Ok(ChangeRecord::between(&before, &after))
    }

    /// Registered layers in ascending precedence order.
    pub fn layers(&self) -> Vec<LayerInfo> {
        self.shared.state.read().registry.info()
    }

    /// Receiver for change and error events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.shared.events.subscribe()
    }

    /// Registers a callback invoked on the reload thread for every change.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.shared.events.on_change(Arc::new(handler));
    }

    /// Registers a callback invoked for watch-setup and reload failures.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.shared.events.on_error(Arc::new(handler));
    }

    /// Whether [`Configuration::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        !self.shared.state.read().live
    }

    /// Releases every file watch and stops further reloads.
    ///
    /// Idempotent. Returns once in-flight reloads have finished, except when
    /// called from a change handler, which runs on a reload thread itself.
    /// Queries keep answering from the last snapshot.
    pub fn shutdown(&self) {
        let watches = {
            let mut state = self.shared.state.write();
            if !state.live {
                return;
            }
            state.live = false;
            state.registry.take_watches()
        };
        // An in-flight reload may be waiting for the write lock; release the
        // watches after it is dropped.
        let released = watches.len();
        drop(watches);
        info!("Configuration shut down, released {} watch(es)", released);
    }

    pub(crate) fn snapshot_arc(&self) -> Arc<FlatMap> {
        Arc::clone(&self.shared.state.read().merged)
    }

    /// Paths of file-backed layers, in precedence order.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.shared
            .state
            .read()
            .registry
            .layers()
            .iter()
            .filter(|layer| layer.kind.is_file())
            .map(|layer| PathBuf::from(&layer.location))
            .collect()
    }
}

impl Drop for Configuration {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    /// One reload cycle: load outside the lock, then swap, rebuild and diff
    /// under the write lock. A failed load leaves all state untouched.
    pub(crate) fn reload_cycle(&self, order: u64) -> Result<ChangeRecord, ConfigError> {
        let (source, reload_lock) = {
            let state = self.state.read();
            if !state.live {
                return Err(ConfigError::Disposed);
            }
            match state.registry.get(order) {
                Some(layer) => (Arc::clone(&layer.source), Arc::clone(&layer.reload_lock)),
                None => return Ok(ChangeRecord::default()),
            }
        };
        let location = source.location();
        let kind = source.kind();

        // Serialize reloads of this layer; released before any handler runs.
        let outcome = {
            let _serial = reload_lock.lock();
            match source.load() {
                Ok(data) => {
                    let mut state = self.state.write();
                    if !state.live {
                        return Err(ConfigError::Disposed);
                    }
                    let before = Arc::clone(&state.merged);
                    state.registry.replace_data(order, data);
                    let after = Arc::new(precedence::rebuild(&state.registry));
                    state.merged = Arc::clone(&after);
                    Ok(ChangeRecord::between(&before, &after))
                }
                Err(e) => Err(ConfigError::load(e)),
            }
        };

        let changes = match outcome {
            Ok(changes) => changes,
            Err(error) => {
                error!("Failed to reload {}: {}", location, error);
                self.events.publish_error(ErrorEvent {
                    location,
                    source_kind: kind,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        if changes.is_empty() {
            debug!("Reloaded {} with no effective changes", location);
        } else {
            info!("Reloaded {}: {} key(s) changed", location, changes.len());
            self.events.publish_change(ChangeEvent {
                changes: changes.clone(),
                location,
                source_kind: kind,
            });
        }

        Ok(changes)
    }
}

impl ReloadTarget for Shared {
    fn reload_layer(&self, order: u64) {
        // Failures were already published on the error channel.
        let _ = self.reload_cycle(order);
    }
}

impl ConfigReader for Configuration {
    fn get(&self, key: &str) -> Option<String> {
        self.shared
            .state
            .read()
            .merged
            .get(&ConfigKey::from(key))
            .cloned()
    }
}

impl Configuration {
    /// Fails with every absent key listed, in the order given.
    pub fn require_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), ConfigError> {
        let snapshot = self.snapshot_arc();
        let missing: Vec<String> = keys
            .iter()
            .map(|key| key.as_ref())
            .filter(|key| !snapshot.contains_key(&ConfigKey::from(*key)))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys { keys: missing })
        }
    }

    /// Point-in-time copy of the merged mapping.
    pub fn snapshot(&self) -> FlatMap {
        self.snapshot_arc().as_ref().clone()
    }

    /// Renders the snapshot, masking secrets unless disabled in the options.
    pub fn dump(&self) -> String {
        self.dump_with(self.shared.options.mask_secrets)
    }

    pub fn dump_with(&self, mask: bool) -> String {
        let snapshot = self.snapshot_arc();
        let hints = self.shared.secret_hints.read();
        dump::render(&snapshot, mask, &hints)
    }

    pub fn secret_hints(&self) -> Vec<String> {
        self.shared.secret_hints.read().clone()
    }

    pub fn set_secret_hints<I, S>(&self, hints: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.shared.secret_hints.write() = hints.into_iter().map(Into::into).collect();
    }

    pub fn add_secret_hint(&self, hint: impl Into<String>) {
        let hint = hint.into();
        let mut hints = self.shared.secret_hints.write();
        if !hints.iter().any(|h| eq_ignore_case(h, &hint)) {
            hints.push(hint);
        }
    }

    pub fn section<'a>(&'a self, prefix: &'a str) -> Section<'a> {
        Section::new(self, prefix)
    }

    /// Projects the subtree at `section` (or the whole snapshot) onto `T`.
    pub fn bind<T: DeserializeOwned>(&self, section: Option<&str>) -> Result<T, ConfigError> {
        let snapshot = self.snapshot_arc();
        Ok(binder::bind_snapshot(&snapshot, section.unwrap_or_default())?)
    }

    pub fn bind_validated<T>(&self, section: Option<&str>) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Validate,
    {
        section::validated(self.bind(section)?)
    }
}

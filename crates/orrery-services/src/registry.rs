use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::lifecycle::{
  Initializable, Service, ShutdownOutcome, ShutdownReport, ShutdownStatus, Shutdownable,
};

/// Where the registry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Unstarted,
  Initialized,
  /// An init hook failed; only `shutdown_all` is accepted.
  Failed,
  Shutdown,
}

struct Entry {
  name: &'static str,
  /// Always an `Arc<I>` for the `I` the entry is keyed by.
  instance: Box<dyn Any + Send + Sync>,
}

struct Hook<T: ?Sized> {
  service: &'static str,
  target: Arc<T>,
}

/// Services keyed by the type they are looked up as.
///
/// Registration is a startup-time operation: once `initialize_all` has run
/// the instance map is frozen until `shutdown_all`.
pub struct ServiceRegistry {
  services: HashMap<TypeId, Entry>,
  registration_order: Vec<&'static str>,
  init_hooks: Vec<Hook<dyn Initializable>>,
  shutdown_hooks: Vec<Hook<dyn Shutdownable>>,
  // Instances already enrolled in hooks, by address.
  enrolled: HashSet<usize>,
  state: LifecycleState,
}

impl Default for ServiceRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl ServiceRegistry {
  pub fn new() -> Self {
    Self {
      services: HashMap::new(),
      registration_order: Vec::new(),
      init_hooks: Vec::new(),
      shutdown_hooks: Vec::new(),
      enrolled: HashSet::new(),
      state: LifecycleState::Unstarted,
    }
  }

  /// Register `service` under its own type.
  pub fn register<S: Service>(&mut self, service: S) -> Result<Arc<S>, ServiceError> {
    self.register_shared_as::<S, S>(Arc::new(service), |service| service)
  }

  /// Register `service` under interface `I`.
  ///
  /// `upcast` is normally `|service| service`, letting the compiler coerce
  /// `Arc<S>` to `Arc<dyn Trait>`.
  pub fn register_as<I, S>(
    &mut self,
    service: S,
    upcast: impl FnOnce(Arc<S>) -> Arc<I>,
  ) -> Result<Arc<S>, ServiceError>
  where
    I: ?Sized + Send + Sync + 'static,
    S: Service,
  {
    self.register_shared_as(Arc::new(service), upcast)
  }

  /// Register an existing instance under interface `I`.
  ///
  /// The same instance may be registered under several interfaces; its
  /// lifecycle hooks are enrolled once.
  pub fn register_shared_as<I, S>(
    &mut self,
    service: Arc<S>,
    upcast: impl FnOnce(Arc<S>) -> Arc<I>,
  ) -> Result<Arc<S>, ServiceError>
  where
    I: ?Sized + Send + Sync + 'static,
    S: Service,
  {
    let name = type_name::<I>();
    if matches!(
      self.state,
      LifecycleState::Initialized | LifecycleState::Failed
    ) {
      return Err(ServiceError::RegistryFrozen { service: name });
    }

    let key = TypeId::of::<I>();
    if self.services.contains_key(&key) {
      return Err(ServiceError::DuplicateService { service: name });
    }

    let interface: Arc<I> = upcast(service.clone());
    self.services.insert(
      key,
      Entry {
        name,
        instance: Box::new(interface),
      },
    );
    self.registration_order.push(name);

    let address = Arc::as_ptr(&service) as *const () as usize;
    if self.enrolled.insert(address) {
      if let Some(target) = service.clone().as_initializable() {
        self.init_hooks.push(Hook {
          service: name,
          target,
        });
      }
      if let Some(target) = service.clone().as_shutdownable() {
        self.shutdown_hooks.push(Hook {
          service: name,
          target,
        });
      }
    }

    debug!(service = name, "registered service");
    Ok(service)
  }

  pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
    self
      .services
      .get(&TypeId::of::<I>())?
      .instance
      .downcast_ref::<Arc<I>>()
      .cloned()
  }

  pub fn require<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>, ServiceError> {
    self.get::<I>().ok_or(ServiceError::NotFound {
      service: type_name::<I>(),
    })
  }

  pub fn contains<I: ?Sized + 'static>(&self) -> bool {
    self.services.contains_key(&TypeId::of::<I>())
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  pub fn is_initialized(&self) -> bool {
    self.state == LifecycleState::Initialized
  }

  /// Registered type names, in registration order.
  pub fn service_names(&self) -> &[&'static str] {
    &self.registration_order
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }

  /// Run every init hook in registration order.
  ///
  /// Stops at the first failure and leaves the registry `Failed`; call
  /// [`Self::shutdown_all`] before trying again.
  pub fn initialize_all(&mut self) -> Result<(), ServiceError> {
    match self.state {
      LifecycleState::Initialized => return Err(ServiceError::AlreadyInitialized),
      LifecycleState::Failed => return Err(ServiceError::InitializationPending),
      LifecycleState::Unstarted | LifecycleState::Shutdown => {}
    }

    info!(
      services = self.services.len(),
      hooks = self.init_hooks.len(),
      "initializing services"
    );
    for hook in &self.init_hooks {
      debug!(service = hook.service, "initializing service");
      if let Err(source) = hook.target.initialize() {
        error!(service = hook.service, error = %source, "service failed to initialize");
        self.state = LifecycleState::Failed;
        return Err(ServiceError::Initialization {
          service: hook.service,
          source,
        });
      }
    }

    self.state = LifecycleState::Initialized;
    Ok(())
  }

  /// Run every shutdown hook in reverse registration order.
  ///
  /// Never fails: errors and panics from a hook are recorded in the report
  /// and the remaining hooks still run. A registry that was never
  /// initialized, or is already shut down, has nothing to do.
  pub fn shutdown_all(&mut self) -> ShutdownReport {
    if matches!(
      self.state,
      LifecycleState::Unstarted | LifecycleState::Shutdown
    ) {
      debug!(state = ?self.state, "shutdown_all skipped");
      return ShutdownReport::default();
    }

    info!(hooks = self.shutdown_hooks.len(), "shutting down services");
    let mut report = ShutdownReport::default();
    for hook in self.shutdown_hooks.iter().rev() {
      let status = match catch_unwind(AssertUnwindSafe(|| hook.target.shutdown())) {
        Ok(Ok(())) => ShutdownStatus::Clean,
        Ok(Err(err)) => {
          warn!(service = hook.service, error = %err, "service failed to shut down");
          ShutdownStatus::Failed(err.to_string())
        }
        Err(payload) => {
          let message = panic_message(payload.as_ref());
          warn!(service = hook.service, panic = %message, "service panicked during shutdown");
          ShutdownStatus::Panicked(message)
        }
      };
      report.outcomes.push(ShutdownOutcome {
        service: hook.service,
        status,
      });
    }

    self.state = LifecycleState::Shutdown;
    report
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

impl fmt::Debug for ServiceRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.services.values().map(|entry| entry.name).collect();
    f.debug_struct("ServiceRegistry")
      .field("services", &names)
      .field("init_hooks", &self.init_hooks.len())
      .field("shutdown_hooks", &self.shutdown_hooks.len())
      .field("state", &self.state)
      .finish()
  }
}

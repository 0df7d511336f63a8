pub mod executor;
pub mod manager;
pub mod matcher;
pub mod plugin;
pub mod registry;

pub use executor::{ExecutorSettings, HookExecutor};
pub use manager::{PluginFactory, PluginFactoryRegistry, PluginManager};
pub use plugin::{HookCall, Plugin, PluginBase};
pub use registry::{PluginRegistry, RegisteredPlugin};

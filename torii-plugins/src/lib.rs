pub mod deny_filter;
pub mod search_replace;

use std::sync::Arc;
use torii_plugin::manager::PluginFactoryRegistry;
use torii_plugin::plugin::Plugin;

/// Register all built-in plugin factories under their config `kind` names.
pub fn register_builtins(factories: &mut PluginFactoryRegistry) {
    factories.register("search_replace", |base| {
        Ok(Arc::new(search_replace::SearchReplacePlugin::new(base)) as Arc<dyn Plugin>)
    });
    factories.register("deny_filter", |base| {
        Ok(Arc::new(deny_filter::DenyFilterPlugin::new(base)) as Arc<dyn Plugin>)
    });
}

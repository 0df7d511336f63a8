use crate::matcher;
use crate::plugin::HookCall;
use crate::registry::RegisteredPlugin;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use torii_core::config::{PluginMode, PluginSettings};
use torii_core::context::{GlobalContext, PluginContextTable};
use torii_core::error::ToriiError;
use torii_core::payload::payload_size;
use torii_core::result::{PluginResult, PluginViolation};
use tracing::{debug, error, warn};

/// Global execution limits applied to every hook invocation.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Per-plugin call timeout, unless the plugin overrides it
    pub plugin_timeout: Duration,
    /// Payload-size guard limit (bytes)
    pub max_payload_size: usize,
    /// Upgrade technical errors in any mode to a hard stop
    pub fail_on_plugin_error: bool,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&PluginSettings::default())
    }
}

impl From<&PluginSettings> for ExecutorSettings {
    fn from(settings: &PluginSettings) -> Self {
        Self {
            plugin_timeout: settings.timeout(),
            max_payload_size: settings.max_payload_size,
            fail_on_plugin_error: settings.fail_on_plugin_error,
        }
    }
}

/// Outcome of a single plugin call, before the mode rule is applied.
enum CallOutcome<T> {
    Ok(PluginResult<T>),
    Violation(PluginViolation),
    Failed(ToriiError),
}

/// Runs one hook across a filtered, priority-sorted plugin list under
/// timeout and payload-size guards, merging results into the pipeline
/// state.
///
/// Violations that surface come back as an `Ok` result with
/// `continue_processing = false`; technical errors that surface come back
/// as `Err`. Everything swallowed is logged with the plugin, hook, and
/// request id.
///
/// Cancelling the returned future cancels the in-flight plugin call
/// cooperatively; plugins are expected to release resources in a scoped
/// manner.
pub struct HookExecutor {
    settings: ExecutorSettings,
}

impl HookExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Execute one hook invocation.
    ///
    /// `contexts` carries per-plugin slots across paired hooks; a slot is
    /// created only for plugins actually dispatched.
    pub async fn execute<T: HookCall>(
        &self,
        mut plugins: Vec<RegisteredPlugin>,
        payload: T,
        global: &Arc<GlobalContext>,
        contexts: &mut PluginContextTable,
    ) -> Result<PluginResult<T>, ToriiError> {
        let hook = T::HOOK;

        plugins.retain(|r| r.plugin().mode() != PluginMode::Disabled);
        plugins.retain(|r| {
            matcher::matches(
                r.plugin().conditions(),
                global,
                payload.target(),
                payload.content_type(),
            )
        });
        plugins.sort_by_key(|r| r.sort_key());

        // Fail fast before any plugin runs or any context slot exists.
        self.check_size(&payload, None)?;

        let mut current = payload;
        let mut aggregate: PluginResult<T> = PluginResult::pass();

        for registered in &plugins {
            let plugin = registered.plugin();
            let name = plugin.name().to_string();
            let mode = plugin.mode();
            let ctx = contexts.slot(&name, global);

            debug!(
                plugin = %name,
                hook = %hook,
                request_id = %global.request_id,
                "Dispatching hook"
            );

            let call_timeout = plugin.timeout().unwrap_or(self.settings.plugin_timeout);
            let mut outcome =
                match tokio::time::timeout(call_timeout, T::call(plugin.as_ref(), &current, ctx))
                    .await
                {
                    Err(_) => CallOutcome::Failed(ToriiError::PluginTimeout {
                        plugin: name.clone(),
                        hook,
                    }),
                    Ok(Err(ToriiError::Violation(v))) => CallOutcome::Violation(v),
                    Ok(Err(
                        err @ (ToriiError::PluginTimeout { .. }
                        | ToriiError::PluginInternalError { .. }
                        | ToriiError::PayloadTooLarge { .. }
                        | ToriiError::PayloadShapeMismatch { .. }),
                    )) => CallOutcome::Failed(err),
                    Ok(Err(other)) => {
                        CallOutcome::Failed(ToriiError::internal(name.as_str(), other))
                    }
                    Ok(Ok(mut result)) => match result.violation.take() {
                        Some(violation) => {
                            // Record what the plugin exposed even though it blocked.
                            ctx.metadata.extend(result.metadata.clone());
                            CallOutcome::Violation(violation)
                        }
                        None => CallOutcome::Ok(result),
                    },
                };

            // A modification that blows the size limit is this plugin's
            // technical error; the payload is not replaced.
            let size_err = match &outcome {
                CallOutcome::Ok(result) => result
                    .modified_payload
                    .as_ref()
                    .and_then(|modified| self.check_size(modified, Some(&name)).err()),
                _ => None,
            };
            if let Some(err) = size_err {
                outcome = CallOutcome::Failed(err);
            }

            match outcome {
                CallOutcome::Ok(result) => {
                    for (key, value) in &result.metadata {
                        ctx.metadata.insert(key.clone(), value.clone());
                    }
                    aggregate.metadata.extend(result.metadata);
                    if let Some(next) = result.modified_payload {
                        current = next.clone();
                        aggregate.modified_payload = Some(next);
                    }
                    if !result.continue_processing {
                        debug!(
                            plugin = %name,
                            hook = %hook,
                            request_id = %global.request_id,
                            "Plugin stopped the pipeline"
                        );
                        aggregate.continue_processing = false;
                        return Ok(aggregate);
                    }
                }
                CallOutcome::Violation(mut violation) => {
                    violation.plugin_name = name.clone();
                    if mode == PluginMode::Permissive {
                        warn!(
                            plugin = %name,
                            hook = %hook,
                            request_id = %global.request_id,
                            code = %violation.code,
                            reason = %violation.reason,
                            "Violation ignored (permissive)"
                        );
                        continue;
                    }
                    warn!(
                        plugin = %name,
                        hook = %hook,
                        request_id = %global.request_id,
                        code = %violation.code,
                        reason = %violation.reason,
                        "Violation, stopping pipeline"
                    );
                    aggregate.continue_processing = false;
                    aggregate.violation = Some(violation);
                    return Ok(aggregate);
                }
                CallOutcome::Failed(err) => {
                    if self.settings.fail_on_plugin_error || mode == PluginMode::Enforce {
                        error!(
                            plugin = %name,
                            hook = %hook,
                            request_id = %global.request_id,
                            error = %err,
                            "Plugin failed, stopping pipeline"
                        );
                        return Err(err);
                    }
                    // enforce_ignore_error / permissive
                    warn!(
                        plugin = %name,
                        hook = %hook,
                        request_id = %global.request_id,
                        error = %err,
                        "Plugin error ignored"
                    );
                }
            }
        }

        Ok(aggregate)
    }

    fn check_size<T: Serialize>(
        &self,
        payload: &T,
        plugin: Option<&str>,
    ) -> Result<(), ToriiError> {
        let size = payload_size(payload).map_err(|e| ToriiError::PayloadShapeMismatch {
            plugin: plugin.unwrap_or("pipeline").to_string(),
            detail: e.to_string(),
        })?;
        if size > self.settings.max_payload_size {
            return Err(ToriiError::PayloadTooLarge {
                plugin: plugin.map(String::from),
                size,
                limit: self.settings.max_payload_size,
            });
        }
        Ok(())
    }
}

impl Default for HookExecutor {
    fn default() -> Self {
        Self::new(ExecutorSettings::default())
    }
}

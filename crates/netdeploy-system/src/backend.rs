use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use netdeploy_backend::{
    AppVersion, DeployError, DeploymentBackend, DeploymentIdentity, LaunchContext,
    UpdateCheckResult,
};
use netdeploy_core::{
    CompletionSlot, LastCheck, PollOptions, PollOutcome, Subscription, fallback, run_cancellable,
};

use crate::native::{CheckForUpdateCompleted, SystemDeployment, UpdateCompleted};

const CHECK_OPERATION: &str = "check for update";
const UPDATE_OPERATION: &str = "update";

pub struct SystemBackend {
    deployed: Option<Arc<dyn SystemDeployment>>,
    identity: DeploymentIdentity,
    local_version: AppVersion,
    poll: PollOptions,
    last_check: LastCheck,
}

impl SystemBackend {
    /// Wraps the service. Whether the application is network deployed is
    /// read once, here.
    #[must_use]
    pub fn new(native: Arc<dyn SystemDeployment>, context: &LaunchContext) -> Self {
        let deployed = native.is_network_deployed().then_some(native);
        debug!(
            "System deployment service bound (network deployed: {})",
            deployed.is_some()
        );
        Self {
            deployed,
            ..Self::detached(context)
        }
    }

    /// Adapter for a process the service did not launch.
    #[must_use]
    pub fn detached(context: &LaunchContext) -> Self {
        Self {
            deployed: None,
            identity: context.identity.clone(),
            local_version: context.local_version,
            poll: PollOptions::new(context.poll_interval),
            last_check: LastCheck::starting_now(),
        }
    }

    fn service(&self) -> Option<&dyn SystemDeployment> {
        self.deployed.as_deref()
    }

    fn subscribe_check(
        native: &Arc<dyn SystemDeployment>,
        slot: CompletionSlot<CheckForUpdateCompleted>,
    ) -> Subscription {
        let id = native.add_check_for_update_completed(Box::new(
            move |event: &CheckForUpdateCompleted| {
                slot.resolve(event.clone());
            },
        ));
        let native = Arc::clone(native);
        Subscription::new(move || native.remove_check_for_update_completed(id))
    }

    fn subscribe_update(
        native: &Arc<dyn SystemDeployment>,
        slot: CompletionSlot<UpdateCompleted>,
    ) -> Subscription {
        let id = native.add_update_completed(Box::new(move |event: &UpdateCompleted| {
            slot.resolve(event.clone());
        }));
        let native = Arc::clone(native);
        Subscription::new(move || native.remove_update_completed(id))
    }

    fn check_result(event: CheckForUpdateCompleted, current: AppVersion) -> UpdateCheckResult {
        if let Some(error) = event.error {
            return UpdateCheckResult::failed(DeployError::native(CHECK_OPERATION, error));
        }
        if event.cancelled {
            return UpdateCheckResult::cancelled();
        }
        match event.available_version {
            Some(version) => UpdateCheckResult::succeeded(version),
            None if !event.update_available => UpdateCheckResult::succeeded(current),
            None => UpdateCheckResult::failed(DeployError::native(
                CHECK_OPERATION,
                "update reported without a version",
            )),
        }
    }
}

#[async_trait]
impl DeploymentBackend for SystemBackend {
    fn name(&self) -> &'static str {
        "system"
    }

    fn is_network_deployed(&self) -> bool {
        self.deployed.is_some()
    }

    fn current_version(&self) -> AppVersion {
        fallback::current_version(
            self.service(),
            |native| native.current_version(),
            self.local_version,
        )
    }

    fn is_first_run(&self) -> bool {
        fallback::is_first_run(self.service(), |native| native.is_first_run())
    }

    fn data_directory(&self) -> PathBuf {
        fallback::data_directory(self.service(), |native| native.data_directory(), || {
            self.identity.executable_directory()
        })
    }

    fn last_check_time(&self) -> DateTime<Utc> {
        let tracked = self.last_check.get();
        fallback::resolve(
            self.service(),
            |native| native.time_of_last_update_check().max(tracked),
            || tracked,
        )
    }

    fn update_location(&self) -> Option<String> {
        fallback::resolve(self.service(), |native| native.update_location(), || {
            self.identity.update_location().map(str::to_string)
        })
    }

    async fn check_server_version(&self, token: &CancellationToken) -> UpdateCheckResult {
        let Some(native) = self.deployed.as_ref() else {
            debug!("Skipping update check: application is not network deployed");
            return UpdateCheckResult::not_deployed();
        };

        debug!("Starting system update check");
        let slot = CompletionSlot::new();
        let _subscription = Self::subscribe_check(native, slot.clone());
        let start = {
            let native = Arc::clone(native);
            move || native.check_for_update_async()
        };
        let cancel = {
            let native = Arc::clone(native);
            move || native.check_for_update_async_cancel()
        };

        let outcome =
            run_cancellable(CHECK_OPERATION, start, cancel, slot, token.clone(), self.poll).await;

        let result = match outcome {
            Ok(PollOutcome::Completed(event)) => {
                Self::check_result(event, native.current_version())
            }
            Ok(PollOutcome::Cancelled) => UpdateCheckResult::cancelled(),
            Err(error) => UpdateCheckResult::failed(error),
        };

        if result.cancelled_or_failed() {
            match result.error() {
                Some(error) => warn!("System update check failed: {error}"),
                None => debug!("System update check cancelled"),
            }
        } else {
            self.last_check.record_success();
            debug!(
                "System update check completed, server version: {:?}",
                result.available_version()
            );
        }
        result
    }

    async fn update_application(&self, token: &CancellationToken) -> bool {
        let Some(native) = self.deployed.as_ref() else {
            debug!("Skipping update: application is not network deployed");
            return false;
        };

        info!("Starting system update");
        let slot = CompletionSlot::new();
        let _subscription = Self::subscribe_update(native, slot.clone());
        let start = {
            let native = Arc::clone(native);
            move || native.update_async()
        };
        let cancel = {
            let native = Arc::clone(native);
            move || native.update_async_cancel()
        };

        match run_cancellable(UPDATE_OPERATION, start, cancel, slot, token.clone(), self.poll).await
        {
            Ok(PollOutcome::Completed(UpdateCompleted {
                cancelled: false,
                error: None,
            })) => {
                info!("System update applied");
                true
            }
            Ok(PollOutcome::Completed(event)) => {
                warn!(
                    "System update did not complete (cancelled: {}, error: {:?})",
                    event.cancelled, event.error
                );
                false
            }
            Ok(PollOutcome::Cancelled) => {
                debug!("System update cancelled");
                false
            }
            Err(error) => {
                warn!("System update failed: {error}");
                false
            }
        }
    }
}

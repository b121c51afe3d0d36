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

use crate::connection::{ManifestDeployment, ManifestEvent};

const CHECK_OPERATION: &str = "resolve server version";
const UPDATE_OPERATION: &str = "apply update";

pub struct ManifestBackend {
    deployed: Option<Arc<dyn ManifestDeployment>>,
    identity: DeploymentIdentity,
    local_version: AppVersion,
    poll: PollOptions,
    last_check: LastCheck,
}

impl ManifestBackend {
    #[must_use]
    pub fn new(connection: Arc<dyn ManifestDeployment>, context: &LaunchContext) -> Self {
        let deployed = connection.is_network_deployment().then_some(connection);
        debug!(
            "Manifest connection opened (network deployed: {})",
            deployed.is_some()
        );
        Self {
            deployed,
            ..Self::detached(context)
        }
    }

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

    fn connection(&self) -> Option<&dyn ManifestDeployment> {
        self.deployed.as_deref()
    }

    /// Subscribes a handler that resolves `slot` with the first event
    /// accepted by `ends`.
    fn subscribe(
        connection: &Arc<dyn ManifestDeployment>,
        slot: CompletionSlot<ManifestEvent>,
        ends: fn(&ManifestEvent) -> bool,
    ) -> Subscription {
        let id = connection.subscribe(Box::new(move |event: &ManifestEvent| {
            if ends(event) {
                slot.resolve(event.clone());
            }
        }));
        let connection = Arc::clone(connection);
        Subscription::new(move || connection.unsubscribe(id))
    }

    async fn run(
        &self,
        connection: &Arc<dyn ManifestDeployment>,
        operation: &'static str,
        begin: fn(&dyn ManifestDeployment) -> Result<(), DeployError>,
        ends: fn(&ManifestEvent) -> bool,
        token: &CancellationToken,
    ) -> Result<PollOutcome<ManifestEvent>, DeployError> {
        let slot = CompletionSlot::new();
        let _subscription = Self::subscribe(connection, slot.clone(), ends);
        let start = {
            let connection = Arc::clone(connection);
            move || begin(connection.as_ref())
        };
        let cancel = {
            let connection = Arc::clone(connection);
            move || connection.abort()
        };
        run_cancellable(operation, start, cancel, slot, token.clone(), self.poll).await
    }
}

#[async_trait]
impl DeploymentBackend for ManifestBackend {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn is_network_deployed(&self) -> bool {
        self.deployed.is_some()
    }

    fn current_version(&self) -> AppVersion {
        fallback::current_version(
            self.connection(),
            |connection| connection.current_version(),
            self.local_version,
        )
    }

    /// The manifest layer does not track first launches.
    fn is_first_run(&self) -> bool {
        false
    }

    fn data_directory(&self) -> PathBuf {
        fallback::data_directory(
            self.connection(),
            |connection| connection.data_dir(),
            || self.identity.executable_directory(),
        )
    }

    fn last_check_time(&self) -> DateTime<Utc> {
        self.last_check.get()
    }

    fn update_location(&self) -> Option<String> {
        self.identity.update_location().map(str::to_string)
    }

    async fn check_server_version(&self, token: &CancellationToken) -> UpdateCheckResult {
        let Some(connection) = self.deployed.as_ref() else {
            debug!("Skipping manifest check: application is not network deployed");
            return UpdateCheckResult::not_deployed();
        };

        debug!("Resolving server version from manifest");
        let outcome = self
            .run(
                connection,
                CHECK_OPERATION,
                |connection| connection.begin_server_version(),
                ManifestEvent::ends_version_check,
                token,
            )
            .await;

        let result = match outcome {
            Ok(PollOutcome::Completed(ManifestEvent::VersionResolved(version))) => {
                self.last_check.record_success();
                debug!("Server manifest advertises {version}");
                UpdateCheckResult::succeeded(version)
            }
            Ok(PollOutcome::Completed(ManifestEvent::VersionFailed(details))) => {
                UpdateCheckResult::failed(DeployError::native(CHECK_OPERATION, details))
            }
            Ok(PollOutcome::Completed(_) | PollOutcome::Cancelled) => {
                debug!("Manifest check cancelled");
                UpdateCheckResult::cancelled()
            }
            Err(error) => UpdateCheckResult::failed(error),
        };

        if let Some(error) = result.error() {
            warn!("Manifest check failed: {error}");
        }
        result
    }

    async fn update_application(&self, token: &CancellationToken) -> bool {
        let Some(connection) = self.deployed.as_ref() else {
            debug!("Skipping manifest update: application is not network deployed");
            return false;
        };

        info!("Applying update from manifest");
        let outcome = self
            .run(
                connection,
                UPDATE_OPERATION,
                |connection| connection.begin_update(),
                ManifestEvent::ends_update,
                token,
            )
            .await;

        match outcome {
            Ok(PollOutcome::Completed(ManifestEvent::UpdateApplied)) => {
                info!("Manifest update applied");
                true
            }
            Ok(PollOutcome::Completed(ManifestEvent::UpdateFailed(details))) => {
                warn!("Manifest update failed: {details}");
                false
            }
            Ok(_) => {
                debug!("Manifest update cancelled");
                false
            }
            Err(error) => {
                warn!("Manifest update failed: {error}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use netdeploy_backend::{
        AppVersion, DeployError, DeploymentBackend, DeploymentIdentity, LaunchContext,
        UpdateCheckResult,
    };
    use tokio_util::sync::CancellationToken;

    use super::ManifestBackend;
    use crate::connection::{
        ManifestDeployment, ManifestEvent, ManifestEventHandler, SubscriptionId,
    };

    type Handlers = Arc<Mutex<HashMap<u64, Arc<ManifestEventHandler>>>>;

    struct FakeConnection {
        deployed: bool,
        /// Events emitted, in order, shortly after a `begin_*` call.
        script: Vec<ManifestEvent>,
        handlers: Handlers,
        next_id: AtomicU64,
        begins: AtomicUsize,
        aborts: AtomicUsize,
    }

    impl FakeConnection {
        fn new(deployed: bool, script: Vec<ManifestEvent>) -> Self {
            Self {
                deployed,
                script,
                handlers: Arc::default(),
                next_id: AtomicU64::new(1),
                begins: AtomicUsize::new(0),
                aborts: AtomicUsize::new(0),
            }
        }

        fn subscribers(&self) -> usize {
            self.handlers.lock().expect("handler lock").len()
        }

        fn emit_script(&self) -> Result<(), DeployError> {
            self.begins.fetch_add(1, Ordering::SeqCst);
            let script = self.script.clone();
            let handlers = Arc::clone(&self.handlers);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                for event in script {
                    let snapshot: Vec<_> = handlers
                        .lock()
                        .expect("handler lock")
                        .values()
                        .cloned()
                        .collect();
                    for handler in snapshot {
                        handler(&event);
                    }
                }
            });
            Ok(())
        }
    }

    impl ManifestDeployment for FakeConnection {
        fn is_network_deployment(&self) -> bool {
            self.deployed
        }

        fn current_version(&self) -> AppVersion {
            AppVersion::new(1, 0, 0, 0)
        }

        fn data_dir(&self) -> PathBuf {
            PathBuf::from("/deployments/app/data")
        }

        fn begin_server_version(&self) -> Result<(), DeployError> {
            self.emit_script()
        }

        fn begin_update(&self) -> Result<(), DeployError> {
            self.emit_script()
        }

        fn abort(&self) -> Result<(), DeployError> {
            self.aborts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn subscribe(&self, handler: ManifestEventHandler) -> SubscriptionId {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.handlers
                .lock()
                .expect("handler lock")
                .insert(id, Arc::new(handler));
            SubscriptionId(id)
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.handlers.lock().expect("handler lock").remove(&id.0);
        }
    }

    fn context() -> LaunchContext {
        LaunchContext {
            identity: DeploymentIdentity::new(
                PathBuf::from("/opt/app/app"),
                Some("https://updates.example/app/".to_string()),
            ),
            local_version: AppVersion::new(0, 9, 0, 0),
            poll_interval: Duration::from_millis(2),
        }
    }

    #[test]
    fn first_run_is_never_reported() {
        let backend = ManifestBackend::new(Arc::new(FakeConnection::new(true, vec![])), &context());

        assert!(backend.is_network_deployed());
        assert!(!backend.is_first_run());
    }

    #[tokio::test]
    async fn not_deployed_connection_falls_back_without_requests() {
        let connection = Arc::new(FakeConnection::new(false, vec![]));
        let backend = ManifestBackend::new(connection.clone(), &context());
        let token = CancellationToken::new();

        assert!(!backend.is_network_deployed());
        assert_eq!(backend.current_version(), AppVersion::new(0, 9, 0, 0));
        assert_eq!(backend.data_directory(), PathBuf::from("/opt/app"));
        assert_eq!(
            backend.check_server_version(&token).await,
            UpdateCheckResult::not_deployed()
        );
        assert!(!backend.update_application(&token).await);
        assert_eq!(connection.begins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_version_succeeds_and_ignores_unrelated_events() {
        let connection = Arc::new(FakeConnection::new(
            true,
            vec![
                ManifestEvent::UpdateApplied,
                ManifestEvent::VersionResolved(AppVersion::new(1, 2, 0, 0)),
            ],
        ));
        let backend = ManifestBackend::new(connection.clone(), &context());
        let before = backend.last_check_time();

        let result = backend
            .check_server_version(&CancellationToken::new())
            .await;

        assert_eq!(
            result,
            UpdateCheckResult::succeeded(AppVersion::new(1, 2, 0, 0))
        );
        assert!(backend.last_check_time() >= before);
        assert_eq!(connection.subscribers(), 0);
    }

    #[tokio::test]
    async fn version_failure_is_captured() {
        let connection = Arc::new(FakeConnection::new(
            true,
            vec![ManifestEvent::VersionFailed("404 Not Found".to_string())],
        ));
        let backend = ManifestBackend::new(connection.clone(), &context());
        let before = backend.last_check_time();

        let result = backend
            .check_server_version(&CancellationToken::new())
            .await;

        assert!(result.cancelled_or_failed());
        assert_eq!(
            result.error(),
            Some(&DeployError::native("resolve server version", "404 Not Found"))
        );
        assert_eq!(backend.last_check_time(), before);
        assert_eq!(connection.subscribers(), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_the_connection() {
        let connection = Arc::new(FakeConnection::new(true, vec![]));
        let backend = ManifestBackend::new(connection.clone(), &context());
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(15)).await;
            trigger.cancel();
        });

        let result = backend.check_server_version(&token).await;

        assert_eq!(result, UpdateCheckResult::cancelled());
        assert_eq!(connection.aborts.load(Ordering::SeqCst), 1);
        assert_eq!(connection.subscribers(), 0);
    }

    #[tokio::test]
    async fn update_outcomes() {
        let token = CancellationToken::new();

        let applied = ManifestBackend::new(
            Arc::new(FakeConnection::new(true, vec![ManifestEvent::UpdateApplied])),
            &context(),
        );
        assert!(applied.update_application(&token).await);

        let failed = ManifestBackend::new(
            Arc::new(FakeConnection::new(
                true,
                vec![ManifestEvent::UpdateFailed("hash mismatch".to_string())],
            )),
            &context(),
        );
        assert!(!failed.update_application(&token).await);

        let aborted = ManifestBackend::new(
            Arc::new(FakeConnection::new(true, vec![ManifestEvent::Aborted])),
            &context(),
        );
        assert!(!aborted.update_application(&token).await);
    }

    #[tokio::test]
    async fn update_location_comes_from_identity() {
        let backend = ManifestBackend::detached(&context());
        assert_eq!(
            backend.update_location().as_deref(),
            Some("https://updates.example/app/")
        );
    }
}

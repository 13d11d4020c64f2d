//! Unit tests for the reconciliation pass

#[cfg(test)]
mod tests {
    use crate::config::{FailurePolicy, TargetEnvironment};
    use crate::credentials::ClusterCredentials;
    use crate::error::{ConfigError, SyncError};
    use crate::reconciler::Reconciler;
    use crate::report::{ActionKind, ReconcileReport, TargetState};
    use crate::test_utils::*;
    use cluster_client::{ClusterError, MockCall, MockClusterClient};
    use kluctl_client::{KluctlCli, KluctlError, MockCommandRunner};
    use std::sync::Arc;

    const NS: &str = "kluctl-system";

    fn reconciler(
        cluster: &MockClusterClient,
        runner: &MockCommandRunner,
        config: crate::config::SyncConfig,
    ) -> Reconciler<MockCommandRunner> {
        Reconciler::new(
            config,
            Arc::new(cluster.clone()),
            KluctlCli::with_runner("kluctl", runner.clone()),
        )
    }

    async fn run(
        cluster: &MockClusterClient,
        runner: &MockCommandRunner,
        config: crate::config::SyncConfig,
    ) -> Result<ReconcileReport, SyncError> {
        reconciler(cluster, runner, config)
            .run(&ClusterCredentials::local())
            .await
    }

    fn create(name: &str) -> MockCall {
        MockCall::Create(name.to_string())
    }

    fn delete(name: &str) -> MockCall {
        MockCall::Delete(name.to_string())
    }

    #[tokio::test]
    async fn test_deletes_stale_and_creates_missing() {
        let project = project_with_targets(&["app-web", "app-api"]);
        let cluster = MockClusterClient::with_names(NS, ["app-web", "app-old"]);
        let runner = MockCommandRunner::succeeding();

        let report = run(&cluster, &runner, test_config(project.path())).await.unwrap();

        assert_eq!(report.modified(), vec!["app-old", "app-api"]);
        assert_eq!(cluster.mutations(), vec![delete("app-old"), create("app-api")]);
        assert_eq!(runner.deployed_names(), vec!["app-api"]);
        assert_eq!(cluster.names(), vec!["app-web", "app-api"]);

        assert_eq!(report.results[0].action, ActionKind::Delete);
        assert_eq!(report.results[0].state, TargetState::Absent);
        assert_eq!(report.results[1].action, ActionKind::Create);
        assert_eq!(report.results[1].state, TargetState::Deployed);
        assert!(report.is_clean());
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_deploy_failure_reports_created_target() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::new(NS);
        let runner = MockCommandRunner::failing(1, "error: failed to clone repository");

        let report = run(&cluster, &runner, test_config(project.path())).await.unwrap();

        assert_eq!(report.modified(), vec!["app-web"]);
        assert_eq!(cluster.names(), vec!["app-web"]);
        match &report.results[0].state {
            TargetState::DeployFailed { reason } => assert!(reason.contains("failed to clone repository")),
            other => panic!("expected DeployFailed, got {:?}", other),
        }
        assert!(report.failures.is_empty());
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_converged_state_only_lists() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::with_names(NS, ["app-web"]);
        let runner = MockCommandRunner::succeeding();

        let report = run(&cluster, &runner, test_config(project.path())).await.unwrap();

        assert!(report.modified().is_empty());
        assert!(report.plan.is_empty());
        assert_eq!(cluster.calls(), vec![MockCall::List]);
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_missing_project_file_is_config_error() {
        let project = tempfile::TempDir::new().unwrap();
        let cluster = MockClusterClient::with_names(NS, ["app-web"]);
        let runner = MockCommandRunner::succeeding();

        let err = run(&cluster, &runner, test_config(project.path())).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::Config(ConfigError::Project(KluctlError::ConfigNotFound(_)))
        ));
        assert!(cluster.calls().is_empty());
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_project_file_is_config_error() {
        let project = tempfile::TempDir::new().unwrap();
        std::fs::write(project.path().join(".kluctl.yaml"), "targets: [unterminated\n").unwrap();
        let cluster = MockClusterClient::with_names(NS, ["app-web"]);

        let err = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Config(ConfigError::Project(KluctlError::ConfigParse { .. }))
        ));
        assert!(cluster.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let project = project_with_targets(&["app-web", "app-api"]);
        let cluster = MockClusterClient::with_names(NS, ["app-old"]);
        let runner = MockCommandRunner::succeeding();
        let reconciler = reconciler(&cluster, &runner, test_config(project.path()));
        let credentials = ClusterCredentials::local();

        let first = reconciler.run(&credentials).await.unwrap();
        cluster.clear_calls();
        let second = reconciler.run(&credentials).await.unwrap();

        assert_eq!(first.modified(), vec!["app-old", "app-web", "app-api"]);
        assert!(second.modified().is_empty());
        assert!(cluster.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_failed_target_is_left_alone_next_pass() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::new(NS);
        let runner = MockCommandRunner::failing(1, "boom");
        let reconciler = reconciler(&cluster, &runner, test_config(project.path()));
        let credentials = ClusterCredentials::local();

        reconciler.run(&credentials).await.unwrap();
        let second = reconciler.run(&credentials).await.unwrap();

        assert!(second.modified().is_empty());
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_controllers_are_never_deleted() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::with_names(NS, ["platform-ingress", "app-web", "monitoring"]);

        let report = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap();

        assert!(report.modified().is_empty());
        assert_eq!(cluster.names(), vec!["platform-ingress", "app-web", "monitoring"]);
    }

    #[tokio::test]
    async fn test_partition_selects_production_targets() {
        let project = project_with_targets(&["app-web", "app-web-prod", "app-api-prod"]);
        let cluster = MockClusterClient::with_names(NS, ["app-web"]);
        let mut config = test_config(project.path());
        config.environment = TargetEnvironment::Production;

        let report = run(&cluster, &MockCommandRunner::succeeding(), config).await.unwrap();

        assert_eq!(report.modified(), vec!["app-web", "app-web-prod", "app-api-prod"]);
        assert_eq!(cluster.names(), vec!["app-web-prod", "app-api-prod"]);
    }

    #[tokio::test]
    async fn test_abort_stops_at_first_failure() {
        let project = project_with_targets(&["app-new-1", "app-new-2"]);
        let cluster = MockClusterClient::with_names(NS, ["app-old"]);
        cluster.fail_create("app-new-1", ClusterError::Forbidden("create denied".to_string()));
        let runner = MockCommandRunner::succeeding();

        let err = run(&cluster, &runner, test_config(project.path())).await.unwrap_err();

        match err {
            SyncError::Mutation {
                name,
                action,
                report,
                source,
            } => {
                assert_eq!(name, "app-new-1");
                assert_eq!(action, ActionKind::Create);
                assert_eq!(report.modified(), vec!["app-old"]);
                assert_eq!(report.failures[0].name, "app-new-1");
                assert!(report.finished_at.is_some());
                assert_eq!(source, ClusterError::Forbidden("create denied".to_string()));
            }
            other => panic!("expected Mutation error, got {:?}", other),
        }
        assert_eq!(cluster.mutations(), vec![delete("app-old"), create("app-new-1")]);
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_abort_keeps_earlier_deploy_failures() {
        let project = project_with_targets(&["app-a", "app-b"]);
        let cluster = MockClusterClient::new(NS);
        cluster.fail_create("app-b", ClusterError::Forbidden("denied".to_string()));
        let runner = MockCommandRunner::failing(1, "error: deploy failed");

        let err = run(&cluster, &runner, test_config(project.path())).await.unwrap_err();

        let report = err.partial_report().expect("aborted pass carries its report");
        assert_eq!(report.modified(), vec!["app-a"]);
        assert!(report.results[0].state.is_deploy_failed());
        assert_eq!(report.deploy_failures().count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "app-b");
        assert_eq!(report.failures[0].action, ActionKind::Create);
    }

    #[tokio::test]
    async fn test_pre_mutation_errors_have_no_report() {
        let project = tempfile::TempDir::new().unwrap();
        let cluster = MockClusterClient::new(NS);

        let err = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap_err();

        assert!(err.partial_report().is_none());
    }

    #[tokio::test]
    async fn test_started_at_precedes_cluster_work() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::new(NS);
        let before = chrono::Utc::now();

        let report = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap();

        let finished = report.finished_at.unwrap();
        assert!(before <= report.started_at);
        assert!(report.started_at <= finished);
    }

    #[tokio::test]
    async fn test_continue_records_failure_and_proceeds() {
        let project = project_with_targets(&["app-api"]);
        let cluster = MockClusterClient::with_names(NS, ["app-old-1", "app-old-2"]);
        cluster.fail_delete("app-old-1", ClusterError::Unavailable("connection reset".to_string()));
        let mut config = test_config(project.path());
        config.failure_policy = FailurePolicy::Continue;

        let report = run(&cluster, &MockCommandRunner::succeeding(), config).await.unwrap();

        assert_eq!(report.modified(), vec!["app-old-2", "app-api"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "app-old-1");
        assert_eq!(report.failures[0].action, ActionKind::Delete);
        assert!(!report.is_clean());
        assert_eq!(cluster.names(), vec!["app-old-1", "app-api"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_cluster_read_error() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::new(NS);
        cluster.fail_list(ClusterError::Forbidden("list denied".to_string()));

        let err = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::ClusterRead { ref namespace, .. } if namespace == NS));
        assert!(cluster.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_changes() {
        let project = project_with_targets(&["app-web", "app-api"]);
        let cluster = MockClusterClient::with_names(NS, ["app-old"]);
        let runner = MockCommandRunner::succeeding();
        let mut config = test_config(project.path());
        config.dry_run = true;

        let report = run(&cluster, &runner, config).await.unwrap();

        assert!(report.dry_run);
        assert!(report.modified().is_empty());
        assert_eq!(report.plan.to_delete, vec!["app-old"]);
        assert_eq!(report.plan.to_create, vec!["app-web", "app-api"]);
        assert_eq!(cluster.calls(), vec![MockCall::List]);
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_targets_are_skipped_and_reported() {
        let project = project_with_targets(&["app-1; rm -rf /", "web", "app-web", "app-web"]);
        let cluster = MockClusterClient::new(NS);
        let runner = MockCommandRunner::succeeding();

        let report = run(&cluster, &runner, test_config(project.path())).await.unwrap();

        assert_eq!(report.modified(), vec!["app-web"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(runner.deployed_names(), vec!["app-web"]);
    }

    #[tokio::test]
    async fn test_external_removal_is_recreated() {
        let project = project_with_targets(&["app-web"]);
        let cluster = MockClusterClient::new(NS);
        let runner = MockCommandRunner::succeeding();
        let reconciler = reconciler(&cluster, &runner, test_config(project.path()));
        let credentials = ClusterCredentials::local();

        reconciler.run(&credentials).await.unwrap();
        cluster.remove_object("app-web");
        let report = reconciler.run(&credentials).await.unwrap();

        assert_eq!(report.modified(), vec!["app-web"]);
        assert_eq!(runner.deployed_names(), vec!["app-web", "app-web"]);
    }

    #[tokio::test]
    async fn test_empty_target_list_removes_all_owned_controllers() {
        let project = project_with_targets(&[]);
        let cluster = MockClusterClient::with_names(NS, ["app-a", "infra", "app-b"]);

        let report = run(&cluster, &MockCommandRunner::succeeding(), test_config(project.path()))
            .await
            .unwrap();

        assert_eq!(report.modified(), vec!["app-a", "app-b"]);
        assert_eq!(cluster.names(), vec!["infra"]);
    }
}

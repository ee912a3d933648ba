//! Deployment repository fixtures

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Temporary repository populated file by file
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }
}

/// A small deployment repository: mostly Dalmatian, one Caracal overlay,
/// one EOL container and one series no release table knows.
pub fn mixed_deployment() -> TestRepo {
    TestRepo::new()
        .with_file(
            "helm-chart-versions.yaml",
            r#"charts:
  nova: 2024.2.396+gfd123-628a320c
  neutron: "2024.2.12"
  rabbitmq: 14.6.6
"#,
        )
        .with_file(
            "base-helm-configs/glance/Chart.yaml",
            r#"apiVersion: v2
name: glance
version: 0.1.0
appVersion: "2024.2.3"
"#,
        )
        .with_file(
            "base-helm-configs/neutron/neutron-helm-overrides.yaml",
            r#"images:
  tags:
    # neutron_server: "ghcr.io/example/neutron:2023.1.0"
    neutron_server: "ghcr.io/example/neutron:2024.2.12"
"#,
        )
        .with_file(
            "base-kustomize/keystone/overlay/kustomization.yaml",
            r#"resources:
  - ../base
images:
  - name: ghcr.io/rackerlabs/genestack-images/keystone
    newTag: 2024.1-latest
"#,
        )
        .with_file(
            "containers/heat.dockerfile",
            "FROM ghcr.io/example/heat:2021.0.9 AS build\n",
        )
        .with_file(
            "base-helm-configs/horizon/horizon-helm-overrides.yaml",
            "conf:\n  horizon: 2031.1.0\n",
        )
        .with_file(".git/config.yaml", "cinder: 2024.2.1\n")
}

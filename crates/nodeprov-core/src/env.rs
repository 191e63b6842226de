//! Layered environment model
//!
//! An [`Environment`] is an ordered list of `KEY=VALUE` pairs. Layers are
//! combined explicitly:
//!
//! - [`Environment::compose`] adds a layer whose keys must be new
//!   (a collision is a [`CoreError::DuplicateVariable`])
//! - [`Environment::overlay`] adds a layer that wins on collision, used only
//!   for importing cloud parameters
//!
//! Rendering does no quoting. Values must already be shell-safe; the
//! parameter-file parser in [`crate::bash_env`] rejects anything else.

use crate::error::{CoreError, Result};

pub const DEFAULT_SERVICE_USER: &str = "nodepool";
pub const DEFAULT_SERVICE_HOME: &str = "/home/nodepool";
pub const DEFAULT_KEY_NAME: &str = "nodepool";

pub const PROJECT_CONFIG_URL: &str = "https://github.com/citrix-openstack/project-config";
pub const PROJECT_CONFIG_BRANCH: &str = "xenserver-ci";

/// Ordered, duplicate-free variable mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, rejecting repeated keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = Self::new();
        for (key, value) in pairs {
            env.insert_new(key.into(), value.into())?;
        }
        Ok(env)
    }

    fn insert_new(&mut self, key: String, value: String) -> Result<()> {
        if self.contains_key(&key) {
            return Err(CoreError::DuplicateVariable(key));
        }
        self.vars.push((key, value));
        Ok(())
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.vars.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Append `additions`; every added key must be new.
    pub fn compose(mut self, additions: Environment) -> Result<Self> {
        for (key, value) in additions.vars {
            self.insert_new(key, value)?;
        }
        Ok(self)
    }

    /// Append `layer`; its values win on collision.
    pub fn overlay(mut self, layer: &Environment) -> Self {
        for (key, value) in layer.iter() {
            self.set(key, value);
        }
        self
    }

    /// `KEY=VALUE KEY=VALUE ...` prefix for a remote command line
    pub fn bashline(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Identity of the service account on the provisioned host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub username: String,
    pub home: String,
    pub key_name: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            username: DEFAULT_SERVICE_USER.to_string(),
            home: DEFAULT_SERVICE_HOME.to_string(),
            key_name: DEFAULT_KEY_NAME.to_string(),
        }
    }
}

impl ServiceIdentity {
    pub fn environment(&self) -> Result<Environment> {
        Environment::from_pairs([
            ("NODEPOOL_USER", self.username.as_str()),
            ("NODEPOOL_HOME_DIR", self.home.as_str()),
        ])
    }

    /// Where the install script leaves the service's public key
    pub fn public_key_path(&self) -> String {
        format!("{}/.ssh/id_rsa.pub", self.home)
    }
}

/// Environment for the install script: identity plus the source to build from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallEnv {
    pub identity: ServiceIdentity,
    pub repo: String,
    pub branch: String,
}

impl InstallEnv {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            identity: ServiceIdentity::default(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    pub fn environment(&self) -> Result<Environment> {
        self.identity.environment()?.compose(Environment::from_pairs([
            ("NODEPOOL_REPO", self.repo.as_str()),
            ("NODEPOOL_BRANCH", self.branch.as_str()),
        ])?)
    }
}

/// Environment for the configuration script and the nodepool.yaml template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEnv {
    pub identity: ServiceIdentity,
    /// Cloud access parameters, imported verbatim from the openrc file
    pub cloud: Environment,
    pub image_name: String,
    pub min_ready: String,
    pub rackspace_password: String,
    pub project_config_url: String,
    pub project_config_branch: String,
}

impl ConfigEnv {
    pub fn new(
        cloud: Environment,
        image_name: impl Into<String>,
        min_ready: u32,
        rackspace_password: impl Into<String>,
    ) -> Self {
        Self {
            identity: ServiceIdentity::default(),
            cloud,
            image_name: image_name.into(),
            min_ready: min_ready.to_string(),
            rackspace_password: rackspace_password.into(),
            project_config_url: PROJECT_CONFIG_URL.to_string(),
            project_config_branch: PROJECT_CONFIG_BRANCH.to_string(),
        }
    }

    /// Cloud access only; image and capacity settings are placeholders.
    ///
    /// Enough to render nodepool.yaml for its provider topology.
    pub fn for_cloud(cloud: Environment) -> Self {
        let mut env = Self::new(cloud, "ignored", 0, "ignored");
        env.min_ready = "ignored".to_string();
        env
    }

    pub fn environment(&self) -> Result<Environment> {
        let additions = Environment::from_pairs([
            ("PROJECT_CONFIG_URL", self.project_config_url.as_str()),
            ("PROJECT_CONFIG_BRANCH", self.project_config_branch.as_str()),
            ("IMAGE_NAME", self.image_name.as_str()),
            ("MIN_READY", self.min_ready.as_str()),
            ("RACKSPACE_PASSWORD", self.rackspace_password.as_str()),
        ])?;
        Ok(self.identity.environment()?.compose(additions)?.overlay(&self.cloud))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> Environment {
        Environment::from_pairs([
            ("OS_USERNAME", "ci"),
            ("OS_PASSWORD", "secret"),
            ("OS_AUTH_URL", "https://identity.example.com/v2.0/"),
        ])
        .unwrap()
    }

    fn assert_superset(derived: &Environment, base: &Environment) {
        for key in base.keys() {
            assert!(derived.contains_key(key), "missing inherited key {key}");
        }
        assert!(derived.len() > base.len());
    }

    #[test]
    fn test_identity_environment() {
        let env = ServiceIdentity::default().environment().unwrap();
        assert_eq!(env.bashline(), "NODEPOOL_USER=nodepool NODEPOOL_HOME_DIR=/home/nodepool");
    }

    #[test]
    fn test_install_env_extends_identity() {
        let install = InstallEnv::new("https://git.example.com/nodepool.git", "stable");
        let env = install.environment().unwrap();
        let base = install.identity.environment().unwrap();

        assert_superset(&env, &base);
        assert_eq!(env.get("NODEPOOL_REPO"), Some("https://git.example.com/nodepool.git"));
        assert_eq!(env.get("NODEPOOL_BRANCH"), Some("stable"));
        assert_eq!(
            env.bashline(),
            "NODEPOOL_USER=nodepool NODEPOOL_HOME_DIR=/home/nodepool \
             NODEPOOL_REPO=https://git.example.com/nodepool.git NODEPOOL_BRANCH=stable"
        );
    }

    #[test]
    fn test_config_env_extends_identity_and_imports_cloud() {
        let config = ConfigEnv::new(cloud(), "devstack-xenial", 8, "hunter2");
        let env = config.environment().unwrap();

        assert_superset(&env, &config.identity.environment().unwrap());
        assert_eq!(env.get("IMAGE_NAME"), Some("devstack-xenial"));
        assert_eq!(env.get("MIN_READY"), Some("8"));
        assert_eq!(env.get("RACKSPACE_PASSWORD"), Some("hunter2"));
        assert_eq!(env.get("PROJECT_CONFIG_URL"), Some(PROJECT_CONFIG_URL));
        assert_eq!(env.get("PROJECT_CONFIG_BRANCH"), Some(PROJECT_CONFIG_BRANCH));
        assert_eq!(env.get("OS_USERNAME"), Some("ci"));
        assert_eq!(env.get("OS_PASSWORD"), Some("secret"));
    }

    #[test]
    fn test_cloud_parameters_win_on_collision() {
        let cloud = Environment::from_pairs([("IMAGE_NAME", "from-openrc")]).unwrap();
        let env = ConfigEnv::new(cloud, "from-cli", 8, "pw").environment().unwrap();

        assert_eq!(env.get("IMAGE_NAME"), Some("from-openrc"));
        assert_eq!(env.keys().filter(|k| *k == "IMAGE_NAME").count(), 1);
    }

    #[test]
    fn test_compose_rejects_collisions() {
        let base = Environment::from_pairs([("A", "1")]).unwrap();
        let additions = Environment::from_pairs([("B", "2"), ("A", "3")]).unwrap();

        match base.compose(additions) {
            Err(CoreError::DuplicateVariable(key)) => assert_eq!(key, "A"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_from_pairs_rejects_repeats() {
        assert!(Environment::from_pairs([("A", "1"), ("A", "2")]).is_err());
    }

    #[test]
    fn test_order_is_preserved() {
        let env = Environment::from_pairs([("Z", "1"), ("A", "2"), ("M", "3")]).unwrap();
        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_bashline_does_not_quote() {
        let env = Environment::from_pairs([("A", "x y")]).unwrap();
        assert_eq!(env.bashline(), "A=x y");
        assert_eq!(Environment::new().bashline(), "");
    }

    #[test]
    fn test_for_cloud_placeholders() {
        let env = ConfigEnv::for_cloud(cloud()).environment().unwrap();
        assert_eq!(env.get("IMAGE_NAME"), Some("ignored"));
        assert_eq!(env.get("MIN_READY"), Some("ignored"));
        assert_eq!(env.get("OS_USERNAME"), Some("ci"));
    }

    #[test]
    fn test_public_key_path() {
        assert_eq!(
            ServiceIdentity::default().public_key_path(),
            "/home/nodepool/.ssh/id_rsa.pub"
        );
    }
}

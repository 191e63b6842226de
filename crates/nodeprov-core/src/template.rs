//! Template rendering
//!
//! Uses Tera to render configuration documents from an [`Environment`].

use crate::env::{ConfigEnv, Environment};
use crate::error::{CoreError, Result};
use tera::{Context, Tera};
use tracing::debug;

const NODEPOOL_CONFIG_TEMPLATE: &str = include_str!("../assets/nodepool.yaml.tera");

/// Cloud parameters the nodepool.yaml template substitutes
pub const CLOUD_VARIABLES: &[&str] = &["OS_USERNAME", "OS_TENANT_NAME", "OS_AUTH_URL"];

/// Template processor
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    pub fn add_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.context
            .insert(key.into(), &serde_json::Value::String(value.into()));
    }

    /// Every variable of `env` becomes a top-level template variable.
    pub fn add_environment(&mut self, env: &Environment) {
        for (key, value) in env.iter() {
            self.add_variable(key, value);
        }
        debug!(variable_count = env.len(), "Added environment to template context");
    }

    /// Render a string as a template
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| CoreError::Template(extract_tera_error_detail(&e)))
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render nodepool.yaml for the given configuration-time environment.
pub fn render_nodepool_config(env: &Environment) -> Result<String> {
    let mut processor = TemplateProcessor::new();
    processor.add_environment(env);
    processor.render_str(NODEPOOL_CONFIG_TEMPLATE)
}

/// Render nodepool.yaml for its provider topology only.
///
/// Every substituted value is a placeholder, so the result does not
/// depend on which cloud parameters a caller has.
pub fn render_nodepool_topology() -> Result<String> {
    let cloud = Environment::from_pairs(CLOUD_VARIABLES.iter().map(|key| (*key, "ignored")))?;
    render_nodepool_config(&ConfigEnv::for_cloud(cloud).environment()?)
}

/// Walk the Tera error chain and point at an undefined variable if there is one.
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    // "Variable `xxx` not found in context while rendering '...'"
    if let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!(
            "undefined variable `{var_name}`\nhint: add it to the parameter file"
        );
    }

    full_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ConfigEnv;
    use crate::topology;

    fn cloud() -> Environment {
        Environment::from_pairs([
            ("OS_USERNAME", "ci"),
            ("OS_TENANT_NAME", "123456"),
            ("OS_AUTH_URL", "https://identity.api.rackspacecloud.com/v2.0/"),
        ])
        .unwrap()
    }

    #[test]
    fn test_simple_variable_expansion() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("name", "world");

        let result = processor.render_str("Hello {{ name }}!").unwrap();
        assert_eq!(result, "Hello world!");
    }

    #[test]
    fn test_undefined_variable_is_named() {
        let mut processor = TemplateProcessor::new();
        let err = processor.render_str("{{ OS_PASSWORD }}").unwrap_err();

        match err {
            CoreError::Template(msg) => assert!(msg.contains("OS_PASSWORD"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_render_nodepool_config() {
        let env = ConfigEnv::new(cloud(), "devstack-trusty", 4, "hunter2")
            .environment()
            .unwrap();
        let yaml = render_nodepool_config(&env).unwrap();

        assert!(yaml.contains("username: 'ci'"));
        assert!(yaml.contains("password: 'hunter2'"));
        assert!(yaml.contains("min-ready: 4"));
        assert!(yaml.contains("private-key: /home/nodepool/.ssh/id_rsa"));
        assert_eq!(
            topology::in_use_regions(&yaml).unwrap(),
            vec!["IAD".to_string(), "DFW".to_string()]
        );
    }

    #[test]
    fn test_topology_render_needs_no_cloud_parameters() {
        let yaml = render_nodepool_topology().unwrap();
        assert!(yaml.contains("username: 'ignored'"));
        assert_eq!(
            topology::in_use_regions(&yaml).unwrap(),
            vec!["IAD".to_string(), "DFW".to_string()]
        );
    }

    #[test]
    fn test_render_requires_cloud_parameters() {
        let env = ConfigEnv::new(Environment::new(), "img", 1, "pw")
            .environment()
            .unwrap();
        assert!(matches!(
            render_nodepool_config(&env),
            Err(CoreError::Template(_))
        ));
    }
}

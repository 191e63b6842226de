//! Cloud topology of a nodepool configuration
//!
//! Only the parts needed to find which regions are in use are modelled;
//! everything else in the document is ignored.

use crate::error::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodepoolTopology {
    #[serde(default)]
    pub providers: Vec<Provider>,

    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub name: String,

    #[serde(rename = "region-name")]
    pub region_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub images: Vec<TargetImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetImage {
    #[serde(default)]
    pub providers: Vec<ProviderRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRef {
    pub name: String,
}

impl NodepoolTopology {
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Names of providers referenced by at least one target image
    pub fn used_providers(&self) -> Vec<&str> {
        self.targets
            .iter()
            .flat_map(|t| &t.images)
            .flat_map(|i| &i.providers)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Regions of used providers, in provider declaration order.
    ///
    /// A reference to an undeclared provider contributes nothing, and a
    /// region shared by several providers is listed once.
    pub fn in_use_regions(&self) -> Vec<String> {
        let used = self.used_providers();
        let mut regions: Vec<String> = Vec::new();
        for provider in &self.providers {
            if used.contains(&provider.name.as_str()) && !regions.contains(&provider.region_name) {
                regions.push(provider.region_name.clone());
            }
        }
        regions
    }
}

/// Regions referenced by the images of a rendered nodepool.yaml
pub fn in_use_regions(yaml: &str) -> Result<Vec<String>> {
    Ok(NodepoolTopology::parse(yaml)?.in_use_regions())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
providers:
  - name: rax-ord
    region-name: ORD
  - name: rax-iad
    region-name: IAD
    max-servers: 10
  - name: rax-dfw
    region-name: DFW
  - name: rax-unused
    region-name: HKG
targets:
  - name: jenkins
    images:
      - name: trusty
        providers:
          - name: rax-dfw
          - name: rax-iad
      - name: xenial
        providers:
          - name: rax-ord
          - name: rax-missing
"#;

    #[test]
    fn test_regions_follow_provider_order() {
        assert_eq!(in_use_regions(CONFIG).unwrap(), vec!["ORD", "IAD", "DFW"]);
    }

    #[test]
    fn test_unreferenced_and_undeclared_providers_are_skipped() {
        let regions = in_use_regions(CONFIG).unwrap();
        assert!(!regions.contains(&"HKG".to_string()));
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn test_no_targets_means_no_regions() {
        let yaml = "providers:\n  - name: a\n    region-name: IAD\n";
        assert!(in_use_regions(yaml).unwrap().is_empty());
    }

    #[test]
    fn test_shared_region_listed_once() {
        let yaml = r#"
providers:
  - name: a
    region-name: IAD
  - name: b
    region-name: IAD
targets:
  - images:
      - providers:
          - name: a
          - name: b
"#;
        assert_eq!(in_use_regions(yaml).unwrap(), vec!["IAD"]);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(in_use_regions("providers: [").is_err());
    }
}

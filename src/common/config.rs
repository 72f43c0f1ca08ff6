use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::bail;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::collections::BTreeSet;
use crate::sys::host::WorkspaceId;

pub fn config_file() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("tiletree").join("config.toml"))
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
}

/// Everything the layout engine reads while it runs.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default)]
    pub node_collapse_policy: NodeCollapsePolicy,
    /// Wrap the first window of a workspace in a tab group.
    #[serde(default = "no")]
    pub tab_first_window: bool,
    /// A workspace holding a single window gives it the whole usable area.
    #[serde(default = "no")]
    pub no_gaps_when_only: bool,
    /// Right inset applied to the only child of a nested group, so the
    /// group's extent stays visible.
    #[serde(default = "default_group_inset")]
    pub group_inset: f64,
    #[serde(default = "no")]
    pub animate_manual_resizes: bool,
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub tabs: TabSettings,
    #[serde(default)]
    pub autotile: AutotileSettings,
}

/// When a group left with one child is replaced by that child.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeCollapsePolicy {
    Always,
    Never,
    #[default]
    UnlessParentTabbed,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    #[serde(default)]
    pub outer: OuterGaps,
    #[serde(default)]
    pub inner: InnerGaps,
}

/// Outer gap configuration (space between windows and screen edges)
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

/// Inner gap configuration (space between windows)
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    /// Gap between horizontally adjacent windows
    #[serde(default)]
    pub horizontal: f64,
    /// Gap between vertically adjacent windows
    #[serde(default)]
    pub vertical: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TabSettings {
    #[serde(default = "default_tab_height")]
    pub height: f64,
    #[serde(default = "default_tab_padding")]
    pub padding: f64,
}

impl TabSettings {
    /// Height of the strip reserved above the children of a tabbed group.
    pub fn strip(&self) -> f64 { self.height + self.padding }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct AutotileSettings {
    #[serde(default = "no")]
    pub enable: bool,
    /// Groups created by autotile dissolve once they are down to one child.
    #[serde(default = "yes")]
    pub ephemeral_groups: bool,
    /// Negative disables, zero always splits, otherwise the minimum width in
    /// pixels a tile may shrink to before its slot is subdivided.
    #[serde(default)]
    pub trigger_width: i64,
    #[serde(default)]
    pub trigger_height: i64,
    /// `all`, a list of workspace ids, or `not:` followed by a list.
    #[serde(default = "default_autotile_workspaces")]
    pub workspaces: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_collapse_policy: NodeCollapsePolicy::default(),
            tab_first_window: false,
            no_gaps_when_only: false,
            group_inset: default_group_inset(),
            animate_manual_resizes: false,
            gaps: GapSettings::default(),
            tabs: TabSettings::default(),
            autotile: AutotileSettings::default(),
        }
    }
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            height: default_tab_height(),
            padding: default_tab_padding(),
        }
    }
}

impl Default for AutotileSettings {
    fn default() -> Self {
        Self {
            enable: false,
            ephemeral_groups: true,
            trigger_width: 0,
            trigger_height: 0,
            workspaces: default_autotile_workspaces(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.group_inset < 0.0 {
            issues.push(format!("group_inset must be non-negative, got {}", self.group_inset));
        }

        issues.extend(self.gaps.validate());
        issues.extend(self.tabs.validate());
        issues.extend(self.autotile.validate());

        issues
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.outer.validate());
        issues.extend(self.inner.validate());
        issues
    }
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("top", self.top),
            ("left", self.left),
            ("bottom", self.bottom),
            ("right", self.right),
        ] {
            if value < 0.0 {
                issues.push(format!("outer.{name} gap must be non-negative, got {value}"));
            }
        }

        issues
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.horizontal < 0.0 {
            issues.push(format!(
                "inner.horizontal gap must be non-negative, got {}",
                self.horizontal
            ));
        }

        if self.vertical < 0.0 {
            issues.push(format!(
                "inner.vertical gap must be non-negative, got {}",
                self.vertical
            ));
        }

        issues
    }
}

impl TabSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.height < 0.0 {
            issues.push(format!("tabs.height must be non-negative, got {}", self.height));
        }

        if self.padding < 0.0 {
            issues.push(format!("tabs.padding must be non-negative, got {}", self.padding));
        }

        issues
    }
}

impl AutotileSettings {
    pub fn validate(&self) -> Vec<String> {
        let (_, invalid) = WorkspaceFilter::parse(&self.workspaces);
        invalid
            .into_iter()
            .map(|id| format!("autotile.workspaces: invalid workspace id `{id}`"))
            .collect()
    }
}

/// Which workspaces autotile applies to.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub enum WorkspaceFilter {
    #[default]
    All,
    /// An empty set allows every workspace.
    Only(BTreeSet<WorkspaceId>),
    Except(BTreeSet<WorkspaceId>),
}

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").unwrap());

impl WorkspaceFilter {
    /// Parses the configured workspace list. Ids that fail to parse are
    /// skipped and returned alongside the filter.
    pub fn parse(raw: &str) -> (WorkspaceFilter, Vec<String>) {
        let raw = raw.trim();
        if raw == "all" {
            return (WorkspaceFilter::All, Vec::new());
        }
        let (deny, list) = match raw.strip_prefix("not:") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut ids = BTreeSet::new();
        let mut invalid = Vec::new();
        for token in SEPARATOR.split(list).filter(|t| !t.is_empty()) {
            match token.parse::<i64>() {
                Ok(id) => {
                    ids.insert(WorkspaceId(id));
                }
                Err(_) => invalid.push(token.to_owned()),
            }
        }

        let filter = if deny { WorkspaceFilter::Except(ids) } else { WorkspaceFilter::Only(ids) };
        (filter, invalid)
    }

    pub fn allows(&self, workspace: WorkspaceId) -> bool {
        match self {
            WorkspaceFilter::All => true,
            WorkspaceFilter::Only(ids) => ids.is_empty() || ids.contains(&workspace),
            WorkspaceFilter::Except(ids) => !ids.contains(&workspace),
        }
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_group_inset() -> f64 { 10.0 }

fn default_tab_height() -> f64 { 22.0 }

fn default_tab_padding() -> f64 { 6.0 }

fn default_autotile_workspaces() -> String { "all".to_owned() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("{e}"),
        }
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.layout.validate() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.layout.group_inset, 10.0);
        assert_eq!(cfg.layout.tabs.strip(), 28.0);
        assert_eq!(cfg.layout.node_collapse_policy, NodeCollapsePolicy::UnlessParentTabbed);
        assert!(cfg.layout.autotile.ephemeral_groups);
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let cfg = Config::parse(include_str!("../../tiletree.default.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [layout]
            node_collapse_policy = "always"
            tab_first_window = true

            [layout.gaps.outer]
            top = 5
            left = 5.5

            [layout.gaps.inner]
            horizontal = 8

            [layout.tabs]
            height = 30

            [layout.autotile]
            enable = true
            trigger_width = 300
            workspaces = "not:1 2"
        "#;
        let cfg = Config::parse(toml).unwrap();
        assert_eq!(cfg.layout.node_collapse_policy, NodeCollapsePolicy::Always);
        assert!(cfg.layout.tab_first_window);
        assert_eq!(cfg.layout.gaps.outer.left, 5.5);
        assert_eq!(cfg.layout.gaps.inner.horizontal, 8.0);
        assert_eq!(cfg.layout.tabs.strip(), 36.0);
        assert_eq!(cfg.layout.autotile.trigger_width, 300);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[layout]\nno_gaps_when_only = true\n").unwrap();
        let cfg = Config::read(file.path()).unwrap();
        assert!(cfg.layout.no_gaps_when_only);
        assert!(Config::read(&file.path().with_extension("missing")).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Config::parse("[layout]\nbogus = 1\n").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_validate_reports_negative_values() {
        let mut cfg = Config::default();
        cfg.layout.gaps.outer.top = -1.0;
        cfg.layout.tabs.padding = -2.0;
        cfg.layout.autotile.workspaces = "1 x".into();
        let issues = cfg.validate();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(issues[0].contains("outer.top"));
    }

    #[test]
    fn test_workspace_filter() {
        let (filter, invalid) = WorkspaceFilter::parse("all");
        assert_eq!(filter, WorkspaceFilter::All);
        assert!(invalid.is_empty());

        let (filter, _) = WorkspaceFilter::parse("");
        assert!(filter.allows(WorkspaceId(7)));

        let (filter, invalid) = WorkspaceFilter::parse("1, 2 3,,x");
        assert!(filter.allows(WorkspaceId(2)));
        assert!(!filter.allows(WorkspaceId(4)));
        assert_eq!(invalid, vec!["x".to_owned()]);

        let (filter, _) = WorkspaceFilter::parse("not: 1 2");
        assert!(!filter.allows(WorkspaceId(1)));
        assert!(filter.allows(WorkspaceId(3)));
    }
}

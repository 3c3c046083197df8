//! Declarative extraction rules for bundle-derived workloads
//!
//! An [`ExtractionRule`] tells Meshery where to download a bundle and how to
//! walk the manifests inside it to emit one workload definition per CRD.
//! The walk itself is described by a [`FilterSpec`]: a set of JSONPath-style
//! selectors that Meshery evaluates. Nothing here evaluates the selectors;
//! the filter is opaque data validated for completeness and handed off as is.
//!
//! Supporting a different bundle layout means swapping the FilterSpec, not
//! the registration pipeline.
//!
//! # Wire format
//!
//! Each selector serializes as a list: the primary query, optionally
//! followed by the output-filter marker and a second query that reduces the
//! primary result to a single value.
//!
//! ```text
//! "versionFilter": ["$..spec.versions[0]", " --o-filter", "$[0]"]
//! "nameFilter":    ["$..[\"spec\"][\"names\"][\"kind\"]"]
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Separator between a primary query and its output filter on the wire
pub const OUTPUT_FILTER_MARKER: &str = " --o-filter";

/// A primary query with an optional output filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct Selector {
    primary: String,
    output_filter: Option<String>,
}

impl Selector {
    /// Selector with a primary query only
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            output_filter: None,
        }
    }

    /// Reduce the primary result with a second query
    pub fn with_output_filter(mut self, output_filter: impl Into<String>) -> Self {
        self.output_filter = Some(output_filter.into());
        self
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn output_filter(&self) -> Option<&str> {
        self.output_filter.as_deref()
    }

    fn is_populated(&self) -> bool {
        !self.primary.trim().is_empty()
            && self
                .output_filter
                .as_deref()
                .map_or(true, |f| !f.trim().is_empty())
    }
}

impl From<Selector> for Vec<String> {
    fn from(selector: Selector) -> Self {
        let mut parts = vec![selector.primary];
        if let Some(output_filter) = selector.output_filter {
            parts.push(OUTPUT_FILTER_MARKER.to_string());
            parts.push(output_filter);
        }
        parts
    }
}

impl TryFrom<Vec<String>> for Selector {
    type Error = String;

    fn try_from(parts: Vec<String>) -> std::result::Result<Self, Self::Error> {
        match parts.as_slice() {
            [primary] => Ok(Selector::new(primary.clone())),
            [primary, marker, output] if marker.trim() == OUTPUT_FILTER_MARKER.trim() => {
                Ok(Selector::new(primary.clone()).with_output_filter(output.clone()))
            }
            _ => Err(format!("malformed selector: {:?}", parts)),
        }
    }
}

/// How Meshery should walk a bundle to emit workload definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Isolates the documents of interest (e.g., all CRDs)
    pub root_filter: Selector,

    /// Canonical name of each definition
    pub name_filter: Selector,

    /// Version metadata of each definition
    pub version_filter: Selector,

    /// Group metadata of each definition
    pub group_filter: Selector,

    /// Embedded schema of each definition
    pub spec_filter: Selector,

    /// Drives iteration over the definitions
    pub itr_filter: Selector,

    /// Drives iteration over the definitions' schemas
    pub itr_spec_filter: Selector,

    /// Field re-keying the resolved version
    pub v_field: String,

    /// Field re-keying the resolved group
    pub g_field: String,
}

impl FilterSpec {
    /// Start building a custom filter
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// Filter emitting one workload per CustomResourceDefinition in a Helm chart
    pub fn custom_resource_definitions() -> Self {
        Self {
            root_filter: Selector::new(r#"$[?(@.kind=="CustomResourceDefinition")]"#),
            name_filter: Selector::new(r#"$..["spec"]["names"]["kind"]"#),
            version_filter: Selector::new("$..spec.versions[0]").with_output_filter("$[0]"),
            group_filter: Selector::new("$..spec").with_output_filter("$[]"),
            spec_filter: Selector::new("$..openAPIV3Schema.properties.spec")
                .with_output_filter("$[]"),
            // Meshery closes the iteration predicate with each definition's kind
            itr_filter: Selector::new("$[?(@.spec.names.kind"),
            itr_spec_filter: Selector::new("$[?(@.spec.names.kind"),
            v_field: "name".to_string(),
            g_field: "group".to_string(),
        }
    }

    /// Names of unset or blank fields
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let selectors = [
            ("rootFilter", &self.root_filter),
            ("nameFilter", &self.name_filter),
            ("versionFilter", &self.version_filter),
            ("groupFilter", &self.group_filter),
            ("specFilter", &self.spec_filter),
            ("itrFilter", &self.itr_filter),
            ("itrSpecFilter", &self.itr_spec_filter),
        ];

        let mut missing: Vec<&'static str> = selectors
            .iter()
            .filter(|(_, selector)| !selector.is_populated())
            .map(|(name, _)| *name)
            .collect();

        if self.v_field.trim().is_empty() {
            missing.push("vField");
        }
        if self.g_field.trim().is_empty() {
            missing.push("gField");
        }
        missing
    }

    /// Reject a filter with any unset field
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::incomplete_filter(&missing))
        }
    }
}

/// Builder for [`FilterSpec`]; `build` fails unless every field is set
#[derive(Debug, Default, Clone)]
pub struct FilterSpecBuilder {
    root_filter: Option<Selector>,
    name_filter: Option<Selector>,
    version_filter: Option<Selector>,
    group_filter: Option<Selector>,
    spec_filter: Option<Selector>,
    itr_filter: Option<Selector>,
    itr_spec_filter: Option<Selector>,
    v_field: Option<String>,
    g_field: Option<String>,
}

impl FilterSpecBuilder {
    pub fn root(mut self, selector: Selector) -> Self {
        self.root_filter = Some(selector);
        self
    }

    pub fn name(mut self, selector: Selector) -> Self {
        self.name_filter = Some(selector);
        self
    }

    pub fn version(mut self, selector: Selector) -> Self {
        self.version_filter = Some(selector);
        self
    }

    pub fn group(mut self, selector: Selector) -> Self {
        self.group_filter = Some(selector);
        self
    }

    pub fn spec(mut self, selector: Selector) -> Self {
        self.spec_filter = Some(selector);
        self
    }

    pub fn iteration(mut self, selector: Selector) -> Self {
        self.itr_filter = Some(selector);
        self
    }

    pub fn iteration_spec(mut self, selector: Selector) -> Self {
        self.itr_spec_filter = Some(selector);
        self
    }

    pub fn version_field(mut self, field: impl Into<String>) -> Self {
        self.v_field = Some(field.into());
        self
    }

    pub fn group_field(mut self, field: impl Into<String>) -> Self {
        self.g_field = Some(field.into());
        self
    }

    pub fn build(self) -> Result<FilterSpec> {
        let mut missing = Vec::new();
        let mut take = |value: Option<Selector>, name: &'static str| {
            value.unwrap_or_else(|| {
                missing.push(name);
                Selector::new("")
            })
        };

        let root_filter = take(self.root_filter, "rootFilter");
        let name_filter = take(self.name_filter, "nameFilter");
        let version_filter = take(self.version_filter, "versionFilter");
        let group_filter = take(self.group_filter, "groupFilter");
        let spec_filter = take(self.spec_filter, "specFilter");
        let itr_filter = take(self.itr_filter, "itrFilter");
        let itr_spec_filter = take(self.itr_spec_filter, "itrSpecFilter");

        let spec = FilterSpec {
            root_filter,
            name_filter,
            version_filter,
            group_filter,
            spec_filter,
            itr_filter,
            itr_spec_filter,
            v_field: self.v_field.unwrap_or_default(),
            g_field: self.g_field.unwrap_or_default(),
        };

        // unset selectors and blank ones are reported together
        let mut all_missing = missing;
        for name in spec.missing_fields() {
            if !all_missing.contains(&name) {
                all_missing.push(name);
            }
        }

        if all_missing.is_empty() {
            Ok(spec)
        } else {
            Err(Error::incomplete_filter(&all_missing))
        }
    }
}

/// How the source bundle is packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMethod {
    /// Packaged Helm chart archive
    #[serde(rename = "HELM")]
    BundleArchive,

    /// Plain manifest files
    #[serde(rename = "MANIFEST")]
    Manifests,
}

/// A complete dynamic registration request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRule {
    /// Mesh type name
    pub name: String,

    /// Normalized mesh version
    pub mesh_version: String,

    /// How to walk the bundle
    pub filter: FilterSpec,

    /// Bundle packaging
    pub generation_method: GenerationMethod,

    /// Bundle download URL
    #[serde(rename = "sourceURL")]
    pub source_url: String,

    /// Processing bound for the remote side
    pub timeout_minutes: u32,
}

impl ExtractionRule {
    /// Assemble a rule; fails if the filter is incomplete
    pub fn new(
        name: impl Into<String>,
        mesh_version: impl Into<String>,
        filter: FilterSpec,
        generation_method: GenerationMethod,
        source_url: impl Into<String>,
        timeout_minutes: u32,
    ) -> Result<Self> {
        filter.validate()?;

        Ok(Self {
            name: name.into(),
            mesh_version: mesh_version.into(),
            filter,
            generation_method,
            source_url: source_url.into(),
            timeout_minutes,
        })
    }
}

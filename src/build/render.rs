use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::{BusinessInfo, OutputFormat, RootConfig};
use crate::dataset::LocationRecord;

use super::escape::{astro_prop, escape_astro, escape_html};
use super::paths::canonical_path;
use super::structured_data::LocalBusiness;

/// Templates compiled into the binary.
const BUILTIN_TEMPLATES: [(&str, &str); 4] = [
    ("page_astro.html", include_str!("../../templates/page_astro.html")),
    ("page_html.html", include_str!("../../templates/page_html.html")),
    ("sections.html", include_str!("../../templates/sections.html")),
    ("location.css", include_str!("../../templates/location.css")),
];

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("structured data error: {0}")]
    StructuredData(#[from] serde_json::Error),

    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    #[error("template '{0}' is missing from the theme")]
    MissingTemplate(&'static str),
}

/// Everything the renderer needs besides the record itself.
///
/// Identical for every page of a run.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub business: BusinessInfo,
    pub format: OutputFormat,
    pub url_prefix: String,
}

impl RenderSettings {
    pub fn from_config(config: &RootConfig) -> Self {
        Self {
            business: config.business.clone(),
            format: config.site.format,
            url_prefix: config.site.url_prefix.clone(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_config(&RootConfig::default())
    }
}

/// The page renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
    settings: RenderSettings,
}

impl Renderer {
    /// Create a renderer from the templates compiled into the binary.
    pub fn builtin(settings: RenderSettings) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES)?;
        Self::with_tera(tera, settings)
    }

    /// Create a new renderer loading templates from the given theme directory.
    pub fn from_theme(theme_path: &Path, settings: RenderSettings) -> Result<Self, RenderError> {
        let templates_path = theme_path.join("templates");
        if !templates_path.exists() {
            return Err(RenderError::ThemeNotFound(
                theme_path.display().to_string(),
            ));
        }

        let glob = templates_path.join("**/*");
        let glob_str = glob.to_string_lossy();
        let tera = Tera::new(&glob_str)?;

        Self::with_tera(tera, settings)
    }

    fn with_tera(mut tera: Tera, settings: RenderSettings) -> Result<Self, RenderError> {
        let page_template = settings.format.page_template();
        if !tera.get_template_names().any(|name| name == page_template) {
            return Err(RenderError::MissingTemplate(page_template));
        }

        tera.set_escape_fn(match settings.format {
            OutputFormat::Astro => escape_astro,
            OutputFormat::Html => escape_html,
        });

        Ok(Self { tera, settings })
    }

    pub fn format(&self) -> OutputFormat {
        self.settings.format
    }

    /// Render the complete document for one location.
    ///
    /// Pure: the same record always yields the same text.
    pub fn render(&self, record: &LocationRecord) -> Result<String, RenderError> {
        let business = &self.settings.business;
        let page = PageInfo::new(business, &self.settings.url_prefix, record);
        let structured_data =
            LocalBusiness::new(business, record, &page.canonical_url).to_script_json()?;

        let mut tera_context = Context::new();
        tera_context.insert("business", business);
        tera_context.insert("location", record);
        tera_context.insert("page", &page);
        tera_context.insert("structured_data", &structured_data);
        if self.settings.format == OutputFormat::Astro {
            tera_context.insert("props", &LayoutProps::new(&page)?);
        }

        Ok(self
            .tera
            .render(self.settings.format.page_template(), &tera_context)?)
    }
}

/// Page-level metadata derived from the record.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
    /// Site-relative canonical path ("/locations/turlock")
    pub canonical_path: String,
    /// Absolute canonical URL
    pub canonical_url: String,
}

impl PageInfo {
    fn new(business: &BusinessInfo, url_prefix: &str, record: &LocationRecord) -> Self {
        let canonical_path = canonical_path(url_prefix, &record.slug);
        let region = &business.region;
        Self {
            title: format!(
                "Professional Fence Installation {} {region} | Top-Rated Local Contractors | Free Estimates",
                record.name
            ),
            description: format!(
                "Expert fence installation in {}, {region}. Serving all neighborhoods with wood, vinyl, chain link & iron fencing. Licensed, insured contractors. Free estimates!",
                record.name
            ),
            canonical_url: format!("{}{}", business.url, canonical_path),
            canonical_path,
        }
    }
}

/// `Layout` component props as JS string literals, inserted raw into
/// `prop={...}` expressions.
#[derive(Debug, Serialize)]
struct LayoutProps {
    title: String,
    description: String,
    canonical_path: String,
}

impl LayoutProps {
    fn new(page: &PageInfo) -> Result<Self, RenderError> {
        Ok(Self {
            title: astro_prop(&page.title)?,
            description: astro_prop(&page.description)?,
            canonical_path: astro_prop(&page.canonical_path)?,
        })
    }
}

//! Lightbox settings snapshot.
//!
//! The settings layer of the publishing platform owns persistence; this crate
//! only consumes a read-only snapshot. The host injects it as JSON (the same
//! object the page script reads), and site operators can keep a TOML copy to
//! validate and generate CSS from with the CLI.
//!
//! ## Settings
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! defaultAnimation = "zoom"    # slide | fade | zoom | none ("default" means zoom)
//! galleryAnimation = "slide"   # slide | fade | zoom | none
//! observer = false             # re-scan when content is injected later
//!
//! [hover]
//! effect = "none"              # none | darken | lighten | transparent
//! strength = 30                # 0-100, published as a 0.00-1.00 fraction
//!
//! [design]
//! maxWidth = ""                # CSS length for the stage, e.g. "90vw"
//! maxHeight = ""
//! overlayColor = ""            # "#rrggbb"
//! overlayOpacity = ""          # "0.85"
//! ```
//!
//! ## Leniency
//!
//! The engine never rejects a snapshot. Unknown keys are ignored and invalid
//! values are coerced to the nearest valid default when used
//! ([`LightboxSettings::normalized`], [`resolve_effect`]). Strict checking is
//! opt-in through [`LightboxSettings::validate`], which the CLI `check`
//! command uses to report mistakes to the operator.

use crate::viewer::Effect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings snapshot consumed at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightboxSettings {
    /// Effect for triggers without their own `data-andw-animation`.
    pub default_animation: String,
    /// Effect offered for gallery groups.
    pub gallery_animation: String,
    /// Watch the document for injected content and re-initialize.
    pub observer: bool,
    /// Hover treatment of trigger thumbnails.
    pub hover: HoverSettings,
    /// Overlay sizing and backdrop color.
    pub design: DesignSettings,
}

impl Default for LightboxSettings {
    fn default() -> Self {
        Self {
            default_animation: "zoom".to_string(),
            gallery_animation: "slide".to_string(),
            observer: false,
            hover: HoverSettings::default(),
            design: DesignSettings::default(),
        }
    }
}

/// Hover treatment of trigger thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverSettings {
    /// `none`, `darken`, `lighten`, or `transparent`.
    pub effect: String,
    /// Intensity 0-100. Out-of-range values are clamped when published.
    pub strength: i64,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            effect: "none".to_string(),
            strength: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEffect {
    None,
    Darken,
    Lighten,
    Transparent,
}

impl HoverEffect {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(HoverEffect::None),
            "darken" => Some(HoverEffect::Darken),
            "lighten" => Some(HoverEffect::Lighten),
            "transparent" => Some(HoverEffect::Transparent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HoverEffect::None => "none",
            HoverEffect::Darken => "darken",
            HoverEffect::Lighten => "lighten",
            HoverEffect::Transparent => "transparent",
        }
    }
}

/// Overlay sizing and backdrop color. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignSettings {
    pub max_width: String,
    pub max_height: String,
    pub overlay_color: String,
    pub overlay_opacity: String,
}

impl LightboxSettings {
    /// Parse the JSON snapshot injected by the host. Leniently: unknown keys
    /// are ignored and missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The snapshot as published to the page: `"default"` animation becomes
    /// `zoom`, an unknown gallery animation becomes `slide`, an unknown hover
    /// effect becomes `none`, and strength is clamped to 0-100.
    pub fn normalized(&self) -> Self {
        let default_animation = if self.default_animation == "default" {
            "zoom".to_string()
        } else {
            self.default_animation.clone()
        };
        let gallery_animation = Effect::parse(&self.gallery_animation)
            .unwrap_or(Effect::Slide)
            .as_str()
            .to_string();
        Self {
            default_animation,
            gallery_animation,
            observer: self.observer,
            hover: HoverSettings {
                effect: self.hover_effect().as_str().to_string(),
                strength: self.hover.strength.clamp(0, 100),
            },
            design: self.design.clone(),
        }
    }

    /// Configured default effect, if it names a valid effect.
    pub fn default_effect(&self) -> Option<Effect> {
        match self.default_animation.as_str() {
            "default" => Some(Effect::Zoom),
            other => Effect::parse(other),
        }
    }

    pub fn hover_effect(&self) -> HoverEffect {
        HoverEffect::parse(&self.hover.effect).unwrap_or(HoverEffect::None)
    }

    /// Strength as the CSS-consumable fraction string, e.g. `30` → `"0.30"`.
    pub fn hover_strength_css(&self) -> String {
        strength_to_css_value(self.hover.strength)
    }

    /// Strict check for operator-facing tools.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_effect().is_none() {
            return Err(ConfigError::Validation(format!(
                "defaultAnimation must be one of slide, fade, zoom, none, default (got \"{}\")",
                self.default_animation
            )));
        }
        if Effect::parse(&self.gallery_animation).is_none() {
            return Err(ConfigError::Validation(format!(
                "galleryAnimation must be one of slide, fade, zoom, none (got \"{}\")",
                self.gallery_animation
            )));
        }
        if HoverEffect::parse(&self.hover.effect).is_none() {
            return Err(ConfigError::Validation(format!(
                "hover.effect must be one of none, darken, lighten, transparent (got \"{}\")",
                self.hover.effect
            )));
        }
        if !(0..=100).contains(&self.hover.strength) {
            return Err(ConfigError::Validation(
                "hover.strength must be 0-100".into(),
            ));
        }
        if !self.design.overlay_color.is_empty()
            && parse_hex_color(&self.design.overlay_color).is_none()
        {
            return Err(ConfigError::Validation(
                "design.overlayColor must be a #rrggbb color".into(),
            ));
        }
        if !self.design.overlay_opacity.is_empty()
            && !self
                .design
                .overlay_opacity
                .parse::<f64>()
                .is_ok_and(|o| (0.0..=1.0).contains(&o))
        {
            return Err(ConfigError::Validation(
                "design.overlayOpacity must be a number between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effect for a partition.
///
/// `requested` wins when it names a valid effect. Otherwise the configured
/// default is used, and if that is invalid too, `slide`.
pub fn resolve_effect(requested: Option<&str>, settings: &LightboxSettings) -> Effect {
    requested
        .and_then(Effect::parse)
        .or_else(|| settings.default_effect())
        .unwrap_or(Effect::Slide)
}

/// Map a 0-100 strength to a two-decimal 0.00-1.00 fraction.
pub fn strength_to_css_value(strength: i64) -> String {
    let clamped = strength.clamp(0, 100);
    format!("{:.2}", clamped as f64 / 100.0)
}

/// Parse `#rrggbb` (leading `#` optional) into RGB components.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

// =============================================================================
// Loading
// =============================================================================

/// Load settings from a `.json` or `.toml` file (by extension; anything not
/// ending in `.json` is read as TOML).
pub fn load_settings(path: &Path) -> Result<LightboxSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        LightboxSettings::from_json(&content)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

/// Returns a fully-commented stock settings file with every key.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# andW Lightbox settings
# ======================
# All settings are optional. Values shown below are the defaults.
# Keys match the snapshot object injected into the page.

# Effect for images without their own animation: slide, fade, zoom, none.
# "default" is accepted and means zoom.
defaultAnimation = "zoom"

# Effect offered for gallery groups: slide, fade, zoom, none.
galleryAnimation = "slide"

# Re-scan the page when content is injected after load (infinite scroll,
# AJAX pagination). Re-initialization is debounced by 200ms.
observer = false

# ---------------------------------------------------------------------------
# Hover treatment of trigger thumbnails
# ---------------------------------------------------------------------------
[hover]
# none, darken, lighten, transparent
effect = "none"

# Intensity 0-100, published to CSS as a 0.00-1.00 fraction.
strength = 30

# ---------------------------------------------------------------------------
# Overlay design (leave empty to keep stylesheet defaults)
# ---------------------------------------------------------------------------
[design]
# Maximum size of the stage, as CSS lengths.
maxWidth = ""
maxHeight = ""

# Backdrop color (#rrggbb) and opacity (0-1). Both are needed.
overlayColor = ""
overlayOpacity = ""
"##
}

// =============================================================================
// CSS generation
// =============================================================================

/// CSS custom properties and hover rules for trigger thumbnails.
pub fn generate_hover_css(settings: &LightboxSettings) -> String {
    let strength = settings.hover_strength_css();
    let rule = match settings.hover_effect() {
        HoverEffect::None => None,
        HoverEffect::Darken => Some("filter: brightness(calc(1 - var(--andw-hover-strength)));"),
        HoverEffect::Lighten => Some("filter: brightness(calc(1 + var(--andw-hover-strength)));"),
        HoverEffect::Transparent => Some("opacity: calc(1 - var(--andw-hover-strength));"),
    };
    let mut css = format!(
        r#":root {{
    --andw-hover-strength: {strength};
}}"#
    );
    if let Some(rule) = rule {
        css.push_str(&format!(
            r#"

.glightbox[data-andw-hover="{effect}"]:hover img,
.glightbox[data-andw-hover="{effect}"]:focus-visible img {{
    {rule}
}}"#,
            effect = settings.hover_effect().as_str(),
        ));
    }
    css
}

/// Overlay sizing and backdrop rules. Empty when nothing is configured.
pub fn generate_design_css(design: &DesignSettings) -> String {
    let mut parts = Vec::new();

    let mut size = String::new();
    if !design.max_width.is_empty() {
        size.push_str(&format!("max-width: {} !important; ", design.max_width));
    }
    if !design.max_height.is_empty() {
        size.push_str(&format!("max-height: {} !important; ", design.max_height));
    }
    if !size.is_empty() {
        parts.push(format!(".{} {{ {size}}}", crate::classes::STAGE));
    }

    if let Some((r, g, b)) = parse_hex_color(&design.overlay_color)
        && !design.overlay_opacity.is_empty()
    {
        parts.push(format!(
            ".{} {{ background: rgba({r}, {g}, {b}, {}) !important; }}",
            crate::classes::BACKDROP,
            design.overlay_opacity
        ));
    }

    parts.join("\n")
}

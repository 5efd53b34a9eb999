//! CLI output formatting.
//!
//! # Settings
//!
//! `check` prints the snapshot the page would receive after normalization,
//! one key per line, with the effect each partition resolves to:
//!
//! ```text
//! Settings
//!     defaultAnimation: zoom
//!     galleryAnimation: slide
//!     observer: off
//!     hover: darken (0.30)
//!
//! Partitions
//!     default → zoom
//!     fade → fade
//!     zoom → zoom
//!     slide → slide
//!     none → none (open/close disabled)
//! ```
//!
//! # Class contract
//!
//! ```text
//! Classes
//!     andw-glightbox-open              body, while an overlay is open
//!     andw-glightbox-backdrop          overlay root; clicks on it close the overlay
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::adapter::PARTITIONS;
use crate::classes;
use crate::config::LightboxSettings;
use crate::viewer::Effect;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

// ============================================================================
// Settings
// ============================================================================

/// Format a normalized settings snapshot and its partition effects.
pub fn format_settings(settings: &LightboxSettings) -> Vec<String> {
    let settings = settings.normalized();
    let mut lines = vec!["Settings".to_string()];
    lines.push(format!("{}defaultAnimation: {}", indent(1), settings.default_animation));
    lines.push(format!("{}galleryAnimation: {}", indent(1), settings.gallery_animation));
    lines.push(format!("{}observer: {}", indent(1), on_off(settings.observer)));
    lines.push(format!(
        "{}hover: {} ({})",
        indent(1),
        settings.hover_effect().as_str(),
        settings.hover_strength_css()
    ));

    let design = &settings.design;
    let design_rows = [
        ("maxWidth", &design.max_width),
        ("maxHeight", &design.max_height),
        ("overlayColor", &design.overlay_color),
        ("overlayOpacity", &design.overlay_opacity),
    ];
    if design_rows.iter().any(|(_, v)| !v.is_empty()) {
        lines.push(String::new());
        lines.push("Design".to_string());
        for (key, value) in design_rows.iter().filter(|(_, v)| !v.is_empty()) {
            lines.push(format!("{}{key}: {value}", indent(1)));
        }
    }

    lines.push(String::new());
    lines.push("Partitions".to_string());
    for partition in PARTITIONS {
        let options = partition.options(&settings);
        let suffix = if options.open_effect == Some(Effect::None) {
            " (open/close disabled)"
        } else {
            ""
        };
        lines.push(format!(
            "{}{partition} → {}{suffix}",
            indent(1),
            options.slide_effect
        ));
    }
    lines
}

pub fn print_settings(settings: &LightboxSettings) {
    for line in format_settings(settings) {
        println!("{line}");
    }
}

// ============================================================================
// Class contract
// ============================================================================

/// Format the class table followed by the overlay skeleton markup.
pub fn format_class_contract() -> Vec<String> {
    let rows = classes::contract();
    let width = rows.iter().map(|(c, _)| c.len()).max().unwrap_or(0);

    let mut lines = vec!["Classes".to_string()];
    for (class, role) in &rows {
        lines.push(format!("{}{class:<width$}  {role}", indent(1)));
    }
    lines.push(String::new());
    lines.push("Overlay markup".to_string());
    lines.push(format!(
        "{}{}",
        indent(1),
        classes::overlay_skeleton(Effect::Zoom).into_string()
    ));
    lines
}

pub fn print_class_contract() {
    for line in format_class_contract() {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HoverSettings;

    #[test]
    fn settings_show_normalized_values() {
        let settings = LightboxSettings {
            default_animation: "default".into(),
            gallery_animation: "wobble".into(),
            hover: HoverSettings {
                effect: "darken".into(),
                strength: 45,
            },
            ..LightboxSettings::default()
        };
        let lines = format_settings(&settings);
        assert!(lines.contains(&"    defaultAnimation: zoom".to_string()));
        assert!(lines.contains(&"    galleryAnimation: slide".to_string()));
        assert!(lines.contains(&"    hover: darken (0.45)".to_string()));
    }

    #[test]
    fn settings_list_every_partition() {
        let lines = format_settings(&LightboxSettings::default());
        let start = lines.iter().position(|l| l == "Partitions").unwrap();
        assert_eq!(
            &lines[start + 1..],
            &[
                "    default → zoom",
                "    fade → fade",
                "    zoom → zoom",
                "    slide → slide",
                "    none → none (open/close disabled)",
            ]
        );
    }

    #[test]
    fn design_section_only_when_set() {
        let lines = format_settings(&LightboxSettings::default());
        assert!(!lines.contains(&"Design".to_string()));

        let mut settings = LightboxSettings::default();
        settings.design.max_width = "90vw".into();
        let lines = format_settings(&settings);
        assert!(lines.contains(&"    maxWidth: 90vw".to_string()));
        assert!(!lines.iter().any(|l| l.contains("maxHeight")));
    }

    #[test]
    fn class_contract_aligns_roles() {
        let lines = format_class_contract();
        assert_eq!(lines[0], "Classes");
        let backdrop = lines
            .iter()
            .find(|l| l.trim_start().starts_with("andw-glightbox-backdrop "))
            .unwrap();
        assert!(backdrop.ends_with("overlay root; clicks on it close the overlay"));
        assert!(lines.iter().any(|l| l.contains("<div class=\"andw-glightbox-stage\">")));
    }
}

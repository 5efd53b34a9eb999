//! CSS class contract between the overlay and the stylesheet.
//!
//! The fallback overlay only ever uses the class names below. Stylesheet
//! authors can rely on them staying stable; `andw-lightbox classes` prints
//! this table together with a skeleton of the overlay markup.
//!
//! ```text
//! body.andw-glightbox-open
//! └── div.andw-glightbox-backdrop.andw-glightbox-effect-{fade|zoom|slide|none}[.is-active]
//!     └── div.andw-glightbox-stage
//!         ├── figure
//!         │   ├── img.andw-glightbox-image[.is-transitioning]
//!         │   └── div.andw-glightbox-caption
//!         │       ├── h2.andw-glightbox-title
//!         │       └── p.andw-glightbox-description
//!         ├── button.andw-glightbox-close > span.andw-glightbox-icon
//!         ├── button.andw-glightbox-prev  > span.andw-glightbox-icon
//!         └── button.andw-glightbox-next  > span.andw-glightbox-icon
//! ```

use crate::viewer::Effect;
use maud::{Markup, html};

/// Marks anchors the server-side rewriter turned into lightbox triggers.
pub const TRIGGER: &str = "glightbox";

pub const BACKDROP: &str = "andw-glightbox-backdrop";
pub const STAGE: &str = "andw-glightbox-stage";
pub const IMAGE: &str = "andw-glightbox-image";
pub const CAPTION: &str = "andw-glightbox-caption";
pub const TITLE: &str = "andw-glightbox-title";
pub const DESCRIPTION: &str = "andw-glightbox-description";
pub const CLOSE: &str = "andw-glightbox-close";
pub const PREV: &str = "andw-glightbox-prev";
pub const NEXT: &str = "andw-glightbox-next";
pub const ICON: &str = "andw-glightbox-icon";

/// Prefix of the per-effect modifier on the backdrop.
pub const EFFECT_PREFIX: &str = "andw-glightbox-effect-";

/// On the backdrop once it has been revealed; removed when closing starts.
pub const ACTIVE: &str = "is-active";
/// On the image while an off-screen preload is in flight.
pub const LOADING: &str = "is-transitioning";
/// On `<body>` while an overlay is open (scroll lock).
pub const BODY_OPEN: &str = "andw-glightbox-open";

/// Modifier class for `effect`, e.g. `andw-glightbox-effect-fade`.
pub fn effect_class(effect: Effect) -> String {
    format!("{EFFECT_PREFIX}{}", effect.as_str())
}

/// Every class the overlay can emit, with the element it lands on.
pub fn contract() -> Vec<(String, &'static str)> {
    let mut rows: Vec<(String, &'static str)> = vec![
        (BODY_OPEN.into(), "body, while an overlay is open"),
        (BACKDROP.into(), "overlay root; clicks on it close the overlay"),
        (ACTIVE.into(), "backdrop, after mount until close starts"),
    ];
    for effect in Effect::ALL {
        rows.push((effect_class(effect), "backdrop, transition of the current slide"));
    }
    rows.extend([
        (STAGE.into(), "content container"),
        (IMAGE.into(), "displayed image"),
        (LOADING.into(), "image, while the next source is preloading"),
        (CAPTION.into(), "caption wrapper"),
        (TITLE.into(), "caption title (hidden when empty)"),
        (DESCRIPTION.into(), "caption body (hidden when empty)"),
        (CLOSE.into(), "close control, aria-label=\"Close\""),
        (PREV.into(), "previous control, aria-label=\"Previous\""),
        (NEXT.into(), "next control, aria-label=\"Next\""),
        (ICON.into(), "glyph inside each control"),
    ]);
    rows
}

/// Static markup equivalent of a freshly mounted overlay, for stylesheet
/// authors. The live overlay is built node by node in the document model.
pub fn overlay_skeleton(effect: Effect) -> Markup {
    let backdrop = format!("{BACKDROP} {} {ACTIVE}", effect_class(effect));
    html! {
        div class=(backdrop) {
            div class=(STAGE) {
                figure {
                    img class=(IMAGE) src="" alt="";
                    div class=(CAPTION) {
                        h2 class=(TITLE) {}
                        p class=(DESCRIPTION) {}
                    }
                }
                button type="button" class=(CLOSE) aria-label="Close" {
                    span class=(ICON) { "×" }
                }
                button type="button" class=(PREV) aria-label="Previous" {
                    span class=(ICON) { "‹" }
                }
                button type="button" class=(NEXT) aria-label="Next" {
                    span class=(ICON) { "›" }
                }
            }
        }
    }
}

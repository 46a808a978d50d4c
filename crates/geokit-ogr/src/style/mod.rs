//! Style codec
//!
//! Parses feature style strings into typed symbol attributes and writes
//! symbols back as style strings.

pub mod decode;
pub mod encode;
pub mod tool;

pub use decode::{
    anchor_alignment, apply_pen, clean_label_text, field_reference, symbol_rotation_deg,
    LabelPlacement,
};
pub use encode::{substitute_label, StyleEncoder, LABEL_PLACEHOLDER};
pub use tool::{get_rgb_from_string, StyleParam, StyleTool, StyleToolKind};

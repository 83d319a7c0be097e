//! Color and styling helpers for CLI output.
//!
//! Semantic color theme:
//!   - Success/Active:  green   (Active status, completed actions)
//!   - Transitional:    yellow  (In Maintenance, Provisioning)
//!   - Ended:           red     (Retired, Decommissioned)
//!   - Reference:       cyan    (CI and relationship ids)
//!   - Accent:          magenta (relationship types)
//!   - Muted:           dimmed  (field labels, placeholders)

use crate::domain::{CiStatus, RelationshipType};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Color a status label by lifecycle phase. Unknown labels are left plain.
pub(crate) fn colorize_status(status: &CiStatus, config: &OutputConfig) -> String {
    let text = status.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match text {
        "Active" => text.green().to_string(),
        "In Maintenance" | "Provisioning" => text.yellow().to_string(),
        "Retired" | "Decommissioned" => text.red().to_string(),
        _ => text.to_string(),
    }
}

/// Colorize an id (cyan), prefixed with `#`.
pub(crate) fn colorize_id(id: impl std::fmt::Display, config: &OutputConfig) -> String {
    let text = format!("#{id}");
    if !config.use_colors {
        return text;
    }
    text.cyan().to_string()
}

/// Colorize a relationship type (magenta).
pub(crate) fn colorize_kind(kind: RelationshipType, config: &OutputConfig) -> String {
    if !config.use_colors {
        return kind.to_string();
    }
    kind.as_str().magenta().to_string()
}

/// Bold text.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Dimmed text.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Arrow for edge direction, with ASCII fallback.
pub(crate) fn arrow(config: &OutputConfig) -> String {
    let icon = if config.use_ascii { "->" } else { "→" };
    dimmed(icon, config)
}

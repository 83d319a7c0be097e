//! Output formatting for CLI commands.
//!
//! Every printer comes in two flavours: human-readable text (colored,
//! wrapped to the terminal) and JSON for programmatic use. Text printers
//! write to any `io::Write` so they can be tested against a buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers

pub mod color;

use crate::domain::{
    CiView, ConfigurationItem, Counts, DeletedCi, Direction, KNOWN_CI_TYPES, KNOWN_STATUSES,
    RelationshipType, RelationshipView, TraversalStep,
};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{arrow, bold, colorize_id, colorize_kind, colorize_status, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only symbols instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `CMDB_MAX_WIDTH`: Maximum content width (default: 100)
    /// - `CMDB_ASCII`: "1" or "true" for ASCII-only symbols
    /// - `NO_COLOR`: any value disables colors
    /// - `CMDB_COLOR`: "0" or "false" disables colors
    pub fn from_env() -> Self {
        let max_width = match env::var("CMDB_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "CMDB_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = env::var("CMDB_ASCII")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("CMDB_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    fn content_width(&self) -> usize {
        get_terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| usize::from(w.0))
        .unwrap_or(usize::from(DEFAULT_TERMINAL_WIDTH))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

fn dispatch<T, F>(value: &T, mode: OutputMode, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'_>, &OutputConfig) -> io::Result<()>,
{
    match mode {
        OutputMode::Json => print_json(value),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            text(&mut handle, &OutputConfig::from_env())
        }
    }
}

/// Print a single CI with all of its fields.
pub fn print_ci(ci: &ConfigurationItem, mode: OutputMode) -> io::Result<()> {
    dispatch(ci, mode, |w, config| write_ci_details(w, ci, config))
}

/// Print a list of CIs.
pub fn print_cis(cis: &[ConfigurationItem], mode: OutputMode) -> io::Result<()> {
    dispatch(cis, mode, |w, config| write_ci_list(w, cis, config))
}

/// Print a CI with its outbound and inbound relationships.
pub fn print_ci_view(view: &CiView, mode: OutputMode) -> io::Result<()> {
    dispatch(view, mode, |w, config| write_ci_view(w, view, config))
}

/// Print the outcome of a cascading delete.
pub fn print_deleted_ci(deleted: &DeletedCi, mode: OutputMode) -> io::Result<()> {
    dispatch(deleted, mode, |w, config| {
        writeln!(
            w,
            "{} CI {} '{}' and {} relationship(s)",
            success("Deleted", config),
            colorize_id(deleted.ci.id, config),
            deleted.ci.name,
            deleted.relationships.len()
        )
    })
}

/// Print one relationship.
pub fn print_relationship(rel: &RelationshipView, mode: OutputMode) -> io::Result<()> {
    dispatch(rel, mode, |w, config| write_relationship_line(w, rel, config))
}

/// Print the relationships of a CI in one direction.
pub fn print_relationships(
    rels: &[RelationshipView],
    direction: Direction,
    mode: OutputMode,
) -> io::Result<()> {
    dispatch(rels, mode, |w, config| {
        write_relationship_list(w, rels, direction, config)
    })
}

/// Print a traversal from `root`.
pub fn print_traversal(
    root: &ConfigurationItem,
    steps: &[TraversalStep],
    direction: Direction,
    mode: OutputMode,
) -> io::Result<()> {
    dispatch(steps, mode, |w, config| {
        write_traversal(w, root, steps, direction, config)
    })
}

/// Print collection sizes.
pub fn print_counts(counts: &Counts, mode: OutputMode) -> io::Result<()> {
    dispatch(counts, mode, |w, config| {
        writeln!(w, "{}", bold("CMDB Summary", config))?;
        writeln!(w, "{} {}", dimmed("Configuration items:", config), counts.cis)?;
        writeln!(w, "{} {}", dimmed("Relationships:      ", config), counts.relationships)
    })
}

/// The label catalogues offered to users.
#[derive(Debug, Serialize)]
pub struct Labels {
    /// Suggested CI types
    pub ci_types: Vec<&'static str>,
    /// Suggested statuses
    pub statuses: Vec<&'static str>,
    /// Every allowed relationship type
    pub relationship_types: Vec<&'static str>,
}

impl Labels {
    /// Collect the catalogues from the domain constants.
    #[must_use]
    pub fn catalogue() -> Self {
        Self {
            ci_types: KNOWN_CI_TYPES.to_vec(),
            statuses: KNOWN_STATUSES.to_vec(),
            relationship_types: RelationshipType::ALL.iter().map(|k| k.as_str()).collect(),
        }
    }
}

/// Print the label catalogues.
pub fn print_labels(mode: OutputMode) -> io::Result<()> {
    let labels = Labels::catalogue();
    dispatch(&labels, mode, |w, config| {
        for (title, values) in [
            ("CI types", &labels.ci_types),
            ("Statuses", &labels.statuses),
            ("Relationship types", &labels.relationship_types),
        ] {
            writeln!(w, "{}:", bold(title, config))?;
            for value in values {
                writeln!(w, "  {value}")?;
            }
        }
        Ok(())
    })
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_ci_details<W: Write>(
    w: &mut W,
    ci: &ConfigurationItem,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{} {}", colorize_id(ci.id, config), bold(&ci.name, config))?;
    writeln!(
        w,
        "{} {}{}    {} {}{}",
        dimmed("Type:", config),
        ci.ci_type,
        custom_marker(ci.ci_type.is_known(), config),
        dimmed("Status:", config),
        colorize_status(&ci.status, config),
        custom_marker(ci.status.is_known(), config)
    )?;

    let placeholder = dimmed("-", config);
    writeln!(
        w,
        "{} {}",
        dimmed("Owner:", config),
        ci.owner.as_deref().unwrap_or(&placeholder)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Location:", config),
        ci.location.as_deref().unwrap_or(&placeholder)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Updated:", config),
        ci.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    if let Some(description) = ci.description.as_deref().filter(|d| !d.trim().is_empty()) {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Description", config))?;
        for line in wrap_text(description, config.content_width().saturating_sub(2)) {
            writeln!(w, "  {line}")?;
        }
    }
    Ok(())
}

/// Suffix for labels outside the built-in catalogue.
fn custom_marker(known: bool, config: &OutputConfig) -> String {
    if known {
        String::new()
    } else {
        format!(" {}", dimmed("(custom)", config))
    }
}

fn write_ci_list<W: Write>(
    w: &mut W,
    cis: &[ConfigurationItem],
    config: &OutputConfig,
) -> io::Result<()> {
    if cis.is_empty() {
        return writeln!(w, "No configuration items found.");
    }

    writeln!(w, "Found {} configuration item(s):", cis.len())?;
    writeln!(w)?;

    let name_width = cis.iter().map(|ci| ci.name.chars().count()).max().unwrap_or(0);
    for ci in cis {
        writeln!(
            w,
            "{}  {:<name_width$}  {}  {}",
            colorize_id(ci.id, config),
            ci.name,
            ci.ci_type,
            colorize_status(&ci.status, config),
        )?;
    }
    Ok(())
}

fn write_relationship_line<W: Write>(
    w: &mut W,
    rel: &RelationshipView,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {} {} {}",
        colorize_id(rel.id, config),
        rel.source_name,
        arrow(config),
        colorize_kind(rel.relationship_type, config),
        arrow(config),
        rel.target_name
    )
}

fn write_relationship_list<W: Write>(
    w: &mut W,
    rels: &[RelationshipView],
    direction: Direction,
    config: &OutputConfig,
) -> io::Result<()> {
    if rels.is_empty() {
        return writeln!(w, "No relationships found ({direction}).");
    }
    writeln!(w, "{} relationship(s) ({direction}):", rels.len())?;
    for rel in rels {
        write!(w, "  ")?;
        write_relationship_line(w, rel, config)?;
    }
    Ok(())
}

fn write_ci_view<W: Write>(w: &mut W, view: &CiView, config: &OutputConfig) -> io::Result<()> {
    write_ci_details(w, &view.ci, config)?;

    for (title, rels) in [("Outbound", &view.outbound), ("Inbound", &view.inbound)] {
        writeln!(w)?;
        writeln!(w, "{} ({}):", bold(title, config), rels.len())?;
        for rel in rels {
            write!(w, "  ")?;
            write_relationship_line(w, rel, config)?;
        }
    }
    Ok(())
}

fn write_traversal<W: Write>(
    w: &mut W,
    root: &ConfigurationItem,
    steps: &[TraversalStep],
    direction: Direction,
    config: &OutputConfig,
) -> io::Result<()> {
    let heading = match direction {
        Direction::Target => "Impacted by",
        Direction::Source => "Dependencies of",
        Direction::All => "Connected to",
    };
    writeln!(
        w,
        "{} {} {}",
        bold(heading, config),
        colorize_id(root.id, config),
        root.name
    )?;

    if steps.is_empty() {
        return writeln!(w, "  (nothing)");
    }

    for step in steps {
        write!(w, "{}", "  ".repeat(step.depth))?;
        write_relationship_line(w, &step.relationship, config)?;
    }
    Ok(())
}

/// Wrap text preserving paragraph breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(20))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiId, CiStatus, CiType, RelationshipId};
    use chrono::{TimeZone, Utc};

    fn plain() -> OutputConfig {
        OutputConfig::new(80, true, false)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn db() -> ConfigurationItem {
        ConfigurationItem {
            id: CiId(3),
            name: "CustomerDB-Prod-01".to_string(),
            ci_type: CiType::new("Database"),
            status: CiStatus::new("Active"),
            owner: Some("DBA Team".to_string()),
            location: None,
            description: Some("Primary customer database".to_string()),
            last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    fn edge() -> RelationshipView {
        RelationshipView {
            id: RelationshipId(9),
            source_id: CiId(1),
            source_name: "BillingApp-Prod".to_string(),
            target_id: CiId(3),
            target_name: "CustomerDB-Prod-01".to_string(),
            relationship_type: RelationshipType::DependsOn,
        }
    }

    #[test]
    fn test_ci_details_text() {
        let out = render(|w| write_ci_details(w, &db(), &plain()));
        assert!(out.starts_with("#3 CustomerDB-Prod-01\n"));
        assert!(out.contains("Type: Database    Status: Active"));
        assert!(out.contains("Owner: DBA Team"));
        assert!(out.contains("Location: -"));
        assert!(out.contains("Updated: 2024-05-01 12:30:00 UTC"));
        assert!(out.contains("  Primary customer database"));
    }

    #[test]
    fn test_ci_details_marks_custom_labels() {
        let mut ci = db();
        ci.ci_type = CiType::new("Mainframe");
        let out = render(|w| write_ci_details(w, &ci, &plain()));
        assert!(out.contains("Type: Mainframe (custom)    Status: Active\n"));

        ci.status = CiStatus::new("Mothballed");
        let out = render(|w| write_ci_details(w, &ci, &plain()));
        assert!(out.contains("Status: Mothballed (custom)"));
    }

    #[test]
    fn test_empty_list_message() {
        let out = render(|w| write_ci_list(w, &[], &plain()));
        assert_eq!(out, "No configuration items found.\n");
    }

    #[test]
    fn test_relationship_line() {
        let out = render(|w| write_relationship_line(w, &edge(), &plain()));
        assert_eq!(out, "#9 BillingApp-Prod -> Depends on -> CustomerDB-Prod-01\n");
    }

    #[test]
    fn test_view_lists_both_directions() {
        let view = CiView {
            ci: db(),
            outbound: vec![],
            inbound: vec![edge()],
        };
        let out = render(|w| write_ci_view(w, &view, &plain()));
        assert!(out.contains("Outbound (0):"));
        assert!(out.contains("Inbound (1):\n  #9 BillingApp-Prod"));
    }

    #[test]
    fn test_traversal_indents_by_depth() {
        let steps = vec![
            TraversalStep {
                relationship: edge(),
                depth: 1,
            },
            TraversalStep {
                relationship: edge(),
                depth: 2,
            },
        ];
        let out = render(|w| write_traversal(w, &db(), &steps, Direction::Target, &plain()));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Impacted by #3 CustomerDB-Prod-01");
        assert!(lines[1].starts_with("  #9"));
        assert!(lines[2].starts_with("    #9"));
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        let lines = wrap_text("first paragraph\n\nsecond", 40);
        assert_eq!(lines, ["first paragraph", "", "second"]);
    }

    #[test]
    fn test_labels_catalogue() {
        let labels = Labels::catalogue();
        assert_eq!(labels.ci_types.len(), 8);
        assert_eq!(labels.statuses.len(), 5);
        assert!(labels.relationship_types.contains(&"Connected to"));
    }
}

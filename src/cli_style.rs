/*!
 * jujuctl CLI Style System
 *
 * Themed text and comfy-table builders for human-readable output.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};
use jujulib_connect::{DestroyResult, ModelListing, ModelSummary};
use jujulib_wire::FacadeTable;

// ============================================================================
// THEME COLORS
// ============================================================================

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    /// Success color (green)
    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    /// Warning color (yellow)
    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    /// Error color (red)
    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }
}

// ============================================================================
// ICONS
// ============================================================================

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const ARROW_RIGHT: &'static str = "→";
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_row(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| {
            Cell::new(title)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn life_cell(model: &ModelSummary) -> Cell {
    if model.is_alive {
        Cell::new(&model.life).fg(Color::Green)
    } else {
        Cell::new(&model.life).fg(Color::DarkGrey)
    }
}

/// Detailed model table, one row per summary. Failed lookups show the error.
pub fn models_table(models: &[ModelSummary]) -> Table {
    let mut table = create_table();
    table.set_header(header_row(&[
        "Model", "Owner", "Life", "Provider", "Series", "Last Connection", "UUID",
    ]));

    for model in models {
        if let Some(err) = &model.err {
            table.add_row(vec![
                Cell::new(model.tag.to_string()),
                Cell::new(format!("{} {}", Icons::ERROR, err)).fg(Color::Red),
            ]);
            continue;
        }

        let name = if model.is_admin {
            Cell::new(format!("{} (controller)", model.name)).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&model.name)
        };

        table.add_row(vec![
            name,
            Cell::new(&model.owner),
            life_cell(model),
            Cell::new(&model.provider),
            Cell::new(&model.series),
            Cell::new(model.last_connection.as_deref().unwrap_or("never")),
            Cell::new(&model.uuid).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Plain model list as returned by `ListModels`
pub fn listings_table(listings: &[ModelListing]) -> Table {
    let mut table = create_table();
    table.set_header(header_row(&["Model", "Owner", "Last Connection", "UUID"]));

    for listing in listings {
        table.add_row(vec![
            Cell::new(&listing.name),
            Cell::new(&listing.owner),
            Cell::new(listing.last_connection.as_deref().unwrap_or("never")),
            Cell::new(&listing.uuid).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Facades offered by the controller and their versions
pub fn facades_table(facades: &FacadeTable) -> Table {
    let mut table = create_table();
    table.set_header(header_row(&["Facade", "Versions"]));

    for (name, versions) in facades.iter() {
        let versions = versions
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![Cell::new(name), Cell::new(versions)]);
    }

    table
}

/// Per-model outcome of a destroy request
pub fn destroy_table(results: &[DestroyResult]) -> Table {
    let mut table = create_table();
    table.set_header(header_row(&["Model", "Result"]));

    for result in results {
        let outcome = match &result.error {
            None => Cell::new(format!("{} destroying", Icons::SUCCESS)).fg(Color::Green),
            Some(err) => Cell::new(format!("{} {}", Icons::ERROR, err)).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(result.tag.to_string()), outcome]);
    }

    table
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

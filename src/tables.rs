use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::summary::SessionSummary,
    quantity::{cost::Cost, energy::KilowattHours},
};

const TIMESTAMP_FORMAT: &str = "%d-%m %H:%M";

#[must_use]
pub fn build_summary_table(summaries: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec![
        "Session",
        "Buckets",
        "Start",
        "End",
        "Duration",
        "Mean power",
        "Energy",
        "Cost",
    ]);

    let mut total_energy = KilowattHours::ZERO;
    let mut total_cost = Cost::ZERO;

    for summary in summaries {
        let Some(totals) = summary.totals else {
            table.add_row(vec![
                Cell::new(summary.session_id),
                Cell::new(summary.n_buckets).add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
                Cell::new("n/a").add_attribute(Attribute::Dim),
            ]);
            continue;
        };
        total_energy += totals.energy;
        total_cost += totals.cost;

        table.add_row(vec![
            Cell::new(summary.session_id),
            Cell::new(summary.n_buckets).set_alignment(CellAlignment::Right),
            Cell::new(totals.start.format(TIMESTAMP_FORMAT)),
            Cell::new(totals.end.format(TIMESTAMP_FORMAT)).add_attribute(Attribute::Dim),
            Cell::new(format!("{:.2} h", totals.duration_hours()))
                .set_alignment(CellAlignment::Right),
            Cell::new(totals.mean_power).set_alignment(CellAlignment::Right),
            Cell::new(totals.energy).set_alignment(CellAlignment::Right),
            Cell::new(totals.cost).set_alignment(CellAlignment::Right).fg(Color::Yellow),
        ]);
    }

    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(total_energy).set_alignment(CellAlignment::Right).add_attribute(Attribute::Bold),
        Cell::new(total_cost).set_alignment(CellAlignment::Right).add_attribute(Attribute::Bold),
    ]);
    table
}

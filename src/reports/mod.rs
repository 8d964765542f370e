use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use schedforge::config::PenaltyWeights;
use schedforge::model::{Assignment, ProblemContext, SlotKind};
use schedforge::optimizer::OptimizationResult;
use schedforge::rules::hard::Violation;
use schedforge::rules::FitnessBreakdown;

/// One row per slot, listing the classes placed in it.
pub fn print_schedule(title: &str, ctx: &ProblemContext, assignment: &Assignment) {
    println!("\nSchedule: {}", title);
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Slot").add_attribute(Attribute::Bold),
        Cell::new("Kind"),
        Cell::new("Fill"),
        Cell::new("Classes"),
    ]);
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (i, slot) in ctx.slots().iter().enumerate() {
        let placed: Vec<String> = assignment
            .assigned()
            .filter(|&(_, s)| s.index() == i)
            .map(|(c, _)| ctx.class(c).to_string())
            .collect();
        if placed.is_empty() && slot.min == 0 {
            continue;
        }

        let fill = format!("{}/{}", placed.len(), slot.max);
        let fill_cell = if placed.len() < slot.min {
            Cell::new(fill).fg(Color::Yellow)
        } else {
            Cell::new(fill)
        };
        let kind_cell = match slot.kind {
            SlotKind::Course => Cell::new(slot.kind),
            SlotKind::Lab => Cell::new(slot.kind).fg(Color::Cyan),
        };

        table.add_row(vec![
            Cell::new(slot.label()).add_attribute(Attribute::Bold),
            kind_cell,
            fill_cell,
            Cell::new(placed.join("\n")),
        ]);
    }

    let unassigned: Vec<String> = (0..assignment.len())
        .filter(|&c| assignment.get(c).is_none())
        .map(|c| ctx.class(c).to_string())
        .collect();
    if !unassigned.is_empty() {
        table.add_row(vec![
            Cell::new("(unassigned)").fg(Color::Red),
            Cell::new(""),
            Cell::new(unassigned.len()),
            Cell::new(unassigned.join("\n")).fg(Color::Red),
        ]);
    }

    println!("{}", table);
}

pub fn print_fitness(breakdown: &FitnessBreakdown, w: &PenaltyWeights) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Category").add_attribute(Attribute::Bold),
        Cell::new("Raw"),
        Cell::new("Weight"),
        Cell::new("Weighted").fg(Color::Cyan),
    ]);
    for i in 1..=3 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    let rows = [
        ("Min filled", breakdown.min_filled, w.w_min_filled),
        ("Preference", breakdown.pref, w.w_pref),
        ("Pair", breakdown.pair, w.w_pair),
        ("Section diff", breakdown.sec_diff, w.w_sec_diff),
    ];
    for (name, raw, weight) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(raw),
            Cell::new(weight),
            Cell::new(raw.saturating_mul(weight)).fg(Color::Cyan),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(breakdown.total).add_attribute(Attribute::Bold),
    ]);

    println!("\n{}", table);
}

pub fn print_violations(ctx: &ProblemContext, violations: &[Violation]) {
    if violations.is_empty() {
        println!("\nAll hard constraints satisfied.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Hard constraint violation").fg(Color::Red),
    ]);
    for (i, v) in violations.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(v.describe(ctx))]);
    }
    println!("\n{}", table);
}

pub fn print_run_summary(result: &OptimizationResult) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let s = &result.search_stats;
    let rows: [(&str, String); 8] = [
        ("Stop reason", result.stop_reason.to_string()),
        ("Generations", result.generations.to_string()),
        ("Population", result.population.len().to_string()),
        ("Best fitness", result.best_fitness.to_string()),
        ("Expansions", s.expansions.to_string()),
        ("Dead ends", s.dead_ends.to_string()),
        ("Frontier restarts", s.restarts.to_string()),
        ("Peak frontier", s.peak_frontier.to_string()),
    ];
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k).add_attribute(Attribute::Bold), Cell::new(v)]);
    }
    println!("\n{}", table);
}

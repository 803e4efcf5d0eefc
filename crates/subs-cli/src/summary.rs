use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use std::sync::Arc;

use subs_cli::validation::FileReport;
use subs_model::{GroupScope, SubsItem};
use subs_persistence::SubscriptionMap;
use subs_resolve::{RuleSummary, subscription_counts};
use subs_updater::UpdateReport;

pub fn print_subscriptions(items: &[SubsItem], documents: &SubscriptionMap, summary: &RuleSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Version"),
        header_cell("Enabled"),
        header_cell("Updates"),
        header_cell("Apps"),
        header_cell("Groups"),
        header_cell("Rules"),
        header_cell("Slow"),
    ]);
    apply_table_style(&mut table);
    for index in [0, 2, 5, 6, 7, 8] {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for item in items {
        let counts = subscription_counts(summary, item.id);
        let (name, version) = match documents.get(&item.id) {
            Some(document) => (Cell::new(&document.name), Cell::new(document.version)),
            None => (Cell::new("missing document").fg(Color::Red), dim_cell("-")),
        };
        table.add_row(vec![
            Cell::new(item.id),
            name,
            version,
            flag_cell(item.enable),
            flag_cell(item.enable_update && item.update_url.is_some()),
            Cell::new(counts.apps),
            Cell::new(counts.global_groups + counts.app_groups),
            Cell::new(counts.rules()),
            count_cell(counts.slow_groups, Color::Yellow),
        ]);
    }
    println!("{table}");
    println!("Active: {}", summary.num_text());
}

pub fn print_app_rules(summary: &RuleSummary, app_id: &str) {
    let all_groups = summary.app_all_groups(app_id);
    if all_groups.is_empty() {
        println!("No groups apply to {app_id}.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Subscription"),
        header_cell("Group"),
        header_cell("Enabled"),
        header_cell("Rule"),
        header_cell("Selectors"),
        header_cell("Slow"),
    ]);
    apply_table_style(&mut table);

    let rules = summary.app_rules(app_id);
    for group in all_groups {
        let group_rules: Vec<_> = rules
            .iter()
            .filter(|rule| Arc::ptr_eq(&rule.group, group))
            .collect();
        let group_label = format!("{} ({})", group.group().name, group.group().key);
        if group_rules.is_empty() {
            table.add_row(vec![
                Cell::new(group.subs_id()),
                Cell::new(group_label),
                flag_cell(group.enable),
                dim_cell("-"),
                dim_cell("no active rules"),
                dim_cell("-"),
            ]);
            continue;
        }
        for rule in group_rules {
            table.add_row(vec![
                Cell::new(group.subs_id()),
                Cell::new(&group_label),
                flag_cell(group.enable),
                Cell::new(rule.index()),
                Cell::new(rule.rule().matches.join("\n")),
                flag_cell(rule.is_slow()),
            ]);
        }
    }
    println!("{table}");
}

pub fn print_update_report(report: &UpdateReport) {
    if report.checked() == 0 {
        println!("No subscriptions to check.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Result"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    for (id, version) in &report.updated {
        table.add_row(vec![
            Cell::new(id),
            Cell::new("updated").fg(Color::Green),
            Cell::new(format!("version {version}")),
        ]);
    }
    for id in &report.skipped {
        table.add_row(vec![
            Cell::new(id),
            dim_cell("current"),
            dim_cell("-"),
        ]);
    }
    for (id, error) in &report.failed {
        table.add_row(vec![
            Cell::new(id),
            Cell::new("failed")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            Cell::new(error.user_message()),
        ]);
    }
    println!("{table}");
}

pub fn print_validation(reports: &[FileReport]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Id"),
        header_cell("Version"),
        header_cell("Groups"),
        header_cell("Rules"),
        header_cell("Problems"),
    ]);
    apply_table_style(&mut table);
    for report in reports {
        let problems = if report.is_valid() {
            Cell::new("ok").fg(Color::Green)
        } else {
            let lines: Vec<String> = report
                .issues
                .iter()
                .map(|issue| {
                    let scope = match &issue.scope {
                        GroupScope::Global => "global".to_string(),
                        GroupScope::App(app_id) => app_id.clone(),
                    };
                    format!("{scope} group {} ({}): {}", issue.key, issue.name, issue.problem)
                })
                .collect();
            Cell::new(lines.join("\n")).fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(report.path.display()),
            Cell::new(report.id),
            Cell::new(report.version),
            Cell::new(report.groups),
            Cell::new(report.rules),
            problems,
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

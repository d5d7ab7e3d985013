use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use owo_colors::OwoColorize;
use tend_core::models::{
    CalendarDay, DueWindows, ItemDetail, ItemKind, OwnedItem, RecurrenceRule, ScheduledTask, Site,
};
use tend_core::timezone::{format_with_timezone, local_date};

use crate::util::short_id;

const DATE_TIME: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct ViewRule {
    pub rule: RecurrenceRule,
    pub item_label: String,
    /// Due date of the rule's open occurrence
    pub next_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ViewItem {
    pub item: OwnedItem,
    /// Name of the plant's site
    pub site: Option<String>,
    pub age: Option<u32>,
}

pub fn display_items(items: &[ViewItem], tz: &Tz) {
    if items.is_empty() {
        println!("No plants or pets yet. Add one with `tend item add`.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Kind", "Name", "Species", "Site", "Age", "Added"]);

    for view in items {
        let item = &view.item;
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&item.id)));
        row.add_cell(kind_cell(item.kind));
        row.add_cell(Cell::new(item.label()).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(item.species.as_deref().unwrap_or("")));
        row.add_cell(Cell::new(view.site.as_deref().unwrap_or("")));
        row.add_cell(Cell::new(view.age.map(age_label).unwrap_or_default()));
        row.add_cell(Cell::new(format_with_timezone(item.added_at, tz, "%Y-%m-%d")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_sites(sites: &[(Site, usize)]) {
    if sites.is_empty() {
        println!("No sites yet. Add one with `tend site add`.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Light", "Location", "Plants"]);

    for (site, plants) in sites {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&site.id)));
        row.add_cell(Cell::new(&site.name).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(site.light.to_string()));
        row.add_cell(Cell::new(site.location.to_string()));
        row.add_cell(Cell::new(plants));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_item_detail(detail: &ItemDetail, tz: &Tz, now: DateTime<Utc>) {
    let item = &detail.item;
    println!("{} {}", item.label().bold(), format!("({})", item.kind).dimmed());
    println!("  ID:      {}", item.id);
    if let Some(species) = &item.species {
        println!("  Species: {}", species);
    }
    if let Some(site) = &detail.site {
        println!("  Site:    {} ({}, {} light)", site.name, site.location, site.light);
    }
    if let Some(born) = item.birth_date {
        let age = item
            .age_on(local_date(now, tz))
            .map(|age| format!(", {}", age_label(age)))
            .unwrap_or_default();
        println!("  Born:    {}{}", born.format("%Y-%m-%d"), age);
    }
    println!("  Added:   {}", format_with_timezone(item.added_at, tz, DATE_TIME));
    println!();

    let rules: Vec<ViewRule> = detail
        .rules
        .iter()
        .map(|rule| ViewRule {
            rule: rule.clone(),
            item_label: item.label(),
            next_due: detail
                .occurrences
                .iter()
                .find(|o| o.rule_id == rule.id && o.is_open())
                .map(|o| o.due_date),
        })
        .collect();
    display_rules(&rules, tz, now);

    let completed = detail.occurrences.iter().filter(|o| o.is_completed).count();
    if completed > 0 {
        println!("{} care task(s) completed so far.", completed);
    }
}

pub fn display_rules(rules: &[ViewRule], tz: &Tz, now: DateTime<Utc>) {
    if rules.is_empty() {
        println!("No care tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Item", "Task", "Every", "Last Done", "Next Due"]);

    for view in rules {
        let rule = &view.rule;
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&rule.id)));
        row.add_cell(Cell::new(&view.item_label));
        row.add_cell(Cell::new(task_label(&rule.kind.to_string(), rule.description.as_deref())));
        row.add_cell(Cell::new(rule.cadence().to_string()));
        row.add_cell(Cell::new(
            rule.last_completed_at
                .map(|at| format_with_timezone(at, tz, DATE_TIME))
                .unwrap_or_else(|| "never".to_string()),
        ));
        row.add_cell(match view.next_due {
            Some(due) => due_cell(due, now, tz),
            None => Cell::new(""),
        });
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_due(windows: &DueWindows, tz: &Tz, now: DateTime<Utc>) {
    if windows.is_empty() {
        println!("Nothing to do. Everything is cared for.");
        return;
    }

    let sections = [
        ("Overdue", &windows.overdue, Color::Red),
        ("Due today", &windows.due_today, Color::Yellow),
        ("Upcoming", &windows.upcoming, Color::Reset),
    ];

    for (title, tasks, color) in sections {
        if tasks.is_empty() {
            continue;
        }
        println!("{} ({})", title.bold(), tasks.len());

        let mut table = Table::new();
        table.set_header(vec!["ID", "Item", "Task", "Every", "Due"]);
        for task in tasks.iter() {
            let mut row = Row::new();
            row.add_cell(Cell::new(short_id(&task.id)));
            row.add_cell(Cell::new(task.item_label()));
            row.add_cell(Cell::new(task_label(&task.kind.to_string(), task.description.as_deref())).fg(color));
            row.add_cell(Cell::new(task.cadence().to_string()));
            row.add_cell(due_cell(task.due_date, now, tz));
            table.add_row(row);
        }
        println!("{table}");
    }
}

pub fn display_calendar(days: &[CalendarDay], tz: &Tz) {
    if days.iter().all(|day| day.tasks.is_empty()) {
        println!("No upcoming care tasks in the next {} day(s).", days.len());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Time", "Item", "Task", "ID"]);

    for day in days.iter().filter(|day| !day.tasks.is_empty()) {
        for (i, task) in day.tasks.iter().enumerate() {
            let date = if i == 0 {
                Cell::new(day.date.format("%a %Y-%m-%d")).add_attribute(Attribute::Bold)
            } else {
                Cell::new("")
            };
            let mut row = Row::new();
            row.add_cell(date);
            row.add_cell(Cell::new(format_with_timezone(task.due_date, tz, "%H:%M")));
            row.add_cell(Cell::new(task.item_label()));
            row.add_cell(Cell::new(task_label(&task.kind.to_string(), task.description.as_deref())));
            row.add_cell(Cell::new(short_id(&task.id)).fg(Color::DarkGrey));
            table.add_row(row);
        }
    }

    println!("{table}");
}

pub fn display_history(tasks: &[ScheduledTask], tz: &Tz) {
    if tasks.is_empty() {
        println!("No completed tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Completed", "Item", "Task", "Was Due"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(
            task.completed_at
                .map(|at| format_with_timezone(at, tz, DATE_TIME))
                .unwrap_or_default(),
        ).fg(Color::Green));
        row.add_cell(Cell::new(task.item_label()));
        row.add_cell(Cell::new(task_label(&task.kind.to_string(), task.description.as_deref())));
        row.add_cell(Cell::new(format_with_timezone(task.due_date, tz, DATE_TIME)).fg(Color::DarkGrey));
        table.add_row(row);
    }

    println!("{table}");
}

fn kind_cell(kind: ItemKind) -> Cell {
    match kind {
        ItemKind::Plant => Cell::new("plant").fg(Color::Green),
        ItemKind::Pet => Cell::new("pet").fg(Color::Cyan),
    }
}

fn age_label(years: u32) -> String {
    match years {
        1 => "1 year".to_string(),
        n => format!("{} years", n),
    }
}

fn task_label(kind: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{} ({})", kind, description),
        None => kind.to_string(),
    }
}

fn due_cell(due: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> Cell {
    let local = format_with_timezone(due, tz, DATE_TIME);
    let text = format!("{} ({})", local, due.humanize());
    let today = local_date(now, tz);
    let due_day = local_date(due, tz);

    if due_day < today {
        Cell::new(text).fg(Color::Red)
    } else if due_day == today {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text)
    }
}

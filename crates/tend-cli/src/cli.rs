use clap::{Parser, Subcommand};
use tend_core::models::{CareKind, ItemKind, LightLevel, SiteLocation};

/// Tend: care reminders for your plants and pets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Act as this user instead of the configured one
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage your plants and pets
    Item(ItemCommand),
    /// Manage the places where your plants live
    Site(SiteCommand),
    /// Manage recurring care tasks
    Task(TaskCommand),
    /// Mark a due task as done and schedule the next one
    Do(DoCommand),
    /// Show overdue, due-today and upcoming tasks
    Due(DueCommand),
    /// Show upcoming tasks day by day
    Calendar(CalendarCommand),
    /// Show completed tasks
    History(HistoryCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ItemSubcommand {
    /// Register a plant or pet
    Add(AddItemCommand),
    /// List your plants and pets
    List(JsonFlag),
    /// Show an item with its tasks and schedule
    Show(ShowItemCommand),
    /// Rename an item, move a plant or record a pet's birth date
    Edit(EditItemCommand),
    /// Remove an item and all of its tasks
    Remove(RemoveCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddItemCommand {
    /// plant or pet
    pub kind: ItemKind,
    /// A name to recognise it by
    pub nickname: Option<String>,
    /// Species or breed
    #[arg(short, long)]
    pub species: Option<String>,
    /// Site where the plant lives (ID or unique prefix)
    #[arg(long)]
    pub site: Option<String>,
    /// A pet's birth date (YYYY-MM-DD)
    #[arg(long)]
    pub born: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditItemCommand {
    /// Item ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub nickname: Option<String>,
    #[arg(long, conflicts_with = "nickname")]
    pub nickname_clear: bool,

    #[arg(long)]
    pub species: Option<String>,
    #[arg(long, conflicts_with = "species")]
    pub species_clear: bool,

    /// Move a plant to this site (ID or unique prefix)
    #[arg(long)]
    pub site: Option<String>,
    /// Take a plant off its site
    #[arg(long, conflicts_with = "site")]
    pub site_clear: bool,

    /// A pet's birth date (YYYY-MM-DD)
    #[arg(long)]
    pub born: Option<String>,
    #[arg(long, conflicts_with = "born")]
    pub born_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SiteCommand {
    #[command(subcommand)]
    pub command: SiteSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SiteSubcommand {
    /// Add a site, e.g. a windowsill or the balcony
    Add(AddSiteCommand),
    /// List your sites and how many plants each holds
    List(JsonFlag),
    /// Rename a site or change its light or location
    Edit(EditSiteCommand),
    /// Remove a site; its plants stay, without a site
    Remove(RemoveCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddSiteCommand {
    pub name: String,
    /// low, medium or high
    #[arg(long)]
    pub light: LightLevel,
    /// indoor or outdoor
    #[arg(long)]
    pub location: SiteLocation,
}

#[derive(Parser, Debug, Clone)]
pub struct EditSiteCommand {
    /// Site ID or unique prefix
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub light: Option<LightLevel>,
    #[arg(long)]
    pub location: Option<SiteLocation>,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowItemCommand {
    /// Item ID or unique prefix
    pub id: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub command: TaskSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskSubcommand {
    /// Attach a recurring care task to an item
    Add(AddTaskCommand),
    /// List recurring care tasks
    List(ListTasksCommand),
    /// Change how often a task repeats
    Freq(FreqCommand),
    /// Edit a task's cadence, description or last completion
    Edit(EditTaskCommand),
    /// Remove a task and its schedule
    Remove(RemoveCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddTaskCommand {
    /// Item ID or unique prefix
    pub item: String,
    /// misting, watering, pruning or fertilizing
    pub kind: CareKind,
    /// How often it repeats, e.g. "3 days", "2w", "month"
    #[arg(short, long)]
    pub every: String,
    /// Free-text note shown with the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// When it was last done, e.g. "yesterday" or "2024-05-01"
    #[arg(long, help = "When it was last done; the first reminder is due one cadence later")]
    pub last_done: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListTasksCommand {
    /// Only tasks for this item (ID or unique prefix)
    #[arg(long)]
    pub item: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FreqCommand {
    /// Task ID or unique prefix
    pub id: String,
    /// New cadence, e.g. "10 days" or "2 weeks"
    pub every: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditTaskCommand {
    /// Task ID or unique prefix
    pub id: String,

    #[arg(long)]
    pub every: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub last_done: Option<String>,
    #[arg(long, conflicts_with = "last_done")]
    pub last_done_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RemoveCommand {
    /// ID or unique prefix
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DoCommand {
    /// ID of the due task, as shown by `tend due`
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct JsonFlag {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub type DueCommand = JsonFlag;

#[derive(Parser, Debug, Clone)]
pub struct CalendarCommand {
    /// Number of days after today to show (defaults to the configured value)
    #[arg(short, long)]
    pub days: Option<i64>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct HistoryCommand {
    /// Only completions on this local date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub json: bool,
}

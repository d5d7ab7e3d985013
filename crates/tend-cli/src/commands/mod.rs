// Each top-level command lives in its own submodule.

pub mod calendar;
pub mod r#do;
pub mod due;
pub mod history;
pub mod item;
pub mod site;
pub mod task;

use anyhow::Result;
use serde::Serialize;

/// Pretty-prints a read command's result for `--json`
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

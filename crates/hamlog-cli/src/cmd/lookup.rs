//! `hamlog lookup` - resolve call signs against the prefix table

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use hamlog_contacts::{CallSignTable, is_call_sign};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Call signs to resolve
    #[arg(required = true)]
    pub callsigns: Vec<String>,

    /// Call sign prefix table
    #[arg(short, long)]
    pub table: Option<PathBuf>,
}

/// `(call sign, valid, matched prefix, country, extra columns)`
fn resolve(table: &CallSignTable, sign: &str) -> [String; 5] {
    let entry = table.lookup(sign);
    [
        sign.to_string(),
        if is_call_sign(sign) { "yes" } else { "no" }.to_string(),
        entry.range_key.clone(),
        entry.country().to_string(),
        entry.payload[1..].join(", "),
    ]
}

pub fn run(args: LookupArgs, config: &Config) -> Result<()> {
    let path = args.table.unwrap_or_else(|| config.input.table.clone());
    let table = CallSignTable::load(&path)
        .with_context(|| format!("Failed to load call sign table {}", path.display()))?;

    let mut out = Table::new();
    out.load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            ["Call sign", "Valid", "Prefix", "Country", "Other"]
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan)),
        );
    for sign in &args.callsigns {
        out.add_row(resolve(&table, sign));
    }
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_row() {
        let table = CallSignTable::build(["K,United States,NA", "VE,Canada,NA"]).unwrap();
        assert_eq!(
            resolve(&table, "VE3XYZ"),
            ["VE3XYZ", "yes", "VE", "Canada", "NA"].map(String::from)
        );
        assert_eq!(resolve(&table, "599")[1], "no");
    }
}

//! `cloudzones list providers|regions|zones`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use cloudzones_core::{
    store::Store,
    types::{EntityKind, ProviderCode, RegionId},
};

use super::Workspace;

/// Arguments for `cloudzones list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// providers | regions | zones
    pub entity: EntityKind,

    /// Only records of this provider.
    #[arg(long, value_name = "CODE")]
    pub provider: Option<String>,

    /// Only zones of this region identifier (e.g. aws-us-east-1).
    #[arg(long, value_name = "ID")]
    pub region: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ProviderJson<'a> {
    provider: &'a str,
    regions: usize,
    zones: usize,
}

#[derive(Tabled)]
struct RegionTableRow {
    #[tabled(rename = "region")]
    id: String,
    #[tabled(rename = "short")]
    short: String,
    #[tabled(rename = "zones")]
    zones: usize,
    #[tabled(rename = "last synced")]
    synced: String,
}

#[derive(Tabled)]
struct ZoneTableRow {
    #[tabled(rename = "zone")]
    id: String,
    #[tabled(rename = "short")]
    short: String,
    #[tabled(rename = "zone id")]
    az_id: String,
    #[tabled(rename = "region")]
    region: String,
}

impl ListArgs {
    pub fn run(self, workspace: &Workspace) -> Result<()> {
        let (_, store) = workspace.load()?;
        let provider = self.provider.as_deref().map(ProviderCode::from);
        let region = self.region.as_deref().map(RegionId::from);

        if self.json {
            return print_json(&store, self.entity, provider.as_ref(), region.as_ref());
        }
        match self.entity {
            EntityKind::Provider => print_providers(&store),
            EntityKind::Region => print_regions(&store, provider.as_ref()),
            EntityKind::Zone => print_zones(&store, provider.as_ref(), region.as_ref()),
        }
        Ok(())
    }
}

fn print_json(
    store: &Store,
    entity: EntityKind,
    provider: Option<&ProviderCode>,
    region: Option<&RegionId>,
) -> Result<()> {
    let json = match entity {
        EntityKind::Provider => {
            let rows: Vec<ProviderJson<'_>> = store
                .list_providers()
                .into_iter()
                .map(|p| ProviderJson {
                    provider: p.provider.as_str(),
                    regions: store.list_regions(Some(&p.provider)).len(),
                    zones: store.list_zones(Some(&p.provider), None).len(),
                })
                .collect();
            serde_json::to_string_pretty(&rows)
        }
        EntityKind::Region => serde_json::to_string_pretty(&store.list_regions(provider)),
        EntityKind::Zone => serde_json::to_string_pretty(&store.list_zones(provider, region)),
    }
    .context("failed to serialize list JSON")?;
    println!("{json}");
    Ok(())
}

fn print_providers(store: &Store) {
    let providers = store.list_providers();
    if providers.is_empty() {
        println!("No providers. Run `cloudzones sync` first.");
        return;
    }
    for provider in providers {
        let regions = store.list_regions(Some(&provider.provider)).len();
        let zones = store.list_zones(Some(&provider.provider), None).len();
        println!("{:<6} {regions} region(s), {zones} zone(s)", provider.to_string().bold());
    }
}

fn print_regions(store: &Store, provider: Option<&ProviderCode>) {
    let rows: Vec<RegionTableRow> = store
        .list_regions(provider)
        .into_iter()
        .map(|r| RegionTableRow {
            id: r.region_name_with_provider.to_string(),
            short: r.region_short_name_with_provider.clone(),
            zones: store.list_zones(None, Some(r.id())).len(),
            synced: r.record_last_synced.clone(),
        })
        .collect();
    if rows.is_empty() {
        println!("No regions.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_zones(store: &Store, provider: Option<&ProviderCode>, region: Option<&RegionId>) {
    let rows: Vec<ZoneTableRow> = store
        .list_zones(provider, region)
        .into_iter()
        .map(|z| ZoneTableRow {
            id: z.az_name_with_provider.to_string(),
            short: z.az_short_name_with_provider.clone(),
            az_id: z.az_id.clone().unwrap_or_else(|| "-".into()),
            region: z.region.to_string(),
        })
        .collect();
    if rows.is_empty() {
        println!("No zones.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

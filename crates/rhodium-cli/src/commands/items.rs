//! Item commands: `add`, `list`, `show`, `done`, `today`.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use rhodium_ident::ItemId;
use rhodium_store::{
    ItemView, NewItem, STATUS_DONE, StoreError, create_item, due_today, get_item, list_items,
    set_item_status,
};
use rhodium_tz::{ZoneSelection, format_for_input, parse_local_input, resolve_zone};

use crate::opts::GlobalOpts;
use crate::output::print_success;

use super::{attach, zone_with_notice};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Item title
    pub title: String,

    /// Due time: YYYY-MM-DDTHH:MM in --tz, or RFC 3339 with an offset
    #[arg(long)]
    pub due: Option<String>,

    /// Higher sorts first
    #[arg(long, default_value_t = 0)]
    pub priority: i64,

    #[arg(long)]
    pub description: Option<String>,

    /// Free-form recurrence rule (at most 64 characters)
    #[arg(long)]
    pub recurring: Option<String>,

    /// IANA zone for --due and for display
    #[arg(long)]
    pub tz: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// IANA zone for display
    #[arg(long)]
    pub tz: Option<String>,
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Item identifier (32 hex characters)
    pub id: String,

    /// IANA zone for display
    #[arg(long)]
    pub tz: Option<String>,
}

#[derive(Args, Debug)]
pub struct TodayArgs {
    /// IANA zone whose calendar day is used (required)
    #[arg(long)]
    pub tz: Option<String>,
}

pub fn cmd_add(opts: &GlobalOpts, args: &AddArgs) -> Result<()> {
    let mut warnings = vec![];
    let zone = zone_with_notice(args.tz.as_deref(), &mut warnings);
    let due_at = args
        .due
        .as_deref()
        .map(|raw| parse_local_input(raw, zone.tz))
        .transpose()?;

    let host = attach(opts)?;
    let mut session = host.session()?;
    let item = create_item(
        &mut session,
        host.generator(),
        NewItem {
            title: args.title.clone(),
            description: args.description.clone(),
            due_at,
            recurring: args.recurring.clone(),
            priority: args.priority,
        },
    )?;
    let view = ItemView::new(&item, zone.tz);
    print_success(opts, serde_json::to_value(&view)?, Some(view.id.clone()), warnings)
}

pub fn cmd_list(opts: &GlobalOpts, args: &ListArgs) -> Result<()> {
    let mut warnings = vec![];
    let zone = zone_with_notice(args.tz.as_deref(), &mut warnings);
    let host = attach(opts)?;
    let session = host.session()?;
    let items = list_items(&session)?;
    let views: Vec<_> = items.iter().map(|item| ItemView::new(item, zone.tz)).collect();
    let human = render_rows(&views, &zone);
    print_success(opts, serde_json::to_value(&views)?, Some(human), warnings)
}

pub fn cmd_show(opts: &GlobalOpts, args: &ItemArgs) -> Result<()> {
    let mut warnings = vec![];
    let zone = zone_with_notice(args.tz.as_deref(), &mut warnings);
    let id = parse_id(&args.id)?;
    let host = attach(opts)?;
    let session = host.session()?;
    let item = get_item(&session, &id)?.ok_or(StoreError::ItemNotFound(id))?;
    let view = ItemView::new(&item, zone.tz);
    print_success(opts, serde_json::to_value(&view)?, None, warnings)
}

pub fn cmd_done(opts: &GlobalOpts, args: &ItemArgs) -> Result<()> {
    let mut warnings = vec![];
    let zone = zone_with_notice(args.tz.as_deref(), &mut warnings);
    let id = parse_id(&args.id)?;
    let host = attach(opts)?;
    let mut session = host.session()?;
    let item = set_item_status(&mut session, &id, STATUS_DONE)?;
    let view = ItemView::new(&item, zone.tz);
    let human = format!("{} done", view.id);
    print_success(opts, serde_json::to_value(&view)?, Some(human), warnings)
}

pub fn cmd_today(opts: &GlobalOpts, args: &TodayArgs) -> Result<()> {
    let zone = resolve_zone(args.tz.as_deref());
    let host = attach(opts)?;
    let session = host.session()?;
    let report = match due_today(&session, &zone, Utc::now()) {
        Err(err @ StoreError::ZoneRequired { .. }) => {
            return Err(anyhow::Error::new(err)
                .context("pass --tz with an IANA zone name, e.g. --tz America/New_York"));
        }
        other => other?,
    };

    let mut human = format!(
        "{} {} ({}, weekday {}), due by {}",
        report.date,
        report.current_time.format("%H:%M"),
        report.zone_label,
        report.iso_weekday,
        format_for_input(report.boundary_utc, zone.tz),
    );
    if !report.items.is_empty() {
        human.push('\n');
        human.push_str(&render_rows(&report.items, &zone));
    }
    print_success(opts, serde_json::to_value(&report)?, Some(human), vec![])
}

fn parse_id(raw: &str) -> Result<ItemId> {
    raw.trim()
        .parse::<ItemId>()
        .with_context(|| format!("bad request: '{raw}' is not an item identifier"))
}

fn render_rows(views: &[ItemView], zone: &ZoneSelection) -> String {
    views
        .iter()
        .map(|v| {
            let due = v
                .due_at
                .map(|d| {
                    let local = format_for_input(d.with_timezone(&Utc), zone.tz);
                    format!("{local} {}", zone.name())
                })
                .unwrap_or_else(|| "-".into());
            format!("{}  [{}] p{}  {}  due {}", v.id, v.status, v.priority, v.title, due)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

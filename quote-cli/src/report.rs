//! Plain-text views of quotes, totals and rates.

use std::io::{self, Write};

use quote_core::calculations::PricingResult;
use quote_core::calculations::common::{format_fixed, format_money};
use quote_core::session::{EditSession, ListSource, Listing};
use quote_core::{RateCategory, RatesConfig, RemoteSync};

/// One line describing where a write ended up, or `None` when there is
/// no shared store.
pub fn sync_note(sync: &RemoteSync) -> Option<String> {
    match sync {
        RemoteSync::Synced => Some("synced to shared store".to_string()),
        RemoteSync::LocalOnly(reason) => Some(format!("saved locally only ({reason})")),
        RemoteSync::Disabled => None,
    }
}

pub fn write_totals(
    out: &mut impl Write,
    totals: &PricingResult,
) -> io::Result<()> {
    writeln!(out, "  Hours          {:>12}", totals.hours_display())?;
    writeln!(out, "  Labour days    {:>12}", totals.labour_days_display())?;
    writeln!(out, "  OOH            {:>12}", format_money(totals.ooh_total))?;
    writeln!(out, "  Saturday       {:>12}", format_money(totals.sat_total))?;
    writeln!(out, "  Sunday         {:>12}", format_money(totals.sun_total))?;
    writeln!(out, "  Total          {:>12}", totals.total_display())?;
    writeln!(out, "  VAT            {:>12}", format_money(totals.vat))?;
    writeln!(out, "  Total inc VAT  {:>12}", format_money(totals.total_with_vat))?;
    writeln!(out, "  Margin         {:>12}", totals.margin_display())
}

pub fn write_listing(
    out: &mut impl Write,
    listing: &Listing,
) -> io::Result<()> {
    let source = match listing.source {
        ListSource::Remote => "shared",
        ListSource::Local => "local",
    };
    if listing.quotes.is_empty() {
        return writeln!(out, "No saved quotes ({source}).");
    }
    writeln!(out, "{} quotes ({source}):", listing.quotes.len())?;
    for (n, quote) in listing.quotes.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {:<16} {:<28} {:>12}  {}  {}",
            n + 1,
            quote.ref_code,
            quote.heading(),
            quote.total,
            quote.date.format("%d/%m/%Y"),
            quote.id
        )?;
    }
    Ok(())
}

/// The form as it stands, with per-row totals.
pub fn write_session(
    out: &mut impl Write,
    session: &EditSession,
) -> io::Result<()> {
    let form = &session.form;
    let totals = session.totals();
    let config = &session.config;

    let id = session.current_quote_id().unwrap_or("unsaved");
    writeln!(out, "Ref      {}  [{}, rev {}]", form.quote_ref, id, session.current_revision())?;
    writeln!(out, "Date     {}", form.quote_date)?;
    writeln!(out, "Client   {}", form.client_name)?;
    writeln!(out, "Project  {}", form.proj_name)?;
    writeln!(out, "Site     {}", form.site_addr)?;
    writeln!(out, "Days     {}", form.days_on_site)?;
    writeln!(out, "Issuer   {}", form.issued_by)?;
    writeln!(out, "Status   {}", form.status.as_str())?;
    if !form.scope_notes.is_empty() {
        writeln!(out, "Scope    {}", form.scope_notes)?;
    }

    if !form.items.is_empty() {
        writeln!(out, "Items:")?;
        for (n, item) in form.items.iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {:<36} {:>6} x {:>6} = {:>8}",
                n + 1,
                item.desc,
                item.qty,
                item.rate,
                totals.line_total_display(n)
            )?;
        }
    }

    for category in [RateCategory::Labour, RateCategory::Vehicle, RateCategory::Expense] {
        for rate in config.items(category) {
            let total = totals.row_total(&rate.id).unwrap_or_default();
            if !total.is_zero() {
                writeln!(out, "  {:<4} {:<28} {:>12}", rate.id, rate.label, format_money(total))?;
            }
        }
    }

    write_totals(out, &totals)
}

pub fn write_rates(
    out: &mut impl Write,
    config: &RatesConfig,
) -> io::Result<()> {
    for (title, category) in [
        ("Labour (day rate)", RateCategory::Labour),
        ("Vehicles (hire)", RateCategory::Vehicle),
        ("Expenses (unit)", RateCategory::Expense),
    ] {
        writeln!(out, "{title}:")?;
        for item in config.items(category) {
            let suffix = if item.per_day { "  per day" } else { "" };
            writeln!(
                out,
                "  {:<4} {:<28} {:>10}{suffix}",
                item.id,
                item.label,
                format_money(item.rate)
            )?;
        }
    }
    let g = &config.globals;
    writeln!(out, "Globals:")?;
    writeln!(out, "  day hours {}", g.day_hours)?;
    writeln!(out, "  ooh x{}  sat x{}  sun x{}", g.ooh_multiplier, g.sat_multiplier, g.sun_multiplier)?;
    let vat_percent = g.vat_rate.saturating_mul(rust_decimal::Decimal::ONE_HUNDRED);
    writeln!(out, "  vat {}%", format_fixed(vat_percent, 0))?;
    writeln!(out, "  margin target {}%", g.margin_target)
}

//! Line-oriented editing shell over a [`QuoteWorkflow`].
//!
//! Each input line is one command. Form edits go through
//! [`QuoteWorkflow::edit`] so they are autosaved; `key <chord>` runs the
//! action bound to a keyboard shortcut.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use quote_core::config::GlobalSetting;
use quote_core::export::{ExportArtifact, QuoteDocument, export_json, export_pdf};
use quote_core::form::{HeaderField, parse_item_line};
use quote_core::keymap::{self, Action, KeyChord};
use quote_core::models::LineItem;
use quote_core::{ConfigStore, QuoteStatus, QuoteWorkflow};
use quote_pdf::PdfRenderer;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::logging;
use crate::report;

const HELP: &str = "\
Quote
  set <field> <value>       ref, date, client, project, site, scope, days, issuer
  status <status>           draft, sent, accepted, declined
  labour <id> <qty> <days>  crew count and days for a labour rate
  vehicle <id> <qty> [area] vehicles hired
  expense <id> <qty>        units, or days for per-day expenses
  item add <desc>[|qty[|rate]]
  item set <n> <desc>[|qty[|rate]]
  item rm <n>               remove item n
  item mv <from> <to>       reorder items
  paste <file>              append items from pasted text (desc|qty|rate per line)
  show                      current quote with totals
  totals                    totals only
Library
  save                      save the quote
  revise                    save as the next revision
  list                      list saved quotes
  load <n|id>               open a quote from the last list
  new                       start a blank quote
  import <file>             open an exported JSON quote
Export
  pdf [dir]                 write Estimate_<ref>.pdf
  json [dir]                write <ref>.json
Admin
  rates                     show rate tables
  rate <id> <value>         change a rate
  label <id> <text>         rename a rate
  global <name> <value>     dayhours, ooh, sat, sun, vat, margin
  terms <file>              replace the terms and conditions
  config save               save rates locally and to the shared store
Other
  key <chord>               run a shortcut, e.g. key ^s
  log <level>               change the log filter
  help
  quit";

/// Whether the shell should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    workflow: QuoteWorkflow,
    config_store: ConfigStore,
    renderer: PdfRenderer,
    export_dir: PathBuf,
    listed_ids: Vec<String>,
}

fn parse_index(arg: &str) -> Result<usize> {
    let n: usize = arg
        .parse()
        .with_context(|| format!("'{arg}' is not an item number"))?;
    n.checked_sub(1).ok_or_else(|| anyhow!("item numbers start at 1"))
}

fn parse_decimal(arg: &str) -> Result<Decimal> {
    arg.trim()
        .parse()
        .with_context(|| format!("'{arg}' is not a number"))
}

/// A single `desc|qty|rate` line as an item. Unlike pasting, a blank
/// description is allowed here.
fn parse_item(text: &str) -> LineItem {
    parse_item_line(text.lines().next().unwrap_or_default())
}

impl Shell {
    pub fn new(
        workflow: QuoteWorkflow,
        config_store: ConfigStore,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            workflow,
            config_store,
            renderer: PdfRenderer::default(),
            export_dir,
            listed_ids: Vec::new(),
        }
    }

    pub fn workflow(&self) -> &QuoteWorkflow {
        &self.workflow
    }

    /// Reads commands until `quit` or end of input, then writes any pending
    /// autosave.
    pub async fn run<R, W>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        if self.workflow.restore_autosave().await? {
            writeln!(out, "Restored autosaved quote.")?;
        }
        writeln!(out, "Type 'help' for commands.")?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match self.execute(&line, out).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "error: {e:#}")?,
            }
        }

        self.workflow.flush_autosave().await;
        Ok(())
    }

    /// Runs one command line.
    pub async fn execute<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        debug!(command, "shell command");

        match command {
            "" => {}
            "help" | "?" => writeln!(out, "{HELP}")?,
            "quit" | "exit" => return Ok(Flow::Quit),
            "set" => self.set_field(rest)?,
            "status" => {
                let status = QuoteStatus::parse(&rest.to_ascii_lowercase())
                    .ok_or_else(|| anyhow!("unknown status '{rest}'"))?;
                self.workflow.edit(|form, _| form.status = status);
            }
            "labour" | "labor" => {
                let [id, qty, days] = args::<3>(rest, "labour <id> <qty> <days>")?;
                self.workflow
                    .edit(|form, config| form.set_labour(config, id, qty, days))?;
            }
            "vehicle" => {
                let (id, rest) = rest.split_once(' ').unwrap_or((rest, ""));
                let (qty, area) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                if id.is_empty() || qty.is_empty() {
                    bail!("usage: vehicle <id> <qty> [area]");
                }
                let area = (!area.trim().is_empty()).then(|| area.trim().to_string());
                self.workflow
                    .edit(|form, config| form.set_vehicle(config, id, qty, area))?;
            }
            "expense" => {
                let [id, qty] = args::<2>(rest, "expense <id> <qty>")?;
                self.workflow
                    .edit(|form, config| form.set_expense(config, id, qty))?;
            }
            "item" => self.item(rest)?,
            "paste" => {
                let text = std::fs::read_to_string(rest)
                    .with_context(|| format!("Failed to read {rest}"))?;
                let added = self.workflow.edit(|form, _| form.paste_items(&text));
                writeln!(out, "Added {added} items.")?;
            }
            "show" => report::write_session(out, self.workflow.session())?,
            "totals" => report::write_totals(out, &self.workflow.session().totals())?,
            "save" => self.save(out).await?,
            "revise" => self.revise(out).await?,
            "list" => self.list(out).await?,
            "load" => self.load(rest, out).await?,
            "new" => {
                self.workflow.new_quote();
                writeln!(out, "New quote.")?;
            }
            "import" => {
                let json = std::fs::read_to_string(rest)
                    .with_context(|| format!("Failed to read {rest}"))?;
                let snapshot = self.workflow.import_snapshot(&json)?;
                writeln!(out, "Imported {}.", snapshot.quote_ref)?;
            }
            "pdf" => self.export_pdf(rest, out)?,
            "json" => {
                let artifact = export_json(&self.workflow.session().snapshot())?;
                self.write_artifact(artifact, rest, out)?;
            }
            "rates" => report::write_rates(out, self.workflow.config())?,
            "rate" => {
                let [id, value] = args::<2>(rest, "rate <id> <value>")?;
                let value = parse_decimal(value)?;
                self.update_config(|config| Ok(config.set_rate(id, value)?))?;
            }
            "label" => {
                let (id, label) = rest
                    .split_once(' ')
                    .ok_or_else(|| anyhow!("usage: label <id> <text>"))?;
                self.update_config(|config| Ok(config.set_label(id, label)?))?;
            }
            "global" => {
                let [name, value] = args::<2>(rest, "global <name> <value>")?;
                let setting: GlobalSetting = name.parse()?;
                let value = parse_decimal(value)?;
                self.update_config(|config| Ok(config.set_global(setting, value)?))?;
            }
            "terms" => {
                let terms = std::fs::read_to_string(rest)
                    .with_context(|| format!("Failed to read {rest}"))?;
                self.update_config(|config| {
                    config.set_terms(terms.trim());
                    Ok(())
                })?;
            }
            "config" => match rest {
                "save" => {
                    let sync = self.config_store.save_admin(self.workflow.config()).await?;
                    let note = report::sync_note(&sync);
                    writeln!(out, "Rates saved{}.", note.map(|n| format!(", {n}")).unwrap_or_default())?;
                }
                _ => bail!("usage: config save"),
            },
            "key" => {
                let chord: KeyChord = rest.parse().map_err(|e: String| anyhow!(e))?;
                return self.shortcut(chord, out).await;
            }
            "log" => {
                logging::set_log_level(rest)?;
                writeln!(out, "Log filter set to {rest}.")?;
            }
            other => bail!("unknown command '{other}'; type 'help'"),
        }

        Ok(Flow::Continue)
    }

    async fn shortcut<W: Write>(
        &mut self,
        chord: KeyChord,
        out: &mut W,
    ) -> Result<Flow> {
        let Some(action) = keymap::resolve(chord, self.workflow.session().can_revise()) else {
            writeln!(out, "Nothing bound to that key.")?;
            return Ok(Flow::Continue);
        };
        debug!(%action, "shortcut");

        match action {
            Action::Save => self.save(out).await?,
            Action::NewQuote => {
                self.workflow.new_quote();
                writeln!(out, "New quote.")?;
            }
            Action::OpenLibrary => self.list(out).await?,
            Action::ExportPdf => self.export_pdf("", out)?,
            Action::AddItem => {
                self.workflow.edit(|form, _| form.add_item(LineItem::blank()));
                let count = self.workflow.session().form.items.len();
                writeln!(out, "Added item {count}.")?;
            }
            Action::Revise => self.revise(out).await?,
            Action::Dismiss => {}
        }
        Ok(Flow::Continue)
    }

    fn set_field(
        &mut self,
        rest: &str,
    ) -> Result<()> {
        let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
        let field: HeaderField = name.parse()?;
        let value = value.trim().to_string();
        self.workflow.edit(|form, _| form.set_field(field, value));
        Ok(())
    }

    fn item(
        &mut self,
        rest: &str,
    ) -> Result<()> {
        let (sub, rest) = rest.split_once(' ').unwrap_or((rest, ""));
        let rest = rest.trim();
        match sub {
            "add" => {
                let item = parse_item(rest);
                self.workflow.edit(|form, _| form.add_item(item));
            }
            "set" => {
                let (n, text) = rest.split_once(' ').unwrap_or((rest, ""));
                let index = parse_index(n)?;
                let item = parse_item(text);
                self.workflow
                    .edit(|form, _| form.update_item(index, item))?;
            }
            "rm" => {
                let index = parse_index(rest)?;
                self.workflow.edit(|form, _| form.remove_item(index))?;
            }
            "mv" => {
                let [from, to] = args::<2>(rest, "item mv <from> <to>")?;
                let (from, to) = (parse_index(from)?, parse_index(to)?);
                self.workflow.edit(|form, _| form.move_item(from, to))?;
            }
            _ => bail!("usage: item add|set|rm|mv"),
        }
        Ok(())
    }

    fn update_config(
        &mut self,
        f: impl FnOnce(&mut quote_core::RatesConfig) -> Result<()>,
    ) -> Result<()> {
        let mut config = self.workflow.config().clone();
        f(&mut config)?;
        self.workflow.set_config(config);
        Ok(())
    }

    async fn save<W: Write>(
        &mut self,
        out: &mut W,
    ) -> Result<()> {
        let outcome = self.workflow.save().await?;
        write!(out, "Saved {} ({})", outcome.record.ref_code, outcome.record.id)?;
        match report::sync_note(&outcome.remote) {
            Some(note) => writeln!(out, ", {note}.")?,
            None => writeln!(out, ".")?,
        }
        Ok(())
    }

    async fn revise<W: Write>(
        &mut self,
        out: &mut W,
    ) -> Result<()> {
        let outcome = self.workflow.revise().await?;
        write!(out, "Saved revision {}", outcome.record.ref_code)?;
        match report::sync_note(&outcome.remote) {
            Some(note) => writeln!(out, ", {note}.")?,
            None => writeln!(out, ".")?,
        }
        Ok(())
    }

    async fn list<W: Write>(
        &mut self,
        out: &mut W,
    ) -> Result<()> {
        let listing = self.workflow.list().await?;
        self.listed_ids = listing.quotes.iter().map(|q| q.id.clone()).collect();
        report::write_listing(out, &listing)?;
        Ok(())
    }

    async fn load<W: Write>(
        &mut self,
        target: &str,
        out: &mut W,
    ) -> Result<()> {
        if target.is_empty() {
            bail!("usage: load <n|id>");
        }
        let id = match target.parse::<usize>() {
            Ok(n) => self
                .listed_ids
                .get(n.wrapping_sub(1))
                .cloned()
                .ok_or_else(|| anyhow!("no quote {n} in the last list"))?,
            Err(_) => target.to_string(),
        };
        let snapshot = self.workflow.load(&id).await?;
        writeln!(out, "Loaded {}.", snapshot.quote_ref)?;
        Ok(())
    }

    fn export_pdf<W: Write>(
        &self,
        dir: &str,
        out: &mut W,
    ) -> Result<()> {
        let session = self.workflow.session();
        let document = QuoteDocument::build(
            &session.snapshot(),
            &session.totals(),
            &session.config,
            Local::now().date_naive(),
        );
        let artifact = export_pdf(&document, &self.renderer)?;
        self.write_artifact(artifact, dir, out)
    }

    fn write_artifact<W: Write>(
        &self,
        artifact: ExportArtifact,
        dir: &str,
        out: &mut W,
    ) -> Result<()> {
        let dir = if dir.is_empty() {
            self.export_dir.as_path()
        } else {
            Path::new(dir)
        };
        let path = artifact.write_to(dir)?;
        info!(path = %path.display(), "exported");
        writeln!(out, "Wrote {}.", path.display())?;
        Ok(())
    }
}

/// Splits `rest` into exactly `N` whitespace-separated arguments.
fn args<'a, const N: usize>(
    rest: &'a str,
    usage: &str,
) -> Result<[&'a str; N]> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    parts
        .try_into()
        .map_err(|_| anyhow!("usage: {usage}"))
}

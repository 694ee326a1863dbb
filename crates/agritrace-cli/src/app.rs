//! The interactive menu and its actions.
//!
//! Every mutating action follows the same order: validate, mutate the
//! registry, save the JSON file, then mirror. A failed save undoes the
//! in-memory mutation so memory never runs ahead of disk; a failed mirror
//! write is only logged.

use std::io::Write;
use std::path::PathBuf;

use agritrace_core::registry::{EventInput, LotFilter, LotInput, LotRegistry};
use agritrace_core::report::{compute_kpis_at, format_report};
use agritrace_core::validation::{
    canonical_to_local_date, parse_yes_no, validate_event_type, validate_local_date,
    validate_nonempty_text, validate_region_code, validate_weight,
};
use agritrace_core::ValidationError;
use agritrace_db::LotMirror;
use agritrace_store::{LotStore, export_csv};
use agritrace_types::{Lot, LotId, LotStatus};
use chrono::Local;
use tokio::io::AsyncBufRead;
use tracing::{error, info, warn};

use crate::error::CliError;
use crate::prompt::Prompter;

const MAIN_MENU: &str = "
=== Lot traceability ===
1) Register lot
2) Register event
3) List lots
4) Sustainability report
5) Export CSV / reload JSON
6) Relational mirror
0) Exit";

/// Whether the menu loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Session state: the registry and its two sinks.
pub struct App {
    registry: LotRegistry,
    store: LotStore,
    mirror: Box<dyn LotMirror>,
    csv_path: PathBuf,
    stale_after_days: i64,
}

impl App {
    /// Assemble a session from an already-loaded registry.
    pub fn new(
        registry: LotRegistry,
        store: LotStore,
        mirror: Box<dyn LotMirror>,
        csv_path: PathBuf,
        stale_after_days: i64,
    ) -> Self {
        Self {
            registry,
            store,
            mirror,
            csv_path,
            stale_after_days,
        }
    }

    /// The in-memory registry.
    pub const fn registry(&self) -> &LotRegistry {
        &self.registry
    }

    /// Run the menu until the user exits or input ends.
    ///
    /// Action failures are reported and logged; only terminal I/O errors
    /// end the session with an error.
    pub async fn run<R, W>(&mut self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        loop {
            prompter.say(MAIN_MENU)?;
            let outcome = match prompter.read_line("Choice: ").await {
                Ok(choice) => self.dispatch(choice.trim(), prompter).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(CliError::EndOfInput) => {
                    info!("Input closed, ending session");
                    break;
                }
                Err(CliError::Io { source }) => return Err(CliError::Io { source }),
                Err(e) => {
                    error!(error = %e, "Action failed");
                    prompter.say(&format!("Error: {e}"))?;
                }
            }
        }
        prompter.say("Bye.")?;
        Ok(())
    }

    async fn dispatch<R, W>(
        &mut self,
        choice: &str,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Flow, CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        match choice {
            "1" => self.register_lot(prompter).await?,
            "2" => self.register_event(prompter).await?,
            "3" => self.list_lots(prompter).await?,
            "4" => self.report(prompter)?,
            "5" => self.files_menu(prompter).await?,
            "6" => self.mirror_menu(prompter).await?,
            "0" => return Ok(Flow::Exit),
            other => prompter.say(&format!("Unknown option: {other:?}"))?,
        }
        Ok(Flow::Continue)
    }

    async fn register_lot<R, W>(&mut self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let product = prompter
            .ask_until_valid("Product: ", |s| validate_nonempty_text(s, "product"))
            .await?;
        let producer = prompter
            .ask_until_valid("Producer: ", |s| validate_nonempty_text(s, "producer"))
            .await?;
        let origin_region = prompter
            .ask_until_valid("Origin region (UF, e.g. SP): ", |s| {
                validate_region_code(s).map(String::from)
            })
            .await?;
        let harvest_date_local = prompter
            .ask_until_valid("Harvest date (DD/MM/YYYY): ", keep_if(validate_local_date))
            .await?;
        let weight_kg = prompter
            .ask_until_valid("Weight (kg): ", keep_if(validate_weight))
            .await?;
        let carbon_neutral = prompter
            .ask_until_valid("Carbon neutral? (y/n): ", parse_yes_no)
            .await?;
        let water_reuse = prompter
            .ask_until_valid("Water reuse? (y/n): ", parse_yes_no)
            .await?;

        let input = LotInput {
            product,
            producer,
            origin_region,
            harvest_date_local,
            weight_kg,
            carbon_neutral: Some(carbon_neutral),
            water_reuse: Some(water_reuse),
        };
        let lot = self.registry.register_lot(&input)?;
        let id = lot.id;
        self.registry.insert(lot.clone())?;

        if let Err(e) = self.store.save_atomic(self.registry.lots()) {
            self.registry.remove(id);
            return Err(e.into());
        }
        info!(lot_id = %id, product = %lot.product, "Lot registered");

        if let Err(e) = self.mirror.insert_lot(&lot).await {
            warn!(lot_id = %id, error = %e, "Mirror insert failed");
        }
        prompter.say(&format!("Lot {id} registered."))?;
        Ok(())
    }

    async fn register_event<R, W>(&mut self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        if self.registry.is_empty() {
            prompter.say("No lots registered yet.")?;
            return Ok(());
        }

        let registry = &self.registry;
        let lot_id = prompter
            .ask_until_valid("Lot id: ", |s| existing_lot_id(s, registry))
            .await?;
        let event_type = prompter
            .ask_until_valid(
                "Type (HARVEST/TRANSPORT/STORAGE/INSPECTION): ",
                keep_if(validate_event_type),
            )
            .await?;
        let date_local = prompter
            .ask_until_valid("Date (DD/MM/YYYY): ", keep_if(validate_local_date))
            .await?;
        let location = prompter
            .ask_until_valid("Location: ", |s| validate_nonempty_text(s, "location"))
            .await?;
        let responsible_party = prompter
            .ask_until_valid("Responsible party: ", |s| {
                validate_nonempty_text(s, "responsible_party")
            })
            .await?;
        let notes = prompter.read_line("Notes (optional): ").await?;

        let input = EventInput {
            event_type,
            date_local,
            location,
            responsible_party,
            notes: Some(notes),
        };

        let Some(before) = self.registry.get(lot_id).cloned() else {
            prompter.say(&format!("Lot {lot_id} not found."))?;
            return Ok(());
        };
        if !self.registry.register_event(lot_id, &input)? {
            prompter.say(&format!("Lot {lot_id} not found."))?;
            return Ok(());
        }

        if let Err(e) = self.store.save_atomic(self.registry.lots()) {
            self.registry.restore(before);
            return Err(e.into());
        }

        let Some(after) = self.registry.get(lot_id) else {
            return Ok(());
        };
        info!(lot_id = %lot_id, status = %after.status, "Event registered");

        if let Some(event) = after.events.last() {
            if let Err(e) = self.mirror.insert_event(lot_id, event).await {
                warn!(lot_id = %lot_id, error = %e, "Mirror event insert failed");
            }
        }
        if after.status != before.status {
            if let Err(e) = self.mirror.update_status(lot_id, after.status).await {
                warn!(lot_id = %lot_id, error = %e, "Mirror status update failed");
            }
        }

        prompter.say(&format!(
            "Event recorded for lot {lot_id}. Status: {}.",
            after.status
        ))?;
        Ok(())
    }

    async fn list_lots<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let origin_region = prompter
            .ask_optional("Filter by region (blank for all): ", |s| {
                validate_region_code(s).map(String::from)
            })
            .await?;
        let status = prompter
            .ask_optional("Filter by status (blank for all): ", parse_status)
            .await?;

        let filter = LotFilter {
            origin_region,
            status: status.map(|s| s.as_str().to_owned()),
        };
        let lots = self.registry.list_lots(&filter);
        if lots.is_empty() {
            prompter.say("No lots found.")?;
            return Ok(());
        }
        for lot in lots {
            prompter.say(&lot_line(lot))?;
        }
        Ok(())
    }

    fn report<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let kpis = compute_kpis_at(
            self.registry.lots(),
            Local::now().date_naive(),
            self.stale_after_days,
        );
        prompter.say(&format_report(&kpis))
    }

    async fn files_menu<R, W>(&mut self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        prompter.say("1) Export CSV\n2) Reload JSON from disk")?;
        match prompter.read_line("Choice: ").await?.trim() {
            "1" => {
                let prompt = format!("CSV path (blank for {}): ", self.csv_path.display());
                let answer = prompter.read_line(&prompt).await?;
                let path = if answer.trim().is_empty() {
                    self.csv_path.clone()
                } else {
                    PathBuf::from(answer.trim())
                };
                let rows = export_csv(self.registry.lots(), &path)?;
                prompter.say(&format!("Exported {rows} lots to {}.", path.display()))
            }
            "2" => {
                let lots = self.store.load_validated()?;
                self.registry.replace_all(lots)?;
                info!(lots = self.registry.len(), "Registry reloaded from disk");
                prompter.say(&format!("Reloaded {} lots.", self.registry.len()))
            }
            other => prompter.say(&format!("Unknown option: {other:?}")),
        }
    }

    async fn mirror_menu<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        if !self.mirror.is_available() {
            return prompter.say("Relational mirror not available.");
        }
        prompter.say("1) List mirrored lots\n2) List mirrored events of a lot\n3) Delete a mirrored lot")?;
        match prompter.read_line("Choice: ").await?.trim() {
            "1" => match self.mirror.list_lots(None, None).await {
                Ok(rows) if rows.is_empty() => prompter.say("No mirrored lots."),
                Ok(rows) => {
                    for row in rows {
                        prompter.say(&format!(
                            "#{} | {} | {} | {} | {} | {} kg | {}",
                            row.id,
                            row.product,
                            row.producer,
                            row.origin_region,
                            canonical_to_local_date(row.harvest_date),
                            row.weight_kg,
                            row.status
                        ))?;
                    }
                    Ok(())
                }
                Err(e) => self.mirror_failed(prompter, &e),
            },
            "2" => {
                let id = prompter.ask_until_valid("Lot id: ", parse_lot_id).await?;
                match self.mirror.list_events(id).await {
                    Ok(rows) if rows.is_empty() => prompter.say("No mirrored events."),
                    Ok(rows) => {
                        for row in rows {
                            prompter.say(&format!(
                                "  {} | {} | {} | {}",
                                canonical_to_local_date(row.event_date),
                                row.event_type,
                                row.location,
                                row.responsible_party
                            ))?;
                        }
                        Ok(())
                    }
                    Err(e) => self.mirror_failed(prompter, &e),
                }
            }
            "3" => {
                let id = prompter.ask_until_valid("Lot id: ", parse_lot_id).await?;
                match self.mirror.delete_lot(id).await {
                    Ok(true) => prompter.say(&format!("Mirrored lot {id} deleted.")),
                    Ok(false) => prompter.say(&format!("Lot {id} is not mirrored.")),
                    Err(e) => self.mirror_failed(prompter, &e),
                }
            }
            other => prompter.say(&format!("Unknown option: {other:?}")),
        }
    }

    fn mirror_failed<R, W>(
        &self,
        prompter: &mut Prompter<R, W>,
        e: &agritrace_db::DbError,
    ) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        warn!(error = %e, available = self.mirror.is_available(), "Mirror operation failed");
        prompter.say(&format!("Mirror error: {e}"))
    }
}

/// One listing line, with the date in local format.
fn lot_line(lot: &Lot) -> String {
    format!(
        "#{} | {} | {} | {} | {} | {:.2} kg | {} | events: {}",
        lot.id,
        lot.product,
        lot.producer,
        lot.origin_region,
        canonical_to_local_date(lot.harvest_date),
        lot.weight_kg,
        lot.status,
        lot.event_count()
    )
}

/// Adapt a validator so the trimmed raw answer is kept once it passes.
fn keep_if<T>(
    validate: impl Fn(&str) -> Result<T, ValidationError>,
) -> impl Fn(&str) -> Result<String, ValidationError> {
    move |raw| validate(raw).map(|_| raw.trim().to_owned())
}

fn parse_lot_id(raw: &str) -> Result<LotId, ValidationError> {
    let id: u64 = raw.trim().parse().map_err(|e| {
        ValidationError::invalid("lot id", format!("must be a positive integer ({e})"))
    })?;
    let id = LotId(id);
    if id.is_valid() {
        Ok(id)
    } else {
        Err(ValidationError::invalid("lot id", "must be a positive integer"))
    }
}

fn existing_lot_id(raw: &str, registry: &LotRegistry) -> Result<LotId, ValidationError> {
    let id = parse_lot_id(raw)?;
    if registry.contains(id) {
        Ok(id)
    } else {
        Err(ValidationError::invalid("lot id", format!("no lot with id {id}")))
    }
}

fn parse_status(raw: &str) -> Result<LotStatus, ValidationError> {
    raw.parse()
        .map_err(|e| ValidationError::invalid("status", format!("{e}; expected PROCESSING or READY")))
}

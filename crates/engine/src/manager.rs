//! Record manager
//!
//! Owns the header and the spool of the battle being recorded, and turns
//! them into persistent records on request.
//!
//! ## Recovery
//!
//! | failure while          | effect                                                  |
//! |------------------------|---------------------------------------------------------|
//! | begin                  | no active recording                                     |
//! | record_turn (ordering) | spool recreated, turn counts invalidated, `Unrecoverable` |
//! | record_turn (other)    | spool recreated, recording dropped, simulation continues |
//! | export (I/O, format)   | spool recreated, recording dropped, `Failed`            |
//! | import                 | empty spool, `Incompatible` or `Failed`                 |
//!
//! Nothing here panics or aborts the host; a failure costs the record, not
//! the battle.

use crate::config::RecordConfig;
use battlerec_core::{
    BattleId, BattleRecordHeader, BattleResults, BattleRules, Error, ErrorKind, OutputOptions,
    RecordFormat, ReplaySummary, Result, TurnConsumer, TurnSnapshot, TurnSource, VersionProvider,
};
use battlerec_durability::{
    default_record_name, CsvSinks, CsvStats, ExportInfo, ImportInfo, RecordExporter,
    RecordImporter, TurnHook,
};
use battlerec_storage::{SpoolReplay, SpoolStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The record was written
    Written(ExportInfo),
    /// There was nothing to export
    Skipped,
    /// Writing failed; the recording was dropped
    Failed(ErrorKind),
}

/// Result of an import request
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The record was loaded and can be replayed
    Loaded(ImportInfo),
    /// The file is a legacy record this version cannot read
    Incompatible(String),
    /// Loading failed
    Failed(ErrorKind),
}

impl ImportOutcome {
    /// True if the record was loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImportOutcome::Loaded(_))
    }
}

/// Header plus spool for one battle
pub struct RecordManager {
    config: RecordConfig,
    version: Arc<dyn VersionProvider>,
    spool: Option<SpoolStore>,
    header: Option<BattleRecordHeader>,
}

impl RecordManager {
    /// Create a manager with a fresh, empty spool
    pub fn new(config: RecordConfig, version: Arc<dyn VersionProvider>) -> Result<Self> {
        config.validate()?;
        let spool = SpoolStore::create(config.spool_config())?;
        Ok(Self {
            config,
            version,
            spool: Some(spool),
            header: None,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// True once a recording or an imported record is present
    pub fn has_record(&self) -> bool {
        self.header.is_some()
    }

    /// Header of the current record
    pub fn header(&self) -> Option<&BattleRecordHeader> {
        self.header.as_ref()
    }

    /// The spool, if one could be created
    pub fn spool(&self) -> Option<&SpoolStore> {
        self.spool.as_ref()
    }

    /// Start recording a new battle
    ///
    /// Any previous record is discarded. If the spool cannot be opened the
    /// failure is logged and no recording is active.
    pub fn begin(&mut self, rules: BattleRules, robot_count: u32, battle_id: BattleId) {
        self.header = None;
        if let Err(e) = self.open_spool() {
            error!(
                target: "battlerec::record",
                battle_id = %battle_id,
                error = %e,
                "Failed to open spool; battle will not be recorded"
            );
            self.reset_spool();
            return;
        }

        let header = BattleRecordHeader::new(battle_id, rules, robot_count, self.version.version());
        info!(
            target: "battlerec::record",
            battle_id = %header.battle_id,
            rounds = header.rules.num_rounds,
            robot_count,
            "Recording started"
        );
        self.header = Some(header);
    }

    fn open_spool(&mut self) -> Result<()> {
        match self.spool.as_mut() {
            Some(spool) => spool.begin_write(),
            None => {
                let mut spool = SpoolStore::create(self.config.spool_config())?;
                spool.begin_write()?;
                self.spool = Some(spool);
                Ok(())
            }
        }
    }

    /// Replace the spool with an empty one; its file goes once readers finish
    fn reset_spool(&mut self) {
        self.spool = match SpoolStore::create(self.config.spool_config()) {
            Ok(spool) => Some(spool),
            Err(e) => {
                error!(target: "battlerec::record", error = %e, "Failed to recreate spool");
                None
            }
        };
    }

    /// Record the state at the end of one turn
    ///
    /// A no-op without an active recording, or after the recording was
    /// abandoned by an ordering violation.
    ///
    /// # Errors
    ///
    /// - `Unrecoverable` when `time` breaks the turn order of `round`
    /// - `InvalidOperation` after [`RecordManager::finalize`]
    /// - `InvalidInput` when `round` is outside the battle's rounds
    pub fn record_turn(&mut self, snapshot: &TurnSnapshot, round: u32, time: u32) -> Result<()> {
        let (header, spool) = match (self.header.as_mut(), self.spool.as_mut()) {
            (Some(header), Some(spool)) if header.turn_counts().is_some() => (header, spool),
            _ => return Ok(()),
        };
        if header.is_frozen() {
            return Err(Error::invalid_operation(
                "record is finalized; no more turns can be recorded",
            ));
        }
        if round >= header.rules.num_rounds {
            return Err(Error::invalid_input(format!(
                "round {} is outside the battle's {} rounds",
                round, header.rules.num_rounds
            )));
        }

        match spool.append(snapshot, round, time) {
            Ok(()) => {
                header.record_turn(round)?;
                trace!(target: "battlerec::record", round, time, "Turn recorded");
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                error!(
                    target: "battlerec::record",
                    round,
                    time,
                    error = %e,
                    "Turn out of order; recording abandoned"
                );
                header.invalidate();
                self.reset_spool();
                Err(Error::unrecoverable(e.to_string()))
            }
            Err(e) => {
                error!(
                    target: "battlerec::record",
                    round,
                    time,
                    error = %e,
                    "Failed to spool turn; recording dropped"
                );
                self.header = None;
                self.reset_spool();
                Ok(())
            }
        }
    }

    /// Attach final results and freeze the turn counts
    pub fn finalize(&mut self, results: Vec<BattleResults>) {
        let Some(header) = self.header.as_mut() else {
            return;
        };
        header.results = results;
        header.freeze();
        let flushed = match self.spool.as_mut() {
            Some(spool) => spool.flush(),
            None => Ok(()),
        };
        match flushed {
            Ok(()) => info!(
                target: "battlerec::record",
                turns = header.total_turns(),
                rounds = header.recorded_rounds(),
                "Recording finalized"
            ),
            Err(e) => {
                error!(target: "battlerec::record", error = %e, "Failed to flush spool; recording dropped");
                self.header = None;
                self.reset_spool();
            }
        }
    }

    /// Close the spool's write channel
    pub fn close_writer(&mut self) {
        let Some(spool) = self.spool.as_mut() else {
            return;
        };
        if let Err(e) = spool.finish_write() {
            error!(target: "battlerec::record", error = %e, "Failed to close spool; recording dropped");
            self.header = None;
            self.reset_spool();
        } else {
            debug!(target: "battlerec::record", "Spool writer closed");
        }
    }

    /// Replay the recorded turns into `consumer`
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if there is no replayable record, plus any
    /// consistency error of the spool or error of `consumer`. A spool
    /// consistency error also discards the record.
    pub fn replay_turns(&mut self, consumer: &mut TurnConsumer<'_>) -> Result<ReplaySummary> {
        let counts = self
            .header
            .as_ref()
            .and_then(|header| header.turn_counts())
            .ok_or_else(|| Error::invalid_operation("no record to replay"))?;
        let spool = self
            .spool
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("no spool to replay from"))?;
        let result =
            SpoolReplay::new(spool, counts).and_then(|source| source.replay_turns(consumer));
        if let Err(e @ (Error::OrderingViolation { .. } | Error::Corruption(_))) = &result {
            error!(target: "battlerec::record", error = %e, "Spool is inconsistent; recording dropped");
            self.header = None;
            self.reset_spool();
        }
        result
    }

    /// Write the current record to `dest` as `format`
    ///
    /// # Errors
    ///
    /// Only spool consistency failures (`OrderingViolation`, `Corruption`)
    /// are returned as errors; every other failure is logged and reported
    /// as [`ExportOutcome::Failed`].
    pub fn export(
        &mut self,
        dest: &Path,
        format: RecordFormat,
        options: OutputOptions,
    ) -> Result<ExportOutcome> {
        let (Some(header), Some(spool)) = (self.header.as_ref(), self.spool.as_mut()) else {
            warn!(target: "battlerec::record", path = %dest.display(), "No record; export skipped");
            return Ok(ExportOutcome::Skipped);
        };
        let Some(counts) = header.turn_counts() else {
            warn!(target: "battlerec::record", path = %dest.display(), "Record is incomplete; export skipped");
            return Ok(ExportOutcome::Skipped);
        };

        let exporter =
            RecordExporter::new(self.config.export_options(options), self.version.version());
        let result = SpoolReplay::new(spool, counts)
            .and_then(|source| exporter.export(dest, format, header, &source));

        match result {
            Ok(info) => Ok(ExportOutcome::Written(info)),
            Err(e @ (Error::OrderingViolation { .. } | Error::Corruption(_))) => {
                error!(target: "battlerec::record", path = %dest.display(), error = %e, "Spool is inconsistent; recording dropped");
                self.header = None;
                self.reset_spool();
                Err(e)
            }
            Err(e) => {
                error!(
                    target: "battlerec::record",
                    path = %dest.display(),
                    format = %format,
                    error = %e,
                    "Export failed; recording dropped"
                );
                self.header = None;
                self.reset_spool();
                Ok(ExportOutcome::Failed(e.kind()))
            }
        }
    }

    /// Export into `dir` under a timestamped name (`<yyyyMMdd-HHmmss>-battle<ext>`)
    pub fn export_with_default_name(
        &mut self,
        dir: &Path,
        format: RecordFormat,
        options: OutputOptions,
    ) -> Result<ExportOutcome> {
        let dest = dir.join(default_record_name(format));
        self.export(&dest, format, options)
    }

    /// Export with the configured format and output options
    pub fn export_configured(&mut self, dest: &Path) -> Result<ExportOutcome> {
        let format = self.config.record_format()?;
        let options = self.config.output_options();
        self.export(dest, format, options)
    }

    /// Write the four CSV tables into caller-supplied writers
    ///
    /// `hook` runs for every turn before its rows are written.
    pub fn generate_csv(
        &mut self,
        sinks: CsvSinks<'_>,
        options: OutputOptions,
        hook: Option<&mut TurnHook<'_>>,
    ) -> Result<CsvStats> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("no record to export"))?;
        let counts = header
            .turn_counts()
            .ok_or_else(|| Error::invalid_operation("record is incomplete"))?;
        let spool = self
            .spool
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("no spool to export from"))?;
        let version = self.version.version();
        let source = SpoolReplay::new(spool, counts)?;
        battlerec_durability::generate_csv(sinks, header, &source, options, &version, hook)
    }

    /// Load a persisted record, replacing the current one
    pub fn import_record(&mut self, source: &Path, format: RecordFormat) -> ImportOutcome {
        self.load(source, format, |spool| {
            RecordImporter::new().import(source, format, spool)
        })
    }

    /// Load an XML record and write a binary copy of it to `dest` in one pass
    pub fn convert_xml_to_binary(
        &mut self,
        source: &Path,
        compressed: bool,
        dest: &Path,
    ) -> ImportOutcome {
        let format = if compressed {
            RecordFormat::XmlZip
        } else {
            RecordFormat::Xml
        };
        self.load(source, format, |spool| {
            RecordImporter::new().convert_xml_to_binary(source, compressed, dest, spool)
        })
    }

    fn load(
        &mut self,
        source: &Path,
        format: RecordFormat,
        import: impl FnOnce(&mut SpoolStore) -> Result<ImportInfo>,
    ) -> ImportOutcome {
        self.header = None;
        self.reset_spool();
        let Some(spool) = self.spool.as_mut() else {
            return ImportOutcome::Failed(ErrorKind::Io);
        };

        match import(spool) {
            Ok(info) => {
                self.header = Some(info.header.clone());
                ImportOutcome::Loaded(info)
            }
            Err(e) => {
                self.reset_spool();
                if e.kind() == ErrorKind::Incompatible {
                    error!(
                        target: "battlerec::record",
                        path = %source.display(),
                        format = %format,
                        error = %e,
                        "Record was written by an incompatible legacy version"
                    );
                    ImportOutcome::Incompatible(e.to_string())
                } else {
                    error!(
                        target: "battlerec::record",
                        path = %source.display(),
                        format = %format,
                        error = %e,
                        "Failed to import record"
                    );
                    ImportOutcome::Failed(e.kind())
                }
            }
        }
    }
}

impl std::fmt::Debug for RecordManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordManager")
            .field("config", &self.config)
            .field("spool", &self.spool)
            .field("header", &self.header)
            .finish()
    }
}

//! Sequential read handle over the spool

use crate::backing::SpoolBacking;
use crate::intern::NameArena;
use crate::record::SpoolRecord;
use battlerec_core::{codec, Result, TurnSnapshot};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tracing::trace;

/// Independent reader positioned at the start of the spool
///
/// Each reader keeps the backing file alive until it is dropped.
pub struct SpoolReader {
    _backing: Arc<SpoolBacking>,
    reader: BufReader<File>,
    arena: NameArena,
    turns_read: u64,
    done: bool,
}

impl SpoolReader {
    pub(crate) fn open(backing: Arc<SpoolBacking>, buffer_size: usize) -> Result<Self> {
        let file = backing.open_read()?;
        trace!(target: "battlerec::spool", path = %backing.path().display(), "Spool reader opened");
        Ok(Self {
            _backing: backing,
            reader: BufReader::with_capacity(buffer_size, file),
            arena: NameArena::new(),
            turns_read: 0,
            done: false,
        })
    }

    /// Read the next snapshot, or `None` at the end of the spool
    pub fn next_turn(&mut self) -> Result<Option<TurnSnapshot>> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_one();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_one(&mut self) -> Result<Option<TurnSnapshot>> {
        let record: Option<SpoolRecord<'static>> = codec::read_value_frame(&mut self.reader)?;
        match record {
            Some(record) => {
                let snapshot = record.decode(&mut self.arena)?;
                self.turns_read += 1;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Snapshots returned so far
    pub fn turns_read(&self) -> u64 {
        self.turns_read
    }
}

impl Iterator for SpoolReader {
    type Item = Result<TurnSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_turn().transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::{SpoolConfig, SpoolStore};
    use battlerec_core::{RobotSnapshot, TurnSnapshot};

    fn turn(round: u32, time: u32) -> TurnSnapshot {
        let mut t = TurnSnapshot::new(round, time);
        t.robots.push(RobotSnapshot::new("sample.Walls", 0));
        t.robots.push(RobotSnapshot::new("sample.Crazy", 1));
        t
    }

    #[test]
    fn test_reader_yields_appended_turns() {
        let mut store = SpoolStore::create(SpoolConfig::for_testing()).unwrap();
        store.begin_write().unwrap();
        for (round, time) in [(0, 0), (0, 1), (1, 0)] {
            store.append(&turn(round, time), round, time).unwrap();
        }
        store.finish_write().unwrap();

        let turns: Vec<_> = store
            .begin_read()
            .unwrap()
            .collect::<battlerec_core::Result<_>>()
            .unwrap();
        assert_eq!(turns, vec![turn(0, 0), turn(0, 1), turn(1, 0)]);
    }

    #[test]
    fn test_independent_readers() {
        let mut store = SpoolStore::create(SpoolConfig::for_testing()).unwrap();
        store.begin_write().unwrap();
        store.append(&turn(0, 0), 0, 0).unwrap();
        store.append(&turn(0, 1), 0, 1).unwrap();
        store.flush().unwrap();

        let mut a = store.begin_read().unwrap();
        let mut b = store.begin_read().unwrap();
        assert_eq!(a.next_turn().unwrap().unwrap().turn, 0);
        assert_eq!(a.next_turn().unwrap().unwrap().turn, 1);
        assert_eq!(b.next_turn().unwrap().unwrap().turn, 0);
        assert!(a.next_turn().unwrap().is_none());
        assert_eq!(a.turns_read(), 2);
        assert_eq!(b.turns_read(), 1);
    }

    #[test]
    fn test_reader_outlives_new_session() {
        let mut store = SpoolStore::create(SpoolConfig::for_testing()).unwrap();
        store.begin_write().unwrap();
        store.append(&turn(0, 0), 0, 0).unwrap();
        store.flush().unwrap();
        let mut old = store.begin_read().unwrap();
        let old_path = store.path().to_path_buf();

        store.begin_write().unwrap();
        assert!(old_path.exists());
        assert_eq!(old.next_turn().unwrap().unwrap(), turn(0, 0));
        drop(old);
        assert!(!old_path.exists());
    }
}

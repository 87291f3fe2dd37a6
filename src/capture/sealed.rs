use crate::capture::record::Record;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LogError {
    #[error("log is sealed, no further records can be appended")]
    Sealed,
    #[error("log must be sealed before its records can be read")]
    NotSealed,
    #[error("log snapshot has already been taken")]
    Drained,
}

#[derive(Default)]
struct LogInner {
    records: Vec<Record>,
    sealed: bool,
    drained: bool,
}

/// Append-only store of request/response records shared by the sender
/// tasks. Writers append until the log is sealed; after sealing the
/// records can be taken exactly once as a snapshot.
#[derive(Default)]
pub struct RequestLog {
    inner: Mutex<LogInner>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: Record) -> Result<(), LogError> {
        let mut inner = self.lock();
        if inner.sealed {
            return Err(LogError::Sealed);
        }
        inner.records.push(record);
        Ok(())
    }

    /// Idempotent: sealing an already-sealed log is a no-op.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the records out. The log must be sealed first, and the
    /// snapshot can only be taken once.
    pub fn snapshot(&self) -> Result<Vec<Record>, LogError> {
        let mut inner = self.lock();
        if !inner.sealed {
            return Err(LogError::NotSealed);
        }
        if inner.drained {
            return Err(LogError::Drained);
        }
        inner.drained = true;
        Ok(std::mem::take(&mut inner.records))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::bid::BidRequest;

    fn record(id: &str) -> Record {
        let request = BidRequest {
            id: id.to_string(),
            ..Default::default()
        };
        Record::new(request, 200, Vec::new())
    }

    #[test]
    fn append_then_seal_then_snapshot() {
        let log = RequestLog::new();
        log.append(record("a")).unwrap();
        log.append(record("b")).unwrap();
        log.seal();
        let records = log.snapshot().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].request.id, "a");
    }

    #[test]
    fn append_after_seal_fails() {
        let log = RequestLog::new();
        log.seal();
        assert_eq!(log.append(record("a")), Err(LogError::Sealed));
    }

    #[test]
    fn snapshot_before_seal_fails() {
        let log = RequestLog::new();
        log.append(record("a")).unwrap();
        assert_eq!(log.snapshot().unwrap_err(), LogError::NotSealed);
    }

    #[test]
    fn second_snapshot_fails() {
        let log = RequestLog::new();
        log.append(record("a")).unwrap();
        log.seal();
        log.snapshot().unwrap();
        assert_eq!(log.snapshot().unwrap_err(), LogError::Drained);
    }

    #[test]
    fn seal_is_idempotent() {
        let log = RequestLog::new();
        log.seal();
        log.seal();
        assert!(log.is_sealed());
    }
}

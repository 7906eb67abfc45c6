//! Lịch sử báo cáo, khóa theo mã bệnh nhân, ghi xuyên xuống backend.

use tracing::{info, warn};

use crate::{ReportData, ReportError};

/// Khóa lưu trữ của lịch sử trong local storage trình duyệt.
pub const HISTORY_STORAGE_KEY: &str = "vet-report-history";

/// Nơi lưu chuỗi JSON của toàn bộ lịch sử.
pub trait HistoryBackend {
    /// `Ok(None)` khi chưa từng lưu.
    fn load(&self) -> Result<Option<String>, ReportError>;
    fn save(&mut self, payload: &str) -> Result<(), ReportError>;
}

/// Backend trong bộ nhớ (nhúng, kiểm thử).
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    payload: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, ReportError> {
        Ok(self.payload.clone())
    }

    fn save(&mut self, payload: &str) -> Result<(), ReportError> {
        self.payload = Some(payload.to_string());
        Ok(())
    }
}

/// Danh sách báo cáo mới nhất đứng đầu, không trùng mã bệnh nhân.
#[derive(Debug)]
pub struct HistoryStore<B: HistoryBackend> {
    backend: B,
    entries: Vec<ReportData>,
}

impl<B: HistoryBackend> HistoryStore<B> {
    /// Đọc lịch sử một lần; dữ liệu hỏng được bỏ qua và coi như rỗng.
    pub fn open(backend: B) -> Self {
        let entries = read_entries(&backend).unwrap_or_else(|err| {
            warn!(error = %err, "lịch sử lưu trữ không dùng được, bắt đầu rỗng");
            Vec::new()
        });

        Self { backend, entries }
    }

    /// Như [`HistoryStore::open`], nhưng trả lỗi thay vì bỏ dữ liệu hỏng,
    /// để lần ghi sau không đè lên tệp chưa đọc được.
    pub fn try_open(backend: B) -> Result<Self, ReportError> {
        let entries = read_entries(&backend)?;
        Ok(Self { backend, entries })
    }

    pub fn entries(&self) -> &[ReportData] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ReportData> {
        self.entries.iter().find(|entry| entry.patient.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Chèn lên đầu, thay thế mục cùng mã.
    pub fn upsert(&mut self, report: ReportData) -> Result<(), ReportError> {
        let mut next = Vec::with_capacity(self.entries.len() + 1);
        let id = report.patient.id.clone();
        next.push(report);
        next.extend(
            self.entries
                .iter()
                .filter(|entry| entry.patient.id != id)
                .cloned(),
        );
        self.commit(next)?;
        info!(id = %id, total = self.entries.len(), "đã lưu báo cáo vào lịch sử");
        Ok(())
    }

    /// Trả về `true` nếu có mục bị xóa.
    pub fn delete(&mut self, id: &str) -> Result<bool, ReportError> {
        let next: Vec<ReportData> = self
            .entries
            .iter()
            .filter(|entry| entry.patient.id != id)
            .cloned()
            .collect();
        if next.len() == self.entries.len() {
            return Ok(false);
        }
        self.commit(next)?;
        info!(id, "đã xóa báo cáo khỏi lịch sử");
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), ReportError> {
        self.commit(Vec::new())?;
        info!("đã xóa toàn bộ lịch sử");
        Ok(())
    }

    // Chỉ cập nhật bộ nhớ khi backend đã ghi thành công.
    fn commit(&mut self, next: Vec<ReportData>) -> Result<(), ReportError> {
        let payload =
            serde_json::to_string(&next).map_err(|err| ReportError::Serialize(err.to_string()))?;
        self.backend.save(&payload)?;
        self.entries = next;
        Ok(())
    }
}

fn read_entries<B: HistoryBackend>(backend: &B) -> Result<Vec<ReportData>, ReportError> {
    match backend.load()? {
        Some(payload) => serde_json::from_str(&payload)
            .map_err(|err| ReportError::Storage(format!("lịch sử không hợp lệ: {err}"))),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Indicator, PatientData, ResultRow};
    use proptest::prelude::*;

    fn report(id: &str, owner: &str) -> ReportData {
        ReportData {
            patient: PatientData {
                id: id.to_string(),
                owner_name: owner.to_string(),
                ..PatientData::default()
            },
            results: vec![ResultRow {
                parameter: "WBC".to_string(),
                result: "20.00".to_string(),
                indicator: Indicator::High,
                range: "5.50 - 16.90".to_string(),
                unit: "10^3/μL".to_string(),
            }],
        }
    }

    struct FailingBackend;

    impl HistoryBackend for FailingBackend {
        fn load(&self) -> Result<Option<String>, ReportError> {
            Err(ReportError::Storage("quota".to_string()))
        }

        fn save(&mut self, _: &str) -> Result<(), ReportError> {
            Err(ReportError::Storage("quota".to_string()))
        }
    }

    #[test]
    fn upsert_inserts_at_front_and_replaces_same_id() {
        let mut store = HistoryStore::open(MemoryBackend::new());
        store.upsert(report("A1", "Ana")).unwrap();
        store.upsert(report("B2", "Luis")).unwrap();
        store.upsert(report("A1", "Ana María")).unwrap();

        let ids: Vec<_> = store.entries().iter().map(|r| r.patient.id.as_str()).collect();
        assert_eq!(ids, ["A1", "B2"]);
        assert_eq!(store.get("A1").unwrap().patient.owner_name, "Ana María");
    }

    #[test]
    fn delete_and_clear_write_through() {
        let mut store = HistoryStore::open(MemoryBackend::new());
        store.upsert(report("A1", "Ana")).unwrap();
        store.upsert(report("B2", "Luis")).unwrap();

        assert!(store.delete("A1").unwrap());
        assert!(!store.delete("A1").unwrap());
        assert_eq!(store.len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.backend().payload(), Some("[]"));
    }

    #[test]
    fn reopening_reproduces_the_list() {
        let mut store = HistoryStore::open(MemoryBackend::new());
        store.upsert(report("A1", "Ana")).unwrap();
        store.upsert(report("B2", "Luis")).unwrap();
        let saved = store.backend().payload().unwrap().to_string();

        let reopened = HistoryStore::open(MemoryBackend::with_payload(saved));
        assert_eq!(reopened.entries(), store.entries());
    }

    #[test]
    fn malformed_payload_starts_empty() {
        let store = HistoryStore::open(MemoryBackend::with_payload("{not json"));
        assert!(store.is_empty());
    }

    #[test]
    fn try_open_reports_malformed_payload() {
        let err = HistoryStore::try_open(MemoryBackend::with_payload("{not json")).unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
        assert!(matches!(
            HistoryStore::try_open(FailingBackend),
            Err(ReportError::Storage(_))
        ));

        let store = HistoryStore::try_open(MemoryBackend::new()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn failed_save_leaves_entries_untouched() {
        let mut store = HistoryStore::open(FailingBackend);
        assert!(store.is_empty());
        let err = store.upsert(report("A1", "Ana")).unwrap_err();
        assert_eq!(err, ReportError::Storage("quota".to_string()));
        assert!(store.is_empty());
    }

    proptest! {
        #[test]
        fn ids_stay_unique(ids in proptest::collection::vec("[a-c][0-2]", 1..20)) {
            let mut store = HistoryStore::open(MemoryBackend::new());
            for (step, id) in ids.iter().enumerate() {
                store.upsert(report(id, &format!("owner-{step}"))).unwrap();
            }

            let mut seen: Vec<_> = store.entries().iter().map(|r| r.patient.id.clone()).collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);

            let last = ids.last().unwrap();
            prop_assert_eq!(&store.entries()[0].patient.id, last);
            let last_step = ids.len() - 1;
            prop_assert_eq!(&store.entries()[0].patient.owner_name, &format!("owner-{last_step}"));
        }
    }
}

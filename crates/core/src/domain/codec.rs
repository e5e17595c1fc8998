// JobRecord codec (§6: "Serialization format is opaque ... but must be
// deterministic and round-trip stable"). bincode's fixed-layout encoding of a
// plain struct gives us exactly that for free.

use super::JobRecord;
use crate::error::{Result, StoreError};

pub fn encode(record: &JobRecord) -> Result<Vec<u8>> {
    bincode::serialize(record)
        .map_err(|e| StoreError::CorruptValue(format!("failed to encode job record: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<JobRecord> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::CorruptValue(format!("failed to decode job record: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobType;

    #[test]
    fn round_trips() {
        let rec = JobRecord {
            job_type: JobType::from("payment"),
            retries: 3,
            retry_backoff: 500,
            recurring_time: 2000,
            deadline: 1000,
            variables: vec![1, 2, 3],
            body: vec![9, 9],
        };
        let bytes = encode(&rec).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(rec, back);
    }

    #[test]
    fn corrupt_bytes_are_rejected() {
        let err = decode(&[0xff, 0x01]).unwrap_err();
        assert!(matches!(err, StoreError::CorruptValue(_)));
    }
}

use crate::protocol::JobId;

/// A unit of work: an id chosen by its proposer and opaque parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub parameters: String,
}

impl Job {
    pub fn new(id: JobId, parameters: impl Into<String>) -> Self {
        Self {
            id,
            parameters: parameters.into(),
        }
    }
}

/// Outcome of a job, as published to the group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_id: JobId,
    pub value: String,
}

/// Snapshot of both sides of the job book, for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Every job we proposed, whether or not a claim was approved
    pub sentout: Vec<JobId>,
    /// Proposed by us, with the peer whose claim was approved
    pub accepted: Vec<(JobId, String)>,
    /// Received, claimed, waiting for an answer
    pub pending: Vec<JobId>,
    /// Received and being executed here
    pub hired: Vec<JobId>,
}

impl JobReport {
    /// Report lines, one per category
    pub fn lines(&self) -> Vec<String> {
        let ids = |ids: &[JobId]| {
            ids.iter()
                .map(JobId::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let accepted = self
            .accepted
            .iter()
            .map(|(id, peer)| format!("{} ({})", id, peer))
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            format!("Emitted jobs sentout: {}", ids(&self.sentout)),
            format!("Emitted jobs accepted: {}", accepted),
            format!("Received jobs pending: {}", ids(&self.pending)),
            format!("Received jobs hired: {}", ids(&self.hired)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lines_list_every_category() {
        let id = |raw: &str| JobId::new(raw).unwrap();
        let report = JobReport {
            sentout: vec![id("1"), id("2")],
            accepted: vec![(id("3"), "bob".to_string())],
            pending: vec![],
            hired: vec![id("9")],
        };

        assert_eq!(
            report.lines(),
            vec![
                "Emitted jobs sentout: 1, 2",
                "Emitted jobs accepted: 3 (bob)",
                "Received jobs pending: ",
                "Received jobs hired: 9",
            ]
        );
    }
}
